use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::Value;

use crate::mailchimp_client::MailchimpError;

mod dashboard;
mod get_members;
mod health_check;
mod submit_form;

pub use dashboard::*;
pub use get_members::*;
pub use health_check::*;
pub use submit_form::*;

/// Body of every failed API response.
#[derive(Serialize, Debug)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, error: Option<Value>) -> Self {
        ErrorEnvelope {
            success: false,
            message: message.into(),
            error,
        }
    }
}

/// Envelope for a Mailchimp failure. The upstream `detail` is preferred over `fallback_message`.
pub fn mailchimp_error_envelope(err: &MailchimpError, fallback_message: &str) -> ErrorEnvelope {
    let message = match err {
        MailchimpError::MissingConfiguration => err.to_string(),
        _ => err
            .detail()
            .unwrap_or_else(|| String::from(fallback_message)),
    };

    ErrorEnvelope::new(message, Some(err.payload()))
}

#[derive(Serialize)]
struct MethodNotAllowed {
    message: &'static str,
}

/// Default service of the API resources, reached when the path exists but the method does not.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(MethodNotAllowed {
        message: "Method not allowed",
    })
}

pub fn json_error_handler(err: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    let envelope = ErrorEnvelope::new("Invalid request body", Some(Value::String(err.to_string())));
    let response = HttpResponse::BadRequest().json(envelope);

    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    let envelope = ErrorEnvelope::new(
        "Invalid query parameters",
        Some(Value::String(err.to_string())),
    );
    let response = HttpResponse::BadRequest().json(envelope);

    InternalError::from_response(err, response).into()
}
