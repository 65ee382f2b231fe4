use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::{
    domain::new_contact::{NewContact, NewContactBody, NewContactError},
    mailchimp_client::{MailchimpClient, MailchimpError},
    routes::{mailchimp_error_envelope, ErrorEnvelope},
    startup::SimulateSubmissions,
};

#[derive(Serialize, Debug)]
pub struct SubmitFormResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(rename = "contactId")]
    pub contact_id: String,
}

impl SubmitFormResponse {
    fn new(message: &'static str, contact_id: String) -> Self {
        SubmitFormResponse {
            success: true,
            message,
            contact_id,
        }
    }
}

#[tracing::instrument(
    name = "Submitting a lead form handler",
    skip(body, mailchimp_client, simulate_submissions),
    fields(
        contact_email = ?body.email,
        contact_interests = ?body.interests,
        contact_source = ?body.source
    )
)]
pub async fn handle_submit_form(
    body: web::Json<NewContactBody>,
    mailchimp_client: web::Data<MailchimpClient>,
    simulate_submissions: web::Data<SimulateSubmissions>,
) -> Result<HttpResponse, SubmitFormError> {
    let contact: NewContact = body.into_inner().try_into()?;

    if simulate_submissions.0 {
        tracing::info!("Submission simulated, Mailchimp was not called");

        return Ok(HttpResponse::Ok().json(SubmitFormResponse::new(
            "Form submitted successfully (dev mode)",
            format!("dev_{}", Utc::now().timestamp_millis()),
        )));
    }

    match mailchimp_client.add_member(&contact).await {
        Ok(member_id) => {
            tag_contact(&mailchimp_client, &member_id, &contact).await;

            Ok(HttpResponse::Ok().json(SubmitFormResponse::new(
                "Form submitted successfully",
                member_id,
            )))
        }
        Err(err) if err.is_member_exists() => {
            tracing::info!("Contact already exists, updating it instead");

            let subscriber_hash = update_existing_contact(&mailchimp_client, &contact)
                .await
                .map_err(SubmitFormError::UpdateContactError)?;

            Ok(HttpResponse::Ok().json(SubmitFormResponse::new(
                "Contact updated successfully",
                subscriber_hash,
            )))
        }
        Err(err) => Err(SubmitFormError::CreateContactError(err)),
    }
}

/// Tags are applied on a best-effort basis: the member already exists with its creation tags.
async fn tag_contact(mailchimp_client: &MailchimpClient, member_id: &str, contact: &NewContact) {
    if let Err(err) = mailchimp_client
        .apply_tags(member_id, &contact.tags())
        .await
    {
        tracing::error!("Failed to tag member {}: {:?}", member_id, err);
    }
}

#[tracing::instrument(
    name = "Update an existing Mailchimp contact",
    skip(mailchimp_client, contact)
)]
async fn update_existing_contact(
    mailchimp_client: &MailchimpClient,
    contact: &NewContact,
) -> Result<String, MailchimpError> {
    let subscriber_hash = mailchimp_client.update_member(contact).await?;

    mailchimp_client
        .apply_tags(&subscriber_hash, &contact.tags())
        .await?;

    Ok(subscriber_hash)
}

#[derive(thiserror::Error)]
pub enum SubmitFormError {
    #[error(transparent)]
    ValidationError(#[from] NewContactError),
    #[error("Failed to submit form")]
    CreateContactError(#[source] MailchimpError),
    #[error("Failed to update existing contact")]
    UpdateContactError(#[source] MailchimpError),
}

impl std::fmt::Debug for SubmitFormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cause: &dyn std::fmt::Debug = match self {
            SubmitFormError::ValidationError(err) => err,
            SubmitFormError::CreateContactError(err) => err,
            SubmitFormError::UpdateContactError(err) => err,
        };

        write!(f, "{}\nCaused by:\n\t{:?}", self, cause)
    }
}

impl ResponseError for SubmitFormError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitFormError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubmitFormError::CreateContactError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubmitFormError::UpdateContactError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!("{:?}", self);

        let envelope = match self {
            SubmitFormError::ValidationError(NewContactError::MissingFields(fields)) => {
                ErrorEnvelope::new(self.to_string(), Some(serde_json::json!(fields)))
            }
            SubmitFormError::ValidationError(NewContactError::InvalidField(reason)) => {
                ErrorEnvelope::new("Invalid contact data", Some(Value::String(reason.clone())))
            }
            SubmitFormError::CreateContactError(err) => {
                mailchimp_error_envelope(err, "Failed to submit form")
            }
            SubmitFormError::UpdateContactError(err) => {
                let envelope = mailchimp_error_envelope(err, "Failed to update existing contact");

                match err {
                    MailchimpError::MissingConfiguration => envelope,
                    _ => ErrorEnvelope::new(self.to_string(), envelope.error),
                }
            }
        };

        HttpResponse::build(self.status_code()).json(envelope)
    }
}
