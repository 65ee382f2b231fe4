use actix_web::{HttpRequest, HttpResponse, Responder};

/// Endpoint used by clients to know if the server is working
#[tracing::instrument(name = "Health Check handler")]
pub async fn health_check(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
}

#[derive(serde::Serialize)]
struct HealthStatus {
    status: &'static str,
}

/// Same check with the JSON body the landing pages poll.
#[tracing::instrument(name = "API health handler")]
pub async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "Server is running!",
    })
}
