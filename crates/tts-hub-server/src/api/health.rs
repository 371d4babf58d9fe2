use actix_web::{HttpResponse, Responder, get};
use tts_hub_types::HealthResponse;

/// Basic health check for clients and monitoring.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Hub server is healthy", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
