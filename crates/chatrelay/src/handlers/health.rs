use axum::Json;
use chatrelay_types::HealthResponse;
use chrono::Utc;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy_at(Utc::now()))
}
