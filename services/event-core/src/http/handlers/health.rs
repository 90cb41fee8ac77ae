use axum::{extract::State, http::StatusCode, Json};

use crate::http::models::HealthResponse;
use crate::http::state::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.service.health().await;
    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let transforms = state
        .service
        .transform_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            transforms,
        }),
    )
}
