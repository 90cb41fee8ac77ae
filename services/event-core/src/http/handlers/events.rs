use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use types::event::Event;
use types::ids::EventId;

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::projection::{RaceEventView, SportEventView};
use crate::service::{SearchRequest, UpdateResponse};
use crate::store::SearchPage;

pub async fn update_event(
    State(state): State<AppState>,
    Json(partial): Json<Event>,
) -> Result<Json<UpdateResponse>, ApiError> {
    Ok(Json(state.service.update(partial).await?))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = EventId::new(id);
    state
        .service
        .get_event(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn get_sport_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SportEventView>, ApiError> {
    let id = EventId::new(id);
    state
        .service
        .get_sport_event(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn get_race_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RaceEventView>, ApiError> {
    let id = EventId::new(id);
    state
        .service
        .get_race_event(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_event(&EventId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_events(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchPage>, ApiError> {
    Ok(Json(state.service.search_events(&request).await?))
}

fn not_found(id: &EventId) -> ApiError {
    ApiError::NotFound(format!("event {id}"))
}
