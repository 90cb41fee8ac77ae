use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::handlers::{events, health};
use crate::http::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/events", post(events::update_event))
        .route("/events/search", post(events::search_events))
        .route(
            "/events/:id",
            get(events::get_event).delete(events::delete_event),
        )
        .route("/events/:id/sport", get(events::get_sport_event))
        .route("/events/:id/race", get(events::get_race_event));

    Router::new()
        .nest("/v1", api_routes)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
