use std::sync::Arc;

use crate::service::EventService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

impl AppState {
    pub fn new(service: EventService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
