use std::sync::Arc;

use application::EventBroker;

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<EventBroker>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(broker: Arc<EventBroker>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            broker,
            jwt_service,
        }
    }
}
