use std::sync::Arc;

use application::{
    Clock, ConnectionRouter, EventBroker, LoggingDispatcher, NotificationBridge, OrderRegistry,
    RoomRegistry, SystemClock,
};
use axum::Router;
use web_api::{router, AppState, JwtConfig, JwtService};

pub struct TestApp {
    pub router: Router,
    pub jwt: Arc<JwtService>,
}

/// 组装一套纯内存状态的完整应用，测试无须任何外部服务。
pub fn build_app() -> TestApp {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bridge = Arc::new(NotificationBridge::new(
        Arc::new(LoggingDispatcher),
        clock.clone(),
    ));
    let broker = Arc::new(EventBroker::new(
        Arc::new(OrderRegistry::new(clock.clone())),
        Arc::new(RoomRegistry::new()),
        Arc::new(ConnectionRouter::new()),
        bridge,
        clock,
    ));
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "integration-test-secret-key-at-least-32-chars".to_string(),
        expiration_hours: 24,
    }));

    let state = AppState::new(broker, jwt.clone());
    TestApp {
        router: router(state),
        jwt,
    }
}
