//! 主应用程序入口
//!
//! 启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    Clock, ConnectionRouter, EventBroker, LoggingDispatcher, NotificationBridge, OrderRegistry,
    RoomRegistry, SystemClock,
};
use config::AppConfig;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置
    let config = AppConfig::from_env_with_defaults();
    if let Err(err) = config.validate() {
        tracing::warn!(error = %err, "配置未通过生产级校验，继续以开发默认值运行");
    }

    // 组装内存工作集与事件代理
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(OrderRegistry::new(clock.clone()));
    let rooms = Arc::new(RoomRegistry::new());
    let connection_router = Arc::new(ConnectionRouter::new());
    let bridge = Arc::new(NotificationBridge::new(
        Arc::new(LoggingDispatcher),
        clock.clone(),
    ));
    let broker = Arc::new(EventBroker::new(
        registry,
        rooms,
        connection_router,
        bridge,
        clock,
    ));

    // 创建 JWT 服务
    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    // 创建应用状态并启动 Web 服务器
    let state = AppState::new(broker, jwt_service);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("订单跟踪服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
