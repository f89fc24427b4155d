//! Web API 路由
//!
//! HTTP 面只保留下单协作方的入口；订单的增删查改由外部 CRUD 层
//! 负责，这里只把新订单注册进内存工作集并触发管理员提醒。

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use domain::{Order, OrderDraft};

use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/ws", get(websocket::websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 下单协作方入口：注册订单并触发管理员提醒与统计刷新。
async fn place_order(
    State(state): State<AppState>,
    Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if draft.items.is_empty() {
        return Err(ApiError::bad_request("order must contain at least one item"));
    }

    let order = state.broker.register_order(draft).await;
    state.broker.notify_admins(&order).await;

    Ok((StatusCode::CREATED, Json(order)))
}
