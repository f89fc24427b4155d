//! WebSocket 处理器
//!
//! 实现连接升级、凭证校验、消息循环与生命周期清理。
//! 校验不通过的连接在升级前就被拒绝，不会获得任何房间成员资格。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use application::ConnectionContext;
use domain::{ClientEvent, ConnectionId, UserId};

use crate::auth::AuthError;
use crate::state::AppState;

/// WebSocket 连接查询参数
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token
    pub token: Option<String>,
}

/// 处理 WebSocket 连接升级。
pub async fn websocket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<Response, StatusCode> {
    let token = match query.token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => {
            warn!(error = %AuthError::MissingToken, "WebSocket upgrade refused");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let claims = match state.jwt_service.verify_token(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "WebSocket upgrade refused");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let ctx = ConnectionContext {
        connection_id: ConnectionId::new(),
        user_id: UserId(claims.sub),
        role: claims.role,
        email: claims.email,
    };

    info!(user_id = %ctx.user_id, role = %ctx.role, "WebSocket upgrade");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, ctx)))
}

/// 单个连接的主循环。
async fn handle_socket(socket: WebSocket, state: AppState, ctx: ConnectionContext) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // 建立成员资格（个人房间，管理员另加 admin 房间）并下发欢迎事件
    state.broker.register_connection(&ctx, tx).await;

    // 发送任务：把服务端事件序列化成 JSON 文本帧
    let send_connection_id = ctx.connection_id;
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "Failed to serialize server event");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
        debug!(connection_id = %send_connection_id, "Send task completed");
    });

    // 接收任务：解析客户端意图并交给事件代理
    let recv_state = state.clone();
    let recv_ctx = ctx.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(WsMessage::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => recv_state.broker.handle_event(&recv_ctx, event).await,
                    Err(err) => {
                        recv_state
                            .broker
                            .report_malformed(recv_ctx.connection_id, &err.to_string())
                            .await;
                    }
                },
                Ok(WsMessage::Binary(_)) => {
                    debug!("Received binary message (not supported)");
                }
                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {
                    // ping/pong 由 axum 在协议层自动应答
                }
                Ok(WsMessage::Close(_)) => {
                    info!(connection_id = %recv_ctx.connection_id, "WebSocket closed by client");
                    break;
                }
                Err(err) => {
                    // 传输层错误只记日志，绝不影响进程或其他连接
                    warn!(connection_id = %recv_ctx.connection_id, error = %err, "WebSocket error");
                    break;
                }
            }
        }
        debug!(connection_id = %recv_ctx.connection_id, "Receive task completed");
    });

    // 任一方向结束即视为断开
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // 清理：拆除全部房间关联并注销发送通道
    state.broker.disconnect(&ctx).await;
}
