//! 连接消息路由
//!
//! 维护连接到发送通道的映射。发送失败只记日志，绝不向调用方传播，
//! 单个连接的故障不会影响同一房间里的其他连接。

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use domain::{ConnectionId, ServerEvent};

/// 每个连接的出站通道。
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Default)]
pub struct ConnectionRouter {
    senders: RwLock<HashMap<ConnectionId, EventSender>>,
}

impl ConnectionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: ConnectionId, sender: EventSender) {
        let mut senders = self.senders.write().await;
        senders.insert(connection_id, sender);
        debug!(connection_id = %connection_id, "Sender registered");
    }

    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut senders = self.senders.write().await;
        senders.remove(&connection_id);
        debug!(connection_id = %connection_id, "Sender unregistered");
    }

    /// 发送到单个连接。
    pub async fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) {
        let senders = self.senders.read().await;
        match senders.get(&connection_id) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    warn!(connection_id = %connection_id, "Failed to deliver event, connection closing");
                }
            }
            None => debug!(connection_id = %connection_id, "No sender registered for connection"),
        }
    }

    /// 发送到一组连接。
    pub async fn send_to_many(&self, connection_ids: &[ConnectionId], event: &ServerEvent) {
        let senders = self.senders.read().await;
        let mut failed = 0;
        for connection_id in connection_ids {
            if let Some(sender) = senders.get(connection_id) {
                if sender.send(event.clone()).is_err() {
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            warn!(failed, "Fan-out skipped closing connections");
        }
    }

    /// 发送到当前全部连接。
    pub async fn broadcast_all(&self, event: &ServerEvent) {
        let senders = self.senders.read().await;
        for (connection_id, sender) in senders.iter() {
            if sender.send(event.clone()).is_err() {
                warn!(connection_id = %connection_id, "Failed to broadcast to connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_to_registered_connection() {
        let router = ConnectionRouter::new();
        let connection_id = ConnectionId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        router.register(connection_id, tx).await;
        router
            .send_to(connection_id, ServerEvent::error("boom"))
            .await;

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::error("boom"));
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_silent() {
        let router = ConnectionRouter::new();
        // 不注册直接发送，不 panic、不报错
        router
            .send_to(ConnectionId::new(), ServerEvent::error("lost"))
            .await;
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let router = ConnectionRouter::new();
        let connection_id = ConnectionId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        router.register(connection_id, tx).await;
        router.unregister(connection_id).await;
        router
            .send_to(connection_id, ServerEvent::error("late"))
            .await;

        assert!(rx.try_recv().is_err());
    }
}
