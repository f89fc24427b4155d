//! 通知桥
//!
//! 在选定的代理事件（新订单、状态变更）上调用外部通知协作方，
//! 并记录审计条目。投递相对广播路径是 fire-and-forget 的：
//! 失败只记日志，不会阻塞或回滚任何广播。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

use domain::{Order, OrderId, OrderStatus, Timestamp};

use crate::clock::Clock;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

impl NotificationError {
    pub fn delivery_failed(message: impl Into<String>) -> Self {
        Self::DeliveryFailed(message.into())
    }
}

/// 外部通知投递的抽象。邮件、推送等具体机制在进程之外。
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_customer(&self, order: &Order, message: &str)
        -> Result<(), NotificationError>;
}

/// 默认实现：只记录结构化日志，真实投递由外部协作方完成。
#[derive(Debug, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn notify_customer(
        &self,
        order: &Order,
        message: &str,
    ) -> Result<(), NotificationError> {
        info!(
            order_id = %order.id,
            customer = %order.customer.name,
            message,
            "Customer notification dispatched"
        );
        Ok(())
    }
}

/// 审计条目类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    OrderPlaced,
    StatusChanged,
}

/// 审计条目
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub order_id: OrderId,
    pub kind: AuditKind,
    pub status: OrderStatus,
    pub actor: String,
    pub timestamp: Timestamp,
}

pub struct NotificationBridge {
    dispatcher: Arc<dyn NotificationDispatcher>,
    audit: RwLock<Vec<AuditEntry>>,
    clock: Arc<dyn Clock>,
}

impl NotificationBridge {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatcher,
            audit: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// 新订单：先记审计，再异步通知顾客。
    pub async fn order_placed(&self, order: &Order) {
        self.record(order, AuditKind::OrderPlaced, "system").await;
        self.dispatch(order.clone());
    }

    /// 状态变更：先记审计，再异步通知顾客。
    pub async fn status_changed(&self, order: &Order, actor: &str) {
        self.record(order, AuditKind::StatusChanged, actor).await;
        self.dispatch(order.clone());
    }

    /// 审计日志快照。
    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }

    async fn record(&self, order: &Order, kind: AuditKind, actor: &str) {
        let entry = AuditEntry {
            order_id: order.id,
            kind,
            status: order.status,
            actor: actor.to_string(),
            timestamp: self.clock.now(),
        };
        self.audit.write().await.push(entry);
    }

    fn dispatch(&self, order: Order) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let message = order.status.customer_message();
            if let Err(err) = dispatcher.notify_customer(&order, message).await {
                error!(order_id = %order.id, error = %err, "Notification delivery failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use domain::{CustomerInfo, LineItem, OrderDraft, OrderType, UserId};

    use super::*;
    use crate::clock::SystemClock;

    /// 记录每次投递的测试替身。
    #[derive(Default)]
    struct RecordingDispatcher {
        deliveries: Mutex<Vec<(OrderId, String)>>,
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        async fn notify_customer(
            &self,
            order: &Order,
            message: &str,
        ) -> Result<(), NotificationError> {
            self.deliveries
                .lock()
                .unwrap()
                .push((order.id, message.to_string()));
            Ok(())
        }
    }

    /// 永远失败的测试替身。
    struct FailingDispatcher;

    #[async_trait]
    impl NotificationDispatcher for FailingDispatcher {
        async fn notify_customer(
            &self,
            _order: &Order,
            _message: &str,
        ) -> Result<(), NotificationError> {
            Err(NotificationError::delivery_failed("smtp unreachable"))
        }
    }

    fn sample_order() -> Order {
        let draft = OrderDraft {
            user_id: UserId(Uuid::new_v4()),
            items: vec![LineItem {
                name: "Classic Burger".to_string(),
                price: 8.99,
                quantity: 1,
            }],
            total: None,
            customer: CustomerInfo {
                name: "Alice".to_string(),
                phone: "555-0100".to_string(),
                address: "1 Main St".to_string(),
            },
            order_type: OrderType::Delivery,
            estimated_delivery: None,
        };
        Order::new(domain::OrderId(1), draft, Utc::now())
    }

    #[tokio::test]
    async fn test_status_change_records_audit_and_dispatches() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let bridge = NotificationBridge::new(dispatcher.clone(), Arc::new(SystemClock));
        let order = sample_order();

        bridge.status_changed(&order, "admin@example.com").await;

        let audit = bridge.audit_log().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].kind, AuditKind::StatusChanged);
        assert_eq!(audit[0].actor, "admin@example.com");

        // 投递是异步的，给 spawn 出去的任务让出执行机会
        tokio::time::sleep(Duration::from_millis(20)).await;
        let deliveries = dispatcher.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, order.id);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let bridge = NotificationBridge::new(Arc::new(FailingDispatcher), Arc::new(SystemClock));
        let order = sample_order();

        // 失败不会向调用方传播
        bridge.order_placed(&order).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // 审计仍然记录
        let audit = bridge.audit_log().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].kind, AuditKind::OrderPlaced);
    }
}
