//! 订单注册表
//!
//! 进程内唯一权威的订单工作集。所有变更通过同一把写锁串行化，
//! 调用方永远拿不到底层容器的可变引用；持久化由外部协作方
//! 按自己的节奏完成。

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use domain::{
    DomainError, DomainResult, Order, OrderDraft, OrderId, OrderStatus, Timestamp, UserId,
};

use crate::clock::Clock;

/// "我的订单" 查询返回的最大条数。
const MY_ORDERS_LIMIT: usize = 10;

/// 一次状态流转的结果，携带流转前的状态供广播负载使用。
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    pub previous_status: OrderStatus,
}

pub struct OrderRegistry {
    orders: RwLock<HashMap<OrderId, Order>>,
    next_id: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl OrderRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            clock,
        }
    }

    /// 注册新订单：分配递增 ID、置为 pending 并写入首条历史。
    /// 这里不做任何广播，广播属于事件代理。
    pub async fn register(&self, draft: OrderDraft) -> Order {
        let id = OrderId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let order = Order::new(id, draft, self.clock.now());
        let mut orders = self.orders.write().await;
        orders.insert(id, order.clone());
        info!(order_id = %id, user_id = %order.user_id, total = order.total, "Order registered");
        order
    }

    pub async fn find(&self, id: OrderId) -> Option<Order> {
        let orders = self.orders.read().await;
        orders.get(&id).cloned()
    }

    /// 按创建时间倒序返回某用户最近的订单，最多 10 条。
    pub async fn find_by_owner(&self, user_id: UserId) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut owned: Vec<Order> = orders
            .values()
            .filter(|order| order.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(MY_ORDERS_LIMIT);
        owned
    }

    /// 应用一次状态流转。未知订单和非法流转都不会留下任何痕迹。
    pub async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        updated_by: &str,
        notes: Option<String>,
        estimated_delivery: Option<Timestamp>,
    ) -> DomainResult<StatusChange> {
        let now = self.clock.now();
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(DomainError::OrderNotFound(id))?;
        let previous_status =
            order.apply_status(new_status, updated_by, notes, estimated_delivery, now)?;
        info!(
            order_id = %id,
            from = %previous_status,
            to = %new_status,
            updated_by,
            "Order status updated"
        );
        Ok(StatusChange {
            order: order.clone(),
            previous_status,
        })
    }

    /// 单独更新预计送达时间。
    pub async fn update_estimated_delivery(
        &self,
        id: OrderId,
        eta: Timestamp,
    ) -> DomainResult<Order> {
        let now = self.clock.now();
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(DomainError::OrderNotFound(id))?;
        order.set_estimated_delivery(eta, now);
        Ok(order.clone())
    }

    /// 当前全部订单的快照，供统计聚合按需重算。
    pub async fn snapshot(&self) -> Vec<Order> {
        let orders = self.orders.read().await;
        orders.values().cloned().collect()
    }
}
