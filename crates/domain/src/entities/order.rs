//! 订单相关实体
//!
//! 定义订单聚合根、订单项、状态机以及只追加的状态历史。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{OrderId, Timestamp, UserId};

/// 订单状态
///
/// 正常链路为 pending → confirmed → preparing → ready →
/// out_for_delivery → delivered，cancelled 可以从任何非终态进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// 终态订单不再流转，仅保留用于统计和审计。
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// 判断到 `next` 的状态流转是否合法。
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Preparing)
            | (Self::Preparing, Self::Ready)
            | (Self::Ready, Self::OutForDelivery)
            | (Self::OutForDelivery, Self::Delivered) => true,
            (_, Self::Cancelled) => true,
            _ => false,
        }
    }

    /// 面向顾客的状态描述，用于订单通知。
    pub fn customer_message(&self) -> &'static str {
        match self {
            Self::Pending => "Your order has been received and is being reviewed.",
            Self::Confirmed => "Your order has been confirmed and will be prepared soon.",
            Self::Preparing => "Your delicious meal is being prepared with care.",
            Self::Ready => "Your order is ready! We'll start delivery shortly.",
            Self::OutForDelivery => {
                "Your order is on the way! Estimated delivery in 15-20 minutes."
            }
            Self::Delivered => "Your order has been delivered. Enjoy your meal!",
            Self::Cancelled => {
                "Your order has been cancelled. If you have questions, please contact us."
            }
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// 订单项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// 商品名称
    pub name: String,
    /// 单价
    pub price: f64,
    /// 数量
    pub quantity: u32,
}

impl LineItem {
    /// 单项小计
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// 下单顾客的联系信息，由下单服务提供。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// 订单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery => f.write_str("delivery"),
            Self::Pickup => f.write_str("pickup"),
        }
    }
}

/// 状态历史条目
///
/// 历史只追加、不修改、不重排，最后一条的状态恒等于订单当前状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: Timestamp,
    pub updated_by: String,
    pub notes: Option<String>,
}

/// 新订单注册请求，由下单协作方（外部 HTTP 层）提交。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    /// 协作方已经算好的总价；缺省时由订单项重新计算。
    #[serde(default)]
    pub total: Option<f64>,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub estimated_delivery: Option<Timestamp>,
}

/// 订单聚合根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub estimated_delivery: Option<Timestamp>,
    pub customer: CustomerInfo,
    pub order_type: OrderType,
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// 创建 pending 状态的新订单并写入首条历史，仅由注册表调用。
    pub fn new(id: OrderId, draft: OrderDraft, now: Timestamp) -> Self {
        let total = draft
            .total
            .unwrap_or_else(|| draft.items.iter().map(LineItem::line_total).sum());
        let initial = StatusHistoryEntry {
            status: OrderStatus::Pending,
            timestamp: now,
            updated_by: "system".to_string(),
            notes: None,
        };
        Self {
            id,
            user_id: draft.user_id,
            items: draft.items,
            total,
            status: OrderStatus::Pending,
            estimated_delivery: draft.estimated_delivery,
            customer: draft.customer,
            order_type: draft.order_type,
            status_history: vec![initial],
            created_at: now,
            updated_at: now,
        }
    }

    /// 校验并应用一次状态流转，追加历史并刷新时间戳。
    ///
    /// 返回流转前的状态，供广播负载使用。
    pub fn apply_status(
        &mut self,
        next: OrderStatus,
        updated_by: impl Into<String>,
        notes: Option<String>,
        estimated_delivery: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<OrderStatus, DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(self.status, next));
        }
        let previous = self.status;
        self.status = next;
        if let Some(eta) = estimated_delivery {
            self.estimated_delivery = Some(eta);
        }
        self.updated_at = now;
        self.status_history.push(StatusHistoryEntry {
            status: next,
            timestamp: now,
            updated_by: updated_by.into(),
            notes,
        });
        Ok(previous)
    }

    /// 单独更新预计送达时间。
    pub fn set_estimated_delivery(&mut self, eta: Timestamp, now: Timestamp) {
        self.estimated_delivery = Some(eta);
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
