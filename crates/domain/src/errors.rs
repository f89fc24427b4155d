//! 领域错误定义
//!
//! 每个错误的 Display 文本会原样作为 `error` 事件负载发给请求方，
//! 因此消息保持面向用户的措辞。

use thiserror::Error;

use crate::entities::order::OrderStatus;
use crate::value_objects::OrderId;

/// 领域错误类型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// 订单不存在
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// 订单不存在，或请求方无权访问（两种情况对外不区分）
    #[error("Order not found or access denied")]
    AccessDenied(OrderId),

    /// 需要管理员权限
    #[error("Admin access required")]
    AdminRequired,

    /// 非法的状态流转
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl DomainError {
    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
