//! WebSocket 协议事件
//!
//! 定义客户端意图与服务端推送的线上契约。每个帧是一个
//! `{"event": <名称>, "data": <负载>}` 信封，事件名与负载字段
//! 与既有客户端保持二进制级兼容。

use serde::{Deserialize, Serialize};

use crate::entities::order::{LineItem, Order, OrderStatus, OrderType};
use crate::entities::stats::LiveStats;
use crate::value_objects::{OrderId, Role, Timestamp, UserId};

/// 客户端意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// 开始跟踪订单
    #[serde(rename_all = "camelCase")]
    TrackOrder { order_id: OrderId },
    /// 停止跟踪订单
    #[serde(rename_all = "camelCase")]
    StopTracking { order_id: OrderId },
    /// 管理员修改订单状态
    #[serde(rename_all = "camelCase")]
    UpdateOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
        #[serde(default)]
        estimated_delivery: Option<Timestamp>,
        #[serde(default)]
        notes: Option<String>,
    },
    /// 管理员请求实时统计
    GetLiveStats {},
    /// 查询自己的订单
    GetMyOrders {},
    /// 管理员推送配送位置
    #[serde(rename_all = "camelCase")]
    UpdateDeliveryLocation {
        order_id: OrderId,
        latitude: f64,
        longitude: f64,
        address: String,
    },
    /// 管理员更新预计送达时间
    #[serde(rename_all = "camelCase")]
    UpdateEstimatedTime {
        order_id: OrderId,
        estimated_delivery: Timestamp,
    },
}

/// 配送位置负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub timestamp: Timestamp,
}

/// 服务端推送
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// 连接确认
    #[serde(rename_all = "camelCase")]
    Connected {
        message: String,
        user_id: UserId,
        role: Role,
    },
    /// 订单当前快照，仅发给订阅者本人
    #[serde(rename_all = "camelCase")]
    OrderStatus {
        order_id: OrderId,
        status: OrderStatus,
        estimated_delivery: Option<Timestamp>,
        items: Vec<LineItem>,
        total: f64,
        last_updated: Timestamp,
    },
    /// 状态流转广播，发往 `order:<id>` 房间
    #[serde(rename_all = "camelCase")]
    OrderStatusUpdated {
        order_id: OrderId,
        status: OrderStatus,
        previous_status: OrderStatus,
        estimated_delivery: Option<Timestamp>,
        last_updated: Timestamp,
        notes: Option<String>,
        updated_by: String,
    },
    /// 面向顾客的订单通知，发往 `user:<id>` 房间
    #[serde(rename_all = "camelCase")]
    OrderNotification {
        #[serde(rename = "type")]
        kind: String,
        order_id: OrderId,
        status: OrderStatus,
        message: String,
        timestamp: Timestamp,
    },
    /// 管理员审计事件，发往 `admin` 房间
    #[serde(rename_all = "camelCase")]
    AdminOrderUpdated {
        order_id: OrderId,
        status: OrderStatus,
        updated_by: String,
        timestamp: Timestamp,
    },
    /// 实时统计快照（按需请求，仅发给请求方）
    LiveStats(LiveStats),
    /// 当前用户订单列表
    MyOrders(Vec<Order>),
    /// 预计送达时间更新
    #[serde(rename_all = "camelCase")]
    EstimatedTimeUpdated {
        order_id: OrderId,
        estimated_delivery: Timestamp,
        timestamp: Timestamp,
    },
    /// 配送位置更新
    #[serde(rename_all = "camelCase")]
    DeliveryLocationUpdated {
        order_id: OrderId,
        location: DeliveryLocation,
    },
    /// 新订单提醒，发往 `admin` 房间
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: OrderId,
        customer_name: String,
        total: f64,
        items: usize,
        timestamp: Timestamp,
        order_type: OrderType,
    },
    /// 统计刷新推送，发往 `admin` 房间
    LiveStatsUpdate(LiveStats),
    /// 系统级通知，发给所有连接
    SystemNotification {
        #[serde(rename = "type")]
        kind: String,
        message: String,
        timestamp: Timestamp,
    },
    /// 错误，仅发给当事连接
    Error { message: String },
}

impl ServerEvent {
    /// 构造 error 事件的便利方法。
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_track_order_wire_shape() {
        let frame: ClientEvent =
            serde_json::from_value(json!({"event": "track_order", "data": {"orderId": 7}}))
                .unwrap();
        assert_eq!(
            frame,
            ClientEvent::TrackOrder {
                order_id: OrderId(7)
            }
        );
    }

    #[test]
    fn test_update_order_status_optional_fields() {
        let frame: ClientEvent = serde_json::from_value(json!({
            "event": "update_order_status",
            "data": {"orderId": 3, "status": "ready", "notes": "almost done"}
        }))
        .unwrap();
        match frame {
            ClientEvent::UpdateOrderStatus {
                order_id,
                status,
                estimated_delivery,
                notes,
            } => {
                assert_eq!(order_id, OrderId(3));
                assert_eq!(status, OrderStatus::Ready);
                assert!(estimated_delivery.is_none());
                assert_eq!(notes.as_deref(), Some("almost done"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_get_live_stats_empty_payload() {
        let frame: ClientEvent =
            serde_json::from_value(json!({"event": "get_live_stats", "data": {}})).unwrap();
        assert_eq!(frame, ClientEvent::GetLiveStats {});
    }

    #[test]
    fn test_order_notification_uses_type_field() {
        let event = ServerEvent::OrderNotification {
            kind: "status_update".to_string(),
            order_id: OrderId(42),
            status: OrderStatus::Ready,
            message: OrderStatus::Ready.customer_message().to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_notification");
        assert_eq!(json["data"]["type"], "status_update");
        assert_eq!(json["data"]["orderId"], 42);
        assert_eq!(json["data"]["status"], "ready");
    }

    #[test]
    fn test_order_status_updated_wire_shape() {
        let now = chrono::Utc::now();
        let event = ServerEvent::OrderStatusUpdated {
            order_id: OrderId(42),
            status: OrderStatus::Ready,
            previous_status: OrderStatus::Preparing,
            estimated_delivery: None,
            last_updated: now,
            notes: Some("almost done".to_string()),
            updated_by: "admin@example.com".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_status_updated");
        assert_eq!(json["data"]["previousStatus"], "preparing");
        assert_eq!(json["data"]["updatedBy"], "admin@example.com");
        assert!(json["data"]["lastUpdated"].is_string());
    }

    #[test]
    fn test_error_event_payload() {
        let json = serde_json::to_value(ServerEvent::error("Admin access required")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "Admin access required");
    }
}
