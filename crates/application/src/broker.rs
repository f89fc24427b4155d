//! 事件代理
//!
//! 协议核心。对每个入站意图执行 (a) 角色/归属鉴权、(b) 经由订单
//! 注册表的状态变更、(c) 面向房间的定序广播。鉴权规则和广播顺序
//! 集中在这里一次性约束，而不是散落在各个调用点。
//!
//! 单次意图产生的广播按固定顺序发出：订单房间事件 → 顾客通知 →
//! 管理员审计，任何观察者都不会先于订单房间看到审计事件。

use std::sync::Arc;

use tracing::{info, warn};

use domain::{
    ClientEvent, ConnectionId, DeliveryLocation, DomainError, DomainResult, Order, OrderDraft,
    OrderId, OrderStatus, Role, Room, ServerEvent, Timestamp, UserId,
};

use crate::clock::Clock;
use crate::notifier::NotificationBridge;
use crate::registry::OrderRegistry;
use crate::rooms::RoomRegistry;
use crate::router::{ConnectionRouter, EventSender};
use crate::stats::compute_live_stats;

/// 一个已认证连接的不可变上下文，字段取自凭证。
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub role: Role,
    pub email: String,
}

pub struct EventBroker {
    registry: Arc<OrderRegistry>,
    rooms: Arc<RoomRegistry>,
    router: Arc<ConnectionRouter>,
    bridge: Arc<NotificationBridge>,
    clock: Arc<dyn Clock>,
}

impl EventBroker {
    pub fn new(
        registry: Arc<OrderRegistry>,
        rooms: Arc<RoomRegistry>,
        router: Arc<ConnectionRouter>,
        bridge: Arc<NotificationBridge>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            rooms,
            router,
            bridge,
            clock,
        }
    }

    // === 连接生命周期 ===

    /// 注册新连接：登记发送通道、自动加入个人房间（管理员另加
    /// `admin` 房间）、下发欢迎事件。凭证校验已经在升级阶段完成，
    /// 未通过校验的连接不会走到这里。
    pub async fn register_connection(&self, ctx: &ConnectionContext, sender: EventSender) {
        self.router.register(ctx.connection_id, sender).await;
        self.rooms
            .join(ctx.connection_id, Room::User(ctx.user_id))
            .await;
        if ctx.role.is_admin() {
            self.rooms.join(ctx.connection_id, Room::Admin).await;
            info!(email = %ctx.email, "Admin joined admin room");
        }
        self.router
            .send_to(
                ctx.connection_id,
                ServerEvent::Connected {
                    message: "Connected to real-time tracking".to_string(),
                    user_id: ctx.user_id,
                    role: ctx.role,
                },
            )
            .await;
        info!(email = %ctx.email, connection_id = %ctx.connection_id, "User connected");
    }

    /// 连接断开：拆除全部房间关联并注销发送通道，没有其他副作用。
    pub async fn disconnect(&self, ctx: &ConnectionContext) {
        self.rooms.remove_connection(ctx.connection_id).await;
        self.router.unregister(ctx.connection_id).await;
        info!(email = %ctx.email, connection_id = %ctx.connection_id, "User disconnected");
    }

    // === 入站意图 ===

    /// 入站意图的统一入口。任何失败只会以 `error` 事件回到请求方，
    /// 不广播、不变更状态、不影响其他连接。
    pub async fn handle_event(&self, ctx: &ConnectionContext, event: ClientEvent) {
        let result = match event {
            ClientEvent::TrackOrder { order_id } => self.track_order(ctx, order_id).await,
            ClientEvent::StopTracking { order_id } => {
                self.stop_tracking(ctx, order_id).await;
                Ok(())
            }
            ClientEvent::UpdateOrderStatus {
                order_id,
                status,
                estimated_delivery,
                notes,
            } => {
                self.update_order_status(ctx, order_id, status, estimated_delivery, notes)
                    .await
            }
            ClientEvent::GetLiveStats {} => self.get_live_stats(ctx).await,
            ClientEvent::GetMyOrders {} => {
                self.get_my_orders(ctx).await;
                Ok(())
            }
            ClientEvent::UpdateDeliveryLocation {
                order_id,
                latitude,
                longitude,
                address,
            } => {
                self.update_delivery_location(ctx, order_id, latitude, longitude, address)
                    .await
            }
            ClientEvent::UpdateEstimatedTime {
                order_id,
                estimated_delivery,
            } => {
                self.update_estimated_time(ctx, order_id, estimated_delivery)
                    .await
            }
        };
        if let Err(err) = result {
            self.send_error(ctx.connection_id, err.to_string()).await;
        }
    }

    /// 报告无法解析的帧；不做任何状态变更。
    pub async fn report_malformed(&self, connection_id: ConnectionId, reason: &str) {
        warn!(connection_id = %connection_id, reason, "Malformed client frame");
        self.send_error(connection_id, "Invalid message format".to_string())
            .await;
    }

    /// 订阅订单：本人或管理员可订阅；成功后只给请求方回当前快照。
    async fn track_order(&self, ctx: &ConnectionContext, order_id: OrderId) -> DomainResult<()> {
        let order = self
            .registry
            .find(order_id)
            .await
            .filter(|order| order.is_owned_by(ctx.user_id) || ctx.role.is_admin())
            .ok_or(DomainError::AccessDenied(order_id))?;

        self.rooms
            .join(ctx.connection_id, Room::Order(order_id))
            .await;
        self.router
            .send_to(
                ctx.connection_id,
                ServerEvent::OrderStatus {
                    order_id: order.id,
                    status: order.status,
                    estimated_delivery: order.estimated_delivery,
                    items: order.items.clone(),
                    total: order.total,
                    last_updated: order.updated_at,
                },
            )
            .await;
        info!(email = %ctx.email, order_id = %order_id, "Tracking order");
        Ok(())
    }

    /// 退订不需要鉴权，退订未订阅的订单是空操作。
    async fn stop_tracking(&self, ctx: &ConnectionContext, order_id: OrderId) {
        self.rooms
            .leave(ctx.connection_id, Room::Order(order_id))
            .await;
        info!(email = %ctx.email, order_id = %order_id, "Stopped tracking order");
    }

    async fn update_order_status(
        &self,
        ctx: &ConnectionContext,
        order_id: OrderId,
        status: OrderStatus,
        estimated_delivery: Option<Timestamp>,
        notes: Option<String>,
    ) -> DomainResult<()> {
        self.require_admin(ctx)?;
        let change = self
            .registry
            .update_status(order_id, status, &ctx.email, notes.clone(), estimated_delivery)
            .await?;
        let order = &change.order;

        self.broadcast_to_room(
            Room::Order(order_id),
            &ServerEvent::OrderStatusUpdated {
                order_id: order.id,
                status: order.status,
                previous_status: change.previous_status,
                estimated_delivery: order.estimated_delivery,
                last_updated: order.updated_at,
                notes,
                updated_by: ctx.email.clone(),
            },
        )
        .await;

        self.broadcast_to_room(
            Room::User(order.user_id),
            &ServerEvent::OrderNotification {
                kind: "status_update".to_string(),
                order_id: order.id,
                status: order.status,
                message: order.status.customer_message().to_string(),
                timestamp: self.clock.now(),
            },
        )
        .await;

        self.broadcast_to_room(
            Room::Admin,
            &ServerEvent::AdminOrderUpdated {
                order_id: order.id,
                status: order.status,
                updated_by: ctx.email.clone(),
                timestamp: order.updated_at,
            },
        )
        .await;

        self.bridge.status_changed(order, &ctx.email).await;
        Ok(())
    }

    async fn get_live_stats(&self, ctx: &ConnectionContext) -> DomainResult<()> {
        self.require_admin(ctx)?;
        let snapshot = self.registry.snapshot().await;
        let stats = compute_live_stats(&snapshot, self.clock.now());
        self.router
            .send_to(ctx.connection_id, ServerEvent::LiveStats(stats))
            .await;
        Ok(())
    }

    /// 自助查询，只返回请求方自己的订单。
    async fn get_my_orders(&self, ctx: &ConnectionContext) {
        let orders = self.registry.find_by_owner(ctx.user_id).await;
        self.router
            .send_to(ctx.connection_id, ServerEvent::MyOrders(orders))
            .await;
    }

    /// 位置是纯广播遥测，不在订单上落地。
    async fn update_delivery_location(
        &self,
        ctx: &ConnectionContext,
        order_id: OrderId,
        latitude: f64,
        longitude: f64,
        address: String,
    ) -> DomainResult<()> {
        self.require_admin(ctx)?;
        self.registry
            .find(order_id)
            .await
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let timestamp = self.clock.now();
        self.broadcast_to_room(
            Room::Order(order_id),
            &ServerEvent::DeliveryLocationUpdated {
                order_id,
                location: DeliveryLocation {
                    latitude,
                    longitude,
                    address,
                    timestamp,
                },
            },
        )
        .await;
        info!(order_id = %order_id, "Delivery location updated");
        Ok(())
    }

    async fn update_estimated_time(
        &self,
        ctx: &ConnectionContext,
        order_id: OrderId,
        estimated_delivery: Timestamp,
    ) -> DomainResult<()> {
        self.require_admin(ctx)?;
        let order = self
            .registry
            .update_estimated_delivery(order_id, estimated_delivery)
            .await?;
        self.broadcast_to_room(
            Room::Order(order_id),
            &ServerEvent::EstimatedTimeUpdated {
                order_id,
                estimated_delivery,
                timestamp: order.updated_at,
            },
        )
        .await;
        Ok(())
    }

    // === 下单协作方接口 ===

    /// 注册新订单，供外部下单层调用；注册本身不做广播。
    pub async fn register_order(&self, draft: OrderDraft) -> Order {
        self.registry.register(draft).await
    }

    /// 新订单的管理员提醒与统计刷新，随后触发通知桥。
    /// 下单层无须了解任何房间内部结构。
    pub async fn notify_admins(&self, order: &Order) {
        self.broadcast_to_room(
            Room::Admin,
            &ServerEvent::NewOrder {
                order_id: order.id,
                customer_name: order.customer.name.clone(),
                total: order.total,
                items: order.items.len(),
                timestamp: order.created_at,
                order_type: order.order_type,
            },
        )
        .await;

        let snapshot = self.registry.snapshot().await;
        let stats = compute_live_stats(&snapshot, self.clock.now());
        self.broadcast_to_room(Room::Admin, &ServerEvent::LiveStatsUpdate(stats))
            .await;

        self.bridge.order_placed(order).await;
    }

    /// 系统级通知，推给当前全部连接。
    pub async fn broadcast_system_notification(&self, kind: &str, message: &str) {
        self.router
            .broadcast_all(&ServerEvent::SystemNotification {
                kind: kind.to_string(),
                message: message.to_string(),
                timestamp: self.clock.now(),
            })
            .await;
    }

    // === 辅助 ===

    fn require_admin(&self, ctx: &ConnectionContext) -> DomainResult<()> {
        if ctx.role.is_admin() {
            Ok(())
        } else {
            Err(DomainError::AdminRequired)
        }
    }

    async fn send_error(&self, connection_id: ConnectionId, message: String) {
        self.router
            .send_to(connection_id, ServerEvent::error(message))
            .await;
    }

    async fn broadcast_to_room(&self, room: Room, event: &ServerEvent) {
        let members = self.rooms.members_of(room).await;
        if !members.is_empty() {
            self.router.send_to_many(&members, event).await;
        }
    }
}
