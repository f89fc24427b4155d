//! 应用层实现。
//!
//! 围绕领域模型提供用例服务：订单注册表、房间成员索引、连接路由、
//! 统计聚合、事件代理，以及对外部协作方（通知投递）的抽象。

pub mod broker;
pub mod clock;
pub mod notifier;
pub mod registry;
pub mod rooms;
pub mod router;
pub mod stats;

pub use broker::{ConnectionContext, EventBroker};
pub use clock::{Clock, SystemClock};
pub use notifier::{
    AuditEntry, AuditKind, LoggingDispatcher, NotificationBridge, NotificationDispatcher,
    NotificationError,
};
pub use registry::{OrderRegistry, StatusChange};
pub use rooms::RoomRegistry;
pub use router::{ConnectionRouter, EventSender};
pub use stats::compute_live_stats;
