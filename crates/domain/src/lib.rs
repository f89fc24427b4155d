//! 订单跟踪系统核心领域模型
//!
//! 包含订单、状态机、广播房间与协议事件等核心类型，以及相关的业务规则。

pub mod entities;
pub mod errors;
pub mod events;
pub mod rooms;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use rooms::*;
pub use value_objects::*;
