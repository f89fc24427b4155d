//! 广播房间模型
//!
//! 房间只是当前成员索引里的一个名字，没有持久化存在，
//! 空房间等价于不存在的房间。

use std::fmt;

use crate::value_objects::{OrderId, UserId};

/// 逻辑广播组。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// 某个用户的全部连接（`user:<uuid>`）
    User(UserId),
    /// 正在跟踪某个订单的连接（`order:<id>`）
    Order(OrderId),
    /// 全部管理员连接（`admin`）
    Admin,
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{}", id),
            Room::Order(id) => write!(f, "order:{}", id),
            Room::Admin => f.write_str("admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_room_names() {
        let user_id = Uuid::new_v4();
        assert_eq!(
            Room::User(UserId(user_id)).to_string(),
            format!("user:{}", user_id)
        );
        assert_eq!(Room::Order(OrderId(42)).to_string(), "order:42");
        assert_eq!(Room::Admin.to_string(), "admin");
    }
}
