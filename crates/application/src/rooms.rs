//! 房间成员索引
//!
//! 记录连接与房间的多对多关联，不拥有连接对象本身。
//! 重复加入幂等，离开未加入的房间是空操作；两张索引放在同一把锁
//! 之下，连接销毁时的整体拆除对观察者是原子的。

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::debug;

use domain::{ConnectionId, Room};

#[derive(Default)]
struct Membership {
    room_members: HashMap<Room, HashSet<ConnectionId>>,
    connection_rooms: HashMap<ConnectionId, HashSet<Room>>,
}

/// 房间成员注册表。
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Membership>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, connection_id: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        inner
            .room_members
            .entry(room)
            .or_default()
            .insert(connection_id);
        inner
            .connection_rooms
            .entry(connection_id)
            .or_default()
            .insert(room);
        debug!(connection_id = %connection_id, room = %room, "Connection joined room");
    }

    pub async fn leave(&self, connection_id: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.room_members.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                inner.room_members.remove(&room);
            }
        }
        if let Some(rooms) = inner.connection_rooms.get_mut(&connection_id) {
            rooms.remove(&room);
            if rooms.is_empty() {
                inner.connection_rooms.remove(&connection_id);
            }
        }
        debug!(connection_id = %connection_id, room = %room, "Connection left room");
    }

    pub async fn members_of(&self, room: Room) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner
            .room_members
            .get(&room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<Room> {
        let inner = self.inner.read().await;
        inner
            .connection_rooms
            .get(&connection_id)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 拆除一个连接的全部关联。
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;
        if let Some(rooms) = inner.connection_rooms.remove(&connection_id) {
            for room in rooms {
                if let Some(members) = inner.room_members.get_mut(&room) {
                    members.remove(&connection_id);
                    if members.is_empty() {
                        inner.room_members.remove(&room);
                    }
                }
            }
        }
        debug!(connection_id = %connection_id, "Connection memberships removed");
    }
}
