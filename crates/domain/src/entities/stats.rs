//! 实时统计实体
//!
//! 统计快照由应用层在每次请求时从注册表重新计算，领域层只定义形状。

use serde::{Deserialize, Serialize};

/// 实时订单统计快照，字段名即线上契约。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub total_orders: usize,
    /// 当天（UTC 日历日）创建的订单数
    pub today_orders: usize,
    pub pending_orders: usize,
    pub confirmed_orders: usize,
    pub preparing_orders: usize,
    pub ready_orders: usize,
    pub out_for_delivery_orders: usize,
    /// 已送达订单的总金额
    pub revenue: f64,
    /// 全部订单的平均金额，四舍五入到分；没有订单时为 0
    pub average_order_value: f64,
}
