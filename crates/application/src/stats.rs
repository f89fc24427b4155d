//! 实时统计聚合
//!
//! 对注册表快照逐单归约的纯函数：不缓存、无自有状态，
//! 结果与调用时刻的注册表严格一致。

use domain::{LiveStats, Order, OrderStatus, Timestamp};

/// 金额四舍五入到分。
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 从订单快照计算实时统计。
///
/// "今日" 按 UTC 日历日与 `now` 相等判定；营收只累计已送达订单；
/// 平均单价覆盖全部订单（含终态），没有订单时为 0 而不是除零。
pub fn compute_live_stats(orders: &[Order], now: Timestamp) -> LiveStats {
    let today = now.date_naive();
    let mut stats = LiveStats {
        total_orders: 0,
        today_orders: 0,
        pending_orders: 0,
        confirmed_orders: 0,
        preparing_orders: 0,
        ready_orders: 0,
        out_for_delivery_orders: 0,
        revenue: 0.0,
        average_order_value: 0.0,
    };

    let mut total_value = 0.0;
    for order in orders {
        stats.total_orders += 1;
        total_value += order.total;
        if order.created_at.date_naive() == today {
            stats.today_orders += 1;
        }
        match order.status {
            OrderStatus::Pending => stats.pending_orders += 1,
            OrderStatus::Confirmed => stats.confirmed_orders += 1,
            OrderStatus::Preparing => stats.preparing_orders += 1,
            OrderStatus::Ready => stats.ready_orders += 1,
            OrderStatus::OutForDelivery => stats.out_for_delivery_orders += 1,
            OrderStatus::Delivered => stats.revenue += order.total,
            OrderStatus::Cancelled => {}
        }
    }

    stats.revenue = round_cents(stats.revenue);
    if stats.total_orders > 0 {
        stats.average_order_value = round_cents(total_value / stats.total_orders as f64);
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use domain::{CustomerInfo, LineItem, OrderId, OrderType, StatusHistoryEntry, UserId};

    use super::*;

    fn order_with(id: i64, status: OrderStatus, total: f64, created_at: Timestamp) -> Order {
        Order {
            id: OrderId(id),
            user_id: UserId(Uuid::new_v4()),
            items: vec![LineItem {
                name: "Classic Burger".to_string(),
                price: total,
                quantity: 1,
            }],
            total,
            status,
            estimated_delivery: None,
            customer: CustomerInfo {
                name: "Alice".to_string(),
                phone: "555-0100".to_string(),
                address: "1 Main St".to_string(),
            },
            order_type: OrderType::Delivery,
            status_history: vec![StatusHistoryEntry {
                status,
                timestamp: created_at,
                updated_by: "system".to_string(),
                notes: None,
            }],
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_revenue_counts_delivered_orders_only() {
        let now = Utc::now();
        let orders = vec![
            order_with(1, OrderStatus::Delivered, 17.98, now),
            order_with(2, OrderStatus::Delivered, 12.99, now),
            order_with(3, OrderStatus::Pending, 9.00, now),
        ];

        let stats = compute_live_stats(&orders, now);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.revenue, 30.97);
        assert_eq!(stats.average_order_value, 13.32);
    }

    #[test]
    fn test_empty_registry_yields_zeroes() {
        let stats = compute_live_stats(&[], Utc::now());
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.revenue, 0.0);
        // 没有订单时平均值为 0，不做除法
        assert_eq!(stats.average_order_value, 0.0);
    }

    #[test]
    fn test_today_is_utc_calendar_day_equality() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 30).unwrap();
        let late_yesterday = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();
        let early_today = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();

        let orders = vec![
            order_with(1, OrderStatus::Pending, 10.0, late_yesterday),
            order_with(2, OrderStatus::Pending, 10.0, early_today),
        ];

        let stats = compute_live_stats(&orders, now);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.today_orders, 1);
    }

    #[test]
    fn test_per_status_counts_and_cancelled_exclusion() {
        let now = Utc::now();
        let orders = vec![
            order_with(1, OrderStatus::Pending, 5.0, now),
            order_with(2, OrderStatus::Confirmed, 5.0, now),
            order_with(3, OrderStatus::Preparing, 5.0, now),
            order_with(4, OrderStatus::Ready, 5.0, now),
            order_with(5, OrderStatus::OutForDelivery, 5.0, now),
            order_with(6, OrderStatus::Cancelled, 5.0, now - Duration::days(1)),
        ];

        let stats = compute_live_stats(&orders, now);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.confirmed_orders, 1);
        assert_eq!(stats.preparing_orders, 1);
        assert_eq!(stats.ready_orders, 1);
        assert_eq!(stats.out_for_delivery_orders, 1);
        // 已取消订单不计营收，但计入总数和平均值
        assert_eq!(stats.revenue, 0.0);
        assert_eq!(stats.total_orders, 6);
        assert_eq!(stats.average_order_value, 5.0);
        assert_eq!(stats.today_orders, 5);
    }
}
