//! Unconditional triggers. The decision to invoke these is business logic in
//! the caller (an order was placed, a rate was changed); the evaluator's job
//! is shaping the type-specific request.

use serde_json::json;

use vendora_common::{Identity, NotificationRequest, NotificationType, Priority, Role};

use crate::snapshots::{CommissionChange, OrderSnapshot, SystemAlert, VendorStatusChange};
use crate::object;

pub fn new_order(order: &OrderSnapshot) -> NotificationRequest {
    let total = format!(
        "{}.{:02} {}",
        order.total_cents / 100,
        order.total_cents % 100,
        order.currency
    );
    NotificationRequest::builder()
        .recipient(Identity {
            user_id: order.vendor_user_id,
            role: Role::VendorAdmin,
        })
        .notification_type(NotificationType::NewOrder)
        .title(format!("New order {}", order.order_number))
        .message(format!(
            "You received a new order of {} item(s) totalling {}.",
            order.item_count, total
        ))
        .metadata(object(json!({
            "order_id": order.order_id,
            "order_number": order.order_number,
            "item_count": order.item_count,
            "total_cents": order.total_cents,
            "currency": order.currency,
            "placed_at": order.placed_at,
        })))
        .priority(Priority::Medium)
        .action_url(format!("/orders/{}", order.order_id))
        .build()
}

pub fn commission_update(change: &CommissionChange) -> NotificationRequest {
    NotificationRequest::builder()
        .recipient(Identity {
            user_id: change.vendor_user_id,
            role: Role::VendorAdmin,
        })
        .notification_type(NotificationType::CommissionUpdate)
        .title("Commission rate update")
        .message(format!(
            "Your commission rate changes from {:.2}% to {:.2}%, effective {}.",
            change.old_rate_percent,
            change.new_rate_percent,
            change.effective_at.format("%Y-%m-%d")
        ))
        .metadata(object(json!({
            "old_rate_percent": change.old_rate_percent,
            "new_rate_percent": change.new_rate_percent,
            "delta_percent": change.new_rate_percent - change.old_rate_percent,
            "effective_at": change.effective_at,
        })))
        .priority(Priority::High)
        .build()
}

pub fn vendor_status_change(change: &VendorStatusChange) -> NotificationRequest {
    let mut message = format!(
        "Your vendor account status changed from {} to {}.",
        change.old_status, change.new_status
    );
    if let Some(reason) = &change.reason {
        message.push_str(&format!(" Reason: {reason}"));
    }
    NotificationRequest::builder()
        .recipient(Identity {
            user_id: change.vendor_user_id,
            role: Role::VendorAdmin,
        })
        .notification_type(NotificationType::VendorStatusChange)
        .title("Account status changed")
        .message(message)
        .metadata(object(json!({
            "old_status": change.old_status,
            "new_status": change.new_status,
            "reason": change.reason,
        })))
        .priority(Priority::High)
        .build()
}

pub fn system_alert(alert: &SystemAlert) -> NotificationRequest {
    NotificationRequest::builder()
        .recipient(alert.recipient)
        .notification_type(NotificationType::SystemAlert)
        .title(format!("System alert: {}", alert.component))
        .message(alert.summary.clone())
        .metadata(object(json!({
            "component": alert.component,
            "severity": alert.severity,
        })))
        .priority(alert.severity)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vendora_common::{NotificationCategory, Priority};

    #[test]
    fn new_order_carries_order_metadata() {
        let order = OrderSnapshot {
            order_id: Uuid::new_v4(),
            vendor_user_id: Uuid::new_v4(),
            order_number: "VO-1042".to_string(),
            item_count: 3,
            total_cents: 15997,
            currency: "USD".to_string(),
            placed_at: Utc::now(),
        };
        let req = new_order(&order);
        assert_eq!(req.category(), NotificationCategory::Order);
        assert!(req.title.contains("VO-1042"));
        assert!(req.message.contains("159.97 USD"));
        assert_eq!(req.metadata["item_count"], serde_json::json!(3));
    }

    #[test]
    fn commission_update_reports_rate_delta() {
        let change = CommissionChange {
            vendor_user_id: Uuid::new_v4(),
            old_rate_percent: 10.0,
            new_rate_percent: 12.5,
            effective_at: Utc::now(),
        };
        let req = commission_update(&change);
        assert!(req.message.contains("10.00%"));
        assert!(req.message.contains("12.50%"));
        assert_eq!(req.metadata["delta_percent"], serde_json::json!(2.5));
    }

    #[test]
    fn vendor_status_change_includes_transition_pair() {
        let change = VendorStatusChange {
            vendor_user_id: Uuid::new_v4(),
            old_status: "active".to_string(),
            new_status: "suspended".to_string(),
            reason: Some("policy review".to_string()),
        };
        let req = vendor_status_change(&change);
        assert!(req.message.contains("active"));
        assert!(req.message.contains("suspended"));
        assert!(req.message.contains("policy review"));
    }

    #[test]
    fn system_alert_priority_tracks_severity() {
        let alert = SystemAlert {
            recipient: Identity::user(Uuid::new_v4()),
            component: "payment-gateway".to_string(),
            severity: Priority::Urgent,
            summary: "Gateway error rate above 5%".to_string(),
        };
        let req = system_alert(&alert);
        assert_eq!(req.priority, Priority::Urgent);
        assert_eq!(req.category(), NotificationCategory::System);
    }
}
