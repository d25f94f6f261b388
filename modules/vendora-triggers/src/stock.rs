//! Low-stock trigger.

use serde_json::json;

use vendora_common::{Identity, NotificationRequest, NotificationType, Priority, Role};

use crate::snapshots::ProductSnapshot;
use crate::object;

/// Platform fallback when neither the product nor the vendor sets one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

fn in_band(stock: i64, threshold: i64) -> bool {
    stock > 0 && stock <= threshold
}

/// Fires when stock sits in the low-stock band `(0, threshold]`. The
/// boundary counts as low; zero is out-of-stock, a different condition.
///
/// With `previous_stock` supplied (update flows), fires only on the
/// transition into the band so repeated saves while stock stays low don't
/// re-fire. Without it (creation flows), fires whenever the condition holds.
pub fn low_stock(
    product: &ProductSnapshot,
    previous_stock: Option<i64>,
    vendor_default_threshold: Option<i64>,
) -> Option<NotificationRequest> {
    let threshold = product
        .low_stock_threshold
        .or(vendor_default_threshold)
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

    if !in_band(product.stock, threshold) {
        return None;
    }
    if let Some(previous) = previous_stock {
        if in_band(previous, threshold) {
            return None;
        }
    }

    Some(
        NotificationRequest::builder()
            .recipient(Identity {
                user_id: product.vendor_user_id,
                role: Role::VendorAdmin,
            })
            .notification_type(NotificationType::LowStock)
            .title(format!("Low stock: {}", product.name))
            .message(format!(
                "\"{}\" is down to {} units (threshold {}).",
                product.name, product.stock, threshold
            ))
            .metadata(object(json!({
                "product_id": product.product_id,
                "stock": product.stock,
                "threshold": threshold,
            })))
            .priority(Priority::High)
            .action_url(format!("/products/{}", product.product_id))
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn product(stock: i64, threshold: Option<i64>) -> ProductSnapshot {
        ProductSnapshot {
            product_id: Uuid::new_v4(),
            vendor_user_id: Uuid::new_v4(),
            name: "Blue Mug".to_string(),
            stock,
            low_stock_threshold: threshold,
            dimensions: None,
            cubic_weight_kg: None,
        }
    }

    #[test]
    fn fires_below_threshold() {
        let req = low_stock(&product(5, Some(10)), None, None).expect("should fire");
        assert_eq!(req.notification_type, NotificationType::LowStock);
        assert!(req.message.contains("5 units"));
    }

    #[test]
    fn silent_above_threshold() {
        assert!(low_stock(&product(15, Some(10)), None, None).is_none());
    }

    #[test]
    fn boundary_counts_as_low() {
        assert!(low_stock(&product(10, Some(10)), None, None).is_some());
    }

    #[test]
    fn just_above_boundary_is_silent() {
        assert!(low_stock(&product(11, Some(10)), None, None).is_none());
    }

    #[test]
    fn zero_stock_never_fires() {
        // Out-of-stock is a distinct condition, not a low-stock alert.
        assert!(low_stock(&product(0, Some(10)), None, None).is_none());
    }

    #[test]
    fn vendor_default_used_when_product_has_none() {
        assert!(low_stock(&product(18, None), None, Some(20)).is_some());
        assert!(low_stock(&product(21, None), None, Some(20)).is_none());
    }

    #[test]
    fn platform_default_is_ten() {
        assert!(low_stock(&product(10, None), None, None).is_some());
        assert!(low_stock(&product(11, None), None, None).is_none());
    }

    #[test]
    fn product_threshold_wins_over_vendor_default() {
        // Product says 5, vendor default says 20 — stock 8 is not low.
        assert!(low_stock(&product(8, Some(5)), None, Some(20)).is_none());
    }

    #[test]
    fn fires_on_transition_into_band() {
        assert!(low_stock(&product(9, Some(10)), Some(12), None).is_some());
    }

    #[test]
    fn does_not_refire_while_stock_stays_low() {
        assert!(low_stock(&product(7, Some(10)), Some(9), None).is_none());
    }

    #[test]
    fn restock_from_zero_into_band_fires() {
        assert!(low_stock(&product(3, Some(10)), Some(0), None).is_some());
    }

    #[test]
    fn creation_flow_fires_without_previous_state() {
        assert!(low_stock(&product(4, Some(10)), None, None).is_some());
    }
}
