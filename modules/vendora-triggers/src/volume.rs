//! Cubic-volume (volumetric weight) trigger.

use serde_json::json;

use vendora_common::{Identity, NotificationRequest, NotificationType, Priority, Role};

use crate::snapshots::{Dimensions, ProductSnapshot};
use crate::object;

/// Courier volumetric divisor: cm³ / 6000 = kg.
const CUBIC_DIVISOR: f64 = 6000.0;

/// Default shipping limit in kilograms.
pub const DEFAULT_CUBIC_WEIGHT_THRESHOLD_KG: f64 = 32.0;

/// Volumetric weight for a product. A supplied pre-computed weight always
/// overrides the geometric formula; missing dimensions weigh nothing.
pub fn cubic_weight_kg(product: &ProductSnapshot) -> f64 {
    if let Some(precomputed) = product.cubic_weight_kg {
        return precomputed;
    }
    match product.dimensions {
        Some(d) => (d.length_cm * d.breadth_cm * d.height_cm) / CUBIC_DIVISOR,
        None => 0.0,
    }
}

fn dimensions_changed(previous: &Dimensions, current: &Dimensions) -> bool {
    previous.length_cm != current.length_cm
        || previous.breadth_cm != current.breadth_cm
        || previous.height_cm != current.height_cm
}

/// Fires when the volumetric weight strictly exceeds `threshold_kg`.
///
/// On update flows (`previous_dims` supplied), fires only when at least one
/// dimension actually changed value — a payload that re-sends identical
/// dimensions, or drops them, must not re-trigger.
pub fn cubic_volume(
    product: &ProductSnapshot,
    previous_dims: Option<Dimensions>,
    threshold_kg: f64,
) -> Option<NotificationRequest> {
    let weight = cubic_weight_kg(product);
    if weight <= threshold_kg {
        return None;
    }

    if let Some(previous) = previous_dims {
        match product.dimensions {
            Some(current) => {
                if !dimensions_changed(&previous, &current) {
                    return None;
                }
            }
            // Dimensions removed on update: weight comes from the
            // precomputed field or is 0; either way nothing changed
            // geometrically, so don't re-trigger.
            None => return None,
        }
    }

    Some(
        NotificationRequest::builder()
            .recipient(Identity {
                user_id: product.vendor_user_id,
                role: Role::VendorAdmin,
            })
            .notification_type(NotificationType::CubicVolumeAlert)
            .title(format!("Cubic volume alert: {}", product.name))
            .message(format!(
                "\"{}\" has a cubic weight of {:.2} kg, above the {:.0} kg shipping limit.",
                product.name, weight, threshold_kg
            ))
            .metadata(object(json!({
                "product_id": product.product_id,
                "cubic_weight_kg": weight,
                "threshold_kg": threshold_kg,
            })))
            .priority(Priority::Medium)
            .action_url(format!("/products/{}", product.product_id))
            .build(),
    )
}
