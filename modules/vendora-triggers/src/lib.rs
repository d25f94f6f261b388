//! Trigger evaluators — pure decision functions from domain snapshots to
//! candidate notification requests.
//!
//! Stateless, deterministic, side-effect free. Any I/O (fetching a vendor's
//! default threshold, loading the prior product state) happens before an
//! evaluator runs and arrives as input.

pub mod events;
pub mod snapshots;
pub mod stock;
pub mod volume;

pub use events::{commission_update, new_order, system_alert, vendor_status_change};
pub use snapshots::*;
pub use stock::low_stock;
pub use volume::{cubic_volume, cubic_weight_kg};

/// Unwrap a `json!` object literal into the metadata map shape.
pub(crate) fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("metadata literals are always objects"),
    }
}
