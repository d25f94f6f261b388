//! Read-only domain snapshots the evaluators consume. The pipeline never
//! touches product/order/vendor storage — callers project the fields the
//! evaluators need and pass them in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_common::{Identity, Priority};

/// Physical package dimensions in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: f64,
    pub breadth_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub vendor_user_id: Uuid,
    pub name: String,
    pub stock: i64,
    /// Product-level low-stock threshold, when the vendor set one.
    pub low_stock_threshold: Option<i64>,
    pub dimensions: Option<Dimensions>,
    /// Pre-computed cubic weight. Takes precedence over the geometric
    /// formula when present.
    pub cubic_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub vendor_user_id: Uuid,
    pub order_number: String,
    pub item_count: u32,
    pub total_cents: i64,
    pub currency: String,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionChange {
    pub vendor_user_id: Uuid,
    pub old_rate_percent: f64,
    pub new_rate_percent: f64,
    pub effective_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorStatusChange {
    pub vendor_user_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAlert {
    pub recipient: Identity,
    pub component: String,
    pub severity: Priority,
    pub summary: String,
}
