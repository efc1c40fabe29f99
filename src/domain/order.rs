use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status spellings the upstream bot has used for orders that ended without a fill.
pub const CANCELED_STATUSES: [&str; 4] = ["CANCELED", "CANCELLED", "EXPIRED", "REJECTED"];

/// Open take-profit order, enriched with its age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: i64,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub value_usdt: Option<Decimal>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub age_minutes: Decimal,
}

/// Filled or canceled order. `price` and `quantity` stay `None` when the
/// exchange never reported them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedOrder {
    pub order_id: i64,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

