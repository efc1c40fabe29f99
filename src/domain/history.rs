use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hourly average over every decision recorded in that hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub account_value: Decimal,
    pub usdt_balance: Decimal,
    pub aster_qty: Decimal,
    pub aster_price: Decimal,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub highest: Decimal,
    pub lowest: Decimal,
}
