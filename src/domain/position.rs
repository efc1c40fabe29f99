use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row of the current position view: free balances plus the open take-profit lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPosition {
    pub base_free: Decimal,
    pub quote_free: Decimal,
    pub mark_price: Decimal,
    pub total_value_usdt: Decimal,
    pub last_update: Option<DateTime<Utc>>,
    pub open_count: i64,
    pub qty_in_tp_orders: Decimal,
    pub open_order_ids: Vec<String>,
    pub entry_at: Option<DateTime<Utc>>,
    pub entry_decision_uid: Option<String>,
    pub entry_price: Option<Decimal>,
    pub unrealized_pnl_pct: Option<Decimal>,
}

impl CurrentPosition {
    /// Free base quantity plus the quantity locked in take-profit orders.
    pub fn total_base(&self) -> Decimal {
        self.base_free.max(Decimal::ZERO) + self.qty_in_tp_orders.max(Decimal::ZERO)
    }

    pub fn known_entry_price(&self) -> Option<Decimal> {
        self.entry_price.filter(|price| *price > Decimal::ZERO)
    }
}
