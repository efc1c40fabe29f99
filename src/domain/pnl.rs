use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed round-trip: a filled entry matched with its filled exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentTrade {
    pub entry_order_id: Option<i64>,
    pub exit_order_id: Option<i64>,
    pub entry_decision_uid: Option<String>,
    pub exit_decision_uid: Option<String>,
    pub order_group_uid: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub entry_price: Decimal,
    pub entry_quantity: Decimal,
    pub entry_cost_usdt: Decimal,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Decimal,
    pub exit_quantity: Decimal,
    pub exit_proceeds_usdt: Decimal,
    pub pnl_pct: Decimal,
    pub pnl_usdt: Decimal,
    pub hold_time_minutes: Decimal,
    pub regime_key: Option<String>,
}

/// Fees paid on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub date: Option<NaiveDate>,
    pub usdt_fees: Decimal,
    pub aster_fees: Decimal,
    pub executions: i64,
}
