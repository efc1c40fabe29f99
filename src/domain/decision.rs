use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counters over the decisions table plus the balances recorded by the latest row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionStats {
    pub buy_count: i64,
    pub sell_count: i64,
    pub hold_count: i64,
    pub first_decision: Option<DateTime<Utc>>,
    pub last_decision: Option<DateTime<Utc>>,
    pub last_action: Option<String>,
    pub last_price: Option<Decimal>,
    pub has_position: Option<bool>,
    pub base_qty: Option<Decimal>,
    pub usdt_free: Option<Decimal>,
}

impl DecisionStats {
    /// Only buy/sell/hold rows are counted, so the total is always their sum.
    pub fn total(&self) -> i64 {
        self.buy_count + self.sell_count + self.hold_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentDecision {
    pub decision_uid: String,
    pub decided_at: Option<DateTime<Utc>>,
    pub action: String,
    pub note: Option<String>,
    pub regime_key: Option<String>,
    pub last_close: Option<Decimal>,
    pub rsi14_3m: Option<Decimal>,
    pub adx14_3m: Option<Decimal>,
    pub has_position: bool,
}
