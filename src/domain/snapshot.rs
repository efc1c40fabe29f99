use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ClosedOrder, CommissionSummary, HistoricalPoint, OpenOrder, RecentDecision};

/// Aggregate handed to the dashboard. Built fresh per request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub account_value: Decimal,
    pub aster_balance: Decimal,
    pub usdt_balance: Decimal,
    pub current_price: Decimal,
    pub highest_price: Decimal,
    pub lowest_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub realized_pnl: Decimal,
    pub total_decisions: i64,
    pub buy_count: i64,
    pub sell_count: i64,
    pub hold_count: i64,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub open_tp_orders: i64,
    pub qty_in_tp_orders: Decimal,
    pub last_decision: LastDecision,
    pub runtime: RuntimeSummary,
    pub position: PositionSummary,
    pub historical_data: Vec<HistoricalPoint>,
    pub recent_decisions: Vec<RecentDecision>,
    pub open_orders: Vec<OpenOrder>,
    pub filled_orders: Vec<ClosedOrder>,
    pub canceled_orders: Vec<ClosedOrder>,
    pub commissions: Option<CommissionSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastDecision {
    pub timestamp: Option<DateTime<Utc>>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSummary {
    pub first_decision: Option<DateTime<Utc>>,
    pub last_decision: Option<DateTime<Utc>>,
    pub days_since_start: i64,
    pub total_runtime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub has_position: bool,
    pub entry_price: Decimal,
    pub entry_time: Option<DateTime<Utc>>,
    pub current_qty: Decimal,
}
