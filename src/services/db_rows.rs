//! Raw rows as decoded from PostgreSQL.
//!
//! Numeric columns are selected as text and validated here, so a malformed
//! value is rejected instead of leaking into the arithmetic.
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::domain::{
    ClosedOrder, CommissionSummary, CurrentPosition, DecisionStats, HistoricalPoint, OpenOrder,
    PriceRange, RecentDecision, RecentTrade,
};
use crate::error::{DashboardError, DashboardResult};
use crate::services::SnapshotCalculator;

/// Parse an optional numeric column. NULL and blank map to `None`.
pub fn parse_decimal(
    query: &'static str,
    field: &'static str,
    raw: Option<&str>,
) -> DashboardResult<Option<Decimal>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .map_err(|_| DashboardError::MalformedRow {
            query,
            field,
            value: raw.to_string(),
        })
}

pub fn decimal_or_zero(
    query: &'static str,
    field: &'static str,
    raw: Option<&str>,
) -> DashboardResult<Decimal> {
    Ok(parse_decimal(query, field, raw)?.unwrap_or(Decimal::ZERO))
}

#[derive(Debug, FromRow)]
pub struct PositionRow {
    pub base_free: Option<String>,
    pub quote_free: Option<String>,
    pub mark_price: Option<String>,
    pub total_value_usdt: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub open_count: Option<i64>,
    pub qty_in_tp_orders: Option<String>,
    pub open_order_ids: Option<Vec<String>>,
    pub entry_at: Option<DateTime<Utc>>,
    pub entry_decision_uid: Option<String>,
    pub entry_price: Option<String>,
    pub unrealized_pnl_pct: Option<String>,
}

impl PositionRow {
    const QUERY: &'static str = "current_position";

    pub fn to_domain_position(self) -> DashboardResult<CurrentPosition> {
        let q = Self::QUERY;
        Ok(CurrentPosition {
            base_free: decimal_or_zero(q, "base_free", self.base_free.as_deref())?,
            quote_free: decimal_or_zero(q, "quote_free", self.quote_free.as_deref())?,
            mark_price: decimal_or_zero(q, "mark_price", self.mark_price.as_deref())?,
            total_value_usdt: decimal_or_zero(q, "total_value_usdt", self.total_value_usdt.as_deref())?,
            last_update: self.last_update,
            open_count: self.open_count.unwrap_or(0).max(0),
            qty_in_tp_orders: decimal_or_zero(q, "qty_in_tp_orders", self.qty_in_tp_orders.as_deref())?,
            open_order_ids: self.open_order_ids.unwrap_or_default(),
            entry_at: self.entry_at,
            entry_decision_uid: self.entry_decision_uid,
            entry_price: parse_decimal(q, "entry_price", self.entry_price.as_deref())?,
            unrealized_pnl_pct: parse_decimal(q, "unrealized_pnl_pct", self.unrealized_pnl_pct.as_deref())?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct TradeRow {
    pub entry_order_id: Option<i64>,
    pub exit_order_id: Option<i64>,
    pub entry_decision_uid: Option<String>,
    pub exit_decision_uid: Option<String>,
    pub order_group_uid: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub entry_price: Option<String>,
    pub entry_quantity: Option<String>,
    pub entry_cost_usdt: Option<String>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<String>,
    pub exit_quantity: Option<String>,
    pub exit_proceeds_usdt: Option<String>,
    pub pnl_pct: Option<String>,
    pub pnl_usdt: Option<String>,
    pub hold_time_minutes: Option<String>,
    pub regime_key: Option<String>,
}

impl TradeRow {
    const QUERY: &'static str = "recent_trades";

    pub fn to_domain_trade(self) -> DashboardResult<RecentTrade> {
        let q = Self::QUERY;
        Ok(RecentTrade {
            entry_order_id: self.entry_order_id,
            exit_order_id: self.exit_order_id,
            entry_decision_uid: self.entry_decision_uid,
            exit_decision_uid: self.exit_decision_uid,
            order_group_uid: self.order_group_uid,
            entry_time: self.entry_time,
            entry_price: decimal_or_zero(q, "entry_price", self.entry_price.as_deref())?,
            entry_quantity: decimal_or_zero(q, "entry_quantity", self.entry_quantity.as_deref())?,
            entry_cost_usdt: decimal_or_zero(q, "entry_cost_usdt", self.entry_cost_usdt.as_deref())?,
            exit_time: self.exit_time,
            exit_price: decimal_or_zero(q, "exit_price", self.exit_price.as_deref())?,
            exit_quantity: decimal_or_zero(q, "exit_quantity", self.exit_quantity.as_deref())?,
            exit_proceeds_usdt: decimal_or_zero(q, "exit_proceeds_usdt", self.exit_proceeds_usdt.as_deref())?,
            pnl_pct: decimal_or_zero(q, "pnl_pct", self.pnl_pct.as_deref())?,
            pnl_usdt: decimal_or_zero(q, "pnl_usdt", self.pnl_usdt.as_deref())?,
            hold_time_minutes: decimal_or_zero(q, "hold_time_minutes", self.hold_time_minutes.as_deref())?,
            regime_key: self.regime_key,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct DecisionStatsRow {
    pub buy_count: Option<i64>,
    pub sell_count: Option<i64>,
    pub hold_count: Option<i64>,
    pub first_decision: Option<DateTime<Utc>>,
    pub last_decision: Option<DateTime<Utc>>,
    pub last_action: Option<String>,
    pub last_price: Option<String>,
    pub has_position: Option<bool>,
    pub base_qty: Option<String>,
    pub usdt_free: Option<String>,
}

impl DecisionStatsRow {
    const QUERY: &'static str = "decision_stats";

    pub fn to_domain_stats(self) -> DashboardResult<DecisionStats> {
        let q = Self::QUERY;
        Ok(DecisionStats {
            buy_count: self.buy_count.unwrap_or(0),
            sell_count: self.sell_count.unwrap_or(0),
            hold_count: self.hold_count.unwrap_or(0),
            first_decision: self.first_decision,
            last_decision: self.last_decision,
            last_action: self.last_action,
            last_price: parse_decimal(q, "last_price", self.last_price.as_deref())?,
            has_position: self.has_position,
            base_qty: parse_decimal(q, "base_qty", self.base_qty.as_deref())?,
            usdt_free: parse_decimal(q, "usdt_free", self.usdt_free.as_deref())?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct OpenOrderRow {
    pub order_id: Option<i64>,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub age_minutes: Option<String>,
}

impl OpenOrderRow {
    const QUERY: &'static str = "open_tp_orders";

    pub fn to_domain_order(self) -> DashboardResult<OpenOrder> {
        let q = Self::QUERY;
        let price = parse_decimal(q, "price", self.price.as_deref())?;
        let quantity = parse_decimal(q, "quantity", self.quantity.as_deref())?;
        let age_minutes = decimal_or_zero(q, "age_minutes", self.age_minutes.as_deref())?;

        Ok(OpenOrder {
            order_id: self.order_id.unwrap_or_default(),
            exchange_order_id: self.exchange_order_id,
            client_order_id: self.client_order_id,
            symbol: self.symbol.unwrap_or_default(),
            side: self.side.unwrap_or_default(),
            order_type: self.order_type.unwrap_or_default(),
            value_usdt: SnapshotCalculator::order_value(price, quantity),
            price,
            quantity,
            status: self.status.unwrap_or_default(),
            created_at: self.created_at,
            age_minutes: age_minutes.max(Decimal::ZERO),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FilledOrderRow {
    pub order_id: Option<i64>,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    pub executed_qty: Option<String>,
    pub cumulative_quote_qty: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FilledOrderRow {
    const QUERY: &'static str = "filled_orders";

    /// Average fill price is quote spent over quantity executed.
    pub fn to_domain_order(self) -> DashboardResult<ClosedOrder> {
        let q = Self::QUERY;
        let executed_qty = parse_decimal(q, "executed_qty", self.executed_qty.as_deref())?;
        let cumulative_quote_qty =
            parse_decimal(q, "cumulative_quote_qty", self.cumulative_quote_qty.as_deref())?;

        Ok(ClosedOrder {
            order_id: self.order_id.unwrap_or_default(),
            exchange_order_id: self.exchange_order_id,
            client_order_id: self.client_order_id,
            symbol: self.symbol.unwrap_or_default(),
            side: self.side.unwrap_or_default(),
            order_type: self.order_type.unwrap_or_default(),
            price: SnapshotCalculator::average_fill_price(cumulative_quote_qty, executed_qty),
            quantity: executed_qty,
            status: self.status.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct CanceledOrderRow {
    pub order_id: Option<i64>,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CanceledOrderRow {
    const QUERY: &'static str = "canceled_orders";

    pub fn to_domain_order(self) -> DashboardResult<ClosedOrder> {
        let q = Self::QUERY;
        let positive = |value: Option<Decimal>| value.filter(|v| *v > Decimal::ZERO);

        Ok(ClosedOrder {
            order_id: self.order_id.unwrap_or_default(),
            exchange_order_id: self.exchange_order_id,
            client_order_id: self.client_order_id,
            symbol: self.symbol.unwrap_or_default(),
            side: self.side.unwrap_or_default(),
            order_type: self.order_type.unwrap_or_default(),
            price: positive(parse_decimal(q, "price", self.price.as_deref())?),
            quantity: positive(parse_decimal(q, "quantity", self.quantity.as_deref())?),
            status: self.status.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct RecentDecisionRow {
    pub decision_uid: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub note: Option<String>,
    pub regime_key: Option<String>,
    pub last_close: Option<String>,
    pub rsi14_3m: Option<String>,
    pub adx14_3m: Option<String>,
    pub has_position: Option<bool>,
}

impl RecentDecisionRow {
    const QUERY: &'static str = "recent_decisions";

    pub fn to_domain_decision(self) -> DashboardResult<RecentDecision> {
        let q = Self::QUERY;
        Ok(RecentDecision {
            decision_uid: self.decision_uid.unwrap_or_default(),
            decided_at: self.decided_at,
            action: self.action.unwrap_or_default(),
            note: self.note,
            regime_key: self.regime_key,
            last_close: parse_decimal(q, "last_close", self.last_close.as_deref())?,
            rsi14_3m: parse_decimal(q, "rsi14_3m", self.rsi14_3m.as_deref())?,
            adx14_3m: parse_decimal(q, "adx14_3m", self.adx14_3m.as_deref())?,
            has_position: self.has_position.unwrap_or(false),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PriceRangeRow {
    pub max_price: Option<String>,
    pub min_price: Option<String>,
}

impl PriceRangeRow {
    const QUERY: &'static str = "price_high_low";

    /// An empty window yields zeros.
    pub fn to_domain_range(self) -> DashboardResult<PriceRange> {
        let q = Self::QUERY;
        Ok(PriceRange {
            highest: decimal_or_zero(q, "max_price", self.max_price.as_deref())?,
            lowest: decimal_or_zero(q, "min_price", self.min_price.as_deref())?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct HistoricalRow {
    pub hour_timestamp: Option<DateTime<Utc>>,
    pub account_value: Option<String>,
    pub usdt_balance: Option<String>,
    pub aster_qty: Option<String>,
    pub aster_price: Option<String>,
}

impl HistoricalRow {
    const QUERY: &'static str = "historical_data";

    /// Buckets without a timestamp cannot be charted and are dropped.
    pub fn to_domain_point(self) -> DashboardResult<Option<HistoricalPoint>> {
        let q = Self::QUERY;
        let Some(timestamp) = self.hour_timestamp else {
            return Ok(None);
        };

        Ok(Some(HistoricalPoint {
            timestamp,
            account_value: decimal_or_zero(q, "account_value", self.account_value.as_deref())?,
            usdt_balance: decimal_or_zero(q, "usdt_balance", self.usdt_balance.as_deref())?,
            aster_qty: decimal_or_zero(q, "aster_qty", self.aster_qty.as_deref())?,
            aster_price: decimal_or_zero(q, "aster_price", self.aster_price.as_deref())?,
        }))
    }
}

#[derive(Debug, FromRow)]
pub struct CommissionRow {
    pub date: Option<NaiveDate>,
    pub usdt_fees: Option<String>,
    pub aster_fees: Option<String>,
    pub executions: Option<i64>,
}

impl CommissionRow {
    const QUERY: &'static str = "commission_summary";

    pub fn to_domain_commission(self) -> DashboardResult<CommissionSummary> {
        let q = Self::QUERY;
        Ok(CommissionSummary {
            date: self.date,
            usdt_fees: decimal_or_zero(q, "usdt_fees", self.usdt_fees.as_deref())?,
            aster_fees: decimal_or_zero(q, "aster_fees", self.aster_fees.as_deref())?,
            executions: self.executions.unwrap_or(0),
        })
    }
}
