use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ClosedOrder, CommissionSummary, DashboardSnapshot, HistoricalPoint, OpenOrder, RecentDecision,
    RecentTrade,
};

fn num(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn opt_num(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|v| v.to_f64())
}

// Request DTOs
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub database: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradesQuery {
    pub database: Option<String>,
    pub limit: Option<i64>,
}

// Response DTOs

/// Body of `GET /stats`. Field names are the dashboard's JSON contract.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshotDto {
    pub account_value: f64,
    pub aster_balance: f64,
    pub usdt_balance: f64,
    pub current_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    #[serde(rename = "unrealizedPnLPercent")]
    pub unrealized_pnl_percent: f64,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: f64,
    pub total_decisions: i64,
    pub buy_count: i64,
    pub sell_count: i64,
    pub hold_count: i64,
    pub buy_rate: f64,
    pub sell_rate: f64,
    #[serde(rename = "openTPOrders")]
    pub open_tp_orders: i64,
    pub qty_in_tp_orders: f64,
    pub last_decision: LastDecisionDto,
    pub runtime: RuntimeDto,
    pub position: PositionSummaryDto,
    pub historical_data: Vec<HistoricalPointDto>,
    pub recent_decisions: Vec<RecentDecisionDto>,
    pub open_orders: Vec<OpenOrderDto>,
    pub filled_orders: Vec<ClosedOrderDto>,
    pub canceled_orders: Vec<ClosedOrderDto>,
    pub commissions: Option<CommissionDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDecisionDto {
    pub timestamp: Option<DateTime<Utc>>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDto {
    pub first_decision: Option<DateTime<Utc>>,
    pub last_decision: Option<DateTime<Utc>>,
    pub days_since_start: i64,
    pub total_runtime: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummaryDto {
    pub has_position: bool,
    pub entry_price: f64,
    pub entry_time: Option<DateTime<Utc>>,
    pub current_qty: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPointDto {
    pub timestamp: DateTime<Utc>,
    pub account_value: f64,
    pub usdt_balance: f64,
    pub aster_qty: f64,
    pub aster_price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDecisionDto {
    pub decision_uid: String,
    pub decided_at: Option<DateTime<Utc>>,
    pub action: String,
    pub note: Option<String>,
    pub regime_key: Option<String>,
    pub last_close: Option<f64>,
    #[serde(rename = "rsi14_3m")]
    pub rsi14_3m: Option<f64>,
    #[serde(rename = "adx14_3m")]
    pub adx14_3m: Option<f64>,
    pub has_position: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderDto {
    pub order_id: i64,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub value_usdt: Option<f64>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub age_minutes: f64,
}

/// Filled or canceled order; `price`/`quantity` are `null` when unknown.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedOrderDto {
    pub order_id: i64,
    pub exchange_order_id: Option<String>,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionDto {
    pub date: Option<NaiveDate>,
    pub usdt_fees: f64,
    pub aster_fees: f64,
    pub executions: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub entry_order_id: Option<i64>,
    pub exit_order_id: Option<i64>,
    pub entry_decision_uid: Option<String>,
    pub exit_decision_uid: Option<String>,
    pub order_group_uid: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub entry_price: f64,
    pub entry_quantity: f64,
    pub entry_cost_usdt: f64,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: f64,
    pub exit_quantity: f64,
    pub exit_proceeds_usdt: f64,
    pub pnl_pct: f64,
    pub pnl_usdt: f64,
    pub hold_time_minutes: f64,
    pub regime_key: Option<String>,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub service: String,
    pub databases: BTreeMap<String, bool>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    pub message: String,
}

impl From<DashboardSnapshot> for DashboardSnapshotDto {
    fn from(snapshot: DashboardSnapshot) -> Self {
        Self {
            account_value: num(snapshot.account_value),
            aster_balance: num(snapshot.aster_balance),
            usdt_balance: num(snapshot.usdt_balance),
            current_price: num(snapshot.current_price),
            highest_price: num(snapshot.highest_price),
            lowest_price: num(snapshot.lowest_price),
            unrealized_pnl: num(snapshot.unrealized_pnl),
            unrealized_pnl_percent: num(snapshot.unrealized_pnl_percent),
            realized_pnl: num(snapshot.realized_pnl),
            total_decisions: snapshot.total_decisions,
            buy_count: snapshot.buy_count,
            sell_count: snapshot.sell_count,
            hold_count: snapshot.hold_count,
            buy_rate: num(snapshot.buy_rate),
            sell_rate: num(snapshot.sell_rate),
            open_tp_orders: snapshot.open_tp_orders,
            qty_in_tp_orders: num(snapshot.qty_in_tp_orders),
            last_decision: LastDecisionDto {
                timestamp: snapshot.last_decision.timestamp,
                action: snapshot.last_decision.action,
            },
            runtime: RuntimeDto {
                first_decision: snapshot.runtime.first_decision,
                last_decision: snapshot.runtime.last_decision,
                days_since_start: snapshot.runtime.days_since_start,
                total_runtime: snapshot.runtime.total_runtime,
            },
            position: PositionSummaryDto {
                has_position: snapshot.position.has_position,
                entry_price: num(snapshot.position.entry_price),
                entry_time: snapshot.position.entry_time,
                current_qty: num(snapshot.position.current_qty),
            },
            historical_data: snapshot
                .historical_data
                .into_iter()
                .map(HistoricalPointDto::from)
                .collect(),
            recent_decisions: snapshot
                .recent_decisions
                .into_iter()
                .map(RecentDecisionDto::from)
                .collect(),
            open_orders: snapshot.open_orders.into_iter().map(OpenOrderDto::from).collect(),
            filled_orders: snapshot.filled_orders.into_iter().map(ClosedOrderDto::from).collect(),
            canceled_orders: snapshot
                .canceled_orders
                .into_iter()
                .map(ClosedOrderDto::from)
                .collect(),
            commissions: snapshot.commissions.map(CommissionDto::from),
        }
    }
}

impl From<HistoricalPoint> for HistoricalPointDto {
    fn from(point: HistoricalPoint) -> Self {
        Self {
            timestamp: point.timestamp,
            account_value: num(point.account_value),
            usdt_balance: num(point.usdt_balance),
            aster_qty: num(point.aster_qty),
            aster_price: num(point.aster_price),
        }
    }
}

impl From<RecentDecision> for RecentDecisionDto {
    fn from(decision: RecentDecision) -> Self {
        Self {
            decision_uid: decision.decision_uid,
            decided_at: decision.decided_at,
            action: decision.action,
            note: decision.note,
            regime_key: decision.regime_key,
            last_close: opt_num(decision.last_close),
            rsi14_3m: opt_num(decision.rsi14_3m),
            adx14_3m: opt_num(decision.adx14_3m),
            has_position: decision.has_position,
        }
    }
}

impl From<OpenOrder> for OpenOrderDto {
    fn from(order: OpenOrder) -> Self {
        Self {
            order_id: order.order_id,
            exchange_order_id: order.exchange_order_id,
            client_order_id: order.client_order_id,
            symbol: order.symbol,
            side: order.side,
            order_type: order.order_type,
            price: opt_num(order.price),
            quantity: opt_num(order.quantity),
            value_usdt: opt_num(order.value_usdt),
            status: order.status,
            created_at: order.created_at,
            age_minutes: num(order.age_minutes),
        }
    }
}

impl From<ClosedOrder> for ClosedOrderDto {
    fn from(order: ClosedOrder) -> Self {
        Self {
            order_id: order.order_id,
            exchange_order_id: order.exchange_order_id,
            client_order_id: order.client_order_id,
            symbol: order.symbol,
            side: order.side,
            order_type: order.order_type,
            price: opt_num(order.price),
            quantity: opt_num(order.quantity),
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl From<CommissionSummary> for CommissionDto {
    fn from(summary: CommissionSummary) -> Self {
        Self {
            date: summary.date,
            usdt_fees: num(summary.usdt_fees),
            aster_fees: num(summary.aster_fees),
            executions: summary.executions,
        }
    }
}

impl From<RecentTrade> for TradeDto {
    fn from(trade: RecentTrade) -> Self {
        Self {
            entry_order_id: trade.entry_order_id,
            exit_order_id: trade.exit_order_id,
            entry_decision_uid: trade.entry_decision_uid,
            exit_decision_uid: trade.exit_decision_uid,
            order_group_uid: trade.order_group_uid,
            entry_time: trade.entry_time,
            entry_price: num(trade.entry_price),
            entry_quantity: num(trade.entry_quantity),
            entry_cost_usdt: num(trade.entry_cost_usdt),
            exit_time: trade.exit_time,
            exit_price: num(trade.exit_price),
            exit_quantity: num(trade.exit_quantity),
            exit_proceeds_usdt: num(trade.exit_proceeds_usdt),
            pnl_pct: num(trade.pnl_pct),
            pnl_usdt: num(trade.pnl_usdt),
            hold_time_minutes: num(trade.hold_time_minutes),
            regime_key: trade.regime_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{assemble_snapshot, SnapshotInputs};
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_json_uses_dashboard_field_names() {
        let snapshot = assemble_snapshot(SnapshotInputs::default()).unwrap();
        let json = serde_json::to_value(DashboardSnapshotDto::from(snapshot)).unwrap();

        for key in [
            "accountValue",
            "asterBalance",
            "usdtBalance",
            "currentPrice",
            "highestPrice",
            "lowestPrice",
            "unrealizedPnL",
            "unrealizedPnLPercent",
            "realizedPnL",
            "totalDecisions",
            "buyCount",
            "sellCount",
            "holdCount",
            "openTPOrders",
            "qtyInTpOrders",
            "lastDecision",
            "runtime",
            "position",
            "historicalData",
            "recentDecisions",
            "openOrders",
            "filledOrders",
            "canceledOrders",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }

        assert_eq!(json["runtime"]["totalRuntime"], "0d 0h");
        assert_eq!(json["position"]["hasPosition"], false);
        assert!(json["lastDecision"]["timestamp"].is_null());
    }

    #[test]
    fn test_unknown_order_price_serializes_as_null() {
        let order = ClosedOrder {
            order_id: 3,
            exchange_order_id: None,
            client_order_id: None,
            symbol: "ASTERUSDT".to_string(),
            side: "BUY".to_string(),
            order_type: "LIMIT".to_string(),
            price: None,
            quantity: Some(dec!(0)),
            status: "FILLED".to_string(),
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(ClosedOrderDto::from(order)).unwrap();
        assert!(json["price"].is_null());
        assert_eq!(json["quantity"], 0.0);
        assert_eq!(json["type"], "LIMIT");
    }

    #[test]
    fn test_decision_indicator_keys() {
        let decision = RecentDecision {
            decision_uid: "d-9".to_string(),
            decided_at: None,
            action: "buy".to_string(),
            note: Some("rsi oversold".to_string()),
            regime_key: Some("ranging".to_string()),
            last_close: Some(dec!(1.2)),
            rsi14_3m: Some(dec!(28.5)),
            adx14_3m: None,
            has_position: false,
        };

        let json = serde_json::to_value(RecentDecisionDto::from(decision)).unwrap();
        assert_eq!(json["rsi14_3m"], 28.5);
        assert!(json["adx14_3m"].is_null());
        assert_eq!(json["decisionUid"], "d-9");
    }
}
