use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::info;

use crate::config::LogicalDatabase;
use crate::domain::{
    ClosedOrder, CommissionSummary, CurrentPosition, DashboardSnapshot, DecisionStats,
    HistoricalPoint, LastDecision, OpenOrder, PositionSummary, PriceRange, RecentDecision,
    RecentTrade,
};
use crate::error::DashboardResult;
use crate::infrastructure::DatabaseRegistry;
use crate::services::{SnapshotCalculator, StatsRepository};

/// Rows fetched per list (trades, orders, decisions).
pub const RECENT_LIMIT: i64 = 50;
/// Window for the price range and the hourly chart.
pub const HISTORY_WINDOW_HOURS: i64 = 72;

/// Everything the sub-queries return for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInputs {
    pub position: Option<CurrentPosition>,
    pub trades: Vec<RecentTrade>,
    pub decision_stats: DecisionStats,
    pub open_orders: Vec<OpenOrder>,
    pub filled_orders: Vec<ClosedOrder>,
    pub canceled_orders: Vec<ClosedOrder>,
    pub recent_decisions: Vec<RecentDecision>,
    pub price_range: PriceRange,
    pub historical_data: Vec<HistoricalPoint>,
    pub commissions: Option<CommissionSummary>,
}

/// Fans the read queries out, joins them, and derives the dashboard figures.
#[derive(Clone)]
pub struct StatsAggregator {
    repository: StatsRepository,
}

impl StatsAggregator {
    pub fn new(registry: Arc<DatabaseRegistry>) -> Self {
        Self {
            repository: StatsRepository::new(registry),
        }
    }

    pub fn repository(&self) -> &StatsRepository {
        &self.repository
    }

    /// One consistent snapshot, or the first sub-query error. Never partial.
    pub async fn get_dashboard_stats(&self, db: LogicalDatabase) -> DashboardResult<DashboardSnapshot> {
        let started = Instant::now();
        let repo = &self.repository;

        let (
            position,
            trades,
            decision_stats,
            open_orders,
            filled_orders,
            canceled_orders,
            recent_decisions,
            price_range,
            historical_data,
            commissions,
        ) = tokio::try_join!(
            repo.current_position(db),
            repo.recent_trades(db, RECENT_LIMIT),
            repo.decision_stats(db),
            repo.open_tp_orders(db, RECENT_LIMIT),
            repo.filled_orders(db, RECENT_LIMIT),
            repo.canceled_orders(db, RECENT_LIMIT),
            repo.recent_decisions(db, RECENT_LIMIT),
            repo.price_high_low(db, HISTORY_WINDOW_HOURS),
            repo.historical_data(db, HISTORY_WINDOW_HOURS),
            repo.commission_summary(db),
        )?;

        let snapshot = assemble_snapshot(SnapshotInputs {
            position,
            trades,
            decision_stats,
            open_orders,
            filled_orders,
            canceled_orders,
            recent_decisions,
            price_range,
            historical_data,
            commissions,
        })?;

        info!(
            "Aggregated {} snapshot in {}ms ({} decisions, {} open orders)",
            db,
            started.elapsed().as_millis(),
            snapshot.total_decisions,
            snapshot.open_orders.len()
        );

        Ok(snapshot)
    }
}

/// Derive the snapshot from already fetched rows.
///
/// Balances and the current price come from the latest decision row; the
/// position view is only consulted when that row lacks them.
pub fn assemble_snapshot(inputs: SnapshotInputs) -> DashboardResult<DashboardSnapshot> {
    let SnapshotInputs {
        position,
        trades,
        decision_stats: stats,
        open_orders,
        filled_orders,
        canceled_orders,
        recent_decisions,
        price_range,
        historical_data,
        commissions,
    } = inputs;

    let realized_pnl = SnapshotCalculator::realized_pnl(&trades)?;

    let current_price = stats
        .last_price
        .or_else(|| position.as_ref().map(|p| p.mark_price))
        .unwrap_or(Decimal::ZERO);

    let base_balance = stats
        .base_qty
        .or_else(|| position.as_ref().map(CurrentPosition::total_base))
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let quote_balance = stats
        .usdt_free
        .or_else(|| position.as_ref().map(|p| p.quote_free))
        .unwrap_or(Decimal::ZERO);

    let account_value = SnapshotCalculator::account_value(base_balance, current_price, quote_balance)?;

    let has_position = base_balance > Decimal::ZERO;
    let entry_price = if has_position {
        position.as_ref().and_then(CurrentPosition::known_entry_price)
    } else {
        None
    };

    let (unrealized_pnl, unrealized_pnl_percent) = match entry_price {
        Some(entry) => (
            SnapshotCalculator::unrealized_pnl(current_price, entry, base_balance)?,
            SnapshotCalculator::unrealized_pnl_percent(current_price, entry)?,
        ),
        None => (Decimal::ZERO, Decimal::ZERO),
    };

    let total_decisions = stats.total();
    let runtime = SnapshotCalculator::runtime(stats.first_decision, stats.last_decision);

    Ok(DashboardSnapshot {
        account_value,
        aster_balance: base_balance,
        usdt_balance: quote_balance,
        current_price,
        highest_price: price_range.highest,
        lowest_price: price_range.lowest,
        unrealized_pnl,
        unrealized_pnl_percent,
        realized_pnl,
        total_decisions,
        buy_count: stats.buy_count,
        sell_count: stats.sell_count,
        hold_count: stats.hold_count,
        buy_rate: SnapshotCalculator::rate(stats.buy_count, total_decisions),
        sell_rate: SnapshotCalculator::rate(stats.sell_count, total_decisions),
        open_tp_orders: position.as_ref().map_or(0, |p| p.open_count),
        qty_in_tp_orders: position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.qty_in_tp_orders),
        last_decision: LastDecision {
            timestamp: stats.last_decision,
            action: stats.last_action,
        },
        runtime,
        position: PositionSummary {
            has_position,
            entry_price: entry_price.unwrap_or(Decimal::ZERO),
            entry_time: if has_position {
                position.as_ref().and_then(|p| p.entry_at)
            } else {
                None
            },
            current_qty: base_balance,
        },
        historical_data,
        recent_decisions,
        open_orders,
        filled_orders,
        canceled_orders,
        commissions,
    })
}
