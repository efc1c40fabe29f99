use std::sync::Arc;

use tracing::debug;

use crate::config::LogicalDatabase;
use crate::domain::{
    ClosedOrder, CommissionSummary, CurrentPosition, DecisionStats, HistoricalPoint, OpenOrder,
    PriceRange, RecentDecision, RecentTrade, CANCELED_STATUSES,
};
use crate::error::DashboardResult;
use crate::infrastructure::{DatabaseRegistry, SqlParam};
use crate::services::db_rows::*;

const CURRENT_POSITION_SQL: &str = r#"
    SELECT
        base_free::text AS base_free,
        quote_free::text AS quote_free,
        mark_price::text AS mark_price,
        total_value_usdt::text AS total_value_usdt,
        last_update::timestamptz AS last_update,
        open_count::bigint AS open_count,
        qty_in_tp_orders::text AS qty_in_tp_orders,
        open_order_ids::text[] AS open_order_ids,
        entry_at::timestamptz AS entry_at,
        entry_decision_uid::text AS entry_decision_uid,
        entry_price::text AS entry_price,
        unrealized_pnl_pct::text AS unrealized_pnl_pct
    FROM ichigo.current_position_v
    LIMIT 1
"#;

const RECENT_TRADES_SQL: &str = r#"
    SELECT
        entry_order_id::bigint AS entry_order_id,
        exit_order_id::bigint AS exit_order_id,
        entry_decision_uid::text AS entry_decision_uid,
        exit_decision_uid::text AS exit_decision_uid,
        order_group_uid::text AS order_group_uid,
        entry_time::timestamptz AS entry_time,
        entry_price::text AS entry_price,
        entry_quantity::text AS entry_quantity,
        entry_cost_usdt::text AS entry_cost_usdt,
        exit_time::timestamptz AS exit_time,
        exit_price::text AS exit_price,
        exit_quantity::text AS exit_quantity,
        exit_proceeds_usdt::text AS exit_proceeds_usdt,
        pnl_pct::text AS pnl_pct,
        pnl_usdt::text AS pnl_usdt,
        hold_time_minutes::text AS hold_time_minutes,
        regime_key::text AS regime_key
    FROM ichigo.recent_trades_pnl_v
    WHERE pnl_usdt IS NOT NULL
    ORDER BY exit_time DESC
    LIMIT $1
"#;

// Counters always yield one row; `latest` is empty on a fresh database.
const DECISION_STATS_SQL: &str = r#"
    WITH counters AS (
        SELECT
            COUNT(*) FILTER (WHERE LOWER(action) = 'buy') AS buy_count,
            COUNT(*) FILTER (WHERE LOWER(action) = 'sell') AS sell_count,
            COUNT(*) FILTER (WHERE LOWER(action) = 'hold') AS hold_count,
            MIN(decided_at) AS first_decision,
            MAX(decided_at) AS last_decision
        FROM ichigo.decisions
    ),
    latest AS (
        SELECT action, last_close, has_position, base_qty, usdt_free
        FROM ichigo.decisions
        ORDER BY decided_at DESC
        LIMIT 1
    )
    SELECT
        c.buy_count::bigint AS buy_count,
        c.sell_count::bigint AS sell_count,
        c.hold_count::bigint AS hold_count,
        c.first_decision::timestamptz AS first_decision,
        c.last_decision::timestamptz AS last_decision,
        l.action::text AS last_action,
        l.last_close::text AS last_price,
        l.has_position AS has_position,
        l.base_qty::text AS base_qty,
        l.usdt_free::text AS usdt_free
    FROM counters c
    LEFT JOIN latest l ON TRUE
"#;

const OPEN_TP_ORDERS_SQL: &str = r#"
    SELECT
        order_id::bigint AS order_id,
        exchange_order_id::text AS exchange_order_id,
        client_order_id::text AS client_order_id,
        symbol::text AS symbol,
        side::text AS side,
        type::text AS order_type,
        price::text AS price,
        quantity::text AS quantity,
        status::text AS status,
        created_at::timestamptz AS created_at,
        age_minutes::text AS age_minutes
    FROM ichigo.open_tp_orders_enhanced_v
    ORDER BY price ASC
    LIMIT $1
"#;

const FILLED_ORDERS_SQL: &str = r#"
    SELECT
        order_id::bigint AS order_id,
        exchange_order_id::text AS exchange_order_id,
        client_order_id::text AS client_order_id,
        symbol::text AS symbol,
        side::text AS side,
        type::text AS order_type,
        executed_qty::text AS executed_qty,
        cumulative_quote_qty::text AS cumulative_quote_qty,
        status::text AS status,
        created_at::timestamptz AS created_at,
        updated_at::timestamptz AS updated_at
    FROM ichigo.orders
    WHERE UPPER(status) = 'FILLED'
    ORDER BY updated_at DESC
    LIMIT $1
"#;

const CANCELED_ORDERS_SQL: &str = r#"
    SELECT
        order_id::bigint AS order_id,
        exchange_order_id::text AS exchange_order_id,
        client_order_id::text AS client_order_id,
        symbol::text AS symbol,
        side::text AS side,
        type::text AS order_type,
        price::text AS price,
        quantity::text AS quantity,
        status::text AS status,
        created_at::timestamptz AS created_at,
        updated_at::timestamptz AS updated_at
    FROM ichigo.orders
    WHERE UPPER(status) = ANY($1)
    ORDER BY updated_at DESC
    LIMIT $2
"#;

const RECENT_DECISIONS_SQL: &str = r#"
    SELECT
        decision_uid::text AS decision_uid,
        decided_at::timestamptz AS decided_at,
        action::text AS action,
        note::text AS note,
        regime_key::text AS regime_key,
        last_close::text AS last_close,
        rsi14_3m::text AS rsi14_3m,
        adx14_3m::text AS adx14_3m,
        has_position AS has_position
    FROM ichigo.decisions
    ORDER BY decided_at DESC
    LIMIT $1
"#;

const PRICE_HIGH_LOW_SQL: &str = r#"
    SELECT
        MAX(last_close)::text AS max_price,
        MIN(last_close)::text AS min_price
    FROM ichigo.decisions
    WHERE decided_at >= NOW() - make_interval(hours => $1::int)
"#;

const HISTORICAL_DATA_SQL: &str = r#"
    SELECT
        date_trunc('hour', decided_at)::timestamptz AS hour_timestamp,
        AVG((base_qty * last_close) + usdt_free)::text AS account_value,
        AVG(usdt_free)::text AS usdt_balance,
        AVG(base_qty)::text AS aster_qty,
        AVG(last_close)::text AS aster_price
    FROM ichigo.decisions
    WHERE decided_at >= NOW() - make_interval(hours => $1::int)
    GROUP BY date_trunc('hour', decided_at)
    ORDER BY hour_timestamp ASC
"#;

const COMMISSION_SUMMARY_SQL: &str = r#"
    SELECT
        date::date AS date,
        usdt_fees::text AS usdt_fees,
        aster_fees::text AS aster_fees,
        executions::bigint AS executions
    FROM ichigo.commission_summary_v
    ORDER BY date DESC
    LIMIT 1
"#;

/// Read queries over the trading bot's schema.
#[derive(Clone)]
pub struct StatsRepository {
    registry: Arc<DatabaseRegistry>,
}

impl StatsRepository {
    pub fn new(registry: Arc<DatabaseRegistry>) -> Self {
        Self { registry }
    }

    pub async fn current_position(&self, db: LogicalDatabase) -> DashboardResult<Option<CurrentPosition>> {
        let row: Option<PositionRow> = self
            .registry
            .fetch_optional(db, CURRENT_POSITION_SQL, &[])
            .await?;

        row.map(PositionRow::to_domain_position).transpose()
    }

    pub async fn recent_trades(&self, db: LogicalDatabase, limit: i64) -> DashboardResult<Vec<RecentTrade>> {
        let rows: Vec<TradeRow> = self
            .registry
            .fetch_all(db, RECENT_TRADES_SQL, &[SqlParam::Int(limit)])
            .await?;

        debug!("Fetched {} trades from {}", rows.len(), db);
        rows.into_iter().map(TradeRow::to_domain_trade).collect()
    }

    pub async fn decision_stats(&self, db: LogicalDatabase) -> DashboardResult<DecisionStats> {
        let row: DecisionStatsRow = self
            .registry
            .fetch_one(db, DECISION_STATS_SQL, &[])
            .await?;

        row.to_domain_stats()
    }

    pub async fn open_tp_orders(&self, db: LogicalDatabase, limit: i64) -> DashboardResult<Vec<OpenOrder>> {
        let rows: Vec<OpenOrderRow> = self
            .registry
            .fetch_all(db, OPEN_TP_ORDERS_SQL, &[SqlParam::Int(limit)])
            .await?;

        rows.into_iter().map(OpenOrderRow::to_domain_order).collect()
    }

    pub async fn filled_orders(&self, db: LogicalDatabase, limit: i64) -> DashboardResult<Vec<ClosedOrder>> {
        let rows: Vec<FilledOrderRow> = self
            .registry
            .fetch_all(db, FILLED_ORDERS_SQL, &[SqlParam::Int(limit)])
            .await?;

        rows.into_iter().map(FilledOrderRow::to_domain_order).collect()
    }

    pub async fn canceled_orders(&self, db: LogicalDatabase, limit: i64) -> DashboardResult<Vec<ClosedOrder>> {
        let statuses = CANCELED_STATUSES.iter().map(|s| s.to_string()).collect();
        let rows: Vec<CanceledOrderRow> = self
            .registry
            .fetch_all(
                db,
                CANCELED_ORDERS_SQL,
                &[SqlParam::TextArray(statuses), SqlParam::Int(limit)],
            )
            .await?;

        rows.into_iter().map(CanceledOrderRow::to_domain_order).collect()
    }

    pub async fn recent_decisions(&self, db: LogicalDatabase, limit: i64) -> DashboardResult<Vec<RecentDecision>> {
        let rows: Vec<RecentDecisionRow> = self
            .registry
            .fetch_all(db, RECENT_DECISIONS_SQL, &[SqlParam::Int(limit)])
            .await?;

        rows.into_iter().map(RecentDecisionRow::to_domain_decision).collect()
    }

    pub async fn price_high_low(&self, db: LogicalDatabase, hours: i64) -> DashboardResult<PriceRange> {
        let row: PriceRangeRow = self
            .registry
            .fetch_one(db, PRICE_HIGH_LOW_SQL, &[SqlParam::Int(hours)])
            .await?;

        row.to_domain_range()
    }

    pub async fn historical_data(&self, db: LogicalDatabase, hours: i64) -> DashboardResult<Vec<HistoricalPoint>> {
        let rows: Vec<HistoricalRow> = self
            .registry
            .fetch_all(db, HISTORICAL_DATA_SQL, &[SqlParam::Int(hours)])
            .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(point) = row.to_domain_point()? {
                points.push(point);
            }
        }
        Ok(points)
    }

    pub async fn commission_summary(&self, db: LogicalDatabase) -> DashboardResult<Option<CommissionSummary>> {
        let row: Option<CommissionRow> = self
            .registry
            .fetch_optional(db, COMMISSION_SUMMARY_SQL, &[])
            .await?;

        row.map(CommissionRow::to_domain_commission).transpose()
    }
}
