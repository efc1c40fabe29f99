use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{RecentTrade, RuntimeSummary};

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

pub struct SnapshotCalculator;

impl SnapshotCalculator {
    /// Realized PnL = Σ pnl_usdt over the fetched round-trips
    pub fn realized_pnl(trades: &[RecentTrade]) -> Result<Decimal> {
        trades.iter().try_fold(Decimal::ZERO, |total, trade| {
            total
                .checked_add(trade.pnl_usdt)
                .ok_or_else(|| anyhow!("Overflow in realized PnL"))
        })
    }

    /// Account value = base × price + quote
    pub fn account_value(base_balance: Decimal, price: Decimal, quote_balance: Decimal) -> Result<Decimal> {
        base_balance
            .checked_mul(price)
            .ok_or_else(|| anyhow!("Overflow in base value"))?
            .checked_add(quote_balance)
            .ok_or_else(|| anyhow!("Overflow in account value"))
    }

    /// Unrealized PnL = (current - entry) × quantity
    pub fn unrealized_pnl(current_price: Decimal, entry_price: Decimal, quantity: Decimal) -> Result<Decimal> {
        current_price
            .checked_sub(entry_price)
            .ok_or_else(|| anyhow!("Price difference overflow"))?
            .checked_mul(quantity)
            .ok_or_else(|| anyhow!("PnL calculation overflow"))
    }

    /// Unrealized PnL % = (current - entry) / entry × 100
    pub fn unrealized_pnl_percent(current_price: Decimal, entry_price: Decimal) -> Result<Decimal> {
        if entry_price.is_zero() {
            return Err(anyhow!("Entry price is zero"));
        }

        current_price
            .checked_sub(entry_price)
            .ok_or_else(|| anyhow!("Price difference overflow"))?
            .checked_div(entry_price)
            .ok_or_else(|| anyhow!("Division by entry price failed"))?
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| anyhow!("Percentage overflow"))
    }

    /// Share of `count` in `total`, in percent. Zero when there is nothing to divide by.
    pub fn rate(count: i64, total: i64) -> Decimal {
        if total <= 0 {
            return Decimal::ZERO;
        }
        Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total)
    }

    /// Notional of an order, rounded to cents.
    pub fn order_value(price: Option<Decimal>, quantity: Option<Decimal>) -> Option<Decimal> {
        let mut value = price?.checked_mul(quantity?)?.round_dp(2);
        value.rescale(2);
        Some(value)
    }

    /// Quote spent over quantity executed; `None` unless something was executed.
    pub fn average_fill_price(
        cumulative_quote_qty: Option<Decimal>,
        executed_qty: Option<Decimal>,
    ) -> Option<Decimal> {
        let executed = executed_qty.filter(|qty| *qty > Decimal::ZERO)?;
        cumulative_quote_qty?.checked_div(executed)
    }

    /// Whole days and remaining hours between the first and the latest decision.
    pub fn runtime(
        first_decision: Option<DateTime<Utc>>,
        last_decision: Option<DateTime<Utc>>,
    ) -> RuntimeSummary {
        let elapsed = match (first_decision, last_decision) {
            (Some(first), Some(last)) => (last - first).num_seconds().max(0),
            _ => 0,
        };

        let days = elapsed / SECONDS_PER_DAY;
        let hours = (elapsed % SECONDS_PER_DAY) / SECONDS_PER_HOUR;

        RuntimeSummary {
            first_decision,
            last_decision,
            days_since_start: days,
            total_runtime: format!("{}d {}h", days, hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn trade(pnl_usdt: Decimal) -> RecentTrade {
        RecentTrade {
            entry_order_id: Some(1),
            exit_order_id: Some(2),
            entry_decision_uid: None,
            exit_decision_uid: None,
            order_group_uid: None,
            entry_time: None,
            entry_price: dec!(1),
            entry_quantity: dec!(10),
            entry_cost_usdt: dec!(10),
            exit_time: None,
            exit_price: dec!(1),
            exit_quantity: dec!(10),
            exit_proceeds_usdt: dec!(10),
            pnl_pct: Decimal::ZERO,
            pnl_usdt,
            hold_time_minutes: dec!(30),
            regime_key: None,
        }
    }

    #[test]
    fn test_realized_pnl_sums_trades() {
        let trades = vec![trade(dec!(1.25)), trade(dec!(-0.50)), trade(dec!(3))];
        assert_eq!(SnapshotCalculator::realized_pnl(&trades).unwrap(), dec!(3.75));
        assert_eq!(SnapshotCalculator::realized_pnl(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_account_value() {
        // 1,000 ASTER at 1.2 plus 300 USDT
        let value = SnapshotCalculator::account_value(dec!(1000), dec!(1.2), dec!(300)).unwrap();
        assert_eq!(value, dec!(1500));
    }

    #[test]
    fn test_unrealized_pnl_profit_and_loss() {
        assert_eq!(
            SnapshotCalculator::unrealized_pnl(dec!(1.10), dec!(1.00), dec!(500)).unwrap(),
            dec!(50)
        );
        assert_eq!(
            SnapshotCalculator::unrealized_pnl(dec!(0.90), dec!(1.00), dec!(500)).unwrap(),
            dec!(-50)
        );
    }

    #[test]
    fn test_unrealized_pnl_percent() {
        assert_eq!(
            SnapshotCalculator::unrealized_pnl_percent(dec!(1.10), dec!(1.00)).unwrap(),
            dec!(10)
        );
        assert!(SnapshotCalculator::unrealized_pnl_percent(dec!(1.10), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_rate_guards_zero_total() {
        assert_eq!(SnapshotCalculator::rate(0, 0), Decimal::ZERO);
        assert_eq!(SnapshotCalculator::rate(1, 4), dec!(25));
    }

    #[test]
    fn test_order_value_rounds_to_cents() {
        let value = SnapshotCalculator::order_value(Some(dec!(1.5)), Some(dec!(100))).unwrap();
        assert_eq!(value.to_string(), "150.00");
        assert_eq!(
            SnapshotCalculator::order_value(Some(dec!(0.33333)), Some(dec!(3))),
            Some(dec!(1.00))
        );
        assert_eq!(SnapshotCalculator::order_value(None, Some(dec!(3))), None);
    }

    #[test]
    fn test_average_fill_price() {
        assert_eq!(
            SnapshotCalculator::average_fill_price(Some(dec!(300)), Some(dec!(200))),
            Some(dec!(1.5))
        );
        assert_eq!(SnapshotCalculator::average_fill_price(Some(dec!(0)), Some(dec!(0))), None);
        assert_eq!(SnapshotCalculator::average_fill_price(None, Some(dec!(5))), None);
    }

    #[test]
    fn test_runtime_days_and_hours() {
        let first = Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap();
        let last = first + Duration::days(3) + Duration::hours(5) + Duration::minutes(59);

        let runtime = SnapshotCalculator::runtime(Some(first), Some(last));
        assert_eq!(runtime.total_runtime, "3d 5h");
        assert_eq!(runtime.days_since_start, 3);
    }

    #[test]
    fn test_runtime_without_decisions() {
        let runtime = SnapshotCalculator::runtime(None, None);
        assert_eq!(runtime.total_runtime, "0d 0h");
        assert_eq!(runtime.days_since_start, 0);
        assert!(runtime.first_decision.is_none());
    }
}
