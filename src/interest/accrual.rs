use chrono::NaiveDate;

use crate::decimal::{Money, Rate};

/// actual/365 simple-interest engine with presentation rounding
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    annual_rate: Rate,
    precision: u32,
}

impl AccrualEngine {
    /// a zero rate is replaced by [`Rate::NEGLIGIBLE`]
    pub fn new(annual_rate: Rate, precision: u32) -> Self {
        Self {
            annual_rate: annual_rate.or_negligible(),
            precision,
        }
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    /// actual days between dates, floored at zero
    pub fn calculate_days(start: NaiveDate, end: NaiveDate) -> u32 {
        (end - start).num_days().max(0) as u32
    }

    /// interest on `balance` for `days`, rounded to the configured precision
    pub fn period_interest(&self, balance: Money, days: u32) -> Money {
        balance.apply_rate(self.annual_rate, days).round_dp(self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_actual_days() {
        assert_eq!(AccrualEngine::calculate_days(date(2024, 1, 1), date(2024, 2, 1)), 31);
        assert_eq!(AccrualEngine::calculate_days(date(2024, 2, 1), date(2024, 3, 1)), 29);
        assert_eq!(AccrualEngine::calculate_days(date(2023, 2, 1), date(2023, 3, 1)), 28);
        // reversed dates never produce negative days
        assert_eq!(AccrualEngine::calculate_days(date(2025, 10, 1), date(2025, 9, 15)), 0);
    }

    #[test]
    fn test_period_interest_rounding() {
        let principal = Money::from_major(10_000);

        let whole = AccrualEngine::new(Rate::from_percentage(5), 0);
        // 10,000 * 5% * 30 / 365 = 41.0958...
        assert_eq!(whole.period_interest(principal, 30), Money::from_major(41));

        let cents = AccrualEngine::new(Rate::from_percentage(5), 2);
        assert_eq!(
            cents.period_interest(principal, 30),
            Money::from_str_exact("41.10").unwrap()
        );
    }

    #[test]
    fn test_zero_rate_is_negligible() {
        let engine = AccrualEngine::new(Rate::ZERO, 2);
        assert_eq!(engine.annual_rate(), Rate::NEGLIGIBLE);
        assert_eq!(engine.period_interest(Money::from_major(1_000_000), 31), Money::ZERO);
    }

    #[test]
    fn test_interest_between_due_dates() {
        let engine = AccrualEngine::new(Rate::from_decimal(dec!(0.20)), 0);
        let days = AccrualEngine::calculate_days(date(2025, 9, 1), date(2025, 10, 1));

        assert_eq!(days, 30);
        // 1,000,000 * 0.20 * 30 / 365 = 16,438.36
        assert_eq!(
            engine.period_interest(Money::from_major(1_000_000), days),
            Money::from_major(16_438)
        );
    }
}
