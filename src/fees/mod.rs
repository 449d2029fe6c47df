pub mod funding;
pub mod upfront;

use serde::{Deserialize, Serialize};

use crate::config::ScheduleInputs;
use crate::decimal::Money;

pub use funding::{FundingCharges, FUNDING_GRACE_DAYS};
pub use upfront::{UpfrontBreakdown, UpfrontCharges};

/// financed principal for one trial fee: C = A + B
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancedAmount {
    pub upfront: UpfrontCharges,
    pub funding: FundingCharges,
    pub principal: Money,
}

impl FinancedAmount {
    /// upfront total (A)
    pub fn upfront_total(&self) -> Money {
        self.upfront.total
    }

    /// funding-period charge (B)
    pub fn funding_total(&self) -> Money {
        self.funding.total
    }
}

/// aggregate every financed charge for the trial fee `fee`
pub fn finance(inputs: &ScheduleInputs, fee: Money) -> FinancedAmount {
    let upfront = UpfrontCharges::compute(inputs, fee);
    let funding = FundingCharges::compute(inputs, upfront.total);
    let principal = upfront.total + funding.total;

    FinancedAmount {
        upfront,
        funding,
        principal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_principal_is_upfront_plus_funding() {
        let inputs = ScheduleInputs::standard_lease(
            Money::from_major(1_000_000),
            36,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        );

        let financed = finance(&inputs, Money::from_major(120_000));
        assert_eq!(
            financed.principal,
            financed.upfront_total() + financed.funding_total()
        );
        // 16-day window: only the bank fee on A applies
        assert_eq!(financed.funding.chargeable_days, 0);
        assert!(financed.principal > financed.upfront_total());
    }

    #[test]
    fn test_finance_is_monotone_in_fee() {
        let inputs = ScheduleInputs::standard_lease(
            Money::from_major(800_000),
            24,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        );

        let low = finance(&inputs, Money::ZERO);
        let high = finance(&inputs, Money::from_major(50_000));
        assert!(high.principal > low.principal);
    }
}
