use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{FeeScheduleConfig, ScheduleInputs};
use crate::decimal::Money;

/// every addend of the upfront financed amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpfrontBreakdown {
    pub asset_net: Money,
    pub insurance_year1: Money,
    pub telematics_install: Money,
    pub tse: Money,
    pub tapr: Money,
    pub stamp_duty: Money,
    pub online_registration: Money,
    pub filing_minutes: Money,
    pub cprf: Money,
    pub tee: Money,
    pub loan_registration: Money,
}

impl UpfrontBreakdown {
    /// named addends in booking order
    pub fn entries(&self) -> [(&'static str, Money); 11] {
        [
            ("asset_net", self.asset_net),
            ("insurance_year1", self.insurance_year1),
            ("telematics_install", self.telematics_install),
            ("tse", self.tse),
            ("tapr", self.tapr),
            ("stamp_duty", self.stamp_duty),
            ("online_registration", self.online_registration),
            ("filing_minutes", self.filing_minutes),
            ("cprf", self.cprf),
            ("tee", self.tee),
            ("loan_registration", self.loan_registration),
        ]
    }

    /// one-time fees booked in period 1 (everything but the asset and year-1 insurance)
    pub fn one_off_total(&self) -> Money {
        self.telematics_install
            + self.tse
            + self.tapr
            + self.stamp_duty
            + self.online_registration
            + self.filing_minutes
            + self.cprf
            + self.tee
            + self.loan_registration
    }

    /// part of the one-off fees that carries VAT
    pub fn vatable_one_off(&self, fees: &FeeScheduleConfig) -> Money {
        let mut base = if fees.vat_on_telematics {
            self.telematics_install
        } else {
            Money::ZERO
        };
        // loan registration stays in this bucket; it is only VAT-able through this toggle
        if fees.vat_on_upfront_taxes {
            base += self.one_off_total() - self.telematics_install;
        }
        base
    }
}

/// upfront financed add-on amount (A) and its breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpfrontCharges {
    pub total: Money,
    pub breakdown: UpfrontBreakdown,
}

impl UpfrontCharges {
    /// A = (base + lr * f) / (1 - lr), solved in closed form since the
    /// loan registration fee is charged on a total that includes itself
    pub fn compute(inputs: &ScheduleInputs, fee: Money) -> Self {
        let fees = &inputs.fees;
        let d = inputs.ipa_net_reference();
        let e = d * (Decimal::ONE + inputs.vat_rate.as_decimal());

        let mut breakdown = UpfrontBreakdown {
            asset_net: inputs.asset_net,
            insurance_year1: inputs.insurance.financed_year1(),
            telematics_install: fees.telematics_install,
            tse: d * fees.tse_rate,
            tapr: fees.tapr_fixed,
            stamp_duty: fees.stamp_duty_fixed,
            online_registration: fees.online_registration_fixed,
            filing_minutes: fees.filing_minutes_fixed,
            cprf: e * fees.cprf_rate,
            tee: if fees.apply_tee {
                e * fees.tee_rate
            } else {
                Money::ZERO
            },
            loan_registration: Money::ZERO,
        };

        let base: Money = breakdown.entries().iter().map(|(_, amount)| *amount).sum();
        let lr = fees.loan_registration_rate;
        let total = (base + fee * lr) / (Decimal::ONE - lr.as_decimal());
        breakdown.loan_registration = (total + fee) * lr;

        Self { total, breakdown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn inputs() -> ScheduleInputs {
        ScheduleInputs::standard_lease(
            Money::from_major(1_000_000),
            36,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        )
    }

    #[test]
    fn test_default_breakdown() {
        let charges = UpfrontCharges::compute(&inputs(), Money::ZERO);
        let b = &charges.breakdown;

        assert_eq!(b.asset_net, Money::from_major(1_000_000));
        assert_eq!(b.insurance_year1, Money::ZERO);
        assert_eq!(b.tse, Money::from_major(1_000));
        // e = 1,000,000 * 1.18
        assert_eq!(b.cprf, Money::from_major(354));
        assert_eq!(b.tee, Money::from_major(59_000));

        // base = 1,185,504 so A = 1,185,504 / 0.99
        let expected = Money::from_decimal(dec!(1185504) / dec!(0.99));
        assert_eq!(charges.total, expected);
    }

    #[test]
    fn test_loan_registration_is_self_consistent() {
        let fee = Money::from_major(150_000);
        let charges = UpfrontCharges::compute(&inputs(), fee);
        let b = &charges.breakdown;

        // A equals the sum of its addends, loan registration included
        let sum: Money = b.entries().iter().map(|(_, amount)| *amount).sum();
        assert!((sum - charges.total).abs() <= Money::from_str_exact("0.0000001").unwrap());

        assert_eq!(b.loan_registration, (charges.total + fee) * Rate::from_percentage(1));
    }

    #[test]
    fn test_fee_increases_total() {
        let lower = UpfrontCharges::compute(&inputs(), Money::ZERO);
        let higher = UpfrontCharges::compute(&inputs(), Money::from_major(99_000));
        // lr * f / (1 - lr) = 0.01 * 99,000 / 0.99 = 1,000
        assert_eq!(higher.total - lower.total, Money::from_major(1_000));
    }

    #[test]
    fn test_toggles_and_overrides() {
        let mut inputs = inputs();
        inputs.fees.apply_tee = false;
        inputs.ipa_net_override = Some(Money::from_major(2_000_000));
        inputs.insurance.year1_premium = Money::from_major(45_000);

        let b = UpfrontCharges::compute(&inputs, Money::ZERO).breakdown;
        assert_eq!(b.tee, Money::ZERO);
        assert_eq!(b.tse, Money::from_major(2_000));
        assert_eq!(b.cprf, Money::from_major(708));
        assert_eq!(b.insurance_year1, Money::from_major(45_000));
        // the asset itself is never replaced by the override
        assert_eq!(b.asset_net, Money::from_major(1_000_000));
    }

    #[test]
    fn test_vatable_one_off() {
        let mut inputs = inputs();
        let b = UpfrontCharges::compute(&inputs, Money::ZERO).breakdown;

        assert_eq!(b.vatable_one_off(&inputs.fees), Money::from_major(58_500));

        inputs.fees.vat_on_upfront_taxes = true;
        assert_eq!(b.vatable_one_off(&inputs.fees), b.one_off_total());

        inputs.fees.vat_on_telematics = false;
        assert_eq!(
            b.vatable_one_off(&inputs.fees),
            b.one_off_total() - Money::from_major(58_500)
        );

        inputs.fees.vat_on_upfront_taxes = false;
        assert_eq!(b.vatable_one_off(&inputs.fees), Money::ZERO);
    }
}
