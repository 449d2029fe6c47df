use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{InsurancePolicy, ScheduleInputs, SolverLimits};
use crate::decimal::Money;
use crate::interest::AccrualEngine;
use crate::schedule::Period;

/// level payment found by the inner bisection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentSolution {
    /// unrounded level payment
    pub payment: Money,
    /// balance left after the last period at `payment`
    pub end_balance: Money,
    /// bisection steps taken
    pub iterations: u32,
    /// bracket growth steps taken
    pub expansions: u32,
    /// whether the upper bound drove the balance down to the target
    pub bracketed: bool,
    pub converged: bool,
}

/// solves for the level payment that lands the balance on the balloon target
#[derive(Debug, Clone, Copy)]
pub struct PaymentSolver<'a> {
    periods: &'a [Period],
    engine: AccrualEngine,
    grace_months: u32,
    insurance: &'a InsurancePolicy,
    limits: &'a SolverLimits,
}

impl<'a> PaymentSolver<'a> {
    pub fn new(inputs: &'a ScheduleInputs, periods: &'a [Period]) -> Self {
        Self {
            periods,
            engine: AccrualEngine::new(inputs.effective_annual_rate(), inputs.round_decimals),
            grace_months: inputs.grace_months,
            insurance: &inputs.insurance,
            limits: &inputs.solver,
        }
    }

    fn amortizing_periods(&self) -> usize {
        self.periods
            .iter()
            .filter(|p| p.number > self.grace_months)
            .count()
    }

    /// walk every period at `payment` and return the final balance
    ///
    /// grace periods capitalize the rounded interest; the others amortize
    /// `payment - interest` without rounding so the result moves continuously
    /// with `payment`
    pub fn end_balance(&self, principal: Money, payment: Money) -> Money {
        let mut balance = principal;
        for period in self.periods {
            let interest = self.engine.period_interest(balance, period.days());
            balance += self.insurance.capitalized_in(period.number);
            if period.number <= self.grace_months {
                balance += interest;
            } else {
                balance -= payment - interest;
            }
        }
        balance
    }

    /// bisect the level payment for `principal` so the end balance hits `target`
    pub fn solve(&self, principal: Money, target: Money) -> PaymentSolution {
        if self.amortizing_periods() == 0 {
            // nothing to amortize; the final true-up settles the balance
            return PaymentSolution {
                payment: Money::ZERO,
                end_balance: self.end_balance(principal, Money::ZERO),
                iterations: 0,
                expansions: 0,
                bracketed: true,
                converged: true,
            };
        }

        let limits = self.limits;
        let mut lo = Money::ZERO;
        let mut hi = principal * (Decimal::ONE + self.engine.annual_rate().as_decimal());
        if !hi.is_positive() {
            hi = Money::ONE;
        }

        let mut expansions = 0;
        while self.end_balance(principal, hi) > target
            && expansions < limits.payment_bracket_expansions
        {
            hi = hi * limits.payment_growth;
            expansions += 1;
        }
        let bracketed = self.end_balance(principal, hi) <= target;

        for step in 1..=limits.payment_bisection_steps {
            let mid = lo.midpoint(hi);
            let end = self.end_balance(principal, mid);
            if (end - target).abs() <= limits.payment_tolerance {
                return PaymentSolution {
                    payment: mid,
                    end_balance: end,
                    iterations: step,
                    expansions,
                    bracketed,
                    converged: true,
                };
            }
            if end > target {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let payment = lo.midpoint(hi);
        let end_balance = self.end_balance(principal, payment);
        debug!(
            principal = %principal,
            payment = %payment,
            end_balance = %end_balance,
            bracketed,
            "Payment bisection exhausted without reaching tolerance"
        );

        PaymentSolution {
            payment,
            end_balance,
            iterations: limits.payment_bisection_steps,
            expansions,
            bracketed,
            converged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::schedule::generate_periods;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn inputs(tenure: u32) -> ScheduleInputs {
        ScheduleInputs::standard_lease(
            Money::from_major(1_000_000),
            tenure,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        )
    }

    fn solve(inputs: &ScheduleInputs, principal: Money, target: Money) -> (PaymentSolution, Money) {
        let periods = generate_periods(inputs.first_due_date, inputs.tenure_months).unwrap();
        let solver = PaymentSolver::new(inputs, &periods);
        let solution = solver.solve(principal, target);
        let check = solver.end_balance(principal, solution.payment);
        (solution, check)
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let mut inputs = inputs(12);
        inputs.annual_rate = Rate::ZERO;

        let (solution, end) = solve(&inputs, Money::from_major(1_200_000), Money::ZERO);
        assert!(solution.converged);
        assert!(solution.bracketed);
        assert!(end.abs() <= Money::ONE);
        assert!((solution.payment - Money::from_major(100_000)).abs() <= Money::ONE);
    }

    #[test]
    fn test_payment_hits_balloon_target() {
        let inputs = inputs(36);
        let target = Money::from_major(250_000);

        let (solution, end) = solve(&inputs, Money::from_major(1_300_000), target);
        assert!(solution.converged);
        assert!((end - target).abs() <= Money::ONE);
        assert_eq!(end, solution.end_balance);
    }

    #[test]
    fn test_standard_annuity_magnitude() {
        let inputs = inputs(36);
        let (solution, _) = solve(&inputs, Money::from_major(1_000_000), Money::ZERO);

        // 20% nominal over 36 months is roughly 37,160 a month
        assert!(solution.payment > Money::from_major(36_500));
        assert!(solution.payment < Money::from_major(38_000));
    }

    #[test]
    fn test_grace_raises_payment() {
        let plain = inputs(24);
        let mut grace = inputs(24);
        grace.grace_months = 3;

        let principal = Money::from_major(900_000);
        let (without, _) = solve(&plain, principal, Money::ZERO);
        let (with, end) = solve(&grace, principal, Money::ZERO);

        assert!(with.converged);
        assert!(end.abs() <= Money::ONE);
        assert!(with.payment > without.payment);
    }

    #[test]
    fn test_capitalized_insurance_is_amortized() {
        let plain = inputs(36);
        let mut insured = inputs(36);
        insured.insurance.year2_premium = Money::from_major(40_000);

        let principal = Money::from_major(1_000_000);
        let (without, _) = solve(&plain, principal, Money::ZERO);
        let (with, end) = solve(&insured, principal, Money::ZERO);

        assert!(end.abs() <= Money::ONE);
        assert!(with.payment > without.payment);
    }

    #[test]
    fn test_all_grace_needs_no_payment() {
        let mut inputs = inputs(6);
        inputs.grace_months = 6;

        let (solution, end) = solve(&inputs, Money::from_major(100_000), Money::ZERO);
        assert!(solution.converged);
        assert_eq!(solution.payment, Money::ZERO);
        assert!(end > Money::from_major(100_000));
    }

    #[test]
    fn test_exhausted_budget_returns_midpoint() {
        let mut inputs = inputs(12);
        inputs.solver.payment_bisection_steps = 2;
        inputs.solver.payment_tolerance = Money::from_decimal(dec!(0.00000001));

        let (solution, _) = solve(&inputs, Money::from_major(500_000), Money::ZERO);
        assert!(!solution.converged);
        assert!(solution.bracketed);
        assert_eq!(solution.iterations, 2);
        assert!(solution.payment.is_positive());
    }

    #[test]
    fn test_unbracketed_payment_is_best_effort() {
        // one amortizing month after 59 capitalized ones at 60% nominal
        let mut inputs = inputs(60);
        inputs.annual_rate = Rate::from_percentage(60);
        inputs.grace_months = 59;
        inputs.solver.payment_bracket_expansions = 0;

        let principal = Money::from_major(100_000);
        let (solution, end) = solve(&inputs, principal, Money::ZERO);
        assert!(!solution.bracketed);
        assert!(!solution.converged);
        assert_eq!(solution.expansions, 0);
        assert!(solution.payment.is_positive());
        assert!(solution.payment < Money::from_major(160_000));
        assert!(end > Money::ZERO);
    }
}
