use rust_decimal::Decimal;

use crate::config::ScheduleInputs;
use crate::decimal::Money;
use crate::errors::Result;
use crate::fees::{finance, FinancedAmount};
use crate::interest::AccrualEngine;
use crate::schedule::periods::{generate_periods, Period};
use crate::solver::{PaymentSolution, PaymentSolver};
use crate::types::{PeriodRow, SolveOutcome, TotalsSummary};

/// schedule built for one trial fee
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleBuild {
    pub fee: Money,
    pub financed: FinancedAmount,
    pub payment: PaymentSolution,
    pub balloon_target: Money,
    pub vat_on_asset: Money,
    pub rows: Vec<PeriodRow>,
    pub vat_generated: Money,
}

impl ScheduleBuild {
    /// VAT generated minus the VAT it has to offset
    pub fn residual(&self) -> Money {
        self.vat_generated - (self.vat_on_asset + self.fee)
    }

    /// totals for presentation, rounded to the configured precision
    pub fn summarize(&self, inputs: &ScheduleInputs, outcome: SolveOutcome) -> TotalsSummary {
        let fee_solved = match outcome {
            SolveOutcome::Skipped => Money::ZERO,
            _ => inputs.round(self.fee),
        };
        let total_interest: Money = self.rows.iter().map(|r| r.interest).sum();
        let total_annuity: Money = self.rows.iter().map(|r| r.annuity).sum();
        let total_monthly_fees: Money = self.rows.iter().map(|r| r.monthly_fees_total()).sum();

        TotalsSummary {
            upfront_total: inputs.round(self.financed.upfront_total()),
            funding_charge: inputs.round(self.financed.funding_total()),
            principal: inputs.round(self.financed.principal),
            balloon_target: inputs.round(self.balloon_target),
            vat_on_asset: inputs.round(self.vat_on_asset),
            fee_solved,
            vat_generated: inputs.round(self.vat_generated),
            residual: self.residual(),
            level_payment: inputs.round(self.payment.payment),
            total_interest: inputs.round(total_interest),
            total_annuity: inputs.round(total_annuity),
            total_monthly_fees: inputs.round(total_monthly_fees),
            upfront_breakdown: self.financed.upfront.breakdown.clone(),
            funding: self.financed.funding.clone(),
            payment_converged: self.payment.converged,
            outcome,
            converged: outcome.is_converged() && self.payment.converged,
        }
    }
}

/// walks every period of the lease for a given trial fee
#[derive(Debug, Clone)]
pub struct ScheduleBuilder<'a> {
    inputs: &'a ScheduleInputs,
    periods: Vec<Period>,
}

impl<'a> ScheduleBuilder<'a> {
    /// validate the inputs and lay out the periods once
    pub fn new(inputs: &'a ScheduleInputs) -> Result<Self> {
        inputs.validate()?;
        let periods = generate_periods(inputs.first_due_date, inputs.tenure_months)?;
        Ok(Self { inputs, periods })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn inputs(&self) -> &'a ScheduleInputs {
        self.inputs
    }

    /// build the full schedule for the trial fee `fee`
    pub fn build(&self, fee: Money) -> ScheduleBuild {
        let inputs = self.inputs;
        let fees = &inputs.fees;
        let insurance = &inputs.insurance;
        let vat_rate = inputs.vat_rate;
        let tenure = inputs.tenure_months;

        let financed = finance(inputs, fee);
        let balloon_target = inputs.balloon_target();
        let payment = PaymentSolver::new(inputs, &self.periods).solve(financed.principal, balloon_target);

        let engine = AccrualEngine::new(inputs.effective_annual_rate(), inputs.round_decimals);
        // no interest is really charged at a zero rate, so nothing is funded from it
        let funding_ratio = if inputs.annual_rate.is_zero() {
            Decimal::ZERO
        } else {
            inputs.funding_rate.ratio_to(inputs.annual_rate)
        };
        let bank_base = inputs.bank_base_override.unwrap_or(financed.upfront.total);
        let bank_share = bank_base / Decimal::from(tenure);

        let telematics = fees.telematics_monthly;
        let generic = inputs.generic_monthly_fees();
        let mut vatable_monthly = inputs.vatable_generic_monthly_fees();
        if fees.vat_on_telematics {
            vatable_monthly += telematics;
        }
        let vat_on_monthly_fees = inputs.round(vatable_monthly * vat_rate);

        let breakdown = &financed.upfront.breakdown;
        let upfront_fees = inputs.round(breakdown.one_off_total());
        let vat_on_upfront = inputs.round(breakdown.vatable_one_off(fees) * vat_rate);

        let mut rows = Vec::with_capacity(self.periods.len());
        let mut balance = financed.principal;

        for period in &self.periods {
            let opening = balance;
            let days = period.days();
            let interest = engine.period_interest(opening, days);

            let insurance_added = insurance.capitalized_in(period.number);
            balance += insurance_added;
            let vat_on_insurance =
                if insurance_added.is_positive() && inputs.vat_on_insurance && insurance.vatable {
                    inputs.round(insurance_added * vat_rate)
                } else {
                    Money::ZERO
                };

            // funding cost share of this period's interest
            let funding_share = interest * funding_ratio;
            let irc_monthly = inputs.round(funding_share * fees.irc_rate);
            let bank_fee_monthly = inputs.round((bank_share + funding_share) * fees.banking_fee_rate);

            let grace = period.number <= inputs.grace_months;
            let (mut amortization, mut annuity) = if grace {
                balance += interest;
                (Money::ZERO, Money::ZERO)
            } else {
                let amortization = inputs.round(payment.payment - interest);
                balance -= amortization;
                (amortization, interest + amortization)
            };

            if period.number == tenure {
                // true-up: land exactly on the balloon
                amortization = opening + insurance_added - balloon_target;
                annuity = interest + amortization;
                balance = balloon_target;
            }

            let first = period.number == 1;
            rows.push(PeriodRow {
                period: period.number,
                start_date: period.start,
                due_date: period.due,
                days,
                opening_balance: opening,
                interest,
                amortization,
                annuity,
                insurance_capitalized: insurance_added,
                irc_monthly,
                bank_fee_monthly,
                telematics_monthly: telematics,
                generic_fees_monthly: generic,
                upfront_fees: if first { upfront_fees } else { Money::ZERO },
                vat_on_upfront: if first { vat_on_upfront } else { Money::ZERO },
                vat_on_monthly_fees,
                vat_on_insurance,
                vat_on_annuity: inputs.round(annuity * vat_rate),
                closing_balance: balance,
                grace,
            });
        }

        let vat_generated: Money = rows.iter().map(PeriodRow::vat_generated).sum();

        ScheduleBuild {
            fee,
            financed,
            payment,
            balloon_target,
            vat_on_asset: inputs.vat_on_asset(),
            rows,
            vat_generated,
        }
    }
}
