use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::events::SolverEvent;
use crate::fees::{FundingCharges, UpfrontBreakdown};

/// one month of the lease schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    /// 1-based period number
    pub period: u32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub days: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub amortization: Money,
    /// net annuity, before VAT
    pub annuity: Money,
    /// year-2 / year-3 premium added to the balance this period
    pub insurance_capitalized: Money,
    pub irc_monthly: Money,
    pub bank_fee_monthly: Money,
    pub telematics_monthly: Money,
    pub generic_fees_monthly: Money,
    /// one-time fees, period 1 only
    pub upfront_fees: Money,
    pub vat_on_upfront: Money,
    pub vat_on_monthly_fees: Money,
    pub vat_on_insurance: Money,
    pub vat_on_annuity: Money,
    pub closing_balance: Money,
    /// interest capitalized, no annuity due
    pub grace: bool,
}

impl PeriodRow {
    /// all VAT generated in this period
    pub fn vat_generated(&self) -> Money {
        self.vat_on_annuity + self.vat_on_monthly_fees + self.vat_on_insurance + self.vat_on_upfront
    }

    /// itemized monthly charges, net of VAT
    pub fn monthly_fees_total(&self) -> Money {
        self.irc_monthly + self.bank_fee_monthly + self.telematics_monthly + self.generic_fees_monthly
    }
}

/// how the equilibrium search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveOutcome {
    /// residual within tolerance
    Converged { iterations: u32 },
    /// equilibrium solving disabled, built once with a zero fee
    Skipped,
    /// no sign change after growing the bracket
    Unbracketed { expansions: u32 },
    /// bisection steps used up, best midpoint returned
    BudgetExhausted { iterations: u32 },
    /// stopped by deadline or cancellation
    Interrupted { evaluations: u32 },
}

impl SolveOutcome {
    /// true for a converged search and for a search that was never requested
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveOutcome::Converged { .. } | SolveOutcome::Skipped)
    }
}

/// schedule totals, derived from the final rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsSummary {
    /// upfront financed add-on total (A)
    pub upfront_total: Money,
    /// funding-period charge (B)
    pub funding_charge: Money,
    /// financed principal (C = A + B)
    pub principal: Money,
    pub balloon_target: Money,
    pub vat_on_asset: Money,
    pub fee_solved: Money,
    pub vat_generated: Money,
    /// VAT generated minus (VAT on asset + fee), unrounded
    pub residual: Money,
    pub level_payment: Money,
    pub total_interest: Money,
    pub total_annuity: Money,
    pub total_monthly_fees: Money,
    pub upfront_breakdown: UpfrontBreakdown,
    pub funding: FundingCharges,
    pub payment_converged: bool,
    pub outcome: SolveOutcome,
    /// equilibrium and payment searches both converged
    pub converged: bool,
}

/// complete output of one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub rows: Vec<PeriodRow>,
    pub totals: TotalsSummary,
    #[serde(default)]
    pub events: Vec<SolverEvent>,
}

impl ScheduleResult {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_convergence() {
        assert!(SolveOutcome::Converged { iterations: 12 }.is_converged());
        assert!(SolveOutcome::Skipped.is_converged());
        assert!(!SolveOutcome::Unbracketed { expansions: 25 }.is_converged());
        assert!(!SolveOutcome::BudgetExhausted { iterations: 80 }.is_converged());
        assert!(!SolveOutcome::Interrupted { evaluations: 3 }.is_converged());
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = serde_json::to_string(&SolveOutcome::Converged { iterations: 7 }).unwrap();
        assert_eq!(json, r#"{"status":"converged","iterations":7}"#);

        let skipped: SolveOutcome = serde_json::from_str(r#"{"status":"skipped"}"#).unwrap();
        assert_eq!(skipped, SolveOutcome::Skipped);
    }
}
