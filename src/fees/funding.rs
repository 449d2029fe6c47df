use serde::{Deserialize, Serialize};

use crate::config::ScheduleInputs;
use crate::decimal::Money;
use crate::interest::AccrualEngine;

/// days between vendor payment and first due date that carry no funding charge
pub const FUNDING_GRACE_DAYS: u32 = 30;

/// pre-disbursement funding-period charge (B)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FundingCharges {
    /// days from vendor payment to first due date (W)
    pub window_days: u32,
    /// chargeable days after the grace window (W')
    pub chargeable_days: u32,
    pub funding_interest: Money,
    pub irc: Money,
    pub bank_fee: Money,
    pub total: Money,
}

impl FundingCharges {
    pub fn compute(inputs: &ScheduleInputs, upfront_total: Money) -> Self {
        let fees = &inputs.fees;
        let window_days =
            AccrualEngine::calculate_days(inputs.vendor_payment_date, inputs.first_due_date);
        let chargeable_days = window_days.saturating_sub(FUNDING_GRACE_DAYS);

        let funding_interest = upfront_total.apply_rate(inputs.funding_rate, chargeable_days);
        let irc = funding_interest * fees.irc_rate;
        let bank_fee = (upfront_total + funding_interest) * fees.banking_fee_rate;

        Self {
            window_days,
            chargeable_days,
            funding_interest,
            irc,
            bank_fee,
            total: funding_interest + irc + bank_fee,
        }
    }
}
