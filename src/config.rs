use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// largest presentation precision accepted for `round_decimals`
pub const MAX_ROUND_DECIMALS: u32 = 2;

const MAX_FEE_NAME_LEN: usize = 50;

/// immutable configuration for one schedule calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInputs {
    pub asset_net: Money,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Rate,
    #[serde(default = "default_tenure_months")]
    pub tenure_months: u32,
    #[serde(default = "default_annual_rate")]
    pub annual_rate: Rate,
    #[serde(default = "default_funding_rate")]
    pub funding_rate: Rate,
    #[serde(default)]
    pub grace_months: u32,
    #[serde(default)]
    pub balloon_percent: Rate,
    /// date the vendor is paid (T)
    #[serde(default = "default_vendor_payment_date")]
    pub vendor_payment_date: NaiveDate,
    /// first instalment due date (S)
    #[serde(default = "default_first_due_date")]
    pub first_due_date: NaiveDate,
    #[serde(default)]
    pub monthly_fees: Vec<MonthlyFeeItem>,
    #[serde(default)]
    pub fees: FeeScheduleConfig,
    #[serde(default)]
    pub insurance: InsurancePolicy,
    #[serde(default = "default_true")]
    pub vat_on_monthly_fees: bool,
    #[serde(default = "default_true")]
    pub vat_on_insurance: bool,
    #[serde(default)]
    pub round_decimals: u32,
    #[serde(default = "default_true")]
    pub solve_equilibrium: bool,
    /// replaces the asset price as the base of the percentage charges
    #[serde(default)]
    pub ipa_net_override: Option<Money>,
    /// replaces the financed add-on total as the monthly bank fee base
    #[serde(default)]
    pub bank_base_override: Option<Money>,
    #[serde(default)]
    pub solver: SolverLimits,
}

/// named flat monthly charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFeeItem {
    pub name: String,
    #[serde(default)]
    pub amount_monthly: Money,
    #[serde(default = "default_true")]
    pub vatable: bool,
}

impl MonthlyFeeItem {
    pub fn new(name: impl Into<String>, amount_monthly: Money, vatable: bool) -> Self {
        Self {
            name: name.into(),
            amount_monthly,
            vatable,
        }
    }
}

/// transaction service fee schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeScheduleConfig {
    pub tse_rate: Rate,
    pub tapr_fixed: Money,
    pub stamp_duty_fixed: Money,
    pub online_registration_fixed: Money,
    pub filing_minutes_fixed: Money,
    pub cprf_rate: Rate,
    pub tee_rate: Rate,
    pub apply_tee: bool,
    /// loan registration fee, charged on the financed amount including itself
    pub loan_registration_rate: Rate,
    pub telematics_install: Money,
    pub telematics_monthly: Money,
    pub irc_rate: Rate,
    pub banking_fee_rate: Rate,
    pub vat_on_telematics: bool,
    pub vat_on_upfront_taxes: bool,
}

impl Default for FeeScheduleConfig {
    fn default() -> Self {
        Self {
            tse_rate: Rate::from_decimal(dec!(0.001)),
            tapr_fixed: Money::from_major(25_000),
            stamp_duty_fixed: Money::from_major(30_000),
            online_registration_fixed: Money::from_major(6_650),
            filing_minutes_fixed: Money::from_major(5_000),
            cprf_rate: Rate::from_decimal(dec!(0.0003)),
            tee_rate: Rate::from_decimal(dec!(0.05)),
            apply_tee: true,
            loan_registration_rate: Rate::from_decimal(dec!(0.01)),
            telematics_install: Money::from_major(58_500),
            telematics_monthly: Money::from_major(10_000),
            irc_rate: Rate::from_decimal(dec!(0.18)),
            banking_fee_rate: Rate::from_decimal(dec!(0.026)),
            vat_on_telematics: true,
            vat_on_upfront_taxes: false,
        }
    }
}

/// three-year insurance policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsurancePolicy {
    pub year1_premium: Money,
    pub year2_premium: Money,
    pub year3_premium: Money,
    pub capitalize_year1: bool,
    pub capitalize_year2: bool,
    pub capitalize_year3: bool,
    pub vatable: bool,
    /// period in which the year-2 premium is added to the balance
    pub year2_trigger_month: u32,
    /// period in which the year-3 premium is added to the balance
    pub year3_trigger_month: u32,
}

impl Default for InsurancePolicy {
    fn default() -> Self {
        Self {
            year1_premium: Money::ZERO,
            year2_premium: Money::ZERO,
            year3_premium: Money::ZERO,
            capitalize_year1: true,
            capitalize_year2: true,
            capitalize_year3: true,
            vatable: true,
            year2_trigger_month: 12,
            year3_trigger_month: 24,
        }
    }
}

impl InsurancePolicy {
    /// year-1 premium financed upfront
    pub fn financed_year1(&self) -> Money {
        if self.capitalize_year1 {
            self.year1_premium
        } else {
            Money::ZERO
        }
    }

    /// premium capitalized into the balance in the given 1-based period
    pub fn capitalized_in(&self, period: u32) -> Money {
        let mut added = Money::ZERO;
        if period == self.year2_trigger_month
            && self.capitalize_year2
            && self.year2_premium.is_positive()
        {
            added += self.year2_premium;
        }
        if period == self.year3_trigger_month
            && self.capitalize_year3
            && self.year3_premium.is_positive()
        {
            added += self.year3_premium;
        }
        added
    }
}

/// iteration budgets and tolerances for both bisection searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverLimits {
    pub payment_bracket_expansions: u32,
    pub payment_bisection_steps: u32,
    pub payment_growth: Decimal,
    pub payment_tolerance: Money,
    pub fee_bracket_expansions: u32,
    pub fee_bisection_steps: u32,
    pub fee_growth: Decimal,
    pub fee_tolerance: Money,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            payment_bracket_expansions: 80,
            payment_bisection_steps: 140,
            payment_growth: dec!(1.3),
            payment_tolerance: Money::ONE,
            fee_bracket_expansions: 25,
            fee_bisection_steps: 80,
            fee_growth: dec!(1.5),
            fee_tolerance: Money::ONE,
        }
    }
}

impl SolverLimits {
    pub fn validate(&self) -> Result<()> {
        if self.payment_growth <= Decimal::ONE || self.fee_growth <= Decimal::ONE {
            return Err(ScheduleError::InvalidConfiguration {
                message: "bracket growth factors must exceed 1".to_string(),
            });
        }
        if !self.payment_tolerance.is_positive() || !self.fee_tolerance.is_positive() {
            return Err(ScheduleError::InvalidConfiguration {
                message: "solver tolerances must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl ScheduleInputs {
    /// builder for schedule inputs
    pub fn builder() -> ScheduleInputsBuilder {
        ScheduleInputsBuilder::new()
    }

    /// typical lease: 18% VAT, 20% nominal, 12% funding, default fee schedule
    pub fn standard_lease(asset_net: Money, tenure_months: u32, first_due_date: NaiveDate) -> Self {
        Self {
            asset_net,
            vat_rate: default_vat_rate(),
            tenure_months,
            annual_rate: default_annual_rate(),
            funding_rate: default_funding_rate(),
            grace_months: 0,
            balloon_percent: Rate::ZERO,
            vendor_payment_date: first_due_date - chrono::Duration::days(16),
            first_due_date,
            monthly_fees: Vec::new(),
            fees: FeeScheduleConfig::default(),
            insurance: InsurancePolicy::default(),
            vat_on_monthly_fees: true,
            vat_on_insurance: true,
            round_decimals: 0,
            solve_equilibrium: true,
            ipa_net_override: None,
            bank_base_override: None,
            solver: SolverLimits::default(),
        }
    }

    /// parse and validate inputs from json
    pub fn from_json(json: &str) -> Result<Self> {
        let inputs: ScheduleInputs = serde_json::from_str(json)?;
        inputs.validate()?;
        Ok(inputs)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// reject configurations that cannot produce a schedule
    pub fn validate(&self) -> Result<()> {
        if self.tenure_months == 0 {
            return Err(ScheduleError::InvalidConfiguration {
                message: "tenure must be at least one month".to_string(),
            });
        }
        if self.round_decimals > MAX_ROUND_DECIMALS {
            return Err(ScheduleError::InvalidConfiguration {
                message: format!(
                    "round_decimals {} exceeds maximum {}",
                    self.round_decimals, MAX_ROUND_DECIMALS
                ),
            });
        }

        ensure_non_negative_amount("asset_net", self.asset_net)?;
        ensure_fraction("vat_rate", self.vat_rate)?;
        ensure_fraction("balloon_percent", self.balloon_percent)?;
        ensure_non_negative_rate("annual_rate", self.annual_rate)?;
        ensure_non_negative_rate("funding_rate", self.funding_rate)?;
        if let Some(d) = self.ipa_net_override {
            ensure_non_negative_amount("ipa_net_override", d)?;
        }
        if let Some(b) = self.bank_base_override {
            ensure_non_negative_amount("bank_base_override", b)?;
        }

        for item in &self.monthly_fees {
            if item.name.is_empty() || item.name.chars().count() > MAX_FEE_NAME_LEN {
                return Err(ScheduleError::InvalidConfiguration {
                    message: format!(
                        "monthly fee name must be 1-{} characters: {:?}",
                        MAX_FEE_NAME_LEN, item.name
                    ),
                });
            }
            ensure_non_negative_amount(&item.name, item.amount_monthly)?;
        }

        self.validate_fees()?;
        self.validate_insurance()?;
        self.solver.validate()
    }

    fn validate_fees(&self) -> Result<()> {
        let fees = &self.fees;
        for (field, rate) in [
            ("tse_rate", fees.tse_rate),
            ("cprf_rate", fees.cprf_rate),
            ("tee_rate", fees.tee_rate),
            ("loan_registration_rate", fees.loan_registration_rate),
            ("irc_rate", fees.irc_rate),
            ("banking_fee_rate", fees.banking_fee_rate),
        ] {
            ensure_non_negative_rate(field, rate)?;
        }
        for (field, amount) in [
            ("tapr_fixed", fees.tapr_fixed),
            ("stamp_duty_fixed", fees.stamp_duty_fixed),
            ("online_registration_fixed", fees.online_registration_fixed),
            ("filing_minutes_fixed", fees.filing_minutes_fixed),
            ("telematics_install", fees.telematics_install),
            ("telematics_monthly", fees.telematics_monthly),
        ] {
            ensure_non_negative_amount(field, amount)?;
        }
        // A = base / (1 - rate) needs a positive denominator
        if fees.loan_registration_rate.as_decimal() >= Decimal::ONE {
            return Err(ScheduleError::InvalidInterestRate {
                field: "loan_registration_rate".to_string(),
                rate: fees.loan_registration_rate,
            });
        }
        Ok(())
    }

    fn validate_insurance(&self) -> Result<()> {
        let insurance = &self.insurance;
        ensure_non_negative_amount("year1_premium", insurance.year1_premium)?;
        ensure_non_negative_amount("year2_premium", insurance.year2_premium)?;
        ensure_non_negative_amount("year3_premium", insurance.year3_premium)?;
        if insurance.year2_trigger_month < 2 || insurance.year3_trigger_month < 3 {
            return Err(ScheduleError::InvalidConfiguration {
                message: format!(
                    "insurance trigger months out of range: year2 {}, year3 {}",
                    insurance.year2_trigger_month, insurance.year3_trigger_month
                ),
            });
        }
        Ok(())
    }

    /// end-of-term balance the schedule must land on
    pub fn balloon_target(&self) -> Money {
        self.asset_net * self.balloon_percent
    }

    /// VAT otherwise payable on the asset purchase
    pub fn vat_on_asset(&self) -> Money {
        self.asset_net * self.vat_rate
    }

    /// annual rate used for accrual, never exactly zero
    pub fn effective_annual_rate(&self) -> Rate {
        self.annual_rate.or_negligible()
    }

    /// base `d` of the percentage charges
    pub fn ipa_net_reference(&self) -> Money {
        self.ipa_net_override.unwrap_or(self.asset_net)
    }

    /// sum of all generic monthly fee items
    pub fn generic_monthly_fees(&self) -> Money {
        self.monthly_fees.iter().map(|item| item.amount_monthly).sum()
    }

    /// generic monthly fees subject to VAT
    pub fn vatable_generic_monthly_fees(&self) -> Money {
        if !self.vat_on_monthly_fees {
            return Money::ZERO;
        }
        self.monthly_fees
            .iter()
            .filter(|item| item.vatable)
            .map(|item| item.amount_monthly)
            .sum()
    }

    /// round an amount to the configured presentation precision
    pub fn round(&self, amount: Money) -> Money {
        amount.round_dp(self.round_decimals)
    }
}

/// builder for schedule inputs
#[derive(Debug, Default)]
pub struct ScheduleInputsBuilder {
    asset_net: Option<Money>,
    vat_rate: Option<Rate>,
    tenure_months: Option<u32>,
    annual_rate: Option<Rate>,
    funding_rate: Option<Rate>,
    grace_months: u32,
    balloon_percent: Option<Rate>,
    vendor_payment_date: Option<NaiveDate>,
    first_due_date: Option<NaiveDate>,
    monthly_fees: Vec<MonthlyFeeItem>,
    fees: Option<FeeScheduleConfig>,
    insurance: Option<InsurancePolicy>,
    vat_on_monthly_fees: Option<bool>,
    vat_on_insurance: Option<bool>,
    round_decimals: u32,
    solve_equilibrium: Option<bool>,
    ipa_net_override: Option<Money>,
    bank_base_override: Option<Money>,
    solver: Option<SolverLimits>,
}

impl ScheduleInputsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_net(mut self, amount: Money) -> Self {
        self.asset_net = Some(amount);
        self
    }

    pub fn vat_rate(mut self, rate: Rate) -> Self {
        self.vat_rate = Some(rate);
        self
    }

    pub fn tenure_months(mut self, months: u32) -> Self {
        self.tenure_months = Some(months);
        self
    }

    pub fn annual_rate(mut self, rate: Rate) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn funding_rate(mut self, rate: Rate) -> Self {
        self.funding_rate = Some(rate);
        self
    }

    pub fn grace_months(mut self, months: u32) -> Self {
        self.grace_months = months;
        self
    }

    pub fn balloon_percent(mut self, fraction: Rate) -> Self {
        self.balloon_percent = Some(fraction);
        self
    }

    pub fn vendor_payment_date(mut self, date: NaiveDate) -> Self {
        self.vendor_payment_date = Some(date);
        self
    }

    pub fn first_due_date(mut self, date: NaiveDate) -> Self {
        self.first_due_date = Some(date);
        self
    }

    pub fn monthly_fee(mut self, item: MonthlyFeeItem) -> Self {
        self.monthly_fees.push(item);
        self
    }

    pub fn fees(mut self, fees: FeeScheduleConfig) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn insurance(mut self, insurance: InsurancePolicy) -> Self {
        self.insurance = Some(insurance);
        self
    }

    pub fn vat_on_monthly_fees(mut self, enabled: bool) -> Self {
        self.vat_on_monthly_fees = Some(enabled);
        self
    }

    pub fn vat_on_insurance(mut self, enabled: bool) -> Self {
        self.vat_on_insurance = Some(enabled);
        self
    }

    pub fn round_decimals(mut self, dp: u32) -> Self {
        self.round_decimals = dp;
        self
    }

    pub fn solve_equilibrium(mut self, enabled: bool) -> Self {
        self.solve_equilibrium = Some(enabled);
        self
    }

    pub fn ipa_net_override(mut self, amount: Money) -> Self {
        self.ipa_net_override = Some(amount);
        self
    }

    pub fn bank_base_override(mut self, amount: Money) -> Self {
        self.bank_base_override = Some(amount);
        self
    }

    pub fn solver_limits(mut self, limits: SolverLimits) -> Self {
        self.solver = Some(limits);
        self
    }

    /// build and validate
    pub fn build(self) -> Result<ScheduleInputs> {
        let asset_net = self.asset_net.ok_or(ScheduleError::InvalidConfiguration {
            message: "Asset net price required".to_string(),
        })?;

        let tenure_months = self.tenure_months.ok_or(ScheduleError::InvalidConfiguration {
            message: "Tenure required".to_string(),
        })?;

        let annual_rate = self.annual_rate.ok_or(ScheduleError::InvalidConfiguration {
            message: "Annual rate required".to_string(),
        })?;

        let inputs = ScheduleInputs {
            asset_net,
            vat_rate: self.vat_rate.unwrap_or_else(default_vat_rate),
            tenure_months,
            annual_rate,
            funding_rate: self.funding_rate.unwrap_or_else(default_funding_rate),
            grace_months: self.grace_months,
            balloon_percent: self.balloon_percent.unwrap_or(Rate::ZERO),
            vendor_payment_date: self
                .vendor_payment_date
                .unwrap_or_else(default_vendor_payment_date),
            first_due_date: self.first_due_date.unwrap_or_else(default_first_due_date),
            monthly_fees: self.monthly_fees,
            fees: self.fees.unwrap_or_default(),
            insurance: self.insurance.unwrap_or_default(),
            vat_on_monthly_fees: self.vat_on_monthly_fees.unwrap_or(true),
            vat_on_insurance: self.vat_on_insurance.unwrap_or(true),
            round_decimals: self.round_decimals,
            solve_equilibrium: self.solve_equilibrium.unwrap_or(true),
            ipa_net_override: self.ipa_net_override,
            bank_base_override: self.bank_base_override,
            solver: self.solver.unwrap_or_default(),
        };

        inputs.validate()?;
        Ok(inputs)
    }
}

fn ensure_non_negative_rate(field: &str, rate: Rate) -> Result<()> {
    if rate.is_negative() {
        return Err(ScheduleError::InvalidInterestRate {
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

fn ensure_fraction(field: &str, rate: Rate) -> Result<()> {
    ensure_non_negative_rate(field, rate)?;
    if rate > Rate::ONE {
        return Err(ScheduleError::InvalidInterestRate {
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

fn ensure_non_negative_amount(field: &str, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(ScheduleError::InvalidAmount {
            field: field.to_string(),
            amount,
        });
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_vat_rate() -> Rate {
    Rate::from_percentage(18)
}

fn default_tenure_months() -> u32 {
    36
}

fn default_annual_rate() -> Rate {
    Rate::from_percentage(20)
}

fn default_funding_rate() -> Rate {
    Rate::from_percentage(12)
}

fn default_vendor_payment_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 15).unwrap_or(NaiveDate::MIN)
}

fn default_first_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or(NaiveDate::MIN)
}
