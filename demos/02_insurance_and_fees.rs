/// insurance and fees - capitalized premiums, flat monthly charges and fee toggles
use ipa_schedule::chrono::NaiveDate;
use ipa_schedule::{
    calculate, FeeScheduleConfig, InsurancePolicy, Money, MonthlyFeeItem, Rate, ScheduleInputs,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let insurance = InsurancePolicy {
        year1_premium: Money::from_major(42_000),
        year2_premium: Money::from_major(36_000),
        year3_premium: Money::from_major(30_000),
        ..InsurancePolicy::default()
    };

    let fees = FeeScheduleConfig {
        apply_tee: false,
        vat_on_upfront_taxes: true,
        ..FeeScheduleConfig::default()
    };

    let inputs = ScheduleInputs::builder()
        .asset_net(Money::from_major(1_500_000))
        .tenure_months(36)
        .annual_rate(Rate::from_percentage(22))
        .funding_rate(Rate::from_percentage(12))
        .first_due_date(NaiveDate::from_ymd_opt(2025, 10, 1).ok_or("invalid date")?)
        .insurance(insurance)
        .fees(fees)
        .monthly_fee(MonthlyFeeItem::new("gps tracking", Money::from_major(2_500), true))
        .monthly_fee(MonthlyFeeItem::new("roadside assistance", Money::from_major(800), false))
        .round_decimals(2)
        .build()?;

    let result = calculate(&inputs)?;
    let totals = &result.totals;

    println!("=== upfront breakdown ===");
    for (name, amount) in totals.upfront_breakdown.entries() {
        println!("{:<22} {:>16}", name, amount.round_dp(2));
    }
    println!("{:<22} {:>16}", "total (A)", totals.upfront_total);
    println!("{:<22} {:>16}", "funding (B)", totals.funding_charge);

    println!("\n=== insurance capitalization ===");
    for row in result.rows.iter().filter(|r| r.insurance_capitalized.is_positive()) {
        println!(
            "period {:>2}: +{} (vat {})",
            row.period, row.insurance_capitalized, row.vat_on_insurance
        );
    }

    println!("\nmonthly fees over the term: {}", totals.total_monthly_fees);
    println!("equilibrium fee: {} ({:?})", totals.fee_solved, totals.outcome);

    Ok(())
}
