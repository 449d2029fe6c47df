/// quick start - minimal example to get started
use ipa_schedule::chrono::NaiveDate;
use ipa_schedule::{calculate, Money, ScheduleInputs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // 36-month lease on a 1,000,000 asset, first instalment due 2025-10-01
    let inputs = ScheduleInputs::standard_lease(
        Money::from_major(1_000_000),
        36,
        NaiveDate::from_ymd_opt(2025, 10, 1).ok_or("invalid date")?,
    );

    let result = calculate(&inputs)?;
    let totals = &result.totals;

    println!("financed principal: {}", totals.principal);
    println!("level payment:      {}", totals.level_payment);
    println!("equilibrium fee:    {}", totals.fee_solved);
    println!("vat on asset:       {}", totals.vat_on_asset);
    println!("vat generated:      {}", totals.vat_generated);
    println!("converged:          {}", totals.converged);

    Ok(())
}
