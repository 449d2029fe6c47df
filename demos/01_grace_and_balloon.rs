/// grace and balloon - capitalized grace months and a residual value at term end
use ipa_schedule::chrono::NaiveDate;
use ipa_schedule::{calculate, Money, Rate, ScheduleInputs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,ipa_schedule=debug")
        .init();

    let inputs = ScheduleInputs::builder()
        .asset_net(Money::from_major(2_400_000))
        .tenure_months(48)
        .annual_rate(Rate::from_percentage(18))
        .funding_rate(Rate::from_percentage(12))
        .grace_months(3)
        .balloon_percent(Rate::from_percentage(20))
        .vendor_payment_date(NaiveDate::from_ymd_opt(2025, 11, 20).ok_or("invalid date")?)
        .first_due_date(NaiveDate::from_ymd_opt(2026, 1, 31).ok_or("invalid date")?)
        .build()?;

    let result = calculate(&inputs)?;

    println!("{:>4} {:>12} {:>14} {:>10} {:>12} {:>12} {:>14}",
        "per", "due", "opening", "interest", "amort", "annuity", "closing");
    for row in &result.rows {
        println!(
            "{:>4} {:>12} {:>14} {:>10} {:>12} {:>12} {:>14}{}",
            row.period,
            row.due_date,
            row.opening_balance.round_dp(0),
            row.interest,
            row.amortization.round_dp(0),
            row.annuity.round_dp(0),
            row.closing_balance.round_dp(0),
            if row.grace { "  (grace)" } else { "" }
        );
    }

    println!("\nballoon target: {}", result.totals.balloon_target);
    println!("funding window: {} days ({} chargeable)",
        result.totals.funding.window_days, result.totals.funding.chargeable_days);
    println!("outcome: {:?}", result.totals.outcome);

    Ok(())
}
