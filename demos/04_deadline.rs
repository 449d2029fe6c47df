/// deadline - bounding the equilibrium search with controlled time or a cancel flag
use std::sync::atomic::AtomicBool;

use chrono::{Duration, TimeZone, Utc};
use ipa_schedule::chrono::NaiveDate;
use ipa_schedule::{
    calculate_with, Deadline, Money, SafeTimeProvider, ScheduleInputs, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let inputs = ScheduleInputs::standard_lease(
        Money::from_major(1_000_000),
        36,
        NaiveDate::from_ymd_opt(2025, 10, 1).ok_or("invalid date")?,
    );

    // controlled time: the deadline has already passed when solving starts
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let deadline = Deadline::after(&time, Duration::milliseconds(250));
    controller.advance(Duration::seconds(1));

    let result = calculate_with(&inputs, &deadline)?;
    println!("expired deadline -> {:?}, fee {}", result.totals.outcome, result.totals.fee_solved);

    // real clock with a generous budget
    let system = SafeTimeProvider::new(TimeSource::System);
    let deadline = Deadline::after(&system, Duration::seconds(30));
    let result = calculate_with(&inputs, &deadline)?;
    println!("30s budget       -> {:?}, fee {}", result.totals.outcome, result.totals.fee_solved);

    // cancellation flag set before the search starts
    let cancelled = AtomicBool::new(true);
    let result = calculate_with(&inputs, &cancelled)?;
    println!("cancelled        -> {:?}", result.totals.outcome);

    for event in &result.events {
        println!("  {:?}", event);
    }

    Ok(())
}
