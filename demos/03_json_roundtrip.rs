/// json roundtrip - inputs from json, schedule rendered back to json
use ipa_schedule::{calculate, ScheduleInputs};

const REQUEST: &str = r#"{
    "asset_net": "850000",
    "vat_rate": "0.18",
    "tenure_months": 24,
    "annual_rate": "0.19",
    "funding_rate": "0.12",
    "vendor_payment_date": "2025-08-01",
    "first_due_date": "2025-10-15",
    "monthly_fees": [
        { "name": "tracking", "amount_monthly": "1500" }
    ],
    "fees": { "telematics_monthly": "8000" },
    "insurance": { "year1_premium": "25000", "year2_premium": "21000" }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .init();

    let inputs = ScheduleInputs::from_json(REQUEST)?;
    println!("=== normalized inputs ===\n{}", inputs.to_json_pretty()?);

    let result = calculate(&inputs)?;
    println!("\n=== totals ===\n{}", serde_json::to_string_pretty(&result.totals)?);

    let json = result.to_json_pretty()?;
    println!("\nfull result: {} bytes, {} rows, {} solver events",
        json.len(), result.rows.len(), result.events.len());

    Ok(())
}
