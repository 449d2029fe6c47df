pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod fees;
pub mod interest;
pub mod lease;
pub mod schedule;
pub mod solver;
pub mod types;

// re-export key types
pub use config::{
    FeeScheduleConfig, InsurancePolicy, MonthlyFeeItem, ScheduleInputs, ScheduleInputsBuilder,
    SolverLimits,
};
pub use decimal::{Money, Rate};
pub use errors::{Result, ScheduleError};
pub use events::{EventStore, SolverEvent};
pub use fees::{finance, FinancedAmount, FundingCharges, UpfrontBreakdown, UpfrontCharges};
pub use interest::AccrualEngine;
pub use lease::{calculate, calculate_with};
pub use schedule::{generate_periods, Period, ScheduleBuild, ScheduleBuilder};
pub use solver::{
    Deadline, EquilibriumSolution, EquilibriumSolver, Interrupt, NeverInterrupt, PaymentSolution,
    PaymentSolver,
};
pub use types::{PeriodRow, ScheduleResult, SolveOutcome, TotalsSummary};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
