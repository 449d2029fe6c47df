use tracing::{info, instrument};

use crate::config::ScheduleInputs;
use crate::errors::Result;
use crate::solver::{EquilibriumSolver, Interrupt, NeverInterrupt};
use crate::types::ScheduleResult;

/// build the lease schedule, solving for the equilibrium fee when enabled
pub fn calculate(inputs: &ScheduleInputs) -> Result<ScheduleResult> {
    calculate_with(inputs, &NeverInterrupt)
}

/// same as [`calculate`], stopping the fee search early when `interrupt` fires
///
/// an interrupted search still returns a complete schedule for the last
/// evaluated fee, marked as not converged
#[instrument(
    skip_all,
    fields(
        asset_net = %inputs.asset_net,
        tenure_months = inputs.tenure_months,
        grace_months = inputs.grace_months
    )
)]
pub fn calculate_with<I: Interrupt + ?Sized>(
    inputs: &ScheduleInputs,
    interrupt: &I,
) -> Result<ScheduleResult> {
    let mut solver = EquilibriumSolver::new(inputs)?;
    let solution = solver.solve_with(interrupt);
    let totals = solution.build.summarize(inputs, solution.outcome);

    info!(
        fee_solved = %totals.fee_solved,
        level_payment = %totals.level_payment,
        vat_generated = %totals.vat_generated,
        converged = totals.converged,
        "Lease schedule calculated"
    );

    Ok(ScheduleResult {
        rows: solution.build.rows,
        totals,
        events: solver.take_events(),
    })
}
