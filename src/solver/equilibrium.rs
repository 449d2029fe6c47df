use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use crate::config::ScheduleInputs;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{EventStore, SolverEvent};
use crate::schedule::{ScheduleBuild, ScheduleBuilder};
use crate::solver::{same_sign, Interrupt, NeverInterrupt};
use crate::types::SolveOutcome;

/// schedule selected by the outer search and how the search ended
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumSolution {
    pub build: ScheduleBuild,
    pub outcome: SolveOutcome,
}

/// bisection over the fee offset so generated VAT covers VAT on the asset plus the fee
#[derive(Debug)]
pub struct EquilibriumSolver<'a> {
    builder: ScheduleBuilder<'a>,
    events: EventStore,
}

impl<'a> EquilibriumSolver<'a> {
    pub fn new(inputs: &'a ScheduleInputs) -> Result<Self> {
        Ok(Self {
            builder: ScheduleBuilder::new(inputs)?,
            events: EventStore::new(),
        })
    }

    pub fn events(&self) -> &[SolverEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<SolverEvent> {
        self.events.take_events()
    }

    /// solve without an external interrupt
    pub fn solve(&mut self) -> EquilibriumSolution {
        self.solve_with(&NeverInterrupt)
    }

    /// solve, checking `interrupt` before every bracket expansion and bisection step
    pub fn solve_with<I: Interrupt + ?Sized>(&mut self, interrupt: &I) -> EquilibriumSolution {
        let inputs = self.builder.inputs();
        if !inputs.solve_equilibrium {
            self.events.emit(SolverEvent::EquilibriumSkipped);
            debug!("Equilibrium solving disabled, building with zero fee");
            return EquilibriumSolution {
                build: self.evaluate(Money::ZERO),
                outcome: SolveOutcome::Skipped,
            };
        }

        let limits = inputs.solver.clone();
        let vat_on_asset = inputs.vat_on_asset();

        let mut lo = Money::ZERO;
        let mut hi = Money::ONE.max(vat_on_asset * dec!(0.5));
        let mut r_lo = self.evaluate(lo).residual();
        let mut latest = self.evaluate(hi);
        let mut r_hi = latest.residual();
        let mut evaluations = 2;

        let mut expansions = 0;
        while same_sign(r_lo, r_hi) && expansions < limits.fee_bracket_expansions {
            if interrupt.should_stop() {
                return self.interrupted(latest, evaluations);
            }
            hi = hi * limits.fee_growth;
            latest = self.evaluate(hi);
            r_hi = latest.residual();
            evaluations += 1;
            expansions += 1;

            debug!(attempt = expansions, upper_bound = %hi, residual = %r_hi, "Expanded fee bracket");
            self.events.emit(SolverEvent::BracketExpanded {
                attempt: expansions,
                upper_bound: hi,
                residual: r_hi,
            });
        }

        if same_sign(r_lo, r_hi) {
            warn!(
                upper_bound = %hi,
                residual = %r_hi,
                expansions,
                "No sign change in fee bracket, returning schedule at upper bound"
            );
            self.events.emit(SolverEvent::BracketNotFound {
                upper_bound: hi,
                residual: r_hi,
                expansions,
            });
            return EquilibriumSolution {
                build: latest,
                outcome: SolveOutcome::Unbracketed { expansions },
            };
        }

        self.events.emit(SolverEvent::BracketFound {
            lower: lo,
            upper: hi,
            expansions,
        });

        for step in 1..=limits.fee_bisection_steps {
            if interrupt.should_stop() {
                return self.interrupted(latest, evaluations);
            }
            let mid = lo.midpoint(hi);
            latest = self.evaluate(mid);
            let r_mid = latest.residual();
            evaluations += 1;
            debug!(step, fee = %mid, residual = %r_mid, "Fee bisection step");

            if r_mid.abs() <= limits.fee_tolerance {
                info!(fee = %mid, residual = %r_mid, iterations = step, "Equilibrium fee converged");
                self.events.emit(SolverEvent::FeeConverged {
                    fee: mid,
                    residual: r_mid,
                    iterations: step,
                });
                return EquilibriumSolution {
                    build: latest,
                    outcome: SolveOutcome::Converged { iterations: step },
                };
            }

            if same_sign(r_lo, r_mid) {
                lo = mid;
                r_lo = r_mid;
            } else {
                hi = mid;
            }
        }

        let fee = lo.midpoint(hi);
        let build = self.evaluate(fee);
        let residual = build.residual();
        warn!(
            fee = %fee,
            residual = %residual,
            iterations = limits.fee_bisection_steps,
            "Fee bisection exhausted, returning bracket midpoint"
        );
        self.events.emit(SolverEvent::BisectionExhausted {
            fee,
            residual,
            iterations: limits.fee_bisection_steps,
        });

        EquilibriumSolution {
            build,
            outcome: SolveOutcome::BudgetExhausted {
                iterations: limits.fee_bisection_steps,
            },
        }
    }

    fn evaluate(&mut self, fee: Money) -> ScheduleBuild {
        let build = self.builder.build(fee);
        if !build.payment.converged {
            self.events.emit(SolverEvent::PaymentNotConverged {
                fee,
                payment: build.payment.payment,
                end_balance: build.payment.end_balance,
                bracketed: build.payment.bracketed,
            });
        }
        build
    }

    fn interrupted(&mut self, latest: ScheduleBuild, evaluations: u32) -> EquilibriumSolution {
        warn!(fee = %latest.fee, evaluations, "Equilibrium search interrupted");
        self.events.emit(SolverEvent::SolveInterrupted {
            fee: latest.fee,
            evaluations,
        });
        EquilibriumSolution {
            build: latest,
            outcome: SolveOutcome::Interrupted { evaluations },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::solver::Deadline;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use std::cell::Cell;
    use std::sync::atomic::AtomicBool;

    fn inputs() -> ScheduleInputs {
        ScheduleInputs::standard_lease(
            Money::from_major(1_000_000),
            36,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        )
    }

    /// stops after a fixed number of checks
    struct StopAfter {
        remaining: Cell<u32>,
    }

    impl Interrupt for StopAfter {
        fn should_stop(&self) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return true;
            }
            self.remaining.set(left - 1);
            false
        }
    }

    #[test]
    fn test_reference_scenario_converges() {
        let inputs = inputs();
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve();

        assert!(matches!(solution.outcome, SolveOutcome::Converged { .. }));
        assert!(solution.build.residual().abs() <= Money::ONE);
        assert_eq!(solution.build.rows.len(), 36);
        assert_eq!(solution.build.rows[35].closing_balance, Money::ZERO);
        assert_eq!(solution.build.vat_on_asset, Money::from_major(180_000));
        // generated VAT exceeds VAT on the asset by roughly 191k at a zero fee
        assert!(solution.build.fee > Money::from_major(180_000));
        assert!(solution.build.fee < Money::from_major(200_000));

        let events = solver.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SolverEvent::BracketExpanded { attempt: 1, .. })));
        assert!(matches!(events.last(), Some(SolverEvent::FeeConverged { .. })));
    }

    #[test]
    fn test_bracket_grows_until_sign_change() {
        let inputs = inputs();
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        solver.solve();

        let found = solver
            .events()
            .iter()
            .find_map(|e| match e {
                SolverEvent::BracketFound { upper, expansions, .. } => Some((*upper, *expansions)),
                _ => None,
            })
            .unwrap();
        // 90,000 -> 135,000 -> 202,500
        assert_eq!(found, (Money::from_major(202_500), 2));
    }

    #[test]
    fn test_disabled_equilibrium_uses_zero_fee() {
        let mut inputs = inputs();
        inputs.solve_equilibrium = false;
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve();

        assert_eq!(solution.outcome, SolveOutcome::Skipped);
        assert_eq!(solution.build.fee, Money::ZERO);
        assert_eq!(solver.events(), &[SolverEvent::EquilibriumSkipped]);
    }

    #[test]
    fn test_unbracketed_returns_grown_bound() {
        let mut inputs = inputs();
        inputs.solver.fee_bracket_expansions = 1;
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve();

        assert_eq!(solution.outcome, SolveOutcome::Unbracketed { expansions: 1 });
        assert_eq!(solution.build.fee, Money::from_major(135_000));
        assert!(solution.build.residual().is_positive());
        assert!(matches!(
            solver.events().last(),
            Some(SolverEvent::BracketNotFound { expansions: 1, .. })
        ));
    }

    #[test]
    fn test_exhausted_bisection_returns_midpoint() {
        let mut inputs = inputs();
        inputs.solver.fee_bisection_steps = 3;
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve();

        assert_eq!(solution.outcome, SolveOutcome::BudgetExhausted { iterations: 3 });
        // bracket [0, 202,500] halved three times around the root near 191.6k
        assert!(solution.build.fee > Money::from_major(177_000));
        assert!(solution.build.fee < Money::from_major(203_000));
    }

    #[test]
    fn test_expired_deadline_interrupts() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0).unwrap(),
        ));
        let control = time.test_control().unwrap();
        let deadline = Deadline::after(&time, Duration::milliseconds(500));
        control.advance(Duration::seconds(1));

        let inputs = inputs();
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve_with(&deadline);

        assert_eq!(solution.outcome, SolveOutcome::Interrupted { evaluations: 2 });
        assert!(!solution.outcome.is_converged());
        assert_eq!(solution.build.rows.len(), 36);
    }

    #[test]
    fn test_cancellation_flag_interrupts() {
        let cancelled = AtomicBool::new(true);
        let inputs = inputs();
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve_with(&cancelled);

        assert!(matches!(solution.outcome, SolveOutcome::Interrupted { .. }));
        assert!(matches!(
            solver.events().last(),
            Some(SolverEvent::SolveInterrupted { .. })
        ));
    }

    #[test]
    fn test_interrupt_during_bisection() {
        // two expansion checks pass, then one bisection step
        let stop = StopAfter {
            remaining: Cell::new(3),
        };
        let inputs = inputs();
        let mut solver = EquilibriumSolver::new(&inputs).unwrap();
        let solution = solver.solve_with(&stop);

        assert_eq!(solution.outcome, SolveOutcome::Interrupted { evaluations: 5 });
        assert_eq!(solution.build.fee, Money::from_major(101_250));
    }

    #[test]
    fn test_solutions_are_reproducible() {
        let mut inputs = inputs();
        inputs.grace_months = 2;
        inputs.balloon_percent = Rate::from_percentage(10);

        let first = EquilibriumSolver::new(&inputs).unwrap().solve();
        let second = EquilibriumSolver::new(&inputs).unwrap().solve();
        assert_eq!(first, second);
    }
}
