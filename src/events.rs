use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// diagnostics emitted while solving for the equilibrium fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverEvent {
    // bracketing events
    BracketExpanded {
        attempt: u32,
        upper_bound: Money,
        residual: Money,
    },
    BracketFound {
        lower: Money,
        upper: Money,
        expansions: u32,
    },
    BracketNotFound {
        upper_bound: Money,
        residual: Money,
        expansions: u32,
    },

    // bisection events
    FeeConverged {
        fee: Money,
        residual: Money,
        iterations: u32,
    },
    BisectionExhausted {
        fee: Money,
        residual: Money,
        iterations: u32,
    },
    SolveInterrupted {
        fee: Money,
        evaluations: u32,
    },
    EquilibriumSkipped,

    // inner solver
    PaymentNotConverged {
        fee: Money,
        payment: Money,
        end_balance: Money,
        bracketed: bool,
    },
}

/// event store for collecting events during a calculation
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<SolverEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: SolverEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SolverEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SolverEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        store.emit(SolverEvent::EquilibriumSkipped);
        store.emit(SolverEvent::BracketFound {
            lower: Money::ZERO,
            upper: Money::from_major(90_000),
            expansions: 0,
        });

        assert_eq!(store.events().len(), 2);
        let taken = store.take_events();
        assert_eq!(taken[0], SolverEvent::EquilibriumSkipped);
        assert!(store.events().is_empty());
    }
}
