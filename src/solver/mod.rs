pub mod equilibrium;
pub mod payment;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;

pub use equilibrium::{EquilibriumSolver, EquilibriumSolution};
pub use payment::{PaymentSolution, PaymentSolver};

/// checked between outer bisection steps; returning true stops the search
pub trait Interrupt {
    fn should_stop(&self) -> bool;
}

/// never stops the search
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn should_stop(&self) -> bool {
        false
    }
}

/// cancellation flag shared with another thread
impl Interrupt for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// stops once the provider's clock reaches `expires_at`
pub struct Deadline<'a> {
    time: &'a SafeTimeProvider,
    expires_at: DateTime<Utc>,
}

impl<'a> Deadline<'a> {
    pub fn new(time: &'a SafeTimeProvider, expires_at: DateTime<Utc>) -> Self {
        Self { time, expires_at }
    }

    /// deadline `budget` after the provider's current time
    pub fn after(time: &'a SafeTimeProvider, budget: Duration) -> Self {
        let expires_at = time.now() + budget;
        Self::new(time, expires_at)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for Deadline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Interrupt for Deadline<'_> {
    fn should_stop(&self) -> bool {
        self.time.now() >= self.expires_at
    }
}

/// true when both values are strictly positive or both strictly negative
pub(crate) fn same_sign(a: Money, b: Money) -> bool {
    (a.is_positive() && b.is_positive()) || (a.is_negative() && b.is_negative())
}
