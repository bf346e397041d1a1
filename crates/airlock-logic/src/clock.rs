//! Simulation time as seen by airlocks.
//!
//! Time is measured in millisols. The clock itself is an external service;
//! airlocks only receive a [`ClockPulse`] per tick and a [`Millisol`] stamp
//! for reservation calls.
//!
//! ```
//! use airlock_logic::clock::Millisol;
//!
//! let made = Millisol::new(990);
//! assert_eq!(Millisol::new(20).age_since(made), 30);
//! assert_eq!(Millisol::new(35).age_since(made), 45);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::MILLISOLS_PER_SOL;

/// Integer millisol of the current sol, always in `0..1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Millisol(u32);

impl Millisol {
    /// Wraps `value` onto the sol ring.
    pub fn new(value: u32) -> Self {
        Self(value % MILLISOLS_PER_SOL)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Millisols elapsed since `earlier`, assuming less than a sol has passed.
    ///
    /// If `earlier` is numerically greater than `self` the clock wrapped past
    /// the end of the sol in between.
    pub fn age_since(self, earlier: Millisol) -> u32 {
        if earlier.0 > self.0 {
            self.0 + MILLISOLS_PER_SOL - earlier.0
        } else {
            self.0 - earlier.0
        }
    }

    /// The millisol `delta` after this one.
    pub fn plus(self, delta: u32) -> Self {
        Self::new(self.0 + delta % MILLISOLS_PER_SOL)
    }
}

impl std::fmt::Display for Millisol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// One simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockPulse {
    /// Millisols elapsed since the previous pulse.
    pub elapsed: f64,
    /// Integer millisol at the end of this pulse.
    pub millisol: Millisol,
    /// Whether this pulse crossed into a new integer millisol.
    pub new_millisol: bool,
}

impl ClockPulse {
    pub fn new(elapsed: f64, millisol: Millisol, new_millisol: bool) -> Self {
        Self {
            elapsed,
            millisol,
            new_millisol,
        }
    }

    /// Build the pulse that follows a clock reading of `previous` (fractional
    /// millisols into the sol) after `elapsed` millisols.
    pub fn after(previous: f64, elapsed: f64) -> Self {
        let sol = MILLISOLS_PER_SOL as f64;
        let now = (previous + elapsed).rem_euclid(sol);
        let new_millisol = previous.floor() as u32 != now.floor() as u32 || elapsed >= 1.0;
        Self {
            elapsed,
            millisol: Millisol::new(now.floor() as u32),
            new_millisol,
        }
    }
}
