//! Pressurization state machine and door locks.
//!
//! # States
//!
//! | State | Inner door | Outer door | Next on `advance` |
//! |-------|-----------|-----------|-------------------|
//! | `Pressurized` | unlocked | locked | `Depressurizing` |
//! | `Depressurizing` | as before | as before | `Depressurized` when the cycle completes |
//! | `Depressurized` | locked | unlocked | `Pressurizing` |
//! | `Pressurizing` | as before | as before | `Pressurized` when the cycle completes |
//! | `Off` | locked | locked | stays `Off` |
//!
//! Door locks only change on cycle completion and on the `Off` lifecycle
//! hooks, so while a cycle runs the doors keep the locks of the steady
//! state it started from.
//!
//! ```
//! use airlock_logic::pressure::{AirlockState, CycleTimer, PressureCycle};
//!
//! let mut cycle = PressureCycle::new();
//! let mut timer = CycleTimer::new(10.0);
//! timer.set_activated(true);
//! timer.set_transitioning(true);
//!
//! cycle.advance(&mut timer, 4.0);
//! assert_eq!(cycle.state(), AirlockState::Depressurizing);
//! cycle.advance(&mut timer, 6.0);
//! assert_eq!(cycle.state(), AirlockState::Depressurized);
//! assert!(cycle.inner_door_locked() && !cycle.outer_door_locked());
//! assert!(!timer.is_activated());
//! ```

use serde::{Deserialize, Serialize};

/// Pressurization phase of an airlock chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirlockState {
    /// Powered down; both doors locked.
    Off,
    Pressurized,
    Depressurizing,
    Depressurized,
    Pressurizing,
}

impl AirlockState {
    pub fn name(self) -> &'static str {
        match self {
            AirlockState::Off => "Off",
            AirlockState::Pressurized => "Pressurized",
            AirlockState::Depressurizing => "Depressurizing",
            AirlockState::Depressurized => "Depressurized",
            AirlockState::Pressurizing => "Pressurizing",
        }
    }

    /// Pressurized, or on its way there.
    pub fn leans_pressurized(self) -> bool {
        matches!(self, AirlockState::Pressurized | AirlockState::Pressurizing)
    }

    /// Depressurized, or on its way there.
    pub fn leans_depressurized(self) -> bool {
        matches!(
            self,
            AirlockState::Depressurized | AirlockState::Depressurizing
        )
    }
}

impl std::fmt::Display for AirlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Countdown for one pressure cycle, plus the activation flags.
///
/// `activated` means the airlock is in use and may elect an operator or
/// change state; `transitioning` means the air is actually being cycled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleTimer {
    cycle_time: f64,
    remaining: f64,
    activated: bool,
    transitioning: bool,
}

impl CycleTimer {
    pub fn new(cycle_time: f64) -> Self {
        Self {
            cycle_time,
            remaining: cycle_time,
            activated: false,
            transitioning: false,
        }
    }

    /// Activating rewinds the countdown to a full cycle; deactivating also
    /// stops any transition.
    pub fn set_activated(&mut self, value: bool) {
        if value {
            self.remaining = self.cycle_time;
        } else {
            self.transitioning = false;
        }
        self.activated = value;
    }

    pub fn set_transitioning(&mut self, value: bool) {
        self.transitioning = value;
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn cycle_time(&self) -> f64 {
        self.cycle_time
    }

    /// Consume up to `time` millisols. Returns `true` when the cycle
    /// completes, in which case the countdown is already rewound.
    pub fn consume(&mut self, time: f64) -> bool {
        let consumed = self.remaining.min(time.max(0.0));
        self.remaining -= consumed;
        if self.remaining <= 0.0 {
            self.remaining = self.cycle_time;
            true
        } else {
            false
        }
    }

    fn clear_flags(&mut self) {
        self.activated = false;
        self.transitioning = false;
    }
}

/// State plus door locks, kept consistent with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureCycle {
    state: AirlockState,
    inner_door_locked: bool,
    outer_door_locked: bool,
}

impl Default for PressureCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureCycle {
    /// A new chamber starts pressurized: inner door open, outer door locked.
    pub fn new() -> Self {
        Self {
            state: AirlockState::Pressurized,
            inner_door_locked: false,
            outer_door_locked: true,
        }
    }

    pub fn state(&self) -> AirlockState {
        self.state
    }

    pub fn inner_door_locked(&self) -> bool {
        self.inner_door_locked
    }

    pub fn outer_door_locked(&self) -> bool {
        self.outer_door_locked
    }

    /// Feed `time` millisols into the cycle.
    ///
    /// A steady state first moves to its transient counterpart, then the
    /// timer consumes the time. Returns the new steady state if the cycle
    /// completed during this call.
    pub fn advance(&mut self, timer: &mut CycleTimer, time: f64) -> Option<AirlockState> {
        match self.state {
            AirlockState::Off => return None,
            AirlockState::Pressurized => self.state = AirlockState::Depressurizing,
            AirlockState::Depressurized => self.state = AirlockState::Pressurizing,
            AirlockState::Depressurizing | AirlockState::Pressurizing => {}
        }

        if timer.consume(time) {
            self.complete(timer);
            Some(self.state)
        } else {
            None
        }
    }

    /// Jump to the steady state the current transition leads to.
    pub fn complete(&mut self, timer: &mut CycleTimer) {
        match self.state {
            AirlockState::Pressurizing => {
                self.state = AirlockState::Pressurized;
                self.inner_door_locked = false;
                self.outer_door_locked = true;
            }
            AirlockState::Depressurizing => {
                self.state = AirlockState::Depressurized;
                self.inner_door_locked = true;
                self.outer_door_locked = false;
            }
            _ => {}
        }
        timer.clear_flags();
    }

    /// Power the chamber down from any state. Both doors lock.
    pub fn shut_down(&mut self, timer: &mut CycleTimer) {
        self.state = AirlockState::Off;
        self.inner_door_locked = true;
        self.outer_door_locked = true;
        timer.clear_flags();
    }

    /// Bring an `Off` chamber back as pressurized. No-op in any other state.
    pub fn restore(&mut self) -> bool {
        if self.state != AirlockState::Off {
            return false;
        }
        *self = Self::new();
        true
    }
}
