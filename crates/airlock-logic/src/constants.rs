//! Airlock constants for reservations, slot counts and cycle times.
//!
//! Plain values shared by the logic crate and the simtest harness.

/// Millisols in one sol. Reservation timestamps wrap at this value.
pub const MILLISOLS_PER_SOL: u32 = 1000;

/// Maximum number of live reservations an airlock accepts.
pub const MAX_RESERVED: usize = 4;

/// How long a reservation stays valid, in millisols.
pub const RESERVATION_PERIOD: u32 = 40;

pub mod building {
    /// Pressurize/depressurize time of a building airlock (millisols).
    pub const CYCLE_TIME: f64 = 10.0;
    /// Activity spots inside the chamber (zone 2).
    pub const MAX_SLOTS: usize = 4;
    /// Waiting positions at each door queue. One slot is kept free for traffic.
    pub const QUEUE_LIMIT: usize = MAX_SLOTS - 1;
    /// Default number of people a building airlock holds.
    pub const DEFAULT_CAPACITY: u32 = 4;
}

pub mod vehicle {
    /// Pressurize/depressurize time of a vehicle airlock (millisols).
    pub const CYCLE_TIME: f64 = 5.0;
}

pub mod scoring {
    /// Starting value of the occupant and queue running minima, and the
    /// depth the queue-relief bonus counts down from.
    pub const BASELINE_DEPTH: i32 = 4;
    /// Bonus for an airlock whose mode matches the requester's direction.
    pub const MODE_MATCH_BONUS: i32 = 2;
}
