//! Pure airlock arbitration logic for a Mars settlement simulation.
//!
//! This crate decides who may pass through an airlock, when, and which
//! airlock an agent should use. It holds no engine, database or thread
//! state: agent data, settlement connectivity and time are passed in
//! through the [`agents::AgentRegistry`] and [`layout::SettlementLayout`]
//! traits and [`clock::ClockPulse`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`agents`] | Agent ids, EVA skill, agent registry trait |
//! | [`airlock`] | The airlock aggregate: queues, transfers, per-tick update |
//! | [`chamber`] | Building and vehicle chambers, standing positions per zone |
//! | [`clock`] | Millisol ring arithmetic and tick context |
//! | [`config`] | Serde settlement layouts and validation |
//! | [`constants`] | Reservation window, cycle times, slot counts |
//! | [`error`] | Structural error type |
//! | [`layout`] | Positions, structures, walkable-path queries |
//! | [`operator`] | Operator candidate pools and election |
//! | [`pressure`] | Pressurization state machine and door locks |
//! | [`reservation`] | Time-windowed reservations |
//! | [`selector`] | Availability buckets, tiered search, weighted scoring |
//! | [`settlement`] | All airlocks of a settlement, ticked together |
//! | [`zones`] | Copy-on-write zone occupancy and snapshots |

pub mod agents;
pub mod airlock;
pub mod chamber;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod operator;
pub mod pressure;
pub mod reservation;
pub mod selector;
pub mod settlement;
pub mod zones;

pub use airlock::{Airlock, AirlockId, AirlockMode, Direction};
pub use error::{AirlockError, Result};
pub use settlement::SettlementAirlocks;
