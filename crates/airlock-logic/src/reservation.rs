//! Time-windowed airlock reservations.
//!
//! An agent planning an EVA reserves a slot ahead of time. A reservation is
//! a millisol stamp; it stays live for [`RESERVATION_PERIOD`] millisols on
//! the 1000-millisol ring and is dropped lazily when found expired.
//!
//! ```
//! use airlock_logic::agents::AgentId;
//! use airlock_logic::clock::Millisol;
//! use airlock_logic::reservation::ReservationRegistry;
//!
//! let mut reg = ReservationRegistry::new();
//! assert!(reg.add_reservation(AgentId(1), Millisol::new(990)));
//! assert!(reg.has_reservation(AgentId(1), Millisol::new(20)));
//! assert!(!reg.has_reservation(AgentId(1), Millisol::new(35)));
//! assert!(reg.is_empty());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::clock::Millisol;
use crate::constants::{MAX_RESERVED, RESERVATION_PERIOD};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationRegistry {
    slots: BTreeMap<AgentId, Millisol>,
}

impl ReservationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `agent` at `now`.
    ///
    /// A new agent is accepted only while the registry has room. An agent
    /// that already holds a reservation always succeeds; its stamp is only
    /// renewed once the old one is at least a full period old.
    pub fn add_reservation(&mut self, agent: AgentId, now: Millisol) -> bool {
        match self.slots.get_mut(&agent) {
            Some(stamp) => {
                if now.age_since(*stamp) >= RESERVATION_PERIOD {
                    *stamp = now;
                }
                true
            }
            None => {
                if self.is_full() {
                    return false;
                }
                self.slots.insert(agent, now);
                true
            }
        }
    }

    /// Whether `agent` holds a live reservation. An expired entry is removed.
    pub fn has_reservation(&mut self, agent: AgentId, now: Millisol) -> bool {
        let Some(stamp) = self.slots.get(&agent).copied() else {
            return false;
        };
        if now.age_since(stamp) <= RESERVATION_PERIOD {
            true
        } else {
            self.slots.remove(&agent);
            false
        }
    }

    pub fn remove_reservation(&mut self, agent: AgentId) -> bool {
        self.slots.remove(&agent).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_RESERVED
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Millisol) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, stamp| now.age_since(*stamp) <= RESERVATION_PERIOD);
        before - self.slots.len()
    }

    /// Reserved agent ids in ascending order.
    pub fn reserved(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.slots.keys().copied()
    }

    /// Stamp of an agent's reservation, live or not.
    pub fn stamp(&self, agent: AgentId) -> Option<Millisol> {
        self.slots.get(&agent).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
