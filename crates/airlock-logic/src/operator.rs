//! Operator election.
//!
//! Exactly one agent at a time runs the airlock controls during a cycle.
//! The role goes to someone as close to the controls as possible, picking
//! the most experienced EVA operator among them.
//!
//! # Candidate pools
//!
//! The first non-empty pool, in order, is used:
//!
//! 1. Chamber occupants (zones 1–3)
//! 2. Agents physically at the outer door inside the chamber (zone 3)
//! 3. Agents physically at the inner door inside the chamber (zone 1)
//! 4. The outer queue (zone 4)
//! 5. The inner queue (zone 0)
//!
//! Within a pool the highest EVA level wins, then the highest experience,
//! then the lowest agent id.

use serde::{Deserialize, Serialize};

use crate::agents::{AgentId, AgentRegistry, EvaSkill};
use crate::chamber::Chamber;
use crate::zones::{AirlockZone, ZoneOccupancy};

/// Who currently holds the operator role, if anyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSlot {
    current: Option<AgentId>,
}

impl OperatorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<AgentId> {
        self.current
    }

    pub fn is_operator(&self, id: AgentId) -> bool {
        self.current == Some(id)
    }

    pub fn has_operator(&self) -> bool {
        self.current.is_some()
    }

    /// Clear the role only if `id` holds it.
    pub fn release(&mut self, id: AgentId) -> bool {
        if self.is_operator(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) -> Option<AgentId> {
        self.current.take()
    }

    pub(crate) fn assign(&mut self, id: AgentId) {
        self.current = Some(id);
    }

    /// Keep exactly one present agent in the role.
    ///
    /// An operator who is still in any zone keeps the role. Otherwise the
    /// role is cleared and a new operator is elected from the best pool.
    /// Returns the operator after the check.
    pub fn check(
        &mut self,
        zones: &ZoneOccupancy,
        chamber: &dyn Chamber,
        registry: &dyn AgentRegistry,
    ) -> Option<AgentId> {
        if let Some(id) = self.current {
            if zones.is_in_any_zone(id) {
                return Some(id);
            }
            log::debug!("{} left the airlock, releasing the operator role", id);
            self.current = None;
        }

        let pool = operator_pool(zones, chamber);
        if let Some(id) = elect(&pool, registry) {
            log::debug!("{} stepped up as airlock operator", id);
            self.current = Some(id);
        }
        self.current
    }
}

/// The highest-priority non-empty candidate pool, in ascending id order.
pub fn operator_pool(zones: &ZoneOccupancy, chamber: &dyn Chamber) -> Vec<AgentId> {
    if !zones.chamber.is_empty() {
        return zones.chamber.iter().collect();
    }

    let at_outer = chamber.zone_occupants(AirlockZone::OuterDoor);
    if !at_outer.is_empty() {
        return at_outer;
    }

    let at_inner = chamber.zone_occupants(AirlockZone::InnerDoor);
    if !at_inner.is_empty() {
        return at_inner;
    }

    if !zones.outer_queue.is_empty() {
        return zones.outer_queue.iter().collect();
    }

    zones.inner_queue.iter().collect()
}

/// Pick the best candidate from `pool`.
///
/// A single candidate is elected outright. Otherwise candidates unknown to
/// the registry are skipped and the first candidate with the greatest
/// [`EvaSkill`] wins.
pub fn elect(pool: &[AgentId], registry: &dyn AgentRegistry) -> Option<AgentId> {
    if let [only] = pool {
        return Some(*only);
    }

    let mut best: Option<(AgentId, EvaSkill)> = None;
    for &id in pool {
        let Some(skill) = registry.eva_skill(id) else {
            continue;
        };
        match best {
            Some((_, top)) if skill <= top => {}
            _ => best = Some((id, skill)),
        }
    }
    best.map(|(id, _)| id)
}
