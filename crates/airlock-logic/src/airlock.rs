//! The airlock aggregate: a two-door chamber with queues, reservations and
//! an operator, driven by simulation ticks.
//!
//! Agents use a cooperative polling protocol. They join a door queue, then
//! call [`Airlock::try_enter`] every tick until the door on their side is
//! unlocked and there is room, and later [`Airlock::try_exit`]. Nothing
//! blocks; a refused call is simply retried on a later tick.
//!
//! ```
//! use airlock_logic::agents::AgentId;
//! use airlock_logic::airlock::{Airlock, AirlockId, Direction};
//! use airlock_logic::layout::LocalPosition;
//!
//! let mut lock = Airlock::building(
//!     AirlockId(1),
//!     "EVA Airlock 1",
//!     2,
//!     LocalPosition::new(0.0, 0.0),
//!     LocalPosition::new(3.0, 0.0),
//! )
//! .unwrap();
//!
//! // Pressurized: the inner door is open for egress.
//! assert!(lock.join_inner_queue(AgentId(7)));
//! assert!(lock.try_enter(AgentId(7), Direction::Egress));
//! assert!(lock.in_airlock(AgentId(7)));
//! ```

use serde::{Deserialize, Serialize};

use crate::agents::{AgentId, AgentRegistry};
use crate::chamber::{BuildingChamber, Chamber, ChamberKind, VehicleChamber};
use crate::clock::{ClockPulse, Millisol};
use crate::config::AirlockSpec;
use crate::error::{AirlockError, Result};
use crate::layout::LocalPosition;
use crate::operator::OperatorSlot;
use crate::pressure::{AirlockState, CycleTimer, PressureCycle};
use crate::reservation::ReservationRegistry;
use crate::zones::{AirlockZone, OccupancySnapshot, ZoneOccupancy};

/// Identity of an airlock within a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AirlockId(pub u32);

impl std::fmt::Display for AirlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "airlock#{}", self.0)
    }
}

/// Directional bias of an airlock. A scoring signal, not a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirlockMode {
    Ingress,
    Egress,
    NotInUse,
}

/// Which way an agent is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Outside to inside, through the outer door first.
    Ingress,
    /// Inside to outside, through the inner door first.
    Egress,
}

impl Direction {
    pub fn mode(self) -> AirlockMode {
        match self {
            Direction::Ingress => AirlockMode::Ingress,
            Direction::Egress => AirlockMode::Egress,
        }
    }

    /// The chamber zone just behind the door this direction enters through.
    fn entry_zone(self) -> AirlockZone {
        match self {
            Direction::Ingress => AirlockZone::OuterDoor,
            Direction::Egress => AirlockZone::InnerDoor,
        }
    }

    /// The queue zone this direction waits in.
    fn queue_zone(self) -> AirlockZone {
        match self {
            Direction::Ingress => AirlockZone::OuterQueue,
            Direction::Egress => AirlockZone::InnerQueue,
        }
    }

    fn door_name(self) -> &'static str {
        match self {
            Direction::Ingress => "outer",
            Direction::Egress => "inner",
        }
    }
}

#[derive(Debug)]
pub struct Airlock {
    id: AirlockId,
    name: String,
    capacity: u32,
    mode: AirlockMode,
    cycle: PressureCycle,
    timer: CycleTimer,
    zones: ZoneOccupancy,
    reservations: ReservationRegistry,
    operator: OperatorSlot,
    eva_suit_checks: u32,
    chamber: Box<dyn Chamber>,
}

impl Airlock {
    /// Create a pressurized, idle airlock.
    ///
    /// Fails if `capacity` is zero.
    pub fn new(
        id: AirlockId,
        name: impl Into<String>,
        capacity: u32,
        chamber: Box<dyn Chamber>,
    ) -> Result<Self> {
        if capacity < 1 {
            return Err(AirlockError::InvalidCapacity { capacity });
        }
        let timer = CycleTimer::new(chamber.cycle_time());
        Ok(Self {
            id,
            name: name.into(),
            capacity,
            mode: AirlockMode::Egress,
            cycle: PressureCycle::new(),
            timer,
            zones: ZoneOccupancy::new(),
            reservations: ReservationRegistry::new(),
            operator: OperatorSlot::new(),
            eva_suit_checks: 0,
            chamber,
        })
    }

    pub fn building(
        id: AirlockId,
        name: impl Into<String>,
        capacity: u32,
        interior_door: LocalPosition,
        exterior_door: LocalPosition,
    ) -> Result<Self> {
        let chamber = BuildingChamber::new(interior_door, exterior_door);
        Self::new(id, name, capacity, Box::new(chamber))
    }

    pub fn vehicle(
        id: AirlockId,
        name: impl Into<String>,
        capacity: u32,
        interior_door: LocalPosition,
        exterior_door: LocalPosition,
    ) -> Result<Self> {
        let chamber = VehicleChamber::new(capacity, interior_door, exterior_door);
        Self::new(id, name, capacity, Box::new(chamber))
    }

    pub fn from_spec(spec: &AirlockSpec) -> Result<Self> {
        let id = AirlockId(spec.id);
        match spec.kind {
            ChamberKind::Building => Self::building(
                id,
                spec.name.clone(),
                spec.capacity,
                spec.interior_door,
                spec.exterior_door,
            ),
            ChamberKind::Vehicle => Self::vehicle(
                id,
                spec.name.clone(),
                spec.capacity,
                spec.interior_door,
                spec.exterior_door,
            ),
        }
    }

    pub fn id(&self) -> AirlockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn kind(&self) -> ChamberKind {
        self.chamber.kind()
    }

    pub fn chamber(&self) -> &dyn Chamber {
        self.chamber.as_ref()
    }

    pub fn mode(&self) -> AirlockMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AirlockMode) {
        self.mode = mode;
    }

    // ── Pressurization ──────────────────────────────────────────────────

    pub fn state(&self) -> AirlockState {
        self.cycle.state()
    }

    pub fn is_pressurized(&self) -> bool {
        self.state() == AirlockState::Pressurized
    }

    pub fn is_depressurizing(&self) -> bool {
        self.state() == AirlockState::Depressurizing
    }

    pub fn is_depressurized(&self) -> bool {
        self.state() == AirlockState::Depressurized
    }

    pub fn is_pressurizing(&self) -> bool {
        self.state() == AirlockState::Pressurizing
    }

    pub fn inner_door_locked(&self) -> bool {
        self.cycle.inner_door_locked()
    }

    pub fn outer_door_locked(&self) -> bool {
        self.cycle.outer_door_locked()
    }

    pub fn set_activated(&mut self, value: bool) {
        self.timer.set_activated(value);
    }

    pub fn set_transitioning(&mut self, value: bool) {
        self.timer.set_transitioning(value);
    }

    pub fn is_activated(&self) -> bool {
        self.timer.is_activated()
    }

    pub fn is_transitioning(&self) -> bool {
        self.timer.is_transitioning()
    }

    pub fn remaining_cycle_time(&self) -> f64 {
        self.timer.remaining()
    }

    /// Ask the airlock to run a cycle for travel in `direction`: activates
    /// it, starts the air exchange and biases its mode.
    pub fn request_cycle(&mut self, direction: Direction) {
        self.timer.set_activated(true);
        self.timer.set_transitioning(true);
        self.mode = direction.mode();
    }

    /// Feed `elapsed` millisols into the pressure cycle.
    ///
    /// Returns the steady state reached if a cycle completed.
    pub fn advance(&mut self, elapsed: f64) -> Option<AirlockState> {
        let reached = self.cycle.advance(&mut self.timer, elapsed);
        if let Some(state) = reached {
            log::info!("{} is now {}", self.name, state);
        }
        reached
    }

    /// Per-tick update, called by the owning structure.
    ///
    /// An activated airlock cycles air while transitioning and, once per new
    /// millisol, sweeps stale occupants and re-checks its operator. An empty
    /// chamber drops back to `NotInUse`.
    pub fn time_passing(&mut self, pulse: &ClockPulse, registry: &dyn AgentRegistry) {
        if self.timer.is_activated() {
            if self.timer.is_transitioning() {
                self.advance(pulse.elapsed);
            }
            if pulse.new_millisol {
                self.check_occupants();
                self.check_operator(registry);
            }
        }

        if self.zones.chamber.is_empty() {
            self.mode = AirlockMode::NotInUse;
        }
    }

    /// Power the airlock down. Both doors lock and the cycle stops.
    pub fn shut_down(&mut self) {
        self.cycle.shut_down(&mut self.timer);
        log::info!("{} shut down", self.name);
    }

    /// Bring a shut-down airlock back as pressurized.
    pub fn restore(&mut self) -> bool {
        let restored = self.cycle.restore();
        if restored {
            log::info!("{} restored to {}", self.name, self.state());
        }
        restored
    }

    // ── Queues and transfers ────────────────────────────────────────────

    /// Wait at the inner door (zone 0). True if queued or already queued.
    pub fn join_inner_queue(&mut self, agent: AgentId) -> bool {
        self.join_queue(agent, Direction::Egress)
    }

    /// Wait at the outer door (zone 4). True if queued or already queued.
    pub fn join_outer_queue(&mut self, agent: AgentId) -> bool {
        self.join_queue(agent, Direction::Ingress)
    }

    fn join_queue(&mut self, agent: AgentId, direction: Direction) -> bool {
        let limit = self.chamber.queue_limit();
        let queue = match direction {
            Direction::Egress => &mut self.zones.inner_queue,
            Direction::Ingress => &mut self.zones.outer_queue,
        };
        if queue.contains(agent) {
            return true;
        }
        if queue.len() >= limit {
            log::warn!(
                "{} could not queue at the {} door of {}: {} waiting",
                agent,
                direction.door_name(),
                self.name,
                queue.len()
            );
            return false;
        }
        queue.insert(agent)
    }

    /// Step out of a door queue without entering.
    pub fn leave_queue(&mut self, agent: AgentId) -> bool {
        let a = self.zones.inner_queue.remove(agent);
        let b = self.zones.outer_queue.remove(agent);
        self.chamber.vacate(AirlockZone::InnerQueue, agent);
        self.chamber.vacate(AirlockZone::OuterQueue, agent);
        a || b
    }

    /// Move a queued agent into the chamber through the door on their side.
    ///
    /// Egress enters through the inner door from zone 0, ingress through the
    /// outer door from zone 4. Refused if the door is locked, the agent is
    /// not queued on that side, the agent is already inside, the chamber is
    /// full, or no standing position is free.
    pub fn try_enter(&mut self, agent: AgentId, direction: Direction) -> bool {
        if self.zones.chamber.contains(agent) || self.is_full() {
            return false;
        }

        let door_locked = match direction {
            Direction::Egress => self.cycle.inner_door_locked(),
            Direction::Ingress => self.cycle.outer_door_locked(),
        };
        if door_locked {
            return false;
        }

        let queued = match direction {
            Direction::Egress => self.zones.inner_queue.contains(agent),
            Direction::Ingress => self.zones.outer_queue.contains(agent),
        };
        if !queued {
            return false;
        }

        let spot = self
            .chamber
            .claim(direction.entry_zone(), agent)
            .or_else(|| self.chamber.claim(AirlockZone::Chamber, agent));
        if spot.is_none() {
            return false;
        }

        let queue = match direction {
            Direction::Egress => &mut self.zones.inner_queue,
            Direction::Ingress => &mut self.zones.outer_queue,
        };
        queue.remove(agent);
        let still_queued = queue.contains(agent);
        if still_queued {
            log::error!(
                "{} still in the {} door queue of {} after transfer",
                agent,
                direction.door_name(),
                self.name
            );
            debug_assert!(!still_queued, "{} still queued after transfer", agent);
            self.chamber.vacate_all(agent);
            return false;
        }

        self.chamber.vacate(direction.queue_zone(), agent);
        self.zones.chamber.insert(agent);
        log::debug!(
            "{} transferred in through the {} door of {}",
            agent,
            direction.door_name(),
            self.name
        );
        true
    }

    /// Move an agent out of the chamber. Always allowed for an occupant;
    /// the operator role is released if they held it.
    pub fn try_exit(&mut self, agent: AgentId, direction: Direction) -> bool {
        if !self.zones.chamber.contains(agent) {
            return false;
        }
        self.operator.release(agent);
        for zone in AirlockZone::CHAMBER {
            self.chamber.vacate(zone, agent);
        }
        let removed = self.zones.chamber.remove(agent);
        log::debug!(
            "{} left {} heading {:?}",
            agent,
            self.name,
            direction
        );
        removed
    }

    // ── Occupancy queries ───────────────────────────────────────────────

    /// Whether the chamber holds `capacity` occupants.
    pub fn is_full(&self) -> bool {
        self.zones.chamber.len() >= self.capacity as usize
    }

    /// Whether the chamber physically has fewer people than its capacity.
    pub fn has_space(&self) -> bool {
        self.chamber.num_inside() < self.capacity as usize
    }

    pub fn remaining_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.zones.chamber.len() as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.zones.chamber.is_empty()
    }

    pub fn num_occupants(&self) -> usize {
        self.zones.chamber.len()
    }

    /// Head count physically in zones 1–3, as the chamber sees it.
    pub fn num_inside(&self) -> usize {
        self.chamber.num_inside()
    }

    pub fn num_awaiting_inner_door(&self) -> usize {
        self.zones.inner_queue.len()
    }

    pub fn num_awaiting_outer_door(&self) -> usize {
        self.zones.outer_queue.len()
    }

    pub fn in_airlock(&self, agent: AgentId) -> bool {
        self.zones.chamber.contains(agent)
    }

    pub fn is_in_any_zone(&self, agent: AgentId) -> bool {
        self.zones.is_in_any_zone(agent)
    }

    pub fn zones(&self) -> &ZoneOccupancy {
        &self.zones
    }

    /// Frozen view for observers on other threads.
    pub fn occupancy_snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot {
            state: self.state(),
            operator: self.operator.current(),
            inner_queue: self.zones.inner_queue.snapshot(),
            chamber: self.zones.chamber.snapshot(),
            outer_queue: self.zones.outer_queue.snapshot(),
        }
    }

    // ── Physical positions ──────────────────────────────────────────────

    /// Take a standing position in `zone`.
    pub fn claim(&mut self, zone: AirlockZone, agent: AgentId) -> Option<LocalPosition> {
        self.chamber.claim(zone, agent)
    }

    pub fn vacate(&mut self, zone: AirlockZone, agent: AgentId) -> bool {
        self.chamber.vacate(zone, agent)
    }

    pub fn is_in_zone(&self, agent: AgentId, zone: AirlockZone) -> bool {
        self.chamber.is_in_zone(agent, zone)
    }

    pub fn zone_occupants(&self, zone: AirlockZone) -> Vec<AgentId> {
        self.chamber.zone_occupants(zone)
    }

    pub fn available_position(&self, zone: AirlockZone) -> Option<LocalPosition> {
        self.chamber.available_position(zone)
    }

    /// Walk a chamber occupant to another chamber zone (1–3).
    pub fn move_within(&mut self, agent: AgentId, to: AirlockZone) -> Option<LocalPosition> {
        if !to.is_chamber() || !self.zones.chamber.contains(agent) {
            return None;
        }
        if self.chamber.is_in_zone(agent, to) {
            return self.chamber.slots(to).position_of(agent);
        }
        let pos = self.chamber.claim(to, agent)?;
        for zone in AirlockZone::CHAMBER {
            if zone != to {
                self.chamber.vacate(zone, agent);
            }
        }
        Some(pos)
    }

    /// Drop chamber occupants the chamber no longer sees in zones 1–3.
    pub fn check_occupants(&mut self) -> Vec<AgentId> {
        let chamber = self.chamber.as_ref();
        let dropped = self.zones.chamber.retain(|id| chamber.is_inside(id));
        for id in &dropped {
            log::debug!("{} is no longer inside {}, dropping", id, self.name);
        }
        dropped
    }

    /// Purge every trace of an agent (death or scripted removal).
    ///
    /// Building airlocks also drop the agent's reservation.
    pub fn remove_agent(&mut self, agent: AgentId) -> bool {
        let mut changed = self.chamber.vacate_all(agent);
        changed |= self.operator.release(agent);
        changed |= self.zones.purge(agent);
        if self.kind() == ChamberKind::Building {
            changed |= self.reservations.remove_reservation(agent);
        }
        changed
    }

    /// Clear everything before the owning structure goes away.
    pub fn decommission(&mut self) {
        self.zones.clear();
        self.chamber.clear();
        self.reservations.clear();
        self.operator.clear();
        self.timer.set_activated(false);
        self.timer.set_transitioning(false);
        self.mode = AirlockMode::NotInUse;
    }

    // ── Reservations ────────────────────────────────────────────────────

    pub fn add_reservation(&mut self, agent: AgentId, now: Millisol) -> bool {
        self.reservations.add_reservation(agent, now)
    }

    pub fn has_reservation(&mut self, agent: AgentId, now: Millisol) -> bool {
        self.reservations.has_reservation(agent, now)
    }

    pub fn remove_reservation(&mut self, agent: AgentId) -> bool {
        self.reservations.remove_reservation(agent)
    }

    pub fn is_reservation_full(&self) -> bool {
        self.reservations.is_full()
    }

    pub fn reservations(&self) -> &ReservationRegistry {
        &self.reservations
    }

    // ── Operator ────────────────────────────────────────────────────────

    pub fn operator(&self) -> Option<AgentId> {
        self.operator.current()
    }

    pub fn is_operator(&self, agent: AgentId) -> bool {
        self.operator.is_operator(agent)
    }

    pub fn has_operator(&self) -> bool {
        self.operator.has_operator()
    }

    pub fn release_operator(&mut self, agent: AgentId) -> bool {
        self.operator.release(agent)
    }

    /// Hand the role to a specific agent. Only someone in a zone of this
    /// airlock can hold it.
    pub fn elect_operator(&mut self, agent: AgentId) -> bool {
        if !self.zones.is_in_any_zone(agent) {
            log::warn!("{} is not at {}, cannot operate it", agent, self.name);
            return false;
        }
        self.operator.assign(agent);
        true
    }

    pub fn check_operator(&mut self, registry: &dyn AgentRegistry) -> Option<AgentId> {
        self.operator
            .check(&self.zones, self.chamber.as_ref(), registry)
    }

    // ── EVA suit bookkeeping ────────────────────────────────────────────

    /// Count one failed search for an available EVA suit.
    pub fn add_check_eva_suit(&mut self) {
        self.eva_suit_checks += 1;
    }

    pub fn reset_check_eva_suit(&mut self) {
        self.eva_suit_checks = 0;
    }

    pub fn eva_suit_check_count(&self) -> u32 {
        self.eva_suit_checks
    }

    /// Chamber occupants not wearing a suit, ascending.
    pub fn occupants_without_suit(&self, registry: &dyn AgentRegistry) -> Vec<AgentId> {
        self.zones
            .chamber
            .iter()
            .filter(|&id| !registry.has_eva_suit(id))
            .collect()
    }
}
