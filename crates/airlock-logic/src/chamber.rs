//! Chamber variants: the physical side of an airlock.
//!
//! The logical occupancy sets in [`crate::zones`] say who is queued or
//! inside. A [`Chamber`] says *where*: each zone has a fixed number of
//! standing positions, and an agent physically in a zone holds one of them.
//! Variants differ in cycle length, slot layout and queue admission.
//!
//! | Variant | Cycle (msol) | Zone 2 spots | Door-zone spots | Queue limit |
//! |---------|-------------|--------------|-----------------|-------------|
//! | [`BuildingChamber`] | 10 | 4 | 4 per zone | 3 |
//! | [`VehicleChamber`] | 5 | capacity | capacity per zone | capacity |

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::constants::{building, vehicle};
use crate::layout::LocalPosition;
use crate::zones::AirlockZone;

/// Which kind of structure an airlock belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChamberKind {
    #[default]
    Building,
    Vehicle,
}

impl ChamberKind {
    pub fn cycle_time(self) -> f64 {
        match self {
            ChamberKind::Building => building::CYCLE_TIME,
            ChamberKind::Vehicle => vehicle::CYCLE_TIME,
        }
    }
}

/// Fixed standing positions for one zone, each free or held by one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSlots {
    slots: Vec<(LocalPosition, Option<AgentId>)>,
}

impl ZoneSlots {
    pub fn new(positions: impl IntoIterator<Item = LocalPosition>) -> Self {
        Self {
            slots: positions.into_iter().map(|p| (p, None)).collect(),
        }
    }

    /// Give `agent` a position. An agent already in this zone keeps the one
    /// it holds. `None` if every position is taken.
    pub fn claim(&mut self, agent: AgentId) -> Option<LocalPosition> {
        if let Some(pos) = self.position_of(agent) {
            return Some(pos);
        }
        let slot = self.slots.iter_mut().find(|(_, who)| who.is_none())?;
        slot.1 = Some(agent);
        Some(slot.0)
    }

    pub fn vacate(&mut self, agent: AgentId) -> bool {
        match self.slots.iter_mut().find(|(_, who)| *who == Some(agent)) {
            Some(slot) => {
                slot.1 = None;
                true
            }
            None => false,
        }
    }

    pub fn position_of(&self, agent: AgentId) -> Option<LocalPosition> {
        self.slots
            .iter()
            .find(|(_, who)| *who == Some(agent))
            .map(|(p, _)| *p)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.position_of(agent).is_some()
    }

    /// First free position, if any.
    pub fn available(&self) -> Option<LocalPosition> {
        self.slots.iter().find(|(_, who)| who.is_none()).map(|(p, _)| *p)
    }

    pub fn occupants(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.slots.iter().filter_map(|(_, who)| *who).collect();
        ids.sort();
        ids
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|(_, who)| who.is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() >= self.capacity()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.1 = None;
        }
    }
}

/// Variant-specific behavior of an airlock chamber.
///
/// Implementors provide the slot layout and the constants; the zone queries
/// are derived from the slots.
pub trait Chamber: std::fmt::Debug + Send + Sync {
    fn kind(&self) -> ChamberKind;

    /// Length of one pressurize or depressurize cycle (millisols).
    fn cycle_time(&self) -> f64;

    /// How many agents may wait at each door.
    fn queue_limit(&self) -> usize;

    /// Position between zones 0 and 1.
    fn interior_door(&self) -> LocalPosition;

    /// Position between zones 3 and 4.
    fn exterior_door(&self) -> LocalPosition;

    fn slots(&self, zone: AirlockZone) -> &ZoneSlots;

    fn slots_mut(&mut self, zone: AirlockZone) -> &mut ZoneSlots;

    fn claim(&mut self, zone: AirlockZone, agent: AgentId) -> Option<LocalPosition> {
        self.slots_mut(zone).claim(agent)
    }

    fn vacate(&mut self, zone: AirlockZone, agent: AgentId) -> bool {
        self.slots_mut(zone).vacate(agent)
    }

    /// Vacate every zone. Returns whether the agent held anything.
    fn vacate_all(&mut self, agent: AgentId) -> bool {
        let mut any = false;
        for zone in AirlockZone::ALL {
            any |= self.vacate(zone, agent);
        }
        any
    }

    fn is_in_zone(&self, agent: AgentId, zone: AirlockZone) -> bool {
        self.slots(zone).contains(agent)
    }

    /// Physically present in zone 1, 2 or 3.
    fn is_inside(&self, agent: AgentId) -> bool {
        AirlockZone::CHAMBER
            .iter()
            .any(|&zone| self.is_in_zone(agent, zone))
    }

    fn zone_occupants(&self, zone: AirlockZone) -> Vec<AgentId> {
        self.slots(zone).occupants()
    }

    /// Head count across zones 1–3.
    fn num_inside(&self) -> usize {
        AirlockZone::CHAMBER
            .iter()
            .map(|&zone| self.slots(zone).occupied())
            .sum()
    }

    fn available_position(&self, zone: AirlockZone) -> Option<LocalPosition> {
        self.slots(zone).available()
    }

    fn clear(&mut self) {
        for zone in AirlockZone::ALL {
            self.slots_mut(zone).clear();
        }
    }
}

/// Four positions around a door: two rows `x1`/`x2` from the door, each at `±y`.
fn door_positions(center: LocalPosition, x1: f64, x2: f64, y: f64) -> Vec<LocalPosition> {
    vec![
        center.offset(x1, y),
        center.offset(x1, -y),
        center.offset(x2, y),
        center.offset(x2, -y),
    ]
}

/// Airlock built into a settlement building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingChamber {
    interior_door: LocalPosition,
    exterior_door: LocalPosition,
    /// Zones 0–4, indexed by [`AirlockZone::index`].
    zones: [ZoneSlots; 5],
}

impl BuildingChamber {
    pub fn new(interior_door: LocalPosition, exterior_door: LocalPosition) -> Self {
        let center = LocalPosition::new(
            (interior_door.x + exterior_door.x) / 2.0,
            (interior_door.y + exterior_door.y) / 2.0,
        );
        let spots = [(-0.5, 0.5), (-0.5, -0.5), (0.5, 0.5), (0.5, -0.5)]
            .into_iter()
            .take(building::MAX_SLOTS)
            .map(|(dx, dy)| center.offset(dx, dy));

        Self {
            interior_door,
            exterior_door,
            zones: [
                ZoneSlots::new(door_positions(interior_door, -0.3, -0.6, 0.4)),
                ZoneSlots::new(door_positions(interior_door, 0.3, 0.6, 0.4)),
                ZoneSlots::new(spots),
                ZoneSlots::new(door_positions(exterior_door, -0.5, -1.0, 0.4)),
                ZoneSlots::new(door_positions(exterior_door, 0.5, 1.0, 0.4)),
            ],
        }
    }
}

impl Chamber for BuildingChamber {
    fn kind(&self) -> ChamberKind {
        ChamberKind::Building
    }

    fn cycle_time(&self) -> f64 {
        building::CYCLE_TIME
    }

    fn queue_limit(&self) -> usize {
        building::QUEUE_LIMIT
    }

    fn interior_door(&self) -> LocalPosition {
        self.interior_door
    }

    fn exterior_door(&self) -> LocalPosition {
        self.exterior_door
    }

    fn slots(&self, zone: AirlockZone) -> &ZoneSlots {
        &self.zones[zone.index() as usize]
    }

    fn slots_mut(&mut self, zone: AirlockZone) -> &mut ZoneSlots {
        &mut self.zones[zone.index() as usize]
    }
}

/// Airlock of a rover or other crewed vehicle. Smaller and faster to cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleChamber {
    interior_door: LocalPosition,
    exterior_door: LocalPosition,
    queue_limit: usize,
    zones: [ZoneSlots; 5],
}

impl VehicleChamber {
    /// Every zone gets one position per person the airlock holds.
    pub fn new(capacity: u32, interior_door: LocalPosition, exterior_door: LocalPosition) -> Self {
        let n = capacity.max(1) as usize;
        let line = |origin: LocalPosition, dx: f64| -> ZoneSlots {
            ZoneSlots::new((0..n).map(|i| origin.offset(dx, 0.3 * i as f64)))
        };
        let center = LocalPosition::new(
            (interior_door.x + exterior_door.x) / 2.0,
            (interior_door.y + exterior_door.y) / 2.0,
        );

        Self {
            interior_door,
            exterior_door,
            queue_limit: n,
            zones: [
                line(interior_door, -0.4),
                line(interior_door, 0.2),
                line(center, 0.0),
                line(exterior_door, -0.2),
                line(exterior_door, 0.4),
            ],
        }
    }
}

impl Chamber for VehicleChamber {
    fn kind(&self) -> ChamberKind {
        ChamberKind::Vehicle
    }

    fn cycle_time(&self) -> f64 {
        vehicle::CYCLE_TIME
    }

    fn queue_limit(&self) -> usize {
        self.queue_limit
    }

    fn interior_door(&self) -> LocalPosition {
        self.interior_door
    }

    fn exterior_door(&self) -> LocalPosition {
        self.exterior_door
    }

    fn slots(&self, zone: AirlockZone) -> &ZoneSlots {
        &self.zones[zone.index() as usize]
    }

    fn slots_mut(&mut self, zone: AirlockZone) -> &mut ZoneSlots {
        &mut self.zones[zone.index() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building() -> BuildingChamber {
        BuildingChamber::new(LocalPosition::new(0.0, 0.0), LocalPosition::new(3.0, 0.0))
    }

    #[test]
    fn building_has_four_positions_per_zone() {
        let c = building();
        for zone in AirlockZone::ALL {
            assert_eq!(c.slots(zone).capacity(), 4, "zone {:?}", zone);
        }
        assert_eq!(c.queue_limit(), 3);
        assert_eq!(c.cycle_time(), 10.0);
    }

    #[test]
    fn door_positions_flank_the_door() {
        let c = building();
        let inside = c.slots(AirlockZone::InnerDoor).available().unwrap();
        let outside = c.slots(AirlockZone::InnerQueue).available().unwrap();
        assert!(inside.x > 0.0, "zone 1 is on the chamber side");
        assert!(outside.x < 0.0, "zone 0 is on the interior side");
    }

    #[test]
    fn claim_is_idempotent_per_zone() {
        let mut c = building();
        let a = c.claim(AirlockZone::Chamber, AgentId(1)).unwrap();
        let b = c.claim(AirlockZone::Chamber, AgentId(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(c.slots(AirlockZone::Chamber).occupied(), 1);
    }

    #[test]
    fn claim_fails_when_zone_full() {
        let mut c = building();
        for i in 0..4 {
            assert!(c.claim(AirlockZone::Chamber, AgentId(i)).is_some());
        }
        assert!(c.slots(AirlockZone::Chamber).is_full());
        assert!(c.claim(AirlockZone::Chamber, AgentId(9)).is_none());
    }

    #[test]
    fn num_inside_counts_zones_one_to_three() {
        let mut c = building();
        c.claim(AirlockZone::InnerQueue, AgentId(1));
        c.claim(AirlockZone::InnerDoor, AgentId(2));
        c.claim(AirlockZone::Chamber, AgentId(3));
        c.claim(AirlockZone::OuterDoor, AgentId(4));
        c.claim(AirlockZone::OuterQueue, AgentId(5));
        assert_eq!(c.num_inside(), 3);
        assert!(c.is_inside(AgentId(3)));
        assert!(!c.is_inside(AgentId(5)));
    }

    #[test]
    fn vacate_all_frees_every_zone() {
        let mut c = building();
        c.claim(AirlockZone::InnerQueue, AgentId(1));
        c.claim(AirlockZone::Chamber, AgentId(1));
        assert!(c.vacate_all(AgentId(1)));
        assert!(!c.vacate_all(AgentId(1)));
        assert_eq!(c.num_inside(), 0);
    }

    #[test]
    fn vehicle_slots_follow_capacity() {
        let c = VehicleChamber::new(2, LocalPosition::ORIGIN, LocalPosition::new(2.0, 0.0));
        assert_eq!(c.kind(), ChamberKind::Vehicle);
        assert_eq!(c.queue_limit(), 2);
        assert_eq!(c.cycle_time(), 5.0);
        for zone in AirlockZone::ALL {
            assert_eq!(c.slots(zone).capacity(), 2);
        }
    }

    #[test]
    fn zone_occupants_sorted() {
        let mut c = building();
        c.claim(AirlockZone::OuterQueue, AgentId(8));
        c.claim(AirlockZone::OuterQueue, AgentId(2));
        assert_eq!(c.zone_occupants(AirlockZone::OuterQueue), vec![AgentId(2), AgentId(8)]);
    }
}
