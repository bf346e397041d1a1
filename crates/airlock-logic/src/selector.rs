//! Settlement-level airlock selection.
//!
//! Two strategies pick an airlock for an agent about to go outside or come
//! back in:
//!
//! # Tiered nearest-available
//!
//! Airlocks are sorted into a *pressurized* and a *depressurized* bucket by
//! [`AirlockBuckets::rebucket`]. A request walks four tiers and takes the
//! nearest airlock of the first tier that has any:
//!
//! | Tier | Egress bucket | Ingress bucket | Requirement |
//! |------|---------------|----------------|-------------|
//! | 1 | pressurized | depressurized | chamber not full |
//! | 2 | pressurized | depressurized | reservations not full |
//! | 3 | depressurized | pressurized | chamber not full |
//! | 4 | depressurized | pressurized | reservations not full |
//!
//! Egress candidates also need a walkable path from the requester's
//! structure. Astronomy observatories are never picked.
//!
//! # Weighted scoring
//!
//! [`scored_airlocks`] gives every reachable airlock an additive score:
//!
//! | Signal | Points |
//! |--------|--------|
//! | Base | 1 |
//! | Mode is not the opposite direction | 2 |
//! | Distance ≤ best so far | 1 |
//! | Occupants ≤ fewest so far | 1 |
//! | Free chamber slots | 1 each |
//! | Queue on the arrival side ≤ shortest so far | 1 + (4 − depth) |
//! | Queue on the far side ≤ shortest so far | 1 |
//!
//! The running minima are carried across airlocks in ascending id order.
//! The top score wins; ties go to the lowest id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::airlock::{Airlock, AirlockId, AirlockMode};
use crate::constants::scoring::{BASELINE_DEPTH, MODE_MATCH_BONUS};
use crate::layout::{LocalPosition, SettlementLayout, StructureId};
use crate::pressure::AirlockState;

/// An airlock placed in a settlement.
#[derive(Debug)]
pub struct AirlockSite {
    pub airlock: Airlock,
    /// Structure the airlock belongs to.
    pub structure: StructureId,
    pub position: LocalPosition,
}

impl AirlockSite {
    pub fn new(airlock: Airlock, structure: StructureId, position: LocalPosition) -> Self {
        Self {
            airlock,
            structure,
            position,
        }
    }

    pub fn id(&self) -> AirlockId {
        self.airlock.id()
    }

    /// Chamber not full, or reservations still open.
    pub fn is_available(&self) -> bool {
        !self.airlock.is_full() || !self.airlock.is_reservation_full()
    }
}

/// Sites keyed by id; iteration is always in ascending id order.
pub type Sites = BTreeMap<AirlockId, AirlockSite>;

/// Pressurized and depressurized availability buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlockBuckets {
    pressurized: BTreeSet<AirlockId>,
    depressurized: BTreeSet<AirlockId>,
}

impl AirlockBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild both buckets from the current airlock states.
    ///
    /// Airlocks with no availability signal, and airlocks that are off, end
    /// up in neither bucket.
    pub fn rebucket(&mut self, sites: &Sites) {
        self.pressurized.clear();
        self.depressurized.clear();
        for (&id, site) in sites {
            if !site.is_available() {
                continue;
            }
            let state = site.airlock.state();
            if state.leans_pressurized() {
                self.pressurized.insert(id);
            } else if state.leans_depressurized() {
                self.depressurized.insert(id);
            }
        }
    }

    pub fn pressurized(&self) -> impl Iterator<Item = AirlockId> + '_ {
        self.pressurized.iter().copied()
    }

    pub fn depressurized(&self) -> impl Iterator<Item = AirlockId> + '_ {
        self.depressurized.iter().copied()
    }

    pub fn contains(&self, id: AirlockId) -> bool {
        self.pressurized.contains(&id) || self.depressurized.contains(&id)
    }

    /// Drop an airlock from both buckets.
    pub fn forget(&mut self, id: AirlockId) {
        self.pressurized.remove(&id);
        self.depressurized.remove(&id);
    }
}

#[derive(Clone, Copy)]
enum Need {
    Room,
    Reservation,
}

impl Need {
    fn met_by(self, site: &AirlockSite) -> bool {
        match self {
            Need::Room => !site.airlock.is_full(),
            Need::Reservation => !site.airlock.is_reservation_full(),
        }
    }
}

/// Nearest site in `bucket` passing `need` and `reachable`. Ties keep the
/// lowest id since buckets iterate in ascending order.
fn nearest(
    sites: &Sites,
    bucket: &BTreeSet<AirlockId>,
    at: LocalPosition,
    need: Need,
    reachable: &dyn Fn(&AirlockSite) -> bool,
) -> Option<AirlockId> {
    let mut best: Option<(AirlockId, f64)> = None;
    for id in bucket {
        let Some(site) = sites.get(id) else {
            continue;
        };
        if !need.met_by(site) || !reachable(site) {
            continue;
        }
        let distance = site.position.distance_to(&at);
        match best {
            Some((_, least)) if distance >= least => {}
            _ => best = Some((*id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

fn tiered(
    sites: &Sites,
    first: &BTreeSet<AirlockId>,
    second: &BTreeSet<AirlockId>,
    at: LocalPosition,
    reachable: &dyn Fn(&AirlockSite) -> bool,
) -> Option<AirlockId> {
    nearest(sites, first, at, Need::Room, reachable)
        .or_else(|| nearest(sites, first, at, Need::Reservation, reachable))
        .or_else(|| nearest(sites, second, at, Need::Room, reachable))
        .or_else(|| nearest(sites, second, at, Need::Reservation, reachable))
}

/// Best airlock for leaving the settlement from structure `from` at `at`.
pub fn best_egress_airlock(
    sites: &Sites,
    buckets: &AirlockBuckets,
    layout: &dyn SettlementLayout,
    from: StructureId,
    at: LocalPosition,
) -> Option<AirlockId> {
    let reachable = |site: &AirlockSite| {
        !layout.is_astronomy(site.structure) && layout.has_walkable_path(from, site.structure)
    };
    tiered(
        sites,
        &buckets.pressurized,
        &buckets.depressurized,
        at,
        &reachable,
    )
}

/// Best airlock for coming back in from outside at `at`.
pub fn best_ingress_airlock(
    sites: &Sites,
    buckets: &AirlockBuckets,
    layout: &dyn SettlementLayout,
    at: LocalPosition,
) -> Option<AirlockId> {
    let reachable = |site: &AirlockSite| !layout.is_astronomy(site.structure);
    tiered(
        sites,
        &buckets.depressurized,
        &buckets.pressurized,
        at,
        &reachable,
    )
}

/// One row of the scoring table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredAirlock {
    pub id: AirlockId,
    pub score: i32,
    pub distance: f64,
}

/// An idle airlock suits either direction; only the opposite mode misses.
fn mode_suits(mode: AirlockMode, is_ingress: bool) -> bool {
    if is_ingress {
        mode != AirlockMode::Egress
    } else {
        mode != AirlockMode::Ingress
    }
}

/// Score every eligible airlock reachable from `from`, in ascending id
/// order.
pub fn scored_airlocks(
    sites: &Sites,
    layout: &dyn SettlementLayout,
    from: StructureId,
    at: LocalPosition,
    is_ingress: bool,
) -> Vec<ScoredAirlock> {
    let mut least_distance = f64::INFINITY;
    let mut least_people = BASELINE_DEPTH;
    let mut least_inner = BASELINE_DEPTH;
    let mut least_outer = BASELINE_DEPTH;
    let mut table = Vec::new();

    for (&id, site) in sites {
        let airlock = &site.airlock;
        if airlock.state() == AirlockState::Off || !site.is_available() {
            continue;
        }
        if !layout.has_walkable_path(from, site.structure) {
            continue;
        }

        let mut score = 1;
        if mode_suits(airlock.mode(), is_ingress) {
            score += MODE_MATCH_BONUS;
        }

        let distance = site.position.distance_to(&at);
        if distance <= least_distance {
            least_distance = distance;
            score += 1;
        }

        let people = airlock.num_occupants() as i32;
        if people <= least_people {
            least_people = people;
            score += 1;
        }

        score += airlock.remaining_slots() as i32;

        let inner = airlock.num_awaiting_inner_door() as i32;
        let outer = airlock.num_awaiting_outer_door() as i32;
        let (arrival, far, least_arrival, least_far) = if is_ingress {
            (outer, inner, &mut least_outer, &mut least_inner)
        } else {
            (inner, outer, &mut least_inner, &mut least_outer)
        };
        if arrival <= *least_arrival {
            *least_arrival = arrival;
            score += 1 + (BASELINE_DEPTH - arrival);
        }
        if far <= *least_far {
            *least_far = far;
            score += 1;
        }

        table.push(ScoredAirlock {
            id,
            score,
            distance,
        });
    }

    table
}

/// Highest-scoring airlock; ties go to the lowest id.
pub fn best_scored_airlock(
    sites: &Sites,
    layout: &dyn SettlementLayout,
    from: StructureId,
    at: LocalPosition,
    is_ingress: bool,
) -> Option<AirlockId> {
    let mut best: Option<ScoredAirlock> = None;
    for row in scored_airlocks(sites, layout, from, at, is_ingress) {
        match best {
            Some(top) if row.score <= top.score => {}
            _ => best = Some(row),
        }
    }
    best.map(|row| row.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentId;
    use crate::airlock::Direction;
    use crate::clock::Millisol;
    use crate::layout::ConnectorGraph;

    const HAB: StructureId = StructureId(1);

    fn site(id: u32, structure: u32, x: f64, capacity: u32) -> AirlockSite {
        let airlock = Airlock::building(
            AirlockId(id),
            format!("Airlock {}", id),
            capacity,
            LocalPosition::new(x - 1.0, 0.0),
            LocalPosition::new(x + 1.0, 0.0),
        )
        .unwrap();
        AirlockSite::new(airlock, StructureId(structure), LocalPosition::new(x, 0.0))
    }

    fn sites(list: Vec<AirlockSite>) -> Sites {
        list.into_iter().map(|s| (s.id(), s)).collect()
    }

    fn connected(structures: &[u32]) -> ConnectorGraph {
        let mut g = ConnectorGraph::new();
        for &s in structures {
            g.connect(HAB, StructureId(s));
        }
        g
    }

    fn depressurize(site: &mut AirlockSite) {
        site.airlock.request_cycle(Direction::Ingress);
        let t = site.airlock.remaining_cycle_time();
        site.airlock.advance(t);
    }

    fn fill(site: &mut AirlockSite) {
        let cap = site.airlock.capacity();
        for i in 0..cap {
            let agent = AgentId(1000 + site.id().0 * 10 + i);
            site.airlock.join_inner_queue(agent);
            assert!(site.airlock.try_enter(agent, Direction::Egress));
        }
    }

    fn fill_reservations(site: &mut AirlockSite) {
        for i in 0..4 {
            site.airlock.add_reservation(AgentId(500 + i), Millisol::new(0));
        }
    }

    #[test]
    fn rebucket_sorts_by_pressure() {
        let mut s = sites(vec![site(1, 2, 0.0, 2), site(2, 3, 5.0, 2)]);
        depressurize(s.get_mut(&AirlockId(2)).unwrap());
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert_eq!(b.pressurized().collect::<Vec<_>>(), vec![AirlockId(1)]);
        assert_eq!(b.depressurized().collect::<Vec<_>>(), vec![AirlockId(2)]);
    }

    #[test]
    fn rebucket_is_a_clean_rebuild() {
        let mut s = sites(vec![site(1, 2, 0.0, 1)]);
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert!(b.contains(AirlockId(1)));

        let a = s.get_mut(&AirlockId(1)).unwrap();
        fill(a);
        fill_reservations(a);
        b.rebucket(&s);
        assert!(!b.contains(AirlockId(1)), "no availability signal left");

        s.get_mut(&AirlockId(1)).unwrap().airlock.decommission();
        depressurize(s.get_mut(&AirlockId(1)).unwrap());
        b.rebucket(&s);
        assert_eq!(b.depressurized().count(), 1);
        assert_eq!(b.pressurized().count(), 0);
    }

    #[test]
    fn off_airlocks_are_never_bucketed() {
        let mut s = sites(vec![site(1, 2, 0.0, 2)]);
        s.get_mut(&AirlockId(1)).unwrap().airlock.shut_down();
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert!(!b.contains(AirlockId(1)));
    }

    #[test]
    fn egress_prefers_ready_pressurized() {
        let mut s = sites(vec![site(1, 2, 1.0, 2), site(2, 3, 50.0, 2)]);
        depressurize(s.get_mut(&AirlockId(1)).unwrap());
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        let g = connected(&[2, 3]);
        let pick = best_egress_airlock(&s, &b, &g, HAB, LocalPosition::ORIGIN);
        assert_eq!(pick, Some(AirlockId(2)), "farther but pressurized");
    }

    #[test]
    fn egress_falls_back_to_reservable_then_depressurized() {
        let mut s = sites(vec![site(1, 2, 1.0, 1), site(2, 3, 2.0, 1)]);
        fill(s.get_mut(&AirlockId(1)).unwrap());
        depressurize(s.get_mut(&AirlockId(2)).unwrap());
        let g = connected(&[2, 3]);
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert_eq!(
            best_egress_airlock(&s, &b, &g, HAB, LocalPosition::ORIGIN),
            Some(AirlockId(1)),
            "full but reservable pressurized airlock beats depressurized"
        );

        fill_reservations(s.get_mut(&AirlockId(1)).unwrap());
        b.rebucket(&s);
        assert_eq!(
            best_egress_airlock(&s, &b, &g, HAB, LocalPosition::ORIGIN),
            Some(AirlockId(2))
        );
    }

    #[test]
    fn egress_requires_walkable_path() {
        let s = sites(vec![site(1, 2, 1.0, 2), site(2, 3, 9.0, 2)]);
        let g = connected(&[3]);
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert_eq!(
            best_egress_airlock(&s, &b, &g, HAB, LocalPosition::ORIGIN),
            Some(AirlockId(2))
        );
        assert_eq!(
            best_egress_airlock(&s, &b, &ConnectorGraph::new(), HAB, LocalPosition::ORIGIN),
            None
        );
    }

    #[test]
    fn ingress_ignores_paths_but_not_astronomy() {
        let mut s = sites(vec![site(1, 2, 1.0, 2), site(2, 3, 9.0, 2)]);
        depressurize(s.get_mut(&AirlockId(1)).unwrap());
        depressurize(s.get_mut(&AirlockId(2)).unwrap());
        let mut g = ConnectorGraph::new();
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert_eq!(best_ingress_airlock(&s, &b, &g, LocalPosition::ORIGIN), Some(AirlockId(1)));

        g.mark_astronomy(StructureId(2));
        assert_eq!(best_ingress_airlock(&s, &b, &g, LocalPosition::ORIGIN), Some(AirlockId(2)));
    }

    #[test]
    fn nearest_tie_goes_to_lowest_id() {
        let s = sites(vec![site(4, 2, 3.0, 2), site(3, 3, -3.0, 2)]);
        let g = connected(&[2, 3]);
        let mut b = AirlockBuckets::new();
        b.rebucket(&s);
        assert_eq!(
            best_egress_airlock(&s, &b, &g, HAB, LocalPosition::ORIGIN),
            Some(AirlockId(3))
        );
    }

    #[test]
    fn score_rewards_mode_and_free_slots() {
        let mut s = sites(vec![site(1, 2, 0.0, 2)]);
        s.get_mut(&AirlockId(1)).unwrap().airlock.set_mode(AirlockMode::Egress);
        let g = connected(&[2]);
        let table = scored_airlocks(&s, &g, HAB, LocalPosition::ORIGIN, false);
        // base 1 + mode 2 + distance 1 + people 1 + slots 2 + inner 1+4 + outer 1
        assert_eq!(table[0].score, 13);

        let table = scored_airlocks(&s, &g, HAB, LocalPosition::ORIGIN, true);
        assert_eq!(table[0].score, 11, "egress mode does not suit ingress");
    }

    #[test]
    fn not_in_use_suits_both_directions() {
        assert!(mode_suits(AirlockMode::NotInUse, false));
        assert!(mode_suits(AirlockMode::NotInUse, true));
        assert!(mode_suits(AirlockMode::Ingress, true));
        assert!(!mode_suits(AirlockMode::Ingress, false));
        assert!(!mode_suits(AirlockMode::Egress, true));
    }

    #[test]
    fn idle_airlock_outscores_egress_mode_for_ingress() {
        let g = connected(&[2]);
        let mut idle = sites(vec![site(1, 2, 0.0, 2)]);
        idle.get_mut(&AirlockId(1)).unwrap().airlock.set_mode(AirlockMode::NotInUse);
        let mut busy = sites(vec![site(1, 2, 0.0, 2)]);
        busy.get_mut(&AirlockId(1)).unwrap().airlock.set_mode(AirlockMode::Egress);

        let idle_score = scored_airlocks(&idle, &g, HAB, LocalPosition::ORIGIN, true)[0].score;
        let busy_score = scored_airlocks(&busy, &g, HAB, LocalPosition::ORIGIN, true)[0].score;
        assert_eq!(idle_score, 13);
        assert_eq!(busy_score, 11);
    }

    #[test]
    fn scoring_tie_goes_to_lowest_id() {
        let s = sites(vec![site(2, 2, 5.0, 2), site(1, 3, 5.0, 2)]);
        let g = connected(&[2, 3]);
        let table = scored_airlocks(&s, &g, HAB, LocalPosition::ORIGIN, false);
        assert_eq!(table[0].score, table[1].score);
        assert_eq!(
            best_scored_airlock(&s, &g, HAB, LocalPosition::ORIGIN, false),
            Some(AirlockId(1))
        );
    }

    #[test]
    fn scoring_skips_full_unreservable_and_unreachable() {
        let mut s = sites(vec![site(1, 2, 0.0, 1), site(2, 9, 0.0, 2)]);
        let a = s.get_mut(&AirlockId(1)).unwrap();
        fill(a);
        fill_reservations(a);
        let g = connected(&[2]);
        assert!(scored_airlocks(&s, &g, HAB, LocalPosition::ORIGIN, false).is_empty());
        assert_eq!(best_scored_airlock(&s, &g, HAB, LocalPosition::ORIGIN, false), None);
    }

    #[test]
    fn shorter_queue_wins() {
        let mut s = sites(vec![site(1, 2, 0.0, 4), site(2, 3, 0.0, 4)]);
        let busy = s.get_mut(&AirlockId(1)).unwrap();
        busy.airlock.join_inner_queue(AgentId(1));
        busy.airlock.join_inner_queue(AgentId(2));
        let g = connected(&[2, 3]);
        assert_eq!(
            best_scored_airlock(&s, &g, HAB, LocalPosition::ORIGIN, false),
            Some(AirlockId(2))
        );
    }
}
