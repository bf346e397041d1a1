//! Zone occupancy: who is queued at each door and who is inside the chamber.
//!
//! An airlock has five zones:
//!
//! | Zone | Where | Tracked by |
//! |------|-------|-----------|
//! | 0 | Interior side, waiting at the inner door | `inner_queue` |
//! | 1 | Inside the chamber, by the inner door | `chamber` |
//! | 2 | Inside the chamber, middle | `chamber` |
//! | 3 | Inside the chamber, by the outer door | `chamber` |
//! | 4 | Exterior side, waiting at the outer door | `outer_queue` |
//!
//! The three sets are copy-on-write. A reader that took an
//! [`OccupancySnapshot`] keeps iterating the version it captured while the
//! simulation keeps mutating the live sets; no locks are involved.
//!
//! ```
//! use airlock_logic::agents::AgentId;
//! use airlock_logic::zones::ZoneOccupancy;
//!
//! let mut zones = ZoneOccupancy::new();
//! zones.outer_queue.insert(AgentId(1));
//! let before = zones.outer_queue.snapshot();
//! zones.outer_queue.remove(AgentId(1));
//! assert!(before.contains(&AgentId(1)));
//! assert!(zones.outer_queue.is_empty());
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::pressure::AirlockState;

/// One of the five logical regions of an airlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AirlockZone {
    /// Interior side of the inner door.
    InnerQueue,
    /// Chamber side of the inner door.
    InnerDoor,
    /// Middle of the chamber.
    Chamber,
    /// Chamber side of the outer door.
    OuterDoor,
    /// Exterior side of the outer door.
    OuterQueue,
}

impl AirlockZone {
    pub const ALL: [AirlockZone; 5] = [
        AirlockZone::InnerQueue,
        AirlockZone::InnerDoor,
        AirlockZone::Chamber,
        AirlockZone::OuterDoor,
        AirlockZone::OuterQueue,
    ];

    /// Zones 1–3, the pressurizable volume.
    pub const CHAMBER: [AirlockZone; 3] = [
        AirlockZone::InnerDoor,
        AirlockZone::Chamber,
        AirlockZone::OuterDoor,
    ];

    /// Numeric zone index (0–4).
    pub fn index(self) -> u8 {
        match self {
            AirlockZone::InnerQueue => 0,
            AirlockZone::InnerDoor => 1,
            AirlockZone::Chamber => 2,
            AirlockZone::OuterDoor => 3,
            AirlockZone::OuterQueue => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn is_chamber(self) -> bool {
        matches!(
            self,
            AirlockZone::InnerDoor | AirlockZone::Chamber | AirlockZone::OuterDoor
        )
    }
}

/// A set of agent ids with copy-on-write snapshots.
///
/// Mutation goes through [`Arc::make_mut`], so it only copies when a
/// snapshot of the current version is still alive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancySet {
    ids: Arc<BTreeSet<AgentId>>,
}

impl OccupancySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: AgentId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        Arc::make_mut(&mut self.ids).insert(id)
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: AgentId) -> bool {
        if !self.ids.contains(&id) {
            return false;
        }
        Arc::make_mut(&mut self.ids).remove(&id)
    }

    /// Keep only ids for which `keep` returns true. Returns the removed ids.
    pub fn retain(&mut self, mut keep: impl FnMut(AgentId) -> bool) -> Vec<AgentId> {
        let dropped: Vec<AgentId> = self.ids.iter().copied().filter(|&id| !keep(id)).collect();
        if !dropped.is_empty() {
            let ids = Arc::make_mut(&mut self.ids);
            for id in &dropped {
                ids.remove(id);
            }
        }
        dropped
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.ids.iter().copied()
    }

    /// Frozen view of the current contents.
    pub fn snapshot(&self) -> Arc<BTreeSet<AgentId>> {
        Arc::clone(&self.ids)
    }

    pub fn clear(&mut self) {
        if !self.ids.is_empty() {
            self.ids = Arc::new(BTreeSet::new());
        }
    }
}

impl FromIterator<AgentId> for OccupancySet {
    fn from_iter<I: IntoIterator<Item = AgentId>>(iter: I) -> Self {
        Self {
            ids: Arc::new(iter.into_iter().collect()),
        }
    }
}

/// The three logical occupancy sets of one airlock.
#[derive(Debug, Clone, Default)]
pub struct ZoneOccupancy {
    /// Zone 0: waiting at the inner door.
    pub inner_queue: OccupancySet,
    /// Zones 1–3: inside the chamber.
    pub chamber: OccupancySet,
    /// Zone 4: waiting at the outer door.
    pub outer_queue: OccupancySet,
}

impl ZoneOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the agent is queued at either door or inside the chamber.
    pub fn is_in_any_zone(&self, id: AgentId) -> bool {
        self.chamber.contains(id) || self.inner_queue.contains(id) || self.outer_queue.contains(id)
    }

    /// Remove the agent from all three sets. Returns whether anything changed.
    pub fn purge(&mut self, id: AgentId) -> bool {
        let a = self.chamber.remove(id);
        let b = self.inner_queue.remove(id);
        let c = self.outer_queue.remove(id);
        a || b || c
    }

    pub fn clear(&mut self) {
        self.inner_queue.clear();
        self.chamber.clear();
        self.outer_queue.clear();
    }
}

/// Point-in-time view of an airlock for observers (UI, diagnostics).
///
/// Cheap to take and safe to send to another thread; it never changes after
/// creation.
#[derive(Debug, Clone)]
pub struct OccupancySnapshot {
    pub state: AirlockState,
    pub operator: Option<AgentId>,
    pub inner_queue: Arc<BTreeSet<AgentId>>,
    pub chamber: Arc<BTreeSet<AgentId>>,
    pub outer_queue: Arc<BTreeSet<AgentId>>,
}

impl OccupancySnapshot {
    pub fn total(&self) -> usize {
        self.inner_queue.len() + self.chamber.len() + self.outer_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &OccupancySet) -> Vec<u32> {
        set.iter().map(|a| a.0).collect()
    }

    #[test]
    fn zone_indices_round_trip() {
        for zone in AirlockZone::ALL {
            assert_eq!(AirlockZone::from_index(zone.index()), Some(zone));
        }
        assert_eq!(AirlockZone::from_index(5), None);
    }

    #[test]
    fn chamber_zones_are_one_to_three() {
        let chamber: Vec<u8> = AirlockZone::ALL
            .iter()
            .filter(|z| z.is_chamber())
            .map(|z| z.index())
            .collect();
        assert_eq!(chamber, vec![1, 2, 3]);
    }

    #[test]
    fn insert_and_remove_report_changes() {
        let mut set = OccupancySet::new();
        assert!(set.insert(AgentId(3)));
        assert!(!set.insert(AgentId(3)));
        assert!(set.remove(AgentId(3)));
        assert!(!set.remove(AgentId(3)));
    }

    #[test]
    fn iteration_is_sorted() {
        let set: OccupancySet = [AgentId(9), AgentId(1), AgentId(5)].into_iter().collect();
        assert_eq!(ids(&set), vec![1, 5, 9]);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let mut set: OccupancySet = [AgentId(1), AgentId(2)].into_iter().collect();
        let snap = set.snapshot();
        set.insert(AgentId(3));
        set.remove(AgentId(1));
        assert_eq!(snap.iter().map(|a| a.0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ids(&set), vec![2, 3]);
    }

    #[test]
    fn snapshot_readable_from_another_thread() {
        let mut set: OccupancySet = (0..100).map(AgentId).collect();
        let snap = set.snapshot();
        let reader = std::thread::spawn(move || snap.iter().count());
        for i in 0..100 {
            set.remove(AgentId(i));
        }
        assert_eq!(reader.join().unwrap(), 100);
        assert!(set.is_empty());
    }

    #[test]
    fn retain_returns_dropped() {
        let mut set: OccupancySet = (1..=4).map(AgentId).collect();
        let dropped = set.retain(|id| id.0 % 2 == 0);
        assert_eq!(dropped, vec![AgentId(1), AgentId(3)]);
        assert_eq!(ids(&set), vec![2, 4]);
    }

    #[test]
    fn purge_clears_every_set() {
        let mut zones = ZoneOccupancy::new();
        zones.inner_queue.insert(AgentId(1));
        zones.chamber.insert(AgentId(1));
        assert!(zones.is_in_any_zone(AgentId(1)));
        assert!(zones.purge(AgentId(1)));
        assert!(!zones.is_in_any_zone(AgentId(1)));
        assert!(!zones.purge(AgentId(1)));
    }
}
