//! Settlement layout as seen by the airlock selector.
//!
//! Connectivity and building classification are computed elsewhere; the
//! selector only asks whether a walkable interior path exists and whether a
//! structure is astronomy-only. Distances are straight-line.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// A position in settlement-local coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalPosition {
    pub x: f64,
    pub y: f64,
}

impl LocalPosition {
    pub const ORIGIN: LocalPosition = LocalPosition { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &LocalPosition) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Identity of a building or vehicle that owns an airlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureId(pub u32);

/// Spatial and classification queries the selector consumes.
pub trait SettlementLayout {
    /// Is there a walkable interior path between the two structures?
    fn has_walkable_path(&self, from: StructureId, to: StructureId) -> bool;

    /// Is this structure an astronomy observatory (never used as an airlock)?
    fn is_astronomy(&self, structure: StructureId) -> bool;
}

/// Undirected connector graph between structures.
///
/// A structure is always reachable from itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorGraph {
    adj: HashMap<StructureId, Vec<StructureId>>,
    astronomy: HashSet<StructureId>,
}

impl ConnectorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect two structures with a walkable connector.
    pub fn connect(&mut self, a: StructureId, b: StructureId) {
        self.adj.entry(a).or_default().push(b);
        self.adj.entry(b).or_default().push(a);
    }

    pub fn mark_astronomy(&mut self, structure: StructureId) {
        self.astronomy.insert(structure);
    }
}

impl SettlementLayout for ConnectorGraph {
    fn has_walkable_path(&self, from: StructureId, to: StructureId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            for &next in self.adj.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn is_astronomy(&self, structure: StructureId) -> bool {
        self.astronomy.contains(&structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = LocalPosition::new(0.0, 0.0);
        let b = LocalPosition::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn path_through_intermediate_structure() {
        let mut g = ConnectorGraph::new();
        g.connect(StructureId(1), StructureId(2));
        g.connect(StructureId(2), StructureId(3));
        assert!(g.has_walkable_path(StructureId(1), StructureId(3)));
        assert!(g.has_walkable_path(StructureId(3), StructureId(1)));
    }

    #[test]
    fn disconnected_structures_have_no_path() {
        let mut g = ConnectorGraph::new();
        g.connect(StructureId(1), StructureId(2));
        g.connect(StructureId(5), StructureId(6));
        assert!(!g.has_walkable_path(StructureId(1), StructureId(6)));
        assert!(g.has_walkable_path(StructureId(9), StructureId(9)));
    }

    #[test]
    fn astronomy_flag() {
        let mut g = ConnectorGraph::new();
        g.mark_astronomy(StructureId(7));
        assert!(g.is_astronomy(StructureId(7)));
        assert!(!g.is_astronomy(StructureId(1)));
    }
}
