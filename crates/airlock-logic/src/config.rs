//! Settlement airlock configuration.
//!
//! A settlement is described by a [`SettlementSpec`]: its airlocks, the
//! walkable connections between structures and which structures are
//! astronomy observatories. Specs are plain serde data so a layout can live
//! in a JSON file.
//!
//! ```
//! use airlock_logic::config::{validate_settlement, AirlockSpec, SettlementSpec};
//!
//! let spec = SettlementSpec {
//!     name: "Alpha Base".into(),
//!     airlocks: vec![AirlockSpec::default()],
//!     ..Default::default()
//! };
//! assert!(validate_settlement(&spec).is_empty());
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::chamber::ChamberKind;
use crate::constants::building;
use crate::layout::{ConnectorGraph, LocalPosition, StructureId};

/// One airlock in a settlement layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirlockSpec {
    pub id: u32,
    pub name: String,
    pub kind: ChamberKind,
    /// Maximum chamber occupants (at least 1).
    pub capacity: u32,
    /// Structure the airlock is built into.
    pub structure: StructureId,
    /// Settlement-frame position used for distance ranking.
    pub position: LocalPosition,
    pub interior_door: LocalPosition,
    pub exterior_door: LocalPosition,
}

impl Default for AirlockSpec {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Airlock 1".to_string(),
            kind: ChamberKind::Building,
            capacity: building::DEFAULT_CAPACITY,
            structure: StructureId(0),
            position: LocalPosition::ORIGIN,
            interior_door: LocalPosition::new(-1.5, 0.0),
            exterior_door: LocalPosition::new(1.5, 0.0),
        }
    }
}

/// A whole settlement: airlocks plus the connectivity they are ranked on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementSpec {
    pub name: String,
    pub airlocks: Vec<AirlockSpec>,
    /// Walkable pressurized connections between structures.
    pub connections: Vec<(StructureId, StructureId)>,
    /// Observatories; never used as an airlock.
    pub astronomy: Vec<StructureId>,
}

impl SettlementSpec {
    /// Build the connectivity graph this spec describes.
    pub fn layout(&self) -> ConnectorGraph {
        let mut graph = ConnectorGraph::new();
        for &(a, b) in &self.connections {
            graph.connect(a, b);
        }
        for &s in &self.astronomy {
            graph.mark_astronomy(s);
        }
        graph
    }
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub airlock: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl ConfigIssue {
    fn error(airlock: u32, message: String) -> Self {
        Self {
            airlock: Some(airlock),
            severity: Severity::Error,
            message,
        }
    }

    fn warning(airlock: Option<u32>, message: String) -> Self {
        Self {
            airlock,
            severity: Severity::Warning,
            message,
        }
    }
}

/// Validate a settlement, returning every issue found.
pub fn validate_settlement(spec: &SettlementSpec) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if spec.name.trim().is_empty() {
        issues.push(ConfigIssue::warning(None, "settlement has no name".to_string()));
    }

    let mut seen = BTreeSet::new();
    for a in &spec.airlocks {
        if !seen.insert(a.id) {
            issues.push(ConfigIssue::error(a.id, format!("duplicate airlock id {}", a.id)));
        }
        if a.capacity < 1 {
            issues.push(ConfigIssue::error(
                a.id,
                format!("airlock {} has capacity {}", a.id, a.capacity),
            ));
        }
        if a.name.trim().is_empty() {
            issues.push(ConfigIssue::warning(
                Some(a.id),
                format!("airlock {} has no name", a.id),
            ));
        }
        if a.kind == ChamberKind::Building && a.capacity as usize > building::MAX_SLOTS {
            issues.push(ConfigIssue::warning(
                Some(a.id),
                format!(
                    "airlock {} capacity {} exceeds its {} chamber positions",
                    a.id,
                    a.capacity,
                    building::MAX_SLOTS
                ),
            ));
        }
    }

    issues
}

/// Whether any issue is an error.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
