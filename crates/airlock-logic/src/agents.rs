//! Agents as seen by an airlock: an identity plus the EVA-operations skill
//! used to pick an operator.
//!
//! The agent registry is an external service. Airlocks only store
//! [`AgentId`]s and ask an [`AgentRegistry`] for skill data when electing
//! an operator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity of a person using an airlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// EVA-operations skill of an agent.
///
/// Ordering compares `level` first, then `experience`, which is exactly the
/// operator election rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EvaSkill {
    pub level: u32,
    pub experience: u32,
}

impl EvaSkill {
    pub fn new(level: u32, experience: u32) -> Self {
        Self { level, experience }
    }
}

/// Lookup service for agent data the airlock needs.
pub trait AgentRegistry {
    /// EVA-operations skill, or `None` if the agent is unknown.
    fn eva_skill(&self, agent: AgentId) -> Option<EvaSkill>;

    /// Whether the agent currently wears an EVA suit.
    fn has_eva_suit(&self, _agent: AgentId) -> bool {
        true
    }
}

impl AgentRegistry for HashMap<AgentId, EvaSkill> {
    fn eva_skill(&self, agent: AgentId) -> Option<EvaSkill> {
        self.get(&agent).copied()
    }
}

/// Simple in-memory registry, used by the harness and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    skills: HashMap<AgentId, EvaSkill>,
    suited: HashMap<AgentId, bool>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or update) an agent with a skill; new agents start suited.
    pub fn insert(&mut self, agent: AgentId, skill: EvaSkill) {
        self.skills.insert(agent, skill);
        self.suited.entry(agent).or_insert(true);
    }

    pub fn set_suited(&mut self, agent: AgentId, suited: bool) {
        self.suited.insert(agent, suited);
    }

    pub fn remove(&mut self, agent: AgentId) {
        self.skills.remove(&agent);
        self.suited.remove(&agent);
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl AgentRegistry for Roster {
    fn eva_skill(&self, agent: AgentId) -> Option<EvaSkill> {
        self.skills.get(&agent).copied()
    }

    fn has_eva_suit(&self, agent: AgentId) -> bool {
        self.suited.get(&agent).copied().unwrap_or(false)
    }
}
