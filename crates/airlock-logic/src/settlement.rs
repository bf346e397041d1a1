//! All airlocks of one settlement, ticked together and ranked for agents.

use crate::agents::{AgentId, AgentRegistry};
use crate::airlock::{Airlock, AirlockId};
use crate::clock::ClockPulse;
use crate::config::{has_errors, validate_settlement, Severity, SettlementSpec};
use crate::error::{AirlockError, Result};
use crate::layout::{LocalPosition, SettlementLayout, StructureId};
use crate::selector::{self, AirlockBuckets, AirlockSite, ScoredAirlock, Sites};
use crate::zones::OccupancySnapshot;

#[derive(Debug, Default)]
pub struct SettlementAirlocks {
    name: String,
    sites: Sites,
    buckets: AirlockBuckets,
}

impl SettlementAirlocks {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build every airlock a spec describes. Validation errors reject the
    /// whole spec; warnings are logged.
    pub fn from_spec(spec: &SettlementSpec) -> Result<Self> {
        let issues = validate_settlement(spec);
        if has_errors(&issues) {
            let messages: Vec<&str> = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message.as_str())
                .collect();
            return Err(AirlockError::InvalidSpec(messages.join("; ")));
        }
        for issue in &issues {
            log::warn!("{}: {}", spec.name, issue.message);
        }

        let mut settlement = Self::new(spec.name.clone());
        for a in &spec.airlocks {
            settlement.add_site(Airlock::from_spec(a)?, a.structure, a.position)?;
        }
        settlement.rebucket();
        Ok(settlement)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_site(
        &mut self,
        airlock: Airlock,
        structure: StructureId,
        position: LocalPosition,
    ) -> Result<()> {
        let id = airlock.id();
        if self.sites.contains_key(&id) {
            return Err(AirlockError::DuplicateAirlock(id));
        }
        self.sites
            .insert(id, AirlockSite::new(airlock, structure, position));
        Ok(())
    }

    pub fn airlock(&self, id: AirlockId) -> Option<&Airlock> {
        self.sites.get(&id).map(|s| &s.airlock)
    }

    pub fn airlock_mut(&mut self, id: AirlockId) -> Option<&mut Airlock> {
        self.sites.get_mut(&id).map(|s| &mut s.airlock)
    }

    pub fn site(&self, id: AirlockId) -> Option<&AirlockSite> {
        self.sites.get(&id)
    }

    pub fn sites(&self) -> &Sites {
        &self.sites
    }

    /// Airlock ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = AirlockId> + '_ {
        self.sites.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn buckets(&self) -> &AirlockBuckets {
        &self.buckets
    }

    pub fn rebucket(&mut self) {
        self.buckets.rebucket(&self.sites);
    }

    /// Tick every airlock; rebucket on a new millisol.
    pub fn time_passing(&mut self, pulse: &ClockPulse, registry: &dyn AgentRegistry) {
        for site in self.sites.values_mut() {
            site.airlock.time_passing(pulse, registry);
        }
        if pulse.new_millisol {
            self.rebucket();
        }
    }

    /// Airlock where the agent is queued or inside, if any.
    pub fn airlock_of(&self, agent: AgentId) -> Option<AirlockId> {
        self.sites
            .values()
            .find(|s| s.airlock.is_in_any_zone(agent))
            .map(|s| s.id())
    }

    /// Purge an agent from every airlock. Returns how many airlocks held a
    /// trace of them.
    pub fn remove_agent(&mut self, agent: AgentId) -> usize {
        self.sites
            .values_mut()
            .map(|s| s.airlock.remove_agent(agent))
            .filter(|&hit| hit)
            .count()
    }

    /// Remove a site, clearing its airlock first.
    pub fn decommission(&mut self, id: AirlockId) -> Result<AirlockSite> {
        let mut site = self
            .sites
            .remove(&id)
            .ok_or(AirlockError::UnknownAirlock(id))?;
        site.airlock.decommission();
        self.buckets.forget(id);
        log::info!("{} decommissioned {}", self.name, site.airlock.name());
        Ok(site)
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn best_egress_airlock(
        &self,
        layout: &dyn SettlementLayout,
        from: StructureId,
        at: LocalPosition,
    ) -> Option<AirlockId> {
        selector::best_egress_airlock(&self.sites, &self.buckets, layout, from, at)
    }

    pub fn best_ingress_airlock(
        &self,
        layout: &dyn SettlementLayout,
        at: LocalPosition,
    ) -> Option<AirlockId> {
        selector::best_ingress_airlock(&self.sites, &self.buckets, layout, at)
    }

    pub fn best_scored_airlock(
        &self,
        layout: &dyn SettlementLayout,
        from: StructureId,
        at: LocalPosition,
        is_ingress: bool,
    ) -> Option<AirlockId> {
        selector::best_scored_airlock(&self.sites, layout, from, at, is_ingress)
    }

    pub fn scored_airlocks(
        &self,
        layout: &dyn SettlementLayout,
        from: StructureId,
        at: LocalPosition,
        is_ingress: bool,
    ) -> Vec<ScoredAirlock> {
        selector::scored_airlocks(&self.sites, layout, from, at, is_ingress)
    }

    /// Whether someone in `structure` can walk to any usable airlock.
    pub fn has_walkable_available_airlock(
        &self,
        layout: &dyn SettlementLayout,
        structure: StructureId,
    ) -> bool {
        self.best_egress_airlock(layout, structure, LocalPosition::ORIGIN)
            .is_some()
    }

    /// Frozen occupancy of every airlock, in ascending id order.
    pub fn snapshots(&self) -> Vec<(AirlockId, OccupancySnapshot)> {
        self.sites
            .iter()
            .map(|(&id, s)| (id, s.airlock.occupancy_snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Roster;
    use crate::airlock::Direction;
    use crate::clock::Millisol;
    use crate::config::AirlockSpec;
    use crate::layout::ConnectorGraph;
    use crate::pressure::AirlockState;

    fn spec() -> SettlementSpec {
        SettlementSpec {
            name: "Alpha".into(),
            airlocks: vec![
                AirlockSpec {
                    id: 1,
                    name: "Hab Airlock".into(),
                    capacity: 2,
                    structure: StructureId(10),
                    position: LocalPosition::new(5.0, 0.0),
                    ..Default::default()
                },
                AirlockSpec {
                    id: 2,
                    name: "Garage Airlock".into(),
                    capacity: 4,
                    structure: StructureId(20),
                    position: LocalPosition::new(-20.0, 0.0),
                    ..Default::default()
                },
            ],
            connections: vec![(StructureId(10), StructureId(20))],
            astronomy: vec![],
        }
    }

    #[test]
    fn from_spec_builds_and_buckets() {
        let s = SettlementAirlocks::from_spec(&spec()).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.buckets().pressurized().count(), 2);
        assert_eq!(s.airlock(AirlockId(2)).unwrap().capacity(), 4);
    }

    #[test]
    fn from_spec_rejects_errors() {
        let mut bad = spec();
        bad.airlocks[1].id = 1;
        let err = SettlementAirlocks::from_spec(&bad).unwrap_err();
        assert!(matches!(err, AirlockError::InvalidSpec(_)));
    }

    #[test]
    fn duplicate_site_rejected() {
        let mut s = SettlementAirlocks::from_spec(&spec()).unwrap();
        let again = Airlock::from_spec(&spec().airlocks[0]).unwrap();
        assert_eq!(
            s.add_site(again, StructureId(10), LocalPosition::ORIGIN),
            Err(AirlockError::DuplicateAirlock(AirlockId(1)))
        );
    }

    #[test]
    fn rebucket_runs_on_new_millisol_only() {
        let reg = Roster::new();
        let mut s = SettlementAirlocks::from_spec(&spec()).unwrap();
        s.airlock_mut(AirlockId(1)).unwrap().request_cycle(Direction::Ingress);

        s.time_passing(&ClockPulse::new(20.0, Millisol::new(3), false), &reg);
        assert_eq!(
            s.airlock(AirlockId(1)).unwrap().state(),
            AirlockState::Depressurized
        );
        assert_eq!(s.buckets().depressurized().count(), 0, "not rebucketed yet");

        s.time_passing(&ClockPulse::new(0.1, Millisol::new(4), true), &reg);
        assert_eq!(s.buckets().depressurized().collect::<Vec<_>>(), vec![AirlockId(1)]);
    }

    #[test]
    fn remove_agent_sweeps_every_airlock() {
        let mut s = SettlementAirlocks::from_spec(&spec()).unwrap();
        s.airlock_mut(AirlockId(1)).unwrap().join_inner_queue(AgentId(5));
        s.airlock_mut(AirlockId(2))
            .unwrap()
            .add_reservation(AgentId(5), Millisol::new(0));
        assert_eq!(s.airlock_of(AgentId(5)), Some(AirlockId(1)));
        assert_eq!(s.remove_agent(AgentId(5)), 2);
        assert_eq!(s.airlock_of(AgentId(5)), None);
        assert_eq!(s.remove_agent(AgentId(5)), 0);
    }

    #[test]
    fn decommission_removes_site_and_bucket() {
        let mut s = SettlementAirlocks::from_spec(&spec()).unwrap();
        s.airlock_mut(AirlockId(1)).unwrap().join_outer_queue(AgentId(3));
        let site = s.decommission(AirlockId(1)).unwrap();
        assert_eq!(site.airlock.occupancy_snapshot().total(), 0);
        assert!(!s.buckets().contains(AirlockId(1)));
        assert!(s.airlock(AirlockId(1)).is_none());
        assert_eq!(
            s.decommission(AirlockId(1)).unwrap_err(),
            AirlockError::UnknownAirlock(AirlockId(1))
        );
    }

    #[test]
    fn walkable_availability_follows_layout() {
        let s = SettlementAirlocks::from_spec(&spec()).unwrap();
        let graph = spec().layout();
        assert!(s.has_walkable_available_airlock(&graph, StructureId(10)));
        assert!(!s.has_walkable_available_airlock(&graph, StructureId(99)));
        assert!(!s.has_walkable_available_airlock(&ConnectorGraph::new(), StructureId(30)));
    }

    #[test]
    fn selection_delegates_to_selector() {
        let s = SettlementAirlocks::from_spec(&spec()).unwrap();
        let graph = spec().layout();
        let at = LocalPosition::new(4.0, 0.0);
        assert_eq!(
            s.best_egress_airlock(&graph, StructureId(20), at),
            Some(AirlockId(1))
        );
        // Nothing is depressurized, so ingress falls through to tier 3.
        assert_eq!(s.best_ingress_airlock(&graph, at), Some(AirlockId(1)));
        // Two extra free slots outweigh the distance bonus.
        assert_eq!(
            s.best_scored_airlock(&graph, StructureId(10), at, false),
            Some(AirlockId(2))
        );
        assert_eq!(s.scored_airlocks(&graph, StructureId(10), at, false).len(), 2);
    }
}
