//! Airlock Headless Simulation Harness
//!
//! Loads a settlement layout, drives crews out through the airlocks and
//! back in, and checks the arbitration invariants on every tick.
//! Runs entirely in-process with a hand-driven clock.
//!
//! Usage:
//!   cargo run -p airlock-simtest
//!   cargo run -p airlock-simtest -- --verbose

use airlock_logic::agents::{AgentId, AgentRegistry, EvaSkill, Roster};
use airlock_logic::chamber::ChamberKind;
use airlock_logic::clock::{ClockPulse, Millisol};
use airlock_logic::config::{has_errors, validate_settlement, SettlementSpec};
use airlock_logic::layout::{ConnectorGraph, LocalPosition, StructureId};
use airlock_logic::pressure::AirlockState;
use airlock_logic::{Airlock, AirlockId, Direction, SettlementAirlocks};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

// ── Settlement layout ───────────────────────────────────────────────────
const LAYOUT_JSON: &str = include_str!("../../../data/settlement_layout.json");

#[derive(Debug, Deserialize)]
struct Scenario {
    settlement: SettlementSpec,
    home: StructureId,
    crew: Vec<CrewSpec>,
}

#[derive(Debug, Deserialize)]
struct CrewSpec {
    id: u32,
    level: u32,
    experience: u32,
    #[serde(default = "suited_by_default")]
    suited: bool,
}

fn suited_by_default() -> bool {
    true
}

impl Scenario {
    fn roster(&self) -> Roster {
        let mut roster = Roster::new();
        for c in &self.crew {
            let id = AgentId(c.id);
            roster.insert(id, EvaSkill::new(c.level, c.experience));
            roster.set_suited(id, c.suited);
        }
        roster
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Airlock Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Layout parse and validation
    let scenario = match load_scenario(&mut results) {
        Some(s) => s,
        None => {
            report(&results, verbose);
            return;
        }
    };

    // 2. Pressure cycles per chamber kind
    results.extend(validate_pressure_cycles(&scenario, verbose));

    // 3. Airlock selection
    results.extend(validate_selection(&scenario, verbose));

    // 4. Crew traffic out and back in
    results.extend(validate_crew_traffic(&scenario, verbose));

    // 5. Operator election
    results.extend(validate_operator_election(&scenario, verbose));

    // 6. Reservations across the sol boundary
    results.extend(validate_reservations(verbose));

    // 7. Randomized stress
    results.extend(validate_random_traffic(&scenario, verbose));

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn load_scenario(results: &mut Vec<TestResult>) -> Option<Scenario> {
    println!("--- Settlement Layout ---");

    let scenario: Scenario = match serde_json::from_str(LAYOUT_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "layout_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    let issues = validate_settlement(&scenario.settlement);
    results.push(TestResult {
        name: "layout_valid".into(),
        passed: !has_errors(&issues),
        detail: format!(
            "{} airlocks, {} issues",
            scenario.settlement.airlocks.len(),
            issues.len()
        ),
    });

    let built = SettlementAirlocks::from_spec(&scenario.settlement);
    results.push(TestResult {
        name: "layout_builds".into(),
        passed: built.is_ok(),
        detail: match &built {
            Ok(s) => format!("{} sites in {}", s.len(), s.name()),
            Err(e) => e.to_string(),
        },
    });

    let crew_known = scenario.crew.len() == scenario.roster().len();
    results.push(TestResult {
        name: "crew_unique".into(),
        passed: crew_known,
        detail: format!("{} crew", scenario.crew.len()),
    });

    Some(scenario)
}

// ── 2. Pressure cycles ──────────────────────────────────────────────────

fn validate_pressure_cycles(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Pressure Cycles ---");
    let mut results = Vec::new();

    for spec in &scenario.settlement.airlocks {
        let mut airlock = match Airlock::from_spec(spec) {
            Ok(a) => a,
            Err(e) => {
                results.push(TestResult {
                    name: format!("cycle_build_{}", spec.id),
                    passed: false,
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let expected = spec.kind.cycle_time();
        let mut ticks = 0;
        airlock.request_cycle(Direction::Egress);
        while airlock.advance(1.0).is_none() && ticks < 100 {
            ticks += 1;
        }
        ticks += 1;
        let doors_ok = airlock.inner_door_locked() && !airlock.outer_door_locked();

        if verbose {
            println!("  {} ({:?}): depressurized in {} ticks", spec.name, spec.kind, ticks);
        }
        results.push(TestResult {
            name: format!("cycle_time_{}", spec.id),
            passed: ticks as f64 == expected && airlock.is_depressurized() && doors_ok,
            detail: format!("{} ticks, expected {}", ticks, expected),
        });
    }

    let kinds_differ = ChamberKind::Vehicle.cycle_time() < ChamberKind::Building.cycle_time();
    results.push(TestResult {
        name: "vehicle_cycles_faster".into(),
        passed: kinds_differ,
        detail: format!(
            "vehicle {} vs building {}",
            ChamberKind::Vehicle.cycle_time(),
            ChamberKind::Building.cycle_time()
        ),
    });

    results
}

// ── 3. Selection ────────────────────────────────────────────────────────

fn validate_selection(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Airlock Selection ---");
    let mut results = Vec::new();
    let graph = scenario.settlement.layout();
    let Ok(settlement) = SettlementAirlocks::from_spec(&scenario.settlement) else {
        return results;
    };

    let egress = settlement.best_egress_airlock(&graph, scenario.home, LocalPosition::ORIGIN);
    let picked_site = egress.and_then(|id| settlement.site(id));
    let not_observatory = picked_site.is_some_and(|s| !scenario.settlement.astronomy.contains(&s.structure));
    results.push(TestResult {
        name: "egress_skips_observatory".into(),
        passed: not_observatory,
        detail: format!("picked {:?}", egress),
    });

    let rover = scenario
        .settlement
        .airlocks
        .iter()
        .find(|a| a.kind == ChamberKind::Vehicle);
    let rover_unreachable = rover.map_or(true, |r| egress != Some(AirlockId(r.id)));
    results.push(TestResult {
        name: "egress_needs_walkable_path".into(),
        passed: rover_unreachable,
        detail: "detached rover never offered for egress".into(),
    });

    let table = settlement.scored_airlocks(&graph, scenario.home, LocalPosition::ORIGIN, false);
    if verbose {
        for row in &table {
            println!("  score {}: {} at {:.1} m", row.id, row.score, row.distance);
        }
    }
    let best = settlement.best_scored_airlock(&graph, scenario.home, LocalPosition::ORIGIN, false);
    let top = table.iter().map(|r| r.score).max();
    let best_is_top = match (best, top) {
        (Some(id), Some(score)) => table
            .iter()
            .find(|r| r.score == score)
            .is_some_and(|r| r.id == id),
        (None, None) => true,
        _ => false,
    };
    results.push(TestResult {
        name: "scored_pick_is_first_top_score".into(),
        passed: best_is_top && !table.is_empty(),
        detail: format!("{} scored, best {:?}", table.len(), best),
    });

    let lonely = StructureId(u32::MAX);
    results.push(TestResult {
        name: "isolated_structure_has_no_airlock".into(),
        passed: !settlement.has_walkable_available_airlock(&graph, lonely),
        detail: "no connector, no airlock".into(),
    });

    results
}

// ── 4. Crew traffic ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Waiting,
    Queued(AirlockId),
    Inside(AirlockId),
    Through,
}

struct Traveller {
    id: AgentId,
    direction: Direction,
    phase: Phase,
}

#[derive(Default)]
struct TrafficReport {
    ticks: u32,
    through: usize,
    capacity_breaches: usize,
    absent_operators: usize,
    door_mismatches: usize,
}

fn validate_crew_traffic(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Crew Traffic ---");
    let mut results = Vec::new();
    let graph = scenario.settlement.layout();
    let roster = scenario.roster();
    let Ok(mut settlement) = SettlementAirlocks::from_spec(&scenario.settlement) else {
        return results;
    };

    let (suited, unsuited): (Vec<AgentId>, Vec<AgentId>) = scenario
        .crew
        .iter()
        .map(|c| AgentId(c.id))
        .partition(|&id| roster.has_eva_suit(id));

    // Nobody goes out without a suit; the airlock counts the failed checks.
    if let Some(id) = settlement.best_egress_airlock(&graph, scenario.home, LocalPosition::ORIGIN) {
        if let Some(airlock) = settlement.airlock_mut(id) {
            for _ in &unsuited {
                airlock.add_check_eva_suit();
            }
            results.push(TestResult {
                name: "unsuited_crew_held_back".into(),
                passed: airlock.eva_suit_check_count() as usize == unsuited.len(),
                detail: format!("{} without suits", unsuited.len()),
            });
            airlock.reset_check_eva_suit();
        }
    }

    let mut crew: Vec<Traveller> = suited
        .iter()
        .map(|&id| Traveller {
            id,
            direction: Direction::Egress,
            phase: Phase::Waiting,
        })
        .collect();

    let out = drive(&mut settlement, &graph, &roster, scenario.home, &mut crew, 0, 600);
    if verbose {
        println!("  egress: {} through in {} ticks", out.through, out.ticks);
    }
    push_traffic_results(&mut results, "egress", &out, crew.len());

    for t in &mut crew {
        t.direction = Direction::Ingress;
        t.phase = Phase::Waiting;
    }
    let back = drive(&mut settlement, &graph, &roster, scenario.home, &mut crew, out.ticks, 600);
    if verbose {
        println!("  ingress: {} through in {} ticks", back.through, back.ticks - out.ticks);
    }
    push_traffic_results(&mut results, "ingress", &back, crew.len());

    let idle = settlement.snapshots().iter().all(|(_, snap)| snap.total() == 0);
    results.push(TestResult {
        name: "airlocks_empty_after_traffic".into(),
        passed: idle,
        detail: "no one left queued or inside".into(),
    });

    results
}

fn push_traffic_results(
    results: &mut Vec<TestResult>,
    label: &str,
    report: &TrafficReport,
    crew: usize,
) {
    results.push(TestResult {
        name: format!("{}_completes", label),
        passed: report.through == crew,
        detail: format!("{}/{} through by tick {}", report.through, crew, report.ticks),
    });
    results.push(TestResult {
        name: format!("{}_capacity_respected", label),
        passed: report.capacity_breaches == 0,
        detail: format!("{} breaches", report.capacity_breaches),
    });
    results.push(TestResult {
        name: format!("{}_operator_present", label),
        passed: report.absent_operators == 0,
        detail: format!("{} ticks with an absent operator", report.absent_operators),
    });
    results.push(TestResult {
        name: format!("{}_door_locks_consistent", label),
        passed: report.door_mismatches == 0,
        detail: format!("{} mismatches", report.door_mismatches),
    });
}

/// Steady state a traveller leaves the chamber in.
fn exit_state(direction: Direction) -> AirlockState {
    match direction {
        Direction::Egress => AirlockState::Depressurized,
        Direction::Ingress => AirlockState::Pressurized,
    }
}

fn drive(
    settlement: &mut SettlementAirlocks,
    graph: &ConnectorGraph,
    roster: &Roster,
    home: StructureId,
    crew: &mut [Traveller],
    start: u32,
    budget: u32,
) -> TrafficReport {
    let outside = LocalPosition::new(15.0, 0.0);
    let mut report = TrafficReport {
        ticks: start,
        ..Default::default()
    };

    for _ in 0..budget {
        if crew.iter().all(|t| t.phase == Phase::Through) {
            break;
        }
        report.ticks += 1;
        let now = Millisol::new(report.ticks);

        for t in crew.iter_mut() {
            t.phase = step_traveller(settlement, graph, home, outside, t, now);
        }
        for id in settlement.ids().collect::<Vec<_>>() {
            if let Some(airlock) = settlement.airlock_mut(id) {
                control_cycle(airlock);
            }
        }

        let pulse = ClockPulse::new(1.0, now, true);
        settlement.time_passing(&pulse, roster);

        for (_, site) in settlement.sites() {
            let a = &site.airlock;
            if a.num_occupants() > a.capacity() as usize {
                report.capacity_breaches += 1;
            }
            if a.operator().is_some_and(|op| !a.is_in_any_zone(op)) {
                report.absent_operators += 1;
            }
            let doors_ok = match a.state() {
                AirlockState::Pressurized => !a.inner_door_locked() && a.outer_door_locked(),
                AirlockState::Depressurized => a.inner_door_locked() && !a.outer_door_locked(),
                AirlockState::Off => a.inner_door_locked() && a.outer_door_locked(),
                _ => true,
            };
            if !doors_ok {
                report.door_mismatches += 1;
            }
        }
    }

    report.through = crew.iter().filter(|t| t.phase == Phase::Through).count();
    report
}

fn step_traveller(
    settlement: &mut SettlementAirlocks,
    graph: &ConnectorGraph,
    home: StructureId,
    outside: LocalPosition,
    t: &Traveller,
    now: Millisol,
) -> Phase {
    match t.phase {
        Phase::Waiting => {
            let pick = match t.direction {
                Direction::Egress => settlement.best_egress_airlock(graph, home, LocalPosition::ORIGIN),
                Direction::Ingress => settlement.best_ingress_airlock(graph, outside),
            };
            let Some(id) = pick else {
                return Phase::Waiting;
            };
            let Some(airlock) = settlement.airlock_mut(id) else {
                return Phase::Waiting;
            };
            let joined = match t.direction {
                Direction::Egress => {
                    airlock.add_reservation(t.id, now);
                    airlock.join_inner_queue(t.id)
                }
                Direction::Ingress => airlock.join_outer_queue(t.id),
            };
            if joined {
                Phase::Queued(id)
            } else {
                Phase::Waiting
            }
        }
        Phase::Queued(id) => match settlement.airlock_mut(id) {
            Some(airlock) => {
                if airlock.try_enter(t.id, t.direction) {
                    Phase::Inside(id)
                } else {
                    t.phase
                }
            }
            None => t.phase,
        },
        Phase::Inside(id) => match settlement.airlock_mut(id) {
            Some(airlock) if airlock.state() == exit_state(t.direction) => {
                airlock.try_exit(t.id, t.direction);
                airlock.remove_reservation(t.id);
                Phase::Through
            }
            _ => t.phase,
        },
        Phase::Through => Phase::Through,
    }
}

/// Cycle once the open side has nobody left to let in, or the chamber is
/// full. An empty chamber cycles toward whoever waits at the locked door.
fn control_cycle(airlock: &mut Airlock) {
    if airlock.is_activated() {
        return;
    }
    let (open_queue, locked_queue, toward_open, toward_locked) = match airlock.state() {
        AirlockState::Pressurized => (
            airlock.num_awaiting_inner_door(),
            airlock.num_awaiting_outer_door(),
            Direction::Egress,
            Direction::Ingress,
        ),
        AirlockState::Depressurized => (
            airlock.num_awaiting_outer_door(),
            airlock.num_awaiting_inner_door(),
            Direction::Ingress,
            Direction::Egress,
        ),
        _ => return,
    };

    if !airlock.is_empty() {
        if open_queue == 0 || airlock.is_full() {
            airlock.request_cycle(toward_open);
        }
    } else if open_queue == 0 && locked_queue > 0 {
        airlock.request_cycle(toward_locked);
    }
}

// ── 5. Operator election ────────────────────────────────────────────────

fn validate_operator_election(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Operator Election ---");
    let mut results = Vec::new();
    let roster = scenario.roster();

    // Two crew on the same level: the more experienced one runs the cycle.
    let mut tied: Vec<&CrewSpec> = Vec::new();
    for a in &scenario.crew {
        if let Some(b) = scenario
            .crew
            .iter()
            .find(|b| b.id != a.id && b.level == a.level && b.experience != a.experience)
        {
            tied = vec![a, b];
            break;
        }
    }
    if tied.len() < 2 {
        return results;
    }
    let expected = tied
        .iter()
        .max_by_key(|c| c.experience)
        .map(|c| AgentId(c.id));

    let mut elected = Vec::new();
    for order in [[0, 1], [1, 0]] {
        let Ok(mut airlock) = Airlock::building(
            AirlockId(99),
            "Election Airlock",
            4,
            LocalPosition::new(0.0, 0.0),
            LocalPosition::new(3.0, 0.0),
        ) else {
            continue;
        };
        for i in order {
            let id = AgentId(tied[i].id);
            airlock.join_inner_queue(id);
            airlock.try_enter(id, Direction::Egress);
        }
        elected.push(airlock.check_operator(&roster));
        let again = airlock.check_operator(&roster);
        results.push(TestResult {
            name: format!("election_idempotent_{}{}", order[0], order[1]),
            passed: again == elected[elected.len() - 1],
            detail: format!("{:?}", again),
        });
    }

    if verbose {
        println!("  tie between {} and {}: {:?}", tied[0].id, tied[1].id, elected);
    }
    results.push(TestResult {
        name: "election_experience_breaks_tie".into(),
        passed: elected.iter().all(|e| *e == expected),
        detail: format!("expected {:?}, got {:?}", expected, elected),
    });

    results
}

// ── 6. Reservations ─────────────────────────────────────────────────────

fn validate_reservations(verbose: bool) -> Vec<TestResult> {
    println!("--- Reservations ---");
    let mut results = Vec::new();
    let Ok(mut airlock) = Airlock::building(
        AirlockId(98),
        "Reservation Airlock",
        4,
        LocalPosition::new(0.0, 0.0),
        LocalPosition::new(3.0, 0.0),
    ) else {
        return results;
    };

    let made = Millisol::new(990);
    airlock.add_reservation(AgentId(1), made);
    let live = airlock.has_reservation(AgentId(1), made.plus(30));
    let expired = !airlock.has_reservation(AgentId(1), made.plus(45));
    if verbose {
        println!("  990 -> 20 live: {}, 990 -> 35 expired: {}", live, expired);
    }
    results.push(TestResult {
        name: "reservation_wraps_sol".into(),
        passed: live && expired && airlock.reservations().is_empty(),
        detail: "made at 990, live at 20, gone at 35".into(),
    });

    let accepted = (0..5)
        .filter(|&i| airlock.add_reservation(AgentId(10 + i), Millisol::new(100)))
        .count();
    results.push(TestResult {
        name: "reservation_bound".into(),
        passed: accepted == 4 && airlock.is_reservation_full(),
        detail: format!("{} of 5 accepted", accepted),
    });

    results
}

// ── 7. Randomized stress ────────────────────────────────────────────────

fn validate_random_traffic(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Random Traffic ---");
    let mut results = Vec::new();
    let roster = scenario.roster();
    let Ok(mut settlement) = SettlementAirlocks::from_spec(&scenario.settlement) else {
        return results;
    };
    let ids: Vec<AirlockId> = settlement.ids().collect();
    let mut rng = StdRng::seed_from_u64(42);
    let mut breaches = 0;
    let mut absent = 0;
    let steps = 5_000;
    let mut clock = 0.0_f64;

    for _ in 0..steps {
        let id = ids[rng.gen_range(0..ids.len())];
        let agent = AgentId(rng.gen_range(1..=12));
        let direction = if rng.gen_bool(0.5) {
            Direction::Ingress
        } else {
            Direction::Egress
        };
        let action = rng.gen_range(0..7);
        if action == 6 {
            settlement.remove_agent(agent);
        } else if let Some(airlock) = settlement.airlock_mut(id) {
            match action {
                0 => {
                    airlock.join_inner_queue(agent);
                }
                1 => {
                    airlock.join_outer_queue(agent);
                }
                2 | 3 => {
                    airlock.try_enter(agent, direction);
                }
                4 => {
                    airlock.try_exit(agent, direction);
                }
                _ => airlock.request_cycle(direction),
            }
        }

        let pulse = ClockPulse::after(clock, 0.5);
        clock = (clock + 0.5) % 1000.0;
        settlement.time_passing(&pulse, &roster);

        for (_, site) in settlement.sites() {
            let a = &site.airlock;
            if a.num_occupants() > a.capacity() as usize {
                breaches += 1;
            }
            if a.operator().is_some_and(|op| !a.is_in_any_zone(op)) {
                absent += 1;
            }
        }
    }

    if verbose {
        for (id, snap) in settlement.snapshots() {
            println!(
                "  {}: {} | inner {} chamber {} outer {} | operator {:?}",
                id,
                snap.state,
                snap.inner_queue.len(),
                snap.chamber.len(),
                snap.outer_queue.len(),
                snap.operator
            );
        }
    }

    results.push(TestResult {
        name: "random_capacity_respected".into(),
        passed: breaches == 0,
        detail: format!("{} steps, {} breaches", steps, breaches),
    });
    results.push(TestResult {
        name: "random_operator_present".into(),
        passed: absent == 0,
        detail: format!("{} absent operators", absent),
    });

    results
}
