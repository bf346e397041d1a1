//! Property tests: invariants that must hold under arbitrary traffic.

use airlock_logic::agents::{AgentId, EvaSkill, Roster};
use airlock_logic::clock::{ClockPulse, Millisol};
use airlock_logic::constants::{MAX_RESERVED, RESERVATION_PERIOD};
use airlock_logic::layout::LocalPosition;
use airlock_logic::pressure::AirlockState;
use airlock_logic::reservation::ReservationRegistry;
use airlock_logic::{Airlock, AirlockId, Direction};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    JoinInner(u32),
    JoinOuter(u32),
    Enter(u32, bool),
    Exit(u32, bool),
    Cycle(bool),
    Tick(u32),
    Remove(u32),
}

fn op() -> impl Strategy<Value = Op> {
    let agent = 0u32..8;
    prop_oneof![
        agent.clone().prop_map(Op::JoinInner),
        agent.clone().prop_map(Op::JoinOuter),
        (agent.clone(), any::<bool>()).prop_map(|(a, i)| Op::Enter(a, i)),
        (agent.clone(), any::<bool>()).prop_map(|(a, i)| Op::Exit(a, i)),
        any::<bool>().prop_map(Op::Cycle),
        (1u32..15).prop_map(Op::Tick),
        agent.prop_map(Op::Remove),
    ]
}

fn direction(ingress: bool) -> Direction {
    if ingress {
        Direction::Ingress
    } else {
        Direction::Egress
    }
}

fn check_doors(lock: &Airlock) -> Result<(), TestCaseError> {
    match lock.state() {
        AirlockState::Pressurized => {
            prop_assert!(!lock.inner_door_locked() && lock.outer_door_locked())
        }
        AirlockState::Depressurized => {
            prop_assert!(lock.inner_door_locked() && !lock.outer_door_locked())
        }
        AirlockState::Off => prop_assert!(lock.inner_door_locked() && lock.outer_door_locked()),
        AirlockState::Pressurizing | AirlockState::Depressurizing => {}
    }
    Ok(())
}

proptest! {
    /// Property: the chamber never holds more than its capacity, the
    /// operator is always someone present, and door locks always match the
    /// steady state.
    #[test]
    fn prop_traffic_respects_invariants(
        capacity in 1u32..=4,
        ops in prop::collection::vec(op(), 1..120)
    ) {
        let mut registry = Roster::new();
        for id in 0..8 {
            registry.insert(AgentId(id), EvaSkill::new(id % 3, id * 7));
        }
        let mut lock = Airlock::building(
            AirlockId(1),
            "Prop Airlock",
            capacity,
            LocalPosition::new(0.0, 0.0),
            LocalPosition::new(3.0, 0.0),
        )
        .unwrap();
        let mut now = 0u32;

        for op in ops {
            match op {
                Op::JoinInner(a) => { lock.join_inner_queue(AgentId(a)); }
                Op::JoinOuter(a) => { lock.join_outer_queue(AgentId(a)); }
                Op::Enter(a, i) => { lock.try_enter(AgentId(a), direction(i)); }
                Op::Exit(a, i) => { lock.try_exit(AgentId(a), direction(i)); }
                Op::Cycle(i) => lock.request_cycle(direction(i)),
                Op::Tick(n) => {
                    for _ in 0..n {
                        now += 1;
                        let pulse = ClockPulse::new(1.0, Millisol::new(now), true);
                        lock.time_passing(&pulse, &registry);
                    }
                }
                Op::Remove(a) => { lock.remove_agent(AgentId(a)); }
            }

            prop_assert!(lock.num_occupants() <= capacity as usize);
            prop_assert!(lock.num_inside() <= lock.num_occupants());
            if let Some(op) = lock.operator() {
                prop_assert!(lock.is_in_any_zone(op));
            }
            check_doors(&lock)?;
        }
    }

    /// Property: no more than MAX_RESERVED agents ever hold a reservation.
    #[test]
    fn prop_reservations_bounded(
        requests in prop::collection::vec((0u32..20, 0u32..3000), 1..200)
    ) {
        let mut reg = ReservationRegistry::new();
        for (agent, t) in requests {
            let now = Millisol::new(t);
            let was_full = reg.is_full();
            let known = reg.stamp(AgentId(agent)).is_some();
            let accepted = reg.add_reservation(AgentId(agent), now);
            prop_assert_eq!(accepted, known || !was_full);
            prop_assert!(reg.len() <= MAX_RESERVED);
            reg.purge_expired(now);
        }
    }

    /// Property: a fresh reservation is live for exactly RESERVATION_PERIOD
    /// millisols, across the sol boundary.
    #[test]
    fn prop_reservation_window(start in 0u32..1000, age in 0u32..200) {
        let mut reg = ReservationRegistry::new();
        reg.add_reservation(AgentId(1), Millisol::new(start));
        let later = Millisol::new(start).plus(age);
        prop_assert_eq!(
            reg.has_reservation(AgentId(1), later),
            age <= RESERVATION_PERIOD
        );
    }
}
