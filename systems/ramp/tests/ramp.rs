use std::time::Duration;

use lane_defence_core::{Command, Event, RampIndex, SessionConfig};
use lane_defence_system_ramp::{Config, RampController};
use lane_defence_world::{self as world, query, World};

fn tick(world: &mut World, controller: &mut RampController, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);

    let mut commands = Vec::new();
    controller.handle(&events, &mut commands);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn ramp_advances_follow_the_session_thresholds() {
    let session = SessionConfig::default();
    let mut world = World::new(session.clone()).expect("default config is valid");
    let mut controller = RampController::new(Config::from_session(&session));

    let events = tick(&mut world, &mut controller, Duration::from_secs(44));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::RampAdvanced { .. })),
        "no advance before the first threshold",
    );
    assert_eq!(query::ramp_index(&world), RampIndex::new(0));

    let events = tick(&mut world, &mut controller, Duration::from_secs(1));
    assert!(events.contains(&Event::RampAdvanced {
        index: RampIndex::new(1),
    }));
    assert_eq!(query::ramp_index(&world), RampIndex::new(1));

    let events = tick(&mut world, &mut controller, Duration::from_secs(60));
    assert!(events.contains(&Event::RampAdvanced {
        index: RampIndex::new(2),
    }));
    assert_eq!(query::ramp_index(&world), RampIndex::new(2));
}

#[test]
fn one_large_delta_crosses_several_thresholds_at_once() {
    let session = SessionConfig::default();
    let mut world = World::new(session.clone()).expect("default config is valid");
    let mut controller = RampController::new(Config::from_session(&session));

    let events = tick(&mut world, &mut controller, Duration::from_secs(600));
    let advances: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::RampAdvanced { .. }))
        .collect();
    assert_eq!(advances.len(), 1, "a single advance lands on the final tier");
    assert_eq!(query::ramp_index(&world), RampIndex::new(2));
}

#[test]
fn quiet_ticks_emit_no_commands() {
    let session = SessionConfig::default();
    let mut controller = RampController::new(Config::from_session(&session));
    let mut commands = Vec::new();
    controller.handle(&[], &mut commands);
    assert!(commands.is_empty());
}
