use std::time::Duration;

use splashground_core::{
    AgentKind, Command, DespawnReason, GridCoord, Heading, LevelDefinition, Position,
};
use splashground_system_agents::{Agents, Config};
use splashground_world::{apply, query, World};

const DT: Duration = Duration::from_millis(100);

fn world_from_codes(width: u32, height: u32, codes: &[u8]) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureArena {
            level: LevelDefinition::from_codes(width, height, codes).expect("valid codes"),
        },
        &mut events,
    );
    world
}

fn spawn(world: &mut World, system: &mut Agents, kind: AgentKind, position: Position, heading: Heading) {
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnAgent {
            kind,
            position,
            heading,
        },
        &mut events,
    );
    // Let the system learn about the new agent without advancing time.
    system.handle(
        &events,
        &query::arena_view(world),
        &query::agent_view(world),
        &[],
        &mut Vec::new(),
    );
}

/// Runs one tick, feeds the system, applies its commands, and returns them.
fn pump(world: &mut World, system: &mut Agents, dt: Duration) -> Vec<Command> {
    let mut events = Vec::new();
    apply(world, Command::Tick { dt }, &mut events);

    let mut commands = Vec::new();
    system.handle(
        &events,
        &query::arena_view(world),
        &query::agent_view(world),
        &[],
        &mut commands,
    );
    let mut follow_up = Vec::new();
    for command in commands.clone() {
        apply(world, command, &mut follow_up);
    }
    // Deliver follow-up events (despawns, contamination) without advancing time.
    system.handle(
        &follow_up,
        &query::arena_view(world),
        &query::agent_view(world),
        &[],
        &mut Vec::new(),
    );
    commands
}

fn moves_of(commands: &[Command]) -> Vec<(Position, Heading)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::MoveAgent {
                position, heading, ..
            } => Some((*position, *heading)),
            _ => None,
        })
        .collect()
}

#[test]
fn wanderer_walks_straight_over_open_floor() {
    let mut world = world_from_codes(5, 5, &[1; 25]);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(1.0, 2.0),
        Heading::EAST,
    );

    let commands = pump(&mut world, &mut system, DT);
    let moves = moves_of(&commands);
    assert_eq!(moves.len(), 1);
    let (position, heading) = moves[0];
    assert_eq!(heading, Heading::EAST);
    // Speed 3 over 100 ms.
    assert!((position.x() - 1.3).abs() < 1e-4);
    assert!((position.z() - 2.0).abs() < 1e-4);
}

#[test]
fn wanderer_turns_clockwise_at_a_missing_tile() {
    let mut world = world_from_codes(3, 3, &[1; 9]);
    let mut system = Agents::new(Config::new(1));
    // Facing the east edge from the last column: nothing ahead.
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(2.0, 1.0),
        Heading::EAST,
    );

    let commands = pump(&mut world, &mut system, DT);
    let moves = moves_of(&commands);
    assert_eq!(moves.len(), 1);
    let (_, heading) = moves[0];
    // One clockwise quarter turn from east.
    assert_eq!(heading, Heading::SOUTH);
}

#[test]
fn wanderer_resumes_its_saved_heading_past_the_gap() {
    // Row z=1 has a hole at x=2; row z=0 is solid.
    let codes = [
        1, 1, 1, 1, //
        1, 1, 0, 1, //
        1, 1, 1, 1, //
    ];
    let mut world = world_from_codes(4, 3, &codes);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(1.0, 1.0),
        Heading::EAST,
    );

    let mut resumed_east = false;
    for _ in 0..12 {
        let commands = pump(&mut world, &mut system, DT);
        for (position, heading) in moves_of(&commands) {
            if heading == Heading::EAST && position.z() < 0.9 {
                resumed_east = true;
            }
        }
    }
    assert!(resumed_east, "never resumed the saved eastward heading");
}

#[test]
fn boxed_in_wanderer_despawns_as_stuck() {
    let mut world = world_from_codes(1, 1, &[1]);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(0.0, 0.0),
        Heading::EAST,
    );

    let mut stuck = false;
    for _ in 0..20 {
        let commands = pump(&mut world, &mut system, DT);
        if commands.iter().any(|command| {
            matches!(
                command,
                Command::DespawnAgent {
                    reason: DespawnReason::Stuck,
                    ..
                }
            )
        }) {
            stuck = true;
            break;
        }
    }
    assert!(stuck, "boxed-in wanderer never reported itself stuck");
    assert_eq!(query::active_agent_count(&world), 0);
}

#[test]
fn teleporter_relocates_only_on_its_interval() {
    let mut world = world_from_codes(10, 10, &[1; 100]);
    let mut system = Agents::new(Config::new(7));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Teleporter,
        Position::new(4.0, 4.0),
        Heading::EAST,
    );

    let mut relocations = Vec::new();
    for tick in 1..=52 {
        let commands = pump(&mut world, &mut system, DT);
        for (position, _) in moves_of(&commands) {
            relocations.push((tick, position));
        }
    }

    assert_eq!(relocations.len(), 1, "expected exactly one teleport in 5.2 s");
    let (tick, position) = relocations[0];
    assert_eq!(tick, 50, "teleport fired off its 5 s deadline");
    assert!(position.x() >= 1.0 && position.x() <= 8.0);
    assert!(position.z() >= 1.0 && position.z() <= 8.0);
}

#[test]
fn rooter_hops_to_the_next_present_tile() {
    let mut world = world_from_codes(5, 1, &[1, 0, 0, 1, 1]);
    let mut system = Agents::new(Config::new(3));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Rooter,
        Position::new(0.0, 0.0),
        Heading::EAST,
    );

    let mut hopped = false;
    for _ in 0..10 {
        let commands = pump(&mut world, &mut system, DT);
        for (position, _) in moves_of(&commands) {
            if (position.x() - 3.0).abs() < 1e-4 && position.z().abs() < 1e-4 {
                hopped = true;
            }
        }
    }
    assert!(hopped, "rooter never hopped over the gap");
}

#[test]
fn ready_agents_request_contamination() {
    let mut world = world_from_codes(5, 5, &[1; 25]);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(2.0, 2.0),
        Heading::EAST,
    );

    // 100 ms matches the contamination interval exactly.
    let commands = pump(&mut world, &mut system, DT);
    assert!(commands
        .iter()
        .any(|command| matches!(command, Command::ContaminateFrom { .. })));

    let view = query::arena_view(&world);
    assert_ne!(
        view.state(GridCoord::new(2, 2)),
        Some(splashground_core::TileState::Healthy)
    );
}

#[test]
fn stunned_agents_neither_move_nor_contaminate() {
    let mut world = world_from_codes(5, 5, &[1; 25]);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(2.0, 2.0),
        Heading::EAST,
    );
    let id = query::agent_view(&world)
        .iter()
        .next()
        .expect("one live agent")
        .id;

    let mut events = Vec::new();
    apply(&mut world, Command::Tick { dt: DT }, &mut events);
    let mut commands = Vec::new();
    system.handle(
        &events,
        &query::arena_view(&world),
        &query::agent_view(&world),
        &[id],
        &mut commands,
    );
    assert!(commands.is_empty(), "stunned agent still acted: {commands:?}");
}

#[test]
fn contamination_cadence_respects_the_interval() {
    let mut world = world_from_codes(5, 5, &[1; 25]);
    let mut system = Agents::new(Config::new(1));
    spawn(
        &mut world,
        &mut system,
        AgentKind::Wanderer,
        Position::new(2.0, 2.0),
        Heading::EAST,
    );

    let half = Duration::from_millis(50);
    let commands = pump(&mut world, &mut system, half);
    assert!(
        !commands
            .iter()
            .any(|command| matches!(command, Command::ContaminateFrom { .. })),
        "contaminated before the interval accrued"
    );
}
