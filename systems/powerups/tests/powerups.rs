use std::time::Duration;

use splashground_core::{
    AgentId, AgentKind, Command, DespawnReason, Event, Heading, LevelDefinition, Position,
};
use splashground_system_powerups::{Config, PickupEntry, PowerUpKind, PowerUps};
use splashground_world::{apply, query, World};

const FAR_AWAY: Position = Position::new(-1.0e6, -1.0e6);

fn open_world(size: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureArena {
            level: LevelDefinition::open(size, size).expect("valid level"),
        },
        &mut events,
    );
    world
}

fn spawn_agent(world: &mut World, position: Position) -> AgentId {
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnAgent {
            kind: AgentKind::Wanderer,
            position,
            heading: Heading::EAST,
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::AgentSpawned { agent, .. } => Some(*agent),
            _ => None,
        })
        .expect("spawn accepted")
}

fn advance(powerups: &mut PowerUps, world: &World, player: Position, dt: Duration) -> Vec<Command> {
    let events = vec![Event::TimeAdvanced { dt }];
    let mut out = Vec::new();
    powerups.handle(
        &events,
        &query::arena_view(world),
        &query::agent_view(world),
        player,
        &mut out,
    );
    out
}

/// A table holding a single kind, dropped every second.
fn single_kind_config(kind: PowerUpKind) -> Config {
    Config {
        spawn_interval: Duration::from_secs(1),
        pickup_radius: 1_000.0,
        entries: vec![PickupEntry::new(kind, 1.0)],
        rng_seed: 3,
        ..Config::default()
    }
}

#[test]
fn pickups_drop_on_the_interval_up_to_the_cap() {
    let world = open_world(10);
    let mut powerups = PowerUps::new(Config {
        spawn_interval: Duration::from_secs(1),
        max_active_pickups: 3,
        rng_seed: 1,
        ..Config::default()
    });

    for _ in 0..3 {
        let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_secs(1));
    }
    assert_eq!(powerups.pickups().len(), 3);

    // At the cap: further deadlines drop nothing.
    for _ in 0..5 {
        let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_secs(1));
    }
    assert_eq!(powerups.pickups().len(), 3);

    for pickup in powerups.pickups() {
        let view = query::arena_view(&world);
        assert!(view.is_present(view.coord_of(pickup.position)));
    }
}

#[test]
fn cleanse_wave_fires_centred_on_the_player() {
    let world = open_world(10);
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::CleanseWave));

    let commands = advance(&mut powerups, &world, player, Duration::from_secs(1));
    let wave = commands
        .iter()
        .find_map(|command| match command {
            Command::CleanseArea { center, radius } => Some((*center, *radius)),
            _ => None,
        })
        .expect("collected wave emitted no cleanse");
    assert_eq!(wave.0, player);
    assert!(wave.1 >= 50.0);
    assert!(powerups.pickups().is_empty(), "collected pickup lingered");
}

#[test]
fn destroy_all_despawns_every_live_agent() {
    let mut world = open_world(10);
    let first = spawn_agent(&mut world, Position::new(1.0, 1.0));
    let second = spawn_agent(&mut world, Position::new(8.0, 8.0));
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::DestroyAll));

    let commands = advance(&mut powerups, &world, player, Duration::from_secs(1));
    let mut despawned: Vec<AgentId> = commands
        .iter()
        .filter_map(|command| match command {
            Command::DespawnAgent {
                agent,
                reason: DespawnReason::Destroyed,
            } => Some(*agent),
            _ => None,
        })
        .collect();
    despawned.sort();
    assert_eq!(despawned, vec![first, second]);
}

#[test]
fn stun_all_holds_every_agent_until_it_expires() {
    let mut world = open_world(10);
    let first = spawn_agent(&mut world, Position::new(1.0, 1.0));
    let second = spawn_agent(&mut world, Position::new(8.0, 8.0));
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::StunAll));

    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));
    assert_eq!(powerups.stunned_agents(), vec![first, second]);

    // The stun holds for five seconds from activation. Keep the player out
    // of reach so later drops are not collected on top of it.
    let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_millis(4_900));
    assert_eq!(powerups.stunned_agents().len(), 2);
    let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_millis(200));
    assert!(powerups.stunned_agents().is_empty(), "stun never lifted");
}

#[test]
fn stun_single_picks_the_agent_nearest_the_player() {
    let mut world = open_world(10);
    let player = Position::new(1.0, 1.0);
    let near = spawn_agent(&mut world, Position::new(2.0, 1.0));
    let _far = spawn_agent(&mut world, Position::new(8.0, 8.0));
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::StunSingle));

    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));
    assert_eq!(powerups.stunned_agents(), vec![near]);
}

#[test]
fn despawned_agents_shed_their_stun() {
    let mut world = open_world(10);
    let agent = spawn_agent(&mut world, Position::new(1.0, 1.0));
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::StunAll));

    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));
    assert_eq!(powerups.stunned_agents(), vec![agent]);

    let events = vec![
        Event::AgentDespawned {
            agent,
            kind: AgentKind::Wanderer,
            reason: DespawnReason::LifetimeExpired,
        },
        Event::TimeAdvanced {
            dt: Duration::from_millis(100),
        },
    ];
    powerups.handle(
        &events,
        &query::arena_view(&world),
        &query::agent_view(&world),
        FAR_AWAY,
        &mut Vec::new(),
    );
    assert!(powerups.stunned_agents().is_empty());
}

#[test]
fn rapid_fire_boost_applies_and_expires() {
    let world = open_world(10);
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::RapidFire));

    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));
    let boost = powerups.spray_boost();
    assert!((boost.rate_multiplier - 4.5).abs() < f32::EPSILON);
    assert!(!boost.infinite_ammo);

    let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_secs(11));
    let lapsed = powerups.spray_boost();
    assert!((lapsed.rate_multiplier - 1.0).abs() < f32::EPSILON);
}

#[test]
fn running_boosts_are_not_refreshed_by_a_second_pickup() {
    let world = open_world(10);
    let player = query::arena_view(&world).center();
    let mut powerups = PowerUps::new(single_kind_config(PowerUpKind::RapidFire));

    // First drop collected at t=1 s: the boost runs until t=11 s.
    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));
    // Second drop collected at t=2 s lands on the running boost.
    let _ = advance(&mut powerups, &world, player, Duration::from_secs(1));

    // At t=11 s the original deadline holds; a refresh would reach 12 s.
    let _ = advance(&mut powerups, &world, FAR_AWAY, Duration::from_secs(9));
    assert!(
        (powerups.spray_boost().rate_multiplier - 1.0).abs() < f32::EPSILON,
        "second pickup extended the running boost"
    );
}

#[test]
fn wide_spray_and_infinite_ammo_surface_in_the_boost() {
    let world = open_world(10);
    let player = query::arena_view(&world).center();

    let mut wide = PowerUps::new(single_kind_config(PowerUpKind::WideSpray));
    let _ = advance(&mut wide, &world, player, Duration::from_secs(1));
    assert!((wide.spray_boost().radius_multiplier - 2.0).abs() < f32::EPSILON);

    let mut ammo = PowerUps::new(single_kind_config(PowerUpKind::InfiniteAmmo));
    let _ = advance(&mut ammo, &world, player, Duration::from_secs(1));
    assert!(ammo.spray_boost().infinite_ammo);
}
