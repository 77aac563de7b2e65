#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Splashground session.
//!
//! Builds an arena from CLI flags or a level file, wires the world to the
//! spawning, agents, spraying, power-up, and session systems, and pumps the
//! command/event loop at a fixed tick until the session verdict lands. The
//! sprayer is driven by a simple automatic aimer that targets the
//! contaminated tile closest to the arena centre; the player stands at the
//! centre and collects whatever pickups drop within reach.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use splashground_core::{Command, Event, LevelDefinition, SessionOutcome};
use splashground_system_agents::{Agents, Config as AgentsConfig};
use splashground_system_powerups::{Config as PowerUpsConfig, PowerUps};
use splashground_system_session::{Config as SessionConfig, Session};
use splashground_system_spawning::{Config as SpawningConfig, Spawning};
use splashground_system_spraying::{Config as SprayingConfig, SprayRequest, Spraying};
use splashground_world::{apply, level, query, World};

const TICK: Duration = Duration::from_millis(100);
const STATUS_EVERY: Duration = Duration::from_secs(10);

/// Headless Splashground session runner.
#[derive(Debug, Parser)]
#[command(name = "splashground")]
struct Args {
    /// Number of arena columns when no level file is given.
    #[arg(long, default_value_t = 20)]
    columns: u32,
    /// Number of arena rows when no level file is given.
    #[arg(long, default_value_t = 20)]
    rows: u32,
    /// Arena silhouette when no level file is given.
    #[arg(long, value_enum, default_value = "square")]
    shape: Shape,
    /// Level file encoded as `{"width", "height", "tiles": [codes]}`.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Seed shared by every random stream in the run.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Session length in seconds.
    #[arg(long, default_value_t = 120)]
    duration: u64,
    /// Health percentage below which the session is lost.
    #[arg(long, default_value_t = 80.0)]
    min_health: f32,
}

/// Built-in arena silhouettes.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    /// Every cell holds a floor tile.
    Square,
    /// Floor tiles form a disc inscribed in the grid.
    Circle,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let definition = load_level(&args)?;

    let mut world = World::new();
    println!("{}", query::welcome_banner(&world));

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureArena { level: definition },
        &mut events,
    );
    for event in &events {
        if let Event::ArenaRejected { reason } = event {
            bail!("arena rejected: {reason}");
        }
    }

    let view = query::arena_view(&world);
    println!(
        "arena {}x{}, health {:.1}%",
        view.columns(),
        view.rows(),
        query::health_percentage(&world)
    );

    let mut spawning = Spawning::new(SpawningConfig {
        rng_seed: args.seed,
        ..SpawningConfig::default()
    });
    let mut agents = Agents::new(AgentsConfig::new(args.seed.wrapping_add(1)));
    let mut spraying = Spraying::new(SprayingConfig::default());
    let mut powerups = PowerUps::new(PowerUpsConfig {
        rng_seed: args.seed.wrapping_add(2),
        // The headless player never moves, so pickups anywhere on the
        // floor count as collected.
        pickup_radius: f32::MAX,
        ..PowerUpsConfig::default()
    });
    let mut session = Session::new(SessionConfig::new(
        Duration::from_secs(args.duration),
        args.min_health,
    ));

    let mut outcome = None;
    let mut next_status = STATUS_EVERY;
    // The session system ends the run at the configured duration; the guard
    // only bounds the loop if that ever fails to happen.
    let max_ticks = (args.duration + 10) * 10;

    for _ in 0..max_ticks {
        let mut pending = Vec::new();
        apply(&mut world, Command::Tick { dt: TICK }, &mut pending);

        while !pending.is_empty() {
            let player = query::arena_view(&world).center();
            let mut commands = Vec::new();
            spawning.handle(&pending, &query::arena_view(&world), &mut commands);
            powerups.handle(
                &pending,
                &query::arena_view(&world),
                &query::agent_view(&world),
                player,
                &mut commands,
            );
            agents.handle(
                &pending,
                &query::arena_view(&world),
                &query::agent_view(&world),
                &powerups.stunned_agents(),
                &mut commands,
            );
            spraying.handle(
                &pending,
                auto_aim(&world),
                powerups.spray_boost(),
                &mut commands,
            );
            session.handle(&pending, query::health_percentage(&world), &mut commands);

            let mut next_events = Vec::new();
            for command in commands {
                apply(&mut world, command, &mut next_events);
            }
            for event in &next_events {
                if let Event::SessionEnded { outcome: verdict } = event {
                    outcome = Some(*verdict);
                }
            }
            pending = next_events;
        }

        if query::session_over(&world) {
            break;
        }
        if query::clock(&world) >= next_status {
            println!(
                "t={:>4}s health {:>5.1}% agents {:>3}",
                query::clock(&world).as_secs(),
                query::health_percentage(&world),
                query::active_agent_count(&world)
            );
            next_status += STATUS_EVERY;
        }
    }

    let Some(outcome) = outcome else {
        bail!("session never reached a verdict");
    };
    report(outcome);
    Ok(())
}

fn load_level(args: &Args) -> anyhow::Result<LevelDefinition> {
    if let Some(path) = &args.level {
        let payload = fs::read_to_string(path)
            .with_context(|| format!("reading level file {}", path.display()))?;
        let definition = level::from_json(&payload)
            .with_context(|| format!("decoding level file {}", path.display()))?;
        return Ok(definition);
    }

    let definition = match args.shape {
        Shape::Square => LevelDefinition::open(args.columns, args.rows),
        Shape::Circle => LevelDefinition::circle(args.columns, args.rows),
    }
    .context("building the arena definition")?;
    Ok(definition)
}

/// Aims the sprayer at the contaminated tile closest to the arena centre.
fn auto_aim(world: &World) -> Option<SprayRequest> {
    let view = query::arena_view(world);
    let origin = view.center();
    view.iter_states()
        .filter(|(_, state)| !state.is_healthy())
        .map(|(coord, _)| view.center_of(coord))
        .min_by(|a, b| {
            a.distance(origin)
                .partial_cmp(&b.distance(origin))
                .unwrap_or(Ordering::Equal)
        })
        .map(|target| SprayRequest { origin, target })
}

fn report(outcome: SessionOutcome) {
    let (verdict, stats) = match &outcome {
        SessionOutcome::Victory(stats) => ("victory", stats),
        SessionOutcome::Defeat(stats) => ("defeat", stats),
    };
    println!("result: {verdict}");
    println!("  elapsed        {:>6}s", stats.elapsed.as_secs());
    println!("  final health   {:>6.1}%", stats.final_health);
    println!("  lowest health  {:>6.1}%", stats.lowest_health);
    println!("  tiles cleansed {:>6}", stats.tiles_cleansed);
}
