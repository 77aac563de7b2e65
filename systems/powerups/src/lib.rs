#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pickup drops and the power-up effects they grant.
//!
//! The system places pickups on random floor tiles at a fixed interval and
//! activates whichever one the player walks over. One-shot effects go out as
//! world commands; timed effects are tracked here and surfaced to the other
//! systems through read-only queries: stunned agents for the behaviour
//! system, a [`SprayBoost`] for the sprayer.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use splashground_core::{AgentId, Command, DespawnReason, Event, GridCoord, Position};
use splashground_system_spraying::SprayBoost;
use splashground_world::query::{AgentView, ArenaView};

/// How long a single-target stun holds its victim.
const STUN_SINGLE_DURATION: Duration = Duration::from_secs(3);
/// How long an arena-wide stun holds every agent.
const STUN_ALL_DURATION: Duration = Duration::from_secs(5);
/// Lifetime of the rapid-fire boost.
const RAPID_FIRE_DURATION: Duration = Duration::from_secs(10);
/// Factor the fire interval is divided by while rapid fire is active.
const RAPID_FIRE_RATE: f32 = 4.5;
/// Lifetime of the infinite-ammo boost.
const INFINITE_AMMO_DURATION: Duration = Duration::from_secs(8);
/// Lifetime of the widened-spray boost.
const WIDE_SPRAY_DURATION: Duration = Duration::from_secs(12);
/// Factor the spray radius is scaled by while the wide boost is active.
const WIDE_SPRAY_RADIUS: f32 = 2.0;
/// Radius of the one-shot cleansing wave centred on the player.
const CLEANSE_WAVE_RADIUS: f32 = 50.0;
/// Tile draws a spawn deadline makes before giving up for the tick.
const PLACEMENT_ATTEMPTS: u32 = 20;

/// Every effect a pickup can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Stuns the agent nearest the player for three seconds.
    StunSingle,
    /// Stuns every live agent for five seconds.
    StunAll,
    /// Fires four and a half times as fast for ten seconds.
    RapidFire,
    /// Shoots without spending ammo for eight seconds.
    InfiniteAmmo,
    /// Doubles the spray radius for twelve seconds.
    WideSpray,
    /// Steps every unhealthy tile around the player down one level.
    CleanseWave,
    /// Removes every live agent outright.
    DestroyAll,
}

/// One row of the weighted pickup table.
#[derive(Clone, Copy, Debug)]
pub struct PickupEntry {
    kind: PowerUpKind,
    weight: f32,
}

impl PickupEntry {
    /// Creates a table row pairing a pickup kind with its relative weight.
    #[must_use]
    pub const fn new(kind: PowerUpKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Configuration parameters required to construct the power-up system.
#[derive(Clone, Debug)]
pub struct Config {
    /// Time between pickup drop attempts.
    pub spawn_interval: Duration,
    /// Most pickups waiting on the floor at once.
    pub max_active_pickups: usize,
    /// Distance at which the player collects a pickup.
    pub pickup_radius: f32,
    /// Seed for the placement and selection stream.
    pub rng_seed: u64,
    /// Weighted table the drop kind is chosen from.
    pub entries: Vec<PickupEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_secs(15),
            max_active_pickups: 3,
            pickup_radius: 0.5,
            rng_seed: 0,
            entries: vec![
                PickupEntry::new(PowerUpKind::StunSingle, 15.0),
                PickupEntry::new(PowerUpKind::StunAll, 5.0),
                PickupEntry::new(PowerUpKind::RapidFire, 25.0),
                PickupEntry::new(PowerUpKind::InfiniteAmmo, 15.0),
                PickupEntry::new(PowerUpKind::WideSpray, 20.0),
                PickupEntry::new(PowerUpKind::CleanseWave, 8.0),
                PickupEntry::new(PowerUpKind::DestroyAll, 2.0),
            ],
        }
    }
}

/// A pickup waiting on the floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pickup {
    /// Effect granted on collection.
    pub kind: PowerUpKind,
    /// Tile centre the pickup sits on.
    pub position: Position,
}

/// Pure system that drops pickups and tracks the effects they grant.
#[derive(Debug)]
pub struct PowerUps {
    config: Config,
    clock: Duration,
    next_spawn: Duration,
    rng: ChaCha8Rng,
    pickups: Vec<Pickup>,
    stuns: BTreeMap<AgentId, Duration>,
    rapid_fire_until: Option<Duration>,
    infinite_ammo_until: Option<Duration>,
    wide_spray_until: Option<Duration>,
}

impl PowerUps {
    /// Creates a new power-up system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            clock: Duration::ZERO,
            next_spawn: config.spawn_interval,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            pickups: Vec::new(),
            stuns: BTreeMap::new(),
            rapid_fire_until: None,
            infinite_ammo_until: None,
            wide_spray_until: None,
            config,
        }
    }

    /// Pickups currently waiting on the floor.
    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Agents currently held by a stun, in id order.
    #[must_use]
    pub fn stunned_agents(&self) -> Vec<AgentId> {
        self.stuns.keys().copied().collect()
    }

    /// Shooter modifiers in force this tick.
    #[must_use]
    pub fn spray_boost(&self) -> SprayBoost {
        SprayBoost {
            rate_multiplier: if self.rapid_fire_until.is_some() {
                RAPID_FIRE_RATE
            } else {
                1.0
            },
            radius_multiplier: if self.wide_spray_until.is_some() {
                WIDE_SPRAY_RADIUS
            } else {
                1.0
            },
            infinite_ammo: self.infinite_ammo_until.is_some(),
        }
    }

    /// Consumes events and the player position, dropping pickups and
    /// activating the ones the player reaches.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: &ArenaView<'_>,
        agents: &AgentView,
        player: Position,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::AgentDespawned { agent, .. } => {
                    let _ = self.stuns.remove(agent);
                }
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }
        self.clock = self.clock.saturating_add(accumulated);

        self.expire_effects();
        self.drop_due_pickup(view);
        self.collect_pickups(agents, player, out);
    }

    fn expire_effects(&mut self) {
        let clock = self.clock;
        self.stuns.retain(|_, until| *until > clock);
        for until in [
            &mut self.rapid_fire_until,
            &mut self.infinite_ammo_until,
            &mut self.wide_spray_until,
        ] {
            if until.is_some_and(|at| at <= clock) {
                *until = None;
            }
        }
    }

    fn drop_due_pickup(&mut self, view: &ArenaView<'_>) {
        if self.clock < self.next_spawn || self.pickups.len() >= self.config.max_active_pickups {
            return;
        }
        self.next_spawn = self.clock + self.config.spawn_interval;

        if view.columns() == 0 || view.rows() == 0 {
            return;
        }
        let Some(kind) = choose_pickup(&self.config.entries, &mut self.rng) else {
            return;
        };
        for _ in 0..PLACEMENT_ATTEMPTS {
            let cell = GridCoord::new(
                self.rng.gen_range(0..view.columns() as i32),
                self.rng.gen_range(0..view.rows() as i32),
            );
            if !view.is_present(cell) {
                continue;
            }
            let position = view.center_of(cell);
            if self.pickups.iter().any(|pickup| pickup.position == position) {
                continue;
            }
            self.pickups.push(Pickup { kind, position });
            return;
        }
    }

    fn collect_pickups(&mut self, agents: &AgentView, player: Position, out: &mut Vec<Command>) {
        let mut index = 0;
        while index < self.pickups.len() {
            if self.pickups[index].position.distance(player) > self.config.pickup_radius {
                index += 1;
                continue;
            }
            let pickup = self.pickups.swap_remove(index);
            self.activate(pickup.kind, agents, player, out);
        }
    }

    fn activate(
        &mut self,
        kind: PowerUpKind,
        agents: &AgentView,
        player: Position,
        out: &mut Vec<Command>,
    ) {
        match kind {
            PowerUpKind::StunSingle => {
                if let Some(id) = nearest_agent(agents, player) {
                    let _ = self.stuns.insert(id, self.clock + STUN_SINGLE_DURATION);
                }
            }
            PowerUpKind::StunAll => {
                for snapshot in agents.iter() {
                    let _ = self
                        .stuns
                        .insert(snapshot.id, self.clock + STUN_ALL_DURATION);
                }
            }
            // A timed boost collected while the same boost is running is a
            // dud: the running effect keeps its original deadline.
            PowerUpKind::RapidFire => {
                if self.rapid_fire_until.is_none() {
                    self.rapid_fire_until = Some(self.clock + RAPID_FIRE_DURATION);
                }
            }
            PowerUpKind::InfiniteAmmo => {
                if self.infinite_ammo_until.is_none() {
                    self.infinite_ammo_until = Some(self.clock + INFINITE_AMMO_DURATION);
                }
            }
            PowerUpKind::WideSpray => {
                if self.wide_spray_until.is_none() {
                    self.wide_spray_until = Some(self.clock + WIDE_SPRAY_DURATION);
                }
            }
            PowerUpKind::CleanseWave => {
                out.push(Command::CleanseArea {
                    center: player,
                    radius: CLEANSE_WAVE_RADIUS,
                });
            }
            PowerUpKind::DestroyAll => {
                for snapshot in agents.iter() {
                    out.push(Command::DespawnAgent {
                        agent: snapshot.id,
                        reason: DespawnReason::Destroyed,
                    });
                }
            }
        }
    }
}

/// Draws one kind from the weighted table; entries with non-positive weight
/// never win. Returns `None` when the whole table carries no weight.
fn choose_pickup(entries: &[PickupEntry], rng: &mut ChaCha8Rng) -> Option<PowerUpKind> {
    let total: f32 = entries.iter().map(|entry| entry.weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.gen_range(0.0..total);
    for entry in entries {
        let weight = entry.weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        if roll < weight {
            return Some(entry.kind);
        }
        roll -= weight;
    }
    entries
        .iter()
        .rev()
        .find(|entry| entry.weight > 0.0)
        .map(|entry| entry.kind)
}

fn nearest_agent(agents: &AgentView, player: Position) -> Option<AgentId> {
    agents
        .iter()
        .min_by(|a, b| {
            a.position
                .distance(player)
                .partial_cmp(&b.position.distance(player))
                .unwrap_or(Ordering::Equal)
        })
        .map(|snapshot| snapshot.id)
}
