#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-archetype agent behaviour: movement, contamination cadence, and the
//! stuck detector.
//!
//! The system keeps a small behaviour record per live agent and reacts to
//! the world's event stream; it never mutates state directly, it only emits
//! `MoveAgent`, `ContaminateFrom`, and `DespawnAgent` commands.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use splashground_core::{
    AgentId, AgentKind, Command, DespawnReason, Event, GridCoord, Heading, Position,
};
use splashground_world::query::{AgentSnapshot, AgentView, ArenaView};

/// Window inside which sharp turns count toward the stuck verdict.
const STUCK_WINDOW: Duration = Duration::from_secs(1);
/// Number of sharp turns within the window that marks an agent stuck.
const STUCK_TURN_LIMIT: usize = 4;
/// Smallest heading change, in degrees, that registers as a sharp turn.
const STUCK_MIN_ANGLE_DEGREES: f32 = 60.0;
/// Time after spawning during which the stuck detector stays quiet.
const SPAWN_GRACE: Duration = Duration::from_millis(500);
/// Distance kept between a teleport destination and the arena edge.
const TELEPORT_EDGE_PADDING: f32 = 1.0;

/// Configuration parameters required to construct the agents system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that drives every live agent's behaviour.
#[derive(Debug)]
pub struct Agents {
    clock: Duration,
    rng: ChaCha8Rng,
    states: BTreeMap<AgentId, BehaviourState>,
}

#[derive(Clone, Debug)]
struct BehaviourState {
    spawned_at: Duration,
    saved_heading: Option<Heading>,
    turn_times: Vec<Duration>,
    next_teleport: Option<Duration>,
}

impl BehaviourState {
    fn new(kind: AgentKind, clock: Duration) -> Self {
        Self {
            spawned_at: clock,
            saved_heading: None,
            turn_times: Vec::new(),
            next_teleport: kind.teleport_interval().map(|interval| clock + interval),
        }
    }
}

impl Agents {
    /// Creates a new agents system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            clock: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            states: BTreeMap::new(),
        }
    }

    /// Consumes events and read-only views to emit behaviour commands.
    ///
    /// Agents listed in `stunned` sit the tick out: no movement and no
    /// contamination until the stun lifts.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: &ArenaView<'_>,
        agents: &AgentView,
        stunned: &[AgentId],
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::AgentSpawned { agent, kind, .. } => {
                    let _ = self
                        .states
                        .insert(*agent, BehaviourState::new(*kind, self.clock));
                }
                Event::AgentDespawned { agent, .. } => {
                    let _ = self.states.remove(agent);
                }
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }
        self.clock = self.clock.saturating_add(accumulated);

        for snapshot in agents.iter() {
            if stunned.contains(&snapshot.id) {
                continue;
            }
            let clock = self.clock;
            // Agents that predate this system get a fresh record.
            let state = self
                .states
                .entry(snapshot.id)
                .or_insert_with(|| BehaviourState::new(snapshot.kind, clock));
            let mut state = state.clone();

            match snapshot.kind {
                AgentKind::Wanderer => {
                    wander(self.clock, accumulated, view, snapshot, &mut state, out);
                }
                AgentKind::Teleporter => {
                    teleport(self.clock, view, snapshot, &mut state, &mut self.rng, out);
                }
                AgentKind::Rooter => {
                    root_walk(accumulated, view, snapshot, out);
                }
            }

            if snapshot.ready_to_act {
                out.push(Command::ContaminateFrom { agent: snapshot.id });
            }
            let _ = self.states.insert(snapshot.id, state);
        }
    }
}

/// Straight-line walker that hugs the floor.
///
/// When no present tile lies one cell ahead it turns clockwise up to three
/// times looking for one, reverses as a last resort, and resumes its saved
/// heading as soon as that direction becomes passable again. Four sharp
/// turns inside one second mark it stuck.
fn wander(
    clock: Duration,
    dt: Duration,
    view: &ArenaView<'_>,
    snapshot: &AgentSnapshot,
    state: &mut BehaviourState,
    out: &mut Vec<Command>,
) {
    let mut heading = snapshot.heading;

    if let Some(saved) = state.saved_heading {
        if tile_ahead(view, snapshot.position, saved) {
            register_turn(state, clock, heading, saved);
            heading = saved;
            state.saved_heading = None;
        }
    }

    if !tile_ahead(view, snapshot.position, heading) {
        let original = heading;
        let mut candidate = heading;
        let mut found = false;
        for _ in 0..3 {
            candidate = candidate.rotated_quarter();
            if tile_ahead(view, snapshot.position, candidate) {
                found = true;
                break;
            }
        }
        if !found {
            candidate = heading.reversed();
        }
        if state.saved_heading.is_none() {
            state.saved_heading = Some(original);
        }
        register_turn(state, clock, heading, candidate);
        heading = candidate;
    }

    if is_stuck(state, clock) {
        out.push(Command::DespawnAgent {
            agent: snapshot.id,
            reason: DespawnReason::Stuck,
        });
        state.turn_times.clear();
        return;
    }

    let step = snapshot.kind.move_speed() * dt.as_secs_f32();
    out.push(Command::MoveAgent {
        agent: snapshot.id,
        position: snapshot.position.stepped(heading, step),
        heading,
    });
}

/// Stationary archetype that relocates to a random padded in-bounds
/// position every teleport interval.
fn teleport(
    clock: Duration,
    view: &ArenaView<'_>,
    snapshot: &AgentSnapshot,
    state: &mut BehaviourState,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    let Some(interval) = snapshot.kind.teleport_interval() else {
        return;
    };
    let Some(due) = state.next_teleport else {
        return;
    };
    if clock < due {
        return;
    }
    state.next_teleport = Some(due + interval);

    out.push(Command::MoveAgent {
        agent: snapshot.id,
        position: random_padded_position(view, rng),
        heading: snapshot.heading,
    });
}

/// Slow walker that keeps its heading and hops over holes in the floor.
fn root_walk(
    dt: Duration,
    view: &ArenaView<'_>,
    snapshot: &AgentSnapshot,
    out: &mut Vec<Command>,
) {
    let heading = snapshot.heading;

    if !view.is_present(view.coord_of(snapshot.position)) {
        if let Some(cell) = next_present_cell(view, snapshot.position, heading) {
            out.push(Command::MoveAgent {
                agent: snapshot.id,
                position: view.center_of(cell),
                heading,
            });
            return;
        }
        // Nothing left along this heading; keep walking until the world
        // culls the agent as out of bounds.
    }

    let step = snapshot.kind.move_speed() * dt.as_secs_f32();
    out.push(Command::MoveAgent {
        agent: snapshot.id,
        position: snapshot.position.stepped(heading, step),
        heading,
    });
}

fn tile_ahead(view: &ArenaView<'_>, position: Position, heading: Heading) -> bool {
    let probe = position.stepped(heading, view.cell_size());
    view.is_present(view.coord_of(probe))
}

fn register_turn(state: &mut BehaviourState, clock: Duration, from: Heading, to: Heading) {
    if from.angle_to(to) >= STUCK_MIN_ANGLE_DEGREES {
        state.turn_times.push(clock);
    }
    let cutoff = clock.saturating_sub(STUCK_WINDOW);
    state.turn_times.retain(|&at| at >= cutoff);
}

fn is_stuck(state: &BehaviourState, clock: Duration) -> bool {
    clock.saturating_sub(state.spawned_at) >= SPAWN_GRACE
        && state.turn_times.len() >= STUCK_TURN_LIMIT
}

fn random_padded_position(view: &ArenaView<'_>, rng: &mut ChaCha8Rng) -> Position {
    let max_x = (view.columns().saturating_sub(1)) as f32 * view.cell_size();
    let max_z = (view.rows().saturating_sub(1)) as f32 * view.cell_size();
    Position::new(
        sample_axis(max_x, rng),
        sample_axis(max_z, rng),
    )
}

fn sample_axis(max: f32, rng: &mut ChaCha8Rng) -> f32 {
    let low = TELEPORT_EDGE_PADDING;
    let high = max - TELEPORT_EDGE_PADDING;
    if high > low {
        rng.gen_range(low..high)
    } else {
        max / 2.0
    }
}

/// Walks cell by cell along the heading's dominant axis, returning the
/// first present cell within one grid diameter.
fn next_present_cell(
    view: &ArenaView<'_>,
    position: Position,
    heading: Heading,
) -> Option<GridCoord> {
    let step_x = if heading.x().abs() >= heading.z().abs() && heading.x() != 0.0 {
        heading.x().signum() as i32
    } else {
        0
    };
    let step_z = if heading.z().abs() > heading.x().abs() {
        heading.z().signum() as i32
    } else {
        0
    };
    if step_x == 0 && step_z == 0 {
        return None;
    }

    let mut cell = view.coord_of(position);
    let limit = view.columns().max(view.rows());
    for _ in 0..limit {
        cell = GridCoord::new(cell.x() + step_x, cell.z() + step_z);
        if view.is_present(cell) {
            return Some(cell);
        }
    }
    None
}
