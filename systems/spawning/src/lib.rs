#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting agent spawn commands.
//!
//! Two cadences run side by side: frequent small waves whose members are
//! spread across the wave interval, and rare big waves released as a rapid
//! burst. Every scheduled spawn becomes a pending attempt with a due time;
//! attempts blocked by the active-agent cap are pushed back by a short
//! backoff rather than dropped.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use splashground_core::{AgentKind, Command, Event, GridCoord, Heading, Position};
use splashground_world::query::ArenaView;

/// Delay before the very first small wave fires.
const FIRST_WAVE_WARMUP: Duration = Duration::from_secs(1);

/// Smallest retry delay honoured for capacity-blocked attempts. A zero
/// backoff would re-queue an attempt at the current clock and spin the
/// release loop forever.
const MIN_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Weighted entry of the archetype selection table.
#[derive(Clone, Copy, Debug)]
pub struct ArchetypeEntry {
    /// Archetype this entry can produce.
    pub kind: AgentKind,
    /// Relative selection weight; entries at or below zero never spawn.
    pub weight: f32,
}

impl ArchetypeEntry {
    /// Creates a new weighted table entry.
    #[must_use]
    pub const fn new(kind: AgentKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Arena edge the scheduler places spawns along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpawnPattern {
    /// Cells in the first column; agents head east into the arena.
    LeftEdge,
    /// Cells in the last column; agents head west into the arena.
    RightEdge,
    /// Cells in the last row; agents head south into the arena.
    TopEdge,
    /// Cells in the first row; agents head north into the arena.
    BottomEdge,
    /// Any boundary cell; agents head toward the arena centre.
    #[default]
    RandomEdge,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    /// Time between consecutive small waves.
    pub small_wave_interval: Duration,
    /// Smallest number of agents a small wave may contain.
    pub small_wave_min: u32,
    /// Largest number of agents a small wave may contain; at least the minimum.
    pub small_wave_max: u32,
    /// Time between consecutive big waves; the first fires after one interval.
    pub big_wave_interval: Duration,
    /// Number of agents released by every big wave.
    pub big_wave_count: u32,
    /// Spacing between consecutive spawns inside a big-wave burst.
    pub big_wave_burst_delay: Duration,
    /// Edge placement pattern for every spawn.
    pub pattern: SpawnPattern,
    /// Distance past the half-cell offset that spawns start outside the edge.
    pub edge_padding: f32,
    /// Upper bound on simultaneously active agents.
    pub max_active: usize,
    /// Delay before a capacity-blocked attempt is retried.
    pub retry_backoff: Duration,
    /// Seed for the scheduler's random stream.
    pub rng_seed: u64,
    /// Weighted archetype selection table.
    pub archetypes: Vec<ArchetypeEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            small_wave_interval: Duration::from_secs(5),
            small_wave_min: 1,
            small_wave_max: 2,
            big_wave_interval: Duration::from_secs(30),
            big_wave_count: 10,
            big_wave_burst_delay: Duration::from_millis(250),
            pattern: SpawnPattern::RandomEdge,
            edge_padding: 0.6,
            max_active: 50,
            retry_backoff: Duration::from_millis(250),
            rng_seed: 0,
            archetypes: vec![
                ArchetypeEntry::new(AgentKind::Wanderer, 3.0),
                ArchetypeEntry::new(AgentKind::Teleporter, 1.0),
                ArchetypeEntry::new(AgentKind::Rooter, 1.0),
            ],
        }
    }
}

/// Pure system that deterministically emits agent spawn commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    clock: Duration,
    next_small_wave: Duration,
    next_big_wave: Duration,
    pending: Vec<Duration>,
    active: usize,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(mut config: Config) -> Self {
        config.retry_backoff = config.retry_backoff.max(MIN_RETRY_BACKOFF);
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            clock: Duration::ZERO,
            next_small_wave: FIRST_WAVE_WARMUP,
            next_big_wave: config.big_wave_interval,
            pending: Vec::new(),
            active: 0,
            rng,
            config,
        }
    }

    /// Consumes events and the arena view to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], view: &ArenaView<'_>, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::AgentDespawned { .. } => {
                    self.active = self.active.saturating_sub(1);
                }
                _ => {}
            }
        }

        if accumulated.is_zero() && self.pending.is_empty() {
            return;
        }
        self.clock = self.clock.saturating_add(accumulated);

        self.schedule_small_waves();
        self.schedule_big_waves();
        self.release_due_attempts(view, out);
    }

    fn schedule_small_waves(&mut self) {
        if self.config.small_wave_interval.is_zero() {
            return;
        }
        while self.clock >= self.next_small_wave {
            let count = self.roll_small_wave_count();
            if count > 0 {
                let spacing = self.config.small_wave_interval / count;
                for slot in 0..count {
                    self.pending.push(self.next_small_wave + spacing * slot);
                }
            }
            self.next_small_wave += self.config.small_wave_interval;
        }
    }

    fn schedule_big_waves(&mut self) {
        if self.config.big_wave_interval.is_zero() {
            return;
        }
        while self.clock >= self.next_big_wave {
            for slot in 0..self.config.big_wave_count {
                self.pending
                    .push(self.next_big_wave + self.config.big_wave_burst_delay * slot);
            }
            self.next_big_wave += self.config.big_wave_interval;
        }
    }

    fn roll_small_wave_count(&mut self) -> u32 {
        let min = self.config.small_wave_min.min(self.config.small_wave_max);
        let max = self.config.small_wave_max;
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(min..=max)
    }

    fn release_due_attempts(&mut self, view: &ArenaView<'_>, out: &mut Vec<Command>) {
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index] > self.clock {
                index += 1;
                continue;
            }
            let _ = self.pending.swap_remove(index);

            if self.active >= self.config.max_active {
                // The backoff is clamped positive at construction, so the
                // deferred attempt lands strictly in the future and this
                // loop cannot revisit it within the same call.
                self.pending.push(self.clock + self.config.retry_backoff);
                continue;
            }
            let Some(kind) = choose_archetype(&self.config.archetypes, &mut self.rng) else {
                continue;
            };
            let site = select_spawn_site_padded(
                self.config.pattern,
                view,
                self.config.edge_padding,
                &mut self.rng,
            );
            self.active += 1;
            out.push(Command::SpawnAgent {
                kind,
                position: site.position,
                heading: site.heading,
            });
        }
    }
}

/// Picks an archetype from the weighted table.
///
/// Entries with non-positive weight are skipped; a table whose positive
/// weights sum to zero yields `None` and the caller skips the attempt.
#[must_use]
pub fn choose_archetype(entries: &[ArchetypeEntry], rng: &mut impl Rng) -> Option<AgentKind> {
    let total: f32 = entries
        .iter()
        .filter(|entry| entry.weight > 0.0)
        .map(|entry| entry.weight)
        .sum();
    if total <= 0.0 {
        return None;
    }

    let pick = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    for entry in entries {
        if entry.weight <= 0.0 {
            continue;
        }
        cumulative += entry.weight;
        if pick <= cumulative {
            return Some(entry.kind);
        }
    }
    entries
        .iter()
        .rev()
        .find(|entry| entry.weight > 0.0)
        .map(|entry| entry.kind)
}

/// Resolved placement for one spawn attempt.
#[derive(Clone, Copy, Debug)]
pub struct SpawnSite {
    /// Boundary cell the spawn is anchored to.
    pub cell: GridCoord,
    /// World position just outside the arena edge.
    pub position: Position,
    /// Initial heading pointing into the arena.
    pub heading: Heading,
}

/// Picks a boundary cell matching the pattern and derives the spawn placement.
///
/// The position sits half a cell plus `edge_padding` outside the chosen
/// cell's centre. When the pattern's edge holds no present cell at all, the
/// spawn falls back to a point outside the arena's bounding box, aimed at
/// the centre.
#[must_use]
pub fn select_spawn_site(
    pattern: SpawnPattern,
    view: &ArenaView<'_>,
    rng: &mut impl Rng,
) -> SpawnSite {
    select_spawn_site_padded(pattern, view, 0.6, rng)
}

/// As [`select_spawn_site`], with an explicit edge padding.
#[must_use]
pub fn select_spawn_site_padded(
    pattern: SpawnPattern,
    view: &ArenaView<'_>,
    edge_padding: f32,
    rng: &mut impl Rng,
) -> SpawnSite {
    let candidates: Vec<(GridCoord, Heading)> = edge_candidates(pattern, view)
        .into_iter()
        .filter(|(cell, _)| view.is_present(*cell))
        .collect();

    let offset = view.cell_size() / 2.0 + edge_padding;
    if let Some(&(cell, inward)) = pick(&candidates, rng) {
        let position = view.center_of(cell).stepped(inward.reversed(), offset);
        let heading = match pattern {
            SpawnPattern::RandomEdge => position.heading_toward(view.center()),
            _ => inward,
        };
        return SpawnSite {
            cell,
            position,
            heading,
        };
    }

    // No present boundary cell anywhere along the edge; start outside the
    // bounding box instead and walk toward the middle.
    let outward = match pattern {
        SpawnPattern::LeftEdge => Heading::WEST,
        SpawnPattern::RightEdge => Heading::EAST,
        SpawnPattern::TopEdge => Heading::NORTH,
        SpawnPattern::BottomEdge => Heading::SOUTH,
        SpawnPattern::RandomEdge => {
            let sides = [Heading::WEST, Heading::EAST, Heading::NORTH, Heading::SOUTH];
            sides[rng.gen_range(0..sides.len())]
        }
    };
    let half_extent = if outward.x() != 0.0 {
        view.columns() as f32 * view.cell_size() / 2.0
    } else {
        view.rows() as f32 * view.cell_size() / 2.0
    };
    let center = view.center();
    let position = center.stepped(outward, half_extent + offset);
    SpawnSite {
        cell: view.coord_of(position),
        position,
        heading: position.heading_toward(center),
    }
}

fn edge_candidates(pattern: SpawnPattern, view: &ArenaView<'_>) -> Vec<(GridCoord, Heading)> {
    let columns = view.columns() as i32;
    let rows = view.rows() as i32;
    let mut candidates = Vec::new();

    let push_column = |x: i32, inward: Heading, out: &mut Vec<(GridCoord, Heading)>| {
        for z in 0..rows {
            out.push((GridCoord::new(x, z), inward));
        }
    };
    let push_row = |z: i32, inward: Heading, out: &mut Vec<(GridCoord, Heading)>| {
        for x in 0..columns {
            out.push((GridCoord::new(x, z), inward));
        }
    };

    match pattern {
        SpawnPattern::LeftEdge => push_column(0, Heading::EAST, &mut candidates),
        SpawnPattern::RightEdge => push_column(columns - 1, Heading::WEST, &mut candidates),
        SpawnPattern::TopEdge => push_row(rows - 1, Heading::SOUTH, &mut candidates),
        SpawnPattern::BottomEdge => push_row(0, Heading::NORTH, &mut candidates),
        SpawnPattern::RandomEdge => {
            push_column(0, Heading::EAST, &mut candidates);
            push_column(columns - 1, Heading::WEST, &mut candidates);
            push_row(rows - 1, Heading::SOUTH, &mut candidates);
            push_row(0, Heading::NORTH, &mut candidates);
        }
    }
    candidates
}

fn pick<'a, T>(candidates: &'a [T], rng: &mut impl Rng) -> Option<&'a T> {
    if candidates.is_empty() {
        None
    } else {
        candidates.get(rng.gen_range(0..candidates.len()))
    }
}
