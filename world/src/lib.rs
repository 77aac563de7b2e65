#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Splashground.
//!
//! The world owns the arena grid, the roster of contamination agents, and
//! the simulation clock. All mutation flows through [`apply`]; systems and
//! adapters observe the world exclusively through the [`query`] module and
//! the events emitted by each command.

use std::time::Duration;

use splashground_core::{
    AgentId, AgentKind, Command, DespawnReason, Event, GridCoord, Heading, LevelDefinition,
    LevelError, LevelTileKind, Position, TileState, WELCOME_BANNER,
};

pub mod level;

const DEFAULT_GRID_COLUMNS: u32 = 20;
const DEFAULT_GRID_ROWS: u32 = 20;
const DEFAULT_CELL_SIZE: f32 = 1.0;

/// Distance past the arena's bounding box at which agents are culled.
const OUT_OF_BOUNDS_MARGIN: f32 = 25.0;

/// Represents the authoritative Splashground world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    arena: Arena,
    agents: Vec<Agent>,
    next_agent_id: u32,
    clock: Duration,
    session_over: bool,
}

impl World {
    /// Creates a new world with the default fully open arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            arena: Arena::open(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_CELL_SIZE),
            agents: Vec::new(),
            next_agent_id: 0,
            clock: Duration::ZERO,
            session_over: false,
        }
    }

    fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        id
    }

    fn agent_index(&self, agent: AgentId) -> Option<usize> {
        self.agents.iter().position(|candidate| candidate.id == agent)
    }

    fn remove_agent(
        &mut self,
        agent: AgentId,
        reason: DespawnReason,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(index) = self.agent_index(agent) {
            let removed = self.agents.remove(index);
            out_events.push(Event::AgentDespawned {
                agent: removed.id,
                kind: removed.kind,
                reason,
            });
        }
    }

    /// Removes agents whose lifetime ran out or that left the play area.
    ///
    /// Runs at the start of every tick so removal is deterministic and never
    /// interrupts behaviour mid-tick.
    fn cull_agents(&mut self, out_events: &mut Vec<Event>) {
        let expired: Vec<(AgentId, DespawnReason)> = self
            .agents
            .iter()
            .filter_map(|agent| {
                if agent.age >= agent.kind.max_lifetime() {
                    Some((agent.id, DespawnReason::LifetimeExpired))
                } else if !self.arena.within_play_area(agent.position) {
                    Some((agent.id, DespawnReason::OutOfBounds))
                } else {
                    None
                }
            })
            .collect();

        for (agent, reason) in expired {
            self.remove_agent(agent, reason, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureArena { level } => match Arena::from_level(&level, world.arena.cell_size)
        {
            Ok(arena) => {
                world.arena = arena;
                world.agents.clear();
                out_events.push(Event::ArenaConfigured {
                    columns: world.arena.columns,
                    rows: world.arena.rows,
                });
            }
            Err(reason) => out_events.push(Event::ArenaRejected { reason }),
        },
        Command::Tick { dt } => {
            world.cull_agents(out_events);
            world.clock = world.clock.saturating_add(dt);
            for agent in world.agents.iter_mut() {
                agent.age = agent.age.saturating_add(dt);
                agent.contamination_budget = agent.contamination_budget.saturating_add(dt);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnAgent {
            kind,
            position,
            heading,
        } => {
            let id = world.allocate_agent_id();
            world.agents.push(Agent::new(id, kind, position, heading));
            out_events.push(Event::AgentSpawned {
                agent: id,
                kind,
                position,
            });
        }
        Command::MoveAgent {
            agent,
            position,
            heading,
        } => {
            if let Some(index) = world.agent_index(agent) {
                let entry = &mut world.agents[index];
                entry.position = position;
                if !heading.is_zero() {
                    entry.heading = heading.normalized();
                }
            }
        }
        Command::ContaminateFrom { agent } => {
            let Some(index) = world.agent_index(agent) else {
                return;
            };
            let kind = world.agents[index].kind;
            let interval = kind.contamination_interval();
            if world.agents[index].contamination_budget < interval {
                return;
            }
            world.agents[index].contamination_budget -= interval;

            let center = world.agents[index].position;
            let coords = world.arena.cells_within(center, kind.contamination_radius());
            let mut count = 0u32;
            for coord in coords {
                let changed = if kind.contaminates_heavy() {
                    world.arena.force_heavy_at(coord)
                } else {
                    world.arena.escalate_at(coord)
                };
                if changed {
                    count += 1;
                }
            }
            if count > 0 {
                out_events.push(Event::TilesContaminated { agent, count });
            }
        }
        Command::CleanseArea { center, radius } => {
            let coords = world.arena.cells_within(center, radius);
            let mut count = 0u32;
            for coord in coords {
                if world.arena.step_down_at(coord) {
                    count += 1;
                }
            }
            if count > 0 {
                out_events.push(Event::TilesCleansed { center, count });
            }
        }
        Command::DespawnAgent { agent, reason } => {
            world.remove_agent(agent, reason, out_events);
        }
        Command::EndSession { outcome } => {
            if !world.session_over {
                world.session_over = true;
                out_events.push(Event::SessionEnded { outcome });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Arena, World};
    use splashground_core::{AgentId, AgentKind, GridCoord, Heading, Position, TileState};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Percentage of present tiles that are healthy, in `[0, 100]`.
    ///
    /// Defined as 0 when the arena holds no present tiles at all.
    #[must_use]
    pub fn health_percentage(world: &World) -> f32 {
        let mut present = 0u32;
        let mut healthy = 0u32;
        for tile in world.arena.tiles.iter().flatten() {
            present += 1;
            if tile.state.is_healthy() {
                healthy += 1;
            }
        }
        if present == 0 {
            0.0
        } else {
            healthy as f32 / present as f32 * 100.0
        }
    }

    /// Number of agents currently inhabiting the world.
    #[must_use]
    pub fn active_agent_count(world: &World) -> usize {
        world.agents.len()
    }

    /// Reports whether the session outcome has been latched.
    #[must_use]
    pub fn session_over(world: &World) -> bool {
        world.session_over
    }

    /// Simulated time accumulated since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Exposes a read-only view of the arena grid.
    #[must_use]
    pub fn arena_view(world: &World) -> ArenaView<'_> {
        ArenaView {
            arena: &world.arena,
        }
    }

    /// Captures a read-only view of the agents inhabiting the arena.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let mut snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id,
                kind: agent.kind,
                position: agent.position,
                heading: agent.heading,
                age: agent.age,
                ready_to_act: agent.contamination_budget >= agent.kind.contamination_interval(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        AgentView { snapshots }
    }

    /// Read-only view into the arena grid.
    #[derive(Clone, Copy, Debug)]
    pub struct ArenaView<'a> {
        arena: &'a Arena,
    }

    impl ArenaView<'_> {
        /// Number of cell columns in the grid.
        #[must_use]
        pub fn columns(&self) -> u32 {
            self.arena.columns
        }

        /// Number of cell rows in the grid.
        #[must_use]
        pub fn rows(&self) -> u32 {
            self.arena.rows
        }

        /// Side length of one square cell in world units.
        #[must_use]
        pub fn cell_size(&self) -> f32 {
            self.arena.cell_size
        }

        /// Reports whether a floor tile exists at the coordinate.
        #[must_use]
        pub fn is_present(&self, coord: GridCoord) -> bool {
            self.state(coord).is_some()
        }

        /// Contamination state of the tile at the coordinate, if present.
        #[must_use]
        pub fn state(&self, coord: GridCoord) -> Option<TileState> {
            self.arena
                .index(coord)
                .and_then(|index| self.arena.tiles.get(index).copied().flatten())
                .map(|tile| tile.state)
        }

        /// Grid coordinate whose cell contains the provided position.
        #[must_use]
        pub fn coord_of(&self, position: Position) -> GridCoord {
            self.arena.coord_of(position)
        }

        /// World position of the centre of the provided cell.
        #[must_use]
        pub fn center_of(&self, coord: GridCoord) -> Position {
            self.arena.world_center_of(coord)
        }

        /// Centre of the arena's bounding box in world coordinates.
        #[must_use]
        pub fn center(&self) -> Position {
            self.arena.center()
        }

        /// Iterates over every present tile with its contamination state.
        pub fn iter_states(&self) -> impl Iterator<Item = (GridCoord, TileState)> + '_ {
            let columns = self.arena.columns as i32;
            self.arena
                .tiles
                .iter()
                .enumerate()
                .filter_map(move |(index, tile)| {
                    let tile = (*tile)?;
                    let x = index as i32 % columns;
                    let z = index as i32 / columns;
                    Some((GridCoord::new(x, z), tile.state))
                })
        }
    }

    /// Read-only snapshot describing all agents within the arena.
    #[derive(Clone, Debug, Default)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterator over the captured agent snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Snapshot of the agent with the provided identifier, if alive.
        #[must_use]
        pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
            self.snapshots
                .iter()
                .find(|snapshot| snapshot.id == agent)
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single agent's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct AgentSnapshot {
        /// Unique identifier assigned to the agent.
        pub id: AgentId,
        /// Archetype governing the agent's behaviour parameters.
        pub kind: AgentKind,
        /// Current position in world coordinates.
        pub position: Position,
        /// Direction the agent is facing.
        pub heading: Heading,
        /// Simulated time the agent has been alive.
        pub age: Duration,
        /// Whether the agent accrued enough time for another contamination.
        pub ready_to_act: bool,
    }
}

#[derive(Clone, Copy, Debug)]
struct Tile {
    state: TileState,
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    kind: AgentKind,
    position: Position,
    heading: Heading,
    age: Duration,
    contamination_budget: Duration,
}

impl Agent {
    fn new(id: AgentId, kind: AgentKind, position: Position, heading: Heading) -> Self {
        Self {
            id,
            kind,
            position,
            heading: heading.normalized(),
            age: Duration::ZERO,
            contamination_budget: Duration::ZERO,
        }
    }
}

/// Dense row-major tile grid with optional holes for non-rectangular arenas.
#[derive(Clone, Debug)]
struct Arena {
    columns: u32,
    rows: u32,
    cell_size: f32,
    tiles: Vec<Option<Tile>>,
}

impl Arena {
    fn open(columns: u32, rows: u32, cell_size: f32) -> Self {
        let capacity = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            cell_size,
            tiles: vec![
                Some(Tile {
                    state: TileState::Healthy
                });
                capacity
            ],
        }
    }

    /// Builds an arena from a level definition.
    ///
    /// Definitions that arrive through unvalidated decode paths are checked
    /// again here; the grid is not constructed when the check fails.
    fn from_level(level: &LevelDefinition, cell_size: f32) -> Result<Self, LevelError> {
        if level.width() == 0 || level.height() == 0 {
            return Err(LevelError::ZeroDimension {
                width: level.width(),
                height: level.height(),
            });
        }
        let expected = level.width() as usize * level.height() as usize;
        if level.tiles().len() != expected {
            return Err(LevelError::TileCountMismatch {
                expected,
                actual: level.tiles().len(),
            });
        }

        let tiles = level
            .tiles()
            .iter()
            .map(|datum| match datum.kind {
                LevelTileKind::Empty => None,
                LevelTileKind::Floor => Some(Tile {
                    state: if datum.contaminated {
                        TileState::Contaminated
                    } else {
                        TileState::Healthy
                    },
                }),
            })
            .collect();

        Ok(Self {
            columns: level.width(),
            rows: level.height(),
            cell_size,
            tiles,
        })
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.x() < 0 || coord.z() < 0 {
            return None;
        }
        let x = coord.x() as u32;
        let z = coord.z() as u32;
        if x < self.columns && z < self.rows {
            Some(z as usize * self.columns as usize + x as usize)
        } else {
            None
        }
    }

    fn world_center_of(&self, coord: GridCoord) -> Position {
        Position::new(
            coord.x() as f32 * self.cell_size,
            coord.z() as f32 * self.cell_size,
        )
    }

    fn coord_of(&self, position: Position) -> GridCoord {
        GridCoord::new(
            (position.x() / self.cell_size).round() as i32,
            (position.z() / self.cell_size).round() as i32,
        )
    }

    fn center(&self) -> Position {
        Position::new(
            (self.columns.saturating_sub(1)) as f32 * self.cell_size / 2.0,
            (self.rows.saturating_sub(1)) as f32 * self.cell_size / 2.0,
        )
    }

    fn within_play_area(&self, position: Position) -> bool {
        let half_cell = self.cell_size / 2.0;
        let min = -half_cell - OUT_OF_BOUNDS_MARGIN;
        let max_x =
            (self.columns.saturating_sub(1)) as f32 * self.cell_size + half_cell + OUT_OF_BOUNDS_MARGIN;
        let max_z =
            (self.rows.saturating_sub(1)) as f32 * self.cell_size + half_cell + OUT_OF_BOUNDS_MARGIN;
        position.x() >= min && position.x() <= max_x && position.z() >= min && position.z() <= max_z
    }

    /// Present cells whose centre lies within `radius` of `center`.
    ///
    /// The distance test is inclusive; a non-positive radius selects nothing.
    /// Centres outside the grid are valid and simply clip against the bounds.
    fn cells_within(&self, center: Position, radius: f32) -> Vec<GridCoord> {
        if radius <= 0.0 {
            return Vec::new();
        }

        let min_x = ((center.x() - radius) / self.cell_size).floor() as i32;
        let max_x = ((center.x() + radius) / self.cell_size).ceil() as i32;
        let min_z = ((center.z() - radius) / self.cell_size).floor() as i32;
        let max_z = ((center.z() + radius) / self.cell_size).ceil() as i32;

        let mut coords = Vec::new();
        for z in min_z..=max_z {
            for x in min_x..=max_x {
                let coord = GridCoord::new(x, z);
                let Some(index) = self.index(coord) else {
                    continue;
                };
                if self.tiles[index].is_none() {
                    continue;
                }
                if self.world_center_of(coord).distance(center) <= radius {
                    coords.push(coord);
                }
            }
        }
        coords
    }

    fn escalate_at(&mut self, coord: GridCoord) -> bool {
        self.mutate_state(coord, TileState::escalated)
    }

    fn step_down_at(&mut self, coord: GridCoord) -> bool {
        self.mutate_state(coord, TileState::stepped_down)
    }

    fn force_heavy_at(&mut self, coord: GridCoord) -> bool {
        self.mutate_state(coord, |_| TileState::HeavyContaminated)
    }

    fn mutate_state(&mut self, coord: GridCoord, transition: impl Fn(TileState) -> TileState) -> bool {
        let Some(index) = self.index(coord) else {
            return false;
        };
        let Some(tile) = self.tiles.get_mut(index).and_then(Option::as_mut) else {
            return false;
        };
        let next = transition(tile.state);
        if next == tile.state {
            false
        } else {
            tile.state = next;
            true
        }
    }
}
