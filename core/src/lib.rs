#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Splashground simulation.
//!
//! Everything that crosses a crate boundary lives here: the [`Command`] and
//! [`Event`] vocabulary, identifiers and plane geometry, the tile
//! contamination machine, agent archetype parameters, and validated level
//! definitions. The world is the only writer of state; every other crate
//! speaks to it through these types, which keeps a full session replayable
//! from a command log alone.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Splashground.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the arena grid from the provided level definition.
    ConfigureArena {
        /// Authoritative description of which cells exist and their initial state.
        level: LevelDefinition,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Introduces a new contamination agent into the world.
    SpawnAgent {
        /// Archetype that decides the agent's behaviour parameters.
        kind: AgentKind,
        /// World position the agent starts at, just outside the arena edge.
        position: Position,
        /// Initial movement direction assigned by the spawner.
        heading: Heading,
    },
    /// Repositions an agent; teleports and gap hops are simply large moves.
    MoveAgent {
        /// Identifier of the agent being moved.
        agent: AgentId,
        /// Destination position in world coordinates.
        position: Position,
        /// Heading the agent faces after the move.
        heading: Heading,
    },
    /// Requests that an agent apply its contamination around its position.
    ContaminateFrom {
        /// Identifier of the agent attempting to contaminate.
        agent: AgentId,
    },
    /// Steps every contaminated tile within the radius down one severity level.
    CleanseArea {
        /// Centre of the spray impact in world coordinates.
        center: Position,
        /// Inclusive radius of the affected disc.
        radius: f32,
    },
    /// Removes an agent for a behaviour-determined reason.
    DespawnAgent {
        /// Identifier of the agent to remove.
        agent: AgentId,
        /// Why the agent is being removed.
        reason: DespawnReason,
    },
    /// Latches the session outcome; ignored once the session has ended.
    EndSession {
        /// Final verdict and accumulated statistics.
        outcome: SessionOutcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the arena grid was rebuilt.
    ArenaConfigured {
        /// Number of tile columns in the new grid.
        columns: u32,
        /// Number of tile rows in the new grid.
        rows: u32,
    },
    /// Reports that a level definition was rejected at build time.
    ArenaRejected {
        /// Specific reason the build failed.
        reason: LevelError,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent entered the world.
    AgentSpawned {
        /// Identifier assigned to the agent by the world.
        agent: AgentId,
        /// Archetype of the spawned agent.
        kind: AgentKind,
        /// Position the agent spawned at.
        position: Position,
    },
    /// Confirms that an agent left the world. Emitted exactly once per agent.
    AgentDespawned {
        /// Identifier of the removed agent.
        agent: AgentId,
        /// Archetype of the removed agent.
        kind: AgentKind,
        /// Why the agent was removed.
        reason: DespawnReason,
    },
    /// Reports that an agent's contamination changed at least one tile.
    TilesContaminated {
        /// Agent responsible for the contamination.
        agent: AgentId,
        /// Number of tiles whose severity increased.
        count: u32,
    },
    /// Reports that a spray impact stepped at least one tile down.
    TilesCleansed {
        /// Centre of the spray impact.
        center: Position,
        /// Number of tiles whose severity decreased.
        count: u32,
    },
    /// Announces the latched end-of-session verdict.
    SessionEnded {
        /// Final verdict and accumulated statistics.
        outcome: SessionOutcome,
    },
}

/// Contamination severity of a single arena tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Clean tile counting toward floor health.
    #[default]
    Healthy,
    /// First contamination level.
    Contaminated,
    /// Second and highest contamination level.
    HeavyContaminated,
}

impl TileState {
    /// Returns the state one severity level higher.
    ///
    /// Idempotent at [`TileState::HeavyContaminated`]; escalation never skips
    /// a level.
    #[must_use]
    pub const fn escalated(self) -> Self {
        match self {
            Self::Healthy => Self::Contaminated,
            Self::Contaminated | Self::HeavyContaminated => Self::HeavyContaminated,
        }
    }

    /// Returns the state one severity level lower.
    ///
    /// Idempotent at [`TileState::Healthy`]; a cleanse reduces exactly one
    /// level per invocation and never jumps from heavy straight to healthy.
    #[must_use]
    pub const fn stepped_down(self) -> Self {
        match self {
            Self::HeavyContaminated => Self::Contaminated,
            Self::Contaminated | Self::Healthy => Self::Healthy,
        }
    }

    /// Reports whether the tile counts toward the healthy percentage.
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Unique identifier assigned to a contamination agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behaviour archetypes available to the spawn scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Walks the arena, turning away from missing tiles; dies when it spins
    /// in place too often.
    Wanderer,
    /// Stationary bloom that relocates to a random arena position on a timer.
    Teleporter,
    /// Slow walker whose contamination jumps tiles straight to heavy.
    Rooter,
}

impl AgentKind {
    /// Movement speed in world units per second.
    #[must_use]
    pub const fn move_speed(self) -> f32 {
        match self {
            Self::Wanderer => 3.0,
            Self::Teleporter => 0.0,
            Self::Rooter => 1.0,
        }
    }

    /// Radius of the contamination disc in world units.
    #[must_use]
    pub const fn contamination_radius(self) -> f32 {
        match self {
            Self::Wanderer | Self::Teleporter => 1.5,
            Self::Rooter => 1.0,
        }
    }

    /// Minimum simulated time between successive contamination applications.
    #[must_use]
    pub const fn contamination_interval(self) -> Duration {
        Duration::from_millis(100)
    }

    /// Simulated lifetime after which the agent expires.
    #[must_use]
    pub const fn max_lifetime(self) -> Duration {
        Duration::from_secs(30)
    }

    /// Interval between relocations, for archetypes that teleport.
    #[must_use]
    pub const fn teleport_interval(self) -> Option<Duration> {
        match self {
            Self::Teleporter => Some(Duration::from_secs(5)),
            Self::Wanderer | Self::Rooter => None,
        }
    }

    /// Reports whether this archetype's contamination bypasses the one-step
    /// escalation rule and forces tiles directly to heavy contamination.
    #[must_use]
    pub const fn contaminates_heavy(self) -> bool {
        matches!(self, Self::Rooter)
    }
}

/// Reasons the world or a behaviour system removes an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnReason {
    /// The agent's lifetime budget ran out.
    LifetimeExpired,
    /// The agent wandered past the arena's surrounding margin.
    OutOfBounds,
    /// The agent reversed direction too often within a short window.
    Stuck,
    /// The agent was eliminated by a destruction effect.
    Destroyed,
}

/// Location of a single grid cell expressed as signed column and row indices.
///
/// Signed so that positions just outside the arena map to coordinates that
/// lookups simply answer with "no tile".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    z: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }
}

/// Point on the horizontal world plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    z: f32,
}

impl Position {
    /// Creates a new world-plane position.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Horizontal coordinate in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Depth coordinate in world units.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance to another position in the horizontal plane.
    #[must_use]
    pub fn distance(&self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Position displaced by the provided heading scaled to the given length.
    #[must_use]
    pub fn stepped(&self, heading: Heading, length: f32) -> Self {
        let dir = heading.normalized();
        Self::new(self.x + dir.x() * length, self.z + dir.z() * length)
    }

    /// Heading that points from this position toward the target.
    #[must_use]
    pub fn heading_toward(&self, target: Position) -> Heading {
        Heading::new(target.x - self.x, target.z - self.z).normalized()
    }
}

/// Movement direction on the horizontal world plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    x: f32,
    z: f32,
}

impl Heading {
    /// Heading along the positive x axis.
    pub const EAST: Self = Self::new(1.0, 0.0);
    /// Heading along the negative x axis.
    pub const WEST: Self = Self::new(-1.0, 0.0);
    /// Heading along the positive z axis.
    pub const NORTH: Self = Self::new(0.0, 1.0);
    /// Heading along the negative z axis.
    pub const SOUTH: Self = Self::new(0.0, -1.0);

    /// Creates a new heading from raw axis components.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Horizontal component of the direction.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Depth component of the direction.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Returns the heading scaled to unit length, or the zero heading when
    /// the direction has no magnitude.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let magnitude = (self.x * self.x + self.z * self.z).sqrt();
        if magnitude <= f32::EPSILON {
            Self::default()
        } else {
            Self::new(self.x / magnitude, self.z / magnitude)
        }
    }

    /// Reports whether the heading carries any direction at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x.abs() <= f32::EPSILON && self.z.abs() <= f32::EPSILON
    }

    /// Heading pointing the opposite way.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(-self.x, -self.z)
    }

    /// Heading rotated a quarter turn clockwise in the horizontal plane.
    #[must_use]
    pub fn rotated_quarter(&self) -> Self {
        Self::new(self.z, -self.x)
    }

    /// Angle in degrees between this heading and another.
    #[must_use]
    pub fn angle_to(&self, other: Heading) -> f32 {
        let a = self.normalized();
        let b = other.normalized();
        let dot = (a.x * b.x + a.z * b.z).clamp(-1.0, 1.0);
        dot.acos().to_degrees()
    }
}

/// Kind of cell recorded in a level definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelTileKind {
    /// No tile exists at this cell; it is excluded from every query.
    Empty,
    /// A floor tile exists at this cell.
    #[default]
    Floor,
}

/// Per-cell record of a level definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileDatum {
    /// Whether the cell holds a floor tile at all.
    pub kind: LevelTileKind,
    /// Whether a floor tile starts the session already contaminated.
    pub contaminated: bool,
}

impl TileDatum {
    /// A clean floor tile.
    #[must_use]
    pub const fn floor() -> Self {
        Self {
            kind: LevelTileKind::Floor,
            contaminated: false,
        }
    }

    /// A floor tile that starts contaminated.
    #[must_use]
    pub const fn contaminated_floor() -> Self {
        Self {
            kind: LevelTileKind::Floor,
            contaminated: true,
        }
    }

    /// An absent cell.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            kind: LevelTileKind::Empty,
            contaminated: false,
        }
    }
}

/// Flat integer code marking an absent cell.
pub const CODE_EMPTY: u8 = 0;
/// Flat integer code marking a clean floor tile.
pub const CODE_FLOOR: u8 = 1;
/// Flat integer code marking an initially contaminated floor tile.
pub const CODE_CONTAMINATED: u8 = 2;

/// Authoritative description of which cells exist and their initial state.
///
/// Storage is row-major: `index = z * width + x`. Definitions are validated
/// on construction so an instance always describes a buildable arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    width: u32,
    height: u32,
    tiles: Vec<TileDatum>,
}

impl LevelDefinition {
    /// Creates a definition from explicit per-cell records.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::ZeroDimension`] when either dimension is zero
    /// and [`LevelError::TileCountMismatch`] when the record count does not
    /// equal `width * height`.
    pub fn new(width: u32, height: u32, tiles: Vec<TileDatum>) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(LevelError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Creates a definition from the flat integer encoding used by the
    /// level-authoring tooling: 0 = empty, 1 = floor, 2 = contaminated floor.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`LevelDefinition::new`], plus
    /// [`LevelError::UnknownCode`] for any unrecognised code value.
    pub fn from_codes(width: u32, height: u32, codes: &[u8]) -> Result<Self, LevelError> {
        let mut tiles = Vec::with_capacity(codes.len());
        for (index, code) in codes.iter().copied().enumerate() {
            let datum = match code {
                CODE_EMPTY => TileDatum::empty(),
                CODE_FLOOR => TileDatum::floor(),
                CODE_CONTAMINATED => TileDatum::contaminated_floor(),
                other => return Err(LevelError::UnknownCode { code: other, index }),
            };
            tiles.push(datum);
        }
        Self::new(width, height, tiles)
    }

    /// Creates a fully open rectangular arena of clean floor tiles.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::ZeroDimension`] when either dimension is zero.
    pub fn open(width: u32, height: u32) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::ZeroDimension { width, height });
        }
        let count = width as usize * height as usize;
        Self::new(width, height, vec![TileDatum::floor(); count])
    }

    /// Creates a circular arena inscribed in the `width x height` bounds.
    ///
    /// Cells outside the inscribed circle are absent.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::ZeroDimension`] when either dimension is zero.
    pub fn circle(width: u32, height: u32) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::ZeroDimension { width, height });
        }
        let center_x = width as f32 / 2.0;
        let center_z = height as f32 / 2.0;
        let radius = width.min(height) as f32 / 2.0;
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for z in 0..height {
            for x in 0..width {
                let dx = x as f32 - center_x;
                let dz = z as f32 - center_z;
                let datum = if (dx * dx + dz * dz).sqrt() <= radius {
                    TileDatum::floor()
                } else {
                    TileDatum::empty()
                };
                tiles.push(datum);
            }
        }
        Self::new(width, height, tiles)
    }

    /// Number of cell columns described by the definition.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cell rows described by the definition.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major per-cell records backing the definition.
    #[must_use]
    pub fn tiles(&self) -> &[TileDatum] {
        &self.tiles
    }

    /// Record for the cell at the provided coordinates, if in bounds.
    #[must_use]
    pub fn datum(&self, x: u32, z: u32) -> Option<TileDatum> {
        if x < self.width && z < self.height {
            self.tiles
                .get(z as usize * self.width as usize + x as usize)
                .copied()
        } else {
            None
        }
    }
}

/// Reasons a level definition is rejected at build time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// One or both grid dimensions were zero.
    #[error("level dimensions must be at least 1x1, got {width}x{height}")]
    ZeroDimension {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
    /// The declared tile count does not match `width * height`.
    #[error("level declares {actual} tiles but its dimensions require {expected}")]
    TileCountMismatch {
        /// Count the dimensions require.
        expected: usize,
        /// Count the definition provided.
        actual: usize,
    },
    /// A flat-encoded cell used a code outside the known set.
    #[error("unknown tile code {code} at index {index}")]
    UnknownCode {
        /// The unrecognised code value.
        code: u8,
        /// Row-major index of the offending cell.
        index: usize,
    },
    /// The level payload could not be decoded at all.
    #[error("malformed level payload: {message}")]
    Malformed {
        /// Human-readable decoding failure.
        message: String,
    },
}

/// Final verdict for a completed session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionOutcome {
    /// The floor stayed healthy until the timer ran out.
    Victory(SessionStats),
    /// Floor health dropped below the required minimum.
    Defeat(SessionStats),
}

impl SessionOutcome {
    /// Statistics gathered over the session regardless of verdict.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        match self {
            Self::Victory(stats) | Self::Defeat(stats) => stats,
        }
    }
}

/// Statistics gathered while a session runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Floor health percentage at the moment the session ended.
    pub final_health: f32,
    /// Lowest floor health percentage observed during the session.
    pub lowest_health: f32,
    /// Total number of tile cleanse steps credited to the player.
    pub tiles_cleansed: u32,
    /// Simulated time that elapsed before the session ended.
    pub elapsed: Duration,
}
