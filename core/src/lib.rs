#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative game session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Chase.";

/// Side length of a single maze tile measured in pixels.
pub const TILE_PIXELS: i32 = 32;

/// Side length of the square footprint shared by the player and pursuers.
pub const AGENT_FOOTPRINT: i32 = TILE_PIXELS;

/// Side length of the marker drawn for a collectible.
pub const COLLECTIBLE_MARKER: i32 = 4;

/// Side length of the marker drawn for a power item.
pub const POWER_MARKER: i32 = 8;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Stores the latest requested player direction in the direction buffer.
    RequestDirection {
        /// Direction requested by the input source.
        direction: Direction,
    },
    /// Advances the session by one fixed simulation step.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Installs a freshly planned path as the pursuer's active route.
    AssignPursuerPath {
        /// Pursuer receiving the route.
        pursuer: PursuerId,
        /// Behavior state that produced the route.
        state: PursuerState,
        /// Waypoints to visit in order, excluding the pursuer's current cell.
        path: Vec<CellCoord>,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the shared pursuer disposition changed.
    BehaviorModeChanged {
        /// Mode that became active.
        mode: BehaviorMode,
    },
    /// Announces that the power state toggled.
    PowerStateChanged {
        /// Whether the power state is active after the change.
        active: bool,
    },
    /// Reports that a pursuer has no current target and awaits a path.
    PursuerPathNeeded {
        /// Pursuer awaiting a path.
        pursuer: PursuerId,
        /// Cell the pursuer currently rests on.
        cell: CellCoord,
    },
    /// Reports that a pursuer arrived exactly on one of its waypoints.
    PursuerWaypointReached {
        /// Pursuer that reached the waypoint.
        pursuer: PursuerId,
        /// Waypoint cell the pursuer now rests on.
        cell: CellCoord,
        /// Whether the pursuer consumed the last waypoint of its path.
        path_exhausted: bool,
    },
    /// Confirms that the player picked up an item.
    ItemCollected {
        /// Cell the item occupied.
        cell: CellCoord,
        /// Kind of item that was collected.
        kind: ItemKind,
        /// Points awarded for the pickup.
        points: u32,
    },
    /// Confirms that the powered-up player consumed a pursuer.
    PursuerConsumed {
        /// Pursuer removed from play.
        pursuer: PursuerId,
        /// Points awarded for the capture.
        points: u32,
    },
    /// Reports that the player touched a pursuer without power.
    PlayerLostLife {
        /// Lives left after the loss.
        lives_remaining: u32,
    },
    /// Announces that the match reached a terminal outcome.
    MatchEnded {
        /// Terminal outcome of the match.
        outcome: MatchOutcome,
    },
}

/// Cardinal movement intents available to agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
    /// No active movement intent.
    #[default]
    None,
}

impl Direction {
    /// Movement directions in their canonical enumeration order.
    pub const MOVES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit displacement along the column and row axes.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    /// Reports whether the direction carries no movement intent.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

/// Shared pursuer disposition driven by the timed phase schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorMode {
    /// Pursuers seek the player.
    Chase,
    /// Pursuers wander toward random cells.
    Scatter,
}

/// Per-pursuer behavior state selected whenever a route is planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuerState {
    /// Route leads to the player's current cell.
    SeekPlayer,
    /// Route leads to a uniformly random open cell.
    Wander,
}

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// The match is still being played.
    #[default]
    Running,
    /// Every collectible was consumed.
    Won,
    /// The player ran out of lives.
    Lost,
}

impl MatchOutcome {
    /// Reports whether the outcome ends the match.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Items the player can pick up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Regular collectible counted toward the win condition.
    Collectible,
    /// Power item that temporarily lets the player consume pursuers.
    PowerItem,
}

/// Special cell sets enumerated by the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Cells that still hold a collectible.
    Collectible,
    /// Cells that still hold a power item.
    PowerItem,
    /// Cells where pursuers spawn.
    PursuerSpawn,
}

/// Unique identifier assigned to a pursuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PursuerId(u32);

impl PursuerId {
    /// Creates a new pursuer identifier with the provided numeric value.
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

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Pixel position of the cell's upper-left corner.
    #[must_use]
    pub fn origin(self) -> PixelPosition {
        PixelPosition::new(
            self.column as i32 * TILE_PIXELS,
            self.row as i32 * TILE_PIXELS,
        )
    }
}

/// Continuous agent position measured in pixels from the maze's upper-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPosition {
    x: i32,
    y: i32,
}

impl PixelPosition {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal offset in pixels.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical offset in pixels.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position displaced by the provided pixel offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Cell containing the position's upper-left corner, if it lies on the grid side
    /// of the origin.
    #[must_use]
    pub fn cell(self) -> Option<CellCoord> {
        let column = u32::try_from(self.x.div_euclid(TILE_PIXELS)).ok()?;
        let row = u32::try_from(self.y.div_euclid(TILE_PIXELS)).ok()?;
        Some(CellCoord::new(column, row))
    }
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Pixel position of the player's footprint.
    pub position: PixelPosition,
    /// Cell containing the player's upper-left corner.
    pub cell: CellCoord,
    /// Direction the player currently travels in.
    pub facing: Direction,
    /// Most recently requested direction awaiting an opening.
    pub buffered: Direction,
    /// Mouth animation frame.
    pub mouth_open: bool,
}

/// Immutable representation of a single pursuer's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PursuerSnapshot {
    /// Unique identifier assigned to the pursuer.
    pub id: PursuerId,
    /// Pixel position of the pursuer's footprint.
    pub position: PixelPosition,
    /// Cell containing the pursuer's upper-left corner.
    pub cell: CellCoord,
    /// Direction the pursuer moved in during the last tick.
    pub facing: Direction,
    /// Behavior state that produced the active route, if any.
    pub state: Option<PursuerState>,
    /// Waypoint the pursuer is currently heading toward.
    pub target: Option<CellCoord>,
    /// Waypoints queued after the current target.
    pub queued_waypoints: usize,
    /// Whether the pursuer is vulnerable because the power state is active.
    pub frightened: bool,
}

/// Read-only snapshot describing all pursuers still in play.
#[derive(Clone, Debug, Default)]
pub struct PursuerView {
    snapshots: Vec<PursuerSnapshot>,
}

impl PursuerView {
    /// Creates a new pursuer view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PursuerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured pursuer snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PursuerSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the pursuer with the provided identifier.
    #[must_use]
    pub fn get(&self, id: PursuerId) -> Option<&PursuerSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of pursuers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no pursuers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PursuerSnapshot> {
        self.snapshots
    }
}

/// Read-only description of the power state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PowerSnapshot {
    /// Whether pursuers are currently vulnerable.
    pub active: bool,
    /// Time left before the power state expires.
    pub remaining: Duration,
}

/// One entry of the timed phase schedule, measured in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEntry {
    /// Seconds spent in scatter before switching to chase.
    pub scatter_secs: u64,
    /// Seconds spent in chase before the next entry. Ignored for the final entry,
    /// whose chase phase holds indefinitely.
    pub chase_secs: u64,
}

impl PhaseEntry {
    /// Creates a new schedule entry.
    #[must_use]
    pub const fn new(scatter_secs: u64, chase_secs: u64) -> Self {
        Self {
            scatter_secs,
            chase_secs,
        }
    }

    /// Scatter duration of the entry.
    #[must_use]
    pub const fn scatter(&self) -> Duration {
        Duration::from_secs(self.scatter_secs)
    }

    /// Chase duration of the entry.
    #[must_use]
    pub const fn chase(&self) -> Duration {
        Duration::from_secs(self.chase_secs)
    }
}

/// Fixed match rules: scoring, lives, timers, and the phase schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Points awarded per collectible.
    pub collectible_points: u32,
    /// Points awarded per power item.
    pub power_item_points: u32,
    /// Points awarded per consumed pursuer.
    pub pursuer_points: u32,
    /// Lives the player starts with.
    pub lives: u32,
    /// Seconds the power state lasts once activated.
    pub power_secs: u64,
    /// Milliseconds between mouth animation frames.
    pub mouth_interval_millis: u64,
    /// Simulation steps per second of simulated time.
    pub ticks_per_second: u32,
    /// Scatter/chase alternation followed by all pursuers.
    pub phase_schedule: Vec<PhaseEntry>,
    /// Seed for the pursuers' wander destinations.
    pub rng_seed: u64,
}

impl Rules {
    /// Duration of the power state.
    #[must_use]
    pub const fn power_duration(&self) -> Duration {
        Duration::from_secs(self.power_secs)
    }

    /// Interval between mouth animation frames.
    #[must_use]
    pub const fn mouth_interval(&self) -> Duration {
        Duration::from_millis(self.mouth_interval_millis)
    }

    /// Duration of a single simulation step. Zero tick rates fall back to one step per second.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.ticks_per_second.max(1)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            collectible_points: 10,
            power_item_points: 50,
            pursuer_points: 400,
            lives: 3,
            power_secs: 15,
            mouth_interval_millis: 200,
            ticks_per_second: 120,
            phase_schedule: vec![
                PhaseEntry::new(7, 20),
                PhaseEntry::new(7, 20),
                PhaseEntry::new(5, 20),
                PhaseEntry::new(5, 999_999),
            ],
            rng_seed: 0x5eed_c0de_2f0a_9b17,
        }
    }
}
