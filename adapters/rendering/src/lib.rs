#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Maze Chase adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use maze_chase_core::{
    CellCoord, CellKind, Direction, MatchOutcome, PixelPosition, PursuerId, TILE_PIXELS,
};
use maze_chase_world::{query, World};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Colors used for walls, items, and agents.
pub mod palette {
    use super::Color;

    /// Background behind every frame.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0, 0, 0);
    /// Wall fill.
    pub const WALL: Color = Color::from_rgb_u8(0, 0, 255);
    /// Player body.
    pub const PLAYER: Color = Color::from_rgb_u8(255, 255, 0);
    /// Collectible marker.
    pub const COLLECTIBLE: Color = Color::from_rgb_u8(255, 255, 0);
    /// Power item marker.
    pub const POWER_ITEM: Color = Color::from_rgb_u8(255, 255, 255);
    /// Pursuer bodies, assigned round-robin by identifier.
    pub const PURSUERS: [Color; 4] = [
        Color::from_rgb_u8(255, 0, 0),
        Color::from_rgb_u8(255, 184, 255),
        Color::from_rgb_u8(255, 184, 82),
        Color::from_rgb_u8(0, 255, 255),
    ];
    /// Pursuer body while the power state is active.
    pub const FRIGHTENED: Color = Color::from_rgb_u8(33, 33, 222);
    /// Text drawn over the scene.
    pub const TEXT: Color = Color::from_rgb_u8(255, 255, 255);
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Direction requested on this frame, if any.
    pub direction: Option<Direction>,
    /// Whether the adapter detected a request to stop.
    pub quit: bool,
}

/// Describes the maze grid that can be rendered by adapters.
#[derive(Clone, Debug, PartialEq)]
pub struct MazePresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
    /// Cells drawn as walls.
    pub walls: Vec<CellCoord>,
    /// Color used for the wall fill.
    pub wall_color: Color,
}

impl MazePresentation {
    /// Creates a new maze descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive, finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        walls: Vec<CellCoord>,
        wall_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            walls,
            wall_color,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Upper-left corner of a cell in world units.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(cell.column() as f32, cell.row() as f32) * self.tile_length
    }

    /// Centre of a cell in world units.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.tile_length * 0.5)
    }

    /// Converts a simulation pixel position into world units.
    #[must_use]
    pub fn world_position(&self, position: PixelPosition) -> Vec2 {
        Vec2::new(position.x() as f32, position.y() as f32) * (self.tile_length / TILE_PIXELS as f32)
    }
}

/// Player rendered as a filled circle with an animated mouth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPresentation {
    /// Upper-left corner of the player's footprint in world units.
    pub position: Vec2,
    /// Direction the mouth points toward.
    pub facing: Direction,
    /// Whether the mouth is drawn open.
    pub mouth_open: bool,
    /// Fill color of the body.
    pub color: Color,
}

/// Pursuer rendered as a filled square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PursuerPresentation {
    /// Identifier of the pursuer.
    pub id: PursuerId,
    /// Upper-left corner of the pursuer's footprint in world units.
    pub position: Vec2,
    /// Direction the pursuer moved in.
    pub facing: Direction,
    /// Whether the pursuer is currently vulnerable.
    pub frightened: bool,
    /// Fill color of the body.
    pub color: Color,
}

/// Scene description combining the maze, its items, and the agents.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Maze grid and its walls.
    pub maze: MazePresentation,
    /// Cells that still hold a collectible.
    pub collectibles: Vec<CellCoord>,
    /// Cells that still hold a power item.
    pub power_items: Vec<CellCoord>,
    /// Player, absent once the match is lost.
    pub player: Option<PlayerPresentation>,
    /// Pursuers still in play.
    pub pursuers: Vec<PursuerPresentation>,
    /// Score and lives line.
    pub hud: String,
    /// Final banner shown once the match ended.
    pub banner: Option<String>,
}

impl Scene {
    /// Captures the current world state at one world unit per simulation pixel.
    pub fn from_world(world: &World) -> std::result::Result<Self, RenderingError> {
        let maze = query::maze(world);
        let walls = (0..maze.rows())
            .flat_map(|row| (0..maze.columns()).map(move |column| CellCoord::new(column, row)))
            .filter(|cell| maze.is_blocked(*cell))
            .collect();
        let presentation = MazePresentation::new(
            maze.columns(),
            maze.rows(),
            TILE_PIXELS as f32,
            walls,
            palette::WALL,
        )?;

        let player = query::player(world).map(|player| PlayerPresentation {
            position: presentation.world_position(player.position),
            facing: player.facing,
            mouth_open: player.mouth_open,
            color: palette::PLAYER,
        });

        let pursuers = query::pursuer_view(world)
            .iter()
            .map(|pursuer| PursuerPresentation {
                id: pursuer.id,
                position: presentation.world_position(pursuer.position),
                facing: pursuer.facing,
                frightened: pursuer.frightened,
                color: pursuer_color(pursuer.id, pursuer.frightened),
            })
            .collect();

        Ok(Self {
            collectibles: maze.enumerate(CellKind::Collectible),
            power_items: maze.enumerate(CellKind::PowerItem),
            maze: presentation,
            player,
            pursuers,
            hud: hud_line(query::score(world), query::lives(world)),
            banner: outcome_banner(query::outcome(world)).map(str::to_owned),
        })
    }
}

fn pursuer_color(id: PursuerId, frightened: bool) -> Color {
    if frightened {
        return palette::FRIGHTENED.lighten(0.1);
    }
    let index = usize::try_from(id.get()).unwrap_or(0) % palette::PURSUERS.len();
    palette::PURSUERS[index]
}

/// Formats the score and lives line shown above the maze.
#[must_use]
pub fn hud_line(score: u32, lives: u32) -> String {
    format!("[Score: {score}]  [Lives: {lives}]")
}

/// Banner announcing a terminal outcome.
#[must_use]
pub fn outcome_banner(outcome: MatchOutcome) -> Option<&'static str> {
    match outcome {
        MatchOutcome::Running => None,
        MatchOutcome::Won => Some("YOU WON"),
        MatchOutcome::Lost => Some("YOU DIED"),
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Maze Chase scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered. It returns `false` once there is nothing left to show.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> bool + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive size to be drawn.
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
        }
    }
}

impl Error for RenderingError {}
