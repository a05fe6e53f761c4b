//! Pixel-step movement and wall probing shared by the player and pursuers.

use maze_chase_core::{Direction, PixelPosition, AGENT_FOOTPRINT, TILE_PIXELS};

use crate::maze::Maze;

/// Horizontal wrapping policy applied while probing for walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrap {
    /// Columns outside the grid are blocked.
    None,
    /// Columns outside the grid continue on the opposite edge.
    Horizontal,
}

/// Position reached by moving a single pixel in `direction`.
#[must_use]
pub fn step(position: PixelPosition, direction: Direction) -> PixelPosition {
    let (dx, dy) = direction.delta();
    position.offset(dx, dy)
}

/// Reports whether a square footprint at `position` overlaps any blocked cell.
///
/// Edges that merely touch a wall do not count as overlap.
#[must_use]
pub fn collides(maze: &Maze, position: PixelPosition, footprint: i32, wrap: Wrap) -> bool {
    if footprint <= 0 {
        return false;
    }

    let first_column = position.x().div_euclid(TILE_PIXELS);
    let last_column = (position.x() + footprint - 1).div_euclid(TILE_PIXELS);
    let first_row = position.y().div_euclid(TILE_PIXELS);
    let last_row = (position.y() + footprint - 1).div_euclid(TILE_PIXELS);
    let columns = i64::from(maze.columns());

    for row in first_row..=last_row {
        for column in first_column..=last_column {
            let column = match wrap {
                Wrap::Horizontal if columns > 0 => i64::from(column).rem_euclid(columns),
                _ => i64::from(column),
            };
            if maze.is_blocked_at(column, i64::from(row)) {
                return true;
            }
        }
    }

    false
}

/// Axis-aligned heading from `position` toward `target`.
///
/// Returns `None` when the two coincide or differ along both axes.
#[must_use]
pub fn direction_toward(position: PixelPosition, target: PixelPosition) -> Option<Direction> {
    let dx = target.x() - position.x();
    let dy = target.y() - position.y();
    match (dx, dy) {
        (0, 0) => None,
        (0, dy) if dy > 0 => Some(Direction::Down),
        (0, _) => Some(Direction::Up),
        (dx, 0) if dx > 0 => Some(Direction::Right),
        (_, 0) => Some(Direction::Left),
        _ => None,
    }
}

/// Movement state shared by every agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mover {
    position: PixelPosition,
    facing: Direction,
    buffered: Direction,
    last_unblocked: Direction,
    last_safe: PixelPosition,
}

impl Mover {
    /// Creates a resting mover at `position`.
    #[must_use]
    pub fn new(position: PixelPosition) -> Self {
        Self {
            position,
            facing: Direction::None,
            buffered: Direction::None,
            last_unblocked: Direction::None,
            last_safe: position,
        }
    }

    /// Current pixel position.
    #[must_use]
    pub fn position(&self) -> PixelPosition {
        self.position
    }

    /// Direction the mover currently travels in.
    #[must_use]
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Requested direction waiting for an opening.
    #[must_use]
    pub fn buffered(&self) -> Direction {
        self.buffered
    }

    /// Stores a newly requested direction.
    pub fn request(&mut self, direction: Direction) {
        self.buffered = direction;
    }

    /// Places the mover at `position` with no movement intent.
    pub fn reset(&mut self, position: PixelPosition) {
        *self = Self::new(position);
    }

    /// Advances one pixel using buffered turning.
    ///
    /// The buffered direction wins when its next pixel is clear, otherwise the
    /// current direction is kept, otherwise the mover halts and falls back to
    /// the last direction that was not blocked. Any resulting overlap with a
    /// wall rolls the position back to where the tick started.
    pub fn advance(&mut self, maze: &Maze, wrap: Wrap) {
        self.last_safe = self.position;

        if !self.buffered.is_none() && !self.blocked(maze, self.buffered, wrap) {
            self.facing = self.buffered;
            self.move_one(self.buffered);
        } else if !self.facing.is_none() && !self.blocked(maze, self.facing, wrap) {
            self.move_one(self.facing);
        } else {
            self.facing = self.last_unblocked;
        }

        if collides(maze, self.position, AGENT_FOOTPRINT, wrap) {
            self.position = self.last_safe;
        }

        if wrap == Wrap::Horizontal {
            let width = i32::try_from(maze.columns()).unwrap_or(0) * TILE_PIXELS;
            if width > 0 {
                self.position = PixelPosition::new(self.position.x().rem_euclid(width), self.position.y());
            }
        }
    }

    /// Moves one pixel in `direction` unless that would overlap a wall.
    ///
    /// Returns whether the mover actually moved.
    pub fn follow(&mut self, maze: &Maze, direction: Direction) -> bool {
        self.last_safe = self.position;
        if direction.is_none() || self.blocked(maze, direction, Wrap::None) {
            return false;
        }
        self.facing = direction;
        self.move_one(direction);
        true
    }

    /// Marks the mover as standing still without touching its position.
    pub fn halt(&mut self) {
        self.facing = Direction::None;
    }

    fn blocked(&self, maze: &Maze, direction: Direction, wrap: Wrap) -> bool {
        collides(maze, step(self.position, direction), AGENT_FOOTPRINT, wrap)
    }

    fn move_one(&mut self, direction: Direction) {
        self.position = step(self.position, direction);
        self.last_unblocked = direction;
    }
}

#[cfg(test)]
mod tests {
    use maze_chase_core::CellCoord;

    use super::*;

    fn corridor() -> Maze {
        Maze::parse(&["XXXXXX", "XX XXX", "XP   X", "XXXXXX"]).expect("layout is valid")
    }

    fn cell(column: u32, row: u32) -> PixelPosition {
        CellCoord::new(column, row).origin()
    }

    #[test]
    fn step_moves_a_single_pixel() {
        let origin = PixelPosition::new(64, 64);
        assert_eq!(step(origin, Direction::Up), PixelPosition::new(64, 63));
        assert_eq!(step(origin, Direction::Right), PixelPosition::new(65, 64));
        assert_eq!(step(origin, Direction::None), origin);
    }

    #[test]
    fn touching_a_wall_is_not_a_collision() {
        let maze = corridor();
        assert!(!collides(&maze, cell(1, 2), AGENT_FOOTPRINT, Wrap::None));
        assert!(collides(&maze, step(cell(1, 2), Direction::Up), AGENT_FOOTPRINT, Wrap::None));
        assert!(collides(&maze, step(cell(1, 2), Direction::Left), AGENT_FOOTPRINT, Wrap::None));
        assert!(!collides(&maze, step(cell(1, 2), Direction::Right), AGENT_FOOTPRINT, Wrap::None));
    }

    #[test]
    fn wrap_probes_the_opposite_edge() {
        let maze = Maze::parse(&["XXXX", " P  ", "XXXX"]).expect("layout is valid");
        let left_edge = PixelPosition::new(-1, TILE_PIXELS);

        assert!(collides(&maze, left_edge, AGENT_FOOTPRINT, Wrap::None));
        assert!(!collides(&maze, left_edge, AGENT_FOOTPRINT, Wrap::Horizontal));
    }

    #[test]
    fn wrapping_mover_reenters_on_the_far_side() {
        let maze = Maze::parse(&["XXXX", " P  ", "XXXX"]).expect("layout is valid");
        let mut mover = Mover::new(cell(0, 1));
        mover.request(Direction::Left);

        mover.advance(&maze, Wrap::Horizontal);

        assert_eq!(mover.position(), PixelPosition::new(4 * TILE_PIXELS - 1, TILE_PIXELS));
        assert_eq!(mover.facing(), Direction::Left);
    }

    #[test]
    fn buffered_turn_waits_for_an_opening() {
        let maze = corridor();
        let mut mover = Mover::new(cell(3, 2));
        mover.request(Direction::Left);
        mover.advance(&maze, Wrap::None);
        assert_eq!(mover.facing(), Direction::Left);

        mover.request(Direction::Up);
        let mut ticks = 0;
        while mover.facing() != Direction::Up {
            mover.advance(&maze, Wrap::None);
            ticks += 1;
            assert!(ticks <= TILE_PIXELS, "turn never happened");
        }

        assert_eq!(mover.position(), step(cell(2, 2), Direction::Up));
        assert_eq!(mover.buffered(), Direction::Up);
    }

    #[test]
    fn blocked_mover_halts_in_place() {
        let maze = corridor();
        let mut mover = Mover::new(cell(1, 2));
        mover.request(Direction::Left);

        mover.advance(&maze, Wrap::None);

        assert_eq!(mover.position(), cell(1, 2));
    }

    #[test]
    fn movement_never_enters_walls() {
        let maze = corridor();
        let start_positions = (TILE_PIXELS..4 * TILE_PIXELS + 1)
            .map(|x| PixelPosition::new(x, 2 * TILE_PIXELS))
            .chain((TILE_PIXELS..2 * TILE_PIXELS + 1).map(|y| PixelPosition::new(2 * TILE_PIXELS, y)));

        for start in start_positions {
            if collides(&maze, start, AGENT_FOOTPRINT, Wrap::None) {
                continue;
            }
            for moving in Direction::MOVES {
                for requested in Direction::MOVES {
                    let mut mover = Mover::new(start);
                    mover.request(moving);
                    mover.advance(&maze, Wrap::None);
                    let before = mover.position();
                    mover.request(requested);
                    mover.advance(&maze, Wrap::None);
                    let after = mover.position();

                    assert!(!collides(&maze, after, AGENT_FOOTPRINT, Wrap::None));
                    if collides(&maze, step(before, requested), AGENT_FOOTPRINT, Wrap::None) {
                        let (dx, dy) = requested.delta();
                        let progress = (after.x() - before.x()) * dx + (after.y() - before.y()) * dy;
                        assert!(progress <= 0, "moved into a wall from {before:?} toward {requested:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn follow_rejects_blocked_steps() {
        let maze = corridor();
        let mut mover = Mover::new(cell(1, 2));

        assert!(!mover.follow(&maze, Direction::Up));
        assert_eq!(mover.position(), cell(1, 2));
        assert!(mover.follow(&maze, Direction::Right));
        assert_eq!(mover.position(), step(cell(1, 2), Direction::Right));
        assert_eq!(mover.facing(), Direction::Right);
    }

    #[test]
    fn heading_follows_the_single_differing_axis() {
        let origin = cell(2, 2);
        assert_eq!(direction_toward(origin, cell(2, 3)), Some(Direction::Down));
        assert_eq!(direction_toward(origin, cell(2, 1)), Some(Direction::Up));
        assert_eq!(direction_toward(origin, cell(1, 2)), Some(Direction::Left));
        assert_eq!(direction_toward(origin, cell(3, 2)), Some(Direction::Right));
        assert_eq!(direction_toward(origin, origin), None);
        assert_eq!(direction_toward(origin, cell(3, 3)), None);
    }
}
