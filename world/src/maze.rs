//! Immutable maze grid parsed from a text layout.

use std::collections::BTreeSet;

use maze_chase_core::{CellCoord, CellKind};
use thiserror::Error;

const WALL: char = 'X';
const FLOOR: char = ' ';
const POWER_ITEM: char = 'O';
const PURSUER_SPAWN: char = 'G';
const PLAYER_SPAWN: char = 'P';

/// Reasons a text layout cannot be turned into a maze.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout contained no rows or only empty rows.
    #[error("maze layout is empty")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} cells but the first row has {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A character does not map to any tile.
    #[error("unknown tile symbol {symbol:?} at column {column}, row {row}")]
    UnknownSymbol {
        /// Character that failed to parse.
        symbol: char,
        /// Column of the character.
        column: usize,
        /// Row of the character.
        row: usize,
    },
    /// No player spawn marker was present.
    #[error("maze layout has no player spawn")]
    MissingPlayerSpawn,
    /// More than one player spawn marker was present.
    #[error("maze layout has more than one player spawn")]
    MultiplePlayerSpawns,
    /// An open border cell would let agents leave the grid.
    #[error("border cell at column {column}, row {row} is open without a matching wrap opening")]
    UnsealedBorder {
        /// Column of the open border cell.
        column: usize,
        /// Row of the open border cell.
        row: usize,
    },
}

/// Rectangular grid of traversable and blocked cells plus the item sets derived from it.
#[derive(Clone, Debug)]
pub struct Maze {
    columns: u32,
    rows: u32,
    traversable: Vec<bool>,
    collectibles: BTreeSet<CellCoord>,
    power_items: BTreeSet<CellCoord>,
    pursuer_spawns: BTreeSet<CellCoord>,
    player_spawn: CellCoord,
}

impl Maze {
    /// Parses a layout of equal-length rows.
    ///
    /// `X` marks a wall, `O` a power item, `G` a pursuer spawn, `P` the player
    /// spawn, and a space plain floor. Every traversable cell starts with a
    /// collectible on it.
    pub fn parse<S: AsRef<str>>(layout: &[S]) -> Result<Self, LayoutError> {
        let expected = layout
            .first()
            .map(|row| row.as_ref().chars().count())
            .unwrap_or(0);
        if expected == 0 {
            return Err(LayoutError::Empty);
        }

        let mut traversable = Vec::with_capacity(expected * layout.len());
        let mut power_items = BTreeSet::new();
        let mut pursuer_spawns = BTreeSet::new();
        let mut player_spawn = None;

        for (row_index, row) in layout.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected,
                    found,
                });
            }

            for (column_index, symbol) in row.chars().enumerate() {
                let cell = CellCoord::new(column_index as u32, row_index as u32);
                match symbol {
                    WALL => traversable.push(false),
                    FLOOR => traversable.push(true),
                    POWER_ITEM => {
                        traversable.push(true);
                        let _ = power_items.insert(cell);
                    }
                    PURSUER_SPAWN => {
                        traversable.push(true);
                        let _ = pursuer_spawns.insert(cell);
                    }
                    PLAYER_SPAWN => {
                        traversable.push(true);
                        if player_spawn.replace(cell).is_some() {
                            return Err(LayoutError::MultiplePlayerSpawns);
                        }
                    }
                    _ => {
                        return Err(LayoutError::UnknownSymbol {
                            symbol,
                            column: column_index,
                            row: row_index,
                        })
                    }
                }
            }
        }

        let player_spawn = player_spawn.ok_or(LayoutError::MissingPlayerSpawn)?;
        let columns = expected as u32;
        let rows = layout.len() as u32;
        check_sealed_border(&traversable, expected, layout.len())?;

        let collectibles = traversable
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .map(|(index, _)| CellCoord::new((index % expected) as u32, (index / expected) as u32))
            .collect();

        Ok(Self {
            columns,
            rows,
            traversable,
            collectibles,
            power_items,
            pursuer_spawns,
            player_spawn,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell is a wall. Cells outside the grid are blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.traversable.get(index))
            .map_or(true, |open| !open)
    }

    /// Signed variant of [`Maze::is_blocked`] for probes that may fall off the grid.
    #[must_use]
    pub fn is_blocked_at(&self, column: i64, row: i64) -> bool {
        match (u32::try_from(column), u32::try_from(row)) {
            (Ok(column), Ok(row)) => self.is_blocked(CellCoord::new(column, row)),
            _ => true,
        }
    }

    /// Cells of the requested kind in row-major order.
    #[must_use]
    pub fn enumerate(&self, kind: CellKind) -> Vec<CellCoord> {
        let set = match kind {
            CellKind::Collectible => &self.collectibles,
            CellKind::PowerItem => &self.power_items,
            CellKind::PursuerSpawn => &self.pursuer_spawns,
        };
        let mut cells: Vec<CellCoord> = set.iter().copied().collect();
        cells.sort_by_key(|cell| (cell.row(), cell.column()));
        cells
    }

    /// Every traversable cell in row-major order.
    #[must_use]
    pub fn open_cells(&self) -> Vec<CellCoord> {
        let width = self.columns as usize;
        self.traversable
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .map(|(index, _)| CellCoord::new((index % width) as u32, (index / width) as u32))
            .collect()
    }

    /// Cell on which the player starts and respawns.
    #[must_use]
    pub fn player_spawn(&self) -> CellCoord {
        self.player_spawn
    }

    /// Reports whether the cell still holds a collectible.
    #[must_use]
    pub fn has_collectible(&self, cell: CellCoord) -> bool {
        self.collectibles.contains(&cell)
    }

    /// Number of collectibles left in the maze.
    #[must_use]
    pub fn collectibles_remaining(&self) -> usize {
        self.collectibles.len()
    }

    /// Removes the collectible at `cell`, returning whether one was present.
    pub fn remove_collectible(&mut self, cell: CellCoord) -> bool {
        self.collectibles.remove(&cell)
    }

    /// Removes the power item at `cell`, returning whether one was present.
    pub fn remove_power_item(&mut self, cell: CellCoord) -> bool {
        self.power_items.remove(&cell)
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn check_sealed_border(traversable: &[bool], width: usize, height: usize) -> Result<(), LayoutError> {
    for &row in &[0, height - 1] {
        for column in 0..width {
            if traversable[row * width + column] {
                return Err(LayoutError::UnsealedBorder { column, row });
            }
        }
    }

    for row in 0..height {
        let left = traversable[row * width];
        let right = traversable[row * width + width - 1];
        if left != right {
            let column = if left { 0 } else { width - 1 };
            return Err(LayoutError::UnsealedBorder { column, row });
        }
    }

    Ok(())
}

/// Layout of the classic 28x31 arcade maze.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
    "XP           XX            X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X XXXXOXXXXX XX XXXXXOXXXX X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X                          X",
    "X XXXX XX XXXXXXXX XX XXXX X",
    "X XXXX XX XXXXXXXX XX XXXX X",
    "X      XX    XX    XX      X",
    "XXXXXX XXXXX XX XXXXX XXXXXX",
    "XXXXXX XXXXX XX XXXXX XXXXXX",
    "XXXXXX XX     G    XX XXXXXX",
    "XXXXXX XX XXX  XXX XX XXXXXX",
    "XXXXXX XX X      X XX XXXXXX",
    "   G      X      X          ",
    "XXXXXX XX X      X XX XXXXXX",
    "XXXXXX XX XXXXXXXX XX XXXXXX",
    "XXXXXX XX    G     XX XXXXXX",
    "XXXXXX XX XXXXXXXX XX XXXXXX",
    "XXXXXX XX XXXXXXXX XX XXXXXX",
    "X            XX            X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X   XX       G        XX   X",
    "XXX XX XX XXXXXXXX XX XX XXX",
    "XXX XX XX XXXXXXXX XX XX XXX",
    "X      XX    XX    XX      X",
    "X XXXXXXXXXX XX XXXXXXXXXX X",
    "X XXXXXXXXXX XX XXXXXXXXXX X",
    "X   O                 O    X",
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
];
