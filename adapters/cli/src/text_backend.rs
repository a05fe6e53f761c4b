//! Headless backend that prints ASCII snapshots of the scene.

use std::{io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use maze_chase_rendering::{FrameInput, Presentation, RenderingBackend, Scene};

use crate::autopilot::Autopilot;

const WALL: char = '#';
const COLLECTIBLE: char = '.';
const POWER_ITEM: char = 'o';
const PLAYER_OPEN: char = 'C';
const PLAYER_CLOSED: char = 'c';
const PURSUER: char = 'G';
const FRIGHTENED_PURSUER: char = 'g';

/// Drives the simulation for a fixed number of frames and writes snapshots to `out`.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    out: W,
    autopilot: Autopilot,
    frame_duration: Duration,
    max_frames: u64,
    render_every: u64,
}

impl<W: Write> TextBackend<W> {
    pub(crate) fn new(
        out: W,
        autopilot: Autopilot,
        frame_duration: Duration,
        max_frames: u64,
        render_every: u64,
    ) -> Self {
        Self {
            out,
            autopilot,
            frame_duration,
            max_frames,
            render_every: render_every.max(1),
        }
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> bool + 'static,
    {
        let Presentation {
            window_title,
            mut scene,
            ..
        } = presentation;

        writeln!(self.out, "== {window_title} ==").context("failed to write title")?;
        write_frame(&mut self.out, 0, &scene)?;

        for frame in 1..=self.max_frames {
            let input = FrameInput {
                direction: self.autopilot.next_direction(),
                quit: frame == self.max_frames,
            };
            let running = update_scene(self.frame_duration, input, &mut scene);
            if !running || frame % self.render_every == 0 {
                write_frame(&mut self.out, frame, &scene)?;
            }
            if !running {
                break;
            }
        }

        self.out.flush().context("failed to flush output")
    }
}

fn write_frame<W: Write>(out: &mut W, frame: u64, scene: &Scene) -> AnyResult<()> {
    writeln!(out, "-- frame {frame} -- {}", scene.hud).context("failed to write frame header")?;
    for row in render_rows(scene) {
        writeln!(out, "{row}").context("failed to write maze row")?;
    }
    if let Some(banner) = &scene.banner {
        writeln!(out, "{banner}").context("failed to write banner")?;
    }
    Ok(())
}

/// Draws the scene as one string per maze row.
pub(crate) fn render_rows(scene: &Scene) -> Vec<String> {
    let columns = scene.maze.columns as usize;
    let rows = scene.maze.rows as usize;
    let mut grid = vec![vec![' '; columns]; rows];

    let mut put = |column: usize, row: usize, symbol: char| {
        if let Some(slot) = grid.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            *slot = symbol;
        }
    };

    for cell in &scene.maze.walls {
        put(cell.column() as usize, cell.row() as usize, WALL);
    }
    for cell in &scene.collectibles {
        put(cell.column() as usize, cell.row() as usize, COLLECTIBLE);
    }
    for cell in &scene.power_items {
        put(cell.column() as usize, cell.row() as usize, POWER_ITEM);
    }

    let tile_length = scene.maze.tile_length;
    for pursuer in &scene.pursuers {
        if let Some((column, row)) = nearest_cell(pursuer.position, tile_length, columns) {
            let symbol = if pursuer.frightened {
                FRIGHTENED_PURSUER
            } else {
                PURSUER
            };
            put(column, row, symbol);
        }
    }
    if let Some(player) = &scene.player {
        if let Some((column, row)) = nearest_cell(player.position, tile_length, columns) {
            let symbol = if player.mouth_open {
                PLAYER_OPEN
            } else {
                PLAYER_CLOSED
            };
            put(column, row, symbol);
        }
    }

    grid.into_iter()
        .map(|cells| cells.into_iter().collect())
        .collect()
}

/// Cell whose area holds most of a footprint that starts at `position`.
fn nearest_cell(position: Vec2, tile_length: f32, columns: usize) -> Option<(usize, usize)> {
    if tile_length <= 0.0 || columns == 0 {
        return None;
    }
    let cell = ((position + Vec2::splat(tile_length * 0.5)) / tile_length).floor();
    if cell.x < 0.0 || cell.y < 0.0 {
        return None;
    }
    Some((cell.x as usize % columns, cell.y as usize))
}
