#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuer behavior system that plans routes toward the player or random cells.

use std::collections::BTreeMap;

use maze_chase_core::{
    BehaviorMode, CellCoord, Command, Event, PlayerSnapshot, PowerSnapshot, PursuerId,
    PursuerState,
};
use maze_chase_world::{find_path, Maze};
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use tracing::{debug, trace};

/// Pure system that reacts to pursuer events and emits path assignments.
#[derive(Debug)]
pub struct Pursuit {
    rng: ChaCha8Rng,
    states: BTreeMap<PursuerId, PursuerState>,
    open_cells: Vec<CellCoord>,
}

impl Pursuit {
    /// Creates a system whose wander destinations are drawn from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            states: BTreeMap::new(),
            open_cells: Vec::new(),
        }
    }

    /// Behavior state recorded for the pursuer by the last planned route.
    #[must_use]
    pub fn state(&self, pursuer: PursuerId) -> Option<PursuerState> {
        self.states.get(&pursuer).copied()
    }

    /// Consumes session events and read-only views to emit route assignments.
    ///
    /// A pursuer without a target receives a route, and every waypoint a
    /// pursuer reaches triggers a fresh route for the state it should be in.
    /// Routes are never cached past the next waypoint.
    pub fn handle(
        &mut self,
        events: &[Event],
        mode: BehaviorMode,
        power: PowerSnapshot,
        player: Option<&PlayerSnapshot>,
        maze: &Maze,
        out: &mut Vec<Command>,
    ) {
        let desired = desired_state(mode, power);

        for event in events {
            match event {
                Event::PursuerPathNeeded { pursuer, cell } => {
                    self.plan(*pursuer, *cell, desired, player, maze, out);
                }
                Event::PursuerWaypointReached { pursuer, cell, .. } => {
                    self.plan(*pursuer, *cell, desired, player, maze, out);
                }
                Event::PursuerConsumed { pursuer, .. } => {
                    let _ = self.states.remove(pursuer);
                }
                _ => {}
            }
        }
    }

    fn plan(
        &mut self,
        pursuer: PursuerId,
        from: CellCoord,
        state: PursuerState,
        player: Option<&PlayerSnapshot>,
        maze: &Maze,
        out: &mut Vec<Command>,
    ) {
        let destination = match state {
            PursuerState::SeekPlayer => match player {
                Some(player) => player.cell,
                None => return,
            },
            PursuerState::Wander => match self.wander_destination(maze) {
                Some(cell) => cell,
                None => return,
            },
        };

        let path = find_path(maze, from, destination);
        if path.is_empty() {
            debug!(pursuer = pursuer.get(), ?from, ?destination, "no route to destination");
        } else {
            trace!(pursuer = pursuer.get(), ?state, ?from, ?destination, length = path.len(), "planned route");
        }

        let _ = self.states.insert(pursuer, state);
        out.push(Command::AssignPursuerPath {
            pursuer,
            state,
            path,
        });
    }

    fn wander_destination(&mut self, maze: &Maze) -> Option<CellCoord> {
        if self.open_cells.is_empty() {
            self.open_cells = maze.open_cells();
        }
        if self.open_cells.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.open_cells.len());
        self.open_cells.get(index).copied()
    }
}

/// State a pursuer should plan for under the shared mode and power state.
#[must_use]
pub fn desired_state(mode: BehaviorMode, power: PowerSnapshot) -> PursuerState {
    if mode == BehaviorMode::Chase && !power.active {
        PursuerState::SeekPlayer
    } else {
        PursuerState::Wander
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unpowered_chase_seeks_the_player() {
        let idle = PowerSnapshot::default();
        let powered = PowerSnapshot {
            active: true,
            ..PowerSnapshot::default()
        };

        assert_eq!(desired_state(BehaviorMode::Chase, idle), PursuerState::SeekPlayer);
        assert_eq!(desired_state(BehaviorMode::Chase, powered), PursuerState::Wander);
        assert_eq!(desired_state(BehaviorMode::Scatter, idle), PursuerState::Wander);
        assert_eq!(desired_state(BehaviorMode::Scatter, powered), PursuerState::Wander);
    }
}
