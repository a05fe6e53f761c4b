#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that advances the session and lets pursuers react before the next tick.

use std::time::Duration;

use maze_chase_core::{Command, Direction, Event};
use maze_chase_system_pursuit::Pursuit;
use maze_chase_world::{self as world, query, World};
use tracing::trace;

/// Owns the authoritative world together with the systems that steer it.
#[derive(Debug)]
pub struct Session {
    world: World,
    pursuit: Pursuit,
    tick_duration: Duration,
}

impl Session {
    /// Wraps a freshly created world, seeding pursuer behavior from its rules.
    #[must_use]
    pub fn new(world: World) -> Self {
        let rules = query::rules(&world);
        let pursuit = Pursuit::new(rules.rng_seed);
        let tick_duration = rules.tick_duration();
        Self {
            world,
            pursuit,
            tick_duration,
        }
    }

    /// Read-only access to the world for queries and rendering.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the pursuer behavior system.
    #[must_use]
    pub fn pursuit(&self) -> &Pursuit {
        &self.pursuit
    }

    /// Fixed simulated duration of one frame.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Runs one frame: records the latest input, ticks the world, and applies
    /// the route assignments the pursuit system derives from the tick's events.
    ///
    /// Once the match has ended no routes are planned. Every event produced
    /// during the frame is appended to `out_events`.
    pub fn frame(&mut self, input: Option<Direction>, out_events: &mut Vec<Event>) {
        if let Some(direction) = input {
            world::apply(
                &mut self.world,
                Command::RequestDirection { direction },
                out_events,
            );
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: self.tick_duration,
            },
            &mut events,
        );
        out_events.extend(events.iter().cloned());

        loop {
            if events.is_empty() || query::outcome(&self.world).is_terminal() {
                break;
            }

            let player = query::player(&self.world);
            let mut commands = Vec::new();
            self.pursuit.handle(
                &events,
                query::behavior_mode(&self.world),
                query::power(&self.world),
                player.as_ref(),
                query::maze(&self.world),
                &mut commands,
            );

            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
            out_events.extend(events.iter().cloned());
        }

        trace!(
            tick = query::tick_index(&self.world),
            score = query::score(&self.world),
            "frame resolved"
        );
    }
}
