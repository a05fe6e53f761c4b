#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game session state for Maze Chase.

pub mod maze;
pub mod motion;
pub mod navigation;
pub mod timers;

use std::{collections::VecDeque, time::Duration};

use maze_chase_core::{
    BehaviorMode, CellCoord, CellKind, Command, Event, ItemKind, MatchOutcome,
    PixelPosition, PursuerId, PursuerState, Rules, AGENT_FOOTPRINT, COLLECTIBLE_MARKER,
    POWER_MARKER, TILE_PIXELS, WELCOME_BANNER,
};
use tracing::{debug, info};

pub use maze::{LayoutError, Maze, CLASSIC_LAYOUT};
pub use navigation::find_path;

use motion::{direction_toward, Mover, Wrap};
use timers::{FiredTimer, PhaseSchedule, TimerKind, Timers};

/// Represents the authoritative Maze Chase session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    rules: Rules,
    maze: Maze,
    agents: Vec<Agent>,
    mode: BehaviorMode,
    power_active: bool,
    schedule: PhaseSchedule,
    timers: Timers,
    score: u32,
    lives: u32,
    outcome: MatchOutcome,
    tick_index: u64,
}

impl World {
    /// Creates a session from a text layout and a set of match rules.
    ///
    /// The player starts on its spawn cell, one pursuer starts on every
    /// pursuer spawn in row-major order, and the phase schedule begins its
    /// first stage.
    pub fn new<S: AsRef<str>>(layout: &[S], rules: Rules) -> Result<Self, LayoutError> {
        let maze = Maze::parse(layout)?;

        let mut agents = vec![Agent::player(maze.player_spawn().origin())];
        agents.extend(
            maze.enumerate(CellKind::PursuerSpawn)
                .into_iter()
                .zip(0_u32..)
                .map(|(cell, id)| Agent::pursuer(PursuerId::new(id), cell.origin())),
        );

        let schedule = PhaseSchedule::new(rules.phase_schedule.clone());
        let mode = schedule.initial_mode();
        let mut timers = Timers::default();
        if let Some(duration) = schedule.stage_duration(mode) {
            timers.schedule_once(TimerKind::ModeSwitch, duration);
        }
        timers.schedule_repeating(TimerKind::MouthToggle, rules.mouth_interval());

        Ok(Self {
            banner: WELCOME_BANNER,
            mode,
            lives: rules.lives,
            rules,
            maze,
            agents,
            power_active: false,
            schedule,
            timers,
            score: 0,
            outcome: MatchOutcome::Running,
            tick_index: 0,
        })
    }

    /// Creates a session on the classic arcade layout.
    pub fn classic(rules: Rules) -> Result<Self, LayoutError> {
        Self::new(&CLASSIC_LAYOUT, rules)
    }

    fn player(&self) -> Option<(&Mover, &PlayerRole)> {
        self.agents.iter().find_map(|agent| match &agent.role {
            Role::Player(player) => Some((&agent.mover, player)),
            Role::Pursuer(_) => None,
        })
    }

    fn player_mut(&mut self) -> Option<(&mut Mover, &mut PlayerRole)> {
        self.agents.iter_mut().find_map(|agent| match &mut agent.role {
            Role::Player(player) => Some((&mut agent.mover, player)),
            Role::Pursuer(_) => None,
        })
    }

    fn pursuers(&self) -> impl Iterator<Item = (&Mover, &PursuerRole)> {
        self.agents.iter().filter_map(|agent| match &agent.role {
            Role::Pursuer(pursuer) => Some((&agent.mover, pursuer)),
            Role::Player(_) => None,
        })
    }

    fn pursuer_mut(&mut self, id: PursuerId) -> Option<(&mut Mover, &mut PursuerRole)> {
        self.agents.iter_mut().find_map(|agent| match &mut agent.role {
            Role::Pursuer(pursuer) if pursuer.id == id => Some((&mut agent.mover, pursuer)),
            _ => None,
        })
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.outcome.is_terminal() {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.timers.advance_clock(dt);
        while let Some(fired) = self.timers.pop_due() {
            self.handle_timer(fired, out_events);
        }

        for agent in &mut self.agents {
            agent.advance(&self.maze, out_events);
        }

        self.resolve_collectibles(out_events);
        self.resolve_power_items(out_events);
        self.resolve_contacts(out_events);
    }

    fn handle_timer(&mut self, fired: FiredTimer, out_events: &mut Vec<Event>) {
        match fired.kind {
            TimerKind::ModeSwitch => {
                let (mode, duration) = self.schedule.fire(self.mode);
                if let Some(duration) = duration {
                    self.timers
                        .schedule_at(TimerKind::ModeSwitch, fired.deadline.saturating_add(duration));
                }
                self.set_mode(mode, out_events);
            }
            TimerKind::PowerExpiry => {
                self.power_active = false;
                info!("power state expired");
                out_events.push(Event::PowerStateChanged { active: false });
            }
            TimerKind::MouthToggle => {
                if let Some((_, player)) = self.player_mut() {
                    player.mouth_open = !player.mouth_open;
                }
            }
        }
    }

    fn set_mode(&mut self, mode: BehaviorMode, out_events: &mut Vec<Event>) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        info!(?mode, phase = self.schedule.index(), "behavior mode changed");
        out_events.push(Event::BehaviorModeChanged { mode });
    }

    fn resolve_collectibles(&mut self, out_events: &mut Vec<Event>) {
        let Some((mover, _)) = self.player() else {
            return;
        };
        let position = mover.position();

        let mut collected = false;
        for (cell, origin) in covered_cells(position, self.maze.columns()) {
            if !overlaps(position, AGENT_FOOTPRINT, marker(origin), COLLECTIBLE_MARKER) {
                continue;
            }
            if self.maze.remove_collectible(cell) {
                collected = true;
                let points = self.rules.collectible_points;
                self.score = self.score.saturating_add(points);
                debug!(?cell, points, score = self.score, "collectible picked up");
                out_events.push(Event::ItemCollected {
                    cell,
                    kind: ItemKind::Collectible,
                    points,
                });
            }
        }

        if collected && self.maze.collectibles_remaining() == 0 {
            self.finish(MatchOutcome::Won, out_events);
        }
    }

    fn resolve_power_items(&mut self, out_events: &mut Vec<Event>) {
        let Some((mover, _)) = self.player() else {
            return;
        };
        let position = mover.position();

        for (cell, origin) in covered_cells(position, self.maze.columns()) {
            if !overlaps(position, AGENT_FOOTPRINT, marker(origin), POWER_MARKER) {
                continue;
            }
            if !self.maze.remove_power_item(cell) {
                continue;
            }

            if self.power_active {
                debug!(?cell, "power item picked up while already powered");
                out_events.push(Event::ItemCollected {
                    cell,
                    kind: ItemKind::PowerItem,
                    points: 0,
                });
                continue;
            }

            let points = self.rules.power_item_points;
            self.score = self.score.saturating_add(points);
            debug!(?cell, points, score = self.score, "power item picked up");
            out_events.push(Event::ItemCollected {
                cell,
                kind: ItemKind::PowerItem,
                points,
            });

            self.power_active = true;
            self.timers
                .schedule_once(TimerKind::PowerExpiry, self.rules.power_duration());
            info!(duration = ?self.rules.power_duration(), "power state activated");
            out_events.push(Event::PowerStateChanged { active: true });
            self.set_mode(BehaviorMode::Scatter, out_events);
        }
    }

    fn resolve_contacts(&mut self, out_events: &mut Vec<Event>) {
        let Some((mover, _)) = self.player() else {
            return;
        };
        let position = mover.position();
        let width = i32::try_from(self.maze.columns()).unwrap_or(0) * TILE_PIXELS;
        let wrapped = position.offset(-width, 0);

        let touching: Vec<PursuerId> = self
            .pursuers()
            .filter(|(mover, _)| {
                let pursuer = mover.position();
                overlaps(position, AGENT_FOOTPRINT, pursuer, AGENT_FOOTPRINT)
                    || overlaps(wrapped, AGENT_FOOTPRINT, pursuer, AGENT_FOOTPRINT)
            })
            .map(|(_, pursuer)| pursuer.id)
            .collect();
        if touching.is_empty() {
            return;
        }

        if self.power_active {
            let points = self.rules.pursuer_points;
            for id in &touching {
                self.score = self.score.saturating_add(points);
                info!(pursuer = id.get(), points, score = self.score, "pursuer consumed");
                out_events.push(Event::PursuerConsumed {
                    pursuer: *id,
                    points,
                });
            }
            self.agents.retain(|agent| match &agent.role {
                Role::Pursuer(pursuer) => !touching.contains(&pursuer.id),
                Role::Player(_) => true,
            });
            return;
        }

        if self.outcome == MatchOutcome::Won {
            return;
        }

        self.lives = self.lives.saturating_sub(1);
        info!(lives_remaining = self.lives, "player lost a life");
        out_events.push(Event::PlayerLostLife {
            lives_remaining: self.lives,
        });

        if self.lives == 0 {
            self.agents
                .retain(|agent| !matches!(agent.role, Role::Player(_)));
            self.timers.cancel(TimerKind::MouthToggle);
            self.finish(MatchOutcome::Lost, out_events);
        } else if let Some((mover, player)) = self.player_mut() {
            mover.reset(player.spawn);
        }
    }

    fn finish(&mut self, outcome: MatchOutcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_terminal() {
            return;
        }
        self.outcome = outcome;
        info!(?outcome, score = self.score, "match ended");
        out_events.push(Event::MatchEnded { outcome });
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RequestDirection { direction } => {
            if world.outcome.is_terminal() {
                return;
            }
            if let Some((mover, _)) = world.player_mut() {
                mover.request(direction);
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::AssignPursuerPath {
            pursuer,
            state,
            path,
        } => {
            if world.outcome.is_terminal() {
                return;
            }
            if let Some((mover, role)) = world.pursuer_mut(pursuer) {
                if !role.assign(mover, state, path) {
                    debug!(pursuer = pursuer.get(), "rejected path that does not start beside the pursuer");
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use super::{resting_cell, timers::TimerKind, World};
    use maze_chase_core::{
        BehaviorMode, MatchOutcome, PlayerSnapshot, PowerSnapshot, PursuerSnapshot, PursuerView,
        Rules,
    };

    use crate::maze::Maze;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the maze and its remaining items.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Rules the session was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Captures the player's state, or `None` once the player left play.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        world.player().map(|(mover, player)| PlayerSnapshot {
            position: mover.position(),
            cell: resting_cell(mover.position()),
            facing: mover.facing(),
            buffered: mover.buffered(),
            mouth_open: player.mouth_open,
        })
    }

    /// Captures a read-only view of the pursuers still in play.
    #[must_use]
    pub fn pursuer_view(world: &World) -> PursuerView {
        let snapshots = world
            .pursuers()
            .map(|(mover, pursuer)| PursuerSnapshot {
                id: pursuer.id,
                position: mover.position(),
                cell: resting_cell(mover.position()),
                facing: mover.facing(),
                state: pursuer.state,
                target: pursuer.target,
                queued_waypoints: pursuer.path.len(),
                frightened: world.power_active,
            })
            .collect();
        PursuerView::from_snapshots(snapshots)
    }

    /// Shared pursuer disposition.
    #[must_use]
    pub fn behavior_mode(world: &World) -> BehaviorMode {
        world.mode
    }

    /// Whether the power state is active and how long it still lasts.
    #[must_use]
    pub fn power(world: &World) -> PowerSnapshot {
        let remaining = if world.power_active {
            world
                .timers
                .remaining(TimerKind::PowerExpiry)
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };
        PowerSnapshot {
            active: world.power_active,
            remaining,
        }
    }

    /// Points accumulated so far.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Current lifecycle stage of the match.
    #[must_use]
    pub fn outcome(world: &World) -> MatchOutcome {
        world.outcome
    }

    /// Index of the active phase schedule entry.
    #[must_use]
    pub fn phase_index(world: &World) -> usize {
        world.schedule.index()
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time elapsed since the session started.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.timers.now()
    }

    /// Mouth animation frame of the player, closed once the player is gone.
    #[must_use]
    pub fn mouth_open(world: &World) -> bool {
        world
            .player()
            .map_or(false, |(_, player)| player.mouth_open)
    }
}

/// Movement data shared by every agent plus its role-specific fields.
#[derive(Clone, Debug)]
struct Agent {
    mover: Mover,
    role: Role,
}

#[derive(Clone, Debug)]
enum Role {
    Player(PlayerRole),
    Pursuer(PursuerRole),
}

#[derive(Clone, Debug)]
struct PlayerRole {
    spawn: PixelPosition,
    mouth_open: bool,
}

#[derive(Clone, Debug)]
struct PursuerRole {
    id: PursuerId,
    target: Option<CellCoord>,
    path: VecDeque<CellCoord>,
    state: Option<PursuerState>,
}

impl Agent {
    fn player(spawn: PixelPosition) -> Self {
        Self {
            mover: Mover::new(spawn),
            role: Role::Player(PlayerRole {
                spawn,
                mouth_open: false,
            }),
        }
    }

    fn pursuer(id: PursuerId, spawn: PixelPosition) -> Self {
        Self {
            mover: Mover::new(spawn),
            role: Role::Pursuer(PursuerRole {
                id,
                target: None,
                path: VecDeque::new(),
                state: None,
            }),
        }
    }

    fn advance(&mut self, maze: &Maze, out_events: &mut Vec<Event>) {
        match &mut self.role {
            Role::Player(_) => self.mover.advance(maze, Wrap::Horizontal),
            Role::Pursuer(pursuer) => pursuer.advance(&mut self.mover, maze, out_events),
        }
    }
}

impl PursuerRole {
    fn advance(&mut self, mover: &mut Mover, maze: &Maze, out_events: &mut Vec<Event>) {
        let Some(target) = self.target else {
            mover.halt();
            self.request_path(mover, out_events);
            return;
        };

        let moved = direction_toward(mover.position(), target.origin())
            .map_or(false, |direction| mover.follow(maze, direction));
        if !moved {
            mover.halt();
            self.path.clear();
            self.target = realign_cell(mover.position());
            if self.target.is_none() {
                self.request_path(mover, out_events);
            }
            return;
        }

        if mover.position() == target.origin() {
            self.target = self.path.pop_front();
            out_events.push(Event::PursuerWaypointReached {
                pursuer: self.id,
                cell: target,
                path_exhausted: self.target.is_none(),
            });
        }
    }

    fn request_path(&self, mover: &Mover, out_events: &mut Vec<Event>) {
        out_events.push(Event::PursuerPathNeeded {
            pursuer: self.id,
            cell: resting_cell(mover.position()),
        });
    }

    /// Installs `path` as the active route when it starts beside the pursuer's
    /// resting cell and every waypoint follows the previous one.
    fn assign(&mut self, mover: &Mover, state: PursuerState, path: Vec<CellCoord>) -> bool {
        let position = mover.position();
        let cell = resting_cell(position);
        if position != cell.origin() {
            return false;
        }

        let contiguous = std::iter::once(cell)
            .chain(path.iter().copied())
            .zip(path.iter().copied())
            .all(|(from, to)| from.manhattan_distance(to) == 1);
        if !contiguous {
            return false;
        }

        self.state = Some(state);
        self.path = path.into();
        self.target = self.path.pop_front();
        true
    }
}

/// Cell whose upper-left corner contains `position`, clamped to the grid origin.
fn resting_cell(position: PixelPosition) -> CellCoord {
    PixelPosition::new(position.x().max(0), position.y().max(0))
        .cell()
        .unwrap_or(CellCoord::new(0, 0))
}

/// Cell a stranded pursuer should walk back to, or `None` when it already rests on one.
fn realign_cell(position: PixelPosition) -> Option<CellCoord> {
    let nearest = resting_cell(position.offset(TILE_PIXELS / 2, TILE_PIXELS / 2));
    (nearest.origin() != position).then_some(nearest)
}

/// Grid cells under an agent footprint paired with their unwrapped pixel origins.
fn covered_cells(position: PixelPosition, columns: u32) -> Vec<(CellCoord, PixelPosition)> {
    let columns = i32::try_from(columns).unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let first_column = position.x().div_euclid(TILE_PIXELS);
    let last_column = (position.x() + AGENT_FOOTPRINT - 1).div_euclid(TILE_PIXELS);
    let first_row = position.y().div_euclid(TILE_PIXELS);
    let last_row = (position.y() + AGENT_FOOTPRINT - 1).div_euclid(TILE_PIXELS);

    let mut cells = Vec::new();
    for row in first_row..=last_row {
        let Ok(grid_row) = u32::try_from(row) else {
            continue;
        };
        for column in first_column..=last_column {
            let Ok(grid_column) = u32::try_from(column.rem_euclid(columns)) else {
                continue;
            };
            cells.push((
                CellCoord::new(grid_column, grid_row),
                PixelPosition::new(column * TILE_PIXELS, row * TILE_PIXELS),
            ));
        }
    }
    cells
}

/// Upper-left corner of an item marker drawn inside the cell at `origin`.
fn marker(origin: PixelPosition) -> PixelPosition {
    origin.offset(TILE_PIXELS / 2, TILE_PIXELS / 2)
}

/// Strict overlap test between two squares; shared edges do not count.
fn overlaps(a: PixelPosition, a_size: i32, b: PixelPosition, b_size: i32) -> bool {
    a.x() < b.x() + b_size
        && b.x() < a.x() + a_size
        && a.y() < b.y() + b_size
        && b.y() < a.y() + a_size
}

#[cfg(test)]
mod tests {
    use maze_chase_core::Direction;

    use super::*;

    fn world(layout: &[&str]) -> World {
        World::new(layout, Rules::default()).expect("layout is valid")
    }

    fn tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(10),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn new_world_places_agents_on_spawns() {
        let world = World::classic(Rules::default()).expect("classic layout is valid");

        let player = query::player(&world).expect("player present");
        assert_eq!(player.cell, CellCoord::new(1, 1));
        assert_eq!(player.facing, Direction::None);

        let pursuers = query::pursuer_view(&world).into_vec();
        assert_eq!(pursuers.len(), 4);
        assert_eq!(pursuers[0].id, PursuerId::new(0));
        assert_eq!(pursuers[0].cell, CellCoord::new(14, 11));
        assert_eq!(query::behavior_mode(&world), BehaviorMode::Scatter);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn malformed_layout_aborts_construction() {
        let error = World::new(&["XXXX", "X  X", "XXXX"], Rules::default()).unwrap_err();
        assert_eq!(error, LayoutError::MissingPlayerSpawn);
    }

    #[test]
    fn idle_pursuers_request_paths_every_tick() {
        let mut world = world(&["XXXXXX", "XP  GX", "XXXXXX"]);

        for _ in 0..3 {
            let events = tick(&mut world);
            let requests = events
                .iter()
                .filter(|event| matches!(event, Event::PursuerPathNeeded { .. }))
                .count();
            assert_eq!(requests, 1);
        }
    }

    #[test]
    fn pursuers_walk_assigned_paths_one_waypoint_at_a_time() {
        let mut world = world(&["XXXXXX", "XP  GX", "XXXXXX"]);
        let id = PursuerId::new(0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignPursuerPath {
                pursuer: id,
                state: PursuerState::Wander,
                path: vec![CellCoord::new(3, 1), CellCoord::new(2, 1)],
            },
            &mut events,
        );

        let mut reached = Vec::new();
        for _ in 0..(2 * TILE_PIXELS) {
            for event in tick(&mut world) {
                if let Event::PursuerWaypointReached {
                    cell,
                    path_exhausted,
                    ..
                } = event
                {
                    reached.push((cell, path_exhausted));
                }
            }
        }

        assert_eq!(
            reached,
            vec![(CellCoord::new(3, 1), false), (CellCoord::new(2, 1), true)]
        );
        let snapshot = query::pursuer_view(&world).into_vec().remove(0);
        assert_eq!(snapshot.cell, CellCoord::new(2, 1));
        assert_eq!(snapshot.target, None);
        assert_eq!(snapshot.state, Some(PursuerState::Wander));
    }

    #[test]
    fn detached_paths_are_rejected() {
        let mut world = world(&["XXXXXX", "XP  GX", "XXXXXX"]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::AssignPursuerPath {
                pursuer: PursuerId::new(0),
                state: PursuerState::SeekPlayer,
                path: vec![CellCoord::new(2, 1)],
            },
            &mut events,
        );

        let snapshot = query::pursuer_view(&world).into_vec().remove(0);
        assert_eq!(snapshot.target, None);
        assert_eq!(snapshot.state, None);
    }

    #[test]
    fn player_wraps_through_tunnels() {
        let mut world = world(&["XXXXX", " P   ", "XXXXX"]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RequestDirection {
                direction: Direction::Left,
            },
            &mut events,
        );

        for _ in 0..(TILE_PIXELS + 1) {
            let _ = tick(&mut world);
        }

        let player = query::player(&world).expect("player present");
        assert_eq!(player.position.x(), 5 * TILE_PIXELS - 1);
        assert_eq!(player.cell, CellCoord::new(4, 1));
    }

    #[test]
    fn covered_cells_wrap_with_unwrapped_origins() {
        let cells = covered_cells(PixelPosition::new(4 * TILE_PIXELS - 8, TILE_PIXELS), 4);

        assert_eq!(
            cells,
            vec![
                (CellCoord::new(3, 1), PixelPosition::new(3 * TILE_PIXELS, TILE_PIXELS)),
                (CellCoord::new(0, 1), PixelPosition::new(4 * TILE_PIXELS, TILE_PIXELS)),
            ]
        );
    }

    #[test]
    fn overlap_excludes_shared_edges() {
        let origin = PixelPosition::new(0, 0);
        assert!(!overlaps(origin, 32, PixelPosition::new(32, 0), 32));
        assert!(overlaps(origin, 32, PixelPosition::new(31, 31), 32));
    }

    #[test]
    fn stranded_pursuers_realign_to_the_nearest_cell() {
        assert_eq!(realign_cell(CellCoord::new(2, 1).origin()), None);
        assert_eq!(
            realign_cell(CellCoord::new(2, 1).origin().offset(5, 0)),
            Some(CellCoord::new(2, 1))
        );
        assert_eq!(
            realign_cell(CellCoord::new(2, 1).origin().offset(20, 0)),
            Some(CellCoord::new(3, 1))
        );
    }
}
