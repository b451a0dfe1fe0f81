//! Authoritative game state and level lifecycle
//!
//! The state machine owns the maze, entities, and pickups outright; nothing in
//! the crate reads ambient globals, so multiple instances (tests, replays) can
//! coexist. All randomness flows through the seeded RNG carried here.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Direction, Entity};
use super::maze::{Maze, Tile};
use super::path::shortest_path;
use super::pursuit::Pursuer;
use crate::config::GameConfig;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Input and game logic frozen before play starts (visual-only)
    Countdown,
    /// Active gameplay
    Playing,
    /// A pursuer caught the runner; brief pause before respawn
    Caught,
    /// Runner reached the gate; brief pause before the next level
    Won,
    /// Lives exhausted; terminal until restart
    GameOver,
    /// Externally requested shutdown
    Quit,
}

/// Timed speed modifier carried by a pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupEffect {
    /// Multiplicative scalar on the runner's base speed
    pub multiplier: f32,
    /// Seconds on the game clock before the boost expires
    pub duration: f32,
}

/// A collectible on the maze floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub tile: Tile,
    pub effect: PickupEffect,
}

/// Active boost on the runner
///
/// A later pickup overwrites both fields; durations and multipliers do not
/// stack.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Boost {
    pub multiplier: f32,
    /// Game-clock timestamp, not a frame count, so pause cannot distort it
    pub expires_at: f32,
}

/// Discrete notifications for the presentation layer (sound, UI)
///
/// Each is pushed at most once per occurrence per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PickupCollected(PickupEffect),
    Caught,
    Won,
    LevelAdvanced(u32),
}

/// Construction-time level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelError {
    /// The exit gate cannot be reached from the runner spawn
    Unreachable { from: Tile, to: Tile },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Unreachable { from, to } => {
                write!(f, "exit gate {to:?} unreachable from runner spawn {from:?}")
            }
        }
    }
}

impl std::error::Error for LevelError {}

/// Render-ready view of one frame, borrowed from the state
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub maze: &'a Maze,
    pub runner_pos: Vec2,
    pub pursuer_pos: Vec<Vec2>,
    pub pickups: &'a [Pickup],
    pub gate: Tile,
    pub level_index: u32,
    pub elapsed: f32,
    pub lives: u32,
    pub score: u64,
    pub phase: GamePhase,
}

/// Complete game state (deterministic: seed plus inputs replay exactly)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: GameConfig,
    pub maze: Maze,
    pub runner: Entity,
    pub pursuers: Vec<Pursuer>,
    pub pickups: Vec<Pickup>,
    /// Exit-gate tile; reaching it wins the level
    pub gate: Tile,
    pub level_index: u32,
    pub lives: u32,
    pub score: u64,
    /// Game clock in seconds; advances only while Playing
    pub elapsed: f32,
    pub phase: GamePhase,
    /// Countdown / caught-pause / won-pause remaining
    pub(crate) phase_timer: f32,
    pub(crate) boost: Option<Boost>,
    /// Single-slot input buffer, latest intent wins
    pub(crate) pending_input: Option<Direction>,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh run at level 0 with the given seed
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, LevelError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = build_level(&config, 0, &mut rng)?;

        let mut state = Self {
            seed,
            maze: layout.maze,
            runner: Entity::new(layout.runner, config.runner_speed),
            pursuers: Vec::new(),
            pickups: layout.pickups,
            gate: layout.gate,
            level_index: 0,
            lives: config.lives.max(1),
            score: 0,
            elapsed: 0.0,
            phase: GamePhase::Countdown,
            phase_timer: 0.0,
            boost: None,
            pending_input: None,
            rng,
            events: Vec::new(),
            config,
        };
        state.spawn_pursuers(layout.pursuit_spawns);
        state.enter_countdown();
        log::info!(
            "new run: seed {seed}, {}x{} maze, {} pursuers",
            state.maze.width(),
            state.maze.height(),
            state.pursuers.len()
        );
        Ok(state)
    }

    /// Events accumulated during the last tick
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take the last tick's events, leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Borrowed render view of the current frame
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            maze: &self.maze,
            runner_pos: self.runner.pos,
            pursuer_pos: self.pursuers.iter().map(|p| p.entity.pos).collect(),
            pickups: &self.pickups,
            gate: self.gate,
            level_index: self.level_index,
            elapsed: self.elapsed,
            lives: self.lives,
            score: self.score,
            phase: self.phase,
        }
    }

    /// Speed every pursuer must run at, derived from the runner's current speed
    pub fn pursuer_target_speed(&self) -> f32 {
        let ratio = self.config.ratio_for_level(self.level_index);
        (self.runner.speed * ratio).max(self.config.pursuer_speed_floor)
    }

    pub(crate) fn enter_countdown(&mut self) {
        if self.config.countdown_secs > 0.0 {
            self.phase = GamePhase::Countdown;
            self.phase_timer = self.config.countdown_secs;
        } else {
            self.phase = GamePhase::Playing;
        }
    }

    /// Regenerate a harder maze and reseed pickups and spawns
    pub(crate) fn advance_level(&mut self) {
        self.level_index += 1;
        let index = self.level_index;
        match build_level(&self.config, index, &mut self.rng) {
            Ok(layout) => {
                self.install_layout(layout);
                self.events.push(GameEvent::LevelAdvanced(index));
                log::info!(
                    "level {index}: {}x{} maze, {} pursuers",
                    self.maze.width(),
                    self.maze.height(),
                    self.pursuers.len()
                );
                self.enter_countdown();
            }
            Err(err) => {
                log::error!("level {index} construction failed: {err}");
                self.phase = GamePhase::GameOver;
            }
        }
    }

    /// Fresh run after `GameOver`: level 0, full lives, zero score
    pub(crate) fn restart(&mut self) {
        match build_level(&self.config, 0, &mut self.rng) {
            Ok(layout) => {
                self.level_index = 0;
                self.lives = self.config.lives.max(1);
                self.score = 0;
                self.elapsed = 0.0;
                self.install_layout(layout);
                log::info!("run restarted");
                self.enter_countdown();
            }
            Err(err) => {
                log::error!("restart failed: {err}");
                self.phase = GamePhase::GameOver;
            }
        }
    }

    /// Same-maze respawn at fresh separated positions after a catch
    pub(crate) fn respawn(&mut self) {
        let separation = spawn_separation(&self.maze, &self.config);
        let runner_tile = self.maze.random_path_tile(&mut self.rng);
        self.boost = None;
        self.pending_input = None;
        self.runner.speed = self.config.runner_speed;
        self.runner.place(runner_tile);
        // No free pickup at the respawn tile
        self.pickups.retain(|p| p.tile != runner_tile);

        let speed = self.pursuer_target_speed();
        let avoid = [runner_tile, self.gate];
        for i in 0..self.pursuers.len() {
            let tile = separated_tile(&self.maze, &mut self.rng, &avoid, separation);
            self.pursuers[i].reset(tile);
            self.pursuers[i].entity.speed = speed;
        }
        self.enter_countdown();
    }

    fn install_layout(&mut self, layout: LevelLayout) {
        self.maze = layout.maze;
        self.gate = layout.gate;
        self.pickups = layout.pickups;
        self.boost = None;
        self.pending_input = None;
        self.runner.speed = self.config.runner_speed;
        self.runner.place(layout.runner);
        self.spawn_pursuers(layout.pursuit_spawns);
    }

    fn spawn_pursuers(&mut self, spawns: Vec<Tile>) {
        let ratio = self.config.ratio_for_level(self.level_index);
        let speed = (self.config.runner_speed * ratio).max(self.config.pursuer_speed_floor);
        self.pursuers = spawns
            .into_iter()
            .map(|tile| Pursuer::new(Entity::new(tile, speed)))
            .collect();
    }
}

struct LevelLayout {
    maze: Maze,
    runner: Tile,
    pursuit_spawns: Vec<Tile>,
    gate: Tile,
    pickups: Vec<Pickup>,
}

fn spawn_separation(maze: &Maze, config: &GameConfig) -> i32 {
    (maze.width().max(maze.height()) / config.spawn_separation_divisor.max(1)).max(1)
}

/// Random path tile at least `separation` Manhattan steps from every `avoid`
///
/// Bounded retries: on pathological configs the last candidate is accepted
/// rather than spinning forever.
fn separated_tile(maze: &Maze, rng: &mut Pcg32, avoid: &[Tile], separation: i32) -> Tile {
    let mut tile = maze.random_path_tile(rng);
    for _ in 0..200 {
        if avoid.iter().all(|a| a.manhattan(tile) >= separation) {
            break;
        }
        tile = maze.random_path_tile(rng);
    }
    tile
}

/// Generate maze, place actors and gate, scatter pickups, validate reachability
fn build_level(
    config: &GameConfig,
    level_index: u32,
    rng: &mut Pcg32,
) -> Result<LevelLayout, LevelError> {
    let (width, height) = config.grid_for_level(level_index);
    let mut maze = Maze::generate(width, height, rng);
    let separation = spawn_separation(&maze, config);

    let runner = maze.random_path_tile(rng);
    let gate = separated_tile(&maze, rng, &[runner], separation);
    let mut pursuit_spawns = Vec::new();
    // Pursuers keep clear of the gate too, so reaching it is never an
    // instant catch
    for _ in 0..config.pursuers_for_level(level_index) {
        pursuit_spawns.push(separated_tile(&maze, rng, &[runner, gate], separation));
    }

    // Open catch-free zones around the spawn and the gate
    maze.clear_area(runner, 1);
    maze.clear_area(gate, 1);

    let mut free: Vec<Tile> = Vec::new();
    for y in 0..maze.height() {
        for x in 0..maze.width() {
            let tile = Tile::new(x, y);
            if maze.is_path(tile)
                && tile != runner
                && tile != gate
                && !pursuit_spawns.contains(&tile)
            {
                free.push(tile);
            }
        }
    }
    free.shuffle(rng);
    let pickups = free
        .into_iter()
        .take(config.pickups_for_level(level_index) as usize)
        .map(|tile| Pickup {
            tile,
            effect: config.pickup_effect,
        })
        .collect();

    if shortest_path(&maze, runner, gate).is_none() {
        return Err(LevelError::Unreachable {
            from: runner,
            to: gate,
        });
    }

    Ok(LevelLayout {
        maze,
        runner,
        pursuit_spawns,
        gate,
        pickups,
    })
}
