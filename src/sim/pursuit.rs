//! Per-pursuer chase policy
//!
//! Each pursuer re-plans against the runner's live tile on its own jittered
//! timer rather than every frame, which keeps the BFS cost bounded and breaks
//! up robotic lock-step behavior between pursuers. A pursuer close to a
//! protector abandons the chase and backs away instead.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::maze::{Maze, Tile};
use super::path::shortest_path;
use crate::config::PursuitTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PursuitState {
    Idle,
    Following,
}

/// A pursuer: movement entity plus route state and recompute timer
#[derive(Debug, Clone)]
pub struct Pursuer {
    pub entity: Entity,
    state: PursuitState,
    path: VecDeque<Tile>,
    recompute_in: f32,
}

impl Pursuer {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            state: PursuitState::Idle,
            path: VecDeque::new(),
            recompute_in: 0.0,
        }
    }

    pub fn state(&self) -> PursuitState {
        self.state
    }

    /// Drop route and timer state and teleport to `tile`
    ///
    /// Level resets call this before the new maze exists; a stale path must
    /// never be consumed into a regenerated level.
    pub fn reset(&mut self, tile: Tile) {
        self.entity.place(tile);
        self.path.clear();
        self.state = PursuitState::Idle;
        self.recompute_in = 0.0;
    }

    /// Advance one frame: re-plan if due, consume a path step if at rest, move
    ///
    /// `protector` carries the tile the pursuer should keep away from, or
    /// `None` for unconditional pursuit of `runner_tile`.
    pub fn update(
        &mut self,
        dt: f32,
        maze: &Maze,
        runner_tile: Tile,
        protector: Option<Tile>,
        tuning: &PursuitTuning,
        rng: &mut impl Rng,
    ) {
        self.recompute_in -= dt;
        let exhausted = self.path.is_empty() && !self.entity.is_moving();
        if self.recompute_in <= 0.0 || exhausted {
            self.recompute(maze, runner_tile, protector, tuning);
            self.recompute_in = rng.random_range(tuning.recompute_min..tuning.recompute_max);
        }

        if !self.entity.is_moving() {
            match self.path.pop_front() {
                Some(next) => {
                    // Routes are planned from the arrival tile; a non-adjacent
                    // or blocked step means the route is stale
                    if self.entity.tile.manhattan(next) != 1
                        || !self.entity.set_target(next, maze)
                    {
                        self.path.clear();
                        self.state = PursuitState::Idle;
                    }
                }
                None => self.state = PursuitState::Idle,
            }
        }

        self.entity.advance(dt);
    }

    /// Replace the route from scratch; stale paths are discarded, never patched
    fn recompute(
        &mut self,
        maze: &Maze,
        runner_tile: Tile,
        protector: Option<Tile>,
        tuning: &PursuitTuning,
    ) {
        self.path.clear();
        // Mid-transit `tile` still reports the origin; plan from the tile the
        // entity will occupy on arrival so the first step stays adjacent.
        let from = if self.entity.is_moving() {
            self.entity.target()
        } else {
            self.entity.tile
        };

        // Protected flee: re-evaluated on every replan, never cached, since
        // both the protector and the runner keep moving.
        if let Some(protector) = protector
            && from.manhattan(protector) <= tuning.safe_distance
        {
            match flee_step(maze, from, protector, tuning.flee_search_depth) {
                Some(step) => {
                    self.path.push_back(step);
                    self.state = PursuitState::Following;
                }
                None => self.state = PursuitState::Idle,
            }
            return;
        }

        match shortest_path(maze, from, runner_tile) {
            Some(route) if !route.is_empty() => {
                log::debug!("pursuer at {from:?} replanned {} steps", route.len());
                self.path = route.into();
                self.state = PursuitState::Following;
            }
            // No route (or already on the runner's tile): idle until next tick
            _ => self.state = PursuitState::Idle,
        }
    }
}

/// One flee step away from `protector`, or `None` if nowhere is farther
///
/// Greedy first: the walkable neighbor that most increases Manhattan distance.
/// When no single step improves, a BFS bounded to `max_depth` looks for any
/// reachable farther cell and returns the first step toward it. The chosen
/// step never decreases distance to the protector.
fn flee_step(maze: &Maze, from: Tile, protector: Tile, max_depth: u32) -> Option<Tile> {
    let current = from.manhattan(protector);

    let mut best: Option<(i32, Tile)> = None;
    for neighbor in from.neighbors() {
        if maze.is_path(neighbor) {
            let dist = neighbor.manhattan(protector);
            if dist > current && best.is_none_or(|(d, _)| dist > d) {
                best = Some((dist, neighbor));
            }
        }
    }
    if let Some((_, step)) = best {
        return Some(step);
    }

    // Cornered: search a bounded neighborhood for a farther reachable cell
    let mut parent: HashMap<Tile, Tile> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back((from, 0u32));
    parent.insert(from, from);
    while let Some((tile, depth)) = queue.pop_front() {
        if tile.manhattan(protector) > current {
            let mut cursor = tile;
            while parent[&cursor] != from {
                cursor = parent[&cursor];
            }
            return Some(cursor);
        }
        if depth == max_depth {
            continue;
        }
        for next in tile.neighbors() {
            if maze.is_path(next) && !parent.contains_key(&next) {
                parent.insert(next, tile);
                queue.push_back((next, depth + 1));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn open_maze() -> Maze {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut maze = Maze::generate(11, 11, &mut rng);
        maze.clear_area(Tile::new(5, 5), 4);
        maze
    }

    #[test]
    fn test_flee_step_never_decreases_protector_distance() {
        let maze = open_maze();
        let protector = Tile::new(5, 5);
        for start in [Tile::new(4, 5), Tile::new(5, 4), Tile::new(6, 6)] {
            let step = flee_step(&maze, start, protector, 6).unwrap();
            assert!(step.manhattan(protector) > start.manhattan(protector));
        }
    }

    #[test]
    fn test_flee_step_from_protector_tile_moves_away() {
        let maze = open_maze();
        let protector = Tile::new(5, 5);
        let step = flee_step(&maze, protector, protector, 6).unwrap();
        assert_eq!(step.manhattan(protector), 1);
    }

    #[test]
    fn test_idle_until_first_recompute_then_following() {
        let maze = open_maze();
        let tuning = PursuitTuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut pursuer = Pursuer::new(Entity::new(Tile::new(1, 1), 3.0));
        assert_eq!(pursuer.state(), PursuitState::Idle);
        pursuer.update(1.0 / 60.0, &maze, Tile::new(9, 9), None, &tuning, &mut rng);
        assert_eq!(pursuer.state(), PursuitState::Following);
        assert!(pursuer.entity.is_moving());
    }

    #[test]
    fn test_pursuer_reaches_static_runner() {
        let maze = open_maze();
        let tuning = PursuitTuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let runner = Tile::new(9, 9);
        let mut pursuer = Pursuer::new(Entity::new(Tile::new(1, 1), 8.0));
        for _ in 0..2000 {
            pursuer.update(1.0 / 60.0, &maze, runner, None, &tuning, &mut rng);
            if pursuer.entity.tile == runner {
                return;
            }
        }
        panic!("pursuer never reached a stationary runner");
    }

    #[test]
    fn test_fleeing_pursuer_gains_distance() {
        let maze = open_maze();
        let tuning = PursuitTuning {
            safe_distance: 8,
            ..PursuitTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let runner = Tile::new(5, 5);
        let mut pursuer = Pursuer::new(Entity::new(Tile::new(5, 4), 8.0));
        let before = pursuer.entity.tile.manhattan(runner);
        for _ in 0..600 {
            pursuer.update(1.0 / 60.0, &maze, runner, Some(runner), &tuning, &mut rng);
        }
        assert!(pursuer.entity.tile.manhattan(runner) > before);
    }

    #[test]
    fn test_tile_advances_one_step_even_under_rapid_replans() {
        let maze = open_maze();
        // Replan nearly every frame against a goal that keeps flipping, so
        // most replans land while the pursuer is mid-transit.
        let tuning = PursuitTuning {
            recompute_min: 0.01,
            recompute_max: 0.02,
            ..PursuitTuning::default()
        };
        let goals = [Tile::new(1, 1), Tile::new(9, 9)];
        for seed in 0..8 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut pursuer = Pursuer::new(Entity::new(Tile::new(5, 2), 6.0));
            let mut last = pursuer.entity.tile;
            for step in 0..2000 {
                let runner = goals[(step / 15) % goals.len()];
                pursuer.update(1.0 / 120.0, &maze, runner, None, &tuning, &mut rng);
                assert!(
                    last.manhattan(pursuer.entity.tile) <= 1,
                    "seed {seed}: tile moved {last:?} -> {:?}",
                    pursuer.entity.tile
                );
                last = pursuer.entity.tile;
            }
        }
    }

    #[test]
    fn test_reset_drops_route() {
        let maze = open_maze();
        let tuning = PursuitTuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut pursuer = Pursuer::new(Entity::new(Tile::new(1, 1), 3.0));
        pursuer.update(1.0 / 60.0, &maze, Tile::new(9, 9), None, &tuning, &mut rng);
        pursuer.reset(Tile::new(3, 3));
        assert_eq!(pursuer.state(), PursuitState::Idle);
        assert!(!pursuer.entity.is_moving());
        assert_eq!(pursuer.entity.tile, Tile::new(3, 3));
    }
}
