//! Discrete-to-continuous movement model
//!
//! Game logic is tile-based; rendering and near-miss collision are continuous.
//! An entity commits to one target tile at a time and glides toward its center
//! at a speed in tiles per second, so behavior is independent of frame rate.
//! The authoritative tile updates atomically with the snap to center and never
//! runs ahead of the rendered position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::maze::{Maze, Tile};

/// Directional intent, already debounced by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Tile offset; y grows downward (row-major grid)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    /// The direction of a single-tile step, `None` if not a unit step
    pub fn from_step(from: Tile, to: Tile) -> Direction {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Direction::Up,
            (0, 1) => Direction::Down,
            (-1, 0) => Direction::Left,
            (1, 0) => Direction::Right,
            _ => Direction::None,
        }
    }
}

/// A moving game actor (runner or pursuer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Authoritative grid position for all game-logic decisions
    pub tile: Tile,
    /// Continuous position in tile units, for rendering and near-miss checks
    pub pos: Vec2,
    /// Speed in tiles per second
    pub speed: f32,
    target: Tile,
    moving: bool,
}

impl Entity {
    pub fn new(tile: Tile, speed: f32) -> Self {
        Self {
            tile,
            pos: tile.center(),
            speed,
            target: tile,
            moving: false,
        }
    }

    /// Teleport to a tile, dropping any in-flight transit
    pub fn place(&mut self, tile: Tile) {
        self.tile = tile;
        self.pos = tile.center();
        self.target = tile;
        self.moving = false;
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn target(&self) -> Tile {
        self.target
    }

    /// Request a one-tile move in `direction`
    ///
    /// Silently dropped while mid-transit or when the destination is a wall;
    /// both are normal, frequent outcomes of rapid input. Returns whether the
    /// move was committed.
    pub fn request_move(&mut self, direction: Direction, maze: &Maze) -> bool {
        if direction == Direction::None {
            return false;
        }
        let (dx, dy) = direction.delta();
        self.set_target(Tile::new(self.tile.x + dx, self.tile.y + dy), maze)
    }

    /// Commit a walkable tile as the new transit target (pursuit path steps)
    pub fn set_target(&mut self, tile: Tile, maze: &Maze) -> bool {
        if self.moving || !maze.is_path(tile) {
            return false;
        }
        self.target = tile;
        self.moving = true;
        true
    }

    /// Advance the continuous position toward the target center
    ///
    /// When the remaining distance fits in this frame's travel, the position
    /// snaps exactly to the center and the authoritative tile updates with it.
    pub fn advance(&mut self, dt: f32) {
        if !self.moving {
            return;
        }
        let dest = self.target.center();
        let offset = dest - self.pos;
        let distance = offset.length();
        let step = self.speed * dt;
        if distance <= step {
            self.pos = dest;
            self.tile = self.target;
            self.moving = false;
        } else {
            self.pos += offset / distance * step;
        }
    }
}
