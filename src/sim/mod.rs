//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - dt-driven updates, speeds in tiles per second
//! - Seeded RNG only
//! - No rendering, input-device, or asset dependencies

pub mod entity;
pub mod maze;
pub mod path;
pub mod pursuit;
pub mod state;
pub mod tick;

pub use entity::{Direction, Entity};
pub use maze::{Cell, Maze, Tile};
pub use path::shortest_path;
pub use pursuit::{Pursuer, PursuitState};
pub use state::{
    GameEvent, GamePhase, GameState, LevelError, Pickup, PickupEffect, Snapshot,
};
pub use tick::{TickInput, is_caught, is_won, tick};
