//! Maze Pursuit - a headless tile-grid pursuit game core
//!
//! Core modules:
//! - `sim`: deterministic simulation (maze generation, pathfinding, movement,
//!   pursuit AI, game state machine)
//! - `config`: data-driven game balance and level scaling
//!
//! The crate consumes directional intent and frame delta time, and produces a
//! render snapshot plus discrete events; windowing, rendering, input polling,
//! and audio live entirely outside it.

pub mod config;
pub mod sim;

pub use config::{DifficultyScaling, GameConfig, PursuitTuning};
pub use sim::{GameEvent, GamePhase, GameState, TickInput, tick};

/// Simulation timing constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}
