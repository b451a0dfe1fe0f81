//! Maze Pursuit demo entry point
//!
//! Headless run: an autopilot steers the runner while the simulation ticks at
//! the fixed timestep, and drained events are logged. The seed comes from the
//! first argument, or the clock when absent.

use maze_pursuit::GameConfig;
use maze_pursuit::consts::SIM_DT;
use maze_pursuit::sim::{Direction, GamePhase, GameState, TickInput, shortest_path, tick};

const MAX_TICKS: u64 = 120 * 600;
const LEVEL_CAP: u32 = 3;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });

    let mut state = match GameState::new(GameConfig::default(), seed) {
        Ok(state) => state,
        Err(err) => {
            log::error!("level construction failed: {err}");
            std::process::exit(1);
        }
    };
    log::info!("autopilot demo, seed {seed}");

    for _ in 0..MAX_TICKS {
        let input = autopilot(&state);
        tick(&mut state, &input, SIM_DT);
        for event in state.drain_events() {
            log::info!("event: {event:?}");
        }
        match state.phase {
            GamePhase::GameOver | GamePhase::Quit => break,
            _ if state.level_index >= LEVEL_CAP => break,
            _ => {}
        }
    }

    println!(
        "seed {seed}: level {}, score {}, {:.1}s elapsed, ended {:?}",
        state.level_index, state.score, state.elapsed, state.phase
    );
}

/// Steer the runner toward the nearest pickup, then the gate
fn autopilot(state: &GameState) -> TickInput {
    if state.phase != GamePhase::Playing || state.runner.is_moving() {
        return TickInput::default();
    }
    let from = state.runner.tile;
    let goal = state
        .pickups
        .iter()
        .map(|p| p.tile)
        .min_by_key(|t| t.manhattan(from))
        .unwrap_or(state.gate);
    let direction = shortest_path(&state.maze, from, goal)
        .and_then(|route| route.first().copied())
        .map(|step| Direction::from_step(from, step))
        .unwrap_or_default();
    TickInput {
        direction,
        ..Default::default()
    }
}
