//! Per-frame simulation update
//!
//! One call advances the whole game by `dt` seconds: input intent, movement,
//! pickups, pursuit, and the catch/win predicates. Same seed plus same input
//! sequence replays identically.

use super::entity::{Direction, Entity};
use super::maze::Tile;
use super::pursuit::Pursuer;
use super::state::{Boost, GameEvent, GamePhase, GameState};

/// Input intent for a single tick, already debounced by the input layer
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional intent for the runner
    pub direction: Direction,
    /// Shut the game down (reachable from any phase)
    pub quit: bool,
    /// Start a fresh run after `GameOver`
    pub restart: bool,
}

/// Advance the game state by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    if input.quit && state.phase != GamePhase::Quit {
        log::info!("quit requested");
        // Invalidate in-flight pursuit state immediately
        for pursuer in &mut state.pursuers {
            let tile = pursuer.entity.tile;
            pursuer.reset(tile);
        }
        state.phase = GamePhase::Quit;
        return;
    }

    match state.phase {
        GamePhase::Quit => {}
        GamePhase::GameOver => {
            if input.restart {
                state.restart();
            }
        }
        GamePhase::Countdown => {
            state.phase_timer -= dt;
            if state.phase_timer <= 0.0 {
                // Hand only the frame's unspent remainder to gameplay, so
                // the countdown never stretches simulated time.
                let leftover = (-state.phase_timer).clamp(0.0, dt);
                state.phase = GamePhase::Playing;
                log::info!("level {} live", state.level_index);
                advance_playing(state, input, leftover);
            }
        }
        GamePhase::Caught => {
            state.phase_timer -= dt;
            if state.phase_timer <= 0.0 {
                state.respawn();
            }
        }
        GamePhase::Won => {
            state.phase_timer -= dt;
            if state.phase_timer <= 0.0 {
                state.advance_level();
            }
        }
        GamePhase::Playing => advance_playing(state, input, dt),
    }
}

fn advance_playing(state: &mut GameState, input: &TickInput, dt: f32) {
    state.elapsed += dt;

    // Single-slot input buffer: latest intent wins, applied when at rest
    if input.direction != Direction::None {
        state.pending_input = Some(input.direction);
    }
    if !state.runner.is_moving()
        && let Some(direction) = state.pending_input.take()
    {
        // Walls and mid-transit requests drop silently
        state.runner.request_move(direction, &state.maze);
    }

    // Boost expiry runs on the game clock, not a frame count
    if let Some(boost) = state.boost
        && state.elapsed >= boost.expires_at
    {
        state.boost = None;
        state.runner.speed = state.config.runner_speed;
        log::debug!("boost x{} expired", boost.multiplier);
    }

    state.runner.advance(dt);

    // Pickups key on the authoritative tile, never the continuous position
    if let Some(slot) = state
        .pickups
        .iter()
        .position(|p| p.tile == state.runner.tile)
    {
        let pickup = state.pickups.swap_remove(slot);
        state.runner.speed = state.config.runner_speed * pickup.effect.multiplier;
        state.boost = Some(Boost {
            multiplier: pickup.effect.multiplier,
            expires_at: state.elapsed + pickup.effect.duration,
        });
        state.score += state.config.pickup_points;
        state.events.push(GameEvent::PickupCollected(pickup.effect));
        log::debug!(
            "pickup at {:?}: x{} for {}s",
            pickup.tile,
            pickup.effect.multiplier,
            pickup.effect.duration
        );
    }

    // Re-establish pursuer speed = max(floor, runner speed * ratio) every
    // frame; the invariant must hold immediately after boost apply and expiry
    let pursuer_speed = state.pursuer_target_speed();
    for pursuer in &mut state.pursuers {
        pursuer.entity.speed = pursuer_speed;
    }

    let protector = if state.config.flee_while_boosted && state.boost.is_some() {
        Some(state.runner.tile)
    } else {
        None
    };
    let runner_tile = state.runner.tile;
    let GameState {
        pursuers,
        maze,
        rng,
        config,
        ..
    } = state;
    for pursuer in pursuers.iter_mut() {
        pursuer.update(dt, maze, runner_tile, protector, &config.pursuit, rng);
    }

    if is_caught(&state.runner, &state.pursuers, state.config.catch_radius) {
        state.events.push(GameEvent::Caught);
        state.lives = state.lives.saturating_sub(1);
        if state.lives == 0 {
            state.phase = GamePhase::GameOver;
            log::info!(
                "game over at level {}, score {}",
                state.level_index,
                state.score
            );
        } else {
            state.phase = GamePhase::Caught;
            state.phase_timer = state.config.caught_pause_secs;
            log::info!("caught, {} lives left", state.lives);
        }
    } else if is_won(state.runner.tile, state.gate) {
        state.events.push(GameEvent::Won);
        state.phase = GamePhase::Won;
        state.phase_timer = state.config.won_pause_secs;
        log::info!("level {} won, score {}", state.level_index, state.score);
    }
}

/// Catch predicate: tile equality or continuous near miss
///
/// Tile equality triggers regardless of continuous separation; the distance
/// check covers mid-transit near misses that tile equality would not see.
pub fn is_caught(runner: &Entity, pursuers: &[Pursuer], catch_radius: f32) -> bool {
    pursuers.iter().any(|p| {
        p.entity.tile == runner.tile || p.entity.pos.distance(runner.pos) < catch_radius
    })
}

/// Win predicate over authoritative tiles
pub fn is_won(runner_tile: Tile, gate: Tile) -> bool {
    runner_tile == gate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::consts::SIM_DT;
    use crate::sim::state::PickupEffect;
    use crate::sim::state::Pickup;

    fn headless_config() -> GameConfig {
        GameConfig {
            countdown_secs: 0.0,
            caught_pause_secs: 0.05,
            won_pause_secs: 0.05,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_countdown_blocks_input_and_logic() {
        let config = GameConfig {
            countdown_secs: 0.5,
            ..GameConfig::default()
        };
        let mut state = GameState::new(config, 31).unwrap();
        let start = state.runner.tile;
        let input = TickInput {
            direction: Direction::Right,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Countdown);
        assert_eq!(state.runner.tile, start);
        assert_eq!(state.elapsed, 0.0);

        for _ in 0..70 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_countdown_expiry_only_plays_the_frame_remainder() {
        // A countdown that expires mid-frame, not on a tick boundary
        let config = GameConfig {
            countdown_secs: 0.105,
            ..GameConfig::default()
        };
        let mut state = GameState::new(config, 41).unwrap();
        let ticks = 24;
        for _ in 0..ticks {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        // The countdown consumes exactly its duration out of the ticked
        // wall time; the boundary frame must not be counted twice.
        let expected = ticks as f32 * SIM_DT - 0.105;
        assert!(
            (state.elapsed - expected).abs() < 1e-3,
            "elapsed {} but only {expected} of play time has passed",
            state.elapsed
        );
    }

    #[test]
    fn test_won_fires_on_first_tick_when_spawned_on_gate() {
        let mut state = GameState::new(headless_config(), 6).unwrap();
        state.gate = state.runner.tile;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Won);
        assert!(state.events().contains(&GameEvent::Won));
    }

    #[test]
    fn test_forced_colocation_triggers_caught_without_input() {
        let config = GameConfig {
            lives: 2,
            ..headless_config()
        };
        let mut state = GameState::new(config, 17).unwrap();
        let runner_tile = state.runner.tile;
        state.pursuers[0].entity.place(runner_tile);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.events().contains(&GameEvent::Caught));
        assert_eq!(state.phase, GamePhase::Caught);
        assert_eq!(state.lives, 1);
    }

    #[test]
    fn test_near_miss_catch_on_continuous_distance() {
        let mut state = GameState::new(headless_config(), 18).unwrap();
        let adjacent = Tile::new(state.runner.tile.x + 1, state.runner.tile.y);
        state.pursuers[0].entity.place(adjacent);
        state.pursuers[0].entity.pos = state.runner.pos + glam::Vec2::new(0.2, 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.events().contains(&GameEvent::Caught));
    }

    #[test]
    fn test_single_life_catch_is_game_over_and_restart_works() {
        let mut state = GameState::new(headless_config(), 19).unwrap();
        assert_eq!(state.lives, 1);
        let runner_tile = state.runner.tile;
        state.pursuers[0].entity.place(runner_tile);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::GameOver);

        let input = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.lives, 1);
        assert_eq!(state.level_index, 0);
        assert_eq!(state.score, 0);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_level_advance_increments_once_and_maze_is_connected() {
        let mut state = GameState::new(headless_config(), 21).unwrap();
        state.gate = state.runner.tile;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Won);

        let mut advanced = Vec::new();
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            advanced.extend(
                state
                    .events()
                    .iter()
                    .filter(|e| matches!(e, GameEvent::LevelAdvanced(_)))
                    .copied(),
            );
        }
        assert_eq!(advanced, vec![GameEvent::LevelAdvanced(1)]);
        assert_eq!(state.level_index, 1);
        assert_eq!(
            state.maze.reachable_count(state.runner.tile),
            state.maze.path_count()
        );
    }

    #[test]
    fn test_boost_keeps_pursuer_speed_invariant() {
        let config = GameConfig {
            pickup_effect: PickupEffect {
                multiplier: 1.5,
                duration: 0.1,
            },
            ..headless_config()
        };
        let mut state = GameState::new(config.clone(), 23).unwrap();
        state.pickups.push(Pickup {
            tile: state.runner.tile,
            effect: config.pickup_effect,
        });

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(
            state
                .events()
                .iter()
                .any(|e| matches!(e, GameEvent::PickupCollected(_)))
        );
        assert_eq!(state.runner.speed, config.runner_speed * 1.5);
        let expected = state.pursuer_target_speed();
        for pursuer in &state.pursuers {
            assert_eq!(pursuer.entity.speed, expected);
        }
        assert_eq!(state.score, config.pickup_points);

        // Run past expiry; invariant must hold immediately after as well
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.runner.speed, config.runner_speed);
        let expected = state.pursuer_target_speed();
        for pursuer in &state.pursuers {
            assert_eq!(pursuer.entity.speed, expected);
        }
    }

    #[test]
    fn test_second_pickup_overwrites_boost() {
        let config = GameConfig {
            pickup_effect: PickupEffect {
                multiplier: 1.5,
                duration: 5.0,
            },
            ..headless_config()
        };
        let mut state = GameState::new(config.clone(), 29).unwrap();
        state.pickups.push(Pickup {
            tile: state.runner.tile,
            effect: config.pickup_effect,
        });
        tick(&mut state, &TickInput::default(), SIM_DT);
        let first_expiry = state.boost.unwrap().expires_at;

        state.pickups.push(Pickup {
            tile: state.runner.tile,
            effect: config.pickup_effect,
        });
        tick(&mut state, &TickInput::default(), SIM_DT);
        let boost = state.boost.unwrap();
        // Timer replaced, multiplier not stacked
        assert!(boost.expires_at > first_expiry);
        assert_eq!(state.runner.speed, config.runner_speed * 1.5);
    }

    #[test]
    fn test_input_buffered_until_runner_at_rest() {
        let mut state = GameState::new(headless_config(), 33).unwrap();
        // Find a walkable first step
        let first = state
            .runner
            .tile
            .neighbors()
            .into_iter()
            .find(|&t| state.maze.is_path(t))
            .unwrap();
        let direction = Direction::from_step(state.runner.tile, first);
        tick(
            &mut state,
            &TickInput {
                direction,
                ..Default::default()
            },
            SIM_DT,
        );
        assert!(state.runner.is_moving());

        // Mid-transit intent is buffered, not applied
        let second = Direction::Up;
        tick(
            &mut state,
            &TickInput {
                direction: second,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.runner.target(), first);
        assert_eq!(state.pending_input, Some(second));
    }

    #[test]
    fn test_quit_reachable_from_any_phase() {
        let mut state = GameState::new(GameConfig::default(), 37).unwrap();
        assert_eq!(state.phase, GamePhase::Countdown);
        let input = TickInput {
            quit: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.phase, GamePhase::Quit);

        // Terminal: further ticks change nothing
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Quit);
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            Direction::Right,
            Direction::Down,
            Direction::None,
            Direction::Left,
            Direction::Up,
        ];
        let mut a = GameState::new(headless_config(), 99999).unwrap();
        let mut b = GameState::new(headless_config(), 99999).unwrap();
        for step in 0..600 {
            let input = TickInput {
                direction: inputs[step % inputs.len()],
                ..Default::default()
            };
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(a.runner.tile, b.runner.tile);
        assert_eq!(a.runner.pos, b.runner.pos);
        assert_eq!(a.score, b.score);
        assert_eq!(a.elapsed, b.elapsed);
        assert_eq!(a.phase, b.phase);
        for (pa, pb) in a.pursuers.iter().zip(&b.pursuers) {
            assert_eq!(pa.entity.tile, pb.entity.tile);
            assert_eq!(pa.entity.pos, pb.entity.pos);
        }
    }
}
