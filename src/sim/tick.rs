//! One simulation step
//!
//! Spawn, move, resolve collisions, decay effects, then drain and check for
//! depletion. Collisions see freshly spawned/moved entities and drain sees the
//! effect multipliers left after decay.

use rand::Rng;

use super::state::{RunState, SimEvent};
use super::{collision, economy, movement, spawn};
use crate::config::GameConfig;

/// Player input for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steering axis in [-1, 1] (keyboard)
    pub steer: f32,
    /// Target boat x (pointer/touch); takes precedence over `steer`
    pub target_x: Option<f32>,
    /// Throw a bribe this frame; handled by the game facade before stepping
    pub bribe: bool,
}

/// What the step left the run in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Obols hit zero this step
    Depleted,
}

/// Advance the run by `dt` seconds
pub fn update<R: Rng>(
    state: &mut RunState,
    config: &GameConfig,
    input: &TickInput,
    rng: &mut R,
    dt: f32,
) -> TickOutcome {
    if state.is_depleted() {
        return TickOutcome::Depleted;
    }

    match input.target_x {
        Some(target) => state.boat.move_toward(target, dt),
        None if input.steer != 0.0 => state.boat.steer(input.steer, dt),
        None => {}
    }

    spawn::spawn(state, config, rng, dt);
    movement::advance(state, &config.economy, dt);
    collision::resolve(state, config, rng);

    for expired in state.effects.tick(dt) {
        state.events.push(SimEvent::EffectExpired {
            gate_id: expired.gate_id,
            name: expired.name,
        });
    }

    economy::tick_timers(state, dt);
    economy::drain(state, &config.economy, dt);
    state.elapsed += dt;

    if state.is_depleted() {
        state.obols = 0.0;
        state.events.push(SimEvent::Depleted);
        return TickOutcome::Depleted;
    }
    TickOutcome::Continue
}
