//! Randomized spawning of obstacles, pickups, and gate pairs
//!
//! Three independent countdowns. Obstacle and pickup timers re-roll within
//! their configured range each time they fire; the gate timer uses a fixed
//! interval after a longer first-gate delay.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::state::{GatePair, Obstacle, Pickup, RunState};
use crate::config::{EconomyConfig, GameConfig, IntervalRange};
use crate::consts::*;

/// Seconds until each spawner fires next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnTimers {
    pub obstacle: f32,
    pub pickup: f32,
    pub gate: f32,
}

impl SpawnTimers {
    pub fn new(economy: &EconomyConfig) -> Self {
        Self {
            obstacle: economy.obstacle_interval.min,
            pickup: economy.pickup_interval.min,
            gate: economy.first_gate_delay,
        }
    }
}

/// Draw a timer length from a range
pub fn roll_interval<R: Rng>(range: IntervalRange, rng: &mut R) -> f32 {
    if range.max > range.min {
        rng.random_range(range.min..=range.max)
    } else {
        range.min
    }
}

/// Random x for an entity of `radius`, kept fully inside the lane
fn random_x<R: Rng>(radius: f32, rng: &mut R) -> f32 {
    let min_x = radius.min(LANE_WIDTH / 2.0);
    let max_x = LANE_WIDTH - min_x;
    if max_x > min_x {
        rng.random_range(min_x..=max_x)
    } else {
        LANE_WIDTH / 2.0
    }
}

/// Advance spawn timers and create whatever fired this tick
pub fn spawn<R: Rng>(state: &mut RunState, config: &GameConfig, rng: &mut R, dt: f32) {
    let economy = &config.economy;

    state.spawn.obstacle -= dt;
    if state.spawn.obstacle <= 0.0 {
        spawn_obstacle(state, config, rng);
        state.spawn.obstacle = roll_interval(economy.obstacle_interval, rng);
    }

    state.spawn.pickup -= dt;
    if state.spawn.pickup <= 0.0 {
        spawn_pickup(state, economy, rng);
        state.spawn.pickup = roll_interval(economy.pickup_interval, rng);
    }

    state.spawn.gate -= dt;
    if state.spawn.gate <= 0.0 {
        spawn_gate_pair(state, config, rng);
        state.spawn.gate = economy.gate_interval;
    }
}

/// Spawn a random obstacle template above the lane
pub fn spawn_obstacle<R: Rng>(state: &mut RunState, config: &GameConfig, rng: &mut R) {
    let Some(template) = config.obstacles.choose(rng) else {
        return;
    };
    let x = random_x(template.radius, rng);
    let obstacle = Obstacle {
        id: state.next_entity_id(),
        pos: Vec2::new(x, -template.radius - SPAWN_MARGIN),
        radius: template.radius,
        damage: template.damage,
        tag: template.tag.clone(),
    };
    state.obstacles.push(obstacle);
}

/// Spawn a pickup worth the configured base value above the lane
pub fn spawn_pickup<R: Rng>(state: &mut RunState, economy: &EconomyConfig, rng: &mut R) {
    let x = random_x(PICKUP_RADIUS, rng);
    let pickup = Pickup {
        id: state.next_entity_id(),
        pos: Vec2::new(x, -PICKUP_RADIUS - SPAWN_MARGIN),
        radius: PICKUP_RADIUS,
        value: economy.pickup_value,
    };
    state.pickups.push(pickup);
}

/// Spawn a gate pair from two distinct gate definitions
pub fn spawn_gate_pair<R: Rng>(state: &mut RunState, config: &GameConfig, rng: &mut R) {
    if config.gates.len() < 2 {
        log::warn!("Gate pair skipped: need 2 gate definitions, have {}", config.gates.len());
        return;
    }
    let picks = rand::seq::index::sample(rng, config.gates.len(), 2);
    let left = config.gates[picks.index(0)].clone();
    let right = config.gates[picks.index(1)].clone();
    log::debug!("Gate pair spawned: {} | {}", left.id, right.id);

    let pair = GatePair {
        id: state.next_entity_id(),
        y: -GATE_HEIGHT - SPAWN_MARGIN,
        left,
        right,
        width: GATE_WIDTH,
        chosen: false,
    };
    state.gates.push(pair);
}
