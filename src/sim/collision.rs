//! Collision and pickup resolution
//!
//! Everything here is circle-vs-circle except gates, which are resolved once per
//! pair from the boat's horizontal position when it crosses the gate line.

use glam::Vec2;
use rand::Rng;

use super::effects::ApplyOutcome;
use super::state::{GateSide, RunState, SimEvent};
use crate::clamp_multiplier;
use crate::config::{EconomyConfig, EffectKey, GameConfig};
use crate::consts::*;

/// Whether two circles intersect
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Horizontal extent of one gate zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub min_x: f32,
    pub max_x: f32,
}

impl Zone {
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }

    #[inline]
    pub fn center(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }
}

/// Left and right zones of a gate pair, either side of the center gap
pub fn gate_zones(width: f32) -> (Zone, Zone) {
    let center = LANE_WIDTH / 2.0;
    let half_gap = GATE_CENTER_GAP / 2.0;
    let left = Zone {
        min_x: center - half_gap - width,
        max_x: center - half_gap,
    };
    let right = Zone {
        min_x: center + half_gap,
        max_x: center + half_gap + width,
    };
    (left, right)
}

/// Which side a boat at `x` chooses.
///
/// Inside exactly one zone picks that zone; otherwise the zone whose center is
/// nearer wins, and an exact tie goes left.
pub fn choose_gate_side(x: f32, width: f32) -> GateSide {
    let (left, right) = gate_zones(width);
    match (left.contains(x), right.contains(x)) {
        (true, false) => GateSide::Left,
        (false, true) => GateSide::Right,
        _ => {
            let to_left = (x - left.center()).abs();
            let to_right = (x - right.center()).abs();
            if to_right < to_left {
                GateSide::Right
            } else {
                GateSide::Left
            }
        }
    }
}

/// Resolve every interaction for this tick
pub fn resolve<R: Rng>(state: &mut RunState, config: &GameConfig, rng: &mut R) {
    resolve_projectiles(state);
    collect_pickups(state, &config.economy, rng);
    resolve_obstacles(state, &config.economy);
    resolve_gates(state, &config.economy);
}

/// Collect pickups touching the boat or inside its magnet radius
pub fn collect_pickups<R: Rng>(state: &mut RunState, economy: &EconomyConfig, rng: &mut R) {
    let boat_pos = state.boat.pos;
    let boat_radius = state.boat.collision_radius();
    let magnet_radius = economy.magnet_radius * state.modifiers.magnet;

    let (collected, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| {
            circles_overlap(boat_pos, boat_radius, p.pos, p.radius)
                || p.pos.distance_squared(boat_pos) <= magnet_radius * magnet_radius
        });
    state.pickups = remaining;

    if collected.is_empty() {
        return;
    }
    let pickup_mult = clamp_multiplier(state.effects.multiplier_for(EffectKey::PickupValue));
    let double_chance = state.modifiers.double_chance;

    for pickup in collected {
        let value = pickup.value * state.modifiers.soul_value * pickup_mult;
        state.obols += value;
        state.pickups_collected += 1;

        let doubled = double_chance > 0.0 && rng.random::<f32>() < double_chance;
        if doubled {
            state.obols += value;
            state.pickups_collected += 1;
        }
        state.events.push(SimEvent::PickupCollected { value, doubled });
    }
}

/// Penalty an unshielded hit from an obstacle of `damage` costs right now
pub fn collision_penalty(state: &RunState, economy: &EconomyConfig, damage: f32) -> f32 {
    economy.collision_penalty
        * damage
        * clamp_multiplier(state.effects.multiplier_for(EffectKey::CollisionPenalty))
        * state.modifiers.obstacle_damage
}

/// Boat vs obstacles: shields absorb, otherwise obols are lost
pub fn resolve_obstacles(state: &mut RunState, economy: &EconomyConfig) {
    if state.invulnerable > 0.0 {
        return;
    }
    let boat_pos = state.boat.pos;
    let boat_radius = state.boat.collision_radius();

    let (hits, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.obstacles)
        .into_iter()
        .partition(|o| circles_overlap(boat_pos, boat_radius, o.pos, o.radius));
    state.obstacles = remaining;

    for obstacle in hits {
        if state.shields > 0 {
            state.shields -= 1;
            state.shield_regen_timer = 0.0;
            state.events.push(SimEvent::ShieldAbsorbed);
        } else {
            let penalty = collision_penalty(state, economy, obstacle.damage);
            state.obols -= penalty;
            state.events.push(SimEvent::ObstacleHit { penalty });
        }
    }
}

/// Apply the chosen side of any gate pair the boat is crossing
pub fn resolve_gates(state: &mut RunState, economy: &EconomyConfig) {
    let boat = state.boat.pos;
    for gate in &mut state.gates {
        // Evaluate once on reaching the boat line; a long frame may overshoot it
        if gate.chosen || gate.y < boat.y - GATE_Y_TOLERANCE {
            continue;
        }
        gate.chosen = true;

        let side = choose_gate_side(boat.x, gate.width);
        let option = gate.option(side);
        match state.effects.apply(option, economy.gate_duration) {
            ApplyOutcome::Applied => {
                log::debug!("Gate {} applied ({:?})", option.id, side);
                state.events.push(SimEvent::GateApplied {
                    gate_id: option.id.clone(),
                    name: option.name.clone(),
                    side,
                });
            }
            ApplyOutcome::AlreadyApplied => {
                state.events.push(SimEvent::GateRejected {
                    gate_id: option.id.clone(),
                    name: option.name.clone(),
                });
            }
        }
    }
}

/// Bribes destroy the first obstacle they touch, plus any splash neighbours
pub fn resolve_projectiles(state: &mut RunState) {
    let splash = state.modifiers.bribe_splash;
    let mut spent = Vec::new();

    for projectile in &state.projectiles {
        let Some(index) = state
            .obstacles
            .iter()
            .position(|o| circles_overlap(projectile.pos, projectile.radius, o.pos, o.radius))
        else {
            continue;
        };
        let struck = state.obstacles.remove(index);

        let before = state.obstacles.len();
        if splash > 0.0 {
            state
                .obstacles
                .retain(|o| o.pos.distance_squared(struck.pos) > splash * splash);
        }
        let splashed = before - state.obstacles.len();

        spent.push(projectile.id);
        state.events.push(SimEvent::ObstacleBribed {
            obstacle_id: struck.id,
            splashed,
        });
    }

    if !spent.is_empty() {
        state.projectiles.retain(|p| !spent.contains(&p.id));
    }
}
