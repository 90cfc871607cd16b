//! World scrolling and off-screen culling
//!
//! Speed gates change how fast the world scrolls past the boat, not the boat's
//! own steering speed.

use super::state::RunState;
use crate::clamp_multiplier;
use crate::config::{EconomyConfig, EffectKey};
use crate::consts::*;

/// Current world scroll speed (pixels/s)
pub fn scroll_speed(state: &RunState, economy: &EconomyConfig) -> f32 {
    economy.scroll_speed * clamp_multiplier(state.effects.multiplier_for(EffectKey::Speed))
}

/// Move every entity by one step and drop whatever left the lane
pub fn advance(state: &mut RunState, economy: &EconomyConfig, dt: f32) {
    let dy = scroll_speed(state, economy) * dt;

    for obstacle in &mut state.obstacles {
        obstacle.pos.y += dy;
    }
    for pickup in &mut state.pickups {
        pickup.pos.y += dy;
    }
    for gate in &mut state.gates {
        gate.y += dy;
    }
    for projectile in &mut state.projectiles {
        projectile.pos.y -= projectile.speed * dt;
    }

    state.distance += dy / PIXELS_PER_METER;
    cull(state);
}

/// Remove entities fully outside the visible lane
pub fn cull(state: &mut RunState) {
    state.obstacles.retain(|o| o.pos.y - o.radius <= LANE_HEIGHT);
    state.pickups.retain(|p| p.pos.y - p.radius <= LANE_HEIGHT);
    state.gates.retain(|g| g.y - GATE_HEIGHT <= LANE_HEIGHT);
    state.projectiles.retain(|p| p.pos.y + p.radius >= 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectBundle, GateOption};
    use crate::sim::modifiers::RunModifiers;
    use crate::sim::state::{Obstacle, Projectile};
    use glam::Vec2;

    fn state_with_obstacle(y: f32) -> (RunState, EconomyConfig) {
        let economy = EconomyConfig::default();
        let mut state = RunState::new(1, &economy, RunModifiers::default());
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(100.0, y),
            radius: 10.0,
            damage: 1.0,
            tag: "rock".into(),
        });
        (state, economy)
    }

    #[test]
    fn test_entities_scroll_by_base_speed() {
        let (mut state, economy) = state_with_obstacle(0.0);
        advance(&mut state, &economy, 0.5);
        assert!((state.obstacles[0].pos.y - economy.scroll_speed * 0.5).abs() < 1e-3);
        let meters = economy.scroll_speed * 0.5 / PIXELS_PER_METER;
        assert!((state.distance - meters).abs() < 1e-3);
    }

    #[test]
    fn test_speed_gate_scales_scroll() {
        let (mut state, economy) = state_with_obstacle(0.0);
        let boost = GateOption {
            id: "swift".into(),
            name: "Swift".into(),
            duration: Some(5.0),
            effects: EffectBundle { speed: Some(2.0), ..Default::default() },
            permanent: false,
        };
        state.effects.apply(&boost, 10.0);
        assert_eq!(scroll_speed(&state, &economy), economy.scroll_speed * 2.0);
        advance(&mut state, &economy, 0.25);
        assert!((state.obstacles[0].pos.y - economy.scroll_speed * 0.5).abs() < 1e-3);
        // Boat steering is untouched by world speed
        assert_eq!(state.boat.speed, BOAT_SPEED);
    }

    #[test]
    fn test_stacked_speed_gates_clamped() {
        let (mut state, economy) = state_with_obstacle(0.0);
        for id in ["a", "b", "c"] {
            let gate = GateOption {
                id: id.into(),
                name: id.into(),
                duration: Some(5.0),
                effects: EffectBundle { speed: Some(5.0), ..Default::default() },
                permanent: false,
            };
            state.effects.apply(&gate, 10.0);
        }
        // Raw product is 125
        assert_eq!(state.effects.multiplier_for(EffectKey::Speed), 125.0);
        assert_eq!(scroll_speed(&state, &economy), economy.scroll_speed * MAX_MULTIPLIER);
    }

    #[test]
    fn test_offscreen_entities_culled() {
        let (mut state, economy) = state_with_obstacle(LANE_HEIGHT + 5.0);
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: Vec2::new(100.0, 2.0),
            radius: PROJECTILE_RADIUS,
            speed: PROJECTILE_SPEED,
        });
        advance(&mut state, &economy, 0.1);
        assert!(state.obstacles.is_empty());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_partially_visible_entity_kept() {
        let (mut state, _) = state_with_obstacle(LANE_HEIGHT + 5.0);
        cull(&mut state);
        assert_eq!(state.obstacles.len(), 1);
    }
}
