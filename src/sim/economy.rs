//! Obol drain, bribe shots, shield upkeep, and run settlement

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Projectile, RunState, SimEvent};
use crate::clamp_multiplier;
use crate::config::{DrainTier, EarningsConfig, EconomyConfig, EffectKey};
use crate::consts::*;
use crate::error::BribeRejection;

/// Drain rate at `elapsed` seconds: the last tier whose threshold has passed.
///
/// Tiers must be sorted ascending (config loading guarantees this). Before the
/// first threshold nothing drains.
pub fn drain_rate(tiers: &[DrainTier], elapsed: f32) -> f32 {
    tiers
        .iter()
        .take_while(|tier| tier.from_sec <= elapsed)
        .last()
        .map(|tier| tier.rate)
        .unwrap_or(0.0)
}

/// Subtract this tick's drain from the balance
pub fn drain(state: &mut RunState, economy: &EconomyConfig, dt: f32) {
    let rate = drain_rate(&economy.drain_tiers, state.elapsed);
    let mult = clamp_multiplier(state.effects.multiplier_for(EffectKey::Drain));
    state.obols -= rate * mult * dt;
}

/// Count down cooldowns and regenerate shields
pub fn tick_timers(state: &mut RunState, dt: f32) {
    state.bribe_cooldown = (state.bribe_cooldown - dt).max(0.0);
    state.invulnerable = (state.invulnerable - dt).max(0.0);

    if let Some(interval) = state.modifiers.free_shot_interval {
        state.free_shot_timer = (state.free_shot_timer + dt).min(interval);
    }

    let regen = state.modifiers.shield_regen_sec;
    if regen > 0.0 && state.shields < state.shield_capacity {
        state.shield_regen_timer += dt;
        if state.shield_regen_timer >= regen {
            state.shield_regen_timer = 0.0;
            state.shields += 1;
            state.events.push(SimEvent::ShieldRegenerated);
        }
    } else {
        state.shield_regen_timer = 0.0;
    }
}

/// Whether the periodic free bribe is ready
pub fn free_shot_ready(state: &RunState) -> bool {
    state
        .modifiers
        .free_shot_interval
        .is_some_and(|interval| state.free_shot_timer >= interval)
}

/// A bribe that went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BribeOutcome {
    pub free: bool,
}

/// Attempt a bribe shot from the boat
pub fn try_bribe<R: Rng>(
    state: &mut RunState,
    economy: &EconomyConfig,
    rng: &mut R,
) -> Result<BribeOutcome, BribeRejection> {
    if state.bribe_cooldown > 0.0 {
        return Err(BribeRejection::Cooldown {
            remaining: state.bribe_cooldown,
        });
    }

    // A lucky roll leaves the periodic free shot banked
    let lucky = economy.bribe_free_chance > 0.0 && rng.random::<f32>() < economy.bribe_free_chance;
    let free = if lucky {
        true
    } else if free_shot_ready(state) {
        state.free_shot_timer = 0.0;
        true
    } else {
        false
    };

    if !free {
        if state.obols < economy.bribe_cost {
            return Err(BribeRejection::InsufficientBalance {
                cost: economy.bribe_cost,
            });
        }
        state.obols -= economy.bribe_cost;
    }

    let id = state.next_entity_id();
    let boat = &state.boat;
    state.projectiles.push(Projectile {
        id,
        pos: boat.pos - Vec2::new(0.0, boat.half_height),
        radius: PROJECTILE_RADIUS,
        speed: PROJECTILE_SPEED,
    });
    state.bribe_cooldown = economy.bribe_cooldown * state.modifiers.bribe_cooldown;
    state.events.push(SimEvent::BribeThrown { free });
    Ok(BribeOutcome { free })
}

/// Whole coins a run has earned so far
pub fn run_earnings(state: &RunState, earnings: &EarningsConfig) -> f64 {
    let distance = f64::from(state.distance.max(0.0)) * f64::from(earnings.coins_per_meter);
    let pickups = f64::from(state.pickups_collected) * f64::from(earnings.coins_per_pickup);
    let leftover = f64::from(state.obols.max(0.0)) * f64::from(earnings.leftover_rate);
    (distance + pickups + leftover).floor().max(0.0)
}

/// Outcome of a finished (or re-finished, after revive) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Raw score before any doubling
    pub score: u64,
    /// Coins credited by this settlement
    pub earnings: f64,
    /// Whether the one-time reward doubling was claimed
    pub doubled: bool,
}

/// Settle the run: only coins not already credited by an earlier settlement count
pub fn settle(state: &mut RunState, economy: &EconomyConfig) -> Settlement {
    let total = run_earnings(state, &economy.earnings);
    let credit = (total - state.earnings).max(0.0);
    state.earnings = state.earnings.max(total);
    Settlement {
        score: state.score(),
        earnings: credit,
        doubled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectBundle, GateOption};
    use crate::sim::modifiers::RunModifiers;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tiers() -> Vec<DrainTier> {
        vec![
            DrainTier { from_sec: 0.0, rate: 1.0 },
            DrainTier { from_sec: 30.0, rate: 2.0 },
            DrainTier { from_sec: 60.0, rate: 4.0 },
        ]
    }

    fn economy() -> EconomyConfig {
        EconomyConfig {
            bribe_free_chance: 0.0,
            bribe_cost: 8.0,
            bribe_cooldown: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_drain_tier_selection() {
        let tiers = tiers();
        assert_eq!(drain_rate(&tiers, 0.0), 1.0);
        assert_eq!(drain_rate(&tiers, 45.0), 2.0);
        assert_eq!(drain_rate(&tiers, 61.0), 4.0);
        assert_eq!(drain_rate(&tiers, 30.0), 2.0);
        assert_eq!(drain_rate(&tiers[1..], 10.0), 0.0);
    }

    #[test]
    fn test_drain_uses_gate_multiplier() {
        let economy = EconomyConfig {
            drain_tiers: vec![DrainTier { from_sec: 0.0, rate: 5.0 }],
            ..Default::default()
        };
        let mut state = RunState::new(1, &economy, RunModifiers::default());
        let slow = GateOption {
            id: "slow".into(),
            name: "Slow".into(),
            duration: Some(5.0),
            effects: EffectBundle { drain: Some(0.5), ..Default::default() },
            permanent: false,
        };
        state.effects.apply(&slow, 10.0);
        drain(&mut state, &economy, 2.0);
        assert_eq!(state.obols, economy.starting_obols - 5.0);
    }

    #[test]
    fn test_bribe_costs_and_cools_down() {
        let economy = economy();
        let mut state = RunState::new(1, &economy, RunModifiers {
            bribe_cooldown: 0.5,
            ..Default::default()
        });
        let mut rng = Pcg32::seed_from_u64(1);
        let start = state.obols;

        let outcome = try_bribe(&mut state, &economy, &mut rng).unwrap();
        assert!(!outcome.free);
        assert_eq!(state.obols, start - 8.0);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.bribe_cooldown, 0.25);

        assert!(matches!(
            try_bribe(&mut state, &economy, &mut rng),
            Err(BribeRejection::Cooldown { .. })
        ));
        tick_timers(&mut state, 0.3);
        assert!(try_bribe(&mut state, &economy, &mut rng).is_ok());
    }

    #[test]
    fn test_bribe_rejected_when_broke() {
        let economy = economy();
        let mut state = RunState::new(1, &economy, RunModifiers::default());
        state.obols = 7.0;
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            try_bribe(&mut state, &economy, &mut rng),
            Err(BribeRejection::InsufficientBalance { cost: 8.0 })
        );
        assert_eq!(state.obols, 7.0);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_periodic_free_shot_resets_timer() {
        let economy = economy();
        let mut state = RunState::new(1, &economy, RunModifiers {
            free_shot_interval: Some(10.0),
            ..Default::default()
        });
        let mut rng = Pcg32::seed_from_u64(1);
        tick_timers(&mut state, 12.0);
        assert!(free_shot_ready(&state));

        let start = state.obols;
        let outcome = try_bribe(&mut state, &economy, &mut rng).unwrap();
        assert!(outcome.free);
        assert_eq!(state.obols, start);
        assert_eq!(state.free_shot_timer, 0.0);
    }

    #[test]
    fn test_lucky_roll_keeps_periodic_timer() {
        let economy = EconomyConfig {
            bribe_free_chance: 1.0,
            ..economy()
        };
        let mut state = RunState::new(1, &economy, RunModifiers {
            free_shot_interval: Some(10.0),
            ..Default::default()
        });
        let mut rng = Pcg32::seed_from_u64(1);
        tick_timers(&mut state, 10.0);
        let start = state.obols;
        assert!(try_bribe(&mut state, &economy, &mut rng).unwrap().free);
        assert_eq!(state.obols, start);
        assert!(free_shot_ready(&state));
    }

    #[test]
    fn test_shield_regenerates_to_capacity() {
        let economy = economy();
        let mut state = RunState::new(1, &economy, RunModifiers {
            shield_capacity: 2,
            shield_regen_sec: 5.0,
            ..Default::default()
        });
        state.shields = 0;
        tick_timers(&mut state, 3.0);
        assert_eq!(state.shields, 0);
        tick_timers(&mut state, 2.0);
        assert_eq!(state.shields, 1);
        tick_timers(&mut state, 5.0);
        assert_eq!(state.shields, 2);
        tick_timers(&mut state, 50.0);
        assert_eq!(state.shields, 2);
    }

    #[test]
    fn test_settle_credits_only_new_earnings() {
        let economy = EconomyConfig {
            earnings: EarningsConfig {
                coins_per_meter: 0.1,
                coins_per_pickup: 1.0,
                leftover_rate: 0.0,
            },
            ..Default::default()
        };
        let mut state = RunState::new(1, &economy, RunModifiers::default());
        state.distance = 100.0;
        state.pickups_collected = 2;
        let first = settle(&mut state, &economy);
        assert_eq!(first.earnings, 12.0);
        assert_eq!(first.score, 100);

        // Revived run continues
        state.distance = 150.0;
        let second = settle(&mut state, &economy);
        assert_eq!(second.earnings, 5.0);
        assert_eq!(second.score, 150);
    }

    proptest! {
        #[test]
        fn drain_rate_never_decreases_over_time(a in 0.0f32..200.0, b in 0.0f32..200.0) {
            let tiers = tiers();
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(drain_rate(&tiers, early) <= drain_rate(&tiers, late));
        }
    }
}
