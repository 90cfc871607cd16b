//! Upgrade levels resolved into per-run modifiers
//!
//! Resolution happens once when a run starts; the result is snapshotted into
//! `RunState` and never recomputed mid-run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clamp_multiplier;
use crate::config::{GameConfig, UpgradeBranch, UpgradeEffects};

/// Shortest allowed periodic free-shot interval (seconds)
const MIN_FREE_SHOT_INTERVAL: f32 = 1.0;
/// Shortest allowed shield regeneration period (seconds)
const MIN_SHIELD_REGEN: f32 = 0.5;

/// Effect bundle for `level` of `branch`; level 0 is the empty bundle.
///
/// Levels past the end of the branch resolve to its last level.
pub fn resolve(branch: &UpgradeBranch, level: u32) -> UpgradeEffects {
    if level == 0 {
        return UpgradeEffects::default();
    }
    let level = level.min(branch.max_level());
    branch
        .level(level)
        .map(|l| l.effects.clone())
        .unwrap_or_default()
}

/// Flat modifiers derived from every purchased upgrade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    pub shield_capacity: u32,
    /// Seconds per regenerated shield charge (0 = no regeneration)
    pub shield_regen_sec: f32,
    /// Scales obstacle collision penalties
    pub obstacle_damage: f32,
    /// Scales the base magnet radius
    pub magnet: f32,
    /// Scales pickup value
    pub soul_value: f32,
    /// Chance a collected pickup pays out twice
    pub double_chance: f32,
    /// Scales the bribe cooldown
    pub bribe_cooldown: f32,
    /// Radius of obstacles cleared around a bribed obstacle (0 = none)
    pub bribe_splash: f32,
    /// Seconds between earned free bribes
    pub free_shot_interval: Option<f32>,
}

impl Default for RunModifiers {
    fn default() -> Self {
        Self {
            shield_capacity: 0,
            shield_regen_sec: 0.0,
            obstacle_damage: 1.0,
            magnet: 1.0,
            soul_value: 1.0,
            double_chance: 0.0,
            bribe_cooldown: 1.0,
            bribe_splash: 0.0,
            free_shot_interval: None,
        }
    }
}

impl RunModifiers {
    /// Resolve every branch at its purchased level and combine the results
    pub fn from_levels(config: &GameConfig, levels: &BTreeMap<String, u32>) -> Self {
        let mut modifiers = Self::default();
        for branch in &config.upgrades {
            let level = levels.get(&branch.id).copied().unwrap_or(0);
            modifiers.absorb(&resolve(branch, level));
        }
        modifiers.sanitized()
    }

    /// Fold one bundle in: multipliers multiply, capacities add,
    /// radii take the largest, periods take the shortest.
    pub fn absorb(&mut self, effects: &UpgradeEffects) {
        if let Some(capacity) = effects.shield_capacity {
            self.shield_capacity = self.shield_capacity.saturating_add(capacity);
        }
        if let Some(regen) = effects.shield_regen_sec.filter(|r| *r > 0.0) {
            self.shield_regen_sec = if self.shield_regen_sec > 0.0 {
                self.shield_regen_sec.min(regen)
            } else {
                regen
            };
        }
        if let Some(mult) = effects.obstacle_damage {
            self.obstacle_damage *= mult;
        }
        if let Some(mult) = effects.magnet {
            self.magnet *= mult;
        }
        if let Some(mult) = effects.soul_value {
            self.soul_value *= mult;
        }
        if let Some(chance) = effects.double_chance {
            self.double_chance += chance;
        }
        if let Some(mult) = effects.bribe_cooldown {
            self.bribe_cooldown *= mult;
        }
        if let Some(radius) = effects.bribe_splash {
            self.bribe_splash = self.bribe_splash.max(radius);
        }
        if let Some(interval) = effects.free_shot_interval.filter(|i| *i > 0.0) {
            self.free_shot_interval = Some(match self.free_shot_interval {
                Some(current) => current.min(interval),
                None => interval,
            });
        }
    }

    /// Clamp every derived value into a playable range
    pub fn sanitized(mut self) -> Self {
        self.obstacle_damage = clamp_multiplier(self.obstacle_damage);
        self.magnet = clamp_multiplier(self.magnet);
        self.soul_value = clamp_multiplier(self.soul_value);
        self.bribe_cooldown = clamp_multiplier(self.bribe_cooldown);
        self.double_chance = if self.double_chance.is_nan() {
            0.0
        } else {
            self.double_chance.clamp(0.0, 1.0)
        };
        self.bribe_splash = self.bribe_splash.max(0.0);
        if self.shield_regen_sec > 0.0 {
            self.shield_regen_sec = self.shield_regen_sec.max(MIN_SHIELD_REGEN);
        }
        self.free_shot_interval = self
            .free_shot_interval
            .map(|i| i.max(MIN_FREE_SHOT_INTERVAL));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpgradeLevel;
    use crate::consts::MIN_MULTIPLIER;

    fn branch(id: &str, levels: Vec<UpgradeEffects>) -> UpgradeBranch {
        UpgradeBranch {
            id: id.into(),
            name: id.into(),
            levels: levels
                .into_iter()
                .map(|effects| UpgradeLevel { cost: 10.0, effects })
                .collect(),
        }
    }

    #[test]
    fn test_level_zero_is_neutral() {
        let b = branch(
            "keel",
            vec![UpgradeEffects { obstacle_damage: Some(0.5), ..Default::default() }],
        );
        assert_eq!(resolve(&b, 0), UpgradeEffects::default());
        assert_eq!(resolve(&b, 1).obstacle_damage, Some(0.5));
        // Past the last level resolves to the last level
        assert_eq!(resolve(&b, 7).obstacle_damage, Some(0.5));
    }

    #[test]
    fn test_from_levels_combines_branches() {
        let config = GameConfig {
            upgrades: vec![
                branch(
                    "aegis",
                    vec![
                        UpgradeEffects {
                            shield_capacity: Some(1),
                            shield_regen_sec: Some(30.0),
                            ..Default::default()
                        },
                        UpgradeEffects {
                            shield_capacity: Some(2),
                            shield_regen_sec: Some(15.0),
                            ..Default::default()
                        },
                    ],
                ),
                branch(
                    "purse",
                    vec![UpgradeEffects {
                        soul_value: Some(2.0),
                        double_chance: Some(0.25),
                        ..Default::default()
                    }],
                ),
            ],
            ..Default::default()
        };
        let levels = BTreeMap::from([("aegis".to_string(), 2), ("purse".to_string(), 1)]);
        let modifiers = RunModifiers::from_levels(&config, &levels);
        assert_eq!(modifiers.shield_capacity, 2);
        assert_eq!(modifiers.shield_regen_sec, 15.0);
        assert_eq!(modifiers.soul_value, 2.0);
        assert_eq!(modifiers.double_chance, 0.25);
        assert_eq!(modifiers.obstacle_damage, 1.0);
    }

    #[test]
    fn test_misconfigured_values_are_clamped() {
        let mut modifiers = RunModifiers::default();
        modifiers.absorb(&UpgradeEffects {
            obstacle_damage: Some(0.0),
            bribe_cooldown: Some(-1.0),
            double_chance: Some(3.0),
            bribe_splash: Some(-10.0),
            free_shot_interval: Some(0.01),
            ..Default::default()
        });
        let modifiers = modifiers.sanitized();
        assert_eq!(modifiers.obstacle_damage, MIN_MULTIPLIER);
        assert_eq!(modifiers.bribe_cooldown, MIN_MULTIPLIER);
        assert_eq!(modifiers.double_chance, 1.0);
        assert_eq!(modifiers.bribe_splash, 0.0);
        assert_eq!(modifiers.free_shot_interval, Some(MIN_FREE_SHOT_INTERVAL));
    }

    #[test]
    fn test_unknown_branch_levels_ignored() {
        let config = GameConfig::default();
        let levels = BTreeMap::from([("ghost".to_string(), 3)]);
        assert_eq!(RunModifiers::from_levels(&config, &levels), RunModifiers::default());
    }
}
