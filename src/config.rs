//! Immutable game configuration
//!
//! Loaded once at startup and passed by reference into every component that
//! needs tuning data. Every tunable has a serde default so a partial file still
//! loads; a file that cannot be parsed at all is a fatal startup error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Bundled default configuration
const BUNDLED_CONFIG: &str = include_str!("../data/config.json");

/// Accept any JSON value, keeping it only if it is a finite number.
///
/// Absent or non-numeric effect entries are neutral, never an error.
fn lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .map(|v| v as f32)
        .filter(|v| v.is_finite()))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|v| u32::try_from(v).ok()))
}

/// Inclusive range a randomized timer is drawn from (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalRange {
    pub min: f32,
    pub max: f32,
}

impl IntervalRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// One step of the drain schedule: from `from_sec` on, drain `rate` obols/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrainTier {
    pub from_sec: f32,
    pub rate: f32,
}

/// Run-end conversion of a run into wallet coins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsConfig {
    pub coins_per_meter: f32,
    pub coins_per_pickup: f32,
    /// Fraction of leftover obols converted to coins
    pub leftover_rate: f32,
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self {
            coins_per_meter: 0.02,
            coins_per_pickup: 0.25,
            leftover_rate: 0.1,
        }
    }
}

/// Economy and pacing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_obols: f32,
    pub drain_tiers: Vec<DrainTier>,
    pub pickup_value: f32,
    pub collision_penalty: f32,
    pub bribe_cost: f32,
    pub bribe_free_chance: f32,
    pub bribe_cooldown: f32,
    pub gate_interval: f32,
    pub first_gate_delay: f32,
    /// Duration for gates that do not specify their own
    pub gate_duration: f32,
    pub obstacle_interval: IntervalRange,
    pub pickup_interval: IntervalRange,
    /// Base world scroll speed (pixels/s)
    pub scroll_speed: f32,
    /// Base magnet radius before upgrades (pixels)
    pub magnet_radius: f32,
    pub earnings: EarningsConfig,
    pub revive_obols: f32,
    pub revive_invulnerability: f32,
    /// Minimum real time between interstitial prompts (seconds)
    pub interstitial_min_interval: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_obols: 100.0,
            drain_tiers: vec![
                DrainTier { from_sec: 0.0, rate: 1.0 },
                DrainTier { from_sec: 30.0, rate: 1.6 },
                DrainTier { from_sec: 60.0, rate: 2.4 },
                DrainTier { from_sec: 120.0, rate: 3.5 },
            ],
            pickup_value: 6.0,
            collision_penalty: 12.0,
            bribe_cost: 8.0,
            bribe_free_chance: 0.1,
            bribe_cooldown: 0.6,
            gate_interval: 9.0,
            first_gate_delay: 14.0,
            gate_duration: 10.0,
            obstacle_interval: IntervalRange::new(0.8, 1.4),
            pickup_interval: IntervalRange::new(0.45, 0.9),
            scroll_speed: 220.0,
            magnet_radius: 28.0,
            earnings: EarningsConfig::default(),
            revive_obols: 50.0,
            revive_invulnerability: 2.0,
            interstitial_min_interval: 90.0,
        }
    }
}

/// Which multiplier an effect bundle entry drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKey {
    CollisionPenalty,
    PickupValue,
    Speed,
    Drain,
}

impl EffectKey {
    pub const ALL: [EffectKey; 4] = [
        EffectKey::CollisionPenalty,
        EffectKey::PickupValue,
        EffectKey::Speed,
        EffectKey::Drain,
    ];
}

/// Optional multipliers a gate applies while active
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectBundle {
    #[serde(default, deserialize_with = "lenient_f32")]
    pub collision_penalty: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub pickup_value: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub speed: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub drain: Option<f32>,
}

impl EffectBundle {
    /// Value for `key`, neutral when absent
    pub fn value(&self, key: EffectKey) -> f32 {
        let entry = match key {
            EffectKey::CollisionPenalty => self.collision_penalty,
            EffectKey::PickupValue => self.pickup_value,
            EffectKey::Speed => self.speed,
            EffectKey::Drain => self.drain,
        };
        entry.unwrap_or(1.0)
    }
}

/// A gate option definition (one side of a gate pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOption {
    pub id: String,
    pub name: String,
    /// Seconds the effect lasts; `Some(0.0)` means permanent, `None` uses the default
    #[serde(default, deserialize_with = "lenient_f32")]
    pub duration: Option<f32>,
    #[serde(default)]
    pub effects: EffectBundle,
    #[serde(default)]
    pub permanent: bool,
}

impl GateOption {
    pub fn is_permanent(&self) -> bool {
        self.permanent || self.duration == Some(0.0)
    }
}

/// Obstacle template picked at random by the spawner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleTemplate {
    pub tag: String,
    pub radius: f32,
    #[serde(default = "neutral")]
    pub damage: f32,
}

fn neutral() -> f32 {
    1.0
}

/// Effects granted by one upgrade level; absent entries are neutral
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEffects {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub shield_capacity: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub shield_regen_sec: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub obstacle_damage: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub magnet: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub soul_value: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub double_chance: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub bribe_cooldown: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub bribe_splash: Option<f32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub free_shot_interval: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeLevel {
    pub cost: f64,
    #[serde(default)]
    pub effects: UpgradeEffects,
}

/// A permanent upgrade branch with ordered levels (index 0 = level 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeBranch {
    pub id: String,
    pub name: String,
    pub levels: Vec<UpgradeLevel>,
}

impl UpgradeBranch {
    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Level definition for a purchased level (1-based)
    pub fn level(&self, level: u32) -> Option<&UpgradeLevel> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.levels.get(index)
    }
}

/// Localized in-run strings keyed by message id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextTable(BTreeMap<String, String>);

impl TextTable {
    /// Look up a string, falling back to the key itself
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Look up a string and substitute `{name}`
    pub fn format(&self, key: &str, name: &str) -> String {
        self.get(key).replace("{name}", name)
    }
}

/// Complete read-only configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub economy: EconomyConfig,
    pub gates: Vec<GateOption>,
    pub obstacles: Vec<ObstacleTemplate>,
    pub upgrades: Vec<UpgradeBranch>,
    pub texts: TextTable,
}

impl GameConfig {
    /// Parse and validate a configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: GameConfig = serde_json::from_str(json)?;
        config
            .economy
            .drain_tiers
            .sort_by(|a, b| a.from_sec.total_cmp(&b.from_sec));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded config from {} ({} gates, {} obstacles, {} upgrade branches)",
            path.as_ref().display(),
            config.gates.len(),
            config.obstacles.len(),
            config.upgrades.len()
        );
        Ok(config)
    }

    /// The configuration shipped with the binary
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json_str(BUNDLED_CONFIG)
    }

    pub fn upgrade_branch(&self, id: &str) -> Option<&UpgradeBranch> {
        self.upgrades.iter().find(|b| b.id == id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let economy = &self.economy;
        if economy.drain_tiers.is_empty() {
            return Err(ConfigError::Invalid("drain_tiers must not be empty".into()));
        }
        if self.gates.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "need at least 2 gates for a gate pair, found {}",
                self.gates.len()
            )));
        }
        if self.obstacles.is_empty() {
            return Err(ConfigError::Invalid("need at least 1 obstacle template".into()));
        }
        for (name, range) in [
            ("obstacle_interval", economy.obstacle_interval),
            ("pickup_interval", economy.pickup_interval),
        ] {
            if !(range.min > 0.0 && range.min <= range.max) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must satisfy 0 < min <= max, got {}..{}",
                    range.min, range.max
                )));
            }
        }
        if economy.gate_interval <= 0.0 || economy.first_gate_delay < 0.0 {
            return Err(ConfigError::Invalid("gate timers must be positive".into()));
        }
        if let Some(template) = self.obstacles.iter().find(|t| t.radius <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "obstacle {} has non-positive radius",
                template.tag
            )));
        }
        Ok(())
    }
}
