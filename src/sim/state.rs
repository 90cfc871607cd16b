//! Run state and entity types
//!
//! Everything the simulation mutates during a run lives in `RunState`, which is
//! rebuilt wholesale at run start.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::EffectStack;
use super::modifiers::RunModifiers;
use super::spawn::SpawnTimers;
use crate::config::{EconomyConfig, GateOption};
use crate::consts::*;
use crate::lane_x_bounds;

/// The player's boat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boat {
    pub pos: Vec2,
    pub half_width: f32,
    pub half_height: f32,
    /// Max horizontal speed (pixels/s)
    pub speed: f32,
}

impl Default for Boat {
    fn default() -> Self {
        Self {
            pos: Vec2::new(LANE_WIDTH / 2.0, BOAT_Y),
            half_width: BOAT_HALF_WIDTH,
            half_height: BOAT_HALF_HEIGHT,
            speed: BOAT_SPEED,
        }
    }
}

impl Boat {
    /// Radius of the circle used for obstacle and pickup contact
    #[inline]
    pub fn collision_radius(&self) -> f32 {
        self.half_width.min(self.half_height)
    }

    /// Move toward a target x at no more than max speed
    pub fn move_toward(&mut self, target_x: f32, dt: f32) {
        let max_delta = self.speed * dt;
        let delta = (target_x - self.pos.x).clamp(-max_delta, max_delta);
        self.pos.x += delta;
        self.clamp_to_lane();
    }

    /// Move by a steering axis in [-1, 1]
    pub fn steer(&mut self, axis: f32, dt: f32) {
        self.pos.x += axis.clamp(-1.0, 1.0) * self.speed * dt;
        self.clamp_to_lane();
    }

    pub fn clamp_to_lane(&mut self) {
        let (min_x, max_x) = lane_x_bounds(self.half_width);
        self.pos.x = self.pos.x.clamp(min_x, max_x);
    }
}

/// Something to dodge (or bribe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Scales the collision penalty
    pub damage: f32,
    /// Visual tag from the template
    pub tag: String,
}

/// A floating soul worth obols
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub value: f32,
}

/// A thrown bribe travelling up the lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
}

/// Which side of a gate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateSide {
    Left,
    Right,
}

/// Two gate options spanning the lane at one y position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePair {
    pub id: u32,
    pub y: f32,
    pub left: GateOption,
    pub right: GateOption,
    /// Width of each side's zone (pixels)
    pub width: f32,
    /// Set once resolved so the pair is never applied twice
    pub chosen: bool,
}

impl GatePair {
    pub fn option(&self, side: GateSide) -> &GateOption {
        match side {
            GateSide::Left => &self.left,
            GateSide::Right => &self.right,
        }
    }
}

/// Something that happened during a tick, for HUD/audio consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    PickupCollected { value: f32, doubled: bool },
    ShieldAbsorbed,
    ShieldRegenerated,
    ObstacleHit { penalty: f32 },
    ObstacleBribed { obstacle_id: u32, splashed: usize },
    BribeThrown { free: bool },
    GateApplied { gate_id: String, name: String, side: GateSide },
    GateRejected { gate_id: String, name: String },
    EffectExpired { gate_id: String, name: String },
    Depleted,
}

/// Complete per-run simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Seed the run's RNG was created from
    pub seed: u64,
    /// Seconds of simulated play
    pub elapsed: f32,
    /// Meters travelled
    pub distance: f32,
    /// Resource balance; the run ends at zero
    pub obols: f32,
    pub pickups_collected: u32,
    /// Coins already credited to the wallet by earlier settlements this run
    pub earnings: f64,
    pub shields: u32,
    pub shield_capacity: u32,
    pub shield_regen_timer: f32,
    /// Upgrade-derived values, fixed for the whole run
    pub modifiers: RunModifiers,
    /// Seconds of post-revive obstacle immunity left
    pub invulnerable: f32,
    pub bribe_cooldown: f32,
    /// Seconds accrued toward the next periodic free bribe
    pub free_shot_timer: f32,
    pub revived: bool,
    pub boat: Boat,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    pub gates: Vec<GatePair>,
    pub effects: EffectStack,
    pub spawn: SpawnTimers,
    /// Events emitted since the last drain
    #[serde(skip)]
    pub events: Vec<SimEvent>,
    next_id: u32,
}

impl RunState {
    /// Fresh run with modifiers snapshotted from upgrades
    pub fn new(seed: u64, economy: &EconomyConfig, modifiers: RunModifiers) -> Self {
        Self {
            seed,
            elapsed: 0.0,
            distance: 0.0,
            obols: economy.starting_obols,
            pickups_collected: 0,
            earnings: 0.0,
            shields: modifiers.shield_capacity,
            shield_capacity: modifiers.shield_capacity,
            shield_regen_timer: 0.0,
            modifiers,
            invulnerable: 0.0,
            bribe_cooldown: 0.0,
            free_shot_timer: 0.0,
            revived: false,
            boat: Boat::default(),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            projectiles: Vec::new(),
            gates: Vec::new(),
            effects: EffectStack::new(),
            spawn: SpawnTimers::new(economy),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_depleted(&self) -> bool {
        self.obols <= 0.0
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Raw score of the run (whole meters)
    pub fn score(&self) -> u64 {
        self.distance.max(0.0).floor() as u64
    }
}
