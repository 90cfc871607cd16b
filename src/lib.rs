//! Charon Run - a vertically scrolling river run
//!
//! Core modules:
//! - `sim`: Frame simulation (spawning, movement, collisions, effects, economy)
//! - `lifecycle`: Run state machine and suspend bookkeeping
//! - `progress`: Persistent meta progression (wallet, best score, upgrades)
//! - `persistence`: Versioned save payload and storage backends
//! - `platform`: Ads / cloud save collaborator contract
//! - `game`: Facade driving all of the above once per frame
//! - `snapshot`: Read-only presentation model for the HUD

pub mod config;
pub mod error;
pub mod game;
pub mod lifecycle;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod sim;
pub mod snapshot;

pub use config::GameConfig;
pub use error::{BribeRejection, ConfigError, PurchaseError};
pub use game::Game;
pub use lifecycle::{RunLifecycle, RunPhase, SuspendReason};
pub use progress::MetaProgress;
pub use snapshot::HudSnapshot;

/// Game configuration constants
pub mod consts {
    /// Largest simulation step a single frame may take (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Lane dimensions (pixels)
    pub const LANE_WIDTH: f32 = 360.0;
    pub const LANE_HEIGHT: f32 = 640.0;

    /// Boat defaults - boat rides near the bottom of the lane
    pub const BOAT_Y: f32 = 560.0;
    pub const BOAT_HALF_WIDTH: f32 = 16.0;
    pub const BOAT_HALF_HEIGHT: f32 = 26.0;
    pub const BOAT_SPEED: f32 = 320.0;

    /// Entities spawn this far above the visible area
    pub const SPAWN_MARGIN: f32 = 40.0;

    /// Gate geometry: two zones either side of a center gap
    pub const GATE_WIDTH: f32 = 120.0;
    pub const GATE_CENTER_GAP: f32 = 40.0;
    pub const GATE_HEIGHT: f32 = 24.0;
    /// Vertical distance at which the boat is considered to be crossing a gate
    pub const GATE_Y_TOLERANCE: f32 = 14.0;

    /// Pickup / projectile defaults
    pub const PICKUP_RADIUS: f32 = 10.0;
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const PROJECTILE_SPEED: f32 = 520.0;

    /// World scroll to distance conversion
    pub const PIXELS_PER_METER: f32 = 10.0;

    /// Bounds for any derived multiplier
    pub const MIN_MULTIPLIER: f32 = 0.05;
    pub const MAX_MULTIPLIER: f32 = 20.0;
}

/// Clamp a derived multiplier into the sane range, mapping NaN to neutral
#[inline]
pub fn clamp_multiplier(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(consts::MIN_MULTIPLIER, consts::MAX_MULTIPLIER)
}

/// Horizontal x range the boat center may occupy
#[inline]
pub fn lane_x_bounds(half_width: f32) -> (f32, f32) {
    (half_width, consts::LANE_WIDTH - half_width)
}
