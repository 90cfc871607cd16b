//! Frame simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform concerns:
//! - Randomness only through an injected generator
//! - Stable iteration order (entities keep spawn order)
//! - State exposed read-only to presentation

pub mod collision;
pub mod economy;
pub mod effects;
pub mod modifiers;
pub mod movement;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{choose_gate_side, circles_overlap, gate_zones};
pub use economy::{BribeOutcome, Settlement, drain_rate, settle, try_bribe};
pub use effects::{ActiveEffect, ApplyOutcome, EffectStack};
pub use modifiers::RunModifiers;
pub use state::{
    Boat, GatePair, GateSide, Obstacle, Pickup, Projectile, RunState, SimEvent,
};
pub use tick::{TickInput, TickOutcome, update};
