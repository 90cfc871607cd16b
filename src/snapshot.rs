//! Read-only HUD model
//!
//! Everything a renderer or UI layer needs for one frame, flattened out of the
//! game so presentation never touches simulation state directly.

use serde::Serialize;

use crate::game::Game;
use crate::lifecycle::RunPhase;
use crate::persistence::SaveStore;
use crate::platform::Platform;
use crate::sim::economy::free_shot_ready;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectView {
    pub name: String,
    /// Seconds left, `None` for permanent effects
    pub remaining: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementView {
    pub score: u64,
    pub earnings: f64,
    pub doubled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub phase: RunPhase,
    pub obols: f32,
    /// Whole meters travelled this run
    pub distance: u64,
    pub pickups: u32,
    pub shields: u32,
    pub shield_capacity: u32,
    pub bribe_cost: f32,
    pub bribe_cooldown: f32,
    pub bribe_ready: bool,
    pub free_shot_ready: bool,
    pub invulnerable: bool,
    pub effects: Vec<EffectView>,
    pub best_score: u64,
    pub wallet_coins: f64,
    pub death_count: u32,
    pub settlement: Option<SettlementView>,
    pub can_revive: bool,
    pub can_double: bool,
}

impl HudSnapshot {
    pub fn capture<P: Platform, S: SaveStore>(game: &Game<P, S>) -> Self {
        let progress = game.progress();
        let bribe_cost = game.config().economy.bribe_cost;

        let mut snapshot = Self {
            phase: game.phase(),
            obols: 0.0,
            distance: 0,
            pickups: 0,
            shields: 0,
            shield_capacity: 0,
            bribe_cost,
            bribe_cooldown: 0.0,
            bribe_ready: false,
            free_shot_ready: false,
            invulnerable: false,
            effects: Vec::new(),
            best_score: progress.best_score,
            wallet_coins: progress.wallet_coins,
            death_count: game.lifecycle().death_count(),
            settlement: game.settlement().map(|s| SettlementView {
                score: s.score,
                earnings: s.earnings,
                doubled: s.doubled,
            }),
            can_revive: game.can_revive(),
            can_double: game.can_double(),
        };

        if let Some(run) = game.run() {
            let free = free_shot_ready(run);
            snapshot.obols = run.obols.max(0.0);
            snapshot.distance = run.score();
            snapshot.pickups = run.pickups_collected;
            snapshot.shields = run.shields;
            snapshot.shield_capacity = run.shield_capacity;
            snapshot.bribe_cooldown = run.bribe_cooldown.max(0.0);
            snapshot.free_shot_ready = free;
            snapshot.bribe_ready = game.phase() == RunPhase::Running
                && run.bribe_cooldown <= 0.0
                && (free || run.obols >= bribe_cost);
            snapshot.invulnerable = run.invulnerable > 0.0;
            snapshot.effects = run
                .effects
                .effects()
                .iter()
                .map(|e| EffectView {
                    name: e.name.clone(),
                    remaining: (!e.permanent).then_some(e.remaining),
                })
                .collect();
        }
        snapshot
    }
}
