//! Persistent meta progression
//!
//! Best score, wallet, and purchased upgrade levels. Only the game core mutates
//! this in memory; persistence is a write-through sink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::PurchaseError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaProgress {
    pub best_score: u64,
    pub wallet_coins: f64,
    /// Upgrade branch id -> purchased level
    pub upgrades: BTreeMap<String, u32>,
}

impl MetaProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purchased level of a branch (0 = none)
    pub fn level(&self, branch_id: &str) -> u32 {
        self.upgrades.get(branch_id).copied().unwrap_or(0)
    }

    /// Raise the best score if beaten; returns true on a new best
    pub fn record_score(&mut self, score: u64) -> bool {
        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }

    pub fn credit(&mut self, coins: f64) {
        if coins.is_finite() && coins > 0.0 {
            self.wallet_coins += coins;
        }
    }

    /// Cost of the next level of a branch, `None` when maxed or unknown
    pub fn next_cost(&self, config: &GameConfig, branch_id: &str) -> Option<f64> {
        let branch = config.upgrade_branch(branch_id)?;
        branch.level(self.level(branch_id) + 1).map(|l| l.cost)
    }

    /// Buy the next level of a branch; returns the new level
    pub fn purchase(&mut self, config: &GameConfig, branch_id: &str) -> Result<u32, PurchaseError> {
        let branch = config
            .upgrade_branch(branch_id)
            .ok_or_else(|| PurchaseError::UnknownBranch(branch_id.to_string()))?;
        let next = self.level(branch_id) + 1;
        let level = branch
            .level(next)
            .ok_or_else(|| PurchaseError::MaxLevel(branch.name.clone()))?;
        if self.wallet_coins < level.cost {
            return Err(PurchaseError::InsufficientFunds {
                cost: level.cost,
                balance: self.wallet_coins,
            });
        }

        self.wallet_coins -= level.cost;
        self.upgrades.insert(branch_id.to_string(), next);
        log::info!("Upgrade {} bought: level {} for {} coins", branch_id, next, level.cost);
        Ok(next)
    }

    /// Fold another copy (e.g. a cloud save) in, keeping the furthest progress.
    ///
    /// Returns true if anything changed.
    pub fn merge(&mut self, other: &MetaProgress) -> bool {
        let before = self.clone();
        self.best_score = self.best_score.max(other.best_score);
        self.wallet_coins = self.wallet_coins.max(other.wallet_coins);
        for (branch, level) in &other.upgrades {
            let entry = self.upgrades.entry(branch.clone()).or_insert(0);
            *entry = (*entry).max(*level);
        }
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::bundled().unwrap()
    }

    #[test]
    fn test_record_score_keeps_best() {
        let mut progress = MetaProgress::new();
        assert!(progress.record_score(120));
        assert!(!progress.record_score(80));
        assert_eq!(progress.best_score, 120);
    }

    #[test]
    fn test_purchase_deducts_and_levels_up() {
        let config = config();
        let mut progress = MetaProgress::new();
        progress.wallet_coins = 100.0;
        let cost = progress.next_cost(&config, "keel").unwrap();
        assert_eq!(progress.purchase(&config, "keel"), Ok(1));
        assert_eq!(progress.level("keel"), 1);
        assert_eq!(progress.wallet_coins, 100.0 - cost);
    }

    #[test]
    fn test_purchase_rejections() {
        let config = config();
        let mut progress = MetaProgress::new();
        assert!(matches!(
            progress.purchase(&config, "keel"),
            Err(PurchaseError::InsufficientFunds { .. })
        ));
        assert_eq!(
            progress.purchase(&config, "nope"),
            Err(PurchaseError::UnknownBranch("nope".into()))
        );

        progress.wallet_coins = 10_000.0;
        let max = config.upgrade_branch("lodestone").unwrap().max_level();
        for _ in 0..max {
            progress.purchase(&config, "lodestone").unwrap();
        }
        let wallet = progress.wallet_coins;
        assert!(matches!(
            progress.purchase(&config, "lodestone"),
            Err(PurchaseError::MaxLevel(_))
        ));
        assert_eq!(progress.wallet_coins, wallet);
        assert_eq!(progress.next_cost(&config, "lodestone"), None);
    }

    #[test]
    fn test_merge_keeps_furthest_progress() {
        let mut local = MetaProgress {
            best_score: 500,
            wallet_coins: 12.0,
            upgrades: BTreeMap::from([("keel".to_string(), 2)]),
        };
        let cloud = MetaProgress {
            best_score: 300,
            wallet_coins: 40.0,
            upgrades: BTreeMap::from([("keel".to_string(), 1), ("aegis".to_string(), 1)]),
        };
        assert!(local.merge(&cloud));
        assert_eq!(local.best_score, 500);
        assert_eq!(local.wallet_coins, 40.0);
        assert_eq!(local.level("keel"), 2);
        assert_eq!(local.level("aegis"), 1);
        assert!(!local.merge(&cloud));
    }
}
