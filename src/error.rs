//! Error types shared across the crate.
//!
//! Configuration errors are fatal at startup. Everything else here describes a
//! rejected player action and is turned into a notice instead of propagating.

use std::io;

/// Failure to load or validate the game configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Why an upgrade purchase was refused
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PurchaseError {
    #[error("Unknown upgrade branch: {0}")]
    UnknownBranch(String),

    #[error("Upgrade {0} is already at max level")]
    MaxLevel(String),

    #[error("Need {cost} coins, wallet holds {balance}")]
    InsufficientFunds { cost: f64, balance: f64 },

    #[error("Upgrades can only be bought between runs")]
    NotBetweenRuns,
}

/// Why a bribe shot was refused
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum BribeRejection {
    #[error("Bribe is cooling down ({remaining:.2}s)")]
    Cooldown { remaining: f32 },

    #[error("Need {cost} obols for a bribe")]
    InsufficientBalance { cost: f32 },

    #[error("No run in progress")]
    NotRunning,
}
