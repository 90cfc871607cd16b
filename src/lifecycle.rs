//! Run lifecycle state machine
//!
//! `Menu -> Running -> (Paused <-> Running) -> GameOver -> Menu`, with revive
//! taking `GameOver` straight back to `Running`.
//!
//! Pausing is tracked per reason with counters. The user, the platform (tab
//! hidden, app backgrounded) and open ads can each hold the run suspended, and
//! platform signals may nest, so the run only resumes once every reason has
//! been released.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Between runs (upgrade shop)
    Menu,
    /// Active gameplay
    Running,
    /// A run is in progress but at least one suspend reason is held
    Paused,
    /// Obols ran out
    GameOver,
}

/// Who asked for the pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SuspendReason {
    User,
    Platform,
    Ad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLifecycle {
    phase: RunPhase,
    suspends: BTreeMap<SuspendReason, u32>,
    death_count: u32,
    /// Real time (seconds) the last interstitial was shown
    last_interstitial: Option<f64>,
}

impl Default for RunLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLifecycle {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Menu,
            suspends: BTreeMap::new(),
            death_count: 0,
            last_interstitial: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn death_count(&self) -> u32 {
        self.death_count
    }

    /// Whether any suspend reason is held
    pub fn is_suspended(&self) -> bool {
        self.suspends.values().any(|count| *count > 0)
    }

    pub fn is_suspended_by(&self, reason: SuspendReason) -> bool {
        self.suspends.get(&reason).is_some_and(|count| *count > 0)
    }

    /// Whether the simulation should step this frame
    pub fn is_simulating(&self) -> bool {
        self.phase == RunPhase::Running && !self.is_suspended()
    }

    /// Whether a run exists (running, paused, or awaiting revive)
    pub fn in_run(&self) -> bool {
        matches!(self.phase, RunPhase::Running | RunPhase::Paused)
    }

    /// Menu -> Running (or Paused when something still holds a suspend)
    pub fn start_run(&mut self) -> bool {
        if self.phase != RunPhase::Menu {
            return false;
        }
        self.suspends.remove(&SuspendReason::User);
        self.phase = RunPhase::Running;
        self.refresh();
        log::info!("Run started");
        true
    }

    /// Add a suspend reason; returns true if this suspended a previously free game
    pub fn suspend(&mut self, reason: SuspendReason) -> bool {
        let was_suspended = self.is_suspended();
        *self.suspends.entry(reason).or_insert(0) += 1;
        self.refresh();
        !was_suspended
    }

    /// Release one hold of a reason; returns true if nothing holds the game any more
    pub fn resume(&mut self, reason: SuspendReason) -> bool {
        let Some(count) = self.suspends.get_mut(&reason) else {
            return false;
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if *count == 0 {
            self.suspends.remove(&reason);
        }
        self.refresh();
        !self.is_suspended()
    }

    /// Player pause button; only meaningful during a run
    pub fn toggle_user_pause(&mut self) -> bool {
        if !self.in_run() {
            return false;
        }
        if self.is_suspended_by(SuspendReason::User) {
            self.resume(SuspendReason::User);
        } else {
            self.suspend(SuspendReason::User);
        }
        true
    }

    /// Running/Paused -> GameOver; returns the new death count
    pub fn enter_game_over(&mut self) -> Option<u32> {
        if !self.in_run() {
            return None;
        }
        self.suspends.remove(&SuspendReason::User);
        self.phase = RunPhase::GameOver;
        self.death_count += 1;
        log::info!("Game over (death #{})", self.death_count);
        Some(self.death_count)
    }

    /// GameOver -> Running after a successful revive
    pub fn revive(&mut self) -> bool {
        if self.phase != RunPhase::GameOver {
            return false;
        }
        self.phase = RunPhase::Running;
        self.refresh();
        log::info!("Run revived");
        true
    }

    /// GameOver -> Menu
    pub fn restart(&mut self) -> bool {
        if self.phase != RunPhase::GameOver {
            return false;
        }
        self.phase = RunPhase::Menu;
        true
    }

    /// Interstitials are offered on even death counts, rate limited by real time
    pub fn should_offer_interstitial(&self, now: f64, min_interval: f64) -> bool {
        if self.death_count == 0 || self.death_count % 2 != 0 {
            return false;
        }
        match self.last_interstitial {
            Some(last) => now - last >= min_interval,
            None => true,
        }
    }

    pub fn record_interstitial(&mut self, now: f64) {
        self.last_interstitial = Some(now);
    }

    fn refresh(&mut self) {
        let suspended = self.is_suspended();
        self.phase = match self.phase {
            RunPhase::Running if suspended => RunPhase::Paused,
            RunPhase::Paused if !suspended => RunPhase::Running,
            phase => phase,
        };
    }
}
