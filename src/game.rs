//! Game facade
//!
//! Owns the configuration, lifecycle, meta progress, current run, and the
//! platform/storage collaborators. The external loop calls `frame` once per
//! animation callback; rendering reads `snapshot` and `run` afterwards.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::consts::MAX_FRAME_DT;
use crate::error::{BribeRejection, PurchaseError};
use crate::lifecycle::{RunLifecycle, RunPhase, SuspendReason};
use crate::persistence::{self, SaveStore};
use crate::platform::{EventReceiver, Platform, PlatformEvent, RewardKind, event_channel};
use crate::progress::MetaProgress;
use crate::sim::{
    self, BribeOutcome, RunModifiers, RunState, Settlement, SimEvent, TickInput, TickOutcome,
};
use crate::snapshot::HudSnapshot;

/// Golden-ratio increment between per-run seeds
const RUN_SEED_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// A user-visible message, resolved against the text table on display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: &'static str,
    pub name: Option<String>,
}

impl Notice {
    pub fn new(key: &'static str) -> Self {
        Self { key, name: None }
    }

    pub fn named(key: &'static str, name: impl Into<String>) -> Self {
        Self {
            key,
            name: Some(name.into()),
        }
    }

    /// Localized text for this notice
    pub fn render(&self, texts: &crate::config::TextTable) -> String {
        texts.format(self.key, self.name.as_deref().unwrap_or(""))
    }

    fn from_sim_event(event: &SimEvent) -> Option<Self> {
        match event {
            SimEvent::GateApplied { name, .. } => Some(Self::named("gate.applied", name.clone())),
            SimEvent::GateRejected { name, .. } => {
                Some(Self::named("gate.already_applied", name.clone()))
            }
            SimEvent::EffectExpired { name, .. } => Some(Self::named("gate.expired", name.clone())),
            SimEvent::ShieldAbsorbed => Some(Self::new("shield.absorbed")),
            SimEvent::BribeThrown { free: true } => Some(Self::new("bribe.free")),
            _ => None,
        }
    }
}

pub struct Game<P: Platform, S: SaveStore> {
    config: GameConfig,
    lifecycle: RunLifecycle,
    progress: MetaProgress,
    run: Option<RunState>,
    settlement: Option<Settlement>,
    rng: Pcg32,
    base_seed: u64,
    runs_started: u64,
    platform: P,
    store: S,
    events: EventReceiver,
    /// Rewarded ad currently open, if any
    pending_reward: Option<RewardKind>,
    interstitial_open: bool,
    notices: Vec<Notice>,
    /// Real time (seconds) of the latest frame
    now: f64,
}

impl<P: Platform, S: SaveStore> Game<P, S> {
    /// Boot: load local progress, hook up the platform, ask for the cloud copy
    pub fn new(config: GameConfig, mut platform: P, store: S, seed: u64) -> Self {
        let progress = persistence::load_progress(&store);
        let (tx, rx) = event_channel();
        if !platform.init(tx) {
            log::info!("No platform available, running local-only");
        }
        if !platform.load_cloud_save() {
            log::debug!("Cloud load unavailable");
        }
        platform.show_banner();

        Self {
            config,
            lifecycle: RunLifecycle::new(),
            progress,
            run: None,
            settlement: None,
            rng: Pcg32::seed_from_u64(seed),
            base_seed: seed,
            runs_started: 0,
            platform,
            store,
            events: rx,
            pending_reward: None,
            interstitial_open: false,
            notices: Vec::new(),
            now: 0.0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &RunLifecycle {
        &self.lifecycle
    }

    pub fn phase(&self) -> RunPhase {
        self.lifecycle.phase()
    }

    pub fn progress(&self) -> &MetaProgress {
        &self.progress
    }

    /// Current run, kept through GameOver until restart
    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot::capture(self)
    }

    /// Take pending notices rendered to text
    pub fn take_notices(&mut self) -> Vec<String> {
        let texts = &self.config.texts;
        self.notices.drain(..).map(|n| n.render(texts)).collect()
    }

    /// Take pending notices unrendered
    pub fn take_raw_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// One animation callback: consume platform messages, then step the
    /// simulation if a run is live and nothing holds it suspended.
    pub fn frame(&mut self, real_dt: f32, now: f64, input: &TickInput) {
        self.now = now;
        self.process_platform_events();

        if !self.lifecycle.is_simulating() {
            return;
        }
        // Non-finite or empty steps are dropped
        if !real_dt.is_finite() || real_dt <= 0.0 {
            return;
        }
        let dt = real_dt.min(MAX_FRAME_DT);
        if input.bribe {
            // Rejections already surface as notices
            let _ = self.bribe();
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };

        let outcome = sim::update(run, &self.config, input, &mut self.rng, dt);
        for event in run.drain_events() {
            if let Some(notice) = Notice::from_sim_event(&event) {
                self.notices.push(notice);
            }
        }
        if outcome == TickOutcome::Depleted {
            self.game_over();
        }
    }

    /// Menu -> Running with a fresh run state
    pub fn start_run(&mut self) -> bool {
        if self.lifecycle.phase() != RunPhase::Menu {
            return false;
        }
        let seed = self
            .base_seed
            .wrapping_add(self.runs_started.wrapping_mul(RUN_SEED_STEP));
        self.runs_started += 1;
        self.rng = Pcg32::seed_from_u64(seed);

        let modifiers = RunModifiers::from_levels(&self.config, &self.progress.upgrades);
        log::info!("Starting run (seed {}) with {:?}", seed, modifiers);
        self.run = Some(RunState::new(seed, &self.config.economy, modifiers));
        self.settlement = None;
        self.lifecycle.start_run();
        self.platform.hide_banner();
        self.notices.push(Notice::new("run.start"));
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.lifecycle.toggle_user_pause()
    }

    /// Throw a bribe from the boat
    pub fn bribe(&mut self) -> Result<BribeOutcome, BribeRejection> {
        if !self.lifecycle.is_simulating() {
            return Err(BribeRejection::NotRunning);
        }
        let run = self.run.as_mut().ok_or(BribeRejection::NotRunning)?;
        let result = sim::try_bribe(run, &self.config.economy, &mut self.rng);
        match result {
            Ok(_) => {
                for event in run.drain_events() {
                    if let Some(notice) = Notice::from_sim_event(&event) {
                        self.notices.push(notice);
                    }
                }
            }
            Err(BribeRejection::Cooldown { .. }) => self.notices.push(Notice::new("bribe.cooldown")),
            Err(BribeRejection::InsufficientBalance { .. }) => {
                self.notices.push(Notice::new("bribe.insufficient"))
            }
            Err(BribeRejection::NotRunning) => {}
        }
        result
    }

    /// Buy the next level of an upgrade branch (menu only)
    pub fn purchase_upgrade(&mut self, branch_id: &str) -> Result<u32, PurchaseError> {
        let name = self
            .config
            .upgrade_branch(branch_id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| branch_id.to_string());
        let result = if self.lifecycle.phase() != RunPhase::Menu {
            Err(PurchaseError::NotBetweenRuns)
        } else {
            self.progress.purchase(&self.config, branch_id)
        };

        let notice = match &result {
            Ok(_) => {
                self.persist();
                Notice::named("upgrade.purchased", name)
            }
            Err(PurchaseError::UnknownBranch(_)) => Notice::new("upgrade.unknown"),
            Err(PurchaseError::MaxLevel(_)) => Notice::named("upgrade.max_level", name),
            Err(PurchaseError::InsufficientFunds { .. }) => {
                Notice::named("upgrade.insufficient_funds", name)
            }
            Err(PurchaseError::NotBetweenRuns) => Notice::new("upgrade.not_between_runs"),
        };
        self.notices.push(notice);
        result
    }

    /// Whether a revive can be offered right now
    pub fn can_revive(&self) -> bool {
        self.lifecycle.phase() == RunPhase::GameOver
            && self.pending_reward.is_none()
            && self.run.as_ref().is_some_and(|r| !r.revived)
            && self.settlement.as_ref().is_some_and(|s| !s.doubled)
    }

    /// Whether the earnings doubler can be offered right now
    pub fn can_double(&self) -> bool {
        self.lifecycle.phase() == RunPhase::GameOver
            && self.pending_reward.is_none()
            && self.settlement.as_ref().is_some_and(|s| !s.doubled)
    }

    /// Ask the platform for a rewarded ad to revive
    pub fn request_revive(&mut self) -> bool {
        if !self.can_revive() {
            return false;
        }
        self.request_rewarded(RewardKind::Revive)
    }

    /// Ask the platform for a rewarded ad to double earnings
    pub fn request_double(&mut self) -> bool {
        if !self.can_double() {
            return false;
        }
        self.request_rewarded(RewardKind::DoubleEarnings)
    }

    /// GameOver -> Menu
    pub fn restart(&mut self) -> bool {
        if !self.lifecycle.restart() {
            return false;
        }
        self.run = None;
        self.settlement = None;
        self.platform.show_banner();
        true
    }

    /// Apply the one-time score/earnings doubling; a repeat call is a no-op
    pub fn apply_reward_double(&mut self) -> bool {
        let Some(settlement) = self.settlement.as_mut() else {
            return false;
        };
        if settlement.doubled {
            return false;
        }
        settlement.doubled = true;
        let bonus = settlement.earnings;
        let doubled_score = settlement.score.saturating_mul(2);

        self.progress.credit(bonus);
        self.progress.record_score(doubled_score);
        log::info!("Reward doubled: +{} coins, score {}", bonus, doubled_score);
        self.persist();
        self.notices.push(Notice::new("reward.doubled"));
        true
    }

    fn request_rewarded(&mut self, kind: RewardKind) -> bool {
        if !self.platform.show_rewarded(kind) {
            let key = match kind {
                RewardKind::Revive => "revive.declined",
                RewardKind::DoubleEarnings => "reward.declined",
            };
            self.notices.push(Notice::new(key));
            return false;
        }
        self.pending_reward = Some(kind);
        self.lifecycle.suspend(SuspendReason::Ad);
        true
    }

    fn game_over(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if self.lifecycle.enter_game_over().is_none() {
            return;
        }

        let settlement = sim::settle(run, &self.config.economy);
        log::info!(
            "Run settled: score {}, +{} coins (distance {:.1}m, {} pickups)",
            settlement.score,
            settlement.earnings,
            run.distance,
            run.pickups_collected
        );
        self.progress.credit(settlement.earnings);
        if self.progress.record_score(settlement.score) {
            log::info!("New best score: {}", settlement.score);
        }
        self.settlement = Some(settlement);
        self.persist();
        self.notices.push(Notice::new("run.over"));
        self.platform.show_banner();

        let min_interval = self.config.economy.interstitial_min_interval;
        if self.lifecycle.should_offer_interstitial(self.now, min_interval)
            && !self.interstitial_open
            && self.platform.show_interstitial()
        {
            self.interstitial_open = true;
            self.lifecycle.record_interstitial(self.now);
            self.lifecycle.suspend(SuspendReason::Ad);
        }
    }

    fn apply_revive(&mut self) -> bool {
        if self.lifecycle.phase() != RunPhase::GameOver {
            return false;
        }
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if run.revived || !self.lifecycle.revive() {
            return false;
        }
        let economy = &self.config.economy;
        run.revived = true;
        run.obols = economy.revive_obols;
        run.invulnerable = economy.revive_invulnerability;
        self.settlement = None;
        self.platform.hide_banner();
        self.notices.push(Notice::new("revive.granted"));
        true
    }

    fn process_platform_events(&mut self) {
        let events: Vec<PlatformEvent> = self.events.try_iter().collect();
        for event in events {
            self.handle_platform_event(event);
        }
    }

    fn handle_platform_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::Suspend => {
                if self.lifecycle.suspend(SuspendReason::Platform) {
                    log::info!("Suspended by platform");
                }
            }
            PlatformEvent::Resume => {
                if self.lifecycle.resume(SuspendReason::Platform) {
                    log::info!("Resumed by platform");
                }
            }
            PlatformEvent::InterstitialClosed { shown } => {
                if self.interstitial_open {
                    self.interstitial_open = false;
                    self.lifecycle.resume(SuspendReason::Ad);
                    log::debug!("Interstitial closed (shown: {})", shown);
                }
            }
            PlatformEvent::RewardedClosed { kind, rewarded } => {
                if self.pending_reward != Some(kind) {
                    log::warn!("Ignoring unexpected rewarded completion: {:?}", kind);
                    return;
                }
                self.pending_reward = None;
                self.lifecycle.resume(SuspendReason::Ad);

                let applied = rewarded
                    && match kind {
                        RewardKind::Revive => self.apply_revive(),
                        RewardKind::DoubleEarnings => self.apply_reward_double(),
                    };
                // A reward that arrives after leaving GameOver lapses silently
                if !applied && self.lifecycle.phase() == RunPhase::GameOver {
                    let key = match kind {
                        RewardKind::Revive => "revive.declined",
                        RewardKind::DoubleEarnings => "reward.declined",
                    };
                    self.notices.push(Notice::new(key));
                }
            }
            PlatformEvent::CloudLoaded(Some(json)) => {
                let cloud = persistence::decode(&json);
                if self.progress.merge(&cloud) {
                    log::info!("Merged cloud progress");
                    self.persist();
                }
            }
            PlatformEvent::CloudLoaded(None) => log::debug!("No cloud save"),
            PlatformEvent::CloudSaved { ok } => {
                if !ok {
                    log::warn!("Cloud save failed, keeping local copy only");
                }
            }
        }
    }

    /// Write progress locally and push it to the cloud
    fn persist(&mut self) {
        persistence::save_progress(&mut self.store, &self.progress);
        let payload = persistence::encode(&self.progress);
        self.platform.save_cloud_save(&payload);
    }
}
