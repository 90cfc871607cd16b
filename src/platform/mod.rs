//! Platform abstraction layer
//!
//! Ads, banners, cloud save, and app suspend/resume signals come from an
//! external adapter. Requests return immediately (`true` = accepted); their
//! completions, and any suspend/resume callbacks, are posted as
//! `PlatformEvent`s on a channel the game drains at the start of each frame.
//! The game must work with every request refused (`NullPlatform`).

use crossbeam_channel::{Receiver, Sender};

/// What a rewarded ad is being watched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    /// Continue the run after running out of obols
    Revive,
    /// Double the run's score and earnings
    DoubleEarnings,
}

/// Completion and lifecycle messages from the platform adapter
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// App hidden/backgrounded; may arrive several times before a resume
    Suspend,
    Resume,
    InterstitialClosed { shown: bool },
    RewardedClosed { kind: RewardKind, rewarded: bool },
    /// Raw cloud payload, `None` when nothing is stored or the load failed
    CloudLoaded(Option<String>),
    CloudSaved { ok: bool },
}

pub type EventSender = Sender<PlatformEvent>;
pub type EventReceiver = Receiver<PlatformEvent>;

/// Unbounded channel for platform completions
pub fn event_channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::unbounded()
}

/// Contract the game core consumes
pub trait Platform {
    /// Hand the adapter the channel its callbacks post to
    fn init(&mut self, events: EventSender) -> bool;
    /// Request an interstitial; completion arrives as `InterstitialClosed`
    fn show_interstitial(&mut self) -> bool;
    /// Request a rewarded ad; completion arrives as `RewardedClosed`
    fn show_rewarded(&mut self, kind: RewardKind) -> bool;
    fn show_banner(&mut self) -> bool;
    fn hide_banner(&mut self) -> bool;
    /// Request the cloud payload; completion arrives as `CloudLoaded`
    fn load_cloud_save(&mut self) -> bool;
    /// Fire-and-forget upload; completion (if any) arrives as `CloudSaved`
    fn save_cloud_save(&mut self, payload: &str) -> bool;
}

/// No platform present: every request is refused
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlatform;

impl Platform for NullPlatform {
    fn init(&mut self, _events: EventSender) -> bool {
        false
    }

    fn show_interstitial(&mut self) -> bool {
        false
    }

    fn show_rewarded(&mut self, _kind: RewardKind) -> bool {
        false
    }

    fn show_banner(&mut self) -> bool {
        false
    }

    fn hide_banner(&mut self) -> bool {
        false
    }

    fn load_cloud_save(&mut self) -> bool {
        false
    }

    fn save_cloud_save(&mut self, _payload: &str) -> bool {
        false
    }
}
