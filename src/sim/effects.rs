//! Active gate effects and their multiplicative composition

use serde::{Deserialize, Serialize};

use crate::config::{EffectBundle, EffectKey, GateOption};

/// A gate effect currently influencing the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub gate_id: String,
    pub name: String,
    pub effects: EffectBundle,
    pub permanent: bool,
    /// Seconds left (ignored for permanent effects)
    pub remaining: f32,
}

/// Result of applying a gate option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A permanent effect from this gate is already active
    AlreadyApplied,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectStack {
    effects: Vec<ActiveEffect>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the gate's effect, rejecting a duplicate permanent effect
    pub fn apply(&mut self, gate: &GateOption, default_duration: f32) -> ApplyOutcome {
        let permanent = gate.is_permanent();
        if permanent
            && self
                .effects
                .iter()
                .any(|e| e.permanent && e.gate_id == gate.id)
        {
            return ApplyOutcome::AlreadyApplied;
        }

        let remaining = if permanent {
            0.0
        } else {
            gate.duration.unwrap_or(default_duration)
        };
        self.effects.push(ActiveEffect {
            gate_id: gate.id.clone(),
            name: gate.name.clone(),
            effects: gate.effects.clone(),
            permanent,
            remaining,
        });
        ApplyOutcome::Applied
    }

    /// Count down temporary effects; returns the ones that expired this tick
    pub fn tick(&mut self, dt: f32) -> Vec<ActiveEffect> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            if effect.permanent {
                return true;
            }
            effect.remaining -= dt;
            if effect.remaining <= 0.0 {
                expired.push(effect.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Product of every active effect's value for `key` (1 when none apply)
    pub fn multiplier_for(&self, key: EffectKey) -> f32 {
        self.effects.iter().map(|e| e.effects.value(key)).product()
    }

    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gate(id: &str, duration: Option<f32>, permanent: bool, effects: EffectBundle) -> GateOption {
        GateOption {
            id: id.into(),
            name: id.into(),
            duration,
            effects,
            permanent,
        }
    }

    fn drain(value: f32) -> EffectBundle {
        EffectBundle { drain: Some(value), ..Default::default() }
    }

    #[test]
    fn test_empty_stack_is_neutral() {
        let stack = EffectStack::new();
        for key in EffectKey::ALL {
            assert_eq!(stack.multiplier_for(key), 1.0);
        }
    }

    #[test]
    fn test_duplicate_permanent_rejected() {
        let mut stack = EffectStack::new();
        let lethe = gate("lethe", Some(0.0), true, drain(0.9));
        assert_eq!(stack.apply(&lethe, 10.0), ApplyOutcome::Applied);
        assert_eq!(stack.apply(&lethe, 10.0), ApplyOutcome::AlreadyApplied);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_temporary_duplicates_stack() {
        let mut stack = EffectStack::new();
        let swift = gate("swift", Some(5.0), false, drain(2.0));
        stack.apply(&swift, 10.0);
        stack.apply(&swift, 10.0);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.multiplier_for(EffectKey::Drain), 4.0);
    }

    #[test]
    fn test_default_duration_used() {
        let mut stack = EffectStack::new();
        stack.apply(&gate("plain", None, false, drain(0.5)), 7.0);
        assert_eq!(stack.effects()[0].remaining, 7.0);
    }

    #[test]
    fn test_tick_expires_temporary_only() {
        let mut stack = EffectStack::new();
        stack.apply(&gate("short", Some(1.0), false, drain(2.0)), 10.0);
        stack.apply(&gate("long", Some(3.0), false, drain(3.0)), 10.0);
        stack.apply(&gate("forever", Some(0.0), false, drain(5.0)), 10.0);

        let expired = stack.tick(1.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].gate_id, "short");
        assert_eq!(stack.multiplier_for(EffectKey::Drain), 15.0);

        stack.tick(100.0);
        assert_eq!(stack.len(), 1);
        assert!(stack.effects()[0].permanent);
        assert_eq!(stack.multiplier_for(EffectKey::Drain), 5.0);
    }

    #[test]
    fn test_unrelated_keys_stay_neutral() {
        let mut stack = EffectStack::new();
        stack.apply(&gate("a", Some(5.0), false, drain(0.5)), 10.0);
        assert_eq!(stack.multiplier_for(EffectKey::Speed), 1.0);
        assert_eq!(stack.multiplier_for(EffectKey::Drain), 0.5);
    }

    proptest! {
        #[test]
        fn multiplier_is_product_in_any_order(
            values in proptest::collection::vec(prop::option::of(0.25f32..4.0), 0..8)
        ) {
            let mut forward = EffectStack::new();
            let mut reverse = EffectStack::new();
            for (i, v) in values.iter().enumerate() {
                let bundle = EffectBundle { speed: *v, ..Default::default() };
                forward.apply(&gate(&format!("g{i}"), Some(5.0), false, bundle), 10.0);
            }
            for (i, v) in values.iter().enumerate().rev() {
                let bundle = EffectBundle { speed: *v, ..Default::default() };
                reverse.apply(&gate(&format!("g{i}"), Some(5.0), false, bundle), 10.0);
            }

            let expected: f32 = values.iter().map(|v| v.unwrap_or(1.0)).product();
            let got = forward.multiplier_for(EffectKey::Speed);
            prop_assert!((got - expected).abs() <= expected.abs() * 1e-4);
            prop_assert!((got - reverse.multiplier_for(EffectKey::Speed)).abs() <= expected.abs() * 1e-4);
        }
    }
}
