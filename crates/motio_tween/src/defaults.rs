//! Process-wide defaults
//!
//! Every optional tween field resolves against this struct when the
//! tween is spawned, and stays frozen for the rest of its life. The
//! defaults are passed explicitly to the scheduler at construction;
//! there is no hidden global state.

use std::sync::Arc;

use crate::clock::ClockKind;
use crate::curve::{Curve, Easing};
use crate::scheduler::ConflictPolicy;
use crate::shape::ShapeVariant;

#[derive(Clone)]
pub struct TweenDefaults {
    /// Duration in seconds for tweens that don't set one
    pub duration: f32,
    /// Base shaping curve
    pub curve: Arc<dyn Curve>,
    /// Shape transform applied over the base curve
    pub shape: ShapeVariant,
    /// Which host clock drives the tween
    pub clock: ClockKind,
    /// Conflict-layer policy
    pub conflict_policy: ConflictPolicy,
}

impl Default for TweenDefaults {
    fn default() -> Self {
        Self {
            duration: 1.0,
            curve: Arc::new(Easing::Linear),
            shape: ShapeVariant::Normal,
            clock: ClockKind::Scaled,
            conflict_policy: ConflictPolicy::Blend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_is_identity() {
        let defaults = TweenDefaults::default();
        assert!((defaults.curve.evaluate(0.37) - 0.37).abs() < 1e-6);
        assert_eq!(defaults.shape, ShapeVariant::Normal);
        assert_eq!(defaults.clock, ClockKind::Scaled);
        assert_eq!(defaults.conflict_policy, ConflictPolicy::Blend);
    }
}
