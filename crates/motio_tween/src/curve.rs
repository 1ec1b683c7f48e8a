//! Shaping curve trait and built-in easing functions
//!
//! A curve maps progress in `[0, 1]` to a value that drives property
//! deltas. The engine treats curves as opaque; hosts typically supply a
//! keyframed spline, but any evaluator works, including plain closures.

/// A shaping curve: `progress in [0, 1] -> value`
pub trait Curve {
    fn evaluate(&self, progress: f32) -> f32;
}

impl<F> Curve for F
where
    F: Fn(f32) -> f32,
{
    fn evaluate(&self, progress: f32) -> f32 {
        self(progress)
    }
}

/// Built-in easing functions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
}

impl Easing {
    /// Apply easing to a value
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
        }
    }
}

impl Curve for Easing {
    fn evaluate(&self, progress: f32) -> f32 {
        self.apply(progress)
    }
}
