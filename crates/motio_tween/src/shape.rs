//! Shape transforms over a base curve
//!
//! A shape derives the per-frame curve value from a base curve through
//! one of six symmetry/inversion transforms. Curve values are only ever
//! produced through `Shape::evaluate`.

use std::sync::Arc;

use crate::curve::Curve;

/// How the base curve is reshaped before driving deltas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShapeVariant {
    /// `C(p)`
    #[default]
    Normal,
    /// `1 - C(1 - p)`
    Invert,
    /// `C(2 * min(p, 1 - p))` - out and back along the curve
    Mirror,
    /// `1 - C(1 - 2 * min(p, 1 - p))`
    InvertAndMirror,
    /// `1 - |2 * C(p) - 1|` - folds the curve around its midline
    Bounce,
    /// `1 - |2 * C(1 - p) - 1|`
    InvertAndBounce,
}

/// A base curve paired with a shape variant
#[derive(Clone)]
pub struct Shape {
    curve: Arc<dyn Curve>,
    variant: ShapeVariant,
}

impl Shape {
    pub fn new(curve: Arc<dyn Curve>, variant: ShapeVariant) -> Self {
        Self { curve, variant }
    }

    pub fn variant(&self) -> ShapeVariant {
        self.variant
    }

    pub fn evaluate(&self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self.variant {
            ShapeVariant::Normal => self.curve.evaluate(p),
            ShapeVariant::Invert => 1.0 - self.curve.evaluate(1.0 - p),
            ShapeVariant::Mirror => self.curve.evaluate(2.0 * p.min(1.0 - p)),
            ShapeVariant::InvertAndMirror => {
                1.0 - self.curve.evaluate(1.0 - 2.0 * p.min(1.0 - p))
            }
            ShapeVariant::Bounce => 1.0 - (2.0 * self.curve.evaluate(p) - 1.0).abs(),
            ShapeVariant::InvertAndBounce => {
                1.0 - (2.0 * self.curve.evaluate(1.0 - p) - 1.0).abs()
            }
        }
    }
}
