//! Typed delta application
//!
//! A `DeltaApplier` turns the per-frame curve-value delta into a typed
//! mutation of an external property. The numeric kind and application
//! mode are resolved into a single boxed closure when the applier is
//! constructed, so the per-frame path does no type inspection.
//!
//! Additive appliers emit `V * dc` each frame; the emissions sum to the
//! total `V` over one full curve traversal. Multiplicative appliers emit
//! `V^dc`; the emissions multiply out to `V` because exponents sum
//! linearly. Rotations emit `slerp(identity, V, dc)`, the quaternion
//! power `V^dc`, which composes the same way.

use motio_core::{Color, Quat, Vec2, Vec3, Vec4};

use crate::error::ConfigError;

/// The closed set of numeric kinds a tween can emit deltas for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Color,
    Rotation,
}

/// How per-frame deltas combine on the target property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyMode {
    /// Property accumulates `V * dc`; totals `V` over a full traversal
    Additive,
    /// Property multiplies by `V^dc`; totals the ratio `V` over a full
    /// traversal. Requires a strictly positive total.
    Multiplicative,
}

/// A per-frame property mutator bound to one numeric kind and mode
pub struct DeltaApplier {
    kind: ValueKind,
    mode: ApplyMode,
    emit: Box<dyn FnMut(f32)>,
}

impl DeltaApplier {
    /// Applier over a scalar property
    pub fn scalar(
        total: f32,
        mode: ApplyMode,
        mut sink: impl FnMut(f32) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(total * dc)),
            ApplyMode::Multiplicative => {
                if total <= 0.0 {
                    return Err(ConfigError::NonPositiveRatio {
                        kind: ValueKind::Scalar,
                    });
                }
                Box::new(move |dc| sink(total.powf(dc)))
            }
        };
        Ok(Self {
            kind: ValueKind::Scalar,
            mode,
            emit,
        })
    }

    /// Applier over a 2-component vector property
    pub fn vec2(
        total: Vec2,
        mode: ApplyMode,
        mut sink: impl FnMut(Vec2) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(total.scale(dc))),
            ApplyMode::Multiplicative => {
                if total.x <= 0.0 || total.y <= 0.0 {
                    return Err(ConfigError::NonPositiveRatio {
                        kind: ValueKind::Vec2,
                    });
                }
                Box::new(move |dc| sink(total.powf(dc)))
            }
        };
        Ok(Self {
            kind: ValueKind::Vec2,
            mode,
            emit,
        })
    }

    /// Applier over a 3-component vector property
    pub fn vec3(
        total: Vec3,
        mode: ApplyMode,
        mut sink: impl FnMut(Vec3) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(total.scale(dc))),
            ApplyMode::Multiplicative => {
                if total.x <= 0.0 || total.y <= 0.0 || total.z <= 0.0 {
                    return Err(ConfigError::NonPositiveRatio {
                        kind: ValueKind::Vec3,
                    });
                }
                Box::new(move |dc| sink(total.powf(dc)))
            }
        };
        Ok(Self {
            kind: ValueKind::Vec3,
            mode,
            emit,
        })
    }

    /// Applier over a 4-component vector property
    pub fn vec4(
        total: Vec4,
        mode: ApplyMode,
        mut sink: impl FnMut(Vec4) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(total.scale(dc))),
            ApplyMode::Multiplicative => {
                if total.x <= 0.0 || total.y <= 0.0 || total.z <= 0.0 || total.w <= 0.0 {
                    return Err(ConfigError::NonPositiveRatio {
                        kind: ValueKind::Vec4,
                    });
                }
                Box::new(move |dc| sink(total.powf(dc)))
            }
        };
        Ok(Self {
            kind: ValueKind::Vec4,
            mode,
            emit,
        })
    }

    /// Applier over an RGBA color property (alpha participates)
    pub fn color(
        total: Color,
        mode: ApplyMode,
        mut sink: impl FnMut(Color) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(total.scale(dc))),
            ApplyMode::Multiplicative => {
                if total.r <= 0.0 || total.g <= 0.0 || total.b <= 0.0 || total.a <= 0.0 {
                    return Err(ConfigError::NonPositiveRatio {
                        kind: ValueKind::Color,
                    });
                }
                Box::new(move |dc| sink(total.powf(dc)))
            }
        };
        Ok(Self {
            kind: ValueKind::Color,
            mode,
            emit,
        })
    }

    /// Applier over a rotation property
    ///
    /// Rotations interpolate spherically toward the total; each frame
    /// emits the fractional rotation `V^dc` for the owner to compose.
    /// Multiplicative mode is meaningless for rotations and rejected.
    pub fn rotation(
        total: Quat,
        mode: ApplyMode,
        mut sink: impl FnMut(Quat) + 'static,
    ) -> Result<Self, ConfigError> {
        let emit: Box<dyn FnMut(f32)> = match mode {
            ApplyMode::Additive => Box::new(move |dc| sink(Quat::IDENTITY.slerp(total, dc))),
            ApplyMode::Multiplicative => {
                return Err(ConfigError::UnsupportedMode {
                    kind: ValueKind::Rotation,
                    mode,
                });
            }
        };
        Ok(Self {
            kind: ValueKind::Rotation,
            mode,
            emit,
        })
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Feed one frame's curve-value delta through the applier
    pub(crate) fn apply(&mut self, dc: f32) {
        (self.emit)(dc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_additive_scalar_sums_to_total() {
        let property = Rc::new(RefCell::new(0.0f32));
        let target = Rc::clone(&property);
        let mut applier =
            DeltaApplier::scalar(10.0, ApplyMode::Additive, move |d| *target.borrow_mut() += d)
                .unwrap();

        for _ in 0..4 {
            applier.apply(0.25);
        }
        assert!((*property.borrow() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_multiplicative_scalar_multiplies_to_total() {
        let property = Rc::new(RefCell::new(2.0f32));
        let target = Rc::clone(&property);
        let mut applier = DeltaApplier::scalar(9.0, ApplyMode::Multiplicative, move |f| {
            *target.borrow_mut() *= f
        })
        .unwrap();

        for _ in 0..4 {
            applier.apply(0.25);
        }
        assert!((*property.borrow() - 18.0).abs() < 1e-3);
    }

    #[test]
    fn test_multiplicative_handles_negative_deltas() {
        // A curve that overshoots and comes back still nets out to V^1
        let property = Rc::new(RefCell::new(1.0f32));
        let target = Rc::clone(&property);
        let mut applier = DeltaApplier::scalar(4.0, ApplyMode::Multiplicative, move |f| {
            *target.borrow_mut() *= f
        })
        .unwrap();

        applier.apply(0.7);
        applier.apply(0.6);
        applier.apply(-0.3);
        assert!((*property.borrow() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_additive_vec3() {
        let property = Rc::new(RefCell::new(Vec3::ZERO));
        let target = Rc::clone(&property);
        let mut applier = DeltaApplier::vec3(
            Vec3::new(10.0, -20.0, 30.0),
            ApplyMode::Additive,
            move |d| {
                let mut p = target.borrow_mut();
                p.x += d.x;
                p.y += d.y;
                p.z += d.z;
            },
        )
        .unwrap();

        applier.apply(0.5);
        applier.apply(0.5);
        let p = *property.borrow();
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.y + 20.0).abs() < 1e-4);
        assert!((p.z - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_additive_composes_to_total() {
        let total = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        let property = Rc::new(RefCell::new(Quat::IDENTITY));
        let target = Rc::clone(&property);
        let mut applier = DeltaApplier::rotation(total, ApplyMode::Additive, move |d| {
            let mut p = target.borrow_mut();
            *p = d.mul(&p);
        })
        .unwrap();

        for _ in 0..4 {
            applier.apply(0.25);
        }
        assert!(property.borrow().approx_eq(&total, 1e-4));
    }

    #[test]
    fn test_rotation_multiplicative_is_config_error() {
        let result = DeltaApplier::rotation(Quat::IDENTITY, ApplyMode::Multiplicative, |_| {});
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedMode {
                kind: ValueKind::Rotation,
                mode: ApplyMode::Multiplicative,
            })
        ));
    }

    #[test]
    fn test_non_positive_ratio_is_config_error() {
        assert!(matches!(
            DeltaApplier::scalar(0.0, ApplyMode::Multiplicative, |_| {}),
            Err(ConfigError::NonPositiveRatio {
                kind: ValueKind::Scalar
            })
        ));
        assert!(matches!(
            DeltaApplier::vec2(Vec2::new(2.0, -1.0), ApplyMode::Multiplicative, |_| {}),
            Err(ConfigError::NonPositiveRatio {
                kind: ValueKind::Vec2
            })
        ));
    }
}
