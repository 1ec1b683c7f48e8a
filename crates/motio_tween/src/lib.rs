//! Motio Tween Engine
//!
//! Per-frame property animation driven by an external host clock.
//!
//! # Features
//!
//! - **Shaping curves**: any `progress -> value` evaluator, with six
//!   symmetry/inversion transforms (mirror, invert, bounce)
//! - **Typed delta application**: additive and multiplicative deltas over
//!   scalars, vectors, colors, and quaternion rotations
//! - **Threshold events**: callbacks fired once per crossing of a tracked
//!   scalar (elapsed time, progress, or curve value)
//! - **Looping**: full state restarts that preserve configuration
//! - **Conflict layers**: blend, override, or reject policies between
//!   tweens that target logically related state
//! - **Deferred mutation**: callbacks fired mid-tick may spawn or stop
//!   tweens through a handle without corrupting the live set
//!
//! The engine never reads animated properties; it only emits deltas
//! through sinks the property owner registers.

pub mod clock;
pub mod curve;
pub mod defaults;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod shape;
pub mod tween;
pub mod value;

pub use clock::{ClockKind, TickDelta};
pub use curve::{Curve, Easing};
pub use defaults::TweenDefaults;
pub use error::{ConfigError, SpawnError};
pub use event::{ThresholdEvent, TrackedChannel};
pub use scheduler::{ConflictPolicy, TweenId, Tweener, TweenerHandle};
pub use shape::{Shape, ShapeVariant};
pub use tween::{Sample, Tween, TweenBuilder, TweenState};
pub use value::{ApplyMode, DeltaApplier, ValueKind};
