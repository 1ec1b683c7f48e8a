//! The tween state machine
//!
//! A tween advances once per host tick: it accumulates elapsed time,
//! maps it to clamped progress, shapes progress into a curve value, and
//! feeds the curve-value delta to its appliers. Threshold events and
//! direction-change callbacks observe the same (previous, current)
//! sample pairs. Advancing is bit-for-bit reproducible given the same
//! tick sequence.
//!
//! Tweens are configured through `TweenBuilder` and cannot be
//! reconfigured once spawned: the builder is consumed, so the invalid
//! state is unrepresentable rather than a runtime error.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::clock::{ClockKind, TickDelta};
use crate::curve::Curve;
use crate::defaults::TweenDefaults;
use crate::event::{ThresholdEvent, TrackedChannel};
use crate::scheduler::ConflictPolicy;
use crate::shape::{Shape, ShapeVariant};
use crate::value::DeltaApplier;

type Callbacks<T> = SmallVec<[T; 2]>;

/// A (current, previous) pair of one tracked scalar
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub current: f32,
    pub previous: f32,
}

impl Sample {
    fn push(&mut self, value: f32) {
        self.previous = self.current;
        self.current = value;
    }

    fn reset(&mut self) {
        *self = Sample::default();
    }
}

/// Result of one `advance` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenState {
    Running,
    /// Completed with no repeats left; the scheduler removes it
    Finished,
}

/// One live animation
pub struct Tween {
    duration: f32,
    shape: Shape,
    clock: ClockKind,
    elapsed: Sample,
    progress: Sample,
    curve_value: Sample,
    direction: i8,
    appliers: Vec<DeltaApplier>,
    events: Vec<ThresholdEvent>,
    on_finish: Callbacks<Box<dyn FnMut()>>,
    on_direction_change: Callbacks<Box<dyn FnMut(i8)>>,
    repeats_left: u32,
    layer: Option<u64>,
    policy: ConflictPolicy,
    finished: bool,
}

impl Tween {
    /// Advance by one host tick
    ///
    /// Applies property deltas, evaluates threshold events, detects
    /// direction reversals, and handles loop restarts. Returns
    /// `Finished` once the final completion has fired `on_finish`;
    /// further calls are no-ops.
    pub fn advance(&mut self, tick: TickDelta) -> TweenState {
        if self.finished {
            return TweenState::Finished;
        }

        let dt = self.clock.delta(tick);
        self.elapsed.push(self.elapsed.current + dt);

        // Zero or negative duration degenerates to "already finished"
        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed.current / self.duration).clamp(0.0, 1.0)
        };
        self.progress.push(progress);
        self.curve_value.push(self.shape.evaluate(progress));

        self.apply_frame();

        if self.has_finished() {
            if self.repeats_left > 0 {
                self.repeats_left -= 1;
                self.reset_run_state();
                return TweenState::Running;
            }
            self.finished = true;
            self.fire_finish();
            return TweenState::Finished;
        }
        TweenState::Running
    }

    /// Jump straight to completion
    ///
    /// Forces progress to 1, applies the full remaining delta through
    /// every applier, evaluates threshold events crossed by the jump,
    /// and fires `on_finish`. Remaining loops are skipped. No-op on an
    /// already finished tween.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.elapsed.push(self.duration.max(self.elapsed.current));
        self.progress.push(1.0);
        self.curve_value.push(self.shape.evaluate(1.0));
        self.apply_frame();
        self.repeats_left = 0;
        self.finished = true;
        self.fire_finish();
    }

    /// True once cumulative elapsed time reaches the duration
    ///
    /// Monotonic within a run; a loop restart resets it.
    pub fn has_finished(&self) -> bool {
        self.elapsed.current >= self.duration
    }

    pub fn elapsed(&self) -> Sample {
        self.elapsed
    }

    pub fn progress(&self) -> Sample {
        self.progress
    }

    pub fn curve_value(&self) -> Sample {
        self.curve_value
    }

    /// Current curve-value direction: -1, 0, or +1
    pub fn direction(&self) -> i8 {
        self.direction
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn repeats_left(&self) -> u32 {
        self.repeats_left
    }

    pub fn layer(&self) -> Option<u64> {
        self.layer
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// One frame's side effects: deltas, events, direction detection
    fn apply_frame(&mut self) {
        let dc = self.curve_value.current - self.curve_value.previous;

        for applier in &mut self.appliers {
            applier.apply(dc);
        }

        for event in &mut self.events {
            let pair = match event.channel() {
                TrackedChannel::Elapsed => self.elapsed,
                TrackedChannel::Progress => self.progress,
                TrackedChannel::CurveValue => self.curve_value,
            };
            event.evaluate(pair);
        }

        let new_direction = if dc > 0.0 {
            1
        } else if dc < 0.0 {
            -1
        } else {
            0
        };
        if new_direction != 0 {
            if self.direction != 0 && new_direction != self.direction {
                for callback in &mut self.on_direction_change {
                    callback(new_direction);
                }
            }
            self.direction = new_direction;
        }
    }

    /// Loop restart: run state back to zero, configuration untouched
    fn reset_run_state(&mut self) {
        self.elapsed.reset();
        self.progress.reset();
        self.curve_value.reset();
        self.direction = 0;
    }

    fn fire_finish(&mut self) {
        for callback in &mut self.on_finish {
            callback();
        }
    }
}

/// Fluent, consuming configuration for a tween
///
/// Unset fields resolve from `TweenDefaults` when the tween is built.
/// Conditional configuration is an explicit branch via `apply_if`.
#[derive(Default)]
pub struct TweenBuilder {
    duration: Option<f32>,
    curve: Option<Arc<dyn Curve>>,
    shape: Option<ShapeVariant>,
    clock: Option<ClockKind>,
    layer: Option<u64>,
    policy: Option<ConflictPolicy>,
    appliers: Vec<DeltaApplier>,
    events: Vec<ThresholdEvent>,
    on_finish: Callbacks<Box<dyn FnMut()>>,
    on_direction_change: Callbacks<Box<dyn FnMut(i8)>>,
    repeats: u32,
}

impl TweenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration in seconds
    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Base shaping curve
    pub fn curve(mut self, curve: impl Curve + 'static) -> Self {
        self.curve = Some(Arc::new(curve));
        self
    }

    /// Shared base shaping curve
    pub fn curve_arc(mut self, curve: Arc<dyn Curve>) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Shape transform over the base curve
    pub fn shape(mut self, variant: ShapeVariant) -> Self {
        self.shape = Some(variant);
        self
    }

    /// Which host clock drives this tween
    pub fn clock(mut self, clock: ClockKind) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Conflict-layer key; tweens without one never interact
    pub fn layer(mut self, key: u64) -> Self {
        self.layer = Some(key);
        self
    }

    /// Policy applied against the layer's occupants at spawn
    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Register a delta applier; order of registration is preserved
    pub fn applier(mut self, applier: DeltaApplier) -> Self {
        self.appliers.push(applier);
        self
    }

    /// Register a threshold event
    pub fn threshold(mut self, event: ThresholdEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Listener invoked on the final completion (natural or forced)
    pub fn on_finish(mut self, action: impl FnMut() + 'static) -> Self {
        self.on_finish.push(Box::new(action));
        self
    }

    /// Listener invoked with the new direction on curve-value reversal
    pub fn on_direction_change(mut self, action: impl FnMut(i8) + 'static) -> Self {
        self.on_direction_change.push(Box::new(action));
        self
    }

    /// Number of repeats after the initial run
    ///
    /// `loops(2)` produces three completions in total before removal.
    pub fn loops(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    /// Apply a configuration branch only when `condition` holds
    pub fn apply_if(self, condition: bool, configure: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            configure(self)
        } else {
            self
        }
    }

    /// Resolve unset fields against the defaults and freeze the tween
    pub fn build(self, defaults: &TweenDefaults) -> Tween {
        let curve = self.curve.unwrap_or_else(|| Arc::clone(&defaults.curve));
        Tween {
            duration: self.duration.unwrap_or(defaults.duration),
            shape: Shape::new(curve, self.shape.unwrap_or(defaults.shape)),
            clock: self.clock.unwrap_or(defaults.clock),
            elapsed: Sample::default(),
            progress: Sample::default(),
            curve_value: Sample::default(),
            direction: 0,
            appliers: self.appliers,
            events: self.events,
            on_finish: self.on_finish,
            on_direction_change: self.on_direction_change,
            repeats_left: self.repeats,
            layer: self.layer,
            policy: self.policy.unwrap_or(defaults.conflict_policy),
            finished: false,
        }
    }
}
