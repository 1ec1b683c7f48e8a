//! Tween scheduler
//!
//! Owns the set of live tweens, advances each of them exactly once per
//! host tick, and mediates conflict layers: an opaque key that lets
//! independently spawned tweens interact when they target logically
//! related state. Conflict policies are evaluated once, at spawn, never
//! at tick time.
//!
//! Callbacks fired during a tick must not mutate the live set directly;
//! they go through a `TweenerHandle`, whose structural operations land
//! in a command buffer drained between ticks. No tween is ever skipped
//! or advanced twice because of a mid-tick mutation.

use std::sync::{Arc, Mutex, Weak};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::clock::TickDelta;
use crate::defaults::TweenDefaults;
use crate::error::SpawnError;
use crate::tween::{Tween, TweenBuilder, TweenState};

new_key_type! {
    /// Handle to a live tween
    pub struct TweenId;
}

/// How a newly spawned tween treats live tweens on the same layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Coexist; every occupant keeps applying its deltas independently
    #[default]
    Blend,
    /// Hard-stop every occupant (no callbacks), then take the layer
    Override,
    /// Fail the spawn if the layer is occupied
    Reject,
}

struct TweenerInner {
    live: SlotMap<TweenId, Tween>,
    /// Conflict-layer key to current occupants
    layers: FxHashMap<u64, Vec<TweenId>>,
    defaults: TweenDefaults,
}

/// Structural mutations staged by callbacks during a tick
enum Command {
    Spawn(TweenBuilder),
    Stop(TweenId),
    Finish(TweenId),
    StopLayer(u64),
}

/// The scheduler that owns and advances all live tweens
pub struct Tweener {
    inner: Arc<Mutex<TweenerInner>>,
    commands: Arc<Mutex<Vec<Command>>>,
}

impl Tweener {
    pub fn new(defaults: TweenDefaults) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TweenerInner {
                live: SlotMap::with_key(),
                layers: FxHashMap::default(),
                defaults,
            })),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A weak handle for spawning/stopping tweens from inside callbacks
    pub fn handle(&self) -> TweenerHandle {
        TweenerHandle {
            commands: Arc::downgrade(&self.commands),
        }
    }

    /// Finalize a builder against the defaults and register it as live
    ///
    /// Conflict resolution happens here: `Override` stops current layer
    /// occupants, `Reject` fails if the layer is occupied, `Blend`
    /// coexists. Tweens without a layer never participate.
    pub fn spawn(&self, builder: TweenBuilder) -> Result<TweenId, SpawnError> {
        let mut inner = self.inner.lock().unwrap();
        Self::spawn_locked(&mut inner, builder)
    }

    fn spawn_locked(
        inner: &mut TweenerInner,
        builder: TweenBuilder,
    ) -> Result<TweenId, SpawnError> {
        let tween = builder.build(&inner.defaults);

        if let Some(key) = tween.layer() {
            let occupied = inner.layers.get(&key).is_some_and(|ids| !ids.is_empty());
            match tween.conflict_policy() {
                ConflictPolicy::Blend => {}
                ConflictPolicy::Override => {
                    if occupied {
                        let occupants = inner.layers.remove(&key).unwrap_or_default();
                        tracing::debug!(
                            layer = key,
                            count = occupants.len(),
                            "override policy stopped layer occupants"
                        );
                        for id in occupants {
                            inner.live.remove(id);
                        }
                    }
                }
                ConflictPolicy::Reject => {
                    if occupied {
                        return Err(SpawnError::LayerOccupied(key));
                    }
                }
            }
        }

        let layer = tween.layer();
        let id = inner.live.insert(tween);
        if let Some(key) = layer {
            inner.layers.entry(key).or_default().push(id);
        }
        tracing::debug!(?id, ?layer, "registered tween");
        Ok(id)
    }

    /// Advance every live tween exactly once, remove completed ones,
    /// then drain the deferred command buffer
    ///
    /// Returns true while any tween remains live.
    pub fn tick(&self, delta: TickDelta) -> bool {
        {
            let mut inner = self.inner.lock().unwrap();
            let ids: Vec<TweenId> = inner.live.keys().collect();
            let mut completed = Vec::new();
            for id in ids {
                if let Some(tween) = inner.live.get_mut(id) {
                    if tween.advance(delta) == TweenState::Finished {
                        completed.push(id);
                    }
                }
            }
            for id in completed {
                Self::remove_locked(&mut inner, id);
            }
        }
        self.drain_commands();
        !self.inner.lock().unwrap().live.is_empty()
    }

    /// Hard cancellation: remove without applying pending deltas or
    /// firing any callback
    pub fn stop(&self, id: TweenId) {
        self.stop_now(id);
        self.drain_commands();
    }

    /// Force completion: apply the full remaining delta, fire crossed
    /// threshold events and `on_finish`, then remove
    pub fn finish(&self, id: TweenId) {
        self.finish_now(id);
        self.drain_commands();
    }

    /// Hard-stop every live tween whose conflict layer equals `key`
    ///
    /// Tweens without a layer are invisible to this. No callbacks fire.
    pub fn stop_layer(&self, key: u64) {
        {
            let mut inner = self.inner.lock().unwrap();
            let occupants = inner.layers.remove(&key).unwrap_or_default();
            tracing::debug!(layer = key, count = occupants.len(), "stopped layer");
            for id in occupants {
                inner.live.remove(id);
            }
        }
        self.drain_commands();
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().unwrap().live.len()
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.inner.lock().unwrap().live.contains_key(id)
    }

    /// Number of live tweens occupying a conflict layer
    pub fn layer_count(&self, key: u64) -> usize {
        self.inner
            .lock()
            .unwrap()
            .layers
            .get(&key)
            .map_or(0, |ids| ids.len())
    }

    /// Inspect a live tween (progress queries in hosts and tests)
    pub fn with_tween<F, R>(&self, id: TweenId, f: F) -> Option<R>
    where
        F: FnOnce(&Tween) -> R,
    {
        self.inner.lock().unwrap().live.get(id).map(f)
    }

    fn stop_now(&self, id: TweenId) {
        let mut inner = self.inner.lock().unwrap();
        Self::remove_locked(&mut inner, id);
    }

    fn finish_now(&self, id: TweenId) {
        let tween = {
            let mut inner = self.inner.lock().unwrap();
            Self::remove_locked(&mut inner, id)
        };
        // Lock released first: finish callbacks may enqueue commands
        if let Some(mut tween) = tween {
            tween.finish();
        }
    }

    fn remove_locked(inner: &mut TweenerInner, id: TweenId) -> Option<Tween> {
        let tween = inner.live.remove(id)?;
        if let Some(key) = tween.layer() {
            if let Some(occupants) = inner.layers.get_mut(&key) {
                occupants.retain(|&occupant| occupant != id);
                if occupants.is_empty() {
                    inner.layers.remove(&key);
                }
            }
        }
        Some(tween)
    }

    /// Apply staged structural mutations until the buffer is empty
    ///
    /// Commands enqueued while applying a batch (e.g. by `on_finish` of
    /// a force-finished tween) are picked up by the next pass.
    fn drain_commands(&self) {
        loop {
            let batch: Vec<Command> = {
                let mut commands = self.commands.lock().unwrap();
                if commands.is_empty() {
                    return;
                }
                commands.drain(..).collect()
            };
            for command in batch {
                match command {
                    Command::Spawn(builder) => {
                        let mut inner = self.inner.lock().unwrap();
                        if let Err(err) = Self::spawn_locked(&mut inner, builder) {
                            tracing::debug!(%err, "deferred spawn rejected");
                        }
                    }
                    Command::Stop(id) => self.stop_now(id),
                    Command::Finish(id) => self.finish_now(id),
                    Command::StopLayer(key) => {
                        let mut inner = self.inner.lock().unwrap();
                        let occupants = inner.layers.remove(&key).unwrap_or_default();
                        for id in occupants {
                            inner.live.remove(id);
                        }
                    }
                }
            }
        }
    }
}

impl Default for Tweener {
    fn default() -> Self {
        Self::new(TweenDefaults::default())
    }
}

/// A weak handle safe to use from callbacks fired during a tick
///
/// All operations are deferred: they stage commands the scheduler
/// drains between ticks. Spawns requested through a handle therefore
/// resolve their conflict policy when drained, and are first advanced
/// on the following tick.
#[derive(Clone)]
pub struct TweenerHandle {
    commands: Weak<Mutex<Vec<Command>>>,
}

impl TweenerHandle {
    /// Stage a tween for registration
    pub fn spawn(&self, builder: TweenBuilder) {
        self.push(Command::Spawn(builder));
    }

    /// Stage a hard cancellation
    pub fn stop(&self, id: TweenId) {
        self.push(Command::Stop(id));
    }

    /// Stage a forced completion
    pub fn finish(&self, id: TweenId) {
        self.push(Command::Finish(id));
    }

    /// Stage a layer-wide hard stop
    pub fn stop_layer(&self, key: u64) {
        self.push(Command::StopLayer(key));
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.commands.strong_count() > 0
    }

    fn push(&self, command: Command) {
        if let Some(commands) = self.commands.upgrade() {
            commands.lock().unwrap().push(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ThresholdEvent, TrackedChannel};
    use crate::value::{ApplyMode, DeltaApplier};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn additive_scalar(total: f32) -> (Rc<RefCell<f32>>, DeltaApplier) {
        let property = Rc::new(RefCell::new(0.0f32));
        let target = Rc::clone(&property);
        let applier =
            DeltaApplier::scalar(total, ApplyMode::Additive, move |d| *target.borrow_mut() += d)
                .unwrap();
        (property, applier)
    }

    #[test]
    fn test_tick_advances_and_removes_completed() {
        let tweener = Tweener::default();
        let (property, applier) = additive_scalar(10.0);
        let id = tweener
            .spawn(TweenBuilder::new().duration(1.0).applier(applier))
            .unwrap();

        assert!(tweener.tick(TickDelta::uniform(0.25)));
        assert!((*property.borrow() - 2.5).abs() < 1e-4);
        assert!(tweener.contains(id));

        for _ in 0..3 {
            tweener.tick(TickDelta::uniform(0.25));
        }
        assert!((*property.borrow() - 10.0).abs() < 1e-4);
        assert!(!tweener.contains(id));
        assert_eq!(tweener.live_count(), 0);
    }

    #[test]
    fn test_tick_returns_false_when_idle() {
        let tweener = Tweener::default();
        assert!(!tweener.tick(TickDelta::uniform(0.016)));
    }

    #[test]
    fn test_stop_fires_no_callbacks() {
        let tweener = Tweener::default();
        let fired = Rc::new(RefCell::new(0u32));
        let finish_counter = Rc::clone(&fired);
        let threshold_counter = Rc::clone(&fired);

        let id = tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .on_finish(move || *finish_counter.borrow_mut() += 1)
                    .threshold(ThresholdEvent::new(
                        TrackedChannel::Progress,
                        0.9,
                        move |_| *threshold_counter.borrow_mut() += 1,
                    )),
            )
            .unwrap();

        tweener.tick(TickDelta::uniform(0.25));
        tweener.stop(id);
        assert!(!tweener.contains(id));
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_finish_applies_remaining_delta() {
        let tweener = Tweener::default();
        let (property, applier) = additive_scalar(10.0);
        let finished = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&finished);

        let id = tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .applier(applier)
                    .on_finish(move || *counter.borrow_mut() += 1),
            )
            .unwrap();

        tweener.tick(TickDelta::uniform(0.25));
        tweener.finish(id);
        assert!((*property.borrow() - 10.0).abs() < 1e-4);
        assert_eq!(*finished.borrow(), 1);
        assert!(!tweener.contains(id));
    }

    #[test]
    fn test_blend_layer_coexists() {
        let tweener = Tweener::default();
        let (a, applier_a) = additive_scalar(10.0);
        let (b, applier_b) = additive_scalar(4.0);

        tweener
            .spawn(TweenBuilder::new().duration(1.0).layer(7).applier(applier_a))
            .unwrap();
        tweener
            .spawn(TweenBuilder::new().duration(1.0).layer(7).applier(applier_b))
            .unwrap();

        assert_eq!(tweener.layer_count(7), 2);
        tweener.tick(TickDelta::uniform(0.5));
        assert!((*a.borrow() - 5.0).abs() < 1e-4);
        assert!((*b.borrow() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_stop_layer_removes_all_without_callbacks() {
        let tweener = Tweener::default();
        let fired = Rc::new(RefCell::new(0u32));
        let first = Rc::clone(&fired);
        let second = Rc::clone(&fired);

        tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .layer(3)
                    .on_finish(move || *first.borrow_mut() += 1),
            )
            .unwrap();
        tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .layer(3)
                    .on_finish(move || *second.borrow_mut() += 1),
            )
            .unwrap();
        // A layerless tween is invisible to stop_layer
        let unrelated = tweener.spawn(TweenBuilder::new().duration(1.0)).unwrap();

        tweener.stop_layer(3);
        assert_eq!(tweener.layer_count(3), 0);
        assert_eq!(tweener.live_count(), 1);
        assert!(tweener.contains(unrelated));
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_override_policy_stops_occupants() {
        let tweener = Tweener::default();
        let fired = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&fired);

        let first = tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .layer(5)
                    .on_finish(move || *counter.borrow_mut() += 1),
            )
            .unwrap();
        let second = tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .layer(5)
                    .conflict_policy(ConflictPolicy::Override),
            )
            .unwrap();

        assert!(!tweener.contains(first));
        assert!(tweener.contains(second));
        assert_eq!(tweener.layer_count(5), 1);
        // Overridden occupant was hard-stopped, not finished
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_reject_policy_fails_spawn() {
        let tweener = Tweener::default();
        tweener
            .spawn(TweenBuilder::new().duration(1.0).layer(9))
            .unwrap();

        let result = tweener.spawn(
            TweenBuilder::new()
                .duration(1.0)
                .layer(9)
                .conflict_policy(ConflictPolicy::Reject),
        );
        assert!(matches!(result, Err(SpawnError::LayerOccupied(9))));
        assert_eq!(tweener.live_count(), 1);
    }

    #[test]
    fn test_reject_on_free_layer_succeeds() {
        let tweener = Tweener::default();
        let id = tweener
            .spawn(
                TweenBuilder::new()
                    .duration(1.0)
                    .layer(9)
                    .conflict_policy(ConflictPolicy::Reject),
            )
            .unwrap();
        assert!(tweener.contains(id));
    }

    #[test]
    fn test_callback_spawn_is_deferred_to_next_tick() {
        let tweener = Tweener::default();
        let handle = tweener.handle();
        let property = Rc::new(RefCell::new(0.0f32));
        let target = Rc::clone(&property);

        tweener
            .spawn(TweenBuilder::new().duration(0.25).on_finish(move || {
                let target = Rc::clone(&target);
                handle.spawn(
                    TweenBuilder::new().duration(1.0).applier(
                        DeltaApplier::scalar(10.0, ApplyMode::Additive, move |d| {
                            *target.borrow_mut() += d
                        })
                        .unwrap(),
                    ),
                );
            }))
            .unwrap();

        // First tick finishes the timer; the staged spawn drains after
        // the iteration, so the new tween has not advanced yet
        assert!(tweener.tick(TickDelta::uniform(0.25)));
        assert_eq!(tweener.live_count(), 1);
        assert_eq!(*property.borrow(), 0.0);

        tweener.tick(TickDelta::uniform(0.5));
        assert!((*property.borrow() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_callback_stop_layer_is_deferred_safely() {
        let tweener = Tweener::default();
        let handle = tweener.handle();

        tweener
            .spawn(
                TweenBuilder::new()
                    .duration(0.25)
                    .threshold(ThresholdEvent::new(TrackedChannel::Progress, 0.5, move |_| {
                        handle.stop_layer(11)
                    })),
            )
            .unwrap();
        tweener
            .spawn(TweenBuilder::new().duration(10.0).layer(11))
            .unwrap();

        // The threshold fires mid-tick; the layer stop lands after the
        // iteration without skipping or double-advancing anything
        tweener.tick(TickDelta::uniform(0.25));
        assert_eq!(tweener.layer_count(11), 0);
        assert_eq!(tweener.live_count(), 0);
    }

    #[test]
    fn test_handle_outlives_scheduler_safely() {
        let handle = {
            let tweener = Tweener::default();
            tweener.handle()
        };
        assert!(!handle.is_alive());
        // No-ops once the scheduler is gone
        handle.spawn(TweenBuilder::new().duration(1.0));
        handle.stop_layer(1);
    }

    #[test]
    fn test_each_tween_advances_exactly_once_per_tick() {
        let tweener = Tweener::default();
        let ticks_seen = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&ticks_seen);
        let applier = DeltaApplier::scalar(1.0, ApplyMode::Additive, move |_| {
            *counter.borrow_mut() += 1
        })
        .unwrap();

        tweener
            .spawn(TweenBuilder::new().duration(10.0).applier(applier))
            .unwrap();

        for _ in 0..5 {
            tweener.tick(TickDelta::uniform(0.1));
        }
        assert_eq!(*ticks_seen.borrow(), 5);
    }
}
