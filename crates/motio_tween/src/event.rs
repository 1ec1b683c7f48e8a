//! Threshold-triggered events
//!
//! An event fires when a tracked scalar crosses a fixed threshold
//! between two consecutive frames. There is no "already fired" flag:
//! firing is derived entirely from the (previous, current) sample pair,
//! so a value oscillating across the threshold on alternating frames
//! refires, while a single overshooting crossing fires exactly once.

use crate::tween::Sample;

/// Which of a tween's tracked scalars an event watches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackedChannel {
    /// Elapsed time in seconds
    Elapsed,
    /// Progress, clamped to `[0, 1]`
    Progress,
    /// The shaped curve value
    CurveValue,
}

/// A callback bound to a threshold crossing of a tracked scalar
pub struct ThresholdEvent {
    channel: TrackedChannel,
    threshold: f32,
    action: Box<dyn FnMut(f32)>,
}

impl ThresholdEvent {
    /// The action receives the current sample value when the event fires
    pub fn new(
        channel: TrackedChannel,
        threshold: f32,
        action: impl FnMut(f32) + 'static,
    ) -> Self {
        Self {
            channel,
            threshold,
            action: Box::new(action),
        }
    }

    pub fn channel(&self) -> TrackedChannel {
        self.channel
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Fire if the pair crossed the threshold this frame
    ///
    /// Strict inequality on the side being left, inclusive on the side
    /// being entered: a sample sitting exactly on the threshold counts
    /// as having arrived, not as about to leave.
    pub(crate) fn evaluate(&mut self, pair: Sample) {
        let t = self.threshold;
        let crossed = (pair.previous < t && pair.current >= t)
            || (pair.previous > t && pair.current <= t);
        if crossed {
            (self.action)(pair.current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting_event(channel: TrackedChannel, threshold: f32) -> (ThresholdEvent, Rc<RefCell<u32>>) {
        let count = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&count);
        let event = ThresholdEvent::new(channel, threshold, move |_| *counter.borrow_mut() += 1);
        (event, count)
    }

    fn pair(previous: f32, current: f32) -> Sample {
        Sample { current, previous }
    }

    #[test]
    fn test_fires_once_per_upward_crossing() {
        let (mut event, count) = counting_event(TrackedChannel::Progress, 0.5);
        event.evaluate(pair(0.4, 0.6));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_overshoot_fires_once_not_twice() {
        let (mut event, count) = counting_event(TrackedChannel::Progress, 0.5);
        event.evaluate(pair(0.49, 0.52));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_fires_on_downward_crossing() {
        let (mut event, count) = counting_event(TrackedChannel::CurveValue, 0.5);
        event.evaluate(pair(0.7, 0.3));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_landing_exactly_on_threshold_fires() {
        let (mut event, count) = counting_event(TrackedChannel::Progress, 0.5);
        event.evaluate(pair(0.4, 0.5));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_leaving_threshold_does_not_fire() {
        let (mut event, count) = counting_event(TrackedChannel::Progress, 0.5);
        event.evaluate(pair(0.5, 0.6));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_oscillation_refires() {
        let (mut event, count) = counting_event(TrackedChannel::CurveValue, 0.5);
        event.evaluate(pair(0.4, 0.6));
        event.evaluate(pair(0.6, 0.4));
        event.evaluate(pair(0.4, 0.6));
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn test_no_fire_without_crossing() {
        let (mut event, count) = counting_event(TrackedChannel::Elapsed, 2.0);
        event.evaluate(pair(0.0, 1.0));
        event.evaluate(pair(1.0, 1.9));
        assert_eq!(*count.borrow(), 0);
    }
}
