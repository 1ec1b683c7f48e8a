//! Frame clock selection
//!
//! The host supplies two time deltas per tick: one affected by global
//! time manipulation (slow motion, pause) and one tracking wall-clock
//! time. Each tween selects between them.

/// The pair of per-frame time deltas supplied by the host (seconds)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickDelta {
    /// Delta affected by the host's global timescale
    pub scaled: f32,
    /// Wall-clock delta, immune to timescale changes
    pub real: f32,
}

impl TickDelta {
    pub const fn new(scaled: f32, real: f32) -> Self {
        Self { scaled, real }
    }

    /// Both deltas equal - the common case when no timescale is active
    pub const fn uniform(dt: f32) -> Self {
        Self {
            scaled: dt,
            real: dt,
        }
    }
}

/// Which of the host's two clocks drives a tween
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockKind {
    /// Affected by the host's global timescale (default)
    #[default]
    Scaled,
    /// Wall-clock time; keeps running through slow motion and pause
    Real,
}

impl ClockKind {
    pub fn delta(self, tick: TickDelta) -> f32 {
        match self {
            ClockKind::Scaled => tick.scaled,
            ClockKind::Real => tick.real,
        }
    }
}
