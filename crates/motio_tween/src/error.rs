//! Error types

use thiserror::Error;

use crate::value::{ApplyMode, ValueKind};

/// A delta applier was registered with an unusable configuration
///
/// Surfaced from the applier constructor, so a mis-configured tween can
/// never enter the scheduler's live set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{mode:?} application is not supported for {kind:?} values")]
    UnsupportedMode { kind: ValueKind, mode: ApplyMode },

    #[error("multiplicative totals must be strictly positive in every component ({kind:?})")]
    NonPositiveRatio { kind: ValueKind },
}

/// Spawning a tween failed during conflict resolution
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("conflict layer {0} is already occupied")]
    LayerOccupied(u64),
}
