// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type shared by every motion operation.

use crate::keyframe::{Channel, KeyframeId};
use crate::event::EventId;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors produced by paths, motions and the playback drivers
#[derive(Debug, Error)]
pub enum MotionError {
    /// Storage for a keyframe, event or path could not be reserved
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// A keyframe already exists at this time in the channel
    #[error("Keyframe already exists at t={time} in the {channel:?} channel")]
    KeyframeCollision {
        /// Requested time
        time: f32,
        /// Channel that already holds a keyframe there
        channel: Channel,
    },

    /// The path has no usable time extent (fewer than two distinct key times)
    #[error("Path has a degenerate time extent")]
    DegenerateExtent,

    /// The motion has no path at this index
    #[error("Motion has no path at index {0}")]
    MissingPath(usize),

    /// Keyframe index or id does not exist
    #[error("Keyframe not found: {0}")]
    KeyframeNotFound(String),

    /// Event id does not exist, or the track is empty
    #[error("Event not found")]
    EventNotFound,

    /// Event id lookup failed
    #[error("Event not found: {0:?}")]
    EventIdNotFound(EventId),

    /// Time value is NaN, infinite or negative
    #[error("Invalid time value: {0}")]
    InvalidTime(f32),

    /// Keyframe or event data is not in ascending order
    #[error("Data is not sorted by time: {0}")]
    Unsorted(String),

    /// A chain traversal ran past the iteration ceiling
    #[error("Infinite loop detected after {limit} iterations starting at '{start}'")]
    InfiniteLoop {
        /// Name of the first point of the chain
        start: String,
        /// Iteration ceiling that was hit
        limit: usize,
    },

    /// A path point names a successor that does not exist
    #[error("Path point not found: {0}")]
    PathPointNotFound(String),

    /// Bounded search for a free timestamp gave up
    #[error("No free time found after {retries} retries starting at t={start}")]
    ResourceExhausted {
        /// Time the search started from
        start: f32,
        /// Retry budget that was used up
        retries: usize,
    },

    /// Camera cut index is outside the configured cut count
    #[error("Cut index {0} out of range")]
    NoSuchCut(usize),

    /// Camera cut has no motion assigned
    #[error("Cut {0} is empty")]
    EmptyCut(usize),

    /// Blend slot index is outside the configured slot count, or the slot is empty
    #[error("Blend slot {0} is not available")]
    NoSuchSlot(usize),

    /// Playback rate must be finite and non-negative
    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f32),

    /// Blend weight must lie in 0..=1
    #[error("Invalid blend weight: {0}")]
    InvalidBlendWeight(f32),

    /// Motion file does not start with the expected magic bytes
    #[error("Not a motion file (bad magic {0:?})")]
    BadMagic([u8; 4]),

    /// Motion file version is newer than this reader
    #[error("Unsupported motion file version {0}")]
    UnsupportedVersion(u32),

    /// Motion file holds no motions
    #[error("Motion file is empty")]
    EmptyMotionFile,

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Text (RON) parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Text (RON) serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MotionError {
    pub(crate) fn keyframe_index(channel: Channel, index: usize) -> Self {
        Self::KeyframeNotFound(format!("{channel:?}[{index}]"))
    }

    pub(crate) fn keyframe_id(id: KeyframeId) -> Self {
        Self::KeyframeNotFound(format!("{:?}", id.0))
    }
}

/// Result type for motion operations
pub type Result<T> = std::result::Result<T, MotionError>;
