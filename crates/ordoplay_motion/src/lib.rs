// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframed motion playback for OrdoPlay.
//!
//! This crate samples keyframed paths and fires timed events:
//! - Paths with translation and rotation channels
//! - Event tracks with half-open interval dispatch
//! - Camera cut playback
//! - Per-object motion blending
//! - Path point chains and an editing session
//!
//! ## Architecture
//!
//! Playback is built on:
//! - A pure sampler that reduces time into a path's extent
//! - A dispatcher that splits wrapped intervals in two
//! - Drivers that plan a whole tick before firing events or moving state
//! - Sink and target traits for the host's event and transform handling

pub mod error;
pub mod keyframe;
pub mod sampler;
pub mod path;
pub mod event;
pub mod motion;
pub mod binding;
pub mod dispatch;
pub mod config;
pub mod camera;
pub mod blender;
pub mod path_point;
pub mod editor;
pub mod io;

pub use error::{MotionError, Result};
pub use keyframe::{
    Channel, ChannelMask, Interpolation, Keyframe, KeyframeId, Pose, RotationInterpolation,
    RotationKey, TranslationInterpolation, TranslationKey,
};
pub use sampler::TimeExtent;
pub use path::Path;
pub use event::{Event, EventId, EventIter, EventTrack};
pub use motion::{Motion, PRIMARY_PATH};
pub use binding::{EntityId, EventLog, EventOrigin, EventSink, FiredEvent, LastPose, PoseTarget};
pub use dispatch::{dispatch_span, dispatch_wrapped, process_events};
pub use config::{MotionConfig, MAX_BLEND_SLOTS};
pub use camera::{CameraCuts, CameraTick, CutState, CutTransition, FOV_PATH};
pub use blender::{BlendSettings, BlendSlot, BlendTick, MotionBlender};
pub use path_point::{ChainTiming, ChainWalk, PathPoint, PathPointChain};
pub use editor::{EditorSession, Selection};
