// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motions: named paths plus one event track sharing a time extent.

use crate::error::{MotionError, Result};
use crate::event::{EventId, EventIter, EventTrack};
use crate::keyframe::Pose;
use crate::path::{check_finite, Path};
use crate::sampler::TimeExtent;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of the path that defines a motion's extent
pub const PRIMARY_PATH: usize = 0;

/// A named set of paths and events.
///
/// Paths are addressed by insertion index or by name. Path 0 is the primary
/// path; its extent is the extent of the whole motion and drives wraparound
/// for every other path and for the events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Motion {
    /// Motion name
    pub name: String,
    /// Paths in index order
    paths: IndexMap<String, Path>,
    /// Events owned by this motion
    events: EventTrack,
}

impl Motion {
    /// Create an empty motion
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paths: IndexMap::new(),
            events: EventTrack::new(),
        }
    }

    /// Add a path under `name`, returning its index.
    ///
    /// A path with the same name is replaced in place and keeps its index.
    pub fn add_path(&mut self, name: impl Into<String>, path: Path) -> usize {
        self.paths.insert_full(name.into(), path).0
    }

    /// Remove a path by index; later paths shift down
    pub fn remove_path(&mut self, index: usize) -> Result<(String, Path)> {
        self.paths
            .shift_remove_index(index)
            .ok_or(MotionError::MissingPath(index))
    }

    /// Get a path
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get_index(index).map(|(_, p)| p)
    }

    /// Get a mutable path
    pub fn path_mut(&mut self, index: usize) -> Option<&mut Path> {
        self.paths.get_index_mut(index).map(|(_, p)| p)
    }

    /// Get a path by name
    pub fn path_by_name(&self, name: &str) -> Option<&Path> {
        self.paths.get(name)
    }

    /// Index of a named path
    pub fn path_index(&self, name: &str) -> Option<usize> {
        self.paths.get_index_of(name)
    }

    /// Name of the path at `index`
    pub fn path_name(&self, index: usize) -> Option<&str> {
        self.paths.get_index(index).map(|(n, _)| n.as_str())
    }

    /// Number of paths
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// All paths in index order
    pub fn paths(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// The primary path
    pub fn primary_path(&self) -> Result<&Path> {
        self.path(PRIMARY_PATH).ok_or(MotionError::MissingPath(PRIMARY_PATH))
    }

    /// Whether the primary path has any key in either channel
    pub fn has_keys(&self) -> bool {
        self.path(PRIMARY_PATH).is_some_and(Path::has_keys)
    }

    /// Extent of the motion, taken from the primary path
    pub fn extent(&self) -> Result<TimeExtent> {
        self.primary_path()?.sample_extent()
    }

    /// Sample the primary path at `time` reduced into the motion extent
    pub fn sample(&self, time: f32) -> Result<Pose> {
        self.sample_path(PRIMARY_PATH, time)
    }

    /// Sample any path at `time` reduced into the motion extent
    pub fn sample_path(&self, index: usize, time: f32) -> Result<Pose> {
        check_finite(time)?;
        let time = self.extent()?.wrap(time);
        self.path(index)
            .ok_or(MotionError::MissingPath(index))?
            .sample(time)
    }

    /// Events of this motion
    pub fn events(&self) -> &EventTrack {
        &self.events
    }

    /// Mutable events of this motion
    pub fn events_mut(&mut self) -> &mut EventTrack {
        &mut self.events
    }

    /// Add an event
    pub fn insert_event(&mut self, time: f32, label: impl Into<String>) -> Result<EventId> {
        self.events.insert(time, label)
    }

    /// Delete the event nearest to `time`
    pub fn delete_event(&mut self, time: f32) -> Result<()> {
        self.events.delete_nearest(time).map(|_| ())
    }

    /// Iterate events in `[start, end)`; calling again restarts the iteration
    pub fn setup_event_iterator(&self, start: f32, end: f32) -> EventIter<'_> {
        self.events.range(start, end)
    }

    /// Check all path and event invariants, used after loading
    pub fn validate(&self) -> Result<()> {
        for path in self.paths.values() {
            path.validate()?;
        }
        self.events.validate()
    }
}
