// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session for one motion.
//!
//! A session owns the motion while it is open and hands it back on close, so
//! playback of that motion is necessarily paused while it is being edited.
//! Selections refer to keys and events by id and stay valid across inserts
//! and deletes.

use crate::config::MotionConfig;
use crate::error::{MotionError, Result};
use crate::event::EventId;
use crate::keyframe::{Channel, ChannelMask, KeyframeId, Pose};
use crate::motion::Motion;
use crate::path::{check_time, Path};
use std::collections::HashSet;

/// Selected keys and events
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Selected keyframes (either channel, any path)
    pub keyframes: HashSet<KeyframeId>,
    /// Selected events
    pub events: HashSet<EventId>,
}

impl Selection {
    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty() && self.events.is_empty()
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.events.clear();
    }
}

/// An open editing session
#[derive(Debug)]
pub struct EditorSession {
    motion: Motion,
    selection: Selection,
    playhead: f32,
    insert_epsilon: f32,
    max_insert_retries: usize,
}

impl EditorSession {
    /// Open a session on a motion
    pub fn open(motion: Motion, config: &MotionConfig) -> Self {
        tracing::debug!("Editing motion '{}'", motion.name);
        Self {
            motion,
            selection: Selection::default(),
            playhead: 0.0,
            insert_epsilon: config.insert_epsilon,
            max_insert_retries: config.max_insert_retries,
        }
    }

    /// Close the session and take the motion back
    pub fn close(self) -> Motion {
        self.motion
    }

    /// Motion being edited
    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn path(&self, index: usize) -> Result<&Path> {
        self.motion.path(index).ok_or(MotionError::MissingPath(index))
    }

    fn path_mut(&mut self, index: usize) -> Result<&mut Path> {
        self.motion.path_mut(index).ok_or(MotionError::MissingPath(index))
    }

    /// First time at or after `time`, stepping by the configured epsilon, where `is_free` holds
    fn find_free_time(&self, time: f32, is_free: impl Fn(f32) -> bool) -> Result<f32> {
        check_time(time)?;
        let mut candidate = time;
        for step in 0..=self.max_insert_retries {
            if step > 0 {
                let next = time + self.insert_epsilon * step as f32;
                // Far from zero the epsilon is below f32 resolution; move at least one ulp
                candidate = if next > candidate {
                    next
                } else {
                    f32::from_bits(candidate.to_bits() + 1)
                };
            }
            if is_free(candidate) {
                return Ok(candidate);
            }
        }
        tracing::warn!(
            "No free time near t={} after {} retries (epsilon {})",
            time,
            self.max_insert_retries,
            self.insert_epsilon
        );
        Err(MotionError::ResourceExhausted {
            start: time,
            retries: self.max_insert_retries,
        })
    }

    /// Nearest time at or after `time` with no key in any channel of `mask`
    pub fn safe_key_insert_time(&self, path_index: usize, mask: ChannelMask, time: f32) -> Result<f32> {
        let path = self.path(path_index)?;
        self.find_free_time(time, |t| {
            mask.channels()
                .iter()
                .all(|&channel| path.keyframe_index(channel, t).is_none())
        })
    }

    /// Nearest time at or after `time` with no event
    pub fn safe_event_insert_time(&self, time: f32) -> Result<f32> {
        let events = self.motion.events();
        self.find_free_time(time, |t| !events.has_event_at(t))
    }

    /// Insert a key near `time`, returning the time actually used
    pub fn insert_key(&mut self, path_index: usize, mask: ChannelMask, time: f32, pose: Pose) -> Result<f32> {
        let time = self.safe_key_insert_time(path_index, mask, time)?;
        self.path_mut(path_index)?.insert_keyframe(mask, time, pose)?;
        Ok(time)
    }

    /// Insert an event near `time`, returning its id and the time actually used
    pub fn insert_event(&mut self, time: f32, label: impl Into<String>) -> Result<(EventId, f32)> {
        let time = self.safe_event_insert_time(time)?;
        let id = self.motion.insert_event(time, label)?;
        Ok((id, time))
    }

    /// Move an event near `time`, returning the time actually used
    pub fn move_event(&mut self, id: EventId, time: f32) -> Result<f32> {
        let current = self
            .motion
            .events()
            .get(id)
            .ok_or(MotionError::EventIdNotFound(id))?
            .time;
        let time = if current == time {
            time
        } else {
            self.safe_event_insert_time(time)?
        };
        self.motion.events_mut().set_time(id, time)?;
        Ok(time)
    }

    /// Delete the event nearest to `time`
    pub fn delete_event_near(&mut self, time: f32) -> Result<()> {
        let event = self.motion.events_mut().delete_nearest(time)?;
        self.selection.events.remove(&event.id);
        Ok(())
    }

    /// Select a key by id
    pub fn select_key(&mut self, id: KeyframeId) {
        self.selection.keyframes.insert(id);
    }

    /// Select the keys of a path at exactly `time` in the given channels; returns how many were found
    pub fn select_keys_at(&mut self, path_index: usize, mask: ChannelMask, time: f32) -> Result<usize> {
        let path = self.path(path_index)?;
        let ids: Vec<KeyframeId> = mask
            .channels()
            .iter()
            .filter_map(|&channel| {
                let index = path.keyframe_index(channel, time)?;
                path.keyframe_id(channel, index)
            })
            .collect();
        let found = ids.len();
        self.selection.keyframes.extend(ids);
        Ok(found)
    }

    /// Select an event by id
    pub fn select_event(&mut self, id: EventId) {
        self.selection.events.insert(id);
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every selected key and event; ids that no longer exist are skipped.
    ///
    /// Returns the number of items deleted.
    pub fn delete_selected(&mut self) -> usize {
        let selection = std::mem::take(&mut self.selection);
        let mut deleted = 0;
        for id in selection.keyframes {
            let owner = (0..self.motion.path_count()).find(|&i| {
                self.motion
                    .path(i)
                    .is_some_and(|p| p.keyframe_index_of(id).is_some())
            });
            if let Some(path) = owner.and_then(|i| self.motion.path_mut(i)) {
                if path.delete_keyframe_by_id(id).is_ok() {
                    deleted += 1;
                }
            }
        }
        for id in selection.events {
            if self.motion.events_mut().delete(id).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }

    /// Keys selected in one channel of a path, as indices in time order
    pub fn selected_indices(&self, path_index: usize, channel: Channel) -> Result<Vec<usize>> {
        let path = self.path(path_index)?;
        Ok((0..path.keyframe_count(channel))
            .filter(|&i| {
                path.keyframe_id(channel, i)
                    .is_some_and(|id| self.selection.keyframes.contains(&id))
            })
            .collect())
    }

    /// Move the preview playhead
    pub fn set_playhead(&mut self, time: f32) {
        self.playhead = time;
    }

    /// Preview playhead time
    pub fn playhead(&self) -> f32 {
        self.playhead
    }

    /// Pose of the primary path at the playhead
    pub fn preview_pose(&self) -> Result<Pose> {
        self.motion.sample(self.playhead)
    }
}
