// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe paths with independent translation and rotation channels.

use crate::error::{MotionError, Result};
use crate::keyframe::{
    Channel, ChannelMask, Keyframe, KeyframeId, Pose, RotationInterpolation, RotationKey,
    TranslationInterpolation, TranslationKey,
};
use crate::sampler::{self, TimeExtent};
use serde::{Deserialize, Serialize};

/// A keyframed path: translation and rotation channels sharing one time axis.
///
/// Each channel keeps its keys sorted by ascending time with no two keys at
/// the same time. The channels are independent; a key in one does not imply a
/// key in the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    /// Interpolation between translation keys
    translation_interpolation: TranslationInterpolation,
    /// Interpolation between rotation keys
    rotation_interpolation: RotationInterpolation,
    /// Whether sampling wraps around the extent
    looped: bool,
    /// Translation channel
    translation: Vec<TranslationKey>,
    /// Rotation channel
    rotation: Vec<RotationKey>,
}

pub(crate) fn check_time(time: f32) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(MotionError::InvalidTime(time))
    }
}

/// Query times may lie outside the extent but must be real numbers
pub(crate) fn check_finite(time: f32) -> Result<()> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(MotionError::InvalidTime(time))
    }
}

/// Insert into a sorted channel, rejecting an occupied time
fn insert_sorted<T>(keys: &mut Vec<Keyframe<T>>, key: Keyframe<T>, channel: Channel) -> Result<KeyframeId> {
    let at = keys.partition_point(|k| k.time < key.time);
    if keys.get(at).is_some_and(|k| k.time == key.time) {
        return Err(MotionError::KeyframeCollision { time: key.time, channel });
    }
    keys.try_reserve(1)?;
    let id = key.id;
    keys.insert(at, key);
    Ok(id)
}

fn find_exact<T>(keys: &[Keyframe<T>], time: f32) -> Option<usize> {
    let at = keys.partition_point(|k| k.time < time);
    keys.get(at).filter(|k| k.time == time).map(|_| at)
}

fn check_sorted<T>(keys: &[Keyframe<T>], channel: Channel) -> Result<()> {
    for key in keys {
        check_time(key.time)?;
    }
    if keys.windows(2).any(|w| w[0].time >= w[1].time) {
        return Err(MotionError::Unsorted(format!("{} keys", channel.name())));
    }
    Ok(())
}

impl Path {
    /// Create an empty path
    pub fn new(
        translation_interpolation: TranslationInterpolation,
        rotation_interpolation: RotationInterpolation,
        looped: bool,
    ) -> Self {
        Self {
            translation_interpolation,
            rotation_interpolation,
            looped,
            translation: Vec::new(),
            rotation: Vec::new(),
        }
    }

    /// Whether the path wraps around its extent
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Translation interpolation mode
    pub fn translation_interpolation(&self) -> TranslationInterpolation {
        self.translation_interpolation
    }

    /// Rotation interpolation mode
    pub fn rotation_interpolation(&self) -> RotationInterpolation {
        self.rotation_interpolation
    }

    /// Change the translation interpolation mode
    pub fn set_translation_interpolation(&mut self, mode: TranslationInterpolation) {
        self.translation_interpolation = mode;
    }

    /// Change the rotation interpolation mode
    pub fn set_rotation_interpolation(&mut self, mode: RotationInterpolation) {
        self.rotation_interpolation = mode;
    }

    /// Insert a keyframe into every channel in `mask`.
    ///
    /// Fails without modifying the path if any of those channels already has
    /// a key at exactly `time`.
    pub fn insert_keyframe(&mut self, mask: ChannelMask, time: f32, pose: Pose) -> Result<()> {
        check_time(time)?;
        for &channel in mask.channels() {
            if self.keyframe_index(channel, time).is_some() {
                return Err(MotionError::KeyframeCollision { time, channel });
            }
        }
        if mask.contains(Channel::Translation) {
            self.insert_translation(time, pose.translation)?;
        }
        if mask.contains(Channel::Rotation) {
            self.insert_rotation(time, pose.rotation)?;
        }
        Ok(())
    }

    /// Insert a translation key
    pub fn insert_translation(&mut self, time: f32, value: [f32; 3]) -> Result<KeyframeId> {
        check_time(time)?;
        insert_sorted(&mut self.translation, Keyframe::new(time, value), Channel::Translation)
    }

    /// Insert a rotation key; the quaternion is normalized
    pub fn insert_rotation(&mut self, time: f32, value: [f32; 4]) -> Result<KeyframeId> {
        check_time(time)?;
        let value = crate::keyframe::Interpolation::normalize(value);
        insert_sorted(&mut self.rotation, Keyframe::new(time, value), Channel::Rotation)
    }

    /// Delete the key at `index` in one channel
    pub fn delete_keyframe(&mut self, channel: Channel, index: usize) -> Result<()> {
        let len = self.keyframe_count(channel);
        if index >= len {
            return Err(MotionError::keyframe_index(channel, index));
        }
        match channel {
            Channel::Translation => {
                self.translation.remove(index);
            }
            Channel::Rotation => {
                self.rotation.remove(index);
            }
        }
        Ok(())
    }

    /// Delete a key by its id, returning the channel it was in
    pub fn delete_keyframe_by_id(&mut self, id: KeyframeId) -> Result<Channel> {
        let (channel, index) = self
            .keyframe_index_of(id)
            .ok_or_else(|| MotionError::keyframe_id(id))?;
        self.delete_keyframe(channel, index)?;
        Ok(channel)
    }

    /// Index of the key at exactly `time`, if any
    pub fn keyframe_index(&self, channel: Channel, time: f32) -> Option<usize> {
        match channel {
            Channel::Translation => find_exact(&self.translation, time),
            Channel::Rotation => find_exact(&self.rotation, time),
        }
    }

    /// Channel and index of a key by id
    pub fn keyframe_index_of(&self, id: KeyframeId) -> Option<(Channel, usize)> {
        if let Some(index) = self.translation.iter().position(|k| k.id == id) {
            return Some((Channel::Translation, index));
        }
        self.rotation
            .iter()
            .position(|k| k.id == id)
            .map(|index| (Channel::Rotation, index))
    }

    /// Time of the key at `index`
    pub fn keyframe_time(&self, channel: Channel, index: usize) -> Option<f32> {
        match channel {
            Channel::Translation => self.translation.get(index).map(|k| k.time),
            Channel::Rotation => self.rotation.get(index).map(|k| k.time),
        }
    }

    /// Id of the key at `index`
    pub fn keyframe_id(&self, channel: Channel, index: usize) -> Option<KeyframeId> {
        match channel {
            Channel::Translation => self.translation.get(index).map(|k| k.id),
            Channel::Rotation => self.rotation.get(index).map(|k| k.id),
        }
    }

    /// Number of keys in a channel
    pub fn keyframe_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Translation => self.translation.len(),
            Channel::Rotation => self.rotation.len(),
        }
    }

    /// Whether either channel has at least one key
    pub fn has_keys(&self) -> bool {
        !self.translation.is_empty() || !self.rotation.is_empty()
    }

    /// Translation keys in time order
    pub fn translation_keys(&self) -> &[TranslationKey] {
        &self.translation
    }

    /// Rotation keys in time order
    pub fn rotation_keys(&self) -> &[RotationKey] {
        &self.rotation
    }

    /// Replace the value of a translation key
    pub fn set_translation(&mut self, index: usize, value: [f32; 3]) -> Result<()> {
        let key = self
            .translation
            .get_mut(index)
            .ok_or_else(|| MotionError::keyframe_index(Channel::Translation, index))?;
        key.value = value;
        Ok(())
    }

    /// Replace the value of a rotation key
    pub fn set_rotation(&mut self, index: usize, value: [f32; 4]) -> Result<()> {
        let key = self
            .rotation
            .get_mut(index)
            .ok_or_else(|| MotionError::keyframe_index(Channel::Rotation, index))?;
        key.value = crate::keyframe::Interpolation::normalize(value);
        Ok(())
    }

    /// Extent of one channel
    pub fn channel_extent(&self, channel: Channel) -> Option<TimeExtent> {
        match channel {
            Channel::Translation => sampler::channel_extent(&self.translation),
            Channel::Rotation => sampler::channel_extent(&self.rotation),
        }
    }

    /// Extent covering both channels, `None` for an empty path
    pub fn extent(&self) -> Option<TimeExtent> {
        match (
            self.channel_extent(Channel::Translation),
            self.channel_extent(Channel::Rotation),
        ) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (Some(e), None) | (None, Some(e)) => Some(e),
            (None, None) => None,
        }
    }

    /// Extent usable for sampling and wraparound
    pub fn sample_extent(&self) -> Result<TimeExtent> {
        match self.extent() {
            Some(extent) if !extent.is_degenerate() => Ok(extent),
            _ => Err(MotionError::DegenerateExtent),
        }
    }

    /// Sample the pose at `time`.
    ///
    /// The time is reduced into the extent first: wrapped for looped paths,
    /// clamped otherwise. A channel without keys contributes the identity.
    pub fn sample(&self, time: f32) -> Result<Pose> {
        check_finite(time)?;
        let extent = self.sample_extent()?;
        let time = if self.looped {
            extent.wrap(time)
        } else {
            extent.clamp(time)
        };
        Ok(self.evaluate(time))
    }

    /// Sample with `time` clamped into the extent, even for looped paths.
    ///
    /// Used to hold the final pose of a motion that has played out.
    pub fn sample_clamped(&self, time: f32) -> Result<Pose> {
        check_finite(time)?;
        let extent = self.sample_extent()?;
        Ok(self.evaluate(extent.clamp(time)))
    }

    fn evaluate(&self, time: f32) -> Pose {
        Pose {
            translation: sampler::sample_translation(
                &self.translation,
                self.translation_interpolation,
                self.looped,
                time,
            ),
            rotation: sampler::sample_rotation(
                &self.rotation,
                self.rotation_interpolation,
                self.looped,
                time,
            ),
        }
    }

    /// Check ordering and time invariants, used after loading
    pub fn validate(&self) -> Result<()> {
        check_sorted(&self.translation, Channel::Translation)?;
        check_sorted(&self.rotation, Channel::Rotation)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new(TranslationInterpolation::default(), RotationInterpolation::default(), false)
    }
}
