// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-object motion blending over a small fixed set of slots.
//!
//! Every slot plays its own motion on its own clock. Each tick the first
//! active slot sets the base pose and every later active slot is blended on
//! top of it by its weight. A slot that does not loop goes inactive when its
//! playhead wraps, and stays inactive until it is reset.

use crate::binding::{EntityId, EventOrigin, EventSink, PoseTarget};
use crate::config::{MotionConfig, MAX_BLEND_SLOTS};
use crate::dispatch::{dispatch_wrapped, process_events};
use crate::error::{MotionError, Result};
use crate::keyframe::Pose;
use crate::motion::Motion;
use crate::sampler::TimeExtent;

/// Playback settings of a blend slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendSettings {
    /// Playback rate multiplier, finite and non-negative
    pub speed: f32,
    /// Blend weight in 0..=1 (ignored for the base slot)
    pub weight: f32,
    /// Whether the slot wraps around or stops at the end
    pub looped: bool,
}

impl Default for BlendSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            weight: 1.0,
            looped: true,
        }
    }
}

impl BlendSettings {
    fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(MotionError::InvalidPlaybackRate(self.speed));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(MotionError::InvalidBlendWeight(self.weight));
        }
        Ok(())
    }
}

/// A motion playing in a blend slot
#[derive(Debug, Clone)]
pub struct BlendSlot {
    motion: Motion,
    settings: BlendSettings,
    time: f32,
    active: bool,
}

impl BlendSlot {
    /// Motion being played
    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Playback settings
    pub fn settings(&self) -> BlendSettings {
        self.settings
    }

    /// Playhead time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether the slot contributes to the pose
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Result of one blender tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendTick {
    /// Pose pushed to the entity
    pub pose: Pose,
    /// Number of slots that contributed
    pub active_slots: usize,
    /// Slots that reached their end and went inactive this tick
    pub finished: Vec<usize>,
    /// Number of events fired
    pub events_fired: usize,
}

/// Per-slot work computed before anything is committed
struct SlotStep {
    index: usize,
    extent: TimeExtent,
    start: f32,
    end: f32,
    wrapped: bool,
    finished: bool,
    pose: Pose,
}

/// Blends up to [`MAX_BLEND_SLOTS`] motions onto one object
#[derive(Debug, Clone)]
pub struct MotionBlender {
    entity: EntityId,
    slots: Vec<Option<BlendSlot>>,
}

impl MotionBlender {
    /// Create a blender with `slot_count` empty slots (clamped to 1..=[`MAX_BLEND_SLOTS`])
    pub fn new(entity: EntityId, slot_count: usize) -> Self {
        let count = slot_count.clamp(1, MAX_BLEND_SLOTS);
        Self {
            entity,
            slots: vec![None; count],
        }
    }

    /// Create a blender sized from the config
    pub fn from_config(entity: EntityId, config: &MotionConfig) -> Self {
        Self::new(entity, config.blend_slots)
    }

    /// Entity this blender animates
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot contents
    pub fn slot(&self, index: usize) -> Option<&BlendSlot> {
        self.slots.get(index)?.as_ref()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut BlendSlot> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(MotionError::NoSuchSlot(index))
    }

    /// Number of active slots
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().filter(|s| s.active).count()
    }

    /// Put a motion into a slot and start it from the beginning
    pub fn set_slot(&mut self, index: usize, motion: Motion, settings: BlendSettings) -> Result<()> {
        settings.validate()?;
        let start = motion.extent()?.start;
        let slot = self.slots.get_mut(index).ok_or(MotionError::NoSuchSlot(index))?;
        *slot = Some(BlendSlot {
            motion,
            settings,
            time: start,
            active: true,
        });
        Ok(())
    }

    /// Empty a slot, returning its motion
    pub fn clear_slot(&mut self, index: usize) -> Result<Option<Motion>> {
        let slot = self.slots.get_mut(index).ok_or(MotionError::NoSuchSlot(index))?;
        Ok(slot.take().map(|s| s.motion))
    }

    /// Rewind a slot to the start of its motion and activate it
    pub fn reset_slot(&mut self, index: usize) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.time = slot.motion.extent()?.start;
        slot.active = true;
        Ok(())
    }

    /// Deactivate a slot, keeping its motion and playhead
    pub fn stop_slot(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.active = false;
        Ok(())
    }

    /// Change a slot's blend weight
    pub fn set_weight(&mut self, index: usize, weight: f32) -> Result<()> {
        let slot = self.slot_mut(index)?;
        let settings = BlendSettings { weight, ..slot.settings };
        settings.validate()?;
        slot.settings = settings;
        Ok(())
    }

    /// Change a slot's playback rate
    pub fn set_speed(&mut self, index: usize, speed: f32) -> Result<()> {
        let slot = self.slot_mut(index)?;
        let settings = BlendSettings { speed, ..slot.settings };
        settings.validate()?;
        slot.settings = settings;
        Ok(())
    }

    fn plan(&self, delta_time: f32) -> Result<Vec<SlotStep>> {
        let mut steps = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot.as_ref().filter(|s| s.active) else {
                continue;
            };
            let extent = slot.motion.extent()?;
            let start = extent.wrap(slot.time);
            let advanced = start + delta_time * slot.settings.speed;
            if !advanced.is_finite() {
                return Err(MotionError::InvalidTime(advanced));
            }
            let wrapped_end = extent.wrap(advanced);
            let wrapped = advanced >= extent.end;
            let finished = wrapped && !slot.settings.looped;
            let end = if finished { extent.end } else { wrapped_end };
            let pose = if finished {
                slot.motion.primary_path()?.sample_clamped(end)?
            } else {
                slot.motion.sample(end)?
            };
            steps.push(SlotStep { index, extent, start, end, wrapped, finished, pose });
        }
        Ok(steps)
    }

    /// Advance every active slot by `delta_time` seconds and push the blended pose.
    ///
    /// With no active slot the entity is reset to the identity pose. On error
    /// nothing is fired, pushed or changed.
    pub fn update<S, T>(&mut self, delta_time: f32, sink: &mut S, target: &mut T) -> Result<BlendTick>
    where
        S: EventSink + ?Sized,
        T: PoseTarget + ?Sized,
    {
        if !(delta_time.is_finite() && delta_time >= 0.0) {
            return Err(MotionError::InvalidTime(delta_time));
        }
        let steps = self.plan(delta_time).inspect_err(|e| {
            tracing::warn!("Blender {:?} update aborted: {}", self.entity.0, e);
        })?;

        let mut tick = BlendTick {
            pose: Pose::IDENTITY,
            active_slots: steps.len(),
            ..BlendTick::default()
        };

        for (n, step) in steps.iter().enumerate() {
            let Some(slot) = self.slots[step.index].as_mut() else {
                continue;
            };

            tick.events_fired += if step.finished {
                process_events(sink, EventOrigin::Object, self.entity, &slot.motion, step.start, step.extent.end)
            } else if step.wrapped {
                dispatch_wrapped(sink, EventOrigin::Object, self.entity, &slot.motion, step.extent, step.start, step.end)
            } else {
                process_events(sink, EventOrigin::Object, self.entity, &slot.motion, step.start, step.end)
            };

            slot.time = step.end;
            if step.finished {
                slot.active = false;
                tick.finished.push(step.index);
                tracing::debug!("Blender {:?} slot {} finished", self.entity.0, step.index);
            } else if step.wrapped {
                tracing::trace!("Blender {:?} slot {} looped", self.entity.0, step.index);
            }

            tick.pose = if n == 0 {
                step.pose
            } else {
                tick.pose.blend(&step.pose, slot.settings.weight)
            };
        }

        target.apply_pose(self.entity, &tick.pose);
        Ok(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{EventLog, LastPose};
    use crate::keyframe::{ChannelMask, RotationInterpolation, TranslationInterpolation};
    use crate::path::Path;

    /// Motion moving along `axis` by `length` units over `length` seconds
    fn line_motion(axis: usize, length: f32) -> Motion {
        let mut end = [0.0; 3];
        end[axis] = length;
        let mut path = Path::new(TranslationInterpolation::Linear, RotationInterpolation::Slerp, true);
        path.insert_keyframe(ChannelMask::All, 0.0, Pose::IDENTITY).unwrap();
        path.insert_keyframe(ChannelMask::All, length, Pose::from_translation(end)).unwrap();
        let mut motion = Motion::new(format!("axis{axis}"));
        motion.add_path("root", path);
        motion
    }

    fn blender() -> (MotionBlender, EventLog, LastPose) {
        (MotionBlender::new(EntityId::new(), 4), EventLog::new(), LastPose::default())
    }

    #[test]
    fn test_single_slot_sets_pose() {
        let (mut blender, mut log, mut target) = blender();
        blender.set_slot(0, line_motion(0, 4.0), BlendSettings::default()).unwrap();
        let tick = blender.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.pose.translation, [1.0, 0.0, 0.0]);
        assert_eq!(target.pose, Some(tick.pose));
        assert_eq!(tick.active_slots, 1);
    }

    #[test]
    fn test_weighted_blend_of_two_slots() {
        let (mut blender, mut log, mut target) = blender();
        blender.set_slot(0, line_motion(0, 4.0), BlendSettings::default()).unwrap();
        let overlay = BlendSettings { weight: 0.5, ..BlendSettings::default() };
        blender.set_slot(2, line_motion(1, 4.0), overlay).unwrap();
        let tick = blender.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.pose.translation, [1.0, 1.0, 0.0]);
        assert_eq!(tick.active_slots, 2);
    }

    #[test]
    fn test_first_active_slot_is_base() {
        let (mut blender, mut log, mut target) = blender();
        let light = BlendSettings { weight: 0.1, ..BlendSettings::default() };
        blender.set_slot(0, line_motion(0, 4.0), BlendSettings::default()).unwrap();
        blender.set_slot(1, line_motion(1, 4.0), light).unwrap();
        blender.stop_slot(0).unwrap();
        // Slot 1 is now first and its weight does not apply
        let tick = blender.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.pose.translation, [0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_speed_scales_slot_clock() {
        let (mut blender, mut log, mut target) = blender();
        let fast = BlendSettings { speed: 2.0, ..BlendSettings::default() };
        blender.set_slot(0, line_motion(0, 4.0), fast).unwrap();
        blender.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(blender.slot(0).unwrap().time(), 2.0);
    }

    #[test]
    fn test_one_shot_slot_finishes() {
        let (mut blender, mut log, mut target) = blender();
        let mut motion = line_motion(0, 2.0);
        motion.insert_event(1.5, "late").unwrap();
        motion.insert_event(0.1, "early").unwrap();
        let once = BlendSettings { looped: false, ..BlendSettings::default() };
        blender.set_slot(0, motion, once).unwrap();

        blender.update(1.0, &mut log, &mut target).unwrap();
        let tick = blender.update(1.5, &mut log, &mut target).unwrap();
        assert_eq!(tick.finished, vec![0]);
        assert_eq!(tick.pose.translation, [2.0, 0.0, 0.0]);
        assert!(!blender.slot(0).unwrap().is_active());
        // The wrapped-around part is not played
        assert_eq!(log.labels(), vec!["early", "late"]);

        let tick = blender.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.active_slots, 0);
        assert_eq!(tick.pose, Pose::IDENTITY);
        assert_eq!(target.pose, Some(Pose::IDENTITY));

        blender.reset_slot(0).unwrap();
        let tick = blender.update(0.5, &mut log, &mut target).unwrap();
        assert_eq!(tick.pose.translation, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_looping_slot_events_wrap_in_order() {
        let (mut blender, mut log, mut target) = blender();
        let mut motion = line_motion(0, 5.0);
        motion.insert_event(4.0, "t4.0").unwrap();
        motion.insert_event(0.25, "t0.25").unwrap();
        blender.set_slot(1, motion, BlendSettings::default()).unwrap();
        blender.update(4.5, &mut log, &mut target).unwrap();
        log.take();
        blender.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(log.labels(), vec!["t0.25"]);
        assert!(log.fired.iter().all(|e| e.origin == EventOrigin::Object));

        blender.update(3.0, &mut log, &mut target).unwrap();
        blender.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(log.labels(), vec!["t0.25", "t4.0", "t0.25"]);
    }

    #[test]
    fn test_settings_validated() {
        let (mut blender, _, _) = blender();
        let bad_speed = BlendSettings { speed: -1.0, ..BlendSettings::default() };
        assert!(matches!(
            blender.set_slot(0, line_motion(0, 1.0), bad_speed),
            Err(MotionError::InvalidPlaybackRate(_))
        ));
        blender.set_slot(0, line_motion(0, 1.0), BlendSettings::default()).unwrap();
        assert!(matches!(blender.set_weight(0, 1.5), Err(MotionError::InvalidBlendWeight(_))));
        assert!(matches!(blender.set_weight(3, 0.5), Err(MotionError::NoSuchSlot(3))));
        assert!(matches!(
            blender.set_slot(4, line_motion(0, 1.0), BlendSettings::default()),
            Err(MotionError::NoSuchSlot(4))
        ));
    }

    #[test]
    fn test_slot_count_is_bounded() {
        let blender = MotionBlender::new(EntityId::new(), 32);
        assert_eq!(blender.slot_count(), MAX_BLEND_SLOTS);
    }

    #[test]
    fn test_failed_tick_changes_nothing() {
        let (mut blender, mut log, mut target) = blender();
        blender.set_slot(0, line_motion(0, 4.0), BlendSettings::default()).unwrap();
        blender.set_slot(1, line_motion(1, 4.0), BlendSettings::default()).unwrap();
        // Break slot 1's motion after it was accepted
        let slot = blender.slots[1].as_mut().unwrap();
        slot.motion.remove_path(0).unwrap();

        assert!(blender.update(1.0, &mut log, &mut target).is_err());
        assert_eq!(blender.slot(0).unwrap().time(), 0.0);
        assert!(target.pose.is_none());
    }

    #[test]
    fn test_overflowing_scaled_delta_is_rejected() {
        let (mut blender, mut log, mut target) = blender();
        let fast = BlendSettings { speed: 2.0, ..BlendSettings::default() };
        blender.set_slot(0, line_motion(0, 4.0), fast).unwrap();
        assert!(matches!(
            blender.update(f32::MAX, &mut log, &mut target),
            Err(MotionError::InvalidTime(_))
        ));
        assert_eq!(blender.slot(0).unwrap().time(), 0.0);
        assert!(target.pose.is_none());
    }

    #[test]
    fn test_tick_of_exactly_one_loop_wraps() {
        let (mut blender, mut log, mut target) = blender();
        let mut motion = line_motion(0, 2.0);
        motion.insert_event(0.5, "a").unwrap();
        motion.insert_event(1.5, "b").unwrap();
        blender.set_slot(0, motion.clone(), BlendSettings::default()).unwrap();
        blender.update(1.0, &mut log, &mut target).unwrap();
        log.take();

        blender.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(log.labels(), vec!["b", "a"]);
        assert_eq!(blender.slot(0).unwrap().time(), 1.0);

        let once = BlendSettings { looped: false, ..BlendSettings::default() };
        blender.set_slot(1, motion, once).unwrap();
        let tick = blender.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.finished, vec![1]);
    }
}
