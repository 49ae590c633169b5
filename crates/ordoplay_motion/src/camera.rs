// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-cut camera playback.
//!
//! A camera owns a fixed number of cut slots, each optionally holding a
//! motion. Playback runs one cut at a time. When the playhead wraps past the
//! end of the current cut, playback moves to the next populated cut; when
//! there is none, it returns to cut 0 and reports that the cuts are exhausted.
//!
//! Each tick is all-or-nothing: every lookup and sample is done before any
//! event fires or any state changes, so a failed tick leaves the camera where
//! it was.

use crate::binding::{EntityId, EventOrigin, EventSink, PoseTarget};
use crate::config::MotionConfig;
use crate::dispatch::{dispatch_wrapped, process_events};
use crate::error::{MotionError, Result};
use crate::keyframe::Pose;
use crate::motion::{Motion, PRIMARY_PATH};
use crate::path::check_time;

/// Path whose translation X carries the field of view
pub const FOV_PATH: usize = 1;

/// Playback state of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutState {
    /// Not playing
    #[default]
    Idle,
    /// Playing the cut at this index
    PlayingCut(usize),
}

/// What happened at the loop point during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutTransition {
    /// Playhead did not wrap
    #[default]
    None,
    /// Playback moved on to the next cut
    Advanced {
        /// Cut that finished
        from: usize,
        /// Cut that started
        to: usize,
    },
    /// No further populated cut; playback stays on or returns to a looping cut
    Exhausted,
}

/// Result of one camera tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraTick {
    /// State after the tick
    pub state: CutState,
    /// Loop-point transition, if any
    pub transition: CutTransition,
    /// Pose pushed to the camera entity
    pub pose: Option<Pose>,
    /// Field of view pushed to the camera entity
    pub fov: Option<f32>,
    /// Number of events fired
    pub events_fired: usize,
}

/// Where playback lands when the current cut wraps
struct Landing {
    index: usize,
    time: f32,
    transition: CutTransition,
    /// Events of the entered cut in `[start, time)` fire when a different cut is entered
    entry_span: Option<(f32, f32)>,
}

/// Camera driven by a sequence of motion cuts
#[derive(Debug, Clone)]
pub struct CameraCuts {
    entity: EntityId,
    cuts: Vec<Option<Motion>>,
    current: usize,
    time: f32,
    active: bool,
}

impl CameraCuts {
    /// Create a camera with `max_cuts` empty cut slots
    pub fn new(entity: EntityId, max_cuts: usize) -> Self {
        Self {
            entity,
            cuts: vec![None; max_cuts.max(1)],
            current: 0,
            time: 0.0,
            active: false,
        }
    }

    /// Create a camera sized from the config
    pub fn from_config(entity: EntityId, config: &MotionConfig) -> Self {
        Self::new(entity, config.max_cuts)
    }

    /// Entity this camera animates
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Number of cut slots
    pub fn max_cuts(&self) -> usize {
        self.cuts.len()
    }

    /// Assign a motion to a cut slot
    pub fn set_cut(&mut self, index: usize, motion: Motion) -> Result<()> {
        let slot = self.cuts.get_mut(index).ok_or(MotionError::NoSuchCut(index))?;
        *slot = Some(motion);
        Ok(())
    }

    /// Empty a cut slot, returning its motion
    pub fn clear_cut(&mut self, index: usize) -> Result<Option<Motion>> {
        let slot = self.cuts.get_mut(index).ok_or(MotionError::NoSuchCut(index))?;
        Ok(slot.take())
    }

    /// Motion of a cut
    pub fn cut(&self, index: usize) -> Option<&Motion> {
        self.cuts.get(index)?.as_ref()
    }

    /// Mutable motion of a cut, for editing while paused
    pub fn cut_mut(&mut self, index: usize) -> Option<&mut Motion> {
        self.cuts.get_mut(index)?.as_mut()
    }

    /// Whether a cut has a motion with at least one primary key
    pub fn is_populated(&self, index: usize) -> bool {
        self.cut(index).is_some_and(Motion::has_keys)
    }

    /// Index of the cut being played (or that will play)
    pub fn current_cut(&self) -> usize {
        self.current
    }

    /// Playhead time within the current cut
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether the camera is playing
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current state
    pub fn state(&self) -> CutState {
        if self.active {
            CutState::PlayingCut(self.current)
        } else {
            CutState::Idle
        }
    }

    /// Resume playback from the current cut and time
    pub fn play(&mut self) -> Result<()> {
        if !self.is_populated(self.current) {
            return Err(MotionError::EmptyCut(self.current));
        }
        self.active = true;
        Ok(())
    }

    /// Start playback at the beginning of a cut
    pub fn play_from(&mut self, index: usize) -> Result<()> {
        if index >= self.cuts.len() {
            return Err(MotionError::NoSuchCut(index));
        }
        let start = self
            .cut(index)
            .ok_or(MotionError::EmptyCut(index))?
            .extent()?
            .start;
        self.current = index;
        self.time = start;
        self.active = true;
        tracing::debug!("Camera {:?} playing cut {}", self.entity.0, index);
        Ok(())
    }

    /// Stop playback; the next tick does no work
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Move the playhead within the current cut
    pub fn seek(&mut self, time: f32) -> Result<()> {
        check_time(time)?;
        self.time = time;
        Ok(())
    }

    /// Next populated cut after `index`, if any
    fn next_populated(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        self.is_populated(next).then_some(next)
    }

    fn populated_motion(&self, index: usize) -> Result<&Motion> {
        self.cut(index)
            .filter(|m| m.has_keys())
            .ok_or(MotionError::EmptyCut(index))
    }

    /// Decide where playback goes after cut `index` wrapped, carrying `carry` seconds
    fn land(&self, index: usize, wrapped_time: f32, carry: f32) -> Result<Landing> {
        if let Some(next) = self.next_populated(index) {
            let extent = self.populated_motion(next)?.extent()?;
            let time = extent.wrap(extent.start + carry);
            return Ok(Landing {
                index: next,
                time,
                transition: CutTransition::Advanced { from: index, to: next },
                entry_span: Some((extent.start, time)),
            });
        }

        // Last slot keeps looping; otherwise return to the first cut
        if index == 0 || index + 1 >= self.cuts.len() {
            return Ok(Landing {
                index,
                time: wrapped_time,
                transition: CutTransition::Exhausted,
                entry_span: None,
            });
        }
        let extent = self.populated_motion(0)?.extent()?;
        let time = extent.wrap(extent.start + carry);
        Ok(Landing {
            index: 0,
            time,
            transition: CutTransition::Exhausted,
            entry_span: Some((extent.start, time)),
        })
    }

    /// Advance playback by `delta_time` seconds.
    ///
    /// Fires the events crossed, pushes the new pose (and field of view, when
    /// the cut has a second path) to `target`, and reports any cut change. On
    /// error nothing is fired, pushed or changed.
    pub fn update<S, T>(&mut self, delta_time: f32, sink: &mut S, target: &mut T) -> Result<CameraTick>
    where
        S: EventSink + ?Sized,
        T: PoseTarget + ?Sized,
    {
        if !self.active {
            return Ok(CameraTick::default());
        }
        self.tick(delta_time, sink, target).inspect_err(|e| {
            tracing::warn!("Camera {:?} update aborted on cut {}: {}", self.entity.0, self.current, e);
        })
    }

    fn tick<S, T>(&mut self, delta_time: f32, sink: &mut S, target: &mut T) -> Result<CameraTick>
    where
        S: EventSink + ?Sized,
        T: PoseTarget + ?Sized,
    {
        if !(delta_time.is_finite() && delta_time >= 0.0) {
            return Err(MotionError::InvalidTime(delta_time));
        }

        let index = self.current;
        let motion = self.populated_motion(index)?;
        let extent = motion.extent()?;
        let t_start = extent.wrap(self.time);
        let advanced = t_start + delta_time;
        if !advanced.is_finite() {
            return Err(MotionError::InvalidTime(advanced));
        }
        let t_end = extent.wrap(advanced);
        // A tick of exactly one extent length lands where it started but still loops
        let wrapped = advanced >= extent.end;

        let landing = if wrapped {
            self.land(index, t_end, t_end - extent.start)?
        } else {
            Landing {
                index,
                time: t_end,
                transition: CutTransition::None,
                entry_span: None,
            }
        };

        let landed = self.populated_motion(landing.index)?;
        let pose = landed.sample_path(PRIMARY_PATH, landing.time)?;
        let fov = if landed.path_count() > FOV_PATH {
            Some(landed.sample_path(FOV_PATH, landing.time)?.translation[0])
        } else {
            None
        };

        let mut events_fired = if wrapped {
            dispatch_wrapped(sink, EventOrigin::Transform, self.entity, motion, extent, t_start, t_end)
        } else {
            process_events(sink, EventOrigin::Transform, self.entity, motion, t_start, t_end)
        };
        if let Some((start, end)) = landing.entry_span {
            events_fired += process_events(sink, EventOrigin::Object, self.entity, landed, start, end);
        }

        match landing.transition {
            CutTransition::Advanced { from, to } => {
                tracing::debug!("Camera {:?} cut {} -> {}", self.entity.0, from, to);
            }
            CutTransition::Exhausted => {
                tracing::debug!("Camera {:?} has no cut after {}, looping at cut {}", self.entity.0, index, landing.index);
            }
            CutTransition::None => {}
        }

        self.current = landing.index;
        self.time = landing.time;

        target.apply_pose(self.entity, &pose);
        if let Some(fov) = fov {
            target.set_field_of_view(self.entity, fov);
        }

        Ok(CameraTick {
            state: self.state(),
            transition: landing.transition,
            pose: Some(pose),
            fov,
            events_fired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{EventLog, LastPose};
    use crate::keyframe::{ChannelMask, RotationInterpolation, TranslationInterpolation};
    use crate::path::Path;

    /// Linear motion moving along X from 0 to `length` over `length` seconds
    fn cut_motion(name: &str, length: f32) -> Motion {
        let mut path = Path::new(TranslationInterpolation::Linear, RotationInterpolation::Slerp, true);
        path.insert_keyframe(ChannelMask::All, 0.0, Pose::IDENTITY).unwrap();
        path.insert_keyframe(ChannelMask::All, length, Pose::from_translation([length, 0.0, 0.0]))
            .unwrap();
        let mut motion = Motion::new(name);
        motion.add_path("camera", path);
        motion
    }

    fn camera(cuts: Vec<Motion>, max_cuts: usize) -> CameraCuts {
        let mut camera = CameraCuts::new(EntityId::new(), max_cuts);
        for (i, motion) in cuts.into_iter().enumerate() {
            camera.set_cut(i, motion).unwrap();
        }
        camera.play_from(0).unwrap();
        camera
    }

    #[test]
    fn test_plain_advance_samples_pose() {
        let mut camera = camera(vec![cut_motion("a", 4.0)], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        let tick = camera.update(1.5, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::None);
        assert_eq!(tick.state, CutState::PlayingCut(0));
        assert_eq!(target.pose.unwrap().translation, [1.5, 0.0, 0.0]);
        assert_eq!(camera.time(), 1.5);
        assert_eq!(tick.fov, None);
    }

    #[test]
    fn test_single_cut_exhausts_and_stays() {
        let mut motion = cut_motion("only", 2.0);
        motion.insert_event(0.25, "start").unwrap();
        motion.insert_event(1.75, "end").unwrap();
        let mut camera = camera(vec![motion], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());

        camera.update(1.5, &mut log, &mut target).unwrap();
        assert_eq!(log.labels(), vec!["start"]);

        let tick = camera.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Exhausted);
        assert_eq!(camera.current_cut(), 0);
        assert_eq!(camera.time(), 0.5);
        // Both halves of the wrapped span, no re-entry events
        assert_eq!(log.labels(), vec!["start", "end", "start"]);
        assert!(log.fired.iter().all(|e| e.origin == EventOrigin::Transform));
    }

    #[test]
    fn test_wrap_advances_to_next_cut() {
        let mut first = cut_motion("first", 2.0);
        first.insert_event(0.1, "first-early").unwrap();
        first.insert_event(1.8, "first-late").unwrap();
        let mut second = cut_motion("second", 4.0);
        second.insert_event(0.2, "second-early").unwrap();
        second.insert_event(3.0, "second-late").unwrap();
        let mut camera = camera(vec![first, second], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());

        camera.seek(1.5).unwrap();
        let tick = camera.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Advanced { from: 0, to: 1 });
        assert_eq!(tick.state, CutState::PlayingCut(1));
        assert_eq!(camera.time(), 0.5);
        assert_eq!(target.pose.unwrap().translation, [0.5, 0.0, 0.0]);

        let fired: Vec<_> = log.fired.iter().map(|e| (e.label.as_str(), e.origin)).collect();
        assert_eq!(
            fired,
            vec![
                ("first-late", EventOrigin::Transform),
                ("first-early", EventOrigin::Transform),
                ("second-early", EventOrigin::Object),
            ]
        );
        assert_eq!(tick.events_fired, 3);
    }

    #[test]
    fn test_last_cut_slot_keeps_looping() {
        let mut camera = camera(vec![cut_motion("a", 2.0), cut_motion("b", 2.0)], 2);
        camera.play_from(1).unwrap();
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        let tick = camera.update(2.5, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Exhausted);
        assert_eq!(camera.current_cut(), 1);
        assert_eq!(camera.time(), 0.5);
    }

    #[test]
    fn test_empty_next_cut_returns_to_first() {
        let mut first = cut_motion("first", 2.0);
        first.insert_event(0.1, "first-early").unwrap();
        let mut camera = camera(vec![first, cut_motion("second", 2.0)], 4);
        camera.play_from(1).unwrap();
        let (mut log, mut target) = (EventLog::new(), LastPose::default());

        let tick = camera.update(2.5, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Exhausted);
        assert_eq!(camera.current_cut(), 0);
        assert_eq!(camera.time(), 0.5);
        assert_eq!(log.fired.len(), 1);
        assert_eq!(log.fired[0].origin, EventOrigin::Object);
    }

    #[test]
    fn test_unpopulated_next_cut_is_skipped() {
        let mut camera = camera(vec![cut_motion("a", 2.0), Motion::new("no paths")], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        camera.seek(1.5).unwrap();
        let tick = camera.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Exhausted);
        assert_eq!(camera.current_cut(), 0);
    }

    #[test]
    fn test_fov_from_second_path() {
        let mut motion = cut_motion("a", 2.0);
        let mut fov = Path::new(TranslationInterpolation::Linear, RotationInterpolation::Slerp, true);
        fov.insert_translation(0.0, [60.0, 0.0, 0.0]).unwrap();
        fov.insert_translation(2.0, [80.0, 0.0, 0.0]).unwrap();
        motion.add_path("fov", fov);
        let mut camera = camera(vec![motion], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        let tick = camera.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.fov, Some(70.0));
        assert_eq!(target.fov, Some(70.0));
    }

    #[test]
    fn test_stopped_camera_does_nothing() {
        let mut camera = camera(vec![cut_motion("a", 2.0)], 4);
        camera.stop();
        camera.clear_cut(0).unwrap();
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        let tick = camera.update(1.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.state, CutState::Idle);
        assert!(target.pose.is_none());
    }

    #[test]
    fn test_failed_tick_changes_nothing() {
        let mut broken = Motion::new("broken");
        let mut path = Path::default();
        path.insert_keyframe(ChannelMask::All, 1.0, Pose::IDENTITY).unwrap();
        broken.add_path("camera", path);

        let mut camera = camera(vec![cut_motion("a", 2.0), broken], 4);
        camera.seek(1.5).unwrap();
        let (mut log, mut target) = (EventLog::new(), LastPose::default());

        let result = camera.update(1.0, &mut log, &mut target);
        assert!(matches!(result, Err(MotionError::DegenerateExtent)));
        assert_eq!(camera.current_cut(), 0);
        assert_eq!(camera.time(), 1.5);
        assert!(target.pose.is_none());
        assert!(log.fired.is_empty());
    }

    #[test]
    fn test_cut_slot_bounds() {
        let mut camera = CameraCuts::new(EntityId::new(), 2);
        assert!(matches!(camera.set_cut(2, Motion::new("x")), Err(MotionError::NoSuchCut(2))));
        assert!(matches!(camera.play(), Err(MotionError::EmptyCut(0))));
        assert!(matches!(camera.play_from(5), Err(MotionError::NoSuchCut(5))));
    }

    #[test]
    fn test_negative_delta_rejected() {
        let mut camera = camera(vec![cut_motion("a", 2.0)], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        assert!(matches!(
            camera.update(-1.0, &mut log, &mut target),
            Err(MotionError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_seek_rejects_bad_time() {
        let mut camera = camera(vec![cut_motion("a", 2.0)], 4);
        assert!(matches!(camera.seek(f32::NAN), Err(MotionError::InvalidTime(_))));
        assert!(matches!(camera.seek(f32::INFINITY), Err(MotionError::InvalidTime(_))));
        assert!(camera.seek(-0.5).is_err());
        assert_eq!(camera.time(), 0.0);

        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        camera.update(0.5, &mut log, &mut target).unwrap();
        assert_eq!(target.pose.unwrap().translation, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_huge_delta_does_not_panic() {
        let mut camera = camera(vec![cut_motion("a", 2.0)], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        let tick = camera.update(f32::MAX, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Exhausted);
        assert!(target.pose.unwrap().translation[0].is_finite());
    }

    #[test]
    fn test_tick_of_exactly_one_loop_wraps() {
        let mut first = cut_motion("first", 2.0);
        first.insert_event(1.0, "middle").unwrap();
        let mut camera = camera(vec![first, cut_motion("second", 2.0)], 4);
        let (mut log, mut target) = (EventLog::new(), LastPose::default());

        camera.seek(0.5).unwrap();
        let tick = camera.update(2.0, &mut log, &mut target).unwrap();
        assert_eq!(tick.transition, CutTransition::Advanced { from: 0, to: 1 });
        assert_eq!(log.labels(), vec!["middle"]);
        assert_eq!(camera.time(), 0.5);
    }

    #[test]
    fn test_cut_edited_in_place() {
        let mut camera = camera(vec![cut_motion("a", 2.0)], 4);
        camera.cut_mut(0).unwrap().insert_event(0.25, "added").unwrap();
        assert!(camera.cut_mut(3).is_none());
        let (mut log, mut target) = (EventLog::new(), LastPose::default());
        camera.update(0.5, &mut log, &mut target).unwrap();
        assert_eq!(log.labels(), vec!["added"]);
    }
}
