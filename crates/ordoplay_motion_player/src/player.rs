// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-step playback loop.

use crate::cli::PlayArgs;
use ordoplay_motion::io::load_motion_file;
use ordoplay_motion::{
    BlendSettings, CameraCuts, CutTransition, EntityId, Event, EventOrigin, EventSink,
    LastPose, Motion, MotionBlender, MotionConfig, MotionError, Pose, PoseTarget, Result,
};
use std::path::PathBuf;

/// Event sink that logs every event
#[derive(Debug, Default)]
pub struct TracingSink {
    /// Events fired so far
    pub fired: usize,
}

impl EventSink for TracingSink {
    fn on_event(&mut self, origin: EventOrigin, subject: EntityId, event: &Event) {
        self.fired += 1;
        tracing::info!("Event '{}' at t={} ({:?}, {:?})", event.label, event.time, origin, subject.0);
    }
}

/// Pose target that logs every pose
#[derive(Debug, Default)]
pub struct TracingTarget {
    /// Last values received
    pub last: LastPose,
}

impl PoseTarget for TracingTarget {
    fn apply_pose(&mut self, entity: EntityId, pose: &Pose) {
        tracing::debug!("Pose {:?}: t={:?} r={:?}", entity.0, pose.translation, pose.rotation);
        self.last.apply_pose(entity, pose);
    }

    fn set_field_of_view(&mut self, entity: EntityId, fov: f32) {
        tracing::trace!("Field of view {:?}: {}", entity.0, fov);
        self.last.set_field_of_view(entity, fov);
    }
}

/// What happened during a playback run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSummary {
    /// Ticks run
    pub ticks: usize,
    /// Events fired by the camera and the blended object
    pub events: usize,
    /// Camera cut changes
    pub cut_changes: usize,
    /// Times the camera ran out of cuts
    pub exhausted: usize,
    /// Blend slots that played out
    pub finished_slots: usize,
    /// Final camera pose
    pub camera_pose: Option<Pose>,
}

fn load_all(files: &[PathBuf]) -> Result<Vec<Motion>> {
    let mut motions = Vec::new();
    for file in files {
        motions.extend(load_motion_file(file)?);
    }
    Ok(motions)
}

/// Load the camera cuts and blended motions, then run the playback loop
pub fn play(args: &PlayArgs, config: &MotionConfig) -> Result<PlaybackSummary> {
    if !(args.step.is_finite() && args.step > 0.0) {
        return Err(MotionError::InvalidTime(args.step));
    }

    let mut camera = CameraCuts::from_config(EntityId::new(), config);
    for (index, motion) in load_all(&args.cuts)?.into_iter().enumerate() {
        if index >= camera.max_cuts() {
            tracing::warn!("Ignoring motion '{}': only {} cuts available", motion.name, camera.max_cuts());
            continue;
        }
        tracing::info!("Cut {}: '{}'", index, motion.name);
        camera.set_cut(index, motion)?;
    }
    camera.play_from(0)?;

    let mut blender = MotionBlender::from_config(EntityId::new(), config);
    for (index, motion) in load_all(&args.blend)?.into_iter().enumerate() {
        if index >= blender.slot_count() {
            tracing::warn!("Ignoring motion '{}': only {} blend slots available", motion.name, blender.slot_count());
            continue;
        }
        // Equal share for every slot once blended in order
        let settings = BlendSettings {
            weight: 1.0 / (index + 1) as f32,
            looped: !args.once,
            ..BlendSettings::default()
        };
        blender.set_slot(index, motion, settings)?;
    }

    let ticks = (args.duration / args.step).ceil().max(0.0) as usize;
    let mut sink = TracingSink::default();
    let mut camera_target = TracingTarget::default();
    let mut object_target = TracingTarget::default();
    let mut summary = PlaybackSummary::default();

    for _ in 0..ticks {
        let tick = camera.update(args.step, &mut sink, &mut camera_target)?;
        match tick.transition {
            CutTransition::Advanced { from, to } => {
                tracing::info!("Cut {} -> {}", from, to);
                summary.cut_changes += 1;
            }
            CutTransition::Exhausted => {
                tracing::info!("No more cuts, playing cut {}", camera.current_cut());
                summary.exhausted += 1;
            }
            CutTransition::None => {}
        }

        if blender.active_count() > 0 {
            let blend = blender.update(args.step, &mut sink, &mut object_target)?;
            for slot in &blend.finished {
                tracing::info!("Blend slot {} finished", slot);
            }
            summary.finished_slots += blend.finished.len();
        }
        summary.ticks += 1;
    }

    summary.events = sink.fired;
    summary.camera_pose = camera_target.last.pose;
    tracing::info!(
        "Played {} ticks: {} events, {} cut changes",
        summary.ticks,
        summary.events,
        summary.cut_changes
    );
    Ok(summary)
}
