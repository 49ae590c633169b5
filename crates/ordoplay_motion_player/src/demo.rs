// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample motion set for trying the player.

use ordoplay_motion::io::{save_motion_file, to_ron_string};
use ordoplay_motion::{
    ChannelMask, Motion, Path, Pose, Result, RotationInterpolation, TranslationInterpolation,
};
use std::f32::consts::FRAC_1_SQRT_2;

/// Quaternion turning `half_angle * 2` radians about the Y axis
fn yaw(half_angle: f32) -> [f32; 4] {
    [0.0, half_angle.sin(), 0.0, half_angle.cos()]
}

/// Cut 0: a four second orbit with a field of view pull and two events
fn orbit() -> Result<Motion> {
    let mut camera = Path::new(TranslationInterpolation::Hermite, RotationInterpolation::Slerp, true);
    camera.insert_keyframe(ChannelMask::All, 0.0, Pose::new([0.0, 2.0, -8.0], Pose::IDENTITY.rotation))?;
    camera.insert_keyframe(ChannelMask::All, 1.0, Pose::new([8.0, 2.0, 0.0], yaw(-std::f32::consts::FRAC_PI_4)))?;
    camera.insert_keyframe(ChannelMask::All, 2.0, Pose::new([0.0, 2.0, 8.0], [0.0, 1.0, 0.0, 0.0]))?;
    camera.insert_keyframe(ChannelMask::All, 3.0, Pose::new([-8.0, 2.0, 0.0], [0.0, FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2]))?;
    camera.insert_keyframe(ChannelMask::All, 4.0, Pose::new([0.0, 2.0, -8.0], [0.0, 0.0, 0.0, -1.0]))?;

    let mut fov = Path::new(TranslationInterpolation::Linear, RotationInterpolation::Linear, false);
    fov.insert_translation(0.0, [60.0, 0.0, 0.0])?;
    fov.insert_translation(4.0, [45.0, 0.0, 0.0])?;

    let mut motion = Motion::new("orbit");
    motion.add_path("camera", camera);
    motion.add_path("fov", fov);
    motion.insert_event(0.0, "orbit_start")?;
    motion.insert_event(1.5, "flash")?;
    motion.insert_event(3.0, "explosion")?;
    Ok(motion)
}

/// Cut 1: a three second dolly towards the origin
fn dolly() -> Result<Motion> {
    let mut camera = Path::new(TranslationInterpolation::HermiteZeroDerivative, RotationInterpolation::Slerp, false);
    camera.insert_keyframe(ChannelMask::All, 0.0, Pose::from_translation([0.0, 2.0, -10.0]))?;
    camera.insert_keyframe(ChannelMask::All, 3.0, Pose::from_translation([0.0, 1.5, -2.0]))?;

    let mut motion = Motion::new("dolly");
    motion.add_path("camera", camera);
    motion.insert_event(1.5, "door_open")?;
    Ok(motion)
}

/// The sample cuts in playback order
pub fn demo_motions() -> Result<Vec<Motion>> {
    Ok(vec![orbit()?, dolly()?])
}

/// Write the sample cuts, optionally echoing them as RON
pub fn write_demo(output: &std::path::Path, ron: bool) -> Result<()> {
    let motions = demo_motions()?;
    save_motion_file(output, &motions)?;
    tracing::info!("Wrote {} motions to {:?}", motions.len(), output);
    if ron {
        for motion in &motions {
            println!("{}", to_ron_string(motion)?);
        }
    }
    Ok(())
}
