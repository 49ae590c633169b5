// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions, poses and interpolation math.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single keyframe channel of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Position keys
    Translation,
    /// Orientation keys
    Rotation,
}

impl Channel {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translation => "Translation",
            Self::Rotation => "Rotation",
        }
    }
}

/// Which channels a keyframe write applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMask {
    /// Translation channel only
    Translation,
    /// Rotation channel only
    Rotation,
    /// Both channels at once
    All,
}

impl ChannelMask {
    /// Channels covered by this mask, translation first
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Self::Translation => &[Channel::Translation],
            Self::Rotation => &[Channel::Rotation],
            Self::All => &[Channel::Translation, Channel::Rotation],
        }
    }

    /// Whether the mask covers a channel
    pub fn contains(&self, channel: Channel) -> bool {
        self.channels().contains(&channel)
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Translation => Self::Translation,
            Channel::Rotation => Self::Rotation,
        }
    }
}

/// Interpolation used between translation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TranslationInterpolation {
    /// Straight line between keys
    Linear,
    /// Smooth curve through the keys (Catmull-Rom tangents)
    #[default]
    Hermite,
    /// Hermite with zero tangents, eases in and out of every key
    HermiteZeroDerivative,
}

/// Interpolation used between rotation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationInterpolation {
    /// Normalized linear blend
    Linear,
    /// Spherical linear interpolation
    #[default]
    Slerp,
    /// Spherical cubic interpolation through neighboring keys
    Squad,
}

/// Position and orientation sampled from a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position (x, y, z)
    pub translation: [f32; 3],
    /// Rotation quaternion (x, y, z, w)
    pub rotation: [f32; 4],
}

impl Pose {
    /// Identity pose: origin, no rotation
    pub const IDENTITY: Pose = Pose {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    /// Create a pose
    pub fn new(translation: [f32; 3], rotation: [f32; 4]) -> Self {
        Self { translation, rotation }
    }

    /// Pose with the given position and no rotation
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self { translation, rotation: Self::IDENTITY.rotation }
    }

    /// Pose at the origin with the given rotation
    pub fn from_rotation(rotation: [f32; 4]) -> Self {
        Self { translation: Self::IDENTITY.translation, rotation }
    }

    /// Weighted blend towards `other`; weight 0 keeps `self`, 1 yields `other`
    pub fn blend(&self, other: &Pose, weight: f32) -> Pose {
        if weight <= 0.0 {
            return *self;
        }
        if weight >= 1.0 {
            return *other;
        }
        Pose {
            translation: Interpolation::lerp_vec3(self.translation, other.translation, weight),
            rotation: Interpolation::slerp(self.rotation, other.rotation, weight),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A keyframe in one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Time in seconds
    pub time: f32,
    /// Value at this keyframe
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a new keyframe
    pub fn new(time: f32, value: T) -> Self {
        Self {
            id: KeyframeId::new(),
            time,
            value,
        }
    }
}

/// Key in the translation channel
pub type TranslationKey = Keyframe<[f32; 3]>;

/// Key in the rotation channel
pub type RotationKey = Keyframe<[f32; 4]>;

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Interpolate Vec3
    pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Interpolate Vec4
    pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }

    /// Hermite spline interpolation
    pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Hermite interpolation of Vec3, tangents already scaled to the segment length
    pub fn hermite_vec3(p0: [f32; 3], m0: [f32; 3], p1: [f32; 3], m1: [f32; 3], t: f32) -> [f32; 3] {
        [
            Self::hermite(p0[0], m0[0], p1[0], m1[0], t),
            Self::hermite(p0[1], m0[1], p1[1], m1[1], t),
            Self::hermite(p0[2], m0[2], p1[2], m1[2], t),
        ]
    }

    /// Four-component dot product
    pub fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
    }

    /// Normalize a quaternion; a zero quaternion becomes identity
    pub fn normalize(q: [f32; 4]) -> [f32; 4] {
        let len = Self::dot4(q, q).sqrt();
        if len <= f32::EPSILON {
            return Pose::IDENTITY.rotation;
        }
        [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
    }

    /// Normalized linear interpolation for quaternions (shortest arc)
    pub fn nlerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        let b = if Self::dot4(a, b) < 0.0 { Self::negate(b) } else { b };
        Self::normalize(Self::lerp_vec4(a, b, t))
    }

    /// Spherical linear interpolation for quaternions (shortest arc)
    pub fn slerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        let mut dot = Self::dot4(a, b);

        // Handle opposite quaternions
        let mut b = b;
        if dot < 0.0 {
            b = Self::negate(b);
            dot = -dot;
        }

        // Use lerp for very close quaternions
        if dot > 0.9995 {
            return Self::normalize(Self::lerp_vec4(a, b, t));
        }

        let theta_0 = dot.acos();
        let sin_theta_0 = theta_0.sin();
        let s0 = ((1.0 - t) * theta_0).sin() / sin_theta_0;
        let s1 = (t * theta_0).sin() / sin_theta_0;

        [
            a[0] * s0 + b[0] * s1,
            a[1] * s0 + b[1] * s1,
            a[2] * s0 + b[2] * s1,
            a[3] * s0 + b[3] * s1,
        ]
    }

    /// Spherical cubic interpolation between `q1` and `q2` with inner controls `s1`, `s2`
    pub fn squad(q1: [f32; 4], q2: [f32; 4], s1: [f32; 4], s2: [f32; 4], t: f32) -> [f32; 4] {
        let outer = Self::slerp(q1, q2, t);
        let inner = Self::slerp(s1, s2, t);
        Self::slerp(outer, inner, 2.0 * t * (1.0 - t))
    }

    /// Inner squad control point for `q` given its neighbors
    pub fn squad_control(prev: [f32; 4], q: [f32; 4], next: [f32; 4]) -> [f32; 4] {
        let prev = Self::align(q, prev);
        let next = Self::align(q, next);
        let inv = Self::conjugate(q);
        let l_next = Self::log(Self::mul(inv, next));
        let l_prev = Self::log(Self::mul(inv, prev));
        let sum = [
            -(l_next[0] + l_prev[0]) * 0.25,
            -(l_next[1] + l_prev[1]) * 0.25,
            -(l_next[2] + l_prev[2]) * 0.25,
            0.0,
        ];
        Self::normalize(Self::mul(q, Self::exp(sum)))
    }

    /// Hamilton product `a * b`
    pub fn mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
        let [ax, ay, az, aw] = a;
        let [bx, by, bz, bw] = b;
        [
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        ]
    }

    /// Conjugate (the inverse of a unit quaternion)
    pub fn conjugate(q: [f32; 4]) -> [f32; 4] {
        [-q[0], -q[1], -q[2], q[3]]
    }

    fn negate(q: [f32; 4]) -> [f32; 4] {
        [-q[0], -q[1], -q[2], -q[3]]
    }

    /// Flip `q` into the hemisphere of `reference`
    fn align(reference: [f32; 4], q: [f32; 4]) -> [f32; 4] {
        if Self::dot4(reference, q) < 0.0 {
            Self::negate(q)
        } else {
            q
        }
    }

    /// Logarithm of a unit quaternion (pure quaternion result)
    fn log(q: [f32; 4]) -> [f32; 4] {
        let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt();
        if len <= f32::EPSILON {
            return [0.0, 0.0, 0.0, 0.0];
        }
        let angle = len.atan2(q[3]);
        let s = angle / len;
        [q[0] * s, q[1] * s, q[2] * s, 0.0]
    }

    /// Exponential of a pure quaternion
    fn exp(q: [f32; 4]) -> [f32; 4] {
        let angle = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt();
        if angle <= f32::EPSILON {
            return Self::normalize([q[0], q[1], q[2], 1.0]);
        }
        let s = angle.sin() / angle;
        [q[0] * s, q[1] * s, q[2] * s, angle.cos()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUARTER_TURN_Y: [f32; 4] = [0.0, std::f32::consts::FRAC_1_SQRT_2, 0.0, std::f32::consts::FRAC_1_SQRT_2];

    fn approx4(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_channel_mask() {
        assert!(ChannelMask::All.contains(Channel::Rotation));
        assert!(ChannelMask::All.contains(Channel::Translation));
        assert!(!ChannelMask::Rotation.contains(Channel::Translation));
        assert_eq!(ChannelMask::from(Channel::Rotation), ChannelMask::Rotation);
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = Pose::IDENTITY.rotation;
        assert_eq!(Interpolation::slerp(a, QUARTER_TURN_Y, 0.0), a);
        assert!(approx4(Interpolation::slerp(a, QUARTER_TURN_Y, 1.0), QUARTER_TURN_Y));
    }

    #[test]
    fn test_slerp_midpoint_is_unit() {
        let mid = Interpolation::slerp(Pose::IDENTITY.rotation, QUARTER_TURN_Y, 0.5);
        let len = Interpolation::dot4(mid, mid).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        // Half of a quarter turn around Y
        let half = std::f32::consts::FRAC_PI_8;
        assert!(approx4(mid, [0.0, half.sin(), 0.0, half.cos()]));
    }

    #[test]
    fn test_slerp_takes_shortest_arc() {
        let negated = [-QUARTER_TURN_Y[0], -QUARTER_TURN_Y[1], -QUARTER_TURN_Y[2], -QUARTER_TURN_Y[3]];
        let a = Interpolation::slerp(Pose::IDENTITY.rotation, QUARTER_TURN_Y, 0.5);
        let b = Interpolation::slerp(Pose::IDENTITY.rotation, negated, 0.5);
        assert!(approx4(a, b));
    }

    #[test]
    fn test_hermite_endpoints() {
        assert_eq!(Interpolation::hermite(2.0, 5.0, 7.0, -3.0, 0.0), 2.0);
        assert_eq!(Interpolation::hermite(2.0, 5.0, 7.0, -3.0, 1.0), 7.0);
    }

    #[test]
    fn test_squad_control_of_collinear_keys_is_key() {
        // Evenly spaced rotations about one axis need no correction
        let q0 = Pose::IDENTITY.rotation;
        let q1 = Interpolation::slerp(q0, QUARTER_TURN_Y, 0.5);
        let s = Interpolation::squad_control(q0, q1, QUARTER_TURN_Y);
        assert!(approx4(s, q1));
    }

    #[test]
    fn test_pose_blend_weights() {
        let a = Pose::from_translation([0.0, 0.0, 0.0]);
        let b = Pose::new([10.0, 0.0, 0.0], QUARTER_TURN_Y);
        assert_eq!(a.blend(&b, 0.0), a);
        assert_eq!(a.blend(&b, 1.0), b);
        let mid = a.blend(&b, 0.25);
        assert!((mid.translation[0] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_conjugate_inverts_unit_rotation() {
        let q = Interpolation::slerp(Pose::IDENTITY.rotation, QUARTER_TURN_Y, 0.3);
        let product = Interpolation::mul(q, Interpolation::conjugate(q));
        assert!(approx4(product, Pose::IDENTITY.rotation));
        assert_eq!(Pose::from_rotation(q).translation, [0.0; 3]);
    }
}
