// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channel sampling: time reduction, key bracketing and curve evaluation.
//!
//! All functions here are pure. A channel is a slice of keys sorted by
//! ascending, unique time; the callers in [`crate::path`] keep that invariant.

use crate::keyframe::{
    Interpolation, Keyframe, Pose, RotationInterpolation, RotationKey, TranslationInterpolation,
    TranslationKey,
};
use serde::{Deserialize, Serialize};

/// Closed time interval covered by a path or motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeExtent {
    /// Time of the first key
    pub start: f32,
    /// Time of the last key
    pub end: f32,
}

impl TimeExtent {
    /// Create an extent
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Length in seconds
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Whether the extent can be used for wraparound
    pub fn is_degenerate(&self) -> bool {
        let len = self.length();
        len.is_nan() || len <= 0.0
    }

    /// Whether `time` lies inside the closed interval
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start && time <= self.end
    }

    /// Reduce `time` into `[start, end)` by modulo
    pub fn wrap(&self, time: f32) -> f32 {
        if time >= self.start && time < self.end {
            return time;
        }
        let len = self.length();
        if len <= 0.0 {
            return self.start;
        }
        let wrapped = self.start + (time - self.start).rem_euclid(len);
        // rem_euclid can round up to `len` for tiny negative offsets
        if wrapped >= self.end {
            self.start
        } else {
            wrapped
        }
    }

    /// Clamp `time` into `[start, end]`
    pub fn clamp(&self, time: f32) -> f32 {
        time.clamp(self.start, self.end)
    }

    /// Smallest extent covering both
    pub fn union(&self, other: &TimeExtent) -> TimeExtent {
        TimeExtent {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Extent of a single channel, `None` when it has no keys
pub fn channel_extent<T>(keys: &[Keyframe<T>]) -> Option<TimeExtent> {
    let first = keys.first()?;
    let last = keys.last()?;
    Some(TimeExtent::new(first.time, last.time))
}

/// Where a query time falls within a channel
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bracket {
    /// Exactly on (or clamped to) a key
    Key(usize),
    /// Strictly between key `index` and `index + 1`, with normalized parameter
    Between(usize, f32),
}

fn bracket<T>(keys: &[Keyframe<T>], time: f32) -> Option<Bracket> {
    let last = keys.len().checked_sub(1)?;
    if time <= keys[0].time {
        return Some(Bracket::Key(0));
    }
    if time >= keys[last].time {
        return Some(Bracket::Key(last));
    }

    // Number of keys at or before `time`; zero only for NaN
    let after = keys.partition_point(|k| k.time <= time);
    let index = after.checked_sub(1)?;
    let a = &keys[index];
    if a.time == time {
        return Some(Bracket::Key(index));
    }
    let b = &keys[index + 1];
    Some(Bracket::Between(index, (time - a.time) / (b.time - a.time)))
}

/// Neighbor of key `index`, the following one when `forward`, with its time.
/// Looping channels treat the first and last key as the same point.
fn neighbor<T: Copy>(keys: &[Keyframe<T>], index: usize, forward: bool, looped: bool) -> Option<(T, f32)> {
    let n = keys.len();
    if forward {
        if index + 1 < n {
            return Some((keys[index + 1].value, keys[index + 1].time));
        }
        if looped && n >= 3 {
            let len = keys[n - 1].time - keys[0].time;
            return Some((keys[1].value, keys[1].time + len));
        }
    } else {
        if index > 0 {
            return Some((keys[index - 1].value, keys[index - 1].time));
        }
        if looped && n >= 3 {
            let len = keys[n - 1].time - keys[0].time;
            return Some((keys[n - 2].value, keys[n - 2].time - len));
        }
    }
    None
}

fn sub3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale3(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Tangent at a translation key in units per second
fn tangent(keys: &[TranslationKey], index: usize, looped: bool) -> [f32; 3] {
    let key = &keys[index];
    let prev = neighbor(keys, index, false, looped);
    let next = neighbor(keys, index, true, looped);
    match (prev, next) {
        (Some((pv, pt)), Some((nv, nt))) => scale3(sub3(nv, pv), 1.0 / (nt - pt)),
        (None, Some((nv, nt))) => scale3(sub3(nv, key.value), 1.0 / (nt - key.time)),
        (Some((pv, pt)), None) => scale3(sub3(key.value, pv), 1.0 / (key.time - pt)),
        (None, None) => [0.0; 3],
    }
}

/// Sample a translation channel; an empty channel yields the origin
pub fn sample_translation(
    keys: &[TranslationKey],
    mode: TranslationInterpolation,
    looped: bool,
    time: f32,
) -> [f32; 3] {
    let Some(bracket) = bracket(keys, time) else {
        return Pose::IDENTITY.translation;
    };
    let (index, t) = match bracket {
        Bracket::Key(index) => return keys[index].value,
        Bracket::Between(index, t) => (index, t),
    };

    let a = &keys[index];
    let b = &keys[index + 1];
    match mode {
        TranslationInterpolation::Linear => Interpolation::lerp_vec3(a.value, b.value, t),
        TranslationInterpolation::Hermite => {
            let dt = b.time - a.time;
            let m0 = scale3(tangent(keys, index, looped), dt);
            let m1 = scale3(tangent(keys, index + 1, looped), dt);
            Interpolation::hermite_vec3(a.value, m0, b.value, m1, t)
        }
        TranslationInterpolation::HermiteZeroDerivative => {
            Interpolation::hermite_vec3(a.value, [0.0; 3], b.value, [0.0; 3], t)
        }
    }
}

/// Squad inner control point for rotation key `index`
fn squad_control(keys: &[RotationKey], index: usize, looped: bool) -> [f32; 4] {
    let q = keys[index].value;
    let prev = neighbor(keys, index, false, looped).map_or(q, |(v, _)| v);
    let next = neighbor(keys, index, true, looped).map_or(q, |(v, _)| v);
    Interpolation::squad_control(prev, q, next)
}

/// Sample a rotation channel; an empty channel yields identity
pub fn sample_rotation(
    keys: &[RotationKey],
    mode: RotationInterpolation,
    looped: bool,
    time: f32,
) -> [f32; 4] {
    let Some(bracket) = bracket(keys, time) else {
        return Pose::IDENTITY.rotation;
    };
    let (index, t) = match bracket {
        Bracket::Key(index) => return keys[index].value,
        Bracket::Between(index, t) => (index, t),
    };

    let a = keys[index].value;
    let b = keys[index + 1].value;
    match mode {
        RotationInterpolation::Linear => Interpolation::nlerp(a, b, t),
        RotationInterpolation::Slerp => Interpolation::slerp(a, b, t),
        RotationInterpolation::Squad => {
            let s0 = squad_control(keys, index, looped);
            let s1 = squad_control(keys, index + 1, looped);
            Interpolation::squad(a, b, s0, s1, t)
        }
    }
}
