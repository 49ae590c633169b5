// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chains of named path points placed in a level.
//!
//! Each point names its successor. A chain either ends at a point without a
//! successor or closes back onto its first point. Any other cycle is caught
//! by the iteration ceiling and reported as an infinite loop.

use crate::config::{MotionConfig, DEFAULT_CHAIN_LIMIT};
use crate::error::{MotionError, Result};
use crate::keyframe::{ChannelMask, Pose, RotationInterpolation, TranslationInterpolation};
use crate::path::Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named point of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Unique point name
    pub name: String,
    /// Position (x, y, z)
    pub position: [f32; 3],
    /// Orientation quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    /// Name of the following point
    pub next: Option<String>,
    /// Seconds to travel to the following point; derived from speed when absent
    pub segment_time: Option<f32>,
}

impl PathPoint {
    /// Create an unlinked point with identity orientation
    pub fn new(name: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            position,
            rotation: Pose::IDENTITY.rotation,
            next: None,
            segment_time: None,
        }
    }

    /// Link to the following point
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Set the orientation
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the travel time to the following point
    pub fn with_segment_time(mut self, seconds: f32) -> Self {
        self.segment_time = Some(seconds);
        self
    }

    fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }
}

/// Points visited from a start point
#[derive(Debug, Clone)]
pub struct ChainWalk<'a> {
    /// Points in travel order, start first
    pub points: Vec<&'a PathPoint>,
    /// Whether the last point links back to the start
    pub closed: bool,
}

/// How a chain converts to a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainTiming {
    /// Travel speed in units per second, for segments without a set time
    pub speed: Option<f32>,
    /// Translation interpolation of the built path
    pub translation: TranslationInterpolation,
    /// Rotation interpolation of the built path
    pub rotation: RotationInterpolation,
}

impl Default for ChainTiming {
    fn default() -> Self {
        Self {
            speed: None,
            translation: TranslationInterpolation::Hermite,
            rotation: RotationInterpolation::Slerp,
        }
    }
}

/// A set of path points addressed by name
#[derive(Debug, Clone)]
pub struct PathPointChain {
    points: IndexMap<String, PathPoint>,
    iteration_limit: usize,
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

impl PathPointChain {
    /// Create an empty set with the given traversal ceiling
    pub fn new(iteration_limit: usize) -> Self {
        Self {
            points: IndexMap::new(),
            iteration_limit,
        }
    }

    /// Create an empty set using the configured ceiling
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.chain_iteration_limit)
    }

    /// Add a point, returning any point it replaced
    pub fn add(&mut self, point: PathPoint) -> Option<PathPoint> {
        self.points.insert(point.name.clone(), point)
    }

    /// Get a point by name
    pub fn get(&self, name: &str) -> Option<&PathPoint> {
        self.points.get(name)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&PathPoint> {
        self.points
            .get(name)
            .ok_or_else(|| MotionError::PathPointNotFound(name.to_string()))
    }

    /// Follow the chain from `start`
    pub fn walk(&self, start: &str) -> Result<ChainWalk<'_>> {
        let mut current = self.lookup(start)?;
        let mut points = Vec::new();
        loop {
            if points.len() >= self.iteration_limit {
                tracing::warn!("Path point chain from '{}' exceeded {} points", start, self.iteration_limit);
                return Err(MotionError::InfiniteLoop {
                    start: start.to_string(),
                    limit: self.iteration_limit,
                });
            }
            points.push(current);
            match current.next.as_deref() {
                None => return Ok(ChainWalk { points, closed: false }),
                Some(next) if next == start => return Ok(ChainWalk { points, closed: true }),
                Some(next) => current = self.lookup(next)?,
            }
        }
    }

    /// Build a path visiting the chain from `start`.
    ///
    /// A closed chain yields a looped path that returns to the start point.
    /// Segment durations come from each point's `segment_time`, or from the
    /// segment length divided by `timing.speed`.
    pub fn to_path(&self, start: &str, timing: ChainTiming) -> Result<Path> {
        let walk = self.walk(start)?;
        let mut stops: Vec<&PathPoint> = walk.points.clone();
        if walk.closed {
            stops.push(walk.points[0]);
        }

        let mut path = Path::new(timing.translation, timing.rotation, walk.closed);
        let mut time = 0.0;
        path.insert_keyframe(ChannelMask::All, time, stops[0].pose())?;
        for pair in stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let duration = match (from.segment_time, timing.speed) {
                (Some(seconds), _) => seconds,
                (None, Some(speed)) if speed.is_finite() && speed > 0.0 => {
                    distance(from.position, to.position) / speed
                }
                (None, speed) => return Err(MotionError::InvalidPlaybackRate(speed.unwrap_or(0.0))),
            };
            time += duration;
            path.insert_keyframe(ChannelMask::All, time, to.pose())?;
        }
        Ok(path)
    }
}

impl Default for PathPointChain {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Channel;

    fn open_chain() -> PathPointChain {
        let mut chain = PathPointChain::default();
        chain.add(PathPoint::new("a", [0.0, 0.0, 0.0]).with_next("b"));
        chain.add(PathPoint::new("b", [3.0, 4.0, 0.0]).with_next("c"));
        chain.add(PathPoint::new("c", [3.0, 4.0, 10.0]));
        chain
    }

    #[test]
    fn test_walk_open_chain() {
        let chain = open_chain();
        let walk = chain.walk("a").unwrap();
        let names: Vec<_> = walk.points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!walk.closed);
    }

    #[test]
    fn test_walk_closed_chain() {
        let mut chain = open_chain();
        chain.add(PathPoint::new("c", [3.0, 4.0, 10.0]).with_next("a"));
        let walk = chain.walk("a").unwrap();
        assert!(walk.closed);
        assert_eq!(walk.points.len(), 3);
    }

    #[test]
    fn test_cycle_not_through_start_is_caught() {
        let mut chain = open_chain();
        chain.add(PathPoint::new("c", [3.0, 4.0, 10.0]).with_next("b"));
        assert!(matches!(
            chain.walk("a"),
            Err(MotionError::InfiniteLoop { limit: 1000, .. })
        ));
    }

    #[test]
    fn test_iteration_limit_applies() {
        let mut chain = PathPointChain::new(2);
        chain.add(PathPoint::new("a", [0.0; 3]).with_next("b"));
        chain.add(PathPoint::new("b", [0.0; 3]).with_next("c"));
        chain.add(PathPoint::new("c", [0.0; 3]));
        assert!(matches!(chain.walk("a"), Err(MotionError::InfiniteLoop { limit: 2, .. })));
        assert!(chain.walk("b").is_ok());
    }

    #[test]
    fn test_missing_successor() {
        let mut chain = PathPointChain::default();
        chain.add(PathPoint::new("a", [0.0; 3]).with_next("ghost"));
        assert!(matches!(chain.walk("a"), Err(MotionError::PathPointNotFound(name)) if name == "ghost"));
        assert!(matches!(chain.walk("nobody"), Err(MotionError::PathPointNotFound(_))));
    }

    #[test]
    fn test_to_path_times_by_distance() {
        let chain = open_chain();
        let timing = ChainTiming { speed: Some(5.0), ..ChainTiming::default() };
        let path = chain.to_path("a", timing).unwrap();
        let times: Vec<_> = path.translation_keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 3.0]);
        assert!(!path.is_looped());
        assert_eq!(path.keyframe_count(Channel::Rotation), 3);
    }

    #[test]
    fn test_closed_chain_builds_looped_path() {
        let mut chain = PathPointChain::default();
        chain.add(PathPoint::new("a", [0.0; 3]).with_next("b").with_segment_time(2.0));
        chain.add(PathPoint::new("b", [1.0; 3]).with_next("a").with_segment_time(3.0));
        let path = chain.to_path("a", ChainTiming::default()).unwrap();
        assert!(path.is_looped());
        let times: Vec<_> = path.translation_keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 5.0]);
        assert_eq!(path.translation_keys()[2].value, [0.0; 3]);
    }

    #[test]
    fn test_to_path_needs_timing() {
        let chain = open_chain();
        assert!(matches!(
            chain.to_path("a", ChainTiming::default()),
            Err(MotionError::InvalidPlaybackRate(_))
        ));
    }

    #[test]
    fn test_point_orientation_becomes_rotation_key() {
        let facing = [0.0, 0.0, 2.0, 0.0];
        let mut chain = PathPointChain::default();
        chain.add(PathPoint::new("a", [0.0; 3]).with_next("b").with_segment_time(1.0));
        chain.add(PathPoint::new("b", [1.0, 0.0, 0.0]).with_rotation(facing));
        let path = chain.to_path("a", ChainTiming::default()).unwrap();
        assert_eq!(path.rotation_keys()[1].value, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(chain.get("b").unwrap().rotation, facing);
    }
}
