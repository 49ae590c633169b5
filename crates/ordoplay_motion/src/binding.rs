// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary with the host engine: entity handles, pose output and event callbacks.

use crate::event::Event;
use crate::keyframe::Pose;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle of an animated entity owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// What an event is anchored to when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventOrigin {
    /// Relative to the animated transform (camera playback within a cut)
    Transform,
    /// Relative to the owning object (blended motions, entering a new cut)
    Object,
}

/// Receiver of fired events
pub trait EventSink {
    /// Called once per event crossed, in chronological order
    fn on_event(&mut self, origin: EventOrigin, subject: EntityId, event: &Event);
}

impl<F> EventSink for F
where
    F: FnMut(EventOrigin, EntityId, &Event),
{
    fn on_event(&mut self, origin: EventOrigin, subject: EntityId, event: &Event) {
        self(origin, subject, event);
    }
}

/// A fired event as recorded by [`EventLog`]
#[derive(Debug, Clone, PartialEq)]
pub struct FiredEvent {
    /// Origin the event fired with
    pub origin: EventOrigin,
    /// Entity the event fired for
    pub subject: EntityId,
    /// Event time within its motion
    pub time: f32,
    /// Event label
    pub label: String,
}

/// Sink that records every event it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events in firing order
    pub fired: Vec<FiredEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in firing order
    pub fn labels(&self) -> Vec<&str> {
        self.fired.iter().map(|e| e.label.as_str()).collect()
    }

    /// Take all recorded events, leaving the log empty
    pub fn take(&mut self) -> Vec<FiredEvent> {
        std::mem::take(&mut self.fired)
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, origin: EventOrigin, subject: EntityId, event: &Event) {
        self.fired.push(FiredEvent {
            origin,
            subject,
            time: event.time,
            label: event.label.clone(),
        });
    }
}

/// Receiver of sampled poses
pub trait PoseTarget {
    /// Push a pose onto the entity
    fn apply_pose(&mut self, entity: EntityId, pose: &Pose);

    /// Push a field of view, for cameras whose motion carries one
    fn set_field_of_view(&mut self, _entity: EntityId, _fov: f32) {}
}

/// Target that remembers the last pose and field of view it received
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LastPose {
    /// Most recent pose
    pub pose: Option<Pose>,
    /// Most recent field of view
    pub fov: Option<f32>,
}

impl PoseTarget for LastPose {
    fn apply_pose(&mut self, _entity: EntityId, pose: &Pose) {
        self.pose = Some(*pose);
    }

    fn set_field_of_view(&mut self, _entity: EntityId, fov: f32) {
        self.fov = Some(fov);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventId;

    fn event(time: f32, label: &str) -> Event {
        Event { id: EventId::new(), time, label: label.to_string() }
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |origin: EventOrigin, _subject: EntityId, e: &Event| {
            seen.push((origin, e.label.clone()));
        };
        sink.on_event(EventOrigin::Object, EntityId::new(), &event(1.0, "boom"));
        assert_eq!(seen, vec![(EventOrigin::Object, "boom".to_string())]);
    }

    #[test]
    fn test_event_log_take() {
        let mut log = EventLog::new();
        let subject = EntityId::new();
        log.on_event(EventOrigin::Transform, subject, &event(0.5, "a"));
        assert_eq!(log.labels(), vec!["a"]);
        let taken = log.take();
        assert_eq!(taken[0].subject, subject);
        assert!(log.fired.is_empty());
    }
}
