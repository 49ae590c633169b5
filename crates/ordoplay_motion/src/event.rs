// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event tracks: time-stamped labels that trigger external side effects.

use crate::error::{MotionError, Result};
use crate::path::check_time;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Unique identifier for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new random event ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Time of the event
    pub time: f32,
    /// Label handed to the trigger callback
    pub label: String,
}

/// Events of one motion, sorted by time.
///
/// Events at equal times keep their insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTrack {
    events: Vec<Event>,
}

impl EventTrack {
    /// Create an empty event track
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event
    pub fn insert(&mut self, time: f32, label: impl Into<String>) -> Result<EventId> {
        check_time(time)?;
        let id = EventId::new();
        self.events.try_reserve(1)?;
        let at = self.events.partition_point(|e| e.time <= time);
        self.events.insert(at, Event { id, time, label: label.into() });
        Ok(id)
    }

    /// Remove the event closest to `time`
    pub fn delete_nearest(&mut self, time: f32) -> Result<Event> {
        let index = self.nearest_index(time).ok_or(MotionError::EventNotFound)?;
        Ok(self.events.remove(index))
    }

    /// Remove an event by id
    pub fn delete(&mut self, id: EventId) -> Result<Event> {
        let index = self.index_of(id).ok_or(MotionError::EventIdNotFound(id))?;
        Ok(self.events.remove(index))
    }

    /// Move an event to a new time, keeping its id and label
    pub fn set_time(&mut self, id: EventId, time: f32) -> Result<()> {
        check_time(time)?;
        let mut event = self.delete(id)?;
        event.time = time;
        let at = self.events.partition_point(|e| e.time <= time);
        self.events.insert(at, event);
        Ok(())
    }

    /// Event closest to `time`; ties go to the earlier event
    pub fn nearest(&self, time: f32) -> Option<&Event> {
        self.nearest_index(time).map(|i| &self.events[i])
    }

    fn nearest_index(&self, time: f32) -> Option<usize> {
        let at = self.events.partition_point(|e| e.time < time);
        let before = at.checked_sub(1);
        let after = (at < self.events.len()).then_some(at);
        match (before, after) {
            (Some(b), Some(a)) => {
                let db = time - self.events[b].time;
                let da = self.events[a].time - time;
                Some(if da < db { a } else { b })
            }
            (Some(i), None) | (None, Some(i)) => Some(i),
            (None, None) => None,
        }
    }

    /// Index of an event by id
    pub fn index_of(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    /// Event by id
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Whether an event exists at exactly `time`
    pub fn has_event_at(&self, time: f32) -> bool {
        let at = self.events.partition_point(|e| e.time < time);
        self.events.get(at).is_some_and(|e| e.time == time)
    }

    /// Events whose time lies in `[start, end)`, in ascending order.
    ///
    /// Every call starts a fresh iteration; an empty or inverted interval
    /// yields nothing.
    pub fn range(&self, start: f32, end: f32) -> EventIter<'_> {
        if start.partial_cmp(&end) != Some(Ordering::Less) {
            return EventIter { events: &[] };
        }
        let lo = self.events.partition_point(|e| e.time < start);
        let hi = self.events.partition_point(|e| e.time < end);
        EventIter { events: &self.events[lo..hi] }
    }

    /// All events in time order
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the track has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check ordering and time invariants, used after loading
    pub fn validate(&self) -> Result<()> {
        for event in &self.events {
            check_time(event.time)?;
        }
        if self.events.windows(2).any(|w| w[0].time > w[1].time) {
            return Err(MotionError::Unsorted("events".to_string()));
        }
        Ok(())
    }
}

/// Iterator over the events of a half-open time interval
#[derive(Debug, Clone)]
pub struct EventIter<'a> {
    events: &'a [Event],
}

impl<'a> Iterator for EventIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.events.split_first()?;
        self.events = rest;
        Some(first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.events.len(), Some(self.events.len()))
    }
}

impl ExactSizeIterator for EventIter<'_> {}
