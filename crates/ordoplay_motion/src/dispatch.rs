// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event dispatch over the time span advanced in one tick.

use crate::binding::{EntityId, EventOrigin, EventSink};
use crate::motion::Motion;
use crate::sampler::TimeExtent;

/// Fire every event of `motion` in `[start, end)`, in ascending time order.
///
/// Returns the number of events fired. An empty or inverted interval fires
/// nothing; wrapped spans go through [`dispatch_span`].
pub fn process_events<S>(
    sink: &mut S,
    origin: EventOrigin,
    subject: EntityId,
    motion: &Motion,
    start: f32,
    end: f32,
) -> usize
where
    S: EventSink + ?Sized,
{
    let mut fired = 0;
    for event in motion.setup_event_iterator(start, end) {
        tracing::trace!("Event '{}' at t={} ({:?})", event.label, event.time, origin);
        sink.on_event(origin, subject, event);
        fired += 1;
    }
    fired
}

/// Fire the events crossed when playback moved from `start` to `end` within `extent`.
///
/// If `end < start` the playhead wrapped, and the span is fired as
/// `[start, extent.end)` followed by `[extent.start, end)`.
pub fn dispatch_span<S>(
    sink: &mut S,
    origin: EventOrigin,
    subject: EntityId,
    motion: &Motion,
    extent: TimeExtent,
    start: f32,
    end: f32,
) -> usize
where
    S: EventSink + ?Sized,
{
    if end < start {
        dispatch_wrapped(sink, origin, subject, motion, extent, start, end)
    } else {
        process_events(sink, origin, subject, motion, start, end)
    }
}

/// Fire the events crossed by a span known to have passed `extent.end`.
///
/// Fires `[start, extent.end)` then `[extent.start, end)`. With `end == start`
/// this is exactly one full loop.
pub fn dispatch_wrapped<S>(
    sink: &mut S,
    origin: EventOrigin,
    subject: EntityId,
    motion: &Motion,
    extent: TimeExtent,
    start: f32,
    end: f32,
) -> usize
where
    S: EventSink + ?Sized,
{
    process_events(sink, origin, subject, motion, start, extent.end)
        + process_events(sink, origin, subject, motion, extent.start, end)
}
