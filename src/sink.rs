//! Hand-off of per-frame events to whatever draws, logs or snapshots them.

use std::time::Duration;

use crate::types::{BoundingBox, Frame, FrameEvents, MatchResult};

pub trait EventSink {
    fn face_recognized(&mut self, result: &MatchResult);

    /// `crop` is the face region clamped to the frame, or `None` when nothing
    /// of it lies inside the frame and no snapshot should be taken.
    fn face_unknown(&mut self, result: &MatchResult, crop: Option<BoundingBox>);

    fn fall_confirmed(&mut self, timestamp: Duration, frame_width: u32, frame_height: u32);
}

pub fn dispatch<S: EventSink + ?Sized>(events: &FrameEvents, frame: &Frame, sink: &mut S) {
    for result in &events.matches {
        if result.label.is_unknown() {
            let crop = result.bounding_box.clamp_to(frame.width, frame.height);
            sink.face_unknown(result, crop);
        } else {
            sink.face_recognized(result);
        }
    }
    if events.fall_confirmed {
        sink.fall_confirmed(frame.timestamp, frame.width, frame.height);
    }
}

/// Logs every event through `tracing` and keeps running totals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TracingSink {
    pub recognized: u64,
    pub unknown: u64,
    pub unknown_snapshots: u64,
    pub falls: u64,
}

impl EventSink for TracingSink {
    fn face_recognized(&mut self, result: &MatchResult) {
        self.recognized += 1;
        tracing::info!(name = %result.label, distance = result.distance, "face recognized");
    }

    fn face_unknown(&mut self, result: &MatchResult, crop: Option<BoundingBox>) {
        self.unknown += 1;
        match crop {
            Some(region) => {
                self.unknown_snapshots += 1;
                tracing::warn!(?region, "unknown face detected");
            }
            None => tracing::warn!(bbox = ?result.bounding_box, "unknown face detected outside frame"),
        }
    }

    fn fall_confirmed(&mut self, timestamp: Duration, frame_width: u32, frame_height: u32) {
        self.falls += 1;
        tracing::error!(
            severity = "critical",
            at_secs = timestamp.as_secs_f64(),
            frame_width,
            frame_height,
            "fall detected"
        );
    }
}
