use std::time::Duration;

use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::fall::FallStateMachine;
use crate::matcher::FaceMatcher;
use crate::store::EncodingStore;
use crate::types::{FaceObservation, FallState, Frame, FrameEvents, PoseLandmarks, PostureSample};

/// Per-frame driver for face matching and fall detection.
///
/// Owns the frozen store and the only fall state of the run.
pub struct FrameAnalyzer {
    store: EncodingStore,
    matcher: FaceMatcher,
    fall: FallStateMachine,
    detection_downscale: f64,
}

impl FrameAnalyzer {
    pub fn new(store: EncodingStore, config: &MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            matcher: FaceMatcher::new(config.face_distance_threshold),
            fall: FallStateMachine::new(config.fall_params()?),
            detection_downscale: config.detection_downscale,
        })
    }

    pub fn store(&self) -> &EncodingStore {
        &self.store
    }

    pub fn fall_state(&self) -> FallState {
        self.fall.state()
    }

    pub fn analyze(
        &mut self,
        frame_height: u32,
        pose: Option<&PoseLandmarks>,
        faces: &[FaceObservation],
        now: Duration,
    ) -> MonitorResult<FrameEvents> {
        let verdict = pose
            .and_then(|p| p.shoulder_y(frame_height))
            .map(|shoulder_y| {
                let sample = PostureSample {
                    shoulder_y,
                    timestamp: now,
                };
                self.fall.evaluate_if_due(sample, frame_height)
            });

        let matches = faces
            .iter()
            .map(|obs| {
                let mut result = self.matcher.match_face(obs, &self.store)?;
                result.bounding_box = result.bounding_box.scaled_up(self.detection_downscale);
                Ok(result)
            })
            .collect::<MonitorResult<Vec<_>>>()?;

        Ok(FrameEvents {
            matches,
            fall_confirmed: verdict.is_some_and(|v| v.is_fall()),
            verdict,
        })
    }

    pub fn analyze_frame(&mut self, frame: &Frame) -> MonitorResult<FrameEvents> {
        self.analyze(frame.height, frame.pose.as_ref(), &frame.faces, frame.timestamp)
    }
}
