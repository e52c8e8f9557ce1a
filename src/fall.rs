use std::time::Duration;

use crate::types::{FallState, FallVerdict, PostureSample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallParams {
    pub ratio_threshold: f64,
    pub min_pixel_floor: f64,
    pub confirm_threshold: u32,
    pub detection_interval: Duration,
    pub smoothing_alpha: f64,
}

impl Default for FallParams {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.20,
            min_pixel_floor: 60.0,
            confirm_threshold: 2,
            detection_interval: Duration::from_secs(1),
            smoothing_alpha: 0.02,
        }
    }
}

impl FallParams {
    /// Shoulder drop in pixels a sample must exceed. The floor keeps small
    /// frames from shrinking the threshold to noise level.
    pub fn threshold_px(&self, frame_height: u32) -> f64 {
        (self.ratio_threshold * f64::from(frame_height)).max(self.min_pixel_floor)
    }
}

/// Debounced fall detector over time-gated shoulder samples.
pub struct FallStateMachine {
    params: FallParams,
    state: FallState,
}

impl FallStateMachine {
    pub fn new(params: FallParams) -> Self {
        Self::with_state(params, FallState::default())
    }

    pub fn with_state(params: FallParams, state: FallState) -> Self {
        Self { params, state }
    }

    pub fn state(&self) -> FallState {
        self.state
    }

    pub fn params(&self) -> &FallParams {
        &self.params
    }

    /// Whether a sample taken at `now` would be evaluated.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.state.last_sample_time {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.params.detection_interval,
        }
    }

    /// Applies the sample if the detection interval has elapsed since the last
    /// accepted one. A gated sample leaves the state untouched.
    pub fn evaluate_if_due(&mut self, sample: PostureSample, frame_height: u32) -> FallVerdict {
        if !self.is_due(sample.timestamp) {
            return FallVerdict::Gated;
        }
        let (next, verdict) = transition(self.state, sample, frame_height, &self.params);
        self.state = next;

        match verdict {
            FallVerdict::FallConfirmed { drop_px } => {
                tracing::debug!(drop_px, shoulder_y = sample.shoulder_y, "fall confirmed, rebasing");
            }
            FallVerdict::Exceeded { count } => {
                tracing::debug!(count, shoulder_y = sample.shoulder_y, "shoulder drop over threshold");
            }
            _ => {}
        }
        verdict
    }
}

/// One accepted sample applied to the state.
pub fn transition(
    state: FallState,
    sample: PostureSample,
    frame_height: u32,
    params: &FallParams,
) -> (FallState, FallVerdict) {
    let y = sample.shoulder_y;
    let mut next = FallState {
        last_sample_time: Some(sample.timestamp),
        ..state
    };

    let Some(baseline) = state.baseline_y else {
        next.baseline_y = Some(y);
        next.consecutive_count = 0;
        return (next, FallVerdict::BaselineSet);
    };

    let drop_px = y - baseline;
    let verdict = if drop_px > params.threshold_px(frame_height) {
        next.consecutive_count = state.consecutive_count + 1;
        FallVerdict::Exceeded {
            count: next.consecutive_count,
        }
    } else {
        next.consecutive_count = 0;
        let alpha = params.smoothing_alpha;
        next.baseline_y = Some(baseline * (1.0 - alpha) + y * alpha);
        FallVerdict::Steady
    };

    if next.consecutive_count >= params.confirm_threshold {
        // The post-fall posture becomes the new normal.
        next.baseline_y = Some(y);
        next.consecutive_count = 0;
        return (next, FallVerdict::FallConfirmed { drop_px });
    }

    (next, verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(secs: u64, shoulder_y: f64) -> PostureSample {
        PostureSample {
            shoulder_y,
            timestamp: Duration::from_secs(secs),
        }
    }

    fn tracking(baseline: f64) -> FallStateMachine {
        FallStateMachine::with_state(
            FallParams::default(),
            FallState {
                baseline_y: Some(baseline),
                consecutive_count: 0,
                last_sample_time: Some(Duration::ZERO),
            },
        )
    }

    #[test]
    fn first_sample_sets_baseline() {
        let mut fsm = FallStateMachine::new(FallParams::default());
        assert!(fsm.is_due(Duration::ZERO));

        let verdict = fsm.evaluate_if_due(at(0, 420.0), 480);

        assert_eq!(verdict, FallVerdict::BaselineSet);
        assert_eq!(fsm.state().baseline_y, Some(420.0));
        assert_eq!(fsm.state().consecutive_count, 0);
    }

    #[test]
    fn floor_applies_to_small_frames() {
        let params = FallParams::default();
        assert_eq!(params.threshold_px(300), 60.0);
        assert_relative_eq!(params.threshold_px(1080), 216.0, epsilon = 1e-9);
    }

    #[test]
    fn confirms_on_second_exceeding_sample() {
        let mut fsm = tracking(500.0);

        assert_eq!(fsm.evaluate_if_due(at(1, 580.0), 300), FallVerdict::Exceeded { count: 1 });
        assert_eq!(fsm.state().baseline_y, Some(500.0));

        let verdict = fsm.evaluate_if_due(at(2, 585.0), 300);
        assert_eq!(verdict, FallVerdict::FallConfirmed { drop_px: 85.0 });
        assert_eq!(fsm.state().baseline_y, Some(585.0));
        assert_eq!(fsm.state().consecutive_count, 0);
    }

    #[test]
    fn confirms_on_exactly_nth_sample() {
        let params = FallParams {
            confirm_threshold: 4,
            ..FallParams::default()
        };
        let mut fsm = FallStateMachine::with_state(
            params,
            FallState {
                baseline_y: Some(100.0),
                ..FallState::default()
            },
        );

        for n in 1..4 {
            let verdict = fsm.evaluate_if_due(at(n, 300.0), 480);
            assert_eq!(verdict, FallVerdict::Exceeded { count: n as u32 });
        }
        assert!(fsm.evaluate_if_due(at(4, 300.0), 480).is_fall());
    }

    #[test]
    fn sub_threshold_sample_resets_counter_and_decays_baseline() {
        let mut fsm = tracking(500.0);
        fsm.evaluate_if_due(at(1, 580.0), 300);
        assert_eq!(fsm.state().consecutive_count, 1);

        assert_eq!(fsm.evaluate_if_due(at(2, 510.0), 300), FallVerdict::Steady);

        assert_eq!(fsm.state().consecutive_count, 0);
        assert_relative_eq!(fsm.state().baseline_y.unwrap(), 500.2, epsilon = 1e-9);
    }

    #[test]
    fn drop_equal_to_threshold_does_not_count() {
        let mut fsm = tracking(500.0);
        assert_eq!(fsm.evaluate_if_due(at(1, 560.0), 300), FallVerdict::Steady);
    }

    #[test]
    fn rising_shoulders_never_count() {
        let mut fsm = tracking(500.0);
        assert_eq!(fsm.evaluate_if_due(at(1, 300.0), 300), FallVerdict::Steady);
        assert_eq!(fsm.state().consecutive_count, 0);
    }

    #[test]
    fn early_sample_is_ignored_entirely() {
        let mut fsm = tracking(500.0);
        fsm.evaluate_if_due(at(1, 580.0), 300);
        let before = fsm.state();

        let early = PostureSample {
            shoulder_y: 590.0,
            timestamp: Duration::from_millis(1999),
        };
        assert_eq!(fsm.evaluate_if_due(early, 300), FallVerdict::Gated);
        assert_eq!(fsm.state(), before);

        // Gating still counts from the last accepted sample.
        assert!(fsm.evaluate_if_due(at(2, 590.0), 300).is_fall());
    }

    #[test]
    fn transition_is_pure() {
        let state = FallState {
            baseline_y: Some(200.0),
            consecutive_count: 1,
            last_sample_time: Some(Duration::from_secs(3)),
        };
        let params = FallParams::default();
        let a = transition(state, at(4, 400.0), 480, &params);
        let b = transition(state, at(4, 400.0), 480, &params);
        assert_eq!(a, b);
        assert!(a.1.is_fall());
        assert_eq!(a.0.last_sample_time, Some(Duration::from_secs(4)));
    }
}
