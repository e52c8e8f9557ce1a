use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fixed-length face encoding compared by Euclidean distance.
pub type Encoding = Vec<f64>;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct KnownFace {
    pub label: String,
    pub encoding: Encoding,
}

/// Axis-aligned rectangle `(left, top, right, bottom)` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Maps a box found on a downscaled copy back to full-frame pixels.
    /// Coordinates are truncated toward zero.
    pub fn scaled_up(&self, downscale: f64) -> Self {
        let up = |v: i32| (f64::from(v) / downscale).trunc() as i32;
        Self {
            left: up(self.left),
            top: up(self.top),
            right: up(self.right),
            bottom: up(self.bottom),
        }
    }

    /// Clamps the box to the frame. Returns `None` when nothing of it is left.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<Self> {
        let w = i32::try_from(frame_width).unwrap_or(i32::MAX);
        let h = i32::try_from(frame_height).unwrap_or(i32::MAX);
        let clamped = Self {
            left: self.left.clamp(0, w),
            top: self.top.clamp(0, h),
            right: self.right.clamp(0, w),
            bottom: self.bottom.clamp(0, h),
        };
        (clamped.width() > 0 && clamped.height() > 0).then_some(clamped)
    }
}

/// One detected face, in detection-scale coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub encoding: Encoding,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceLabel {
    Known(String),
    Unknown,
}

impl FaceLabel {
    pub fn is_unknown(&self) -> bool {
        matches!(self, FaceLabel::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FaceLabel::Known(label) => label,
            FaceLabel::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for FaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub label: FaceLabel,
    /// Distance to the nearest stored encoding; infinite for an empty store.
    pub distance: f64,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub visibility: f64,
}

/// Pose landmarks in the extractor's fixed index order, normalised to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks(pub Vec<Landmark>);

impl PoseLandmarks {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;

    /// Average shoulder height in pixels.
    pub fn shoulder_y(&self, frame_height: u32) -> Option<f64> {
        let left = self.0.get(Self::LEFT_SHOULDER)?;
        let right = self.0.get(Self::RIGHT_SHOULDER)?;
        let h = f64::from(frame_height);
        let y = (left.y * h + right.y * h) / 2.0;
        y.is_finite().then_some(y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureSample {
    pub shoulder_y: f64,
    /// Monotonic offset from the start of the run.
    pub timestamp: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FallState {
    pub baseline_y: Option<f64>,
    pub consecutive_count: u32,
    pub last_sample_time: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallVerdict {
    /// Interval not elapsed; the sample was dropped.
    Gated,
    BaselineSet,
    Steady,
    Exceeded { count: u32 },
    FallConfirmed { drop_px: f64 },
}

impl FallVerdict {
    pub fn is_fall(&self) -> bool {
        matches!(self, FallVerdict::FallConfirmed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameEvents {
    pub matches: Vec<MatchResult>,
    pub fall_confirmed: bool,
    /// What the fall detector did with this frame, if it saw a pose.
    pub verdict: Option<FallVerdict>,
}

impl FrameEvents {
    pub fn unknown_faces(&self) -> impl Iterator<Item = &MatchResult> {
        self.matches.iter().filter(|m| m.label.is_unknown())
    }
}

/// One frame's worth of extractor output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(with = "secs_f64")]
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pose: Option<PoseLandmarks>,
    #[serde(default)]
    pub faces: Vec<FaceObservation>,
}

mod secs_f64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
