//! Per-frame face recognition and fall detection over extracted landmarks.
//!
//! The crate turns noisy per-frame extractor output (face encodings, pose
//! landmarks) into debounced events:
//! - [`store::EncodingStore`]: known faces, built once per run.
//! - [`matcher::FaceMatcher`]: nearest-neighbour label resolution.
//! - [`fall::FallStateMachine`]: adaptive-baseline fall detector.
//! - [`analyzer::FrameAnalyzer`]: runs both for one frame.
//! - [`scheduler::Scheduler`]: frame loop feeding an [`sink::EventSink`].

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fall;
pub mod matcher;
pub mod replay;
pub mod scheduler;
pub mod sink;
pub mod store;
pub mod types;

pub use analyzer::FrameAnalyzer;
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use store::EncodingStore;
