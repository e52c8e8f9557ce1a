//! Frame source that replays recorded extractor output from JSON lines.
//!
//! Each non-blank line is one [`Frame`]:
//!
//! ```json
//! {"timestamp": 0.5, "width": 640, "height": 480, "pose": [{"x": 0.5, "y": 0.4}], "faces": []}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{MonitorError, MonitorResult};
use crate::scheduler::FrameSource;
use crate::types::Frame;

pub struct ReplaySource<R> {
    reader: R,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> MonitorResult<Self> {
        let file = File::open(path).map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| MonitorError::Capture(format!("read failed: {e}")))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|e| {
                MonitorError::Capture(format!("bad frame on line {}: {e}", self.line_no))
            })?;
            return Ok(Some(frame));
        }
    }
}
