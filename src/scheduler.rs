use crate::analyzer::FrameAnalyzer;
use crate::error::MonitorResult;
use crate::sink::{dispatch, EventSink};
use crate::types::{Frame, FrameEvents};
use std::time::{Duration, Instant};

/// Producer of extractor output, one frame at a time.
///
/// `Ok(None)` ends the run. An error means frames can no longer be acquired
/// and stops the run.
pub trait FrameSource {
    fn next_frame(&mut self) -> MonitorResult<Option<Frame>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub total_frames: u64,
    pub deadline_misses: u64,
    pub worst_case: Duration,
    pub falls: u64,
}

pub struct Scheduler {
    analyzer: FrameAnalyzer,
    /// `None` runs frames back to back.
    frame_budget: Option<Duration>,
    stats: RunStats,
}

impl Scheduler {
    pub fn new(analyzer: FrameAnalyzer, fps: u32) -> Self {
        let frame_budget = (fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(fps)));

        Self {
            analyzer,
            frame_budget,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    pub fn tick<S: EventSink + ?Sized>(
        &mut self,
        frame: &Frame,
        sink: &mut S,
    ) -> MonitorResult<FrameEvents> {
        let start = Instant::now();

        let events = self.analyzer.analyze_frame(frame)?;
        dispatch(&events, frame, sink);

        let elapsed = start.elapsed();

        if self.frame_budget.is_some_and(|budget| elapsed > budget) {
            self.stats.deadline_misses += 1;
        }

        if elapsed > self.stats.worst_case {
            self.stats.worst_case = elapsed;
        }

        if events.fall_confirmed {
            self.stats.falls += 1;
        }
        self.stats.total_frames += 1;
        Ok(events)
    }

    pub fn run<F, S>(&mut self, source: &mut F, sink: &mut S) -> MonitorResult<RunStats>
    where
        F: FrameSource + ?Sized,
        S: EventSink + ?Sized,
    {
        loop {
            let cycle_start = Instant::now();

            let Some(frame) = source.next_frame()? else {
                tracing::info!(frames = self.stats.total_frames, "frame source exhausted");
                return Ok(self.stats);
            };
            self.tick(&frame, sink)?;

            if let Some(budget) = self.frame_budget {
                let elapsed = cycle_start.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                }
            }
        }
    }
}
