//! Run-state segmentation.
//!
//! Turns the running flag samples (tag 9) of one machine into contiguous
//! intervals covering a query window. Each sample's state holds until the next
//! sample or the window end; the stretch before the first sample inherits the
//! last state seen before the window (running when nothing is known).

use crate::error::UptimeResult;
use crate::{Sample, TimeRange};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
}

impl RunState {
    pub fn from_flag(flag: f64) -> Self {
        if flag == 0.0 {
            RunState::Stopped
        } else {
            RunState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInterval {
    pub start: i64,
    pub end: i64,
    pub state: RunState,
}

impl RunInterval {
    pub fn new(start: i64, end: i64, state: RunState) -> Self {
        Self { start, end, state }
    }

    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_stopped(&self) -> bool {
        !self.state.is_running()
    }
}

pub fn segment_run_state(
    samples: &[Sample],
    prior: Option<&Sample>,
    window: TimeRange,
) -> UptimeResult<Vec<RunInterval>> {
    if samples.is_empty() && prior.is_none() {
        return Ok(Vec::new());
    }
    if window.to <= window.from {
        return Ok(Vec::new());
    }

    let mut state = match prior {
        Some(sample) => sample.state()?,
        None => RunState::Running,
    };

    let mut intervals = Vec::with_capacity(samples.len() + 1);
    let mut cursor = window.from;

    for sample in samples {
        let timestamp = sample.timestamp.clamp(window.from, window.to);
        push_interval(&mut intervals, cursor, timestamp, state);
        cursor = timestamp;
        state = sample.state()?;
    }
    push_interval(&mut intervals, cursor, window.to, state);

    Ok(intervals)
}

/// Total seconds spent stopped across `intervals`.
pub fn stopped_seconds(intervals: &[RunInterval]) -> i64 {
    intervals.iter().filter(|i| i.is_stopped()).map(RunInterval::duration).sum()
}

fn push_interval(intervals: &mut Vec<RunInterval>, start: i64, end: i64, state: RunState) {
    if end > start {
        intervals.push(RunInterval::new(start, end, state));
    }
}
