use crate::engine::segment::RunInterval;
use crate::error::UptimeResult;
use crate::{Sample, SECONDS_PER_HOUR};
use serde::{Deserialize, Serialize};

/// Whole hours attributed to each state between consecutive samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningHours {
    pub running: i64,
    pub stopped: i64,
}

impl RunningHours {
    pub fn ratio(&self) -> f64 {
        let total = self.running + self.stopped;
        if total == 0 {
            return 0.0;
        }
        self.running as f64 / total as f64
    }
}

/// The gap between two samples belongs to the earlier sample's state, truncated to whole hours.
pub fn running_hours(samples: &[Sample]) -> UptimeResult<RunningHours> {
    let mut hours = RunningHours::default();

    for pair in samples.windows(2) {
        let elapsed = pair[1].timestamp.saturating_sub(pair[0].timestamp) / SECONDS_PER_HOUR;
        if pair[0].state()?.is_running() {
            hours.running += elapsed;
        } else {
            hours.stopped += elapsed;
        }
    }

    Ok(hours)
}

pub fn utilization_ratio(samples: &[Sample]) -> UptimeResult<f64> {
    Ok(running_hours(samples)?.ratio())
}

/// Whole hours per state across segmented run intervals.
///
/// Each interval is truncated on its own, matching the pairwise rule of
/// [`running_hours`] while also counting the window's leading and trailing edges.
pub fn running_hours_in(intervals: &[RunInterval]) -> RunningHours {
    let mut hours = RunningHours::default();

    for interval in intervals {
        let elapsed = interval.duration() / SECONDS_PER_HOUR;
        if interval.state.is_running() {
            hours.running += elapsed;
        } else {
            hours.stopped += elapsed;
        }
    }

    hours
}
