use crate::engine::segment::RunInterval;
use crate::error::UptimeResult;
use crate::window::parse_local_datetime;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Scheduled maintenance record as the operators enter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowntimePlan {
    pub machine_id: u64,
    pub date_from: String,
    pub time_from: String,
    pub date_to: String,
    pub time_to: String,
}

impl DowntimePlan {
    pub fn to_window(&self, clock: &FixedOffset) -> UptimeResult<DowntimeWindow> {
        Ok(DowntimeWindow {
            machine_id: self.machine_id,
            from: parse_local_datetime(&self.date_from, &self.time_from, clock)?,
            to: parse_local_datetime(&self.date_to, &self.time_to, clock)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeWindow {
    pub machine_id: u64,
    pub from: i64,
    pub to: i64,
}

impl DowntimeWindow {
    pub fn new(machine_id: u64, from: i64, to: i64) -> Self {
        Self { machine_id, from, to }
    }
}

/// Stopped seconds split by cause. Serializes as `[planned, unplanned, idle]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[i64; 3]", from = "[i64; 3]")]
pub struct DowntimeDistribution {
    pub planned: i64,
    pub unplanned: i64,
    /// Reserved: no run state maps to idle yet.
    pub idle: i64,
}

impl DowntimeDistribution {
    pub fn total(&self) -> i64 {
        self.planned + self.unplanned + self.idle
    }
}

impl From<DowntimeDistribution> for [i64; 3] {
    fn from(d: DowntimeDistribution) -> Self {
        [d.planned, d.unplanned, d.idle]
    }
}

impl From<[i64; 3]> for DowntimeDistribution {
    fn from([planned, unplanned, idle]: [i64; 3]) -> Self {
        Self { planned, unplanned, idle }
    }
}

/// Seconds shared by `[start1, end1)` and `[start2, end2)`, never negative.
pub fn overlap(start1: i64, end1: i64, start2: i64, end2: i64) -> i64 {
    let last_start = start1.max(start2);
    let first_end = end1.min(end2);
    first_end.saturating_sub(last_start).max(0)
}

/// Splits the stopped time in `intervals` into planned and unplanned seconds.
///
/// Overlapping downtime windows are each counted in full, so planned time can
/// exceed a stopped interval when windows overlap each other.
pub fn classify_downtime(intervals: &[RunInterval], windows: &[DowntimeWindow]) -> DowntimeDistribution {
    let mut distribution = DowntimeDistribution::default();

    for interval in intervals.iter().filter(|i| i.is_stopped()) {
        let planned: i64 = windows
            .iter()
            .map(|w| overlap(interval.start, interval.end, w.from, w.to))
            .sum();

        distribution.planned += planned;
        distribution.unplanned += interval.duration() - planned;
    }

    distribution
}
