use crate::engine::{
    bin_series, bin_series_with_time, classify_downtime, running_hours, running_hours_in,
    segment_run_state, weekly_histogram, DowntimeDistribution, RunInterval, RunningHours,
};
use crate::error::UptimeResult;
use crate::machine::{MachineKind, Panel};
use crate::storage::{SampleStore, SortOrder};
use crate::window::{resolve_time_window, RangeDescriptor};
use crate::{tags, TimeRange, UptimeConfig, SECONDS_PER_HOUR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Read-only view of one machine over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSummary {
    pub machine_id: u64,
    pub window: TimeRange,
    pub utilization: f64,
    pub running_hours: RunningHours,
    pub downtime: DowntimeDistribution,
}

/// Panels of one machine, as selected by its [`MachineKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineOverview {
    pub machine_id: u64,
    pub series: BTreeMap<String, Vec<i64>>,
    pub latest: BTreeMap<String, Vec<f64>>,
    pub ratios: BTreeMap<String, f64>,
}

/// Fetches from a [`SampleStore`] and runs the engine over the result.
pub struct MachineAnalytics<S: SampleStore> {
    store: Arc<S>,
    config: UptimeConfig,
}

impl<S: SampleStore> MachineAnalytics<S> {
    pub fn new(store: Arc<S>, config: UptimeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &UptimeConfig {
        &self.config
    }

    pub fn resolve_window(&self, descriptor: &RangeDescriptor, now: i64) -> UptimeResult<TimeRange> {
        resolve_time_window(descriptor, now, &self.config.clock())
    }

    /// Window used when a downtime query names no range.
    pub fn default_downtime_window(&self, now: i64) -> TimeRange {
        TimeRange::new(now - self.config.downtime_lookback_days * 24 * SECONDS_PER_HOUR, now)
    }

    pub async fn chart_series(
        &self,
        machine_id: u64,
        tag_id: u32,
        field_index: usize,
        range: TimeRange,
    ) -> UptimeResult<Vec<(i64, i64)>> {
        let samples = self
            .store
            .fetch_samples(machine_id, tag_id, Some(range.from), Some(range.to), SortOrder::Asc)
            .await?;
        debug!("Binning {} samples of tag {} for machine {}", samples.len(), tag_id, machine_id);
        bin_series_with_time(&samples, self.config.bucket_count, field_index, range)
    }

    pub async fn binned_history(&self, machine_id: u64, tag_id: u32, field_index: usize) -> UptimeResult<Vec<i64>> {
        let samples = self
            .store
            .fetch_samples(machine_id, tag_id, None, None, SortOrder::Asc)
            .await?;
        bin_series(&samples, self.config.bucket_count, field_index)
    }

    pub async fn run_intervals(&self, machine_id: u64, window: TimeRange) -> UptimeResult<Vec<RunInterval>> {
        let samples = self
            .store
            .fetch_samples(machine_id, tags::RUNNING_STATE, Some(window.from), Some(window.to), SortOrder::Asc)
            .await?;
        let prior = self
            .store
            .fetch_last_sample_before(machine_id, tags::RUNNING_STATE, window.from)
            .await?;

        debug!(
            "Segmenting {} run-state samples for machine {} (prior known: {})",
            samples.len(),
            machine_id,
            prior.is_some()
        );
        segment_run_state(&samples, prior.as_ref(), window)
    }

    pub async fn downtime_distribution(&self, machine_id: u64, window: TimeRange) -> UptimeResult<DowntimeDistribution> {
        let intervals = self.run_intervals(machine_id, window).await?;
        self.classify(machine_id, &intervals).await
    }

    async fn classify(&self, machine_id: u64, intervals: &[RunInterval]) -> UptimeResult<DowntimeDistribution> {
        if intervals.is_empty() {
            return Ok(DowntimeDistribution::default());
        }

        let windows = self.store.fetch_downtime_windows(machine_id).await?;
        Ok(classify_downtime(intervals, &windows))
    }

    pub async fn weekly_running_hours(&self, machine_id: u64, now: i64) -> UptimeResult<[u64; 7]> {
        let samples = self
            .store
            .fetch_samples(machine_id, tags::RUNNING_STATE, None, None, SortOrder::Asc)
            .await?;
        weekly_histogram(&samples, now, &self.config.clock())
    }

    /// Running hours over the whole history, attributed between consecutive samples.
    pub async fn lifetime_running_hours(&self, machine_id: u64) -> UptimeResult<RunningHours> {
        let samples = self
            .store
            .fetch_samples(machine_id, tags::RUNNING_STATE, None, None, SortOrder::Asc)
            .await?;
        running_hours(&samples)
    }

    pub async fn summary(&self, machine_id: u64, window: TimeRange) -> UptimeResult<MachineSummary> {
        // both figures come from the same intervals, leading edge included
        let intervals = self.run_intervals(machine_id, window).await?;
        let running_hours = running_hours_in(&intervals);
        let downtime = self.classify(machine_id, &intervals).await?;

        Ok(MachineSummary {
            machine_id,
            window,
            utilization: running_hours.ratio(),
            running_hours,
            downtime,
        })
    }

    pub async fn overview(&self, machine_id: u64, kind: MachineKind) -> UptimeResult<MachineOverview> {
        let mut overview = MachineOverview {
            machine_id,
            ..Default::default()
        };

        for panel in kind.panels() {
            match *panel {
                Panel::Binned { name, tag_id } => {
                    let series = self.binned_history(machine_id, tag_id, 0).await?;
                    overview.series.insert(name.to_string(), series);
                }
                Panel::Latest { name, tag_id } => {
                    let values = self
                        .store
                        .fetch_latest_sample(machine_id, tag_id)
                        .await?
                        .map(|sample| sample.values)
                        .unwrap_or_default();
                    overview.latest.insert(name.to_string(), values);
                }
                Panel::Utilization { name } => {
                    let hours = self.lifetime_running_hours(machine_id).await?;
                    overview.ratios.insert(name.to_string(), hours.ratio());
                }
            }
        }

        debug!("Built {:?} overview for machine {} ({} panels)", kind, machine_id, kind.panels().len());
        Ok(overview)
    }
}
