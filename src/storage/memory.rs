use crate::engine::DowntimeWindow;
use crate::error::UptimeResult;
use crate::storage::{SampleStore, SortOrder};
use crate::Sample;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;

type SeriesId = (u64, u32);

/// In-process sample store keyed by `(machine_id, tag_id)`.
///
/// Samples sharing a timestamp keep their insertion order.
#[derive(Default)]
pub struct MemoryStore {
    series: RwLock<HashMap<SeriesId, BTreeMap<i64, Vec<Sample>>>>,
    downtime: RwLock<HashMap<u64, Vec<DowntimeWindow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, sample: Sample) {
        let mut series = self.series.write().await;
        series
            .entry((sample.machine_id, sample.tag_id))
            .or_insert_with(BTreeMap::new)
            .entry(sample.timestamp)
            .or_insert_with(Vec::new)
            .push(sample);
    }

    pub async fn insert_batch(&self, samples: impl IntoIterator<Item = Sample>) {
        let mut series = self.series.write().await;
        for sample in samples {
            series
                .entry((sample.machine_id, sample.tag_id))
                .or_insert_with(BTreeMap::new)
                .entry(sample.timestamp)
                .or_insert_with(Vec::new)
                .push(sample);
        }
    }

    pub async fn add_downtime_window(&self, window: DowntimeWindow) {
        let mut downtime = self.downtime.write().await;
        downtime.entry(window.machine_id).or_insert_with(Vec::new).push(window);
    }

    pub async fn sample_count(&self) -> usize {
        let series = self.series.read().await;
        series.values().flat_map(|points| points.values()).map(Vec::len).sum()
    }

    pub async fn machine_ids(&self) -> Vec<u64> {
        let series = self.series.read().await;
        let mut ids: Vec<u64> = series.keys().map(|(machine_id, _)| *machine_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn fetch_samples(
        &self,
        machine_id: u64,
        tag_id: u32,
        from: Option<i64>,
        to: Option<i64>,
        order: SortOrder,
    ) -> UptimeResult<Vec<Sample>> {
        let series = self.series.read().await;
        let Some(points) = series.get(&(machine_id, tag_id)) else {
            return Ok(Vec::new());
        };

        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Ok(Vec::new());
            }
        }

        let lower = from.map_or(Bound::Unbounded, Bound::Included);
        let upper = to.map_or(Bound::Unbounded, Bound::Excluded);

        let mut result: Vec<Sample> = points
            .range((lower, upper))
            .flat_map(|(_, samples)| samples.iter().cloned())
            .collect();

        if order == SortOrder::Desc {
            result.reverse();
        }
        Ok(result)
    }

    async fn fetch_last_sample_before(
        &self,
        machine_id: u64,
        tag_id: u32,
        timestamp: i64,
    ) -> UptimeResult<Option<Sample>> {
        let series = self.series.read().await;
        Ok(series.get(&(machine_id, tag_id)).and_then(|points| {
            points
                .range(..timestamp)
                .next_back()
                .and_then(|(_, samples)| samples.last().cloned())
        }))
    }

    async fn fetch_latest_sample(&self, machine_id: u64, tag_id: u32) -> UptimeResult<Option<Sample>> {
        let series = self.series.read().await;
        Ok(series
            .get(&(machine_id, tag_id))
            .and_then(|points| points.values().next_back())
            .and_then(|samples| samples.last().cloned()))
    }

    async fn fetch_downtime_windows(&self, machine_id: u64) -> UptimeResult<Vec<DowntimeWindow>> {
        let downtime = self.downtime.read().await;
        Ok(downtime.get(&machine_id).cloned().unwrap_or_default())
    }
}
