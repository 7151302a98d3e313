//! Storage collaborator seam.
//!
//! The engine never talks to a database itself; callers fetch through
//! [`SampleStore`] and hand the results to the engine functions.

pub mod memory;
pub mod snapshot;

use crate::engine::DowntimeWindow;
use crate::error::UptimeResult;
use crate::Sample;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Samples of one machine and tag with `from <= timestamp < to`, either bound optional.
    async fn fetch_samples(
        &self,
        machine_id: u64,
        tag_id: u32,
        from: Option<i64>,
        to: Option<i64>,
        order: SortOrder,
    ) -> UptimeResult<Vec<Sample>>;

    /// Newest sample strictly before `timestamp`.
    async fn fetch_last_sample_before(
        &self,
        machine_id: u64,
        tag_id: u32,
        timestamp: i64,
    ) -> UptimeResult<Option<Sample>>;

    async fn fetch_latest_sample(&self, machine_id: u64, tag_id: u32) -> UptimeResult<Option<Sample>>;

    async fn fetch_downtime_windows(&self, machine_id: u64) -> UptimeResult<Vec<DowntimeWindow>>;
}
