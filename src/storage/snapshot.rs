use crate::engine::DowntimePlan;
use crate::error::UptimeResult;
use crate::storage::MemoryStore;
use crate::Sample;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs as async_fs;
use tracing::{info, warn};

/// A JSON dump of telemetry and downtime plans used to seed a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub downtime_plans: Vec<DowntimePlan>,
}

impl Snapshot {
    pub async fn load<P: AsRef<Path>>(path: P) -> UptimeResult<Self> {
        let data = async_fs::read(path.as_ref()).await?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        info!(
            "Loaded snapshot {} ({} samples, {} downtime plans)",
            path.as_ref().display(),
            snapshot.samples.len(),
            snapshot.downtime_plans.len()
        );
        Ok(snapshot)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> UptimeResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                async_fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_vec_pretty(self)?;
        async_fs::write(path, serialized).await?;
        Ok(())
    }

    /// Builds a store from the snapshot. Plans whose dates cannot be read are skipped.
    pub async fn into_store(self, clock: &FixedOffset) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_batch(self.samples).await;

        for plan in self.downtime_plans {
            match plan.to_window(clock) {
                Ok(window) => store.add_downtime_window(window).await,
                Err(e) => warn!("Skipping downtime plan for machine {}: {}", plan.machine_id, e),
            }
        }

        store
    }
}
