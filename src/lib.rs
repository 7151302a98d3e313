pub mod analytics;
pub mod engine;
pub mod error;
pub mod machine;
pub mod storage;
pub mod window;

use chrono::{FixedOffset, Offset, Utc};
use engine::segment::RunState;
use error::{UptimeError, UptimeResult};
use serde::{Deserialize, Serialize};

pub use analytics::MachineAnalytics;

/// Tag ids understood by the engine and the machine strategy table.
pub mod tags {
    pub const ENERGY_CONSUMPTION: u32 = 3;
    pub const RUNNING_STATE: u32 = 9;
    pub const WEIGHT_TARGETS: u32 = 13;
    pub const WEIGHT_ACTUALS: u32 = 14;
    pub const ACTUAL_POINTS: u32 = 20;
    pub const SET_POINTS: u32 = 21;
    pub const HOPPER_INVENTORY: u32 = 23;
    pub const HAULOFF_LENGTH: u32 = 24;
}

pub const SECONDS_PER_HOUR: i64 = 3600;

/// Latest instant accepted from callers, 9999-12-31T23:59:59Z. The earliest is its negation.
pub const MAX_TIMESTAMP: i64 = 253_402_300_799;

/// One telemetry reading. The meaning of `values` depends on `tag_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub device_id: u64,
    pub machine_id: u64,
    pub tag_id: u32,
    pub timestamp: i64,
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(device_id: u64, machine_id: u64, tag_id: u32, timestamp: i64, values: Vec<f64>) -> Self {
        Self {
            device_id,
            machine_id,
            tag_id,
            timestamp,
            values,
        }
    }

    /// Shorthand for a running-state (tag 9) reading.
    pub fn run_state(machine_id: u64, timestamp: i64, running: bool) -> Self {
        let flag = if running { 1.0 } else { 0.0 };
        Self::new(0, machine_id, tags::RUNNING_STATE, timestamp, vec![flag])
    }

    pub fn value(&self, index: usize) -> UptimeResult<f64> {
        self.values.get(index).copied().ok_or_else(|| UptimeError::MalformedSample {
            tag_id: self.tag_id,
            timestamp: self.timestamp,
            message: format!("no value at index {} ({} values present)", index, self.values.len()),
        })
    }

    pub fn state(&self) -> UptimeResult<RunState> {
        let flag = self.value(0)?;
        if !flag.is_finite() {
            return Err(UptimeError::MalformedSample {
                tag_id: self.tag_id,
                timestamp: self.timestamp,
                message: format!("running flag {} is not a number", flag),
            });
        }
        Ok(RunState::from_flag(flag))
    }
}

/// Absolute `[from, to)` window in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// Like `new` but rejects empty, inverted or out-of-range bounds.
    pub fn checked(from: i64, to: i64) -> UptimeResult<Self> {
        for bound in [from, to] {
            if !(-MAX_TIMESTAMP..=MAX_TIMESTAMP).contains(&bound) {
                return Err(UptimeError::InvalidRange {
                    message: format!("timestamp {} is out of range", bound),
                });
            }
        }
        if from >= to {
            return Err(UptimeError::InvalidRange {
                message: format!("range start {} is not before end {}", from, to),
            });
        }
        Ok(Self { from, to })
    }

    pub fn duration(&self) -> i64 {
        (self.to - self.from).max(0)
    }

}

#[derive(Debug, Clone)]
pub struct UptimeConfig {
    pub bucket_count: usize,
    pub utc_offset_minutes: i32,
    pub downtime_lookback_days: i64,
    pub bind_address: String,
    pub snapshot_path: Option<String>,
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            bucket_count: 12,
            utc_offset_minutes: 0,
            downtime_lookback_days: 7,
            bind_address: "127.0.0.1:8080".to_string(),
            snapshot_path: None,
        }
    }
}

impl UptimeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        
        if let Ok(bucket_count) = std::env::var("BUCKET_COUNT") {
            config.bucket_count = bucket_count
                .parse()
                .ok()
                .filter(|count: &usize| *count > 0)
                .unwrap_or(config.bucket_count);
        }
        
        if let Ok(offset) = std::env::var("UTC_OFFSET_MINUTES") {
            config.utc_offset_minutes = offset
                .parse()
                .ok()
                .filter(|minutes: &i32| minutes.abs() < 24 * 60)
                .unwrap_or(0);
        }
        
        if let Ok(days) = std::env::var("DOWNTIME_LOOKBACK_DAYS") {
            config.downtime_lookback_days = days
                .parse()
                .ok()
                .filter(|days: &i64| *days > 0)
                .unwrap_or(config.downtime_lookback_days);
        }
        
        if let Ok(bind_addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = bind_addr;
        }
        
        if let Ok(path) = std::env::var("SNAPSHOT_PATH") {
            config.snapshot_path = Some(path).filter(|p| !p.is_empty());
        }
        
        config
    }

    /// The single canonical clock used for calendar math.
    pub fn clock(&self) -> FixedOffset {
        // from_env keeps the offset within a day; hand-built configs may not
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
