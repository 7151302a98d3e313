//! Pure, synchronous computations over already-fetched samples.

pub mod binning;
pub mod downtime;
pub mod segment;
pub mod utilization;
pub mod weekly;

pub use binning::{bin_series, bin_series_with_time};
pub use downtime::{classify_downtime, overlap, DowntimeDistribution, DowntimePlan, DowntimeWindow};
pub use segment::{segment_run_state, RunInterval, RunState};
pub use utilization::{running_hours, running_hours_in, utilization_ratio, RunningHours};
pub use weekly::weekly_histogram;
