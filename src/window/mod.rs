//! Resolution of dashboard range descriptors into absolute time windows.
//!
//! Relative options end at "now"; `custom` ranges are read from date and
//! time-of-day strings on the canonical clock.

use crate::error::{UptimeError, UptimeResult};
use crate::TimeRange;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOption {
    Last30Min,
    LastHour,
    Last4Hours,
    Last12Hours,
    Last24Hours,
    Last48Hours,
    Last3Days,
    Last7Days,
    Last24Days,
    Custom,
}

impl RangeOption {
    /// Span of a relative option in seconds; `None` for `Custom`.
    pub fn lookback_seconds(&self) -> Option<i64> {
        match self {
            RangeOption::Last30Min => Some(30 * MINUTE),
            RangeOption::LastHour => Some(HOUR),
            RangeOption::Last4Hours => Some(4 * HOUR),
            RangeOption::Last12Hours => Some(12 * HOUR),
            RangeOption::Last24Hours => Some(DAY),
            RangeOption::Last48Hours => Some(2 * DAY),
            RangeOption::Last3Days => Some(3 * DAY),
            RangeOption::Last7Days => Some(7 * DAY),
            RangeOption::Last24Days => Some(24 * DAY),
            RangeOption::Custom => None,
        }
    }
}

impl FromStr for RangeOption {
    type Err = UptimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last30Min" => Ok(RangeOption::Last30Min),
            "lastHour" => Ok(RangeOption::LastHour),
            "last4Hours" => Ok(RangeOption::Last4Hours),
            "last12Hours" => Ok(RangeOption::Last12Hours),
            "last24Hours" => Ok(RangeOption::Last24Hours),
            "last48Hours" => Ok(RangeOption::Last48Hours),
            "last3Days" => Ok(RangeOption::Last3Days),
            "last7Days" => Ok(RangeOption::Last7Days),
            "last24Days" => Ok(RangeOption::Last24Days),
            "custom" => Ok(RangeOption::Custom),
            other => Err(UptimeError::UnknownRange(other.to_string())),
        }
    }
}

/// Range selection as posted by the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDescriptor {
    pub time_range_option: String,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub time_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub time_to: Option<String>,
}

impl RangeDescriptor {
    pub fn relative(option: &str) -> Self {
        Self {
            time_range_option: option.to_string(),
            ..Default::default()
        }
    }

    pub fn custom(date_from: &str, time_from: &str, date_to: &str, time_to: &str) -> Self {
        Self {
            time_range_option: "custom".to_string(),
            date_from: Some(date_from.to_string()),
            time_from: Some(time_from.to_string()),
            date_to: Some(date_to.to_string()),
            time_to: Some(time_to.to_string()),
        }
    }
}

pub fn resolve_time_window(
    descriptor: &RangeDescriptor,
    now: i64,
    clock: &FixedOffset,
) -> UptimeResult<TimeRange> {
    let option: RangeOption = descriptor.time_range_option.parse()?;

    match option.lookback_seconds() {
        Some(lookback) => Ok(TimeRange::new(now - lookback, now)),
        None => {
            let from = parse_local_datetime(
                required(&descriptor.date_from, "dateFrom")?,
                required(&descriptor.time_from, "timeFrom")?,
                clock,
            )?;
            let to = parse_local_datetime(
                required(&descriptor.date_to, "dateTo")?,
                required(&descriptor.time_to, "timeTo")?,
                clock,
            )?;
            TimeRange::checked(from, to)
        }
    }
}

/// Resolves against the system clock.
pub fn resolve_time_window_now(descriptor: &RangeDescriptor, clock: &FixedOffset) -> UptimeResult<TimeRange> {
    resolve_time_window(descriptor, Utc::now().timestamp(), clock)
}

/// Combines a `YYYY-MM-DD` date and an `HH:MM[:SS]` time of day into a unix timestamp.
pub fn parse_local_datetime(date: &str, time: &str, clock: &FixedOffset) -> UptimeResult<i64> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| UptimeError::InvalidRange {
        message: format!("bad date '{}': {}", date, e),
    })?;

    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|e| UptimeError::InvalidRange {
            message: format!("bad time of day '{}': {}", time, e),
        })?;

    clock
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .single()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| UptimeError::InvalidRange {
            message: format!("{} {} does not map to a single instant", date, time),
        })
}

fn required<'a>(field: &'a Option<String>, name: &str) -> UptimeResult<&'a str> {
    field
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| UptimeError::InvalidRange {
            message: format!("custom range is missing {}", name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_relative_ranges_end_now() {
        let now = 1_700_000_000;
        let cases = [
            ("last30Min", 1800),
            ("lastHour", 3600),
            ("last4Hours", 4 * 3600),
            ("last12Hours", 12 * 3600),
            ("last24Hours", 86400),
            ("last48Hours", 2 * 86400),
            ("last3Days", 3 * 86400),
            ("last7Days", 7 * 86400),
            ("last24Days", 24 * 86400),
        ];

        for (option, span) in cases {
            let range = resolve_time_window(&RangeDescriptor::relative(option), now, &utc()).unwrap();
            assert_eq!(range.to, now, "{}", option);
            assert_eq!(range.from, now - span, "{}", option);
        }
    }

    #[test]
    fn test_resolve_against_system_clock() {
        let before = Utc::now().timestamp();
        let range = resolve_time_window_now(&RangeDescriptor::relative("last4Hours"), &utc()).unwrap();
        let after = Utc::now().timestamp();

        assert!(range.to >= before && range.to <= after);
        assert_eq!(range.duration(), 4 * 3600);
    }

    #[test]
    fn test_unknown_option_is_an_error() {
        let result = resolve_time_window(&RangeDescriptor::relative("lastFortnight"), 0, &utc());
        assert!(matches!(result, Err(UptimeError::UnknownRange(ref s)) if s == "lastFortnight"));
    }

    #[test]
    fn test_custom_range() {
        let descriptor = RangeDescriptor::custom("2021-03-04", "08:00", "2021-03-04", "17:30:15");
        let range = resolve_time_window(&descriptor, 0, &utc()).unwrap();
        // 2021-03-04T08:00:00Z
        assert_eq!(range.from, 1_614_844_800);
        assert_eq!(range.to - range.from, 9 * 3600 + 30 * 60 + 15);
    }

    #[test]
    fn test_custom_range_uses_canonical_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let descriptor = RangeDescriptor::custom("2021-03-04", "10:00", "2021-03-04", "11:00");
        let range = resolve_time_window(&descriptor, 0, &plus_two).unwrap();
        assert_eq!(range.from, 1_614_844_800);
    }

    #[test]
    fn test_custom_range_rejects_bad_input() {
        let missing = RangeDescriptor {
            time_range_option: "custom".to_string(),
            date_from: Some("2021-03-04".to_string()),
            ..Default::default()
        };
        assert!(matches!(resolve_time_window(&missing, 0, &utc()), Err(UptimeError::InvalidRange { .. })));

        let garbage = RangeDescriptor::custom("yesterday", "08:00", "2021-03-04", "09:00");
        assert!(matches!(resolve_time_window(&garbage, 0, &utc()), Err(UptimeError::InvalidRange { .. })));

        let inverted = RangeDescriptor::custom("2021-03-05", "08:00", "2021-03-04", "09:00");
        assert!(matches!(resolve_time_window(&inverted, 0, &utc()), Err(UptimeError::InvalidRange { .. })));
    }

    #[test]
    fn test_descriptor_deserializes_dashboard_shape() {
        let json = r#"{"timeRangeOption":"custom","dateFrom":"2021-03-04","timeFrom":"08:00","dateTo":"2021-03-05","timeTo":"08:00"}"#;
        let descriptor: RangeDescriptor = serde_json::from_str(json).unwrap();
        let range = resolve_time_window(&descriptor, 0, &utc()).unwrap();
        assert_eq!(range.duration(), 86400);

        let relative: RangeDescriptor = serde_json::from_str(r#"{"timeRangeOption":"lastHour"}"#).unwrap();
        assert!(relative.date_from.is_none());
    }
}
