use crate::error::{UptimeError, UptimeResult};
use crate::{Sample, SECONDS_PER_HOUR};
use chrono::{DateTime, Datelike, FixedOffset};

const HOURS_PER_WEEK: i64 = 7 * 24;

/// Elapsed hours per weekday (Monday first) from the first sample up to `now`.
///
/// Hourly ticks start at the first sample and run while they are before `now`;
/// every tick counts, whatever the machine was doing. Whole weeks of ticks add 24
/// to each day, so only the final partial week is walked.
pub fn weekly_histogram(samples: &[Sample], now: i64, clock: &FixedOffset) -> UptimeResult<[u64; 7]> {
    let mut hours = [0u64; 7];

    let Some(first) = samples.first() else {
        return Ok(hours);
    };
    if now <= first.timestamp {
        return Ok(hours);
    }

    let span = now.checked_sub(first.timestamp).ok_or_else(|| UptimeError::InvalidInput {
        message: format!("span from {} to {} is out of range", first.timestamp, now),
    })?;
    let ticks = span / SECONDS_PER_HOUR + i64::from(span % SECONDS_PER_HOUR != 0);
    let full_weeks = ticks / HOURS_PER_WEEK;
    for slot in hours.iter_mut() {
        *slot += full_weeks as u64 * 24;
    }

    let mut tick = first.timestamp + full_weeks * HOURS_PER_WEEK * SECONDS_PER_HOUR;
    while tick < now {
        hours[weekday_index(tick, clock)?] += 1;
        tick += SECONDS_PER_HOUR;
    }

    Ok(hours)
}

fn weekday_index(timestamp: i64, clock: &FixedOffset) -> UptimeResult<usize> {
    let datetime = DateTime::from_timestamp(timestamp, 0).ok_or_else(|| UptimeError::InvalidInput {
        message: format!("timestamp {} is out of range", timestamp),
    })?;
    Ok(datetime.with_timezone(clock).weekday().num_days_from_monday() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2021-03-01T00:00:00Z, a Monday
    const MONDAY: i64 = 1_614_556_800;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_no_samples() {
        assert_eq!(weekly_histogram(&[], MONDAY, &utc()).unwrap(), [0; 7]);
    }

    #[test]
    fn test_first_sample_after_now() {
        let samples = [Sample::run_state(1, MONDAY + 100, true)];
        assert_eq!(weekly_histogram(&samples, MONDAY, &utc()).unwrap(), [0; 7]);
    }

    #[test]
    fn test_partial_days() {
        let samples = [Sample::run_state(1, MONDAY + 20 * 3600, false)];
        let now = MONDAY + 26 * 3600;
        // ticks at Monday 20..23h and Tuesday 0..1h
        assert_eq!(weekly_histogram(&samples, now, &utc()).unwrap(), [4, 2, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_partial_hour_counts_a_tick() {
        let samples = [Sample::run_state(1, MONDAY, true)];
        assert_eq!(weekly_histogram(&samples, MONDAY + 1, &utc()).unwrap(), [1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(weekly_histogram(&samples, MONDAY + 3601, &utc()).unwrap(), [2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_state_is_ignored() {
        let running = [Sample::run_state(1, MONDAY, true)];
        let stopped = [Sample::run_state(1, MONDAY, false)];
        let now = MONDAY + 50 * 3600;
        assert_eq!(
            weekly_histogram(&running, now, &utc()).unwrap(),
            weekly_histogram(&stopped, now, &utc()).unwrap()
        );
    }

    #[test]
    fn test_full_weeks_match_walk() {
        let start = MONDAY + 13 * 3600 + 17;
        let samples = [Sample::run_state(1, start, true)];
        let now = start + (3 * HOURS_PER_WEEK + 30) * 3600 + 5;

        let hours = weekly_histogram(&samples, now, &utc()).unwrap();
        assert_eq!(hours.iter().sum::<u64>(), 3 * 168 + 31);

        let mut walked = [0u64; 7];
        let mut tick = start;
        while tick < now {
            walked[weekday_index(tick, &utc()).unwrap()] += 1;
            tick += 3600;
        }
        assert_eq!(hours, walked);
    }

    #[test]
    fn test_extreme_first_timestamp_is_rejected() {
        let samples = [Sample::run_state(1, i64::MIN + 5, true)];
        let result = weekly_histogram(&samples, MONDAY, &utc());
        assert!(matches!(result, Err(UptimeError::InvalidInput { .. })));
    }

    #[test]
    fn test_offset_shifts_weekday() {
        let minus_one = FixedOffset::west_opt(3600).unwrap();
        let samples = [Sample::run_state(1, MONDAY, true)];
        // Monday 00:00Z is still Sunday 23:00 at UTC-1
        assert_eq!(weekly_histogram(&samples, MONDAY + 3600, &minus_one).unwrap(), [0, 0, 0, 0, 0, 0, 1]);
    }
}
