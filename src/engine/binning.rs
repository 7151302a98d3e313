use crate::error::{UptimeError, UptimeResult};
use crate::{Sample, TimeRange};

/// Number of samples per bucket when `len` samples are spread over `bucket_count` buckets.
///
/// The width is fixed up front, so the last bucket may come up short and small
/// inputs can produce fewer than `bucket_count` buckets.
pub fn bucket_width(len: usize, bucket_count: usize) -> usize {
    len / bucket_count + 1
}

pub fn bin_series(samples: &[Sample], bucket_count: usize, field_index: usize) -> UptimeResult<Vec<i64>> {
    chunk_samples(samples, bucket_count)?
        .map(|chunk| chunk_mean(chunk, field_index))
        .collect()
}

/// Like [`bin_series`], paired with a chart timestamp in milliseconds per bucket.
///
/// The timestamp of bucket `i` is `from + i * (to - from) / bucket_count`; it is
/// spread evenly over the range and does not look at the samples in the bucket.
pub fn bin_series_with_time(
    samples: &[Sample],
    bucket_count: usize,
    field_index: usize,
    range: TimeRange,
) -> UptimeResult<Vec<(i64, i64)>> {
    let span_ms = (range.to - range.from) * 1000;
    let buckets = bucket_count as i64;

    chunk_samples(samples, bucket_count)?
        .enumerate()
        .map(|(index, chunk)| {
            let timestamp_ms = range.from * 1000 + index as i64 * span_ms / buckets;
            Ok((timestamp_ms, chunk_mean(chunk, field_index)?))
        })
        .collect()
}

fn chunk_samples(
    samples: &[Sample],
    bucket_count: usize,
) -> UptimeResult<std::slice::Chunks<'_, Sample>> {
    if bucket_count == 0 {
        return Err(UptimeError::InvalidInput {
            message: "bucket count must be at least 1".to_string(),
        });
    }
    Ok(samples.chunks(bucket_width(samples.len(), bucket_count)))
}

// Mean truncated toward zero; an empty chunk reduces to 0.
fn chunk_mean(chunk: &[Sample], field_index: usize) -> UptimeResult<i64> {
    if chunk.is_empty() {
        return Ok(0);
    }

    let mut sum = 0.0;
    for sample in chunk {
        sum += sample.value(field_index)?;
    }
    Ok((sum / chunk.len() as f64) as i64)
}
