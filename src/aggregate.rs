//! Minute-bucket aggregation of raw provider samples

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::Aggregation;
use crate::{AggregatedPoint, RawSample, minute_bucket};

/// Points produced for one metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregated {
    pub points: Vec<AggregatedPoint>,
    /// Minutes that had samples but none that qualified. Their mean is
    /// undefined, so they are not published.
    pub empty_buckets: Vec<i64>,
}

pub fn aggregate(samples: &[RawSample], policy: Aggregation) -> Aggregated {
    match policy {
        Aggregation::PassThrough => pass_through(samples),
        Aggregation::FilteredMean => filtered_mean(samples),
    }
}

fn pass_through(samples: &[RawSample]) -> Aggregated {
    let points = samples
        .iter()
        .map(|sample| AggregatedPoint {
            timestamp: minute_bucket(sample.timestamp),
            value: sample.value,
        })
        .collect();

    Aggregated {
        points,
        empty_buckets: Vec::new(),
    }
}

fn filtered_mean(samples: &[RawSample]) -> Aggregated {
    // (sum, count) of qualifying samples per minute
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();

    for sample in samples {
        let bucket = buckets.entry(minute_bucket(sample.timestamp)).or_default();
        if sample.qualifies() {
            bucket.0 += sample.value;
            bucket.1 += 1;
        }
    }

    let mut aggregated = Aggregated::default();
    for (timestamp, (sum, count)) in buckets {
        if count == 0 {
            warn!("no qualifying samples in minute {timestamp}, skipping");
            aggregated.empty_buckets.push(timestamp);
            continue;
        }

        aggregated.points.push(AggregatedPoint {
            timestamp,
            value: sum / count as f64,
        });
    }

    aggregated
}
