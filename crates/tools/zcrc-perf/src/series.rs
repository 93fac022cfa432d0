//! Throughput series construction.
//!
//! Pairs unsized and sized runs by message length and converts each mean
//! latency into a data rate.

use std::collections::HashMap;

use crate::error::PerfError;
use crate::select::{Partition, RunResult};

/// Bytes per GiB.
const GIB: f64 = (1u64 << 30) as f64;
/// Nanoseconds per second.
const NANOS_PER_SEC: f64 = 1e9;

/// Throughput in GiB/s of processing `bytes` in `mean_ns` nanoseconds.
pub fn throughput_gibps(bytes: f64, mean_ns: f64) -> f64 {
    (bytes / GIB) / (mean_ns / NANOS_PER_SEC)
}

/// Both conventions' throughput over a shared message-length axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputSeries {
    /// Message lengths in bytes, in unsized-run order.
    pub message_lens: Vec<f64>,
    /// Unsized-range throughput (GiB/s) at each message length.
    pub unsized_gibps: Vec<f64>,
    /// `strlen` + sized-range throughput (GiB/s) at each message length.
    pub sized_gibps: Vec<f64>,
}

impl ThroughputSeries {
    /// Number of points in each series.
    pub fn len(&self) -> usize {
        self.message_lens.len()
    }

    /// Returns `true` if there are no points.
    pub fn is_empty(&self) -> bool {
        self.message_lens.is_empty()
    }
}

/// Build the paired series from a partition.
///
/// Runs are joined on message length: every unsized run needs exactly one
/// sized run of the same length and vice versa. Any unmatched or repeated
/// length is a [`PerfError::PartitionMismatch`].
pub fn build_series(partition: &Partition) -> Result<ThroughputSeries, PerfError> {
    let sized = index_by_len(&partition.sized_runs)?;
    // Only checked for repeats; order comes from the unsized runs.
    index_by_len(&partition.unsized_runs)?;

    let mut series = ThroughputSeries::default();
    for run in &partition.unsized_runs {
        let partner = sized.get(&run.message_len.to_bits()).ok_or_else(|| {
            PerfError::PartitionMismatch(format!(
                "'{}' has no strlen + sized run of {} bytes",
                run.name, run.message_len
            ))
        })?;

        series.message_lens.push(run.message_len);
        series.unsized_gibps.push(rate(run)?);
        series.sized_gibps.push(rate(partner)?);
    }

    if partition.sized_runs.len() != partition.unsized_runs.len() {
        let orphan = partition
            .sized_runs
            .iter()
            .find(|s| {
                !partition
                    .unsized_runs
                    .iter()
                    .any(|u| u.message_len.to_bits() == s.message_len.to_bits())
            })
            .map_or("?", |s| s.name.as_str());
        return Err(PerfError::PartitionMismatch(format!(
            "'{orphan}' has no unsized run of the same length"
        )));
    }

    Ok(series)
}

fn index_by_len(runs: &[RunResult]) -> Result<HashMap<u64, &RunResult>, PerfError> {
    let mut index = HashMap::with_capacity(runs.len());
    for run in runs {
        if let Some(prev) = index.insert(run.message_len.to_bits(), run) {
            return Err(PerfError::PartitionMismatch(format!(
                "'{}' and '{}' measure the same message length",
                prev.name, run.name
            )));
        }
    }
    Ok(index)
}

fn rate(run: &RunResult) -> Result<f64, PerfError> {
    let gibps = throughput_gibps(run.message_len, run.mean_ns);
    if gibps.is_finite() {
        Ok(gibps)
    } else {
        Err(PerfError::malformed(
            &run.name,
            format!("mean {} ns gives no finite throughput", run.mean_ns),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::Convention;

    fn run(len: f64, convention: Convention, mean_ns: f64) -> RunResult {
        RunResult {
            name: format!("{len}: {}", convention.suffix()),
            convention,
            message_len: len,
            mean_ns,
        }
    }

    fn partition(unsized_runs: Vec<RunResult>, sized_runs: Vec<RunResult>) -> Partition {
        Partition {
            unsized_runs,
            sized_runs,
            skipped: 0,
        }
    }

    #[test]
    fn one_gib_in_one_second() {
        assert_eq!(throughput_gibps(1_073_741_824.0, 1e9), 1.0);
    }

    #[test]
    fn throughput_is_reproducible() {
        let a = throughput_gibps(4096.0, 1234.5);
        let b = throughput_gibps(4096.0, 1234.5);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn single_pair() {
        let p = partition(
            vec![run(1024.0, Convention::Unsized, 1000.0)],
            vec![run(1024.0, Convention::StrlenSized, 1200.0)],
        );
        let s = build_series(&p).unwrap();
        assert_eq!(s.message_lens, [1024.0]);
        assert!((s.unsized_gibps[0] - 0.953_674).abs() < 1e-6);
        assert!((s.sized_gibps[0] - 0.794_728).abs() < 1e-6);
    }

    #[test]
    fn joins_by_length_not_position() {
        let p = partition(
            vec![
                run(16.0, Convention::Unsized, 10.0),
                run(32.0, Convention::Unsized, 10.0),
            ],
            vec![
                run(32.0, Convention::StrlenSized, 40.0),
                run(16.0, Convention::StrlenSized, 20.0),
            ],
        );
        let s = build_series(&p).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.message_lens, [16.0, 32.0]);
        assert_eq!(s.sized_gibps[0], throughput_gibps(16.0, 20.0));
        assert_eq!(s.sized_gibps[1], throughput_gibps(32.0, 40.0));
    }

    #[test]
    fn missing_sized_partner() {
        let p = partition(
            vec![
                run(16.0, Convention::Unsized, 10.0),
                run(32.0, Convention::Unsized, 10.0),
            ],
            vec![run(16.0, Convention::StrlenSized, 20.0)],
        );
        assert!(matches!(
            build_series(&p),
            Err(PerfError::PartitionMismatch(_))
        ));
    }

    #[test]
    fn extra_sized_run() {
        let p = partition(
            vec![run(16.0, Convention::Unsized, 10.0)],
            vec![
                run(16.0, Convention::StrlenSized, 20.0),
                run(64.0, Convention::StrlenSized, 20.0),
            ],
        );
        let err = build_series(&p).unwrap_err();
        assert!(err.to_string().contains("64: strlen + sized"), "{err}");
    }

    #[test]
    fn repeated_length_is_rejected() {
        let p = partition(
            vec![
                run(16.0, Convention::Unsized, 10.0),
                run(16.0, Convention::Unsized, 11.0),
            ],
            vec![
                run(16.0, Convention::StrlenSized, 20.0),
                run(16.0, Convention::StrlenSized, 21.0),
            ],
        );
        assert!(matches!(
            build_series(&p),
            Err(PerfError::PartitionMismatch(_))
        ));
    }

    #[test]
    fn zero_mean_is_malformed() {
        let p = partition(
            vec![run(16.0, Convention::Unsized, 0.0)],
            vec![run(16.0, Convention::StrlenSized, 20.0)],
        );
        assert!(matches!(
            build_series(&p),
            Err(PerfError::MalformedRun { .. })
        ));
    }

    #[test]
    fn negative_mean_passes_through() {
        let p = partition(
            vec![run(16.0, Convention::Unsized, -10.0)],
            vec![run(16.0, Convention::StrlenSized, 20.0)],
        );
        let s = build_series(&p).unwrap();
        assert!(s.unsized_gibps[0] < 0.0);
    }

    #[test]
    fn empty_partition_gives_empty_series() {
        let s = build_series(&Partition::default()).unwrap();
        assert!(s.is_empty());
    }
}
