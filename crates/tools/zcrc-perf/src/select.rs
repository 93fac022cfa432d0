//! Test case selection and run partitioning.
//!
//! Locates one `TestCase` by name, then splits its `BenchmarkResults`
//! children into the two calling conventions being compared. Runs are
//! validated into [`RunResult`] here, once, so later stages work on typed
//! values only.

use crate::error::PerfError;
use crate::record::{Document, Element};

/// Tag of a test case element.
const TEST_CASE_TAG: &str = "TestCase";
/// Tag of one benchmark run inside a test case.
const RUN_TAG: &str = "BenchmarkResults";
/// Tag of the mean statistic inside a run.
const MEAN_TAG: &str = "mean";

/// How the benchmarked routine received its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Passed as an unsized range; the callee finds the terminator.
    Unsized,
    /// Length computed with `strlen` first, then passed as a sized range.
    StrlenSized,
}

impl Convention {
    /// Run-name suffix identifying this convention.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Unsized => "unsized",
            Self::StrlenSized => "strlen + sized",
        }
    }

    /// Classify a run by the suffix of its name.
    pub fn classify(run_name: &str) -> Option<Self> {
        [Self::Unsized, Self::StrlenSized]
            .into_iter()
            .find(|c| run_name.ends_with(c.suffix()))
    }
}

/// One validated benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Full run name, e.g. `"1024: unsized"`.
    pub name: String,
    /// Calling convention the run measured.
    pub convention: Convention,
    /// Message length in bytes, taken from the name prefix.
    pub message_len: f64,
    /// Mean time per iteration in nanoseconds.
    pub mean_ns: f64,
}

impl RunResult {
    /// Validate a `BenchmarkResults` element of a known convention.
    pub fn from_element(element: &Element, convention: Convention) -> Result<Self, PerfError> {
        let name = element.attr("name").unwrap_or_default();
        let message_len = message_len(name)?;

        let mean = element
            .child(MEAN_TAG)
            .ok_or_else(|| PerfError::malformed(name, "no <mean> statistic"))?;
        let raw = mean
            .attr("value")
            .ok_or_else(|| PerfError::malformed(name, "<mean> has no value"))?;
        let mean_ns: f64 = raw
            .trim()
            .parse()
            .map_err(|_| PerfError::malformed(name, format!("mean '{raw}' is not a number")))?;

        Ok(Self {
            name: name.to_owned(),
            convention,
            message_len,
            mean_ns,
        })
    }
}

/// Parse the message length encoded before the first colon of a run name.
pub fn message_len(run_name: &str) -> Result<f64, PerfError> {
    let (prefix, _) = run_name
        .split_once(':')
        .ok_or_else(|| PerfError::malformed(run_name, "name has no '<bytes>:' prefix"))?;
    let len: f64 = prefix.trim().parse().map_err(|_| {
        PerfError::malformed(run_name, format!("'{prefix}' is not a message length"))
    })?;
    // The x-axis is logarithmic.
    if !len.is_finite() || len <= 0.0 {
        return Err(PerfError::malformed(
            run_name,
            format!("message length {len} must be positive"),
        ));
    }
    Ok(len)
}

/// Runs of one test case, split by calling convention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Runs whose name ends in `"unsized"`, in document order.
    pub unsized_runs: Vec<RunResult>,
    /// Runs whose name ends in `"strlen + sized"`, in document order.
    pub sized_runs: Vec<RunResult>,
    /// Number of runs matching neither suffix.
    pub skipped: usize,
}

/// Find the single direct child `TestCase` of the root named `case`.
///
/// Duplicate names are rejected rather than resolved to the first match.
pub fn select_case<'a>(doc: &'a Document, case: &str) -> Result<&'a Element, PerfError> {
    let mut matches = doc
        .root()
        .children_tagged(TEST_CASE_TAG)
        .filter(|tc| tc.attr("name") == Some(case));

    let first = matches
        .next()
        .ok_or_else(|| PerfError::MissingCase(case.to_owned()))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(PerfError::DuplicateCase {
            name: case.to_owned(),
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Split a test case's direct `BenchmarkResults` children by convention.
///
/// Only runs that land in a partition are validated; others are counted and
/// dropped.
pub fn partition_runs(test_case: &Element) -> Result<Partition, PerfError> {
    let mut partition = Partition::default();
    for run in test_case.children_tagged(RUN_TAG) {
        let name = run.attr("name").unwrap_or_default();
        match Convention::classify(name) {
            Some(convention @ Convention::Unsized) => partition
                .unsized_runs
                .push(RunResult::from_element(run, convention)?),
            Some(convention @ Convention::StrlenSized) => partition
                .sized_runs
                .push(RunResult::from_element(run, convention)?),
            None => partition.skipped += 1,
        }
    }
    Ok(partition)
}
