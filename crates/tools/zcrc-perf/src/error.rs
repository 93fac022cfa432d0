//! Error types for the benchmark charting pipeline.

use std::fmt;
use std::io;

/// Errors that can occur while turning benchmark results into a chart.
#[derive(Debug)]
pub enum PerfError {
    /// The input could not be opened, read, or decoded as UTF-8.
    InputAccess(io::Error),
    /// The input is not well-formed XML.
    Parse {
        /// Byte offset in the input where the parser gave up.
        position: u64,
        /// Parser diagnostic.
        message: String,
    },
    /// No test case with the requested name exists.
    MissingCase(String),
    /// More than one test case carries the requested name.
    DuplicateCase {
        /// Requested case name.
        name: String,
        /// Number of matching test cases.
        count: usize,
    },
    /// A run is missing its size prefix or mean, or its values are unusable.
    MalformedRun {
        /// The run's `name` attribute (empty if absent).
        run: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The unsized and sized runs do not pair up one-to-one by message length.
    PartitionMismatch(String),
    /// The chart could not be written to its sink.
    OutputWrite(io::Error),
}

impl PerfError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InputAccess(_) | Self::Parse { .. } => "load",
            Self::MissingCase(_) | Self::DuplicateCase { .. } => "select",
            Self::MalformedRun { .. } | Self::PartitionMismatch(_) => "build",
            Self::OutputWrite(_) => "write",
        }
    }

    pub(crate) fn malformed(run: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRun {
            run: run.to_owned(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PerfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputAccess(e) => write!(f, "cannot read benchmark results: {e}"),
            Self::Parse { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::MissingCase(name) => write!(f, "no test case named '{name}' in results"),
            Self::DuplicateCase { name, count } => {
                write!(f, "{count} test cases named '{name}' in results (expected one)")
            }
            Self::MalformedRun { run, reason } => write!(f, "malformed run '{run}': {reason}"),
            Self::PartitionMismatch(msg) => write!(f, "unsized/sized runs do not pair up: {msg}"),
            Self::OutputWrite(e) => write!(f, "cannot write chart: {e}"),
        }
    }
}

impl std::error::Error for PerfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InputAccess(e) | Self::OutputWrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PerfError {
    fn from(e: io::Error) -> Self {
        Self::InputAccess(e)
    }
}
