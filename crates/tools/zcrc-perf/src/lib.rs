//! Throughput charting for zcrc benchmark results.
//!
//! Loads Catch2 XML benchmark output, picks the test case comparing a
//! null-terminated input passed as an unsized range against `strlen`
//! followed by a sized range, converts mean latencies into GiB/s, and
//! renders both curves as an SVG line chart.
//!
//! Pipeline: [`record`] → [`select`] → [`series`] → [`chart`].

pub mod chart;
pub mod error;
pub mod record;
pub mod select;
pub mod series;

pub use chart::{ChartContext, ChartStyle, render_chart, write_chart};
pub use error::PerfError;
pub use record::{Document, Element, load_document, parse_document};
pub use select::{Convention, Partition, RunResult, partition_runs, select_case};
pub use series::{ThroughputSeries, build_series, throughput_gibps};

/// Name of the Catch2 test case holding the unsized/sized comparison.
pub const CSTR_CASE: &str = "cstr";

/// Everything extracted from a results document, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseChart {
    /// Paired throughput series.
    pub series: ThroughputSeries,
    /// Runs in the case that matched neither convention.
    pub skipped_runs: usize,
    /// Rendered SVG document.
    pub svg: String,
}

/// Run the whole pipeline on already-read XML text.
///
/// Nothing is written anywhere; callers decide where the SVG goes once every
/// stage has succeeded.
pub fn render_case_chart(xml: &str, case: &str, style: &ChartStyle) -> Result<CaseChart, PerfError> {
    let doc = parse_document(xml)?;
    let partition = partition_runs(select_case(&doc, case)?)?;
    let series = build_series(&partition)?;
    let svg = render_chart(&series, style);
    Ok(CaseChart {
        series,
        skipped_runs: partition.skipped,
        svg,
    })
}
