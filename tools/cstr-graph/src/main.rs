//! Unsized-range benchmark grapher.
//!
//! Reads Catch2 XML benchmark results, extracts the `cstr` test case and
//! plots the throughput of passing a null-terminated buffer as an unsized
//! range against calling `strlen` first and passing a sized range.
//!
//! Pipeline: load XML → select case → pair runs → render SVG → write.

mod cli;
mod verbose;

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};

use anyhow::Result;
use clap::Parser;
use zcrc_perf::{
    CSTR_CASE, ChartStyle, PerfError, build_series, load_document, partition_runs, render_chart,
    select_case, write_chart,
};

use cli::STDIO;
use verbose::{Timer, dprintln, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let doc = {
        let _t = Timer::start("load");
        open_input(&cli.input)
            .and_then(load_document)
            .stage(format_args!("reading {}", describe(&cli.input, "stdin")))?
    };

    let partition = {
        let _t = Timer::start("select");
        select_case(&doc, CSTR_CASE)
            .and_then(partition_runs)
            .stage(format_args!("selecting test case '{CSTR_CASE}'"))?
    };
    vprintln!(
        "  {} unsized runs, {} strlen + sized runs, {} skipped",
        partition.unsized_runs.len(),
        partition.sized_runs.len(),
        partition.skipped
    );

    let series = {
        let _t = Timer::start("build");
        build_series(&partition).stage("computing throughput")?
    };

    let svg = {
        let _t = Timer::start("render");
        render_chart(&series, &ChartStyle::default())
    };

    {
        let _t = Timer::start("write");
        write_output(&cli.output, &svg)
            .stage(format_args!("writing {}", describe(&cli.output, "stdout")))?;
    }

    dprintln!(
        "Wrote {}-point throughput chart to {}",
        series.len(),
        describe(&cli.output, "stdout")
    );
    Ok(())
}

/// Open the results source named on the command line.
fn open_input(path: &str) -> Result<Box<dyn Read>, PerfError> {
    if path == STDIO {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

/// Write the finished chart to the sink named on the command line.
///
/// Only called once the chart is fully rendered, so a failed run never
/// creates or truncates the output file.
fn write_output(path: &str, svg: &str) -> Result<(), PerfError> {
    if path == STDIO {
        return write_chart(svg, io::stdout().lock());
    }
    let file = File::create(path).map_err(PerfError::OutputWrite)?;
    write_chart(svg, BufWriter::new(file))
}

fn describe<'a>(path: &'a str, stream: &'a str) -> &'a str {
    if path == STDIO { stream } else { path }
}

/// Attach the failing pipeline stage and what it was doing to an error.
trait StageContext<T> {
    fn stage(self, doing: impl Display) -> Result<T>;
}

impl<T> StageContext<T> for Result<T, PerfError> {
    fn stage(self, doing: impl Display) -> Result<T> {
        self.map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{stage} stage failed while {doing}"))
        })
    }
}
