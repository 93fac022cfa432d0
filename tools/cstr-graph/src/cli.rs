//! Command-line interface definitions for cstr-graph.

use clap::Parser;

/// Construct the graph demonstrating the benefit of accepting unsized
/// contiguous ranges.
#[derive(Parser)]
#[command(name = "cstr-graph", version, about)]
pub struct Cli {
    /// Path to benchmark results in Catch2 XML format (`-` for stdin).
    #[arg(short = 'i', value_name = "PATH")]
    pub input: String,

    /// File to write the resulting SVG graph to (`-` for stdout).
    #[arg(short = 'o', value_name = "PATH")]
    pub output: String,

    /// Print nothing but errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report run counts and per-stage timings on stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// `-` names the standard stream instead of a file.
pub const STDIO: &str = "-";
