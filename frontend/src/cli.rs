use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "usage-visual", about = "Normalize HPC usage reports and visualize core-hour usage")]
pub struct Args {
    /// Directory holding the per-machine usage report files (.txt/.log).
    #[arg(long)]
    pub data_dir: PathBuf,

    /// Fixed-column usage table (spreadsheet export) to merge in.
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Write the allocated-vs-used chart to this SVG file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the normalized records as JSON on stdout.
    #[arg(long)]
    pub dump: bool,
}
