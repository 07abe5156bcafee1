mod cli;
mod config;
mod parse;
mod render;

use std::fs;
use std::io::Write as _;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as _;
use itertools::Itertools as _;
use log::{info, warn, LevelFilter};
use plotters::prelude::SVGBackend;
use report_data::{BatchError, BatchIngestor};

use crate::config::Settings;
use crate::parse::UsageRow;

const CHART_SIZE: (u32, u32) = (1280, 720);

fn main() -> Result<()> {
    init_logger();

    let args = cli::Args::parse();
    let settings = read_config()?;
    let policies = settings.machine_policies();

    let ingestor = BatchIngestor::new(&policies);
    let batch = match ingestor.ingest_dir(&args.data_dir) {
        Ok(batch) => batch,
        Err(error) => {
            if let BatchError::EmptyBatch { diagnostics, .. } = &error {
                for diagnostic in diagnostics {
                    warn!("skipped {diagnostic}");
                }
            }
            return Err(error)
                .with_context(|| format!("ingesting usage reports from {}", args.data_dir.display()));
        }
    };

    for diagnostic in &batch.diagnostics {
        warn!("skipped {diagnostic}");
    }
    info!(
        "{} record(s) from {}, {} file(s) skipped",
        batch.records.len(),
        args.data_dir.display(),
        batch.diagnostics.len()
    );

    let mut rows = batch.records.into_iter().map(UsageRow::from).collect_vec();

    if let Some(table) = &args.table {
        let input = fs::read_to_string(table).with_context(|| format!("reading usage table {}", table.display()))?;
        let mut table_rows = parse::usage_table(&input).with_context(|| format!("parsing usage table {}", table.display()))?;
        info!("{} record(s) from usage table {}", table_rows.len(), table.display());
        rows.append(&mut table_rows);
    }

    if args.dump {
        let json = serde_json::to_string_pretty(&rows).context("serializing records")?;
        println!("{json}");
    }

    if let Some(output) = &args.output {
        render::usage_chart(SVGBackend::new(output, CHART_SIZE), &rows, &policies)
            .with_context(|| format!("rendering usage chart to {}", output.display()))?;
        info!("usage chart written to {}", output.display());
    }

    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .init();
}

fn read_config() -> Result<Settings> {
    info!("Loading config");
    Settings::new().map_err(anyhow::Error::new).context("parsing config file")
}
