//! # NYT News Extract
//!
//! Builds a labeled news dataset from the yearly archives of the New York
//! Times Annotated Corpus. Each archive is a zip of per-article NITF XML
//! files; articles that are real news with a full text are kept, tagged with
//! their main news sections, and written out as one Parquet table.
//!
//! ## Usage
//!
//! ```sh
//! nyt_news_extract -d /data/nyt --first-year 1987 --last-year 2007 -o nyt_full.parquet.gz
//! ```
//!
//! ## Architecture
//!
//! The run is a single sequential pass:
//! 1. **Reading**: walk every `.xml` entry of each yearly archive in order
//! 2. **Classifying**: keep news articles with one full-text block and no
//!    correction
//! 3. **Accumulating**: one row per article (id, text, twelve section flags)
//!    in a single accumulator shared by all years
//! 4. **Output**: materialize the table once and write it as GZIP Parquet
//!
//! Any anomaly (duplicate id, unknown section, malformed XML) aborts the run.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod classify;
mod cli;
mod config;
mod error;
mod extract;
mod models;
mod outputs;
mod pipeline;
mod sink;
mod utils;
mod xml;

use cli::Cli;
use config::RunConfig;
use pipeline::{process_archive_file, ArchiveStats};
use sink::{CountingSink, DocumentSink, NewsAccumulator};
use utils::{ensure_writable_parent, remove_stale_output};

fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("nyt_news_extract starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = run(&args) {
        error!(error = %e, "Extraction aborted");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn run(args: &Cli) -> error::Result<()> {
    let config = RunConfig::resolve(args)?;
    info!(
        data_dir = %config.data_dir.display(),
        output = %config.output.display(),
        archives = config.archive_paths().len(),
        dry_run = config.dry_run,
        "Resolved configuration"
    );

    if config.dry_run {
        let mut sink = CountingSink::default();
        let totals = process_all(&config, &mut sink)?;
        info!(
            documents = totals.documents,
            accepted = sink.documents,
            "Dry run complete"
        );
        return Ok(());
    }

    // Fail before a long run rather than after it, and never leave a
    // previous run's table where an aborted run should have written one.
    ensure_writable_parent(&config.output)?;
    remove_stale_output(&config.output)?;
    if let Some(report) = &config.descriptor_report {
        ensure_writable_parent(report)?;
        remove_stale_output(report)?;
    }

    let mut accumulator = NewsAccumulator::new();
    let totals = process_all(&config, &mut accumulator)?;
    if accumulator.is_empty() {
        warn!(documents = totals.documents, "No document qualified as news");
    }
    info!(
        rows = accumulator.len(),
        documents = totals.documents,
        general_descriptors = accumulator.stats().general_descriptors.len(),
        news_classifiers = accumulator.stats().news_classifiers.len(),
        "Accumulated news rows"
    );

    let (table, stats) = accumulator.close()?;
    info!(rows = table.len(), "Materialized news table");

    outputs::parquet::write_table(&table, &config.output)?;
    if let Some(report) = &config.descriptor_report {
        outputs::json::write_descriptor_report(&stats, table.len(), report)?;
    }
    Ok(())
}

/// Feed every configured archive, in order, into one sink.
fn process_all<S: DocumentSink>(config: &RunConfig, sink: &mut S) -> error::Result<ArchiveStats> {
    let mut totals = ArchiveStats::default();
    for path in config.archive_paths() {
        info!(archive = %archive_label(&path), "Processing archive");
        let stats = process_archive_file(&path, sink)?;
        totals.entries += stats.entries;
        totals.documents += stats.documents;
        totals.accepted += stats.accepted;
    }
    Ok(totals)
}

fn archive_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("nyt_news_extract").chain(args.iter().copied()))
    }

    #[test]
    fn test_failed_run_removes_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nyt_full.parquet.gz");
        let report = dir.path().join("descriptors.json");
        fs::write(&output, b"table from an earlier run").unwrap();
        fs::write(&report, b"{}").unwrap();

        let data_dir = dir.path().to_str().unwrap();
        let args = cli(&[
            "-d",
            data_dir,
            "-f",
            "nyt_corpus_1987.zip",
            "-o",
            output.to_str().unwrap(),
            "--descriptor-report",
            report.to_str().unwrap(),
        ]);

        assert!(matches!(run(&args), Err(error::ExtractError::Io(_))));
        assert!(!output.exists());
        assert!(!report.exists());
    }

    #[test]
    fn test_dry_run_leaves_output_alone() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nyt_full.parquet.gz");
        fs::write(&output, b"table from an earlier run").unwrap();

        let args = cli(&[
            "-d",
            dir.path().to_str().unwrap(),
            "-f",
            "nyt_corpus_1987.zip",
            "-o",
            output.to_str().unwrap(),
            "--dry-run",
        ]);

        assert!(run(&args).is_err());
        assert!(output.exists());
    }

    #[test]
    fn test_archive_label() {
        assert_eq!(archive_label(Path::new("/data/nyt/nyt_corpus_1987.zip")), "nyt_corpus_1987.zip");
    }
}
