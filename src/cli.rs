//! Command-line interface definitions.
//!
//! Every option may also come from the YAML file given with `--config`;
//! flags given on the command line win.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the extractor.
///
/// # Examples
///
/// ```sh
/// # Whole corpus, default years 1987-2007
/// nyt_news_extract -d /data/nyt
///
/// # A few years with a diagnostics report
/// nyt_news_extract -d /data/nyt --first-year 2004 --last-year 2005 \
///     --descriptor-report descriptors.json
///
/// # One archive
/// nyt_news_extract -d /data/nyt -f nyt_corpus_2004.zip -o nyt_2004.parquet.gz
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Folder holding the yearly corpus archives
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// First year to process (inclusive)
    #[arg(long)]
    pub first_year: Option<u16>,

    /// Last year to process (inclusive)
    #[arg(long)]
    pub last_year: Option<u16>,

    /// Process a single archive in the data folder instead of a year range
    #[arg(short, long)]
    pub file: Option<String>,

    /// Output Parquet file; an existing file is replaced
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write label frequency counts as JSON to this path
    #[arg(long)]
    pub descriptor_report: Option<PathBuf>,

    /// Classify and count accepted articles without writing a table
    #[arg(long)]
    pub dry_run: bool,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
