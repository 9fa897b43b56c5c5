//! Run configuration: defaults, an optional YAML file, then CLI overrides.
//!
//! ```yaml
//! data_dir: /data/nyt
//! first_year: 1987
//! last_year: 2007
//! archive_template: "nyt_corpus_{year}.zip"
//! output: nyt_full.parquet.gz
//! descriptor_report: reports/descriptors.json
//! ```

use crate::cli::Cli;
use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FIRST_CORPUS_YEAR: u16 = 1987;
pub const LAST_CORPUS_YEAR: u16 = 2007;
const YEAR_PLACEHOLDER: &str = "{year}";

/// Settings as read from the YAML file; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub first_year: Option<u16>,
    pub last_year: Option<u16>,
    pub archive_template: Option<String>,
    pub output: Option<PathBuf>,
    pub descriptor_report: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ExtractError::Config(format!("{}: {e}", path.display())))?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Which archives a run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSelection {
    /// One archive per year, inclusive, increasing.
    Years {
        first: u16,
        last: u16,
        template: String,
    },
    /// A single named archive.
    File(String),
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub archives: ArchiveSelection,
    pub output: PathBuf,
    pub descriptor_report: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge CLI flags over the YAML file (if any) over defaults.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed command line; `--config` names the optional YAML file
    ///
    /// # Returns
    ///
    /// * The effective configuration for the run
    ///
    /// # Errors
    ///
    /// * [`ExtractError::Config`] if the config file cannot be read or parsed
    ///   (unknown keys included), the year range is inverted, or the archive
    ///   template lacks `{year}`
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self> {
        let archives = match &cli.file {
            Some(name) => ArchiveSelection::File(name.clone()),
            None => {
                let first = cli.first_year.or(file.first_year).unwrap_or(FIRST_CORPUS_YEAR);
                let last = cli.last_year.or(file.last_year).unwrap_or(LAST_CORPUS_YEAR);
                if first > last {
                    return Err(ExtractError::Config(format!(
                        "first year {first} is after last year {last}"
                    )));
                }
                let template = file
                    .archive_template
                    .unwrap_or_else(|| "nyt_corpus_{year}.zip".to_string());
                if !template.contains(YEAR_PLACEHOLDER) {
                    return Err(ExtractError::Config(format!(
                        "archive template {template:?} has no {YEAR_PLACEHOLDER} placeholder"
                    )));
                }
                ArchiveSelection::Years { first, last, template }
            }
        };

        Ok(Self {
            data_dir: cli
                .data_dir
                .clone()
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            archives,
            output: cli
                .output
                .clone()
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from("nyt_full.parquet.gz")),
            descriptor_report: cli.descriptor_report.clone().or(file.descriptor_report),
            dry_run: cli.dry_run,
        })
    }

    /// Archive paths in processing order.
    pub fn archive_paths(&self) -> Vec<PathBuf> {
        match &self.archives {
            ArchiveSelection::File(name) => vec![self.data_dir.join(name)],
            ArchiveSelection::Years { first, last, template } => (*first..=*last)
                .map(|year| {
                    self.data_dir
                        .join(template.replace(YEAR_PLACEHOLDER, &year.to_string()))
                })
                .collect(),
        }
    }
}
