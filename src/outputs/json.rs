//! JSON diagnostics report of label frequencies.
//!
//! The accumulator counts every general descriptor and `Top/News/...`
//! classifier it sees. These counts never reach the table; this report is
//! the only place they are written.
//!
//! # Output Structure
//!
//! ```text
//! {
//!   "generated_at": "2026-10-18T12:00:00+00:00",
//!   "documents": 1234,
//!   "general_descriptors": [{"label": "Politics and Government", "count": 97}, ...],
//!   "news_classifiers": [{"label": "Top/News/U.S.", "count": 311}, ...]
//! }
//! ```

use crate::error::Result;
use crate::models::DescriptorStats;
use chrono::Utc;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct DescriptorReport {
    pub generated_at: String,
    pub documents: usize,
    pub general_descriptors: Vec<LabelCount>,
    pub news_classifiers: Vec<LabelCount>,
}

/// Most frequent first; ties in label order so output is stable.
fn ranked(counts: &HashMap<String, u64>) -> Vec<LabelCount> {
    counts
        .iter()
        .sorted_by(|(a_label, a_count), (b_label, b_count)| {
            b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
        })
        .map(|(label, count)| LabelCount {
            label: label.clone(),
            count: *count,
        })
        .collect()
}

impl DescriptorReport {
    pub fn new(stats: &DescriptorStats, documents: usize) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            documents,
            general_descriptors: ranked(&stats.general_descriptors),
            news_classifiers: ranked(&stats.news_classifiers),
        }
    }
}

/// Write the frequency report to `path`, creating parent directories.
///
/// # Arguments
///
/// * `stats` - Label counts returned by the accumulator's `close()`
/// * `documents` - Number of accepted documents, recorded in the report
/// * `path` - Destination JSON file; an existing file is overwritten
///
/// # Errors
///
/// * [`ExtractError::Json`](crate::error::ExtractError::Json) if serialization fails
/// * [`ExtractError::Io`](crate::error::ExtractError::Io) if the directory or file
///   cannot be written
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_descriptor_report(stats: &DescriptorStats, documents: usize, path: &Path) -> Result<()> {
    let report = DescriptorReport::new(stats, documents);
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    info!(
        general_descriptors = report.general_descriptors.len(),
        news_classifiers = report.news_classifiers.len(),
        "Wrote descriptor report"
    );
    Ok(())
}
