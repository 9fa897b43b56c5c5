//! Archive walking and the per-document parse/classify/extract cycle.
//!
//! Each qualifying zip entry is parsed, classified and, when accepted, its
//! fields are forwarded to a [`DocumentSink`]. Everything is sequential and
//! every error aborts the run.

use crate::classify::{has_full_text, is_correction, is_news};
use crate::error::{ExtractError, Result};
use crate::extract::{get_document_id, get_general_descriptors, get_top_news, process_body};
use crate::sink::DocumentSink;
use crate::xml::parse_document;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, info, instrument, trace};
use zip::ZipArchive;

const NITF_ROOT: &str = "nitf";

/// Counters for one archive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub entries: usize,
    pub documents: usize,
    pub accepted: usize,
}

/// Article entries end in `.xml`; names containing `__` are archive metadata
/// (e.g. `__MACOSX/...`).
pub fn is_article_entry(name: &str) -> bool {
    name.ends_with(".xml") && !name.contains("__")
}

/// Parse, classify and, if accepted, forward one document to `sink`.
///
/// Returns whether the document was accepted. Rejected documents produce no
/// sink calls at all. The body is only inspected once the labels say news, so
/// a news document without `body`/`body.content` is fatal while any other
/// document is simply skipped.
pub fn process_xml<S: DocumentSink + ?Sized>(name: &str, raw: &[u8], sink: &mut S) -> Result<bool> {
    let doc = parse_document(name, raw)?;
    if doc.name() != NITF_ROOT {
        return Err(ExtractError::MissingElement("nitf"));
    }
    let docdata = doc
        .find("head")
        .and_then(|head| head.find("docdata"))
        .ok_or(ExtractError::MissingElement("head/docdata"))?;
    let classifiers = docdata.find_all("classifier");

    if !(is_news(&classifiers) && has_full_text(&doc)? && !is_correction(&doc)?) {
        trace!(entry = name, "Skipping document");
        return Ok(false);
    }

    // set_document_id opens the row the category setter mutates.
    let id = get_document_id(docdata)?;
    sink.set_document_id(&id)?;
    sink.process_general_descriptors(&get_general_descriptors(&classifiers))?;
    sink.process_taxonomic_news_classifiers(&get_top_news(&classifiers))?;
    sink.process_body(process_body(&doc)?)?;
    debug!(entry = name, %id, "Accepted document");
    Ok(true)
}

/// Run every article entry of an archive through [`process_xml`], in archive
/// order.
pub fn process_archive<R, S>(reader: R, sink: &mut S) -> Result<ArchiveStats>
where
    R: Read + Seek,
    S: DocumentSink + ?Sized,
{
    let mut archive = ZipArchive::new(reader)?;
    let mut stats = ArchiveStats::default();
    let mut raw = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        stats.entries += 1;
        if entry.is_dir() || !is_article_entry(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();

        raw.clear();
        entry.read_to_end(&mut raw)?;
        stats.documents += 1;
        if process_xml(&name, &raw, sink)? {
            stats.accepted += 1;
        }
    }

    Ok(stats)
}

/// Open an archive on disk and process it.
///
/// # Arguments
///
/// * `path` - A `nyt_corpus_{year}.zip` style archive
/// * `sink` - Receives the fields of every accepted document
///
/// # Returns
///
/// * Entry, document and acceptance counts for this archive
///
/// # Errors
///
/// * [`ExtractError::Io`] if the archive cannot be opened or an entry read
/// * [`ExtractError::Zip`] if the file is not a readable zip archive
/// * Any error of [`process_xml`] or the sink, for the first failing entry
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn process_archive_file<S: DocumentSink + ?Sized>(path: &Path, sink: &mut S) -> Result<ArchiveStats> {
    let file = File::open(path)?;
    let stats = process_archive(BufReader::new(file), sink)?;
    info!(
        entries = stats.entries,
        documents = stats.documents,
        accepted = stats.accepted,
        "Processed archive"
    );
    Ok(stats)
}
