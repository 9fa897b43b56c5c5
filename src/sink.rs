//! Sinks that receive the fields of each accepted document.
//!
//! The pipeline drives a [`DocumentSink`] with four calls per accepted
//! document, always in the same order:
//!
//! 1. [`DocumentSink::set_document_id`] opens a new row
//! 2. [`DocumentSink::process_general_descriptors`]
//! 3. [`DocumentSink::process_taxonomic_news_classifiers`] mutates that row
//! 4. [`DocumentSink::process_body`] completes it
//!
//! [`NewsAccumulator`] builds the output table; [`CountingSink`] only counts
//! and backs dry runs.

use crate::error::{ExtractError, Result};
use crate::models::{Category, DescriptorStats, NewsRow, NewsTable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Category name: the longest run of word characters, whitespace, `.`, `,`,
/// `(` and `)` right after the `Top/News/` prefix.
static CATEGORY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Top/News/([\w\s.,()]+)").expect("category pattern is valid"));

const NEWS_PREFIX: &str = "Top/News/";

/// Receiver for the fields of accepted documents.
///
/// Every method defaults to a no-op so sinks only implement what they use.
pub trait DocumentSink {
    fn set_document_id(&mut self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn process_general_descriptors(&mut self, _descriptors: &[String]) -> Result<()> {
        Ok(())
    }

    fn process_taxonomic_news_classifiers(&mut self, _classifiers: &[String]) -> Result<()> {
        Ok(())
    }

    fn process_body(&mut self, _text: String) -> Result<()> {
        Ok(())
    }
}

/// Counts accepted documents without keeping them.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub documents: u64,
}

impl DocumentSink for CountingSink {
    fn set_document_id(&mut self, _id: &str) -> Result<()> {
        self.documents += 1;
        Ok(())
    }
}

/// Accumulates one row per accepted document for the whole run.
#[derive(Debug, Default)]
pub struct NewsAccumulator {
    ids: HashSet<i64>,
    rows: Vec<NewsRow>,
    stats: DescriptorStats,
}

impl NewsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn stats(&self) -> &DescriptorStats {
        &self.stats
    }

    fn current_row(&mut self) -> Result<&mut NewsRow> {
        self.rows.last_mut().ok_or(ExtractError::NoCurrentRow)
    }

    /// Materialize the accumulated rows into the final table.
    ///
    /// Consumes the accumulator, so nothing can be added afterwards.
    pub fn close(self) -> Result<(NewsTable, DescriptorStats)> {
        let mut ids = Vec::with_capacity(self.rows.len());
        let mut texts = Vec::with_capacity(self.rows.len());
        let mut flags: [Vec<i64>; 12] = Default::default();
        for column in flags.iter_mut() {
            column.reserve(self.rows.len());
        }

        for row in self.rows {
            let text = row.text.ok_or(ExtractError::IncompleteRow(row.id))?;
            ids.push(row.id);
            texts.push(text);
            for (column, set) in flags.iter_mut().zip(row.flags) {
                column.push(i64::from(set));
            }
        }

        debug!(rows = ids.len(), "Materialized news table");
        Ok((NewsTable::from_columns(ids, texts, flags), self.stats))
    }
}

/// Normalize a `Top/News/...` path to its output column key.
///
/// `Top/News/New York and Region/Manhattan` becomes `New_York_and_Region`,
/// `Top/News/U.S.` becomes `US`.
pub fn column_key(classifier: &str) -> Option<String> {
    CATEGORY_PATTERN
        .captures(classifier)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().replace('.', "").replace(' ', "_"))
}

impl DocumentSink for NewsAccumulator {
    /// Open a new row for `id`.
    ///
    /// Uniqueness is checked on the parsed integer, the value that lands in
    /// the `Id` column, so `"007"` and `"7"` are the same document.
    fn set_document_id(&mut self, id: &str) -> Result<()> {
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| ExtractError::InvalidDocumentId(id.to_string()))?;
        if !self.ids.insert(id) {
            return Err(ExtractError::DuplicateDocumentId(id));
        }
        self.rows.push(NewsRow::new(id));
        Ok(())
    }

    fn process_general_descriptors(&mut self, descriptors: &[String]) -> Result<()> {
        for text in descriptors {
            *self.stats.general_descriptors.entry(text.clone()).or_default() += 1;
        }
        Ok(())
    }

    fn process_taxonomic_news_classifiers(&mut self, classifiers: &[String]) -> Result<()> {
        if let Some(stray) = classifiers.iter().find(|c| !c.starts_with(NEWS_PREFIX)) {
            return Err(ExtractError::NotNewsClassifier(stray.clone()));
        }

        for classifier in classifiers {
            let key = column_key(classifier).unwrap_or_default();
            let category = Category::from_column_name(&key).ok_or_else(|| {
                ExtractError::UnknownCategory {
                    classifier: classifier.clone(),
                    category: key.clone(),
                }
            })?;
            self.current_row()?.flags[category.index()] = true;
            *self.stats.news_classifiers.entry(classifier.clone()).or_default() += 1;
        }
        Ok(())
    }

    fn process_body(&mut self, text: String) -> Result<()> {
        self.current_row()?.text = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_key() {
        assert_eq!(column_key("Top/News/Sports").as_deref(), Some("Sports"));
        assert_eq!(column_key("Top/News/World/Africa").as_deref(), Some("World"));
        assert_eq!(column_key("Top/News/U.S.").as_deref(), Some("US"));
        assert_eq!(
            column_key("Top/News/New York and Region").as_deref(),
            Some("New_York_and_Region")
        );
        assert_eq!(column_key("Top/News/Front Page").as_deref(), Some("Front_Page"));
        assert_eq!(column_key("Top/News/").as_deref(), None);
        assert_eq!(column_key("Top/Features/Travel"), None);
    }

    #[test]
    fn test_set_id_then_category() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("123").unwrap();
        acc.process_taxonomic_news_classifiers(&strings(&["Top/News/Sports"])).unwrap();
        acc.process_body("body".to_string()).unwrap();

        let (table, _) = acc.close().unwrap();
        assert_eq!(table.ids(), &[123]);
        assert_eq!(table.category(Category::Sports), &[1]);
        for category in Category::ALL.into_iter().filter(|c| *c != Category::Sports) {
            assert_eq!(table.category(category), &[0], "{}", category.column_name());
        }
    }

    #[test]
    fn test_flags_apply_to_last_row() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("1").unwrap();
        acc.process_taxonomic_news_classifiers(&strings(&["Top/News/World/Asia Pacific"]))
            .unwrap();
        acc.process_body("first".to_string()).unwrap();
        acc.set_document_id("2").unwrap();
        acc.process_taxonomic_news_classifiers(&strings(&[
            "Top/News/U.S.",
            "Top/News/Washington",
            "Top/News/U.S.",
        ]))
        .unwrap();
        acc.process_body("second".to_string()).unwrap();
        assert_eq!(acc.len(), 2);

        let (table, stats) = acc.close().unwrap();
        assert_eq!(table.ids(), &[1, 2]);
        assert_eq!(table.texts(), &["first".to_string(), "second".to_string()]);
        assert_eq!(table.category(Category::World), &[1, 0]);
        assert_eq!(table.category(Category::Us), &[0, 1]);
        assert_eq!(table.category(Category::Washington), &[0, 1]);
        assert_eq!(stats.news_classifiers["Top/News/U.S."], 2);
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("7").unwrap();
        let err = acc.set_document_id("7").unwrap_err();
        assert!(matches!(err, ExtractError::DuplicateDocumentId(7)));
    }

    #[test]
    fn test_duplicate_detected_on_parsed_id() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("007").unwrap();
        let err = acc.set_document_id("7").unwrap_err();
        assert!(matches!(err, ExtractError::DuplicateDocumentId(7)));
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_invalid_id() {
        let mut acc = NewsAccumulator::new();
        assert!(matches!(
            acc.set_document_id("abc"),
            Err(ExtractError::InvalidDocumentId(_))
        ));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_non_news_classifier_is_fatal() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("1").unwrap();
        let err = acc
            .process_taxonomic_news_classifiers(&strings(&["Top/News/World", "Top/Opinion/News/x"]))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotNewsClassifier(ref c) if c == "Top/Opinion/News/x"));
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("1").unwrap();
        let err = acc
            .process_taxonomic_news_classifiers(&strings(&["Top/News/Arts"]))
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnknownCategory { ref category, .. } if category == "Arts"));
    }

    #[test]
    fn test_mutation_without_row() {
        let mut acc = NewsAccumulator::new();
        assert!(matches!(
            acc.process_body("x".to_string()),
            Err(ExtractError::NoCurrentRow)
        ));
        assert!(matches!(
            acc.process_taxonomic_news_classifiers(&strings(&["Top/News/Health"])),
            Err(ExtractError::NoCurrentRow)
        ));
        // An empty classifier list touches nothing.
        acc.process_taxonomic_news_classifiers(&[]).unwrap();
    }

    #[test]
    fn test_close_requires_text() {
        let mut acc = NewsAccumulator::new();
        acc.set_document_id("9").unwrap();
        assert!(matches!(acc.close(), Err(ExtractError::IncompleteRow(9))));
    }

    #[test]
    fn test_descriptor_counts() {
        let mut acc = NewsAccumulator::new();
        acc.process_general_descriptors(&strings(&["Baseball", "Politics", "Baseball"]))
            .unwrap();
        assert_eq!(acc.stats().general_descriptors["Baseball"], 2);
        assert_eq!(acc.stats().general_descriptors["Politics"], 1);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_counting_sink() {
        let mut sink = CountingSink::default();
        sink.set_document_id("1").unwrap();
        sink.process_body("ignored".to_string()).unwrap();
        sink.set_document_id("1").unwrap();
        assert_eq!(sink.documents, 2);
    }
}
