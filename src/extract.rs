//! Field extraction from accepted documents.

use crate::classify::{classifiers_of_type, full_text_blocks, GENERAL_DESCRIPTOR, TAXONOMIC_CLASSIFIER};
use crate::error::{ExtractError, Result};
use crate::xml::{unescape_html, Element};

const NEWS_PREFIX: &str = "Top/News/";

/// The `id-string` of the first `doc-id` under `docdata`.
pub fn get_document_id(docdata: &Element) -> Result<String> {
    docdata
        .find("doc-id")
        .ok_or(ExtractError::MissingElement("doc-id"))?
        .attr("id-string")
        .map(str::to_string)
        .ok_or(ExtractError::MissingElement("doc-id/@id-string"))
}

/// Texts of the `general_descriptor` labels, duplicates kept.
pub fn get_general_descriptors(classifiers: &[&Element]) -> Vec<String> {
    classifiers_of_type(classifiers, GENERAL_DESCRIPTOR)
        .map(Element::text)
        .collect()
}

/// Taxonomy paths strictly below `Top/News`.
pub fn get_top_news(classifiers: &[&Element]) -> Vec<String> {
    classifiers_of_type(classifiers, TAXONOMIC_CLASSIFIER)
        .map(Element::text)
        .filter(|text| text.contains(NEWS_PREFIX))
        .collect()
}

/// Body text of the full-text block: one line per paragraph.
///
/// Paragraph text goes through [`unescape_html`] and `''` becomes `"`.
pub fn process_body(document: &Element) -> Result<String> {
    let blocks = full_text_blocks(document)?;
    let full_text = blocks
        .first()
        .ok_or(ExtractError::MissingElement("block[class=full_text]"))?;

    let paragraphs: Vec<String> = full_text
        .find_all("p")
        .into_iter()
        .map(|p| unescape_html(&p.text()).replace("''", "\""))
        .collect();
    Ok(paragraphs.join("\n"))
}
