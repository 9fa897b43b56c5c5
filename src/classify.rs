//! Document classification: which archive entries count as real news.
//!
//! A document is accepted when its taxonomy labels place it under a specific
//! `Top/News/...` section, it carries exactly one full-text block, and it is
//! not a correction notice.

use crate::error::{ExtractError, Result};
use crate::xml::Element;
use tracing::trace;

pub const TAXONOMIC_CLASSIFIER: &str = "taxonomic_classifier";
pub const GENERAL_DESCRIPTOR: &str = "general_descriptor";
const DESCRIPTOR: &str = "descriptor";
const INDEXING_SERVICE: &str = "indexing_service";

const NEWS_ROOT: &str = "Top/News";
const CORRECTIONS: &str = "Top/News/Corrections";
const CLASSIFIEDS: &str = "Top/Classifieds";
const REVIEWS: &str = "Reviews";

const FULL_TEXT: &str = "full_text";
const CORRECTION_TEXT: &str = "correction_text";

/// Labels whose `type` attribute equals `kind`.
pub fn classifiers_of_type<'a>(
    classifiers: &'a [&'a Element],
    kind: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    classifiers
        .iter()
        .copied()
        .filter(move |c| c.attr("type") == Some(kind))
}

/// Decide whether a document's labels describe a news article.
///
/// Requires a `Top/News` taxonomy path more specific than the bare root, and
/// rejects corrections, editor's notes (empty taxonomy labels), classifieds
/// and reviews.
pub fn is_news(classifiers: &[&Element]) -> bool {
    let taxonomic: Vec<String> = classifiers_of_type(classifiers, TAXONOMIC_CLASSIFIER)
        .map(Element::text)
        .collect();

    let deepest_news_path = taxonomic
        .iter()
        .filter(|text| text.contains(NEWS_ROOT))
        .map(|text| text.split('/').count())
        .max();
    match deepest_news_path {
        Some(depth) if depth > 2 => {}
        _ => {
            trace!(?deepest_news_path, "No specific Top/News path");
            return false;
        }
    }

    let is_correction = taxonomic.iter().any(|text| text == CORRECTIONS);
    let is_editor_note = taxonomic.iter().any(String::is_empty);
    let is_classified = taxonomic.iter().any(|text| text.contains(CLASSIFIEDS));

    // <classifier class="indexing_service" type="descriptor">Reviews</classifier>
    let is_review = classifiers.iter().any(|c| {
        c.attr("class") == Some(INDEXING_SERVICE)
            && c.attr("type") == Some(DESCRIPTOR)
            && c.text() == REVIEWS
    });

    trace!(is_correction, is_editor_note, is_classified, is_review, "Evaluated news labels");
    !(is_correction || is_editor_note || is_classified || is_review)
}

/// Blocks under the body's `body.content` section tagged `class="full_text"`.
///
/// A document without `body` or `body.content` is malformed and fails with
/// [`ExtractError::MissingElement`].
pub fn full_text_blocks(document: &Element) -> Result<Vec<&Element>> {
    let content = document
        .find("body")
        .ok_or(ExtractError::MissingElement("body"))?
        .find("body.content")
        .ok_or(ExtractError::MissingElement("body.content"))?;
    Ok(content
        .find_all("block")
        .into_iter()
        .filter(|block| block.attr("class") == Some(FULL_TEXT))
        .collect())
}

/// True iff the content section has exactly one full-text block.
pub fn has_full_text(document: &Element) -> Result<bool> {
    Ok(full_text_blocks(document)?.len() == 1)
}

/// True iff any block in the body is tagged `class="correction_text"`.
pub fn is_correction(document: &Element) -> Result<bool> {
    let body = document
        .find("body")
        .ok_or(ExtractError::MissingElement("body"))?;
    Ok(body
        .find_all("block")
        .iter()
        .any(|block| block.attr("class") == Some(CORRECTION_TEXT)))
}
