//! Error types for the extraction pipeline.
//!
//! Every variant is fatal: the batch job aborts on the first error and is
//! meant to be re-run from scratch.

use thiserror::Error;

/// Errors that can occur while extracting news articles.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be opened or an entry could not be read
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed XML in an archive entry
    #[error("XML error in {entry}: {message}")]
    Xml { entry: String, message: String },

    /// Output table could not be written
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Diagnostics report could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A structural element the document must carry is absent
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    /// The `id-string` attribute is not an integer
    #[error("Invalid document id: {0:?}")]
    InvalidDocumentId(String),

    /// The same document id was accepted twice in one run
    #[error("Duplicate document id: {0}")]
    DuplicateDocumentId(i64),

    /// A classifier passed to the category setter is not under `Top/News/`
    #[error("Not a Top/News classifier: {0:?}")]
    NotNewsClassifier(String),

    /// The classifier names a category outside the fixed column set
    #[error("Unknown news category {category:?} in classifier {classifier:?}")]
    UnknownCategory { classifier: String, category: String },

    /// A row mutation arrived before any document id was set
    #[error("No current row to update")]
    NoCurrentRow,

    /// A row never received its body text
    #[error("Row for document {0} has no body text")]
    IncompleteRow(i64),
}

impl From<serde_yaml::Error> for ExtractError {
    fn from(e: serde_yaml::Error) -> Self {
        ExtractError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
