//! Parquet output for the materialized news table.
//!
//! # Layout
//!
//! A single row group with the columns, in order:
//!
//! | Column | Type |
//! |--------|------|
//! | `Id` | `INT64` |
//! | `Text` | `BYTE_ARRAY (UTF8)` |
//! | `World` … `Technology` | `INT64`, 0 or 1 |
//!
//! Pages are GZIP compressed.

use crate::error::Result;
use crate::models::{Category, NewsTable};
use parquet::basic::{Compression, GzipLevel};
use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parquet message type for the news table.
pub fn message_type() -> String {
    let mut schema = String::from("message news {\n  REQUIRED INT64 Id;\n  REQUIRED BYTE_ARRAY Text (UTF8);\n");
    for category in Category::ALL {
        schema.push_str(&format!("  REQUIRED INT64 {};\n", category.column_name()));
    }
    schema.push('}');
    schema
}

/// Write `table` to `path` as a single GZIP-compressed row group.
///
/// # Arguments
///
/// * `table` - The materialized table returned by the accumulator's `close()`
/// * `path` - Destination file; an existing file is truncated
///
/// # Returns
///
/// * `Ok(())` once the Parquet footer is written and the file closed
///
/// # Errors
///
/// * [`ExtractError::Io`](crate::error::ExtractError::Io) if the file cannot be created
/// * [`ExtractError::Parquet`](crate::error::ExtractError::Parquet) if encoding
///   or writing a column fails
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.len()))]
pub fn write_table(table: &NewsTable, path: &Path) -> Result<()> {
    if table.is_empty() {
        warn!("Writing a news table with no rows");
    }

    let schema = Arc::new(parse_message_type(&message_type())?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::GZIP(GzipLevel::default()))
            .build(),
    );
    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;

    let mut row_group = writer.next_row_group()?;
    let mut index = 0;
    while let Some(mut column) = row_group.next_column()? {
        match index {
            0 => {
                column
                    .typed::<Int64Type>()
                    .write_batch(table.ids(), None, None)?;
            }
            1 => {
                let texts: Vec<ByteArray> = table
                    .texts()
                    .iter()
                    .map(|text| ByteArray::from(text.as_str()))
                    .collect();
                column
                    .typed::<ByteArrayType>()
                    .write_batch(&texts, None, None)?;
            }
            n => {
                let category = Category::ALL[n - 2];
                column
                    .typed::<Int64Type>()
                    .write_batch(table.category(category), None, None)?;
            }
        }
        column.close()?;
        index += 1;
    }
    row_group.close()?;
    writer.close()?;

    info!("Wrote news table");
    Ok(())
}
