//! Output writers for the end of a run.
//!
//! # Submodules
//!
//! - [`parquet`]: writes the materialized [`NewsTable`](crate::models::NewsTable)
//!   as a GZIP-compressed Parquet file
//! - [`json`]: writes the optional label-frequency diagnostics report
//!
//! # Output Structure
//!
//! ```text
//! nyt_full.parquet.gz        # Id, Text, twelve category flags
//! descriptors.json           # only with --descriptor-report
//! ```

pub mod json;
pub mod parquet;
