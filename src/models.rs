//! Data models for accepted news articles and the accumulated table.
//!
//! This module defines the structures shared across the pipeline:
//! - [`Category`]: the twelve fixed main news sections, one table column each
//! - [`NewsRow`]: one accepted article while it is being accumulated
//! - [`NewsTable`]: the immutable columnar table produced at the end of a run
//! - [`DescriptorStats`]: label frequency counts kept for diagnostics

use serde::Serialize;
use std::collections::HashMap;

/// A main news section of the editorial taxonomy.
///
/// The declaration order is the column order of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    World,
    Washington,
    NewYorkAndRegion,
    FrontPage,
    Business,
    Us,
    Sports,
    Obituaries,
    Health,
    Education,
    Science,
    Technology,
}

impl Category {
    /// All categories in column order.
    pub const ALL: [Category; 12] = [
        Category::World,
        Category::Washington,
        Category::NewYorkAndRegion,
        Category::FrontPage,
        Category::Business,
        Category::Us,
        Category::Sports,
        Category::Obituaries,
        Category::Health,
        Category::Education,
        Category::Science,
        Category::Technology,
    ];

    /// The output column name, e.g. `New_York_and_Region`.
    pub fn column_name(self) -> &'static str {
        match self {
            Category::World => "World",
            Category::Washington => "Washington",
            Category::NewYorkAndRegion => "New_York_and_Region",
            Category::FrontPage => "Front_Page",
            Category::Business => "Business",
            Category::Us => "US",
            Category::Sports => "Sports",
            Category::Obituaries => "Obituaries",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Science => "Science",
            Category::Technology => "Technology",
        }
    }

    /// Look up a category by its normalized column key.
    pub fn from_column_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.column_name() == name)
    }

    /// Position of this category's flag inside a row.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One accepted article while the run is still in progress.
///
/// The text is filled in after the category flags, so it starts out empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRow {
    pub id: i64,
    pub text: Option<String>,
    pub flags: [bool; 12],
}

impl NewsRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            text: None,
            flags: [false; 12],
        }
    }
}

/// The materialized table: `Id`, `Text`, then one 0/1 column per category.
///
/// Built once by the accumulator's `close()`; there is no way to add rows to
/// it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsTable {
    ids: Vec<i64>,
    texts: Vec<String>,
    flags: [Vec<i64>; 12],
}

impl NewsTable {
    pub(crate) fn from_columns(ids: Vec<i64>, texts: Vec<String>, flags: [Vec<i64>; 12]) -> Self {
        Self { ids, texts, flags }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// The 0/1 column for a category.
    pub fn category(&self, category: Category) -> &[i64] {
        &self.flags[category.index()]
    }
}

/// Frequency counts of the labels seen on accepted articles.
///
/// Informational only; never written to the table.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DescriptorStats {
    pub general_descriptors: HashMap<String, u64>,
    pub news_classifiers: HashMap<String, u64>,
}
