//! Data models for Marks
//!
//! Defines the persisted records (Bookmark, Category, Dataset) and the
//! read-side views handed out by the query engine. Field names are camelCase
//! on the wire and on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A saved link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// The URL
    pub url: String,
    /// Free-form description, empty when not given
    #[serde(default)]
    pub description: String,
    /// Category reference; may dangle
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Tags for organization, in the order given
    #[serde(default)]
    pub tags: Vec<String>,
    /// Times the link was opened
    #[serde(default)]
    pub click_count: u64,
    /// When this bookmark was stored
    pub created_at: DateTime<Utc>,
    /// Fields not modelled above, kept as they were imported or loaded
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bookmark {
    /// Case-insensitive substring match on title, description and tags
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// A named group of bookmarks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    /// Name comparison used for the uniqueness rule
    pub fn same_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// The whole persisted aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest id used by any record, if there are records
    pub fn max_id(&self) -> Option<i64> {
        self.bookmarks
            .iter()
            .map(|b| b.id)
            .chain(self.categories.iter().map(|c| c.id))
            .max()
    }

    pub fn bookmark(&self, id: i64) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

/// A bookmark with its category resolved
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedBookmark {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    /// `null` when uncategorized or when the reference dangles
    pub category: Option<Category>,
}

/// A category with a live bookmark count
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCategory {
    #[serde(flatten)]
    pub category: Category,
    pub bookmark_count: usize,
}

/// Result ordering for bookmark queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Most recently created first
    #[default]
    Newest,
    /// Highest click count first
    MostVisited,
}

impl SortMode {
    /// Parse a sort parameter; anything unrecognised means `Newest`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "most-visited" => SortMode::MostVisited,
            _ => SortMode::Newest,
        }
    }
}

/// Which bookmarks a query keeps by category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Id(i64),
    /// A value no category id can equal; keeps nothing
    Unmatched,
}

impl CategoryFilter {
    /// Sentinel accepted for "no category filter"
    pub const ALL: &'static str = "All";

    /// Parse a category parameter
    ///
    /// Absent, empty or `All` (any case) means no filtering. Anything that
    /// isn't an integer matches no bookmark at all.
    pub fn parse(value: Option<&str>) -> Self {
        let value = match value.map(str::trim) {
            None | Some("") => return CategoryFilter::All,
            Some(v) => v,
        };

        if value.eq_ignore_ascii_case(Self::ALL) {
            return CategoryFilter::All;
        }

        value
            .parse()
            .map(CategoryFilter::Id)
            .unwrap_or(CategoryFilter::Unmatched)
    }

    pub fn keeps(&self, bookmark: &Bookmark) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Id(id) => bookmark.category_id == Some(*id),
            CategoryFilter::Unmatched => false,
        }
    }
}

/// Filter and ordering for `query_bookmarks`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkQuery {
    pub category: CategoryFilter,
    pub search: Option<String>,
    pub sort: SortMode,
}
