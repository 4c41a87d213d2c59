//! Unified storage interface
//!
//! The `Store` ties the JSON persistence to the query and mutation engines.
//!
//! ## Consistency
//!
//! Every write is a whole-snapshot read-modify-write cycle. A writer mutex is
//! held from the load until the save completes, so concurrent mutations run
//! one after another and never lose each other's changes. Reads take no lock
//! and may see a snapshot that is one write behind; atomic saves mean they
//! never see a torn file.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::new(Config::load()?);
//!
//! let created = store.create_bookmark(NewBookmark::new("Rust", "https://rust-lang.org"))?;
//! store.record_click(created.id)?;
//!
//! let hits = store.query_bookmarks(&BookmarkQuery::default())?;
//! ```

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::input::NewBookmark;
use crate::models::{
    Bookmark, BookmarkQuery, Category, Dataset, EnrichedBookmark, EnrichedCategory,
};
use crate::storage::JsonPersistence;
use crate::{mutation, query};

/// Bookmark store shared by every request
pub struct Store {
    persistence: JsonPersistence,
    ids: IdGenerator,
    /// Held for the full load-modify-save span of a mutation
    writer: Mutex<()>,
    config: Config,
}

impl Store {
    /// Create a store over the configured data file
    ///
    /// Nothing is read yet; a missing or broken file only surfaces as an
    /// error from the first operation that touches it.
    pub fn new(config: Config) -> Self {
        Self {
            persistence: JsonPersistence::new(&config),
            ids: IdGenerator::new(),
            writer: Mutex::new(()),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Location of the dataset file
    pub fn data_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Load the current snapshot
    pub fn snapshot(&self) -> Result<Dataset> {
        self.persistence.load()
    }

    /// Run `f` against a fresh snapshot under the writer lock, saving the
    /// result only if `f` succeeds
    fn mutate<T>(&self, f: impl FnOnce(&mut Dataset) -> Result<T>) -> Result<T> {
        // The guarded value is `()`; the data file is the real state
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut dataset = self.persistence.load()?;
        if let Some(max) = dataset.max_id() {
            self.ids.observe(max);
        }

        let out = f(&mut dataset)?;
        self.persistence.save(&dataset)?;
        Ok(out)
    }

    // ==================== Queries ====================

    /// Filtered, searched, sorted and enriched bookmarks
    pub fn query_bookmarks(&self, query: &BookmarkQuery) -> Result<Vec<EnrichedBookmark>> {
        let dataset = self.snapshot()?;
        let results = query::query_bookmarks(&dataset, query);
        debug!(?query, results = results.len(), "queried bookmarks");
        Ok(results)
    }

    /// One bookmark with its category
    pub fn get_bookmark(&self, id: i64) -> Result<EnrichedBookmark> {
        let dataset = self.snapshot()?;
        query::find_bookmark(&dataset, id).ok_or(Error::NotFound { id })
    }

    /// Categories annotated with live bookmark counts
    pub fn list_categories(&self) -> Result<Vec<EnrichedCategory>> {
        let dataset = self.snapshot()?;
        Ok(query::list_categories(&dataset))
    }

    /// The complete dataset, for backups
    pub fn export(&self) -> Result<Dataset> {
        self.snapshot()
    }

    // ==================== Mutations ====================

    /// Validate and store a new bookmark
    pub fn create_bookmark(&self, input: NewBookmark) -> Result<Bookmark> {
        let bookmark =
            self.mutate(|ds| mutation::create_bookmark(ds, &self.ids, input, Utc::now()))?;
        info!(id = bookmark.id, url = %bookmark.url, "created bookmark");
        Ok(bookmark)
    }

    /// Delete a bookmark
    pub fn delete_bookmark(&self, id: i64) -> Result<Bookmark> {
        let removed = self.mutate(|ds| mutation::delete_bookmark(ds, id))?;
        info!(id, "deleted bookmark");
        Ok(removed)
    }

    /// Count one visit, returning the new click count
    pub fn record_click(&self, id: i64) -> Result<u64> {
        let count = self.mutate(|ds| mutation::record_click(ds, id))?;
        debug!(id, count, "recorded click");
        Ok(count)
    }

    /// Create a category with a case-insensitively unique name
    pub fn create_category(&self, name: &str) -> Result<Category> {
        let category = self.mutate(|ds| mutation::create_category(ds, &self.ids, name))?;
        info!(id = category.id, name = %category.name, "created category");
        Ok(category)
    }

    /// Append a batch of externally sourced bookmarks in one write
    ///
    /// `raw` must be a JSON array of objects. Returns the number imported.
    pub fn import_bookmarks(&self, raw: &Value) -> Result<usize> {
        let items = mutation::parse_import(raw)?;
        let fallback = self.config.import_category_id;
        let count = self.mutate(|ds| {
            mutation::import_bookmarks(ds, &self.ids, items, fallback, Utc::now())
        })?;
        info!(count, "imported bookmarks");
        Ok(count)
    }
}
