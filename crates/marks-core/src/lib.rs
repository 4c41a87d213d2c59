//! Marks Core Library
//!
//! This crate provides the storage and query engine behind Marks, a small
//! bookmark manager: links with titles, descriptions, tags and categories,
//! plus click counting, search and bulk import.
//!
//! # Architecture
//!
//! - **Dataset**: bookmarks and categories persisted together as one JSON file
//! - **Store**: serialized read-modify-write cycles over that file
//!
//! Queries are pure functions over a loaded snapshot; category counts are
//! derived on every read and never stored.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::new(Config::load()?);
//!
//! // Add a bookmark
//! let created = store.create_bookmark(NewBookmark::new("Rust", "https://rust-lang.org"))?;
//!
//! // Query bookmarks
//! let hits = store.query_bookmarks(&BookmarkQuery::default())?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Persisted records and read-side views
//! - `input`: Lenient create/import payloads
//! - `query`: Filtering, search, sorting and the category index
//! - `mutation`: Validated snapshot transforms
//! - `ids`: Unique identifier generation
//! - `storage`: JSON file persistence
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod ids;
pub mod input;
pub mod models;
pub mod mutation;
pub mod query;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use ids::IdGenerator;
pub use input::{ImportedBookmark, NewBookmark};
pub use models::{
    Bookmark, BookmarkQuery, Category, CategoryFilter, Dataset, EnrichedBookmark,
    EnrichedCategory, SortMode,
};
pub use storage::JsonPersistence;
pub use store::Store;
