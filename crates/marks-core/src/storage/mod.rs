//! Storage layer
//!
//! The dataset is persisted as a single JSON document. There are no partial
//! writes: callers load the whole thing, change a local copy and save it
//! back. Serializing writers is the job of `Store`, not of this layer.

pub mod persistence;

pub use persistence::JsonPersistence;
