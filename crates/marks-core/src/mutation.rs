//! Mutation engine
//!
//! Snapshot transforms behind every write. Each function validates first and
//! only then touches the dataset, so an `Err` always leaves the snapshot
//! exactly as it was. Persisting the result is up to `Store`.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::input::{normalize_tags, ImportedBookmark, NewBookmark};
use crate::models::{Bookmark, Category, Dataset};

/// Require `url` to parse as an absolute URL
pub fn validate_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::validation(format!("Invalid URL format: {}", e)))
}

/// Append a new bookmark built from `input`
pub fn create_bookmark(
    dataset: &mut Dataset,
    ids: &IdGenerator,
    input: NewBookmark,
    now: DateTime<Utc>,
) -> Result<Bookmark> {
    let title = input.title.trim();
    let url = input.url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(Error::validation("Title and URL are required"));
    }
    validate_url(url)?;

    let bookmark = Bookmark {
        id: ids.next()?,
        title: title.to_string(),
        url: url.to_string(),
        description: input.description.unwrap_or_default(),
        category_id: input.category_id,
        tags: normalize_tags(&input.tags),
        click_count: 0,
        created_at: now,
        extra: Map::new(),
    };

    dataset.bookmarks.push(bookmark.clone());
    Ok(bookmark)
}

/// Remove the bookmark with `id`, returning it
pub fn delete_bookmark(dataset: &mut Dataset, id: i64) -> Result<Bookmark> {
    let index = dataset
        .bookmarks
        .iter()
        .position(|b| b.id == id)
        .ok_or(Error::NotFound { id })?;

    Ok(dataset.bookmarks.remove(index))
}

/// Bump the click counter of `id` by one, returning the new count
pub fn record_click(dataset: &mut Dataset, id: i64) -> Result<u64> {
    let bookmark = dataset
        .bookmarks
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or(Error::NotFound { id })?;

    bookmark.click_count += 1;
    Ok(bookmark.click_count)
}

/// Append a category named `name`
pub fn create_category(dataset: &mut Dataset, ids: &IdGenerator, name: &str) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name is required"));
    }
    if dataset.categories.iter().any(|c| c.same_name(name)) {
        return Err(Error::Duplicate {
            name: name.to_string(),
        });
    }

    let category = Category {
        id: ids.next()?,
        name: name.to_string(),
    };
    dataset.categories.push(category.clone());
    Ok(category)
}

/// Decode an import batch
///
/// `raw` must be an array of objects. Fields inside each object are taken
/// best-effort; titles and URLs are not validated.
pub fn parse_import(raw: &Value) -> Result<Vec<ImportedBookmark>> {
    let items = raw
        .as_array()
        .ok_or_else(|| Error::validation("Bookmarks must be an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(Error::validation(format!(
                    "Bookmark at index {} is not an object",
                    index
                )));
            }
            serde_json::from_value(item.clone()).map_err(|e| {
                Error::validation(format!("Bookmark at index {} is malformed: {}", index, e))
            })
        })
        .collect()
}

/// Keys an import record may carry that are always replaced
const REPLACED_ON_IMPORT: [&str; 3] = ["id", "createdAt", "category"];

/// Append imported bookmarks, returning how many were added
///
/// Every record gets a fresh id and `created_at = now`; a missing category
/// falls back to `fallback_category`. Unrecognised fields are carried over
/// as-is. Nothing is appended unless every record gets an id.
pub fn import_bookmarks(
    dataset: &mut Dataset,
    ids: &IdGenerator,
    items: Vec<ImportedBookmark>,
    fallback_category: Option<i64>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let imported = items
        .into_iter()
        .map(|mut item| {
            for key in REPLACED_ON_IMPORT {
                item.extra.remove(key);
            }
            Ok(Bookmark {
                id: ids.next()?,
                title: item.title,
                url: item.url,
                description: item.description.unwrap_or_default(),
                category_id: item.category_id.or(fallback_category),
                tags: item.tags,
                click_count: item.click_count,
                created_at: now,
                extra: item.extra,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let count = imported.len();
    dataset.bookmarks.extend(imported);
    Ok(count)
}
