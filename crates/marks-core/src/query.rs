//! Query engine
//!
//! Pure functions over a loaded snapshot: filtering, search, ordering,
//! category enrichment and the category index. Nothing here mutates the
//! dataset or touches storage.

use crate::models::{
    Bookmark, BookmarkQuery, Dataset, EnrichedBookmark, EnrichedCategory, SortMode,
};

/// Filter, search, sort and enrich bookmarks
///
/// Category and search filters compose with AND. Sorting is stable, so
/// bookmarks that tie keep their stored order.
pub fn query_bookmarks(dataset: &Dataset, query: &BookmarkQuery) -> Vec<EnrichedBookmark> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut hits: Vec<&Bookmark> = dataset
        .bookmarks
        .iter()
        .filter(|b| query.category.keeps(b))
        .filter(|b| needle.as_deref().map_or(true, |n| b.matches(n)))
        .collect();

    match query.sort {
        SortMode::Newest => hits.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::MostVisited => hits.sort_by(|a, b| b.click_count.cmp(&a.click_count)),
    }

    hits.into_iter().map(|b| enrich(dataset, b)).collect()
}

/// Look up one bookmark with its category resolved
pub fn find_bookmark(dataset: &Dataset, id: i64) -> Option<EnrichedBookmark> {
    dataset.bookmark(id).map(|b| enrich(dataset, b))
}

/// Every category with a freshly counted `bookmark_count`
pub fn list_categories(dataset: &Dataset) -> Vec<EnrichedCategory> {
    dataset
        .categories
        .iter()
        .map(|category| EnrichedCategory {
            category: category.clone(),
            bookmark_count: dataset
                .bookmarks
                .iter()
                .filter(|b| b.category_id == Some(category.id))
                .count(),
        })
        .collect()
}

fn enrich(dataset: &Dataset, bookmark: &Bookmark) -> EnrichedBookmark {
    EnrichedBookmark {
        bookmark: bookmark.clone(),
        category: bookmark
            .category_id
            .and_then(|id| dataset.category(id))
            .cloned(),
    }
}
