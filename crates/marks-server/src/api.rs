//! HTTP API
//!
//! Thin JSON layer over `marks_core::Store`. Every store call runs on the
//! blocking pool; errors map to status codes by kind:
//! validation and duplicates are 400, missing bookmarks 404, storage 500.
//!
//! Routes (mounted under `/api`):
//! - `GET    /bookmarks?category=&search=&sort=`
//! - `POST   /bookmarks`
//! - `POST   /bookmarks/import`
//! - `GET    /bookmarks/export`
//! - `DELETE /bookmarks/{id}`
//! - `POST   /bookmarks/{id}/click`
//! - `GET    /categories`
//! - `POST   /categories`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use marks_core::{
    Bookmark, BookmarkQuery, Category, CategoryFilter, EnrichedBookmark, EnrichedCategory,
    ErrorKind, NewBookmark, SortMode, Store,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
}

/// Build the application router
pub fn router(store: Arc<Store>) -> Router {
    let api = Router::new()
        .route("/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route("/bookmarks/import", post(import_bookmarks))
        .route("/bookmarks/export", get(export_bookmarks))
        .route("/bookmarks/{id}", delete(delete_bookmark))
        .route("/bookmarks/{id}/click", post(record_click))
        .route("/categories", get(list_categories).post(create_category));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

// ── Errors ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Bookmark {} not found", id))
    }
}

impl From<marks_core::Error> for ApiError {
    fn from(err: marks_core::Error) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation | ErrorKind::Duplicate => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::StorageCorruption | ErrorKind::StorageWrite => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if !err.is_client_error() {
            error!(
                error = %err,
                suggestion = err.recovery_suggestion().unwrap_or(""),
                "storage failure"
            );
        } else {
            warn!(error = %err, "rejected request");
        }
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "malformed JSON body");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Run a store operation on the blocking pool
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> marks_core::Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| {
            error!(error = %e, "store task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("join error: {e}"))
        })?
        .map_err(ApiError::from)
}

/// Path ids that aren't integers can't name any bookmark
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::not_found(raw))
}

// ── Request/response types ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> BookmarkQuery {
        BookmarkQuery {
            category: CategoryFilter::parse(self.category.as_deref()),
            search: self.search,
            sort: self.sort.as_deref().map(SortMode::parse).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub bookmarks: Value,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BookmarksResponse {
    pub bookmarks: Vec<EnrichedBookmark>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<EnrichedCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub new_count: u64,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub imported: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ── Handlers ─────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn list_bookmarks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookmarksResponse>, ApiError> {
    let query = params.into_query();
    let bookmarks = blocking(&state, move |store| store.query_bookmarks(&query)).await?;
    Ok(Json(BookmarksResponse { bookmarks }))
}

async fn create_bookmark(
    State(state): State<AppState>,
    payload: Result<Json<NewBookmark>, JsonRejection>,
) -> Result<(StatusCode, Json<Bookmark>), ApiError> {
    let Json(input) = payload?;
    let bookmark = blocking(&state, move |store| store.create_bookmark(input)).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn import_bookmarks(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
    let Json(request) = payload?;
    let imported = blocking(&state, move |store| store.import_bookmarks(&request.bookmarks)).await?;
    Ok(Json(ImportResponse {
        message: format!("Successfully imported {} bookmarks", imported),
        imported,
    }))
}

async fn export_bookmarks(
    State(state): State<AppState>,
) -> Result<Json<marks_core::Dataset>, ApiError> {
    let dataset = blocking(&state, |store| store.export()).await?;
    Ok(Json(dataset))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    blocking(&state, move |store| store.delete_bookmark(id)).await?;
    Ok(Json(MessageResponse {
        message: "Bookmark deleted successfully".to_string(),
    }))
}

async fn record_click(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClickResponse>, ApiError> {
    let id = parse_id(&id)?;
    let new_count = blocking(&state, move |store| store.record_click(id)).await?;
    Ok(Json(ClickResponse { new_count }))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = blocking(&state, |store| store.list_categories()).await?;
    Ok(Json(CategoriesResponse { categories }))
}

async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(request) = payload?;
    let category = blocking(&state, move |store| store.create_category(&request.name)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marks_core::Config;
    use reqwest::Client;
    use serde_json::json;
    use tempfile::TempDir;

    struct TestServer {
        base: String,
        client: Client,
        _dir: TempDir,
    }

    impl TestServer {
        async fn start() -> Self {
            Self::start_with(|_| {}).await
        }

        async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = Config::with_data_dir(dir.path());
            configure(&mut config);
            let store = Arc::new(Store::new(config));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router(store)).await.unwrap();
            });

            Self {
                base: format!("http://{}", addr),
                client: Client::new(),
                _dir: dir,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn post(&self, path: &str, body: Value) -> reqwest::Response {
            self.client
                .post(self.url(path))
                .json(&body)
                .send()
                .await
                .unwrap()
        }

        async fn get_json(&self, path: &str) -> Value {
            let resp = self.client.get(self.url(path)).send().await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
            resp.json().await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = TestServer::start().await;
        let resp = server.client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_create_and_list_bookmarks() {
        let server = TestServer::start().await;

        let resp = server
            .post(
                "/api/categories",
                json!({ "name": "Dev" }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let category: Value = resp.json().await.unwrap();

        let resp = server
            .post(
                "/api/bookmarks",
                json!({
                    "title": "GitHub",
                    "url": "https://github.com",
                    "categoryId": category["id"].to_string(),
                    "tags": "code, hosting"
                }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let created: Value = resp.json().await.unwrap();
        assert_eq!(created["clickCount"], 0);
        assert_eq!(created["tags"], json!(["code", "hosting"]));
        assert_eq!(created["categoryId"], category["id"]);

        let listed = server.get_json("/api/bookmarks").await;
        let bookmarks = listed["bookmarks"].as_array().unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0]["category"]["name"], "Dev");

        let filtered = server
            .get_json(&format!("/api/bookmarks?category={}", category["id"]))
            .await;
        assert_eq!(filtered["bookmarks"].as_array().unwrap().len(), 1);

        let all = server.get_json("/api/bookmarks?category=All").await;
        assert_eq!(all["bookmarks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_bookmark_validation() {
        let server = TestServer::start().await;

        let resp = server
            .post("/api/bookmarks", json!({ "title": "No URL" }))
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        let resp = server
            .post(
                "/api/bookmarks",
                json!({ "title": "Bad", "url": "not a url" }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let resp = server
            .client
            .post(server.url("/api/bookmarks"))
            .header("content-type", "application/json")
            .body("{ broken")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let listed = server.get_json("/api/bookmarks").await;
        assert!(listed["bookmarks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_and_sort() {
        let server = TestServer::start().await;

        let github: Value = server
            .post(
                "/api/bookmarks",
                json!({ "title": "GitHub", "url": "https://github.com" }),
            )
            .await
            .json()
            .await
            .unwrap();
        server
            .post(
                "/api/bookmarks",
                json!({ "title": "Radio", "url": "https://radio.example", "tags": ["digital"] }),
            )
            .await;
        server
            .post(
                "/api/bookmarks",
                json!({ "title": "Weather", "url": "https://weather.example" }),
            )
            .await;

        let resp = server
            .client
            .post(server.url(&format!("/api/bookmarks/{}/click", github["id"])))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["newCount"], 1);

        let found = server.get_json("/api/bookmarks?search=GIT").await;
        let titles: Vec<&str> = found["bookmarks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Radio", "GitHub"]);

        let popular = server.get_json("/api/bookmarks?sort=most-visited").await;
        assert_eq!(popular["bookmarks"][0]["title"], "GitHub");
    }

    #[tokio::test]
    async fn test_non_numeric_category_matches_nothing() {
        let server = TestServer::start().await;
        server
            .post(
                "/api/bookmarks",
                json!({ "title": "A", "url": "https://a.com", "categoryId": 1 }),
            )
            .await;

        let listed = server.get_json("/api/bookmarks?category=work").await;
        assert_eq!(listed["bookmarks"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_and_click_not_found() {
        let server = TestServer::start().await;

        let created: Value = server
            .post(
                "/api/bookmarks",
                json!({ "title": "A", "url": "https://a.com" }),
            )
            .await
            .json()
            .await
            .unwrap();
        let path = format!("/api/bookmarks/{}", created["id"]);

        let resp = server.client.delete(server.url(&path)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let resp = server.client.delete(server.url(&path)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = server
            .client
            .post(server.url(&format!("{}/click", path)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = server
            .client
            .delete(server.url("/api/bookmarks/abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_categories() {
        let server = TestServer::start().await;

        let resp = server.post("/api/categories", json!({ "name": "dev" })).await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let resp = server.post("/api/categories", json!({ "name": "Dev" })).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let resp = server.post("/api/categories", json!({ "name": "" })).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let listed = server.get_json("/api/categories").await;
        let categories = listed["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0]["bookmarkCount"], 0);
    }

    #[tokio::test]
    async fn test_import_and_export() {
        let server = TestServer::start_with(|config| config.import_category_id = Some(5)).await;

        let resp = server
            .post("/api/bookmarks/import", json!({ "bookmarks": "nope" }))
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let resp = server
            .post(
                "/api/bookmarks/import",
                json!({ "bookmarks": [
                    { "title": "A", "url": "https://a.com" },
                    { "title": "B", "url": "https://b.com" }
                ] }),
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["imported"], 2);
        assert!(body["message"].as_str().unwrap().contains('2'));

        let exported = server.get_json("/api/bookmarks/export").await;
        let bookmarks = exported["bookmarks"].as_array().unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert_ne!(bookmarks[0]["id"], bookmarks[1]["id"]);
        assert!(bookmarks.iter().all(|b| b["categoryId"] == 5));
    }

    #[tokio::test]
    async fn test_concurrent_requests_lose_nothing() {
        let server = Arc::new(TestServer::start().await);

        let tasks: Vec<_> = (0..12)
            .map(|i| {
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    let resp = server
                        .post(
                            "/api/bookmarks",
                            json!({
                                "title": format!("Bookmark {}", i),
                                "url": format!("https://example.com/{}", i)
                            }),
                        )
                        .await;
                    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let listed = server.get_json("/api/bookmarks").await;
        assert_eq!(listed["bookmarks"].as_array().unwrap().len(), 12);
    }
}
