//! Site content pages (home, rooms, spa, footer, ...).
//!
//! Each page is a free-form JSON document edited from the dashboard and read
//! by the guest site.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{ContentPage, ContentPageKind, ContentPageResponse, ContentPageSummary, merge_document};
use crate::AppState;

use super::error::ApiError;
use super::response::{ok, ApiResult};

fn parse_page(page: &str) -> Result<ContentPageKind, ApiError> {
    ContentPageKind::parse(page)
        .ok_or_else(|| ApiError::not_found(format!("Unknown content page '{}'", page)))
}

fn require_object(document: Value) -> Result<serde_json::Map<String, Value>, ApiError> {
    match document {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::validation_field(
            "document",
            "Content document must be a JSON object",
        )),
    }
}

/// List content pages with their last update time
pub async fn list_pages(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ContentPageSummary>> {
    let pages = sqlx::query_as::<_, ContentPage>("SELECT * FROM content_pages")
        .fetch_all(&state.db)
        .await?;

    let mut summaries: Vec<ContentPageSummary> = ContentPageKind::ALL
        .iter()
        .map(|kind| {
            let updated_at = pages
                .iter()
                .find(|p| p.page == kind.as_str())
                .map(|p| p.updated_at.clone())
                .unwrap_or_default();
            ContentPageSummary {
                page: kind.as_str().to_string(),
                updated_at,
            }
        })
        .collect();
    summaries.sort_by(|a, b| a.page.cmp(&b.page));

    ok(summaries)
}

/// Read a page, falling back to its empty skeleton when never saved
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
) -> ApiResult<ContentPageResponse> {
    let kind = parse_page(&page)?;

    let response = match ContentPage::find(&state.db, kind).await? {
        Some(stored) => stored.to_response(&state.config.server),
        None => ContentPageResponse {
            page: kind.as_str().to_string(),
            document: kind.empty_document(),
            updated_at: String::new(),
        },
    };

    ok(response)
}

/// Replace a page document
pub async fn replace_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    Json(document): Json<Value>,
) -> ApiResult<ContentPageResponse> {
    let kind = parse_page(&page)?;
    let document = Value::Object(require_object(document)?);

    let saved = ContentPage::save(&state.db, kind, &document).await?;
    tracing::info!(page = %kind, "Content page replaced");

    ok(saved.to_response(&state.config.server))
}

/// Merge top-level sections into a page document; `null` removes a section
pub async fn patch_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
    Json(patch): Json<Value>,
) -> ApiResult<ContentPageResponse> {
    let kind = parse_page(&page)?;
    let patch = require_object(patch)?;

    let mut document = match ContentPage::find(&state.db, kind).await? {
        Some(stored) => stored.document_value(),
        None => kind.empty_document(),
    };
    merge_document(&mut document, patch);

    let saved = ContentPage::save(&state.db, kind, &document).await?;
    tracing::info!(page = %kind, "Content page updated");

    ok(saved.to_response(&state.config.server))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_seeded_pages_are_listed() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/content", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_put_then_patch_page() {
        let (app, _dir) = test_app().await;

        let doc = json!({
            "hero": { "title": "Welcome", "image": "media/hero.jpg" },
            "highlights": [
                { "title": "Spa", "order": 2 },
                { "title": "Pool", "order": 1 }
            ]
        });
        let (status, body) = send(&app, Method::PUT, "/api/content/home", Some(doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["document"]["highlights"][0]["title"], "Pool");
        assert_eq!(
            body["data"]["document"]["hero"]["image"],
            "http://localhost:4000/media/hero.jpg"
        );

        let patch = json!({ "highlights": null, "intro": "Sea views" });
        let (status, body) = send(&app, Method::PATCH, "/api/content/home", Some(patch)).await;
        assert_eq!(status, StatusCode::OK);
        let document = &body["data"]["document"];
        assert_eq!(document["intro"], "Sea views");
        assert_eq!(document["hero"]["title"], "Welcome");
        assert!(document.get("highlights").is_none());

        let (_, body) = send(&app, Method::GET, "/api/content/home", None).await;
        assert_eq!(body["data"]["document"]["intro"], "Sea views");
    }

    #[tokio::test]
    async fn test_unknown_page_and_non_object_document() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, Method::GET, "/api/content/blog", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, Method::PUT, "/api/content/footer", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
