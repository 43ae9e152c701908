//! Site content pages.
//!
//! Each public page is one free-form JSON document. The service does not
//! impose a schema beyond "top-level object"; it only orders lists by their
//! `order` field and absolutizes image paths on the way out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, SqlitePool};

use crate::config::ServerConfig;

/// Editable pages of the public website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentPageKind {
    Home,
    Rooms,
    Spa,
    Restaurant,
    Events,
    MeetingHall,
    Navigation,
    Footer,
}

impl ContentPageKind {
    pub const ALL: [ContentPageKind; 8] = [
        ContentPageKind::Home,
        ContentPageKind::Rooms,
        ContentPageKind::Spa,
        ContentPageKind::Restaurant,
        ContentPageKind::Events,
        ContentPageKind::MeetingHall,
        ContentPageKind::Navigation,
        ContentPageKind::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentPageKind::Home => "home",
            ContentPageKind::Rooms => "rooms",
            ContentPageKind::Spa => "spa",
            ContentPageKind::Restaurant => "restaurant",
            ContentPageKind::Events => "events",
            ContentPageKind::MeetingHall => "meeting-hall",
            ContentPageKind::Navigation => "navigation",
            ContentPageKind::Footer => "footer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s || p.as_str().replace('-', "_") == s)
    }

    /// Skeleton document a fresh install starts from
    pub fn empty_document(&self) -> Value {
        match self {
            ContentPageKind::Navigation => serde_json::json!({ "items": [] }),
            ContentPageKind::Footer => serde_json::json!({
                "about": "",
                "columns": [],
                "social": [],
                "contact": {}
            }),
            ContentPageKind::Home => serde_json::json!({
                "hero": { "title": "", "subtitle": "", "image": "" },
                "sections": []
            }),
            ContentPageKind::Rooms => serde_json::json!({
                "hero": { "title": "", "description": "", "image": "" },
                "categories": []
            }),
            ContentPageKind::Spa => serde_json::json!({
                "hero": { "title": "", "description": "", "image": "" },
                "services": []
            }),
            ContentPageKind::Restaurant => serde_json::json!({
                "hero": { "title": "", "description": "", "image": "" },
                "dishes": []
            }),
            ContentPageKind::Events => serde_json::json!({
                "hero": { "title": "", "description": "", "image": "" },
                "categories": []
            }),
            ContentPageKind::MeetingHall => serde_json::json!({
                "hero": { "title": "", "description": "", "image": "" },
                "features": [],
                "brochure": ""
            }),
        }
    }
}

impl std::fmt::Display for ContentPageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentPage {
    pub page: String,
    pub document: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentPageResponse {
    pub page: String,
    pub document: Value,
    pub updated_at: String,
}

/// Short listing entry for `GET /content`
#[derive(Debug, Clone, Serialize)]
pub struct ContentPageSummary {
    pub page: String,
    pub updated_at: String,
}

impl ContentPage {
    pub async fn find(db: &SqlitePool, page: ContentPageKind) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM content_pages WHERE page = ?")
            .bind(page.as_str())
            .fetch_optional(db)
            .await
    }

    pub async fn save(db: &SqlitePool, page: ContentPageKind, document: &Value) -> Result<Self, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO content_pages (page, document, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(page) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
            "#,
        )
        .bind(page.as_str())
        .bind(document.to_string())
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM content_pages WHERE page = ?")
            .bind(page.as_str())
            .fetch_one(db)
            .await
    }

    /// Stored document, `{}` if the column is not valid JSON
    pub fn document_value(&self) -> Value {
        serde_json::from_str(&self.document).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    pub fn to_response(&self, server: &ServerConfig) -> ContentPageResponse {
        let mut document = self.document_value();
        prepare_document(&mut document, server);
        ContentPageResponse {
            page: self.page.clone(),
            document,
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Shallow merge: top-level keys of `patch` replace those of `base`,
/// `null` removes a key.
pub fn merge_document(base: &mut Value, patch: Map<String, Value>) {
    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    if let Value::Object(target) = base {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(&key);
            } else {
                target.insert(key, value);
            }
        }
    }
}

fn is_media_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "image"
        || key == "icon"
        || key == "pdf"
        || key == "brochure"
        || key.ends_with("image")
        || key.ends_with("imageurl")
        || key.ends_with("image_url")
        || key.ends_with("pdfurl")
        || key.ends_with("pdf_url")
}

fn order_of(value: &Value) -> Option<f64> {
    value.get("order").and_then(Value::as_f64)
}

/// Sort ordered lists and absolutize media paths, recursively.
///
/// Lists of objects carrying a numeric `order` are stably sorted by it;
/// entries without one keep their relative position after the ordered ones.
pub fn prepare_document(value: &mut Value, server: &ServerConfig) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                match child {
                    Value::String(path) if is_media_key(key) => {
                        *path = server.media_url(path);
                    }
                    _ => prepare_document(child, server),
                }
            }
        }
        Value::Array(items) => {
            if items.iter().any(|item| order_of(item).is_some()) {
                items.sort_by(|a, b| match (order_of(a), order_of(b)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                });
            }
            for item in items.iter_mut() {
                prepare_document(item, server);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> ServerConfig {
        ServerConfig {
            public_url: "http://hotel.test".to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_page_parse() {
        assert_eq!(ContentPageKind::parse("meeting-hall"), Some(ContentPageKind::MeetingHall));
        assert_eq!(ContentPageKind::parse("meeting_hall"), Some(ContentPageKind::MeetingHall));
        assert_eq!(ContentPageKind::parse("Home"), Some(ContentPageKind::Home));
        assert_eq!(ContentPageKind::parse("blog"), None);
    }

    #[test]
    fn test_lists_sorted_by_order_with_duplicates_stable() {
        let mut doc = json!({
            "items": [
                { "label": "Spa", "order": 3 },
                { "label": "Rooms", "order": 1 },
                { "label": "Contact" },
                { "label": "Dining", "order": 1 },
            ]
        });
        prepare_document(&mut doc, &server());
        let labels: Vec<&str> = doc["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Rooms", "Dining", "Spa", "Contact"]);
    }

    #[test]
    fn test_media_paths_absolutized_recursively() {
        let mut doc = json!({
            "hero": { "title": "Welcome", "image": "home/hero.jpg" },
            "dishes": [{ "name": "Soup", "imageUrl": "/media/food/soup.png", "order": 0 }],
            "brochure": "https://cdn.example/brochure.pdf"
        });
        prepare_document(&mut doc, &server());
        assert_eq!(doc["hero"]["image"], "http://hotel.test/media/home/hero.jpg");
        assert_eq!(doc["hero"]["title"], "Welcome");
        assert_eq!(doc["dishes"][0]["imageUrl"], "http://hotel.test/media/food/soup.png");
        assert_eq!(doc["brochure"], "https://cdn.example/brochure.pdf");
    }

    #[test]
    fn test_merge_document() {
        let mut base = json!({ "hero": { "title": "Old" }, "sections": [] });
        let patch = json!({ "hero": { "title": "New" }, "sections": null, "extra": 1 });
        merge_document(&mut base, patch.as_object().unwrap().clone());
        assert_eq!(base, json!({ "hero": { "title": "New" }, "extra": 1 }));
    }

    #[test]
    fn test_every_page_has_object_skeleton() {
        for page in ContentPageKind::ALL {
            assert!(page.empty_document().is_object(), "{}", page);
        }
    }
}
