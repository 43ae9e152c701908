//! Spa categories, specialists and services.
//!
//! A category keeps a denormalized `service_count`; it is adjusted in the
//! same transaction as the service insert, move or delete.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use crate::config::ServerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpaCategory {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub service_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl SpaCategory {
    pub fn to_response(mut self, server: &ServerConfig) -> Self {
        self.image_url = self.image_url.map(|u| server.media_url(&u));
        self
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<SpaCategory>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM spa_categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Add `delta` to a category's service count, never going below zero.
    /// Returns false when the category no longer exists.
    pub async fn adjust_service_count(
        tx: &mut Transaction<'_, Sqlite>,
        category_id: &str,
        delta: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE spa_categories SET service_count = MAX(service_count + ?, 0), updated_at = ? WHERE id = ?",
        )
        .bind(delta)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(category_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpaCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpaCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpaSpecialist {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl SpaSpecialist {
    pub fn to_response(mut self, server: &ServerConfig) -> Self {
        self.image_url = self.image_url.map(|u| server.media_url(&u));
        self
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<SpaSpecialist>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM spa_specialists WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpaSpecialistRequest {
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpaSpecialistRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpaService {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub specialist_id: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Service with category and specialist names dereferenced
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpaServiceDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub category_name: Option<String>,
    pub specialist_id: Option<String>,
    pub specialist_name: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub const SPA_SERVICE_DETAIL_SELECT: &str = r#"
    SELECT s.id, s.name, s.description, s.category_id, c.name AS category_name,
           s.specialist_id, p.name AS specialist_name, s.duration_minutes, s.price,
           s.image_url, s.is_active, s.created_at, s.updated_at
    FROM spa_services s
    LEFT JOIN spa_categories c ON c.id = s.category_id
    LEFT JOIN spa_specialists p ON p.id = s.specialist_id
"#;

impl SpaServiceDetail {
    pub fn to_response(mut self, server: &ServerConfig) -> Self {
        self.image_url = self.image_url.map(|u| server.media_url(&u));
        self
    }
}

impl SpaService {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<SpaService>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM spa_services WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_detail(db: &SqlitePool, id: &str) -> Result<Option<SpaServiceDetail>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE s.id = ?", SPA_SERVICE_DETAIL_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpaServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub specialist_id: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpaServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub specialist_id: Option<String>,
    pub duration_minutes: Option<i64>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaServiceListQuery {
    pub category_id: Option<String>,
    pub specialist_id: Option<String>,
    pub active: Option<bool>,
}
