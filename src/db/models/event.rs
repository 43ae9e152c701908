//! Hotel events.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::string_enum;
use crate::config::ServerConfig;

string_enum!(EventStatus {
    Upcoming => "Upcoming",
    Cancelled => "Cancelled",
    Completed => "Completed",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub venue: Option<String>,
    pub price: f64,
    pub capacity: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Event {
    pub fn to_response(mut self, server: &ServerConfig) -> Self {
        self.image_url = self.image_url.map(|u| server.media_url(&u));
        self
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub venue: Option<String>,
    #[serde(default)]
    pub price: f64,
    pub capacity: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub venue: Option<String>,
    pub price: Option<f64>,
    pub capacity: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    /// Only events on or after today
    pub upcoming: Option<bool>,
}
