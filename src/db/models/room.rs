//! Room models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::parse_json_list;
use crate::config::ServerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: f64,
    pub capacity: i64,
    pub size_sqm: Option<f64>,
    pub amenities: String,
    pub images: String,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: f64,
    pub capacity: i64,
    pub size_sqm: Option<f64>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Room {
    pub fn to_response(self, server: &ServerConfig) -> RoomResponse {
        RoomResponse {
            amenities: parse_json_list(&self.amenities),
            images: parse_json_list(&self.images)
                .iter()
                .map(|i| server.media_url(i))
                .collect(),
            id: self.id,
            name: self.name,
            room_type: self.room_type,
            description: self.description,
            price_per_night: self.price_per_night,
            capacity: self.capacity,
            size_sqm: self.size_sqm,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: f64,
    pub capacity: i64,
    pub size_sqm: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub room_type: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<f64>,
    pub capacity: Option<i64>,
    pub size_sqm: Option<f64>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomListQuery {
    pub room_type: Option<String>,
    pub available: Option<bool>,
    /// Rooms sleeping at least this many guests
    pub guests: Option<i64>,
}
