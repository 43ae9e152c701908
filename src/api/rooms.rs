//! Guest room inventory: listing with type, availability and occupancy filters.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    clean_list, to_json_list, CreateRoomRequest, Room, RoomListQuery, RoomResponse,
    UpdateRoomRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_non_negative, validate_optional_len, validate_positive_int, validate_required,
};

async fn load_room(state: &AppState, id: &str) -> Result<Room, ApiError> {
    Room::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Room not found"))
}

/// List rooms; `guests` keeps rooms that sleep at least that many
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomListQuery>,
) -> ApiResult<Vec<RoomResponse>> {
    let rooms = sqlx::query_as::<_, Room>(
        r#"
        SELECT * FROM rooms
        WHERE (? IS NULL OR room_type = ? COLLATE NOCASE)
          AND (? IS NULL OR is_available = ?)
          AND (? IS NULL OR capacity >= ?)
        ORDER BY price_per_night ASC, name ASC
        "#,
    )
    .bind(&query.room_type)
    .bind(&query.room_type)
    .bind(query.available)
    .bind(query.available)
    .bind(query.guests)
    .bind(query.guests)
    .fetch_all(&state.db)
    .await?;

    ok(rooms
        .into_iter()
        .map(|r| r.to_response(&state.config.server))
        .collect())
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<RoomResponse> {
    ok(load_room(&state, &id).await?.to_response(&state.config.server))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Created<RoomResponse> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Room name", 100));
    errors.check("room_type", validate_required(&req.room_type, "Room type", 50));
    errors.check("description", validate_optional_len(&req.description, "Description", 5000));
    errors.check("price_per_night", validate_non_negative(req.price_per_night, "Price per night"));
    errors.check("capacity", validate_positive_int(req.capacity, "Capacity"));
    if let Some(size) = req.size_sqm {
        errors.check("size_sqm", validate_non_negative(size, "Size"));
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO rooms (id, name, room_type, description, price_per_night, capacity, size_sqm,
                           amenities, images, is_available, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(req.room_type.trim())
    .bind(&req.description)
    .bind(req.price_per_night)
    .bind(req.capacity)
    .bind(req.size_sqm)
    .bind(to_json_list(&clean_list(req.amenities)))
    .bind(to_json_list(&clean_list(req.images)))
    .bind(req.is_available.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(room_id = %id, "Room created");
    created(load_room(&state, &id).await?.to_response(&state.config.server))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoomRequest>,
) -> ApiResult<RoomResponse> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Room name", 100));
    }
    if let Some(ref room_type) = req.room_type {
        errors.check("room_type", validate_required(room_type, "Room type", 50));
    }
    if let Some(price) = req.price_per_night {
        errors.check("price_per_night", validate_non_negative(price, "Price per night"));
    }
    if let Some(capacity) = req.capacity {
        errors.check("capacity", validate_positive_int(capacity, "Capacity"));
    }
    errors.finish()?;

    load_room(&state, &id).await?;

    let amenities = req.amenities.map(|a| to_json_list(&clean_list(a)));
    let images = req.images.map(|i| to_json_list(&clean_list(i)));

    sqlx::query(
        r#"
        UPDATE rooms SET
            name = COALESCE(?, name),
            room_type = COALESCE(?, room_type),
            description = COALESCE(?, description),
            price_per_night = COALESCE(?, price_per_night),
            capacity = COALESCE(?, capacity),
            size_sqm = COALESCE(?, size_sqm),
            amenities = COALESCE(?, amenities),
            images = COALESCE(?, images),
            is_available = COALESCE(?, is_available),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.room_type.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.price_per_night)
    .bind(req.capacity)
    .bind(req.size_sqm)
    .bind(amenities)
    .bind(images)
    .bind(req.is_available)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    ok(load_room(&state, &id).await?.to_response(&state.config.server))
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Room not found"));
    }
    tracing::info!(room_id = %id, "Room deleted");
    deleted(id)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_room_crud_and_filters() {
        let (app, _dir) = test_app().await;

        for (name, kind, capacity, price) in [
            ("Garden Double", "Deluxe", 2, 180),
            ("Ocean Suite", "Suite", 4, 480),
            ("Loft Suite", "Suite", 2, 390),
        ] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/api/rooms",
                Some(json!({
                    "name": name,
                    "room_type": kind,
                    "capacity": capacity,
                    "price_per_night": price,
                    "images": ["rooms/a.jpg"]
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
        }

        let (_, body) = send(&app, Method::GET, "/api/rooms?room_type=suite", None).await;
        let rooms = body["data"].as_array().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0]["name"], "Loft Suite");
        assert_eq!(rooms[0]["images"][0], "http://localhost:4000/media/rooms/a.jpg");

        let (_, body) = send(&app, Method::GET, "/api/rooms?guests=3", None).await;
        let rooms = body["data"].as_array().unwrap();
        assert_eq!(rooms.len(), 1);
        let id = rooms[0]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/rooms/{}", id);
        let (status, body) =
            send(&app, Method::PUT, &uri, Some(json!({ "is_available": false }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_available"], false);

        let (_, body) = send(&app, Method::GET, "/api/rooms?available=true", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_room_validation() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/rooms",
            Some(json!({ "name": "", "room_type": "Suite", "capacity": 0, "price_per_night": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["details"]["capacity"].is_array());
    }
}
