//! Hotel events calendar.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    parse_date, parse_time_of_day, CreateEventRequest, Event, EventListQuery, EventStatus,
    UpdateEventRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_date, validate_non_negative, validate_one_of, validate_optional_len,
    validate_optional_time, validate_positive_int, validate_required,
};

fn normalize_date(value: &str) -> Option<String> {
    parse_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_time(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .and_then(parse_time_of_day)
        .map(|t| t.format("%H:%M").to_string())
}

fn check_window(errors: &mut ValidationErrorBuilder, start: &Option<String>, end: &Option<String>) {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            errors.add("end_time", "End time must be after start time");
        }
    }
}

async fn load_event(state: &AppState, id: &str) -> Result<Event, ApiError> {
    Event::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

/// List events by date; `upcoming=true` keeps events dated today or later
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventListQuery>,
) -> ApiResult<Vec<Event>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            EventStatus::parse(s)
                .ok_or_else(|| {
                    ApiError::validation_field(
                        "status",
                        format!("Must be one of: {}", EventStatus::expected()),
                    )
                })?
                .as_str(),
        ),
        None => None,
    };
    let from = query
        .upcoming
        .filter(|u| *u)
        .map(|_| chrono::Local::now().date_naive().format("%Y-%m-%d").to_string());

    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT * FROM events
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR category = ? COLLATE NOCASE)
          AND (? IS NULL OR date >= ?)
        ORDER BY date ASC, start_time ASC
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(&query.category)
    .bind(&query.category)
    .bind(&from)
    .bind(&from)
    .fetch_all(&state.db)
    .await?;

    ok(events
        .into_iter()
        .map(|e| e.to_response(&state.config.server))
        .collect())
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Event> {
    ok(load_event(&state, &id).await?.to_response(&state.config.server))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEventRequest>,
) -> Created<Event> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_required(&req.title, "Title", 200));
    errors.check("description", validate_optional_len(&req.description, "Description", 5000));
    errors.check("date", validate_date(&req.date, "Date"));
    errors.check("start_time", validate_optional_time(&req.start_time, "Start time"));
    errors.check("end_time", validate_optional_time(&req.end_time, "End time"));
    errors.check("price", validate_non_negative(req.price, "Price"));
    if let Some(capacity) = req.capacity {
        errors.check("capacity", validate_positive_int(capacity, "Capacity"));
    }
    if let Some(ref status) = req.status {
        errors.check(
            "status",
            validate_one_of(status, EventStatus::parse, &EventStatus::expected()),
        );
    }
    let start_time = normalize_time(&req.start_time);
    let end_time = normalize_time(&req.end_time);
    check_window(&mut errors, &start_time, &end_time);
    errors.finish()?;

    let date = normalize_date(&req.date)
        .ok_or_else(|| ApiError::validation_field("date", "Invalid date"))?;
    let status = req
        .status
        .as_deref()
        .and_then(EventStatus::parse)
        .unwrap_or(EventStatus::Upcoming);

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO events (id, title, description, date, start_time, end_time, venue, price, capacity,
                            category, image_url, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(&date)
    .bind(&start_time)
    .bind(&end_time)
    .bind(&req.venue)
    .bind(req.price)
    .bind(req.capacity)
    .bind(req.category.as_deref().map(str::trim))
    .bind(&req.image_url)
    .bind(status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(event_id = %id, date = %date, "Event created");
    created(load_event(&state, &id).await?.to_response(&state.config.server))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Event> {
    let existing = load_event(&state, &id).await?;

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref title) = req.title {
        errors.check("title", validate_required(title, "Title", 200));
    }
    if let Some(ref date) = req.date {
        errors.check("date", validate_date(date, "Date"));
    }
    errors.check("start_time", validate_optional_time(&req.start_time, "Start time"));
    errors.check("end_time", validate_optional_time(&req.end_time, "End time"));
    if let Some(price) = req.price {
        errors.check("price", validate_non_negative(price, "Price"));
    }
    if let Some(capacity) = req.capacity {
        errors.check("capacity", validate_positive_int(capacity, "Capacity"));
    }
    if let Some(ref status) = req.status {
        errors.check(
            "status",
            validate_one_of(status, EventStatus::parse, &EventStatus::expected()),
        );
    }
    let start_time = normalize_time(&req.start_time);
    let end_time = normalize_time(&req.end_time);
    check_window(
        &mut errors,
        &start_time.clone().or(existing.start_time),
        &end_time.clone().or(existing.end_time),
    );
    errors.finish()?;

    let date = req.date.as_deref().and_then(normalize_date);
    let status = req.status.as_deref().and_then(EventStatus::parse).map(|s| s.as_str());

    sqlx::query(
        r#"
        UPDATE events SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            date = COALESCE(?, date),
            start_time = COALESCE(?, start_time),
            end_time = COALESCE(?, end_time),
            venue = COALESCE(?, venue),
            price = COALESCE(?, price),
            capacity = COALESCE(?, capacity),
            category = COALESCE(?, category),
            image_url = COALESCE(?, image_url),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&date)
    .bind(&start_time)
    .bind(&end_time)
    .bind(&req.venue)
    .bind(req.price)
    .bind(req.capacity)
    .bind(req.category.as_deref().map(str::trim))
    .bind(&req.image_url)
    .bind(status)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    ok(load_event(&state, &id).await?.to_response(&state.config.server))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Event not found"));
    }
    tracing::info!(event_id = %id, "Event deleted");
    deleted(id)
}
