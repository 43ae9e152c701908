//! Meeting halls, hall bookings and the booking-request inbox.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    clean_list, parse_date, parse_time_of_day, to_json_list, BookingRequest,
    BookingRequestListQuery, CreateBookingRequestPayload, CreateHallBookingRequest,
    CreateMeetingHallRequest, HallBooking, HallBookingDetail, HallBookingListQuery,
    HallBookingStatus, HallStatus, MeetingHall, MeetingHallResponse, RequestStatus,
    UpdateHallBookingRequest, UpdateMeetingHallRequest, UpdateRequestStatusPayload,
    HALL_BOOKING_DETAIL_SELECT, NO_OVERLAPPING_BOOKING,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_date, validate_email, validate_non_negative, validate_one_of, validate_optional_len,
    validate_phone, validate_positive_int, validate_required, validate_time,
};

/// Stored time format; fixed width so that text comparison orders correctly
const TIME_FORMAT: &str = "%H:%M";

fn normalize_time(value: &str) -> Option<String> {
    parse_time_of_day(value).map(|t| t.format(TIME_FORMAT).to_string())
}

fn parse_filter<T>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    expected: String,
) -> Result<Option<T>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| ApiError::validation_field(field, format!("Must be one of: {}", expected))),
    }
}

// -------------------------------------------------------------------------
// Halls
// -------------------------------------------------------------------------

async fn load_hall(state: &AppState, id: &str) -> Result<MeetingHall, ApiError> {
    MeetingHall::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Meeting hall not found"))
}

pub async fn list_halls(State(state): State<Arc<AppState>>) -> ApiResult<Vec<MeetingHallResponse>> {
    let halls = sqlx::query_as::<_, MeetingHall>("SELECT * FROM meeting_halls ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;
    ok(halls
        .into_iter()
        .map(|h| h.to_response(&state.config.server))
        .collect())
}

pub async fn get_hall(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<MeetingHallResponse> {
    ok(load_hall(&state, &id).await?.to_response(&state.config.server))
}

pub async fn create_hall(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMeetingHallRequest>,
) -> Created<MeetingHallResponse> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Hall name", 100));
    errors.check("capacity", validate_positive_int(req.capacity, "Capacity"));
    errors.check("price_per_hour", validate_non_negative(req.price_per_hour, "Price per hour"));
    if let Some(area) = req.area_sqm {
        errors.check("area_sqm", validate_non_negative(area, "Area"));
    }
    errors.check("description", validate_optional_len(&req.description, "Description", 2000));
    if let Some(ref status) = req.status {
        errors.check(
            "status",
            validate_one_of(status, HallStatus::parse, &HallStatus::expected()),
        );
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let status = req
        .status
        .as_deref()
        .and_then(HallStatus::parse)
        .unwrap_or(HallStatus::Available);

    sqlx::query(
        r#"
        INSERT INTO meeting_halls (id, name, capacity, area_sqm, description, amenities, image_url,
                                   price_per_hour, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(req.capacity)
    .bind(req.area_sqm)
    .bind(&req.description)
    .bind(to_json_list(&clean_list(req.amenities)))
    .bind(&req.image_url)
    .bind(req.price_per_hour)
    .bind(status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(hall_id = %id, "Meeting hall created");
    created(load_hall(&state, &id).await?.to_response(&state.config.server))
}

pub async fn update_hall(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMeetingHallRequest>,
) -> ApiResult<MeetingHallResponse> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Hall name", 100));
    }
    if let Some(capacity) = req.capacity {
        errors.check("capacity", validate_positive_int(capacity, "Capacity"));
    }
    if let Some(price) = req.price_per_hour {
        errors.check("price_per_hour", validate_non_negative(price, "Price per hour"));
    }
    if let Some(ref status) = req.status {
        errors.check(
            "status",
            validate_one_of(status, HallStatus::parse, &HallStatus::expected()),
        );
    }
    errors.finish()?;

    load_hall(&state, &id).await?;

    let amenities = req.amenities.map(|a| to_json_list(&clean_list(a)));
    let status = req.status.as_deref().and_then(HallStatus::parse).map(|s| s.as_str());
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE meeting_halls SET
            name = COALESCE(?, name),
            capacity = COALESCE(?, capacity),
            area_sqm = COALESCE(?, area_sqm),
            description = COALESCE(?, description),
            amenities = COALESCE(?, amenities),
            image_url = COALESCE(?, image_url),
            price_per_hour = COALESCE(?, price_per_hour),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.capacity)
    .bind(req.area_sqm)
    .bind(&req.description)
    .bind(amenities)
    .bind(&req.image_url)
    .bind(req.price_per_hour)
    .bind(status)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    ok(load_hall(&state, &id).await?.to_response(&state.config.server))
}

pub async fn delete_hall(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM meeting_halls WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Meeting hall not found"));
    }
    tracing::info!(hall_id = %id, "Meeting hall deleted");
    deleted(id)
}

// -------------------------------------------------------------------------
// Hall bookings
// -------------------------------------------------------------------------

/// Normalized schedule of a hall booking
struct Slot {
    date: String,
    start_time: String,
    end_time: String,
}

fn validate_slot(errors: &mut ValidationErrorBuilder, date: &str, start: &str, end: &str) -> Option<Slot> {
    errors.check("date", validate_date(date, "Date"));
    errors.check("start_time", validate_time(start, "Start time"));
    errors.check("end_time", validate_time(end, "End time"));

    let slot = Slot {
        date: parse_date(date)?.format("%Y-%m-%d").to_string(),
        start_time: normalize_time(start)?,
        end_time: normalize_time(end)?,
    };
    if slot.end_time <= slot.start_time {
        errors.add("end_time", "End time must be after start time");
        return None;
    }
    Some(slot)
}

fn slot_taken(slot: &Slot) -> ApiError {
    ApiError::conflict(format!(
        "Hall is already booked on {} between {} and {}",
        slot.date, slot.start_time, slot.end_time
    ))
}

async fn load_booking_detail(state: &AppState, id: &str) -> Result<HallBookingDetail, ApiError> {
    HallBooking::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hall booking not found"))
}

pub async fn list_hall_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HallBookingListQuery>,
) -> ApiResult<Vec<HallBookingDetail>> {
    let status = parse_filter(
        "status",
        query.status.as_deref(),
        HallBookingStatus::parse,
        HallBookingStatus::expected(),
    )?
    .map(|s| s.as_str());
    if let Some(ref from) = query.from {
        validate_date(from, "from").map_err(|e| ApiError::validation_field("from", e))?;
    }

    let sql = format!(
        r#"{}
        WHERE (? IS NULL OR b.hall_id = ?)
          AND (? IS NULL OR b.status = ?)
          AND (? IS NULL OR b.date >= ?)
        ORDER BY b.date ASC, b.start_time ASC"#,
        HALL_BOOKING_DETAIL_SELECT
    );
    let bookings = sqlx::query_as::<_, HallBookingDetail>(&sql)
        .bind(&query.hall_id)
        .bind(&query.hall_id)
        .bind(status)
        .bind(status)
        .bind(&query.from)
        .bind(&query.from)
        .fetch_all(&state.db)
        .await?;

    ok(bookings)
}

pub async fn get_hall_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<HallBookingDetail> {
    ok(load_booking_detail(&state, &id).await?)
}

pub async fn create_hall_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateHallBookingRequest>,
) -> Created<HallBookingDetail> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("organizer", validate_required(&req.organizer, "Organizer", 100));
    errors.check("contact_email", validate_email(&req.contact_email));
    errors.check("attendees", validate_positive_int(req.attendees, "Attendees"));
    errors.check("notes", validate_optional_len(&req.notes, "Notes", 2000));
    let slot = validate_slot(&mut errors, &req.date, &req.start_time, &req.end_time);
    errors.finish()?;
    let slot = slot.ok_or_else(|| ApiError::validation_field("date", "Invalid schedule"))?;

    let hall = load_hall(&state, &req.hall_id).await?;
    if HallStatus::parse(&hall.status) != Some(HallStatus::Available) {
        return Err(ApiError::conflict(format!("{} is not available for booking", hall.name)));
    }
    if req.attendees > hall.capacity {
        return Err(ApiError::validation_field(
            "attendees",
            format!("{} seats at most {} attendees", hall.name, hall.capacity),
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    // Overlap check and insert are one statement so concurrent requests cannot both land
    let sql = format!(
        r#"
        INSERT INTO hall_bookings (id, hall_id, organizer, contact_email, date, start_time, end_time,
                                   attendees, notes, status, created_at, updated_at)
        SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
        WHERE {}
        "#,
        NO_OVERLAPPING_BOOKING
    );
    let result = sqlx::query(&sql)
        .bind(&id)
        .bind(&hall.id)
        .bind(req.organizer.trim())
        .bind(req.contact_email.trim().to_lowercase())
        .bind(&slot.date)
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .bind(req.attendees)
        .bind(&req.notes)
        .bind(HallBookingStatus::Scheduled.as_str())
        .bind(&now)
        .bind(&now)
        .bind(&hall.id)
        .bind(&slot.date)
        .bind(&slot.end_time)
        .bind(&slot.start_time)
        .bind(None::<String>)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(slot_taken(&slot));
    }

    tracing::info!(booking_id = %id, hall = %hall.name, date = %slot.date, "Hall booked");
    created(load_booking_detail(&state, &id).await?)
}

pub async fn update_hall_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateHallBookingRequest>,
) -> ApiResult<HallBookingDetail> {
    let existing = HallBooking::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hall booking not found"))?;

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref organizer) = req.organizer {
        errors.check("organizer", validate_required(organizer, "Organizer", 100));
    }
    if let Some(ref email) = req.contact_email {
        errors.check("contact_email", validate_email(email));
    }
    if let Some(attendees) = req.attendees {
        errors.check("attendees", validate_positive_int(attendees, "Attendees"));
    }
    if let Some(ref status) = req.status {
        errors.check(
            "status",
            validate_one_of(status, HallBookingStatus::parse, &HallBookingStatus::expected()),
        );
    }
    let slot = validate_slot(
        &mut errors,
        req.date.as_deref().unwrap_or(&existing.date),
        req.start_time.as_deref().unwrap_or(&existing.start_time),
        req.end_time.as_deref().unwrap_or(&existing.end_time),
    );
    errors.finish()?;
    let slot = slot.ok_or_else(|| ApiError::validation_field("date", "Invalid schedule"))?;

    let status = req
        .status
        .as_deref()
        .and_then(HallBookingStatus::parse)
        .or_else(|| HallBookingStatus::parse(&existing.status))
        .unwrap_or(HallBookingStatus::Scheduled);

    if status == HallBookingStatus::Scheduled {
        if let Some(hall) = MeetingHall::find(&state.db, &existing.hall_id).await? {
            let attendees = req.attendees.unwrap_or(existing.attendees);
            if attendees > hall.capacity {
                return Err(ApiError::validation_field(
                    "attendees",
                    format!("{} seats at most {} attendees", hall.name, hall.capacity),
                ));
            }
        }
    }

    let now = chrono::Utc::now().to_rfc3339();
    // Only a scheduled result has to be free of overlaps
    let sql = format!(
        r#"
        UPDATE hall_bookings SET
            organizer = COALESCE(?, organizer),
            contact_email = COALESCE(?, contact_email),
            date = ?, start_time = ?, end_time = ?,
            attendees = COALESCE(?, attendees),
            notes = COALESCE(?, notes),
            status = ?,
            updated_at = ?
        WHERE id = ? AND (? != 'Scheduled' OR {})
        "#,
        NO_OVERLAPPING_BOOKING
    );
    let result = sqlx::query(&sql)
        .bind(req.organizer.as_deref().map(str::trim))
        .bind(req.contact_email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(&slot.date)
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .bind(req.attendees)
        .bind(&req.notes)
        .bind(status.as_str())
        .bind(&now)
        .bind(&id)
        .bind(status.as_str())
        .bind(&existing.hall_id)
        .bind(&slot.date)
        .bind(&slot.end_time)
        .bind(&slot.start_time)
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        load_booking_detail(&state, &id).await?;
        return Err(slot_taken(&slot));
    }

    ok(load_booking_detail(&state, &id).await?)
}

pub async fn delete_hall_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM hall_bookings WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Hall booking not found"));
    }
    deleted(id)
}

// -------------------------------------------------------------------------
// Booking requests
// -------------------------------------------------------------------------

async fn load_request(state: &AppState, id: &str) -> Result<BookingRequest, ApiError> {
    BookingRequest::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking request not found"))
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingRequestListQuery>,
) -> ApiResult<Vec<BookingRequest>> {
    let status = parse_filter(
        "status",
        query.status.as_deref(),
        RequestStatus::parse,
        RequestStatus::expected(),
    )?
    .map(|s| s.as_str());
    // `unread=true` means is_read = 0
    let is_read = query.unread.map(|unread| !unread);

    let requests = sqlx::query_as::<_, BookingRequest>(
        r#"
        SELECT * FROM booking_requests
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR is_read = ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(is_read)
    .bind(is_read)
    .fetch_all(&state.db)
    .await?;

    ok(requests)
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<BookingRequest> {
    ok(load_request(&state, &id).await?)
}

/// Public inquiry form
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequestPayload>,
) -> Created<BookingRequest> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Name", 100));
    errors.check("email", validate_email(&req.email));
    errors.check("phone", validate_phone(&req.phone));
    errors.check("company", validate_optional_len(&req.company, "Company", 100));
    errors.check("message", validate_optional_len(&req.message, "Message", 5000));
    if let Some(ref date) = req.event_date {
        errors.check("event_date", validate_date(date, "Event date"));
    }
    if let Some(attendees) = req.attendees {
        errors.check("attendees", validate_positive_int(attendees, "Attendees"));
    }
    errors.finish()?;

    if let Some(ref hall_id) = req.hall_id {
        if MeetingHall::find(&state.db, hall_id).await?.is_none() {
            return Err(ApiError::validation_field("hall_id", "Meeting hall not found"));
        }
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO booking_requests (id, name, email, phone, company, hall_id, event_date, attendees,
                                      message, status, is_read, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(req.email.trim().to_lowercase())
    .bind(&req.phone)
    .bind(&req.company)
    .bind(&req.hall_id)
    .bind(req.event_date.as_deref().map(str::trim))
    .bind(req.attendees)
    .bind(&req.message)
    .bind(RequestStatus::New.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(request_id = %id, "Meeting hall booking request received");
    created(load_request(&state, &id).await?)
}

/// Advance a request through triage
pub async fn update_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequestStatusPayload>,
) -> ApiResult<BookingRequest> {
    let next = RequestStatus::parse(&req.status).ok_or_else(|| {
        ApiError::validation_field(
            "status",
            format!("Must be one of: {}", RequestStatus::expected()),
        )
    })?;

    let existing = load_request(&state, &id).await?;
    let current = RequestStatus::parse(&existing.status).unwrap_or(RequestStatus::New);

    if current == next {
        return ok(existing);
    }
    if !current.can_transition_to(next) {
        return Err(ApiError::conflict(format!(
            "Cannot move a {} request to {}",
            current, next
        )));
    }

    // Guard against a concurrent transition from the same state
    let result = sqlx::query(
        "UPDATE booking_requests SET status = ?, is_read = 1, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .bind(current.as_str())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Request was updated concurrently, reload and retry"));
    }

    tracing::info!(request_id = %id, from = %current, to = %next, "Booking request status changed");
    ok(load_request(&state, &id).await?)
}

pub async fn mark_request_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<BookingRequest> {
    let result = sqlx::query("UPDATE booking_requests SET is_read = 1, updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking request not found"));
    }
    ok(load_request(&state, &id).await?)
}

pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM booking_requests WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking request not found"));
    }
    deleted(id)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};

    async fn create_hall(app: &Router) -> String {
        let req = json!({
            "name": "Harbour Room",
            "capacity": 40,
            "price_per_hour": 120,
            "amenities": ["Projector", " ", "Whiteboard"],
            "image_url": "halls/harbour.jpg"
        });
        let (status, body) = send(app, Method::POST, "/api/meeting-hall/halls", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["amenities"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["data"]["image_url"],
            "http://localhost:4000/media/halls/harbour.jpg"
        );
        body["data"]["id"].as_str().unwrap().to_string()
    }

    fn booking(hall_id: &str, start: &str, end: &str) -> Value {
        json!({
            "hall_id": hall_id,
            "organizer": "Acme Ltd",
            "contact_email": "events@acme.test",
            "date": "2026-11-02",
            "start_time": start,
            "end_time": end,
            "attendees": 25
        })
    }

    #[tokio::test]
    async fn test_overlapping_bookings_conflict() {
        let (app, _dir) = test_app().await;
        let hall = create_hall(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "9:00", "12:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["start_time"], "09:00");
        assert_eq!(body["data"]["hall_name"], "Harbour Room");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "11:00", "13:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Back-to-back is fine
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "12:00", "14:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "15:00", "14:00")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/meeting-hall/bookings?hall_id={}", hall);
        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let (app, _dir) = test_app().await;
        let hall = create_hall(&app).await;
        let mut req = booking(&hall, "09:00", "10:00");
        req["attendees"] = json!(41);
        let (status, body) = send(&app, Method::POST, "/api/meeting-hall/bookings", Some(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["attendees"].is_array());
    }

    #[tokio::test]
    async fn test_request_triage() {
        let (app, _dir) = test_app().await;

        let inquiry = json!({
            "name": "Jo Planner",
            "email": "jo@example.com",
            "event_date": "2026-12-10",
            "attendees": 30,
            "message": "Offsite for the sales team"
        });
        let (status, body) = send(&app, Method::POST, "/api/meeting-hall/requests", Some(inquiry)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "New");
        assert_eq!(body["data"]["is_read"], false);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, Method::GET, "/api/meeting-hall/requests?unread=true", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let read_uri = format!("/api/meeting-hall/requests/{}/read", id);
        let (status, body) = send(&app, Method::PATCH, &read_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_read"], true);

        let status_uri = format!("/api/meeting-hall/requests/{}/status", id);
        let (status, body) =
            send(&app, Method::PATCH, &status_uri, Some(json!({ "status": "contacted" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Contacted");

        let (status, _) =
            send(&app, Method::PATCH, &status_uri, Some(json!({ "status": "Declined" }))).await;
        assert_eq!(status, StatusCode::OK);

        // Declined is final
        let (status, _) =
            send(&app, Method::PATCH, &status_uri, Some(json!({ "status": "Confirmed" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Same status again is a no-op
        let (status, body) =
            send(&app, Method::PATCH, &status_uri, Some(json!({ "status": "Declined" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Declined");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_for_one_slot() {
        let (app, _dir) = test_app().await;
        let hall = create_hall(&app).await;

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let app = app.clone();
                let req = booking(&hall, "09:00", "12:00");
                tokio::spawn(async move {
                    send(&app, Method::POST, "/api/meeting-hall/bookings", Some(req)).await.0
                })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                StatusCode::CREATED => created += 1,
                status => assert_eq!(status, StatusCode::CONFLICT),
            }
        }
        assert_eq!(created, 1);

        let uri = format!("/api/meeting-hall/bookings?hall_id={}", hall);
        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rescheduling_respects_other_bookings() {
        let (app, _dir) = test_app().await;
        let hall = create_hall(&app).await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "09:00", "11:00")),
        )
        .await;
        let morning = body["data"]["id"].as_str().unwrap().to_string();
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/meeting-hall/bookings",
            Some(booking(&hall, "13:00", "15:00")),
        )
        .await;
        let afternoon = format!("/api/meeting-hall/bookings/{}", body["data"]["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            Method::PUT,
            &afternoon,
            Some(json!({ "start_time": "10:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Shifting within its own slot does not collide with itself
        let (status, body) = send(
            &app,
            Method::PUT,
            &afternoon,
            Some(json!({ "start_time": "12:00", "end_time": "14:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["start_time"], "12:00");

        // Cancelled bookings no longer hold the slot
        let morning_uri = format!("/api/meeting-hall/bookings/{}", morning);
        let (status, _) =
            send(&app, Method::PUT, &morning_uri, Some(json!({ "status": "Cancelled" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            Method::PUT,
            &afternoon,
            Some(json!({ "start_time": "09:30" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/meeting-hall/bookings/missing",
            Some(json!({ "notes": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
