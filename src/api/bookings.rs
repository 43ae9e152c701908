//! Guest booking flow: catalog, quotes and confirmed bookings.
//!
//! A quote is priced from the in-memory catalog. Creating a booking re-prices
//! the same request, applies an optional promo code and stores the result
//! under a fresh confirmation code. The booking row, the promo redemption and
//! the loyalty award commit together.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::booking::{BookingKind, Catalog, Quote, QuoteRequest};
use crate::db::{
    Booking, BookingListQuery, BookingResponse, BookingStatus, CreateBookingRequest,
    LoyaltySettings, NewRedemption, PromoRedemption, UpdateBookingStatusRequest,
};
use crate::engine::{confirmation_code, PricedOption};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::metrics::{record_booking_created, record_promo_redemption};
use super::promo_codes::{check_code, rejection_error};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{validate_email, validate_optional_len, validate_required};

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_kind(value: &str) -> Result<BookingKind, ApiError> {
    BookingKind::parse(value).ok_or_else(|| {
        let expected: Vec<&str> = BookingKind::ALL.iter().map(|k| k.as_str()).collect();
        ApiError::validation_field("kind", format!("Must be one of: {}", expected.join(", ")))
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub kind: Option<String>,
}

/// Bookable items and add-ons, optionally for one kind
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Catalog> {
    let Some(kind) = query.kind.as_deref() else {
        return ok(state.catalog.as_ref().clone());
    };
    let kind = parse_kind(kind)?;

    ok(Catalog {
        items: state.catalog.items_of(kind).cloned().collect(),
        addons: state
            .catalog
            .addons
            .iter()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect(),
    })
}

/// Price a prospective booking without storing anything
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<Quote> {
    ok(state.catalog.quote(&req, today())?)
}

/// Confirm a booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Created<BookingResponse> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("guest_name", validate_required(&req.guest_name, "Guest name", 100));
    errors.check("guest_email", validate_email(&req.guest_email));
    errors.check(
        "special_requests",
        validate_optional_len(&req.special_requests, "Special requests", 2000),
    );
    errors.finish()?;

    let quote = state.catalog.quote(&req.quote, today())?;
    let customer_id = req
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let promo_code = req
        .promo_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let promo = match promo_code {
        Some(code) => {
            match check_code(
                &state.db,
                code,
                quote.breakdown.subtotal,
                customer_id,
                quote.kind.service_type(),
            )
            .await?
            {
                Ok(found) => Some(found),
                Err(rejection) => {
                    record_promo_redemption(rejection.code());
                    return Err(rejection_error(&rejection));
                }
            }
        }
        None => None,
    };

    let discount = promo.as_ref().map(|(_, o)| o.discount).unwrap_or(0.0);
    let breakdown = quote.breakdown.clone().with_discount(discount);
    let settings = LoyaltySettings::get(&state.db).await?;
    let points = settings.points_for_amount(breakdown.total);

    let id = Uuid::new_v4().to_string();
    let code = confirmation_code(quote.kind.code_prefix());
    let now = chrono::Utc::now().to_rfc3339();
    let fmt_date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
    let to_json = |options: &Vec<PricedOption>| {
        serde_json::to_string(options).unwrap_or_else(|_| "[]".to_string())
    };

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO bookings (id, confirmation_code, kind, item_id, item_name, guest_name, guest_email,
                              customer_id, check_in, check_out, booking_date, quantity, extras, addons,
                              subtotal, promo_code, discount, total, status, special_requests,
                              created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&code)
    .bind(quote.kind.as_str())
    .bind(&quote.item_id)
    .bind(&quote.item_name)
    .bind(req.guest_name.trim())
    .bind(req.guest_email.trim().to_lowercase())
    .bind(customer_id)
    .bind(fmt_date(quote.check_in))
    .bind(fmt_date(quote.check_out))
    .bind(fmt_date(quote.date))
    .bind(i64::from(quote.guests))
    .bind(to_json(&breakdown.extras))
    .bind(to_json(&breakdown.addons))
    .bind(breakdown.subtotal)
    .bind(promo.as_ref().map(|(p, _)| p.code.as_str()))
    .bind(breakdown.discount)
    .bind(breakdown.total)
    .bind(BookingStatus::Confirmed.as_str())
    .bind(&req.special_requests)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    if let Some((ref found, ref outcome)) = promo {
        let recorded = PromoRedemption::record(
            &mut tx,
            NewRedemption {
                promo: found,
                customer_id,
                booking_id: Some(&id),
                order_amount: outcome.order_amount,
                discount: outcome.discount,
            },
        )
        .await?;
        if let Err(rejection) = recorded {
            tx.rollback().await?;
            record_promo_redemption(rejection.code());
            return Err(rejection_error(&rejection));
        }
    }

    if let (Some(customer_id), true) = (customer_id, points > 0) {
        sqlx::query("UPDATE users SET loyalty_points = loyalty_points + ?, updated_at = ? WHERE id = ?")
            .bind(points)
            .bind(&now)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    if promo.is_some() {
        record_promo_redemption("redeemed");
    }
    record_booking_created(quote.kind.as_str());
    tracing::info!(
        booking_id = %id,
        confirmation_code = %code,
        kind = %quote.kind,
        total = breakdown.total,
        "Booking confirmed"
    );

    let booking = load_booking(&state, &id).await?;
    created(booking.into())
}

async fn load_booking(state: &AppState, id: &str) -> Result<Booking, ApiError> {
    Booking::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<Vec<BookingResponse>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| {
                    ApiError::validation_field(
                        "status",
                        format!("Must be one of: {}", BookingStatus::expected()),
                    )
                })?
                .as_str(),
        ),
        None => None,
    };
    let kind = query.kind.as_deref().map(parse_kind).transpose()?.map(|k| k.as_str());

    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT * FROM bookings
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR kind = ?)
          AND (? IS NULL OR customer_id = ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(kind)
    .bind(kind)
    .bind(&query.customer_id)
    .bind(&query.customer_id)
    .fetch_all(&state.db)
    .await?;

    ok(bookings.into_iter().map(BookingResponse::from).collect())
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<BookingResponse> {
    ok(load_booking(&state, &id).await?.into())
}

/// Public lookup by confirmation code
pub async fn get_by_confirmation(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<BookingResponse> {
    let booking = Booking::find_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::not_found("No booking with this confirmation code"))?;
    ok(booking.into())
}

/// Confirmed bookings can be completed or cancelled; both are final
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingStatusRequest>,
) -> ApiResult<BookingResponse> {
    let next = BookingStatus::parse(&req.status).ok_or_else(|| {
        ApiError::validation_field(
            "status",
            format!("Must be one of: {}", BookingStatus::expected()),
        )
    })?;
    let existing = load_booking(&state, &id).await?;
    let current = BookingStatus::parse(&existing.status).unwrap_or(BookingStatus::Confirmed);

    if current == next {
        return ok(existing.into());
    }
    if current != BookingStatus::Confirmed {
        return Err(ApiError::conflict(format!(
            "Booking is {} and can no longer change",
            current
        )));
    }

    let result = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(next.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&id)
        .bind(current.as_str())
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Booking was updated concurrently, reload and retry"));
    }

    tracing::info!(booking_id = %id, status = %next, "Booking status changed");
    ok(load_booking(&state, &id).await?.into())
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }
    deleted(id)
}
