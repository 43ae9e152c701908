//! Guest bookings produced by the booking context.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::string_enum;
use crate::booking::QuoteRequest;
use crate::engine::PricedOption;

string_enum!(BookingStatus {
    Confirmed => "Confirmed",
    Cancelled => "Cancelled",
    Completed => "Completed",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: String,
    pub confirmation_code: String,
    pub kind: String,
    pub item_id: String,
    pub item_name: String,
    pub guest_name: String,
    pub guest_email: String,
    pub customer_id: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub booking_date: Option<String>,
    pub quantity: i64,
    /// JSON list of priced options
    pub extras: String,
    /// JSON list of priced options
    pub addons: String,
    pub subtotal: f64,
    pub promo_code: Option<String>,
    pub discount: f64,
    pub total: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub confirmation_code: String,
    pub kind: String,
    pub item_id: String,
    pub item_name: String,
    pub guest_name: String,
    pub guest_email: String,
    pub customer_id: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub booking_date: Option<String>,
    pub quantity: i64,
    pub extras: Vec<PricedOption>,
    pub addons: Vec<PricedOption>,
    pub subtotal: f64,
    pub promo_code: Option<String>,
    pub discount: f64,
    pub total: f64,
    pub status: String,
    pub special_requests: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_options(json: &str) -> Vec<PricedOption> {
    serde_json::from_str(json).unwrap_or_default()
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            extras: parse_options(&b.extras),
            addons: parse_options(&b.addons),
            id: b.id,
            confirmation_code: b.confirmation_code,
            kind: b.kind,
            item_id: b.item_id,
            item_name: b.item_name,
            guest_name: b.guest_name,
            guest_email: b.guest_email,
            customer_id: b.customer_id,
            check_in: b.check_in,
            check_out: b.check_out,
            booking_date: b.booking_date,
            quantity: b.quantity,
            subtotal: b.subtotal,
            promo_code: b.promo_code,
            discount: b.discount,
            total: b.total,
            status: b.status,
            special_requests: b.special_requests,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

impl Booking {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_code(db: &SqlitePool, code: &str) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE confirmation_code = ?")
            .bind(code.trim().to_uppercase())
            .fetch_optional(db)
            .await
    }
}

/// Guest booking submission: what to book plus who books it
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub quote: QuoteRequest,
    pub guest_name: String,
    pub guest_email: String,
    pub customer_id: Option<String>,
    pub promo_code: Option<String>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub customer_id: Option<String>,
}
