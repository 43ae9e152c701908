//! Meeting halls, their bookings and incoming booking requests.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{parse_json_list, string_enum};
use crate::config::ServerConfig;

string_enum!(HallStatus {
    Available => "Available",
    Maintenance => "Maintenance",
});

string_enum!(HallBookingStatus {
    Scheduled => "Scheduled",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

string_enum!(
    /// Staff triage state of a booking request
    RequestStatus {
        New => "New",
        Contacted => "Contacted",
        Confirmed => "Confirmed",
        Declined => "Declined",
    }
);

impl RequestStatus {
    /// `Confirmed` and `Declined` are final
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (New, Contacted) | (New, Confirmed) | (New, Declined) => true,
            (Contacted, Confirmed) | (Contacted, Declined) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeetingHall {
    pub id: String,
    pub name: String,
    pub capacity: i64,
    pub area_sqm: Option<f64>,
    pub description: Option<String>,
    pub amenities: String,
    pub image_url: Option<String>,
    pub price_per_hour: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingHallResponse {
    pub id: String,
    pub name: String,
    pub capacity: i64,
    pub area_sqm: Option<f64>,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub image_url: Option<String>,
    pub price_per_hour: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl MeetingHall {
    pub fn to_response(self, server: &ServerConfig) -> MeetingHallResponse {
        MeetingHallResponse {
            amenities: parse_json_list(&self.amenities),
            image_url: self.image_url.map(|u| server.media_url(&u)),
            id: self.id,
            name: self.name,
            capacity: self.capacity,
            area_sqm: self.area_sqm,
            description: self.description,
            price_per_hour: self.price_per_hour,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<MeetingHall>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM meeting_halls WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMeetingHallRequest {
    pub name: String,
    pub capacity: i64,
    pub area_sqm: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub price_per_hour: f64,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeetingHallRequest {
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub area_sqm: Option<f64>,
    pub description: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub price_per_hour: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HallBooking {
    pub id: String,
    pub hall_id: String,
    pub organizer: String,
    pub contact_email: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: i64,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Hall booking with the hall name resolved
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HallBookingDetail {
    pub id: String,
    pub hall_id: String,
    pub hall_name: Option<String>,
    pub organizer: String,
    pub contact_email: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: i64,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

pub const HALL_BOOKING_DETAIL_SELECT: &str = r#"
    SELECT b.id, b.hall_id, h.name AS hall_name, b.organizer, b.contact_email, b.date,
           b.start_time, b.end_time, b.attendees, b.notes, b.status, b.created_at, b.updated_at
    FROM hall_bookings b
    LEFT JOIN meeting_halls h ON h.id = b.hall_id
"#;

impl HallBooking {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<HallBooking>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM hall_bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_detail(db: &SqlitePool, id: &str) -> Result<Option<HallBookingDetail>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE b.id = ?", HALL_BOOKING_DETAIL_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

/// Guard for conditional writes: no other scheduled booking of the hall overlaps
/// `[start, end)` on the date. Binds hall_id, date, end_time, start_time, excluded id.
pub const NO_OVERLAPPING_BOOKING: &str = r#"
    NOT EXISTS (
        SELECT 1 FROM hall_bookings o
        WHERE o.hall_id = ? AND o.date = ? AND o.status = 'Scheduled'
          AND o.start_time < ? AND o.end_time > ?
          AND o.id != COALESCE(?, '')
    )
"#;

#[derive(Debug, Deserialize)]
pub struct CreateHallBookingRequest {
    pub hall_id: String,
    pub organizer: String,
    pub contact_email: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHallBookingRequest {
    pub organizer: Option<String>,
    pub contact_email: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub attendees: Option<i64>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HallBookingListQuery {
    pub hall_id: Option<String>,
    pub status: Option<String>,
    /// Bookings on or after this date
    pub from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hall_id: Option<String>,
    pub event_date: Option<String>,
    pub attendees: Option<i64>,
    pub message: Option<String>,
    pub status: String,
    pub is_read: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl BookingRequest {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<BookingRequest>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM booking_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

/// Inquiry submitted from the public meeting-hall page
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequestPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hall_id: Option<String>,
    pub event_date: Option<String>,
    pub attendees: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequestStatusPayload {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequestListQuery {
    pub status: Option<String>,
    pub unread: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_transitions() {
        use RequestStatus::*;
        assert!(New.can_transition_to(Contacted));
        assert!(New.can_transition_to(Confirmed));
        assert!(Contacted.can_transition_to(Declined));
        assert!(Contacted.can_transition_to(Contacted));

        assert!(!Contacted.can_transition_to(New));
        assert!(!Confirmed.can_transition_to(Declined));
        assert!(!Declined.can_transition_to(Contacted));
    }

    #[test]
    fn test_hall_response_absolutizes_image() {
        let hall = MeetingHall {
            id: "h1".to_string(),
            name: "Orchid".to_string(),
            capacity: 80,
            area_sqm: Some(120.0),
            description: None,
            amenities: r#"["Projector","Stage"]"#.to_string(),
            image_url: Some("halls/orchid.jpg".to_string()),
            price_per_hour: 150.0,
            status: "Available".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let server = ServerConfig {
            public_url: "http://hotel.test".to_string(),
            ..ServerConfig::default()
        };
        let resp = hall.to_response(&server);
        assert_eq!(resp.image_url.as_deref(), Some("http://hotel.test/media/halls/orchid.jpg"));
        assert_eq!(resp.amenities.len(), 2);
    }
}
