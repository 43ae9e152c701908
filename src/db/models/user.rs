//! Guest and staff user models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::string_enum;

string_enum!(UserStatus {
    Active => "Active",
    Inactive => "Inactive",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub role: String,
    pub loyalty_points: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub role: String,
    pub loyalty_points: i64,
    /// Loyalty tier name for the current balance
    pub tier: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn to_response(self, tier: Option<String>) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            is_staff: self.is_staff,
            role: self.role,
            loyalty_points: self.loyalty_points,
            tier,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub fn is_active(&self) -> bool {
        UserStatus::parse(&self.status) == Some(UserStatus::Active)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    pub role: Option<String>,
    #[serde(default)]
    pub loyalty_points: i64,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_staff: Option<bool>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: String,
}

/// Credit (positive) or debit (negative) loyalty points
#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    pub delta: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    /// `true` for staff only, `false` for guests only
    pub staff: Option<bool>,
    pub status: Option<String>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}
