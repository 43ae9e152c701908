//! Guest and staff accounts, account status and loyalty point balances.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    tier_for_points, AdjustPointsRequest, CreateUserRequest, LoyaltySettings, LoyaltyTier,
    UpdateUserRequest, UpdateUserStatusRequest, User, UserListQuery, UserResponse, UserStatus,
};
use crate::AppState;

use super::error::{ApiError, ErrorCode, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_email, validate_one_of, validate_optional_len, validate_phone, validate_required,
};

fn validate_status(status: &str) -> Result<(), String> {
    validate_one_of(status, UserStatus::parse, &UserStatus::expected())
}

/// Largest balance or single adjustment accepted from a client
const MAX_POINTS: i64 = 1_000_000_000;

fn default_role(is_staff: bool) -> &'static str {
    if is_staff {
        "staff"
    } else {
        "guest"
    }
}

async fn with_tier(state: &AppState, user: User) -> Result<UserResponse, ApiError> {
    let tiers = LoyaltyTier::list_all(&state.db).await?;
    let tier = tier_for_points(&tiers, user.loyalty_points).map(|t| t.name.clone());
    Ok(user.to_response(tier))
}

async fn load_user(state: &AppState, id: &str) -> Result<User, ApiError> {
    User::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// List users, optionally filtered by staff flag, status or a search term
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Vec<UserResponse>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            UserStatus::parse(s)
                .ok_or_else(|| {
                    ApiError::validation_field(
                        "status",
                        format!("Must be one of: {}", UserStatus::expected()),
                    )
                })?
                .as_str(),
        ),
        None => None,
    };
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE (? IS NULL OR is_staff = ?)
          AND (? IS NULL OR status = ?)
          AND (? IS NULL OR LOWER(name) LIKE ? OR LOWER(email) LIKE ?)
        ORDER BY created_at DESC, name ASC
        "#,
    )
    .bind(query.staff)
    .bind(query.staff)
    .bind(status)
    .bind(status)
    .bind(&search)
    .bind(&search)
    .bind(&search)
    .fetch_all(&state.db)
    .await?;

    let tiers = LoyaltyTier::list_all(&state.db).await?;
    let responses = users
        .into_iter()
        .map(|u| {
            let tier = tier_for_points(&tiers, u.loyalty_points).map(|t| t.name.clone());
            u.to_response(tier)
        })
        .collect();

    ok(responses)
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let user = load_user(&state, &id).await?;
    ok(with_tier(&state, user).await?)
}

/// Create a user. Guests receive the signup bonus when the program is enabled.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Created<UserResponse> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Name", 100));
    errors.check("email", validate_email(&req.email));
    errors.check("phone", validate_phone(&req.phone));
    errors.check("role", validate_optional_len(&req.role, "Role", 50));
    if let Some(ref status) = req.status {
        errors.check("status", validate_status(status));
    }
    if req.loyalty_points < 0 {
        errors.add("loyalty_points", "Loyalty points cannot be negative");
    } else if req.loyalty_points > MAX_POINTS {
        errors.add(
            "loyalty_points",
            format!("Loyalty points cannot exceed {}", MAX_POINTS),
        );
    }
    errors.finish()?;

    let settings = LoyaltySettings::get(&state.db).await?;
    let bonus = if !req.is_staff && settings.program_enabled {
        settings.signup_bonus.max(0)
    } else {
        0
    };
    let opening_balance = req.loyalty_points.checked_add(bonus).ok_or_else(|| {
        ApiError::validation_field("loyalty_points", "Loyalty points are out of range")
    })?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let role = req
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(default_role(req.is_staff));
    let status = req
        .status
        .as_deref()
        .and_then(UserStatus::parse)
        .unwrap_or(UserStatus::Active);

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, phone, is_staff, role, loyalty_points, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(req.email.trim().to_lowercase())
    .bind(&req.phone)
    .bind(req.is_staff)
    .bind(role)
    .bind(opening_balance)
    .bind(status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| match ApiError::from(e) {
        err if err.code() == ErrorCode::Conflict => {
            ApiError::conflict("A user with this email already exists")
        }
        err => err,
    })?;

    let user = load_user(&state, &id).await?;
    tracing::info!(user_id = %user.id, staff = user.is_staff, "User created");
    created(with_tier(&state, user).await?)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Name", 100));
    }
    if let Some(ref email) = req.email {
        errors.check("email", validate_email(email));
    }
    errors.check("phone", validate_phone(&req.phone));
    errors.check("role", validate_optional_len(&req.role, "Role", 50));
    if let Some(ref status) = req.status {
        errors.check("status", validate_status(status));
    }
    errors.finish()?;

    load_user(&state, &id).await?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            is_staff = COALESCE(?, is_staff),
            role = COALESCE(?, role),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.email.as_deref().map(|e| e.trim().to_lowercase()))
    .bind(&req.phone)
    .bind(req.is_staff)
    .bind(req.role.as_deref().map(str::trim))
    .bind(req.status.as_deref().and_then(UserStatus::parse).map(|s| s.as_str()))
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let user = load_user(&state, &id).await?;
    ok(with_tier(&state, user).await?)
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!(user_id = %id, "User deleted");
    deleted(id)
}

/// Activate or deactivate an account
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserStatusRequest>,
) -> ApiResult<UserResponse> {
    let status = UserStatus::parse(&req.status).ok_or_else(|| {
        ApiError::validation_field("status", format!("Must be one of: {}", UserStatus::expected()))
    })?;

    let result = sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, status = %status, "User status changed");
    let user = load_user(&state, &id).await?;
    ok(with_tier(&state, user).await?)
}

/// Credit or debit loyalty points; the balance never goes below zero
pub async fn adjust_points(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AdjustPointsRequest>,
) -> ApiResult<UserResponse> {
    if req.delta == 0 {
        return Err(ApiError::validation_field("delta", "Delta must not be zero"));
    }
    if !(-MAX_POINTS..=MAX_POINTS).contains(&req.delta) {
        return Err(ApiError::validation_field(
            "delta",
            format!("Delta must be between -{0} and {0}", MAX_POINTS),
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE users SET loyalty_points = loyalty_points + ?, updated_at = ?
        WHERE id = ? AND loyalty_points + ? >= 0
        "#,
    )
    .bind(req.delta)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .bind(req.delta)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        let user = load_user(&state, &id).await?;
        return Err(ApiError::validation_field(
            "delta",
            format!(
                "Insufficient points: balance is {}, cannot apply {}",
                user.loyalty_points, req.delta
            ),
        ));
    }

    tracing::info!(
        user_id = %id,
        delta = req.delta,
        reason = req.reason.as_deref().unwrap_or("manual adjustment"),
        "Loyalty points adjusted"
    );
    let user = load_user(&state, &id).await?;
    ok(with_tier(&state, user).await?)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn create(app: &axum::Router, body: Value) -> Value {
        let (status, body) = send(app, Method::POST, "/api/users", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_create_and_filter_users() {
        let (app, _dir) = test_app().await;

        let guest = create(&app, json!({ "name": "Ada Guest", "email": "Ada@Example.com" })).await;
        assert_eq!(guest["email"], "ada@example.com");
        assert_eq!(guest["role"], "guest");
        assert_eq!(guest["tier"], "Bronze");

        create(
            &app,
            json!({ "name": "Sam Staff", "email": "sam@hotel.test", "is_staff": true }),
        )
        .await;

        let (_, body) = send(&app, Method::GET, "/api/users?staff=true", None).await;
        let staff = body["data"].as_array().unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0]["role"], "staff");

        let (_, body) = send(&app, Method::GET, "/api/users?search=ADA", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let dup = json!({ "name": "Other", "email": "ada@example.com" });
        let (status, _) = send(&app, Method::POST, "/api/users", Some(dup)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_status_toggle() {
        let (app, _dir) = test_app().await;
        let user = create(&app, json!({ "name": "Lee", "email": "lee@example.com" })).await;
        let uri = format!("/api/users/{}/status", user["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "status": "inactive" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Inactive");

        let (_, body) = send(&app, Method::GET, "/api/users?status=Active", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "status": "banned" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_points_never_negative() {
        let (app, _dir) = test_app().await;
        let user = create(
            &app,
            json!({ "name": "Kim", "email": "kim@example.com", "loyalty_points": 900 }),
        )
        .await;
        let uri = format!("/api/users/{}/points", user["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "delta": 150 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["loyalty_points"], 1050);
        assert_eq!(body["data"]["tier"], "Silver");

        let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "delta": -2000 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, &uri.replace("/points", ""), None).await;
        assert_eq!(body["data"]["loyalty_points"], 1050);

        let (status, _) = send(&app, Method::POST, "/api/users/missing/points", Some(json!({ "delta": 5 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_point_values_rejected() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({ "name": "Max", "email": "max@example.com", "loyalty_points": i64::MAX })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["loyalty_points"].is_array());

        let user = create(&app, json!({ "name": "Max", "email": "max@example.com" })).await;
        let uri = format!("/api/users/{}/points", user["id"].as_str().unwrap());
        let (status, body) =
            send(&app, Method::POST, &uri, Some(json!({ "delta": i64::MAX }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["delta"].is_array());
    }
}
