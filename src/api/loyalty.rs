//! Loyalty program endpoints: tiers, rewards and program settings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    clean_list, to_json_list, CreateLoyaltyRewardRequest, CreateLoyaltyTierRequest, LoyaltyReward,
    LoyaltySettings, LoyaltyTier, LoyaltyTierResponse, RewardListQuery, RewardStatus,
    UpdateLoyaltyRewardRequest, UpdateLoyaltySettingsRequest, UpdateLoyaltyTierRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_hex_color, validate_non_negative, validate_one_of, validate_optional_len,
    validate_required,
};

const DEFAULT_TIER_COLOR: &str = "#cd7f32";

fn validate_threshold(points: i64) -> Result<(), String> {
    if points < 0 {
        return Err("Points threshold must be zero or more".to_string());
    }
    Ok(())
}

fn validate_reward_status(status: &Option<String>) -> Result<(), String> {
    match status {
        Some(s) => validate_one_of(s, RewardStatus::parse, &RewardStatus::expected()),
        None => Ok(()),
    }
}

fn canonical_reward_status(status: &Option<String>) -> Option<&'static str> {
    status
        .as_deref()
        .and_then(RewardStatus::parse)
        .map(|s| s.as_str())
}

// -------------------------------------------------------------------------
// Tiers
// -------------------------------------------------------------------------

pub async fn list_tiers(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LoyaltyTierResponse>> {
    let tiers = LoyaltyTier::list_all(&state.db).await?;
    ok(tiers.into_iter().map(Into::into).collect())
}

pub async fn get_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<LoyaltyTierResponse> {
    let tier = LoyaltyTier::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Loyalty tier not found"))?;
    ok(tier.into())
}

pub async fn create_tier(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLoyaltyTierRequest>,
) -> Created<LoyaltyTierResponse> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Tier name", 50));
    errors.check("points_threshold", validate_threshold(req.points_threshold));
    if let Some(ref color) = req.color {
        errors.check("color", validate_hex_color(color));
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO loyalty_tiers (id, name, points_threshold, benefits, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(req.points_threshold)
    .bind(to_json_list(&clean_list(req.benefits)))
    .bind(req.color.as_deref().unwrap_or(DEFAULT_TIER_COLOR))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let tier = LoyaltyTier::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::internal("Tier vanished after insert"))?;
    tracing::info!(tier = %tier.name, threshold = tier.points_threshold, "Loyalty tier created");

    created(tier.into())
}

pub async fn update_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoyaltyTierRequest>,
) -> ApiResult<LoyaltyTierResponse> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Tier name", 50));
    }
    if let Some(points) = req.points_threshold {
        errors.check("points_threshold", validate_threshold(points));
    }
    if let Some(ref color) = req.color {
        errors.check("color", validate_hex_color(color));
    }
    errors.finish()?;

    LoyaltyTier::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Loyalty tier not found"))?;

    let benefits = req.benefits.map(|b| to_json_list(&clean_list(b)));
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE loyalty_tiers SET
            name = COALESCE(?, name),
            points_threshold = COALESCE(?, points_threshold),
            benefits = COALESCE(?, benefits),
            color = COALESCE(?, color),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.points_threshold)
    .bind(benefits)
    .bind(&req.color)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let tier = LoyaltyTier::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Loyalty tier not found"))?;
    ok(tier.into())
}

pub async fn delete_tier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM loyalty_tiers WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Loyalty tier not found"));
    }
    deleted(id)
}

// -------------------------------------------------------------------------
// Rewards
// -------------------------------------------------------------------------

pub async fn list_rewards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RewardListQuery>,
) -> ApiResult<Vec<LoyaltyReward>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            RewardStatus::parse(s)
                .ok_or_else(|| {
                    ApiError::validation_field(
                        "status",
                        format!("Must be one of: {}", RewardStatus::expected()),
                    )
                })?
                .as_str(),
        ),
        None => None,
    };

    let rewards = sqlx::query_as::<_, LoyaltyReward>(
        r#"
        SELECT * FROM loyalty_rewards
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR LOWER(category) = LOWER(?))
        ORDER BY points_cost ASC, name ASC
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(&query.category)
    .bind(&query.category)
    .fetch_all(&state.db)
    .await?;

    ok(rewards)
}

pub async fn get_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<LoyaltyReward> {
    let reward = LoyaltyReward::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reward not found"))?;
    ok(reward)
}

pub async fn create_reward(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLoyaltyRewardRequest>,
) -> Created<LoyaltyReward> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Reward name", 100));
    errors.check("category", validate_required(&req.category, "Category", 50));
    errors.check("description", validate_optional_len(&req.description, "Description", 1000));
    errors.check("points_cost", validate_non_negative(req.points_cost as f64, "Points cost"));
    errors.check("status", validate_reward_status(&req.status));
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO loyalty_rewards (id, name, description, points_cost, category, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.points_cost)
    .bind(req.category.trim())
    .bind(canonical_reward_status(&req.status).unwrap_or(RewardStatus::Active.as_str()))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let reward = LoyaltyReward::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::internal("Reward vanished after insert"))?;
    created(reward)
}

pub async fn update_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoyaltyRewardRequest>,
) -> ApiResult<LoyaltyReward> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Reward name", 100));
    }
    if let Some(ref category) = req.category {
        errors.check("category", validate_required(category, "Category", 50));
    }
    if let Some(cost) = req.points_cost {
        errors.check("points_cost", validate_non_negative(cost as f64, "Points cost"));
    }
    errors.check("description", validate_optional_len(&req.description, "Description", 1000));
    errors.check("status", validate_reward_status(&req.status));
    errors.finish()?;

    LoyaltyReward::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reward not found"))?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE loyalty_rewards SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            points_cost = COALESCE(?, points_cost),
            category = COALESCE(?, category),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.points_cost)
    .bind(req.category.as_deref().map(str::trim))
    .bind(canonical_reward_status(&req.status))
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let reward = LoyaltyReward::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reward not found"))?;
    ok(reward)
}

pub async fn delete_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM loyalty_rewards WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Reward not found"));
    }
    deleted(id)
}

// -------------------------------------------------------------------------
// Settings
// -------------------------------------------------------------------------

pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<LoyaltySettings> {
    ok(LoyaltySettings::get(&state.db).await?)
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateLoyaltySettingsRequest>,
) -> ApiResult<LoyaltySettings> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(rate) = req.points_per_currency_unit {
        errors.check("points_per_currency_unit", validate_non_negative(rate, "Points per unit"));
    }
    for (field, value) in [
        ("signup_bonus", req.signup_bonus),
        ("referral_bonus", req.referral_bonus),
        ("points_expiry_months", req.points_expiry_months),
    ] {
        if let Some(v) = value {
            errors.check(field, validate_non_negative(v as f64, field));
        }
    }
    errors.finish()?;

    // Make sure the singleton row exists before updating it
    LoyaltySettings::get(&state.db).await?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE loyalty_settings SET
            points_per_currency_unit = COALESCE(?, points_per_currency_unit),
            signup_bonus = COALESCE(?, signup_bonus),
            referral_bonus = COALESCE(?, referral_bonus),
            points_expiry_months = COALESCE(?, points_expiry_months),
            program_enabled = COALESCE(?, program_enabled),
            updated_at = ?
        WHERE id = 1
        "#,
    )
    .bind(req.points_per_currency_unit)
    .bind(req.signup_bonus)
    .bind(req.referral_bonus)
    .bind(req.points_expiry_months)
    .bind(req.program_enabled)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!("Loyalty settings updated");
    ok(LoyaltySettings::get(&state.db).await?)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_default_tiers_ordered_by_threshold() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/loyalty/tiers", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Bronze", "Silver", "Gold", "Platinum"]);
    }

    #[tokio::test]
    async fn test_tier_validation_and_duplicates() {
        let (app, _dir) = test_app().await;

        let bad = json!({ "name": "Diamond", "points_threshold": -5, "color": "shiny" });
        let (status, body) = send(&app, Method::POST, "/api/loyalty/tiers", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["points_threshold"].is_array());
        assert!(body["error"]["details"]["color"].is_array());

        let dup = json!({ "name": "Gold", "points_threshold": 7000 });
        let (status, _) = send(&app, Method::POST, "/api/loyalty/tiers", Some(dup)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reward_lifecycle() {
        let (app, _dir) = test_app().await;

        let req = json!({
            "name": "Free breakfast",
            "points_cost": 500,
            "category": "Dining"
        });
        let (status, body) = send(&app, Method::POST, "/api/loyalty/rewards", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "Active");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let patch = json!({ "status": "inactive" });
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/loyalty/rewards/{}", id),
            Some(patch),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Inactive");

        let (_, body) = send(&app, Method::GET, "/api/loyalty/rewards?status=Active", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let uri = format!("/api/loyalty/rewards/{}", id);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_partial_update() {
        let (app, _dir) = test_app().await;

        let (_, body) = send(&app, Method::GET, "/api/loyalty/settings", None).await;
        assert_eq!(body["data"]["points_per_currency_unit"], 1.0);
        assert!(body["data"].get("id").is_none());

        let patch = json!({ "points_per_currency_unit": 2.5, "program_enabled": false });
        let (status, body) = send(&app, Method::PUT, "/api/loyalty/settings", Some(patch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["points_per_currency_unit"], 2.5);
        assert_eq!(body["data"]["program_enabled"], false);
        assert_eq!(body["data"]["points_expiry_months"], 12);
    }
}
