//! Spa categories, specialists and services.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    CreateSpaCategoryRequest, CreateSpaServiceRequest, CreateSpaSpecialistRequest, SpaCategory,
    SpaService, SpaServiceDetail, SpaServiceListQuery, SpaSpecialist, UpdateSpaCategoryRequest,
    UpdateSpaServiceRequest, UpdateSpaSpecialistRequest, SPA_SERVICE_DETAIL_SELECT,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_non_negative, validate_optional_len, validate_positive_int, validate_required,
};

// -------------------------------------------------------------------------
// Categories
// -------------------------------------------------------------------------

async fn load_category(state: &AppState, id: &str) -> Result<SpaCategory, ApiError> {
    SpaCategory::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Spa category not found"))
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<SpaCategory>> {
    let categories = sqlx::query_as::<_, SpaCategory>("SELECT * FROM spa_categories ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;
    ok(categories
        .into_iter()
        .map(|c| c.to_response(&state.config.server))
        .collect())
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SpaCategory> {
    ok(load_category(&state, &id).await?.to_response(&state.config.server))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSpaCategoryRequest>,
) -> Created<SpaCategory> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Category name", 100));
    errors.check("description", validate_optional_len(&req.description, "Description", 2000));
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO spa_categories (id, name, description, image_url, service_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(category_id = %id, "Spa category created");
    created(load_category(&state, &id).await?.to_response(&state.config.server))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSpaCategoryRequest>,
) -> ApiResult<SpaCategory> {
    if let Some(ref name) = req.name {
        validate_required(name, "Category name", 100)
            .map_err(|e| ApiError::validation_field("name", e))?;
    }
    load_category(&state, &id).await?;

    sqlx::query(
        r#"
        UPDATE spa_categories SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            image_url = COALESCE(?, image_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&req.image_url)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    ok(load_category(&state, &id).await?.to_response(&state.config.server))
}

/// Categories still holding services cannot be removed
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let category = load_category(&state, &id).await?;
    if category.service_count > 0 {
        return Err(ApiError::conflict(format!(
            "Category '{}' still has {} service(s); move or delete them first",
            category.name, category.service_count
        )));
    }

    // Service writes bump the count first, so a zero count here means no service can land
    let result = sqlx::query("DELETE FROM spa_categories WHERE id = ? AND service_count = 0")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(format!(
            "Category '{}' gained services while being deleted",
            category.name
        )));
    }

    tracing::info!(category_id = %id, "Spa category deleted");
    deleted(id)
}

// -------------------------------------------------------------------------
// Specialists
// -------------------------------------------------------------------------

async fn load_specialist(state: &AppState, id: &str) -> Result<SpaSpecialist, ApiError> {
    SpaSpecialist::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Spa specialist not found"))
}

pub async fn list_specialists(State(state): State<Arc<AppState>>) -> ApiResult<Vec<SpaSpecialist>> {
    let specialists =
        sqlx::query_as::<_, SpaSpecialist>("SELECT * FROM spa_specialists ORDER BY name ASC")
            .fetch_all(&state.db)
            .await?;
    ok(specialists
        .into_iter()
        .map(|s| s.to_response(&state.config.server))
        .collect())
}

pub async fn get_specialist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SpaSpecialist> {
    ok(load_specialist(&state, &id).await?.to_response(&state.config.server))
}

pub async fn create_specialist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSpaSpecialistRequest>,
) -> Created<SpaSpecialist> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Name", 100));
    errors.check("title", validate_optional_len(&req.title, "Title", 100));
    errors.check("bio", validate_optional_len(&req.bio, "Bio", 5000));
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO spa_specialists (id, name, title, bio, image_url, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.title)
    .bind(&req.bio)
    .bind(&req.image_url)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    created(load_specialist(&state, &id).await?.to_response(&state.config.server))
}

pub async fn update_specialist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSpaSpecialistRequest>,
) -> ApiResult<SpaSpecialist> {
    if let Some(ref name) = req.name {
        validate_required(name, "Name", 100).map_err(|e| ApiError::validation_field("name", e))?;
    }
    load_specialist(&state, &id).await?;

    sqlx::query(
        r#"
        UPDATE spa_specialists SET
            name = COALESCE(?, name),
            title = COALESCE(?, title),
            bio = COALESCE(?, bio),
            image_url = COALESCE(?, image_url),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.title)
    .bind(&req.bio)
    .bind(&req.image_url)
    .bind(req.is_active)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    ok(load_specialist(&state, &id).await?.to_response(&state.config.server))
}

/// Services keep their row; the specialist reference is cleared
pub async fn delete_specialist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE spa_services SET specialist_id = NULL WHERE specialist_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM spa_specialists WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::not_found("Spa specialist not found"));
    }
    tx.commit().await?;
    deleted(id)
}

// -------------------------------------------------------------------------
// Services
// -------------------------------------------------------------------------

async fn load_service_detail(state: &AppState, id: &str) -> Result<SpaServiceDetail, ApiError> {
    SpaService::find_detail(&state.db, id)
        .await?
        .map(|s| s.to_response(&state.config.server))
        .ok_or_else(|| ApiError::not_found("Spa service not found"))
}

fn category_gone() -> ApiError {
    ApiError::validation_field("category_id", "Spa category not found")
}

async fn ensure_references(
    state: &AppState,
    category_id: Option<&str>,
    specialist_id: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(category_id) = category_id {
        if SpaCategory::find(&state.db, category_id).await?.is_none() {
            return Err(category_gone());
        }
    }
    if let Some(specialist_id) = specialist_id {
        if SpaSpecialist::find(&state.db, specialist_id).await?.is_none() {
            return Err(ApiError::validation_field("specialist_id", "Spa specialist not found"));
        }
    }
    Ok(())
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SpaServiceListQuery>,
) -> ApiResult<Vec<SpaServiceDetail>> {
    let sql = format!(
        r#"{}
        WHERE (? IS NULL OR s.category_id = ?)
          AND (? IS NULL OR s.specialist_id = ?)
          AND (? IS NULL OR s.is_active = ?)
        ORDER BY s.name ASC"#,
        SPA_SERVICE_DETAIL_SELECT
    );
    let services = sqlx::query_as::<_, SpaServiceDetail>(&sql)
        .bind(&query.category_id)
        .bind(&query.category_id)
        .bind(&query.specialist_id)
        .bind(&query.specialist_id)
        .bind(query.active)
        .bind(query.active)
        .fetch_all(&state.db)
        .await?;

    ok(services
        .into_iter()
        .map(|s| s.to_response(&state.config.server))
        .collect())
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SpaServiceDetail> {
    ok(load_service_detail(&state, &id).await?)
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSpaServiceRequest>,
) -> Created<SpaServiceDetail> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&req.name, "Service name", 100));
    errors.check("description", validate_optional_len(&req.description, "Description", 2000));
    errors.check("duration_minutes", validate_positive_int(req.duration_minutes, "Duration"));
    errors.check("price", validate_non_negative(req.price, "Price"));
    errors.finish()?;

    ensure_references(&state, Some(&req.category_id), req.specialist_id.as_deref()).await?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;
    if !SpaCategory::adjust_service_count(&mut tx, &req.category_id, 1).await? {
        tx.rollback().await?;
        return Err(category_gone());
    }
    sqlx::query(
        r#"
        INSERT INTO spa_services (id, name, description, category_id, specialist_id, duration_minutes,
                                  price, image_url, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(&req.category_id)
    .bind(&req.specialist_id)
    .bind(req.duration_minutes)
    .bind(req.price)
    .bind(&req.image_url)
    .bind(req.is_active.unwrap_or(true))
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(service_id = %id, category_id = %req.category_id, "Spa service created");
    created(load_service_detail(&state, &id).await?)
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSpaServiceRequest>,
) -> ApiResult<SpaServiceDetail> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_required(name, "Service name", 100));
    }
    if let Some(duration) = req.duration_minutes {
        errors.check("duration_minutes", validate_positive_int(duration, "Duration"));
    }
    if let Some(price) = req.price {
        errors.check("price", validate_non_negative(price, "Price"));
    }
    errors.finish()?;

    let existing = SpaService::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Spa service not found"))?;
    ensure_references(&state, req.category_id.as_deref(), req.specialist_id.as_deref()).await?;

    let moved_to = req
        .category_id
        .as_deref()
        .filter(|c| *c != existing.category_id);

    let mut tx = state.db.begin().await?;
    if let Some(new_category) = moved_to {
        if !SpaCategory::adjust_service_count(&mut tx, new_category, 1).await? {
            tx.rollback().await?;
            return Err(category_gone());
        }
        SpaCategory::adjust_service_count(&mut tx, &existing.category_id, -1).await?;
    }
    sqlx::query(
        r#"
        UPDATE spa_services SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            category_id = COALESCE(?, category_id),
            specialist_id = COALESCE(?, specialist_id),
            duration_minutes = COALESCE(?, duration_minutes),
            price = COALESCE(?, price),
            image_url = COALESCE(?, image_url),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&req.category_id)
    .bind(&req.specialist_id)
    .bind(req.duration_minutes)
    .bind(req.price)
    .bind(&req.image_url)
    .bind(req.is_active)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    ok(load_service_detail(&state, &id).await?)
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let existing = SpaService::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Spa service not found"))?;

    let mut tx = state.db.begin().await?;
    let result = sqlx::query("DELETE FROM spa_services WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::not_found("Spa service not found"));
    }
    SpaCategory::adjust_service_count(&mut tx, &existing.category_id, -1).await?;
    tx.commit().await?;

    tracing::info!(service_id = %id, "Spa service deleted");
    deleted(id)
}
