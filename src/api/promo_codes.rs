//! Promo code management, validation and redemption.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    clean_list, parse_date, to_json_list, AmountInput, CreatePromoCodeRequest, NewRedemption,
    PromoCode, PromoCodeResponse, PromoRedemption, PromoValidationResponse, RedeemPromoRequest,
    StatusFilter, UpdatePromoCodeRequest, ValidatePromoRequest,
};
use crate::engine::{promo, DiscountOutcome, DiscountType, PromoRejection, PromoStatus, RedemptionContext};
use crate::AppState;

use super::error::{ApiError, ErrorCode, ErrorDetails, ValidationErrorBuilder};
use super::metrics::record_promo_redemption;
use super::response::{created, deleted, ok, ApiResult, Created, Deleted};
use super::validation::{
    validate_non_negative, validate_optional_len, validate_optional_time, validate_promo_code,
};

/// Column values of a fully validated promo code
struct PromoFields {
    code: String,
    description: Option<String>,
    discount_type: DiscountType,
    discount_value: f64,
    valid_from: String,
    valid_to: String,
    start_time: Option<String>,
    end_time: Option<String>,
    capacity: Option<i64>,
    applicable_services: Vec<String>,
    new_customers_only: bool,
    min_purchase: Option<f64>,
    max_discount_cap: Option<f64>,
    per_customer_limit: Option<i64>,
    status: PromoStatus,
}

/// Blank text clears an optional amount
fn optional_amount(
    errors: &mut ValidationErrorBuilder,
    field: &str,
    input: Option<AmountInput>,
) -> Option<f64> {
    match input {
        None => None,
        Some(a) if a.is_blank() => None,
        Some(a) => match a.value() {
            Some(v) => {
                errors.check(field, validate_non_negative(v, field));
                Some(v)
            }
            None => {
                errors.add(field, "Must be a number");
                None
            }
        },
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_fields(req: CreatePromoCodeRequest) -> Result<PromoFields, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("code", validate_promo_code(&req.code));
    errors.check("description", validate_optional_len(&req.description, "Description", 500));

    let discount_type = DiscountType::parse(&req.discount_type);
    if discount_type.is_none() {
        errors.add("discount_type", "Must be one of: Percentage, Fixed");
    }

    let discount_value = req.discount.value();
    match (discount_type, discount_value) {
        (_, None) => {
            errors.add("discount", "Discount must be a number");
        }
        (Some(DiscountType::Percentage), Some(v)) if v <= 0.0 || v > 100.0 => {
            errors.add("discount", "Percentage discount must be between 0 and 100");
        }
        (Some(DiscountType::Fixed), Some(v)) if v <= 0.0 => {
            errors.add("discount", "Fixed discount must be greater than 0");
        }
        _ => {}
    }

    let from = parse_date(&req.valid_from);
    let to = parse_date(&req.valid_to);
    if from.is_none() {
        errors.add("valid_from", "valid_from must be a date in YYYY-MM-DD format");
    }
    if to.is_none() {
        errors.add("valid_to", "valid_to must be a date in YYYY-MM-DD format");
    }
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            errors.add("valid_to", "valid_to must not be before valid_from");
        }
    }

    let start_time = blank_to_none(req.start_time);
    let end_time = blank_to_none(req.end_time);
    errors.check("start_time", validate_optional_time(&start_time, "Start time"));
    errors.check("end_time", validate_optional_time(&end_time, "End time"));

    if matches!(req.capacity, Some(c) if c < 1) {
        errors.add("capacity", "Capacity must be at least 1");
    }
    if matches!(req.per_customer_limit, Some(l) if l < 1) {
        errors.add("per_customer_limit", "Per-customer limit must be at least 1");
    }

    let min_purchase = optional_amount(&mut errors, "min_purchase", req.min_purchase);
    let max_discount_cap = optional_amount(&mut errors, "max_discount_cap", req.max_discount_cap);

    let status = match req.status.as_deref() {
        None => Some(PromoStatus::Active),
        Some(s) => PromoStatus::parse(s),
    };
    if status.is_none() {
        errors.add("status", "Must be one of: Active, Inactive, Expired");
    }

    errors.finish()?;

    // All of these were checked above
    let (Some(discount_type), Some(discount_value), Some(from), Some(to), Some(status)) =
        (discount_type, discount_value, from, to, status)
    else {
        return Err(ApiError::internal("Promo validation inconsistency"));
    };

    Ok(PromoFields {
        code: req.code.trim().to_uppercase(),
        description: req.description,
        discount_type,
        discount_value,
        valid_from: from.format(crate::db::DATE_FORMAT).to_string(),
        valid_to: to.format(crate::db::DATE_FORMAT).to_string(),
        start_time,
        end_time,
        capacity: req.capacity,
        applicable_services: clean_list(req.applicable_services),
        new_customers_only: req.new_customers_only,
        min_purchase,
        max_discount_cap,
        per_customer_limit: req.per_customer_limit,
        status,
    })
}

/// Overlay an update onto the stored code so the result validates as a whole
fn merged_request(existing: &PromoCode, req: UpdatePromoCodeRequest) -> CreatePromoCodeRequest {
    CreatePromoCodeRequest {
        code: req.code.unwrap_or_else(|| existing.code.clone()),
        description: req
            .description
            .unwrap_or_else(|| existing.description.clone()),
        discount_type: req
            .discount_type
            .unwrap_or_else(|| existing.discount_type.clone()),
        discount: req
            .discount
            .unwrap_or(AmountInput::Number(existing.discount_value)),
        valid_from: req.valid_from.unwrap_or_else(|| existing.valid_from.clone()),
        valid_to: req.valid_to.unwrap_or_else(|| existing.valid_to.clone()),
        start_time: req.start_time.unwrap_or_else(|| existing.start_time.clone()),
        end_time: req.end_time.unwrap_or_else(|| existing.end_time.clone()),
        capacity: req.capacity.unwrap_or(existing.capacity),
        applicable_services: req
            .applicable_services
            .unwrap_or_else(|| crate::db::parse_json_list(&existing.applicable_services)),
        new_customers_only: req.new_customers_only.unwrap_or(existing.new_customers_only),
        min_purchase: req
            .min_purchase
            .unwrap_or_else(|| existing.min_purchase.map(AmountInput::Number)),
        max_discount_cap: req
            .max_discount_cap
            .unwrap_or_else(|| existing.max_discount_cap.map(AmountInput::Number)),
        per_customer_limit: req
            .per_customer_limit
            .unwrap_or(existing.per_customer_limit),
        status: Some(req.status.unwrap_or_else(|| existing.status.clone())),
    }
}

pub(crate) fn rejection_error(rejection: &PromoRejection) -> ApiError {
    let mut details = HashMap::new();
    details.insert(
        "reason_code".to_string(),
        serde_json::Value::from(rejection.code()),
    );
    let err = match rejection {
        PromoRejection::NotFound => ApiError::not_found(rejection.to_string()),
        _ => ApiError::conflict(rejection.to_string()),
    };
    err.with_details(ErrorDetails::Generic(details))
}

/// Look up a code and check it against an order.
///
/// The outer error is an infrastructure failure; the inner one is the reason
/// the code does not apply.
pub(crate) async fn check_code(
    db: &SqlitePool,
    code: &str,
    order_amount: f64,
    customer_id: Option<&str>,
    service_type: &str,
) -> Result<Result<(PromoCode, DiscountOutcome), PromoRejection>, ApiError> {
    let Some(promo_code) = PromoCode::find_by_code(db, code).await? else {
        return Ok(Err(PromoRejection::NotFound));
    };

    let rules = promo_code.rules().map_err(|e| {
        tracing::error!(code = %promo_code.code, error = %e, "Stored promo code is malformed");
        ApiError::internal("Promo code is misconfigured")
    })?;

    let customer = match customer_id {
        Some(customer_id) => {
            Some(PromoCode::customer_history(db, &promo_code.id, customer_id).await?)
        }
        None => None,
    };

    let ctx = RedemptionContext {
        order_amount,
        service_type,
        customer,
        now: chrono::Local::now().naive_local(),
    };

    Ok(promo::validate(&rules, &ctx).map(|outcome| (promo_code, outcome)))
}

fn validate_order(code: &str, order_amount: f64, service_type: &str) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if code.trim().is_empty() {
        errors.add("code", "Promo code is required");
    }
    errors.check("order_amount", validate_non_negative(order_amount, "Order amount"));
    if service_type.trim().is_empty() {
        errors.add("service_type", "Service type is required");
    }
    errors.finish()
}

async fn load_code(state: &AppState, id: &str) -> Result<PromoCode, ApiError> {
    PromoCode::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Promo code not found"))
}

fn map_duplicate(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        e if e.code() == ErrorCode::Conflict => {
            ApiError::conflict("A promo code with this code already exists")
        }
        e => e,
    }
}

pub async fn list_promo_codes(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Vec<PromoCodeResponse>> {
    let status = match filter.status.as_deref() {
        Some(s) => Some(
            PromoStatus::parse(s)
                .ok_or_else(|| {
                    ApiError::validation_field("status", "Must be one of: Active, Inactive, Expired")
                })?
                .as_str(),
        ),
        None => None,
    };

    let codes = sqlx::query_as::<_, PromoCode>(
        "SELECT * FROM promo_codes WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC, code ASC",
    )
    .bind(status)
    .bind(status)
    .fetch_all(&state.db)
    .await?;

    ok(codes.into_iter().map(Into::into).collect())
}

pub async fn get_promo_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<PromoCodeResponse> {
    ok(load_code(&state, &id).await?.into())
}

pub async fn create_promo_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePromoCodeRequest>,
) -> Created<PromoCodeResponse> {
    let fields = validate_fields(req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO promo_codes (
            id, code, description, discount_type, discount_value, valid_from, valid_to,
            start_time, end_time, capacity, usage_count, applicable_services,
            new_customers_only, min_purchase, max_discount_cap, per_customer_limit,
            status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&fields.code)
    .bind(&fields.description)
    .bind(fields.discount_type.as_str())
    .bind(fields.discount_value)
    .bind(&fields.valid_from)
    .bind(&fields.valid_to)
    .bind(&fields.start_time)
    .bind(&fields.end_time)
    .bind(fields.capacity)
    .bind(to_json_list(&fields.applicable_services))
    .bind(fields.new_customers_only)
    .bind(fields.min_purchase)
    .bind(fields.max_discount_cap)
    .bind(fields.per_customer_limit)
    .bind(fields.status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(map_duplicate)?;

    tracing::info!(code = %fields.code, "Promo code created");
    created(load_code(&state, &id).await?.into())
}

pub async fn update_promo_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePromoCodeRequest>,
) -> ApiResult<PromoCodeResponse> {
    let existing = load_code(&state, &id).await?;
    let fields = validate_fields(merged_request(&existing, req))?;

    if matches!(fields.capacity, Some(c) if c < existing.usage_count) {
        return Err(ApiError::validation_field(
            "capacity",
            format!(
                "Capacity cannot be below the {} uses already made",
                existing.usage_count
            ),
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE promo_codes SET
            code = ?, description = ?, discount_type = ?, discount_value = ?,
            valid_from = ?, valid_to = ?, start_time = ?, end_time = ?, capacity = ?,
            applicable_services = ?, new_customers_only = ?, min_purchase = ?,
            max_discount_cap = ?, per_customer_limit = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.code)
    .bind(&fields.description)
    .bind(fields.discount_type.as_str())
    .bind(fields.discount_value)
    .bind(&fields.valid_from)
    .bind(&fields.valid_to)
    .bind(&fields.start_time)
    .bind(&fields.end_time)
    .bind(fields.capacity)
    .bind(to_json_list(&fields.applicable_services))
    .bind(fields.new_customers_only)
    .bind(fields.min_purchase)
    .bind(fields.max_discount_cap)
    .bind(fields.per_customer_limit)
    .bind(fields.status.as_str())
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(map_duplicate)?;

    ok(load_code(&state, &id).await?.into())
}

pub async fn delete_promo_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let result = sqlx::query("DELETE FROM promo_codes WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Promo code not found"));
    }
    tracing::info!(promo_id = %id, "Promo code deleted");
    deleted(id)
}

/// Check a code against an order without consuming it.
///
/// A code that does not apply is still a successful request: the response
/// carries `valid: false` and the reason.
pub async fn validate_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidatePromoRequest>,
) -> ApiResult<PromoValidationResponse> {
    validate_order(&req.code, req.order_amount, &req.service_type)?;

    let response = match check_code(
        &state.db,
        &req.code,
        req.order_amount,
        req.customer_id.as_deref(),
        &req.service_type,
    )
    .await?
    {
        Ok((promo_code, outcome)) => PromoValidationResponse {
            code: promo_code.code,
            valid: true,
            order_amount: outcome.order_amount,
            discount: outcome.discount,
            final_amount: outcome.final_amount,
            reason: None,
            reason_code: None,
        },
        Err(rejection) => {
            tracing::debug!(code = %req.code, reason = rejection.code(), "Promo code rejected");
            PromoValidationResponse::rejected(&req.code, req.order_amount, &rejection)
        }
    };

    ok(response)
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub redemption: PromoRedemption,
    pub code: String,
    pub order_amount: f64,
    pub discount: f64,
    pub final_amount: f64,
}

/// Consume one use of a code for an order
pub async fn redeem_promo_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RedeemPromoRequest>,
) -> ApiResult<RedeemResponse> {
    validate_order(&req.code, req.order_amount, &req.service_type)?;

    let (promo_code, outcome) = match check_code(
        &state.db,
        &req.code,
        req.order_amount,
        req.customer_id.as_deref(),
        &req.service_type,
    )
    .await?
    {
        Ok(found) => found,
        Err(rejection) => {
            record_promo_redemption(rejection.code());
            return Err(rejection_error(&rejection));
        }
    };

    let mut tx = state.db.begin().await?;
    let recorded = PromoRedemption::record(
        &mut tx,
        NewRedemption {
            promo: &promo_code,
            customer_id: req.customer_id.as_deref(),
            booking_id: req.booking_id.as_deref(),
            order_amount: outcome.order_amount,
            discount: outcome.discount,
        },
    )
    .await?;

    let redemption = match recorded {
        Ok(redemption) => {
            tx.commit().await?;
            redemption
        }
        Err(rejection) => {
            tx.rollback().await?;
            record_promo_redemption(rejection.code());
            return Err(rejection_error(&rejection));
        }
    };

    record_promo_redemption("redeemed");
    tracing::info!(
        code = %promo_code.code,
        discount = outcome.discount,
        customer = req.customer_id.as_deref().unwrap_or("anonymous"),
        "Promo code redeemed"
    );

    ok(RedeemResponse {
        redemption,
        code: promo_code.code,
        order_amount: outcome.order_amount,
        discount: outcome.discount,
        final_amount: outcome.final_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};

    fn summer25() -> Value {
        json!({
            "code": "summer25",
            "discount_type": "Percentage",
            "discount": "25%",
            "valid_from": "2020-01-01",
            "valid_to": "2099-12-31",
            "min_purchase": 100,
            "max_discount_cap": "$50",
            "applicable_services": ["Rooms", "Spa"]
        })
    }

    async fn create(app: &Router, body: Value) -> Value {
        let (status, body) = send(app, Method::POST, "/api/promo-codes", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_create_normalizes_code_and_amounts() {
        let (app, _dir) = test_app().await;
        let promo = create(&app, summer25()).await;
        assert_eq!(promo["code"], "SUMMER25");
        assert_eq!(promo["discount_value"], 25.0);
        assert_eq!(promo["discount"], "25%");
        assert_eq!(promo["max_discount_cap"], 50.0);
        assert_eq!(promo["status"], "Active");

        let (status, _) = send(&app, Method::POST, "/api/promo-codes", Some(summer25())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fields() {
        let (app, _dir) = test_app().await;
        let bad = json!({
            "code": "X",
            "discount_type": "Percentage",
            "discount": 150,
            "valid_from": "2026-08-01",
            "valid_to": "2026-07-01",
            "start_time": "25:00"
        });
        let (status, body) = send(&app, Method::POST, "/api/promo-codes", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = &body["error"]["details"];
        for field in ["code", "discount", "valid_to", "start_time"] {
            assert!(details[field].is_array(), "missing error for {}", field);
        }
    }

    #[tokio::test]
    async fn test_validate_summer25() {
        let (app, _dir) = test_app().await;
        create(&app, summer25()).await;

        let req = json!({ "code": "Summer25", "order_amount": 300, "service_type": "rooms" });
        let (status, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["valid"], true);
        assert_eq!(body["data"]["discount"], 50.0);
        assert_eq!(body["data"]["final_amount"], 250.0);

        let req = json!({ "code": "SUMMER25", "order_amount": 80, "service_type": "Rooms" });
        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(req)).await;
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(body["data"]["reason_code"], "minimum_purchase");

        let req = json!({ "code": "SUMMER25", "order_amount": 300, "service_type": "Dining" });
        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(req)).await;
        assert_eq!(body["data"]["reason_code"], "service_not_applicable");

        let req = json!({ "code": "NOPE", "order_amount": 300, "service_type": "Rooms" });
        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(req)).await;
        assert_eq!(body["data"]["reason_code"], "not_found");
    }

    #[tokio::test]
    async fn test_expired_window_rejected_even_with_capacity() {
        let (app, _dir) = test_app().await;
        let mut old = summer25();
        old["code"] = json!("SPRING20");
        old["valid_from"] = json!("2020-03-01");
        old["valid_to"] = json!("2020-05-31");
        old["capacity"] = json!(1000);
        create(&app, old).await;

        let req = json!({ "code": "SPRING20", "order_amount": 300, "service_type": "Spa" });
        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(req)).await;
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(body["data"]["reason_code"], "outside_validity");
    }

    #[tokio::test]
    async fn test_redeem_consumes_capacity() {
        let (app, _dir) = test_app().await;
        let mut once = summer25();
        once["code"] = json!("ONCE");
        once["capacity"] = json!(1);
        let promo = create(&app, once).await;

        let req = json!({
            "code": "ONCE",
            "order_amount": 200,
            "service_type": "Spa",
            "customer_id": "guest-1"
        });
        let (status, body) = send(&app, Method::POST, "/api/promo-codes/redeem", Some(req.clone())).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["discount"], 50.0);
        assert_eq!(body["data"]["redemption"]["customer_id"], "guest-1");

        let (status, body) = send(&app, Method::POST, "/api/promo-codes/redeem", Some(req)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["details"]["reason_code"], "capacity_exhausted");

        let uri = format!("/api/promo-codes/{}", promo["id"].as_str().unwrap());
        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(body["data"]["usage_count"], 1);
        assert_eq!(body["data"]["remaining"], 0);
    }

    #[tokio::test]
    async fn test_new_customers_only() {
        let (app, _dir) = test_app().await;
        let mut welcome = summer25();
        welcome["code"] = json!("WELCOME");
        welcome["new_customers_only"] = json!(true);
        create(&app, welcome).await;

        let first = json!({
            "code": "WELCOME", "order_amount": 200, "service_type": "Spa", "customer_id": "c-9"
        });
        let (status, _) = send(&app, Method::POST, "/api/promo-codes/redeem", Some(first.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(first)).await;
        assert_eq!(body["data"]["reason_code"], "new_customers_only");

        let anonymous = json!({ "code": "WELCOME", "order_amount": 200, "service_type": "Spa" });
        let (_, body) = send(&app, Method::POST, "/api/promo-codes/validate", Some(anonymous)).await;
        assert_eq!(body["data"]["reason_code"], "new_customers_only");
    }

    #[tokio::test]
    async fn test_update_merges_and_guards_capacity() {
        let (app, _dir) = test_app().await;
        let mut limited = summer25();
        limited["code"] = json!("LIMITED");
        limited["capacity"] = json!(5);
        let promo = create(&app, limited).await;
        let uri = format!("/api/promo-codes/{}", promo["id"].as_str().unwrap());

        let redeem = json!({ "code": "LIMITED", "order_amount": 200, "service_type": "Rooms" });
        send(&app, Method::POST, "/api/promo-codes/redeem", Some(redeem.clone())).await;
        send(&app, Method::POST, "/api/promo-codes/redeem", Some(redeem)).await;

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "capacity": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let patch = json!({ "status": "inactive", "max_discount_cap": "" });
        let (status, body) = send(&app, Method::PUT, &uri, Some(patch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Inactive");
        assert!(body["data"]["max_discount_cap"].is_null());
        assert_eq!(body["data"]["min_purchase"], 100.0);
        assert_eq!(body["data"]["code"], "LIMITED");

        let (_, body) = send(&app, Method::GET, "/api/promo-codes?status=Active", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_null_clears_limits() {
        let (app, _dir) = test_app().await;
        let mut limited = summer25();
        limited["code"] = json!("WEEKEND");
        limited["description"] = json!("Weekend getaway");
        limited["capacity"] = json!(5);
        limited["per_customer_limit"] = json!(1);
        let promo = create(&app, limited).await;
        let uri = format!("/api/promo-codes/{}", promo["id"].as_str().unwrap());

        let patch = json!({ "capacity": null, "per_customer_limit": null, "min_purchase": null });
        let (status, body) = send(&app, Method::PUT, &uri, Some(patch)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert!(body["data"]["capacity"].is_null());
        assert!(body["data"]["remaining"].is_null());
        assert!(body["data"]["per_customer_limit"].is_null());
        assert!(body["data"]["min_purchase"].is_null());
        // Absent fields keep their stored values
        assert_eq!(body["data"]["description"], "Weekend getaway");
        assert_eq!(body["data"]["max_discount_cap"], 50.0);

        let (_, body) = send(&app, Method::PUT, &uri, Some(json!({ "description": null }))).await;
        assert!(body["data"]["description"].is_null());
        assert!(body["data"]["capacity"].is_null());
    }
}
