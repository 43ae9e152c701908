//! Promo code models, redemption bookkeeping and customer history lookups.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use super::common::{nullable, parse_json_list, AmountInput};
use crate::engine::{validity_window, CustomerHistory, DiscountType, PromoRejection, PromoRules, PromoStatus};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoCode {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_value: f64,
    pub valid_from: String,
    pub valid_to: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
    pub usage_count: i64,
    /// JSON list of service types, empty for all
    pub applicable_services: String,
    pub new_customers_only: bool,
    pub min_purchase: Option<f64>,
    pub max_discount_cap: Option<f64>,
    pub per_customer_limit: Option<i64>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoCodeResponse {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_value: f64,
    /// Display form, e.g. `25%` or `50.00`
    pub discount: String,
    pub valid_from: String,
    pub valid_to: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
    pub usage_count: i64,
    pub remaining: Option<i64>,
    pub applicable_services: Vec<String>,
    pub new_customers_only: bool,
    pub min_purchase: Option<f64>,
    pub max_discount_cap: Option<f64>,
    pub per_customer_limit: Option<i64>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PromoCode> for PromoCodeResponse {
    fn from(p: PromoCode) -> Self {
        let discount = match DiscountType::parse(&p.discount_type) {
            Some(DiscountType::Percentage) => format!("{}%", p.discount_value),
            _ => format!("{:.2}", p.discount_value),
        };
        Self {
            remaining: p.capacity.map(|c| (c - p.usage_count).max(0)),
            applicable_services: parse_json_list(&p.applicable_services),
            discount,
            id: p.id,
            code: p.code,
            description: p.description,
            discount_type: p.discount_type,
            discount_value: p.discount_value,
            valid_from: p.valid_from,
            valid_to: p.valid_to,
            start_time: p.start_time,
            end_time: p.end_time,
            capacity: p.capacity,
            usage_count: p.usage_count,
            new_customers_only: p.new_customers_only,
            min_purchase: p.min_purchase,
            max_discount_cap: p.max_discount_cap,
            per_customer_limit: p.per_customer_limit,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Parse a time of day given as `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

impl PromoCode {
    /// Rules for the validator. Fails on a row whose stored fields no longer parse.
    pub fn rules(&self) -> Result<PromoRules, String> {
        let discount_type = DiscountType::parse(&self.discount_type)
            .ok_or_else(|| format!("unknown discount type '{}'", self.discount_type))?;
        let status = PromoStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown status '{}'", self.status))?;
        let from = parse_date(&self.valid_from)
            .ok_or_else(|| format!("invalid valid_from '{}'", self.valid_from))?;
        let to = parse_date(&self.valid_to)
            .ok_or_else(|| format!("invalid valid_to '{}'", self.valid_to))?;
        let start_time = self.start_time.as_deref().and_then(parse_time_of_day);
        let end_time = self.end_time.as_deref().and_then(parse_time_of_day);
        let (valid_from, valid_to) = validity_window(from, start_time, to, end_time);

        Ok(PromoRules {
            discount_type,
            discount_value: self.discount_value,
            valid_from,
            valid_to,
            status,
            capacity: self.capacity,
            usage_count: self.usage_count,
            per_customer_limit: self.per_customer_limit,
            new_customers_only: self.new_customers_only,
            min_purchase: self.min_purchase,
            max_discount_cap: self.max_discount_cap,
            applicable_services: parse_json_list(&self.applicable_services),
        })
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<PromoCode>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM promo_codes WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Codes are stored upper-case; lookups are case-insensitive
    pub async fn find_by_code(db: &SqlitePool, code: &str) -> Result<Option<PromoCode>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM promo_codes WHERE code = ?")
            .bind(code.trim().to_uppercase())
            .fetch_optional(db)
            .await
    }

    /// Redemption count and purchase history for a customer
    pub async fn customer_history(
        db: &SqlitePool,
        promo_id: &str,
        customer_id: &str,
    ) -> Result<CustomerHistory, sqlx::Error> {
        let usage: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM promo_redemptions WHERE promo_code_id = ? AND customer_id = ?",
        )
        .bind(promo_id)
        .bind(customer_id)
        .fetch_one(db)
        .await?;

        let purchases: (i64,) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM bookings WHERE customer_id = ? AND status != 'Cancelled')
                + (SELECT COUNT(*) FROM promo_redemptions WHERE customer_id = ?)
            "#,
        )
        .bind(customer_id)
        .bind(customer_id)
        .fetch_one(db)
        .await?;

        Ok(CustomerHistory {
            code_usage: usage.0,
            has_prior_purchases: purchases.0 > 0,
        })
    }
}

/// A recorded use of a promo code
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoRedemption {
    pub id: String,
    pub promo_code_id: String,
    pub customer_id: Option<String>,
    pub booking_id: Option<String>,
    pub order_amount: f64,
    pub discount: f64,
    pub created_at: String,
}

/// Data for a redemption row
#[derive(Debug, Clone)]
pub struct NewRedemption<'a> {
    pub promo: &'a PromoCode,
    pub customer_id: Option<&'a str>,
    pub booking_id: Option<&'a str>,
    pub order_amount: f64,
    pub discount: f64,
}

impl PromoRedemption {
    /// Consume one use of a code inside `tx`.
    ///
    /// The usage counter is incremented with a conditional update so that two
    /// concurrent redemptions cannot both take the last slot; the per-customer
    /// cap is re-counted after the update, while the write lock is held.
    pub async fn record(
        tx: &mut Transaction<'_, Sqlite>,
        new: NewRedemption<'_>,
    ) -> Result<Result<PromoRedemption, PromoRejection>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let updated = sqlx::query(
            r#"
            UPDATE promo_codes
            SET usage_count = usage_count + 1, updated_at = ?
            WHERE id = ? AND (capacity IS NULL OR usage_count < capacity)
            "#,
        )
        .bind(&now)
        .bind(&new.promo.id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(Err(PromoRejection::CapacityExhausted));
        }

        if let (Some(limit), Some(customer_id)) = (new.promo.per_customer_limit, new.customer_id) {
            let used: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM promo_redemptions WHERE promo_code_id = ? AND customer_id = ?",
            )
            .bind(&new.promo.id)
            .bind(customer_id)
            .fetch_one(&mut **tx)
            .await?;
            if used.0 >= limit {
                return Ok(Err(PromoRejection::CustomerLimitReached));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO promo_redemptions (id, promo_code_id, customer_id, booking_id, order_amount, discount, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.promo.id)
        .bind(new.customer_id)
        .bind(new.booking_id)
        .bind(new.order_amount)
        .bind(new.discount)
        .bind(&now)
        .execute(&mut **tx)
        .await?;

        Ok(Ok(PromoRedemption {
            id,
            promo_code_id: new.promo.id.clone(),
            customer_id: new.customer_id.map(str::to_string),
            booking_id: new.booking_id.map(str::to_string),
            order_amount: new.order_amount,
            discount: new.discount,
            created_at: now,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePromoCodeRequest {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: String,
    /// `25`, `"25%"` or `"50"`
    pub discount: AmountInput,
    pub valid_from: String,
    pub valid_to: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i64>,
    #[serde(default)]
    pub applicable_services: Vec<String>,
    #[serde(default)]
    pub new_customers_only: bool,
    pub min_purchase: Option<AmountInput>,
    pub max_discount_cap: Option<AmountInput>,
    pub per_customer_limit: Option<i64>,
    pub status: Option<String>,
}

/// Partial update; an explicit `null` clears the optional limits
#[derive(Debug, Deserialize)]
pub struct UpdatePromoCodeRequest {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub discount_type: Option<String>,
    pub discount: Option<AmountInput>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub capacity: Option<Option<i64>>,
    pub applicable_services: Option<Vec<String>>,
    pub new_customers_only: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub min_purchase: Option<Option<AmountInput>>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_discount_cap: Option<Option<AmountInput>>,
    #[serde(default, deserialize_with = "nullable")]
    pub per_customer_limit: Option<Option<i64>>,
    pub status: Option<String>,
}

/// Check a code against an order without consuming it
#[derive(Debug, Deserialize)]
pub struct ValidatePromoRequest {
    pub code: String,
    pub order_amount: f64,
    pub customer_id: Option<String>,
    pub service_type: String,
}

/// Consume a code for an order
#[derive(Debug, Deserialize)]
pub struct RedeemPromoRequest {
    pub code: String,
    pub order_amount: f64,
    pub customer_id: Option<String>,
    pub service_type: String,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoValidationResponse {
    pub code: String,
    pub valid: bool,
    pub order_amount: f64,
    pub discount: f64,
    pub final_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
}

impl PromoValidationResponse {
    pub fn rejected(code: &str, order_amount: f64, rejection: &PromoRejection) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            valid: false,
            order_amount,
            discount: 0.0,
            final_amount: order_amount,
            reason: Some(rejection.to_string()),
            reason_code: Some(rejection.code().to_string()),
        }
    }
}
