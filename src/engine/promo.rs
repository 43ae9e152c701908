//! Promo code validation and discount calculation.
//!
//! Validation is a pure function of the code's rules, the order being
//! priced and the current local time. Checks run in a fixed order and the
//! first failing check is reported.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "Percentage",
            DiscountType::Fixed => "Fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Some(DiscountType::Percentage),
            "fixed" | "amount" => Some(DiscountType::Fixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromoStatus {
    Active,
    Inactive,
    Expired,
}

impl PromoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoStatus::Active => "Active",
            PromoStatus::Inactive => "Inactive",
            PromoStatus::Expired => "Expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(PromoStatus::Active),
            "inactive" => Some(PromoStatus::Inactive),
            "expired" => Some(PromoStatus::Expired),
            _ => None,
        }
    }
}

/// The rules a promo code is checked against
#[derive(Debug, Clone, PartialEq)]
pub struct PromoRules {
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
    pub status: PromoStatus,
    pub capacity: Option<i64>,
    pub usage_count: i64,
    pub per_customer_limit: Option<i64>,
    pub new_customers_only: bool,
    pub min_purchase: Option<f64>,
    pub max_discount_cap: Option<f64>,
    /// Empty means every service
    pub applicable_services: Vec<String>,
}

/// What is known about the order a code is applied to
#[derive(Debug, Clone)]
pub struct RedemptionContext<'a> {
    pub order_amount: f64,
    pub service_type: &'a str,
    /// Present when the customer is known
    pub customer: Option<CustomerHistory>,
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerHistory {
    /// Times this customer already redeemed the code
    pub code_usage: i64,
    pub has_prior_purchases: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromoRejection {
    #[error("Promo code not found")]
    NotFound,
    #[error("Promo code is not valid at this time")]
    OutsideValidity,
    #[error("Promo code is not active")]
    Inactive,
    #[error("Promo code has reached its usage limit")]
    CapacityExhausted,
    #[error("Promo code usage limit reached for this customer")]
    CustomerLimitReached,
    #[error("Promo code is only available to new customers")]
    NewCustomersOnly,
    #[error("A minimum purchase of {minimum:.2} is required")]
    MinimumPurchase { minimum: f64 },
    #[error("Promo code does not apply to {service}")]
    ServiceNotApplicable { service: String },
}

impl PromoRejection {
    /// Stable machine-readable reason
    pub fn code(&self) -> &'static str {
        match self {
            PromoRejection::NotFound => "not_found",
            PromoRejection::OutsideValidity => "outside_validity",
            PromoRejection::Inactive => "inactive",
            PromoRejection::CapacityExhausted => "capacity_exhausted",
            PromoRejection::CustomerLimitReached => "customer_limit_reached",
            PromoRejection::NewCustomersOnly => "new_customers_only",
            PromoRejection::MinimumPurchase { .. } => "minimum_purchase",
            PromoRejection::ServiceNotApplicable { .. } => "service_not_applicable",
        }
    }
}

/// Discount granted for an order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountOutcome {
    pub order_amount: f64,
    pub discount: f64,
    pub final_amount: f64,
}

/// Check a code against an order and compute its discount.
pub fn validate(rules: &PromoRules, ctx: &RedemptionContext<'_>) -> Result<DiscountOutcome, PromoRejection> {
    if ctx.now < rules.valid_from || ctx.now > rules.valid_to {
        return Err(PromoRejection::OutsideValidity);
    }

    if rules.status != PromoStatus::Active {
        return Err(PromoRejection::Inactive);
    }

    if let Some(capacity) = rules.capacity {
        if rules.usage_count >= capacity {
            return Err(PromoRejection::CapacityExhausted);
        }
    }

    if let (Some(limit), Some(customer)) = (rules.per_customer_limit, ctx.customer.as_ref()) {
        if customer.code_usage >= limit {
            return Err(PromoRejection::CustomerLimitReached);
        }
    }

    if rules.new_customers_only {
        // An anonymous order cannot prove it comes from a new customer
        let is_new = ctx
            .customer
            .as_ref()
            .map(|c| !c.has_prior_purchases)
            .unwrap_or(false);
        if !is_new {
            return Err(PromoRejection::NewCustomersOnly);
        }
    }

    if let Some(minimum) = rules.min_purchase {
        if ctx.order_amount < minimum {
            return Err(PromoRejection::MinimumPurchase { minimum });
        }
    }

    if !service_applies(&rules.applicable_services, ctx.service_type) {
        return Err(PromoRejection::ServiceNotApplicable {
            service: ctx.service_type.to_string(),
        });
    }

    let discount = discount_amount(
        rules.discount_type,
        rules.discount_value,
        ctx.order_amount,
        rules.max_discount_cap,
    );

    Ok(DiscountOutcome {
        order_amount: ctx.order_amount,
        discount,
        final_amount: ctx.order_amount - discount,
    })
}

/// Discount for an amount: the rate-derived value, capped, never above the amount.
pub fn discount_amount(discount_type: DiscountType, value: f64, amount: f64, cap: Option<f64>) -> f64 {
    let raw = match discount_type {
        DiscountType::Percentage => amount * (value / 100.0),
        DiscountType::Fixed => value,
    };
    let capped = match cap {
        Some(cap) => raw.min(cap),
        None => raw,
    };
    capped.clamp(0.0, amount.max(0.0))
}

fn service_applies(services: &[String], service_type: &str) -> bool {
    services.is_empty()
        || services.iter().any(|s| {
            s.eq_ignore_ascii_case("all") || s.trim().eq_ignore_ascii_case(service_type.trim())
        })
}

/// Combine validity dates with optional time-of-day bounds.
///
/// A missing start time means the start of `from`, a missing end time the
/// last second of `to`.
pub fn validity_window(
    from: NaiveDate,
    start_time: Option<NaiveTime>,
    to: NaiveDate,
    end_time: Option<NaiveTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    let start = start_time.unwrap_or(NaiveTime::MIN);
    let end = end_time.unwrap_or_else(|| NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
    (from.and_time(start), to.and_time(end))
}

/// Parse a loosely formatted amount such as `"25%"`, `"$50"` or `"1,200.50"`.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '%' | '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn summer25() -> PromoRules {
        let (valid_from, valid_to) = validity_window(date("2026-06-01"), None, date("2026-08-31"), None);
        PromoRules {
            discount_type: DiscountType::Percentage,
            discount_value: 25.0,
            valid_from,
            valid_to,
            status: PromoStatus::Active,
            capacity: Some(100),
            usage_count: 0,
            per_customer_limit: Some(1),
            new_customers_only: false,
            min_purchase: Some(100.0),
            max_discount_cap: Some(50.0),
            applicable_services: vec![],
        }
    }

    fn order(amount: f64, now: &str) -> RedemptionContext<'static> {
        RedemptionContext {
            order_amount: amount,
            service_type: "Rooms",
            customer: Some(CustomerHistory::default()),
            now: at(now),
        }
    }

    #[test]
    fn test_summer25_is_capped() {
        let outcome = validate(&summer25(), &order(300.0, "2026-07-15 12:00:00")).unwrap();
        assert_eq!(outcome.discount, 50.0);
        assert_eq!(outcome.final_amount, 250.0);
    }

    #[test]
    fn test_percentage_discount_with_and_without_cap() {
        for amount in [0.0, 40.0, 150.0, 199.99, 1000.0] {
            let uncapped = discount_amount(DiscountType::Percentage, 25.0, amount, None);
            assert!((uncapped - amount * 0.25).abs() < 1e-9);

            let capped = discount_amount(DiscountType::Percentage, 25.0, amount, Some(50.0));
            assert!((capped - (amount * 0.25).min(50.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fixed_discount_never_exceeds_amount() {
        assert_eq!(discount_amount(DiscountType::Fixed, 30.0, 100.0, None), 30.0);
        assert_eq!(discount_amount(DiscountType::Fixed, 30.0, 20.0, None), 20.0);
        assert_eq!(discount_amount(DiscountType::Fixed, 30.0, 100.0, Some(10.0)), 10.0);
    }

    #[test]
    fn test_outside_window_rejected_regardless_of_capacity() {
        let mut rules = summer25();
        rules.capacity = None;

        for now in ["2026-05-31 23:59:59", "2026-09-01 00:00:00", "2027-07-15 12:00:00"] {
            assert_eq!(
                validate(&rules, &order(300.0, now)),
                Err(PromoRejection::OutsideValidity),
                "{}",
                now
            );
        }

        assert!(validate(&rules, &order(300.0, "2026-06-01 00:00:00")).is_ok());
        assert!(validate(&rules, &order(300.0, "2026-08-31 23:59:59")).is_ok());
    }

    #[test]
    fn test_time_of_day_bounds() {
        let mut rules = summer25();
        let (from, to) = validity_window(
            date("2026-07-01"),
            NaiveTime::from_hms_opt(9, 0, 0),
            date("2026-07-01"),
            NaiveTime::from_hms_opt(17, 30, 0),
        );
        rules.valid_from = from;
        rules.valid_to = to;

        assert!(validate(&rules, &order(300.0, "2026-07-01 08:59:59")).is_err());
        assert!(validate(&rules, &order(300.0, "2026-07-01 09:00:00")).is_ok());
        assert!(validate(&rules, &order(300.0, "2026-07-01 17:30:01")).is_err());
    }

    #[test]
    fn test_checks_run_in_order() {
        // Inactive and exhausted: status is reported first
        let mut rules = summer25();
        rules.status = PromoStatus::Inactive;
        rules.usage_count = 100;
        assert_eq!(
            validate(&rules, &order(300.0, "2026-07-15 12:00:00")),
            Err(PromoRejection::Inactive)
        );

        rules.status = PromoStatus::Active;
        assert_eq!(
            validate(&rules, &order(300.0, "2026-07-15 12:00:00")),
            Err(PromoRejection::CapacityExhausted)
        );
    }

    #[test]
    fn test_per_customer_limit() {
        let rules = summer25();
        let mut ctx = order(300.0, "2026-07-15 12:00:00");
        ctx.customer = Some(CustomerHistory {
            code_usage: 1,
            has_prior_purchases: true,
        });
        assert_eq!(validate(&rules, &ctx), Err(PromoRejection::CustomerLimitReached));

        ctx.customer = None;
        assert!(validate(&rules, &ctx).is_ok());
    }

    #[test]
    fn test_new_customers_only() {
        let mut rules = summer25();
        rules.new_customers_only = true;
        let mut ctx = order(300.0, "2026-07-15 12:00:00");

        ctx.customer = Some(CustomerHistory {
            code_usage: 0,
            has_prior_purchases: true,
        });
        assert_eq!(validate(&rules, &ctx), Err(PromoRejection::NewCustomersOnly));

        ctx.customer = None;
        assert_eq!(validate(&rules, &ctx), Err(PromoRejection::NewCustomersOnly));

        ctx.customer = Some(CustomerHistory::default());
        assert!(validate(&rules, &ctx).is_ok());
    }

    #[test]
    fn test_minimum_purchase() {
        let result = validate(&summer25(), &order(99.0, "2026-07-15 12:00:00"));
        assert_eq!(result, Err(PromoRejection::MinimumPurchase { minimum: 100.0 }));
        assert_eq!(result.unwrap_err().code(), "minimum_purchase");
    }

    #[test]
    fn test_service_applicability() {
        let mut rules = summer25();
        rules.applicable_services = vec!["Spa".to_string(), "Dining".to_string()];
        let mut ctx = order(300.0, "2026-07-15 12:00:00");

        assert!(matches!(
            validate(&rules, &ctx),
            Err(PromoRejection::ServiceNotApplicable { .. })
        ));

        ctx.service_type = "spa";
        assert!(validate(&rules, &ctx).is_ok());

        rules.applicable_services = vec!["All".to_string()];
        ctx.service_type = "Events";
        assert!(validate(&rules, &ctx).is_ok());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("25%"), Some(25.0));
        assert_eq!(parse_amount(" 100 "), Some(100.0));
        assert_eq!(parse_amount("$1,200.50"), Some(1200.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("ten"), None);
    }

    #[test]
    fn test_discount_type_parse() {
        assert_eq!(DiscountType::parse("Percentage"), Some(DiscountType::Percentage));
        assert_eq!(DiscountType::parse("fixed"), Some(DiscountType::Fixed));
        assert_eq!(DiscountType::parse("bogus"), None);
    }
}
