//! Booking price calculation.
//!
//! A booking total is the base price of the booked item plus the price of
//! every selected extra and add-on. No tax, rounding or proration is applied;
//! callers that display amounts format them.

use chrono::NaiveDate;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random part of a confirmation code
const CONFIRMATION_CODE_LEN: usize = 8;

/// A selectable priced option (an item extra or a booking add-on)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedOption {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl PricedOption {
    pub fn new(id: &str, name: &str, price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
        }
    }
}

/// How the unit price of a catalog item scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    PerNight,
    PerPerson,
    Flat,
}

/// `base + Σ extras + Σ addons`
pub fn calculate_total_price(base: f64, extras: &[PricedOption], addons: &[PricedOption]) -> f64 {
    let extras_total: f64 = extras.iter().map(|e| e.price).sum();
    let addons_total: f64 = addons.iter().map(|a| a.price).sum();
    base + extras_total + addons_total
}

/// Base price for a unit price scaled by nights or guests.
pub fn base_price(unit_price: f64, unit: PriceUnit, nights: u32, guests: u32) -> f64 {
    match unit {
        PriceUnit::PerNight => unit_price * nights as f64,
        PriceUnit::PerPerson => unit_price * guests as f64,
        PriceUnit::Flat => unit_price,
    }
}

/// Number of nights between check-in and check-out, `None` unless check-out
/// is strictly after check-in.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> Option<u32> {
    let nights = (check_out - check_in).num_days();
    if nights > 0 {
        u32::try_from(nights).ok()
    } else {
        None
    }
}

/// Itemized price of a booking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub extras: Vec<PricedOption>,
    pub addons: Vec<PricedOption>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

impl PriceBreakdown {
    pub fn new(base_price: f64, extras: Vec<PricedOption>, addons: Vec<PricedOption>) -> Self {
        let subtotal = calculate_total_price(base_price, &extras, &addons);
        Self {
            base_price,
            extras,
            addons,
            subtotal,
            discount: 0.0,
            total: subtotal,
        }
    }

    /// Apply a discount already computed against `subtotal`.
    pub fn with_discount(mut self, discount: f64) -> Self {
        let discount = discount.clamp(0.0, self.subtotal.max(0.0));
        self.discount = discount;
        self.total = self.subtotal - discount;
        self
    }
}

/// Generate a confirmation code such as `RM-7KQ2ZP0A`.
pub fn confirmation_code(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_CODE_LEN)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(prices: &[f64]) -> Vec<PricedOption> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricedOption::new(&format!("opt-{}", i), "Option", *p))
            .collect()
    }

    #[test]
    fn test_total_is_base_plus_extras_plus_addons() {
        let cases: &[(f64, &[f64], &[f64])] = &[
            (0.0, &[], &[]),
            (120.0, &[], &[]),
            (120.0, &[15.0, 30.0], &[]),
            (250.0, &[10.5], &[20.0, 4.5]),
            (99.99, &[0.01], &[0.0, 100.0, 0.5]),
        ];

        for (base, extras, addons) in cases {
            let expected = base + extras.iter().sum::<f64>() + addons.iter().sum::<f64>();
            let total = calculate_total_price(*base, &options(extras), &options(addons));
            assert!(
                (total - expected).abs() < 1e-9,
                "base {} extras {:?} addons {:?}",
                base,
                extras,
                addons
            );
        }
    }

    #[test]
    fn test_base_price_units() {
        assert_eq!(base_price(200.0, PriceUnit::PerNight, 3, 2), 600.0);
        assert_eq!(base_price(45.0, PriceUnit::PerPerson, 3, 4), 180.0);
        assert_eq!(base_price(90.0, PriceUnit::Flat, 3, 4), 90.0);
    }

    #[test]
    fn test_nights_between() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(nights_between(d("2026-07-01"), d("2026-07-04")), Some(3));
        assert_eq!(nights_between(d("2026-07-01"), d("2026-07-01")), None);
        assert_eq!(nights_between(d("2026-07-04"), d("2026-07-01")), None);
    }

    #[test]
    fn test_breakdown_discount_is_clamped() {
        let breakdown = PriceBreakdown::new(100.0, options(&[20.0]), vec![]);
        assert_eq!(breakdown.subtotal, 120.0);

        let discounted = breakdown.clone().with_discount(30.0);
        assert_eq!(discounted.discount, 30.0);
        assert_eq!(discounted.total, 90.0);

        let over = breakdown.with_discount(500.0);
        assert_eq!(over.discount, 120.0);
        assert_eq!(over.total, 0.0);
    }

    #[test]
    fn test_confirmation_code_format() {
        let code = confirmation_code("SPA");
        let (prefix, suffix) = code.split_once('-').unwrap();
        assert_eq!(prefix, "SPA");
        assert_eq!(suffix.len(), CONFIRMATION_CODE_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
