//! Turning a guest selection into a priced quote.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{BookingKind, Catalog};
use crate::engine::{base_price, nights_between, PriceBreakdown, PricedOption};

/// What a guest wants to book
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub kind: BookingKind,
    pub item_id: String,
    /// Room stays only
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    /// Spa, event and dining bookings
    pub date: Option<NaiveDate>,
    pub guests: Option<u32>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub addons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub kind: BookingKind,
    pub item_id: String,
    pub item_name: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub date: Option<NaiveDate>,
    pub nights: Option<u32>,
    pub guests: u32,
    #[serde(flatten)]
    pub breakdown: PriceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    #[error("Unknown {kind} '{id}'")]
    UnknownItem { kind: BookingKind, id: String },
    #[error("Extra '{0}' is not offered for this item")]
    UnknownExtra(String),
    #[error("Add-on '{0}' is not offered for this booking")]
    UnknownAddon(String),
    #[error("check_in and check_out are required and check_out must be after check_in")]
    InvalidStay,
    #[error("A date is required for {0} bookings")]
    MissingDate(BookingKind),
    #[error("Guests must be between 1 and {max}")]
    GuestsOutOfRange { max: u32 },
    #[error("Booking date cannot be in the past")]
    DateInPast,
}

impl BookingError {
    /// Field the error refers to, for validation responses
    pub fn field(&self) -> &'static str {
        match self {
            BookingError::UnknownItem { .. } => "item_id",
            BookingError::UnknownExtra(_) => "extras",
            BookingError::UnknownAddon(_) => "addons",
            BookingError::InvalidStay => "check_out",
            BookingError::MissingDate(_) | BookingError::DateInPast => "date",
            BookingError::GuestsOutOfRange { .. } => "guests",
        }
    }
}

/// Resolve selected ids against the offered options, ignoring repeats.
fn select<'a, F>(
    ids: &[String],
    lookup: F,
    unknown: fn(String) -> BookingError,
) -> Result<Vec<PricedOption>, BookingError>
where
    F: Fn(&str) -> Option<&'a PricedOption>,
{
    let mut selected: Vec<PricedOption> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if selected.iter().any(|o| o.id == id) {
            continue;
        }
        let option = lookup(id).ok_or_else(|| unknown(id.to_string()))?;
        selected.push(option.clone());
    }
    Ok(selected)
}

impl Catalog {
    /// Price a selection as of `today`.
    pub fn quote(&self, req: &QuoteRequest, today: NaiveDate) -> Result<Quote, BookingError> {
        let item = self
            .item(req.kind, req.item_id.trim())
            .ok_or_else(|| BookingError::UnknownItem {
                kind: req.kind,
                id: req.item_id.clone(),
            })?;

        let guests = req.guests.unwrap_or(1);
        if guests == 0 || guests > item.max_guests {
            return Err(BookingError::GuestsOutOfRange {
                max: item.max_guests,
            });
        }

        let (check_in, check_out, date, nights) = match req.kind {
            BookingKind::Room => {
                let (check_in, check_out) = match (req.check_in, req.check_out) {
                    (Some(i), Some(o)) => (i, o),
                    _ => return Err(BookingError::InvalidStay),
                };
                let nights = nights_between(check_in, check_out).ok_or(BookingError::InvalidStay)?;
                if check_in < today {
                    return Err(BookingError::DateInPast);
                }
                (Some(check_in), Some(check_out), None, Some(nights))
            }
            kind => {
                let date = req.date.ok_or(BookingError::MissingDate(kind))?;
                if date < today {
                    return Err(BookingError::DateInPast);
                }
                (None, None, Some(date), None)
            }
        };

        let extras = select(
            &req.extras,
            |id| item.extras.iter().find(|e| e.id == id),
            BookingError::UnknownExtra,
        )?;
        let addons = select(
            &req.addons,
            |id| self.addon(req.kind, id),
            BookingError::UnknownAddon,
        )?;

        let base = base_price(item.unit_price, item.unit, nights.unwrap_or(1), guests);

        Ok(Quote {
            kind: req.kind,
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            check_in,
            check_out,
            date,
            nights,
            guests,
            breakdown: PriceBreakdown::new(base, extras, addons),
        })
    }
}
