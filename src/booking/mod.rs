//! Guest booking context: the bookable catalog and quoting against it.

mod catalog;
mod quote;

pub use catalog::{Addon, BookingKind, Catalog, CatalogItem};
pub use quote::{BookingError, Quote, QuoteRequest};
