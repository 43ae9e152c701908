//! Pure pricing logic shared by the API handlers and the booking context.

pub mod pricing;
pub mod promo;

pub use pricing::*;
pub use promo::*;
