//! Database models split into domain-specific modules.

pub mod booking;
pub mod common;
pub mod content;
pub mod event;
pub mod loyalty;
pub mod meeting_hall;
pub mod promo_code;
pub mod room;
pub mod spa;
pub mod user;

pub use booking::*;
pub use common::*;
pub use content::*;
pub use event::*;
pub use loyalty::*;
pub use meeting_hall::*;
pub use promo_code::*;
pub use room::*;
pub use spa::*;
pub use user::*;
