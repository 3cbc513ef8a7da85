//! Core business logic, independent of Discord and HTTP.
//!
//! Every function takes a `SeaORM` connection and returns [`crate::errors::Result`].
//! The bot and the API are thin layers over these modules.

pub mod events;
pub mod order;
pub mod product;
pub mod report;
pub mod table;
pub mod user;

/// Rounds a currency amount to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
