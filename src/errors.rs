//! Unified error type for the restaurant service.
//!
//! Every core operation returns [`Result`]; the bot and the HTTP API decide how a
//! given variant is presented to staff or customers.

use thiserror::Error;

/// Errors produced by business rules, persistence, and the surrounding runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input rejected by a validation rule
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule was violated
        message: String,
    },

    /// A price or amount was negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A quantity was zero or negative
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// No product matches the lookup
    #[error("Product not found: {name}")]
    ProductNotFound {
        /// Name or id used in the lookup
        name: String,
    },

    /// The product is hidden from the menu
    #[error("Product '{name}' is not available")]
    ProductUnavailable {
        /// Product name
        name: String,
    },

    /// Reserving stock would drive it below zero
    #[error("Insufficient stock for '{name}': {available} available, {requested} requested")]
    InsufficientStock {
        /// Product name
        name: String,
        /// Units currently in stock
        available: i64,
        /// Units requested
        requested: i64,
    },

    /// No table matches the lookup
    #[error("Table not found: {table}")]
    TableNotFound {
        /// Table number or id used in the lookup
        table: String,
    },

    /// The table already has an open order or was blocked by hand
    #[error("Table {number} is not available")]
    TableUnavailable {
        /// Table number
        number: i32,
    },

    /// Table numbers are unique
    #[error("Table {number} already exists")]
    DuplicateTable {
        /// Table number
        number: i32,
    },

    /// No order with this id
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Order id
        id: i64,
    },

    /// A status change whose precondition does not hold
    #[error("Order {id}: {message}")]
    InvalidOrderState {
        /// Order id
        id: i64,
        /// The unmet precondition
        message: String,
    },

    /// No staff user matches the lookup
    #[error("User not found: {user}")]
    UserNotFound {
        /// Email, id or chat id used in the lookup
        user: String,
    },

    /// Emails are unique
    #[error("A user with email '{email}' already exists")]
    DuplicateUser {
        /// The conflicting email
        email: String,
    },

    /// The caller is unknown, inactive, or lacks the required role
    #[error("Permission denied: {message}")]
    Forbidden {
        /// Why access was refused
        message: String,
    },

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord client or command framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True when the error comes from a rule or lookup rather than the runtime.
    ///
    /// Surfaces show these to the user verbatim and log the rest.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::Framework(_)
                | Self::Config { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
