//! HTTP rendering of [`Error`].
//!
//! Every error becomes `{"error": {"code": ..., "message": ...}}`. Runtime
//! failures are logged and replaced with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// Status code and stable machine-readable code for this error.
    #[must_use]
    pub const fn http_status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
            Self::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "invalid_amount"),
            Self::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, "invalid_quantity"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            Self::ProductNotFound { .. } => (StatusCode::NOT_FOUND, "product_not_found"),
            Self::TableNotFound { .. } => (StatusCode::NOT_FOUND, "table_not_found"),
            Self::OrderNotFound { .. } => (StatusCode::NOT_FOUND, "order_not_found"),
            Self::UserNotFound { .. } => (StatusCode::NOT_FOUND, "user_not_found"),
            Self::ProductUnavailable { .. } => (StatusCode::CONFLICT, "product_unavailable"),
            Self::InsufficientStock { .. } => (StatusCode::CONFLICT, "insufficient_stock"),
            Self::TableUnavailable { .. } => (StatusCode::CONFLICT, "table_unavailable"),
            Self::DuplicateTable { .. } => (StatusCode::CONFLICT, "duplicate_table"),
            Self::DuplicateUser { .. } => (StatusCode::CONFLICT, "duplicate_user"),
            Self::InvalidOrderState { .. } => (StatusCode::CONFLICT, "invalid_order_state"),
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Framework(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.http_status();
        let message = if self.is_user_facing() {
            self.to_string()
        } else {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        };

        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_conflict_status() {
        let response = Error::InsufficientStock {
            name: "Tacos".to_string(),
            available: 1,
            requested: 3,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_runtime_errors_are_internal() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk full".to_string()));
        assert_eq!(err.http_status(), (StatusCode::INTERNAL_SERVER_ERROR, "internal"));
        assert!(!err.is_user_facing());

        let forbidden = Error::Forbidden {
            message: "nope".to_string(),
        };
        assert_eq!(forbidden.http_status().0, StatusCode::FORBIDDEN);
    }
}
