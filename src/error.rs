use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart line for item {item_id} has no variant")]
    MissingVariant { item_id: i64 },

    #[error("Variant {0} not found")]
    VariantNotFound(i64),

    #[error("Variant {variant_id} does not belong to item {item_id}")]
    VariantItemMismatch { variant_id: i64, item_id: i64 },

    #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("Order amount must be greater than zero")]
    InvalidAmount,

    #[error("Unsupported currency {0}")]
    InvalidCurrency(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Store, gateway and programming failures; everything else is caller-actionable.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Gateway(_) | AppError::Internal(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::EmptyCart
            | AppError::MissingVariant { .. }
            | AppError::VariantNotFound(_)
            | AppError::VariantItemMismatch { .. }
            | AppError::InsufficientStock { .. }
            | AppError::InvalidAmount
            | AppError::InvalidCurrency(_)
            | AppError::InvalidSignature
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Gateway(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_unexpected() {
            tracing::error!(error = ?self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
