//! Error handling for the booking engine.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::booking::models::BookingStatus;

/// Caller-visible rejection taxonomy. Only `TransientStore` is worth a
/// retry; everything else reports a definite outcome.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("could not parse timestamp: {0}")]
    InvalidDate(String),

    #[error("check-out must be after check-in")]
    InvalidRange,

    #[error("booking window has already passed")]
    PastBooking,

    #[error("guest count must be at least 1")]
    InvalidGuestCount,

    #[error("property not found")]
    PropertyNotFound,

    #[error("requested dates conflict with an existing booking")]
    DateConflict,

    #[error("property has no usable price configured")]
    PriceNotConfigured,

    #[error("booking is shorter than the {min_hours} hour minimum")]
    MinimumDurationNotMet { min_hours: i32 },

    #[error("caller is not allowed to act on this booking")]
    NotAuthorized,

    #[error("cannot transition booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: String },

    #[error("storage temporarily unavailable: {0}")]
    TransientStore(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl BookingError {
    /// Stable machine-readable tag for the JSON error body.
    pub fn error_type(&self) -> &'static str {
        match self {
            BookingError::InvalidDate(_) => "invalid_date",
            BookingError::InvalidRange => "invalid_range",
            BookingError::PastBooking => "past_booking",
            BookingError::InvalidGuestCount => "invalid_guest_count",
            BookingError::PropertyNotFound => "property_not_found",
            BookingError::DateConflict => "date_conflict",
            BookingError::PriceNotConfigured => "price_not_configured",
            BookingError::MinimumDurationNotMet { .. } => "minimum_duration_not_met",
            BookingError::NotAuthorized => "not_authorized",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::TransientStore(_) => "transient_store_failure",
            BookingError::Database(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidDate(_)
            | BookingError::InvalidRange
            | BookingError::PastBooking
            | BookingError::InvalidGuestCount
            | BookingError::PriceNotConfigured
            | BookingError::MinimumDurationNotMet { .. } => StatusCode::BAD_REQUEST,
            BookingError::PropertyNotFound => StatusCode::NOT_FOUND,
            BookingError::NotAuthorized => StatusCode::FORBIDDEN,
            BookingError::DateConflict | BookingError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            e @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)) => BookingError::TransientStore(e),
            e => BookingError::Database(e),
        }
    }
}

/// JSON error body returned for every rejection.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_type: &'static str,
    pub message: String,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!("store unavailable: {}", self);
        }

        let body = ErrorBody {
            error_type: self.error_type(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
