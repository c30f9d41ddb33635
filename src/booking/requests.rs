//! Request DTOs for booking API endpoints.

use serde::Deserialize;
use uuid::Uuid;

/// Request to create a booking.
///
/// Timestamps travel as RFC 3339 strings so an unparseable value surfaces
/// as the engine's own rejection instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub check_in: String,
    pub check_out: String,
    #[serde(default = "default_guests")]
    pub guests: i32,
    #[serde(default)]
    pub extras: Vec<String>,
}

fn default_guests() -> i32 {
    1
}

/// Request to price a booking window without admitting it.
#[derive(Debug, Deserialize)]
pub struct QuoteBookingRequest {
    pub property_id: Uuid,
    pub check_in: String,
    pub check_out: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

/// Host decision on a pending booking.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
