//! Response DTOs for booking API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::PriceQuote;
use super::models::{Booking, BookingStatus, Extra};

/// A persisted booking as returned to callers. Exactly one of
/// `total_nights` / `total_hours` is present, matching the pricing model.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub guests: i32,
    pub extras: Vec<Extra>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_applied: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_nights: Option<i64>,
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_hours: Option<Decimal>,
    pub status: BookingStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: booking.id,
            property_id: booking.property_id,
            guest_id: booking.guest_id,
            host_id: booking.host_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            guests: booking.guests,
            extras: booking.selected_extras,
            total_price: booking.total_price,
            discount_applied: booking.discount_applied,
            total_nights: booking.span.nights(),
            total_hours: booking.span.hours(),
            status: booking.status,
            completed: booking.completed,
            created_at: booking.created_at,
        }
    }
}

/// Price preview for a booking window.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub property_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_applied: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_nights: Option<i64>,
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_hours: Option<Decimal>,
    pub extras: Vec<Extra>,
}

impl QuoteResponse {
    pub fn from_quote(property_id: Uuid, quote: PriceQuote) -> Self {
        QuoteResponse {
            property_id,
            subtotal: quote.subtotal,
            discount_applied: quote.discount_applied,
            total_price: quote.total_price,
            total_nights: quote.span.nights(),
            total_hours: quote.span.hours(),
            extras: quote.selected_extras,
        }
    }
}
