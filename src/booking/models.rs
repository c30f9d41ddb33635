//! Database models for the booking engine.
//!
//! Row structs use sqlx's FromRow derive for direct database
//! deserialization; domain types are converted out of them so the
//! nights/hours split stays a tagged variant instead of two nullable
//! fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a property is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingType {
    Nightly,
    Hourly,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Nightly => "NIGHTLY",
            PricingType::Hourly => "HOURLY",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NIGHTLY" => Some(PricingType::Nightly),
            "HOURLY" => Some(PricingType::Hourly),
            _ => None,
        }
    }
}

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "declined" => Some(BookingStatus::Declined),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable add-on configured on a property (stored as JSONB).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Independent discount flags a host can enable (stored as JSONB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountFlags {
    pub new_listing: bool,
    pub last_minute: bool,
    pub weekly: bool,
    pub monthly: bool,
}

/// Property from the catalog, as stored.
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub active: bool,
    pub pricing_type: String,
    pub weekday_price: Option<Decimal>,
    pub hourly_price: Option<Decimal>,
    pub min_hours: i32,
    pub discounts: serde_json::Value,
    pub extras: serde_json::Value,
    pub instant_book: bool,
    pub approve_first_five: bool,
    pub first_five_approved: i32,
}

/// Pricing configuration of a property.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub pricing_type: PricingType,
    pub weekday_price: Option<Decimal>,
    pub hourly_price: Option<Decimal>,
    pub min_hours: i32,
    pub discounts: DiscountFlags,
    pub extras: Vec<Extra>,
}

/// Host policy governing admission of new bookings.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub instant_book: bool,
    pub approve_first_five: bool,
    pub first_five_approved: i32,
}

/// Property with its pricing config and booking policy parsed out.
#[derive(Debug, Clone)]
pub struct Property {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub active: bool,
    pub pricing: PricingConfig,
    pub policy: BookingPolicy,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        // Malformed JSONB degrades to empty config rather than failing the
        // request; a property without usable prices is rejected downstream.
        let discounts: DiscountFlags =
            serde_json::from_value(row.discounts).unwrap_or_default();
        let extras: Vec<Extra> = serde_json::from_value(row.extras).unwrap_or_default();

        Property {
            id: row.id,
            host_id: row.host_id,
            title: row.title,
            active: row.active,
            pricing: PricingConfig {
                pricing_type: PricingType::parse(&row.pricing_type)
                    .unwrap_or(PricingType::Nightly),
                weekday_price: row.weekday_price,
                hourly_price: row.hourly_price,
                min_hours: row.min_hours,
                discounts,
                extras,
            },
            policy: BookingPolicy {
                instant_book: row.instant_book,
                approve_first_five: row.approve_first_five,
                first_five_approved: row.first_five_approved,
            },
        }
    }
}

/// Booked duration: nightly bookings count nights, hourly bookings carry
/// the exact fractional hour span. Exactly one applies per booking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BookedSpan {
    Nights(i64),
    Hours(Decimal),
}

impl BookedSpan {
    pub fn nights(&self) -> Option<i64> {
        match self {
            BookedSpan::Nights(n) => Some(*n),
            BookedSpan::Hours(_) => None,
        }
    }

    pub fn hours(&self) -> Option<Decimal> {
        match self {
            BookedSpan::Nights(_) => None,
            BookedSpan::Hours(h) => Some(*h),
        }
    }
}

/// Booking as stored.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub guests: i32,
    pub extras: serde_json::Value,
    pub total_price: Decimal,
    pub discount_applied: Decimal,
    pub total_nights: Option<i64>,
    pub total_hours: Option<Decimal>,
    pub status: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Fully computed booking record.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub guests: i32,
    pub selected_extras: Vec<Extra>,
    pub total_price: Decimal,
    pub discount_applied: Decimal,
    pub span: BookedSpan,
    pub status: BookingStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        let span = match (row.total_nights, row.total_hours) {
            (Some(nights), _) => BookedSpan::Nights(nights),
            (None, Some(hours)) => BookedSpan::Hours(hours),
            // Unreachable for rows written by this engine; the schema
            // enforces exactly one of the two columns.
            (None, None) => BookedSpan::Nights(0),
        };

        Booking {
            id: row.id,
            property_id: row.property_id,
            guest_id: row.guest_id,
            host_id: row.host_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            selected_extras: serde_json::from_value(row.extras).unwrap_or_default(),
            total_price: row.total_price,
            discount_applied: row.discount_applied,
            span,
            status: BookingStatus::parse(&row.status).unwrap_or(BookingStatus::Pending),
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

/// Booking ready to be inserted, produced by the admission pipeline.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub guests: i32,
    pub selected_extras: Vec<Extra>,
    pub total_price: Decimal,
    pub discount_applied: Decimal,
    pub span: BookedSpan,
    pub status: BookingStatus,
}
