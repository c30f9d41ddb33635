//! Booking service functions with database access.
//!
//! The admission pipeline runs validation and pricing up front, then
//! performs the conflict check, counter mutation, and insert inside one
//! transaction holding the property's row lock, so nothing partial is
//! ever persisted and concurrent requests for one property serialize.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::BookingError;

use super::calculators::{self, PriceQuote};
use super::models::{Booking, BookingStatus, NewBooking, Property};
use super::queries;
use super::requests::{CreateBookingRequest, QuoteBookingRequest};

/// Parse an RFC 3339 timestamp from the request body.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BookingError::InvalidDate(raw.to_string()))
}

/// Parse and validate a requested booking window against `now`.
fn parse_window(
    check_in: &str,
    check_out: &str,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let check_in = parse_timestamp(check_in)?;
    let check_out = parse_timestamp(check_out)?;
    if check_out <= check_in {
        return Err(BookingError::InvalidRange);
    }
    if check_out < now {
        return Err(BookingError::PastBooking);
    }
    Ok((check_in, check_out))
}

/// Create a booking: validate, detect conflicts, price, decide admission,
/// and persist, all-or-nothing.
pub async fn create_booking(
    pool: &PgPool,
    cache: &AppCache,
    guest_id: Uuid,
    request: &CreateBookingRequest,
) -> Result<Booking, BookingError> {
    let (check_in, check_out) = parse_window(&request.check_in, &request.check_out, Utc::now())?;
    if request.guests < 1 {
        return Err(BookingError::InvalidGuestCount);
    }

    let mut tx = pool.begin().await?;

    // Row lock on the property serializes admission for this property;
    // everything until commit happens under it.
    let property: Property = queries::get_property_for_update(&mut tx, request.property_id)
        .await?
        .ok_or(BookingError::PropertyNotFound)?
        .into();
    if !property.active {
        return Err(BookingError::PropertyNotFound);
    }

    let conflicts =
        queries::find_overlapping(&mut tx, property.id, check_in, check_out).await?;
    if !conflicts.is_empty() {
        return Err(BookingError::DateConflict);
    }

    let quote = calculators::price_booking(&property.pricing, check_in, check_out, &request.extras)?;
    let admission = calculators::decide_admission(&property.policy);

    let mut status = admission.status;
    if admission.consumes_free_slot {
        // The guarded update is authoritative; if no slot remains the
        // booking falls back to manual review.
        let consumed = queries::increment_approved_count(&mut tx, property.id).await?;
        if !consumed {
            status = BookingStatus::Pending;
        }
    }

    let row = queries::insert_booking(
        &mut tx,
        &NewBooking {
            property_id: property.id,
            guest_id,
            host_id: property.host_id,
            check_in,
            check_out,
            guests: request.guests,
            selected_extras: quote.selected_extras,
            total_price: quote.total_price,
            discount_applied: quote.discount_applied,
            span: quote.span,
            status,
        },
    )
    .await?;

    tx.commit().await?;

    if admission.consumes_free_slot {
        cache.invalidate_property(property.id).await;
    }

    let booking = Booking::from(row);
    tracing::info!(
        booking_id = %booking.id,
        property_id = %booking.property_id,
        status = %booking.status,
        total_price = %booking.total_price,
        "booking created"
    );
    Ok(booking)
}

/// Host decision on a pending booking: confirm or decline.
///
/// Confirming consumes a free-approval slot under the same rule as
/// instant admission, so manual approvals count toward the quota.
pub async fn set_booking_status(
    pool: &PgPool,
    cache: &AppCache,
    host_id: Uuid,
    booking_id: Uuid,
    requested_status: &str,
) -> Result<Booking, BookingError> {
    // Pre-read outside the transaction to learn the property, then lock
    // property before booking (same order as admission).
    let head = queries::get_booking(pool, booking_id)
        .await?
        .ok_or(BookingError::NotAuthorized)?;

    let mut tx = pool.begin().await?;

    let property: Property = queries::get_property_for_update(&mut tx, head.property_id)
        .await?
        .ok_or(BookingError::NotAuthorized)?
        .into();

    let booking = queries::get_booking_for_update(&mut tx, booking_id)
        .await?
        .ok_or(BookingError::NotAuthorized)?;
    if booking.host_id != host_id {
        return Err(BookingError::NotAuthorized);
    }

    let current = BookingStatus::parse(&booking.status).unwrap_or(BookingStatus::Pending);
    if current != BookingStatus::Pending {
        return Err(BookingError::InvalidTransition {
            from: current,
            to: requested_status.to_string(),
        });
    }

    let target = match BookingStatus::parse(requested_status) {
        Some(status @ (BookingStatus::Confirmed | BookingStatus::Declined)) => status,
        _ => {
            return Err(BookingError::InvalidTransition {
                from: current,
                to: requested_status.to_string(),
            })
        }
    };

    let mut consumed = false;
    if target == BookingStatus::Confirmed && property.policy.approve_first_five {
        consumed = queries::increment_approved_count(&mut tx, property.id).await?;
    }

    let row = queries::update_booking_status(&mut tx, booking_id, target).await?;
    tx.commit().await?;

    if consumed {
        cache.invalidate_property(property.id).await;
    }

    let booking = Booking::from(row);
    tracing::info!(
        booking_id = %booking.id,
        status = %booking.status,
        "host decided booking"
    );
    Ok(booking)
}

/// Guest cancellation of a pending or confirmed booking. Never releases
/// a consumed free-approval slot.
pub async fn cancel_booking(
    pool: &PgPool,
    guest_id: Uuid,
    booking_id: Uuid,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_update(&mut tx, booking_id)
        .await?
        .ok_or(BookingError::NotAuthorized)?;
    if booking.guest_id != guest_id {
        return Err(BookingError::NotAuthorized);
    }

    let current = BookingStatus::parse(&booking.status).unwrap_or(BookingStatus::Pending);
    if !matches!(current, BookingStatus::Pending | BookingStatus::Confirmed) {
        return Err(BookingError::InvalidTransition {
            from: current,
            to: BookingStatus::Cancelled.to_string(),
        });
    }

    let row = queries::update_booking_status(&mut tx, booking_id, BookingStatus::Cancelled).await?;
    tx.commit().await?;

    let booking = Booking::from(row);
    tracing::info!(booking_id = %booking.id, "booking cancelled by guest");
    Ok(booking)
}

/// Price preview for a booking window: validation and pricing only, no
/// conflict check and no writes. Reads the property through the cache.
pub async fn quote_booking(
    pool: &PgPool,
    cache: &AppCache,
    request: &QuoteBookingRequest,
) -> Result<PriceQuote, BookingError> {
    let (check_in, check_out) = parse_window(&request.check_in, &request.check_out, Utc::now())?;

    let property = load_property(pool, cache, request.property_id).await?;
    if !property.active {
        return Err(BookingError::PropertyNotFound);
    }

    calculators::price_booking(&property.pricing, check_in, check_out, &request.extras)
}

/// Cache-then-database property lookup for read-only paths.
async fn load_property(
    pool: &PgPool,
    cache: &AppCache,
    id: Uuid,
) -> Result<Arc<Property>, BookingError> {
    if let Some(cached) = cache.properties.get(&id).await {
        tracing::debug!("cache HIT for property: {}", id);
        return Ok(cached);
    }

    tracing::debug!("cache MISS for property: {}", id);
    let property = Arc::new(Property::from(
        queries::get_property(pool, id)
            .await?
            .ok_or(BookingError::PropertyNotFound)?,
    ));
    cache.properties.insert(id, property.clone()).await;
    Ok(property)
}
