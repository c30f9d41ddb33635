//! Database queries for the booking engine.
//!
//! All queries are runtime-bound; admission-path queries take a
//! `PgConnection` so they run inside the caller's transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::calculators::FIRST_FIVE_LIMIT;
use super::models::{BookingRow, BookingStatus, NewBooking, PropertyRow};

/// Fetch a property without locking (quote path).
pub async fn get_property(pool: &PgPool, id: Uuid) -> Result<Option<PropertyRow>, sqlx::Error> {
    sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT
            id, host_id, title, active,
            pricing_type, weekday_price, hourly_price, min_hours,
            discounts, extras,
            instant_book, approve_first_five, first_five_approved
        FROM properties
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetch a property and take its row lock. Serializes admission per
/// property: the conflict check, counter increment, and insert all happen
/// while this lock is held.
pub async fn get_property_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<PropertyRow>, sqlx::Error> {
    sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT
            id, host_id, title, active,
            pricing_type, weekday_price, hourly_price, min_hours,
            discounts, extras,
            instant_book, approve_first_five, first_five_approved
        FROM properties
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Existing bookings on a property that hold any part of the requested
/// half-open interval at a blocking status.
pub async fn find_overlapping(
    conn: &mut PgConnection,
    property_id: Uuid,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE property_id = $1
          AND status IN ('confirmed', 'pending')
          AND check_in < $3
          AND check_out > $2
        "#,
    )
    .bind(property_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_all(&mut *conn)
    .await
}

/// Insert a fully computed booking and return the stored row.
pub async fn insert_booking(
    conn: &mut PgConnection,
    booking: &NewBooking,
) -> Result<BookingRow, sqlx::Error> {
    let extras =
        serde_json::to_value(&booking.selected_extras).unwrap_or_else(|_| serde_json::json!([]));

    sqlx::query_as::<_, BookingRow>(
        r#"
        INSERT INTO bookings (
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(booking.property_id)
    .bind(booking.guest_id)
    .bind(booking.host_id)
    .bind(booking.check_in)
    .bind(booking.check_out)
    .bind(booking.guests)
    .bind(extras)
    .bind(booking.total_price)
    .bind(booking.discount_applied)
    .bind(booking.span.nights())
    .bind(booking.span.hours())
    .bind(booking.status.as_str())
    .fetch_one(&mut *conn)
    .await
}

/// Consume one free-approval slot if any remain. The guard in the WHERE
/// clause is what keeps the counter at or below the limit under any
/// interleaving; returns whether a slot was actually consumed.
pub async fn increment_approved_count(
    conn: &mut PgConnection,
    property_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE properties
        SET first_five_approved = first_five_approved + 1
        WHERE id = $1
          AND approve_first_five
          AND first_five_approved < $2
        "#,
    )
    .bind(property_id)
    .bind(FIRST_FIVE_LIMIT)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch a booking without locking.
pub async fn get_booking(pool: &PgPool, id: Uuid) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetch a booking and take its row lock for a status transition.
pub async fn get_booking_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Persist a status transition and return the updated row.
pub async fn update_booking_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: BookingStatus,
) -> Result<BookingRow, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        UPDATE bookings
        SET status = $2
        WHERE id = $1
        RETURNING
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_one(&mut *conn)
    .await
}

/// A guest's bookings, newest first.
pub async fn list_for_guest(pool: &PgPool, guest_id: Uuid) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE guest_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(guest_id)
    .fetch_all(pool)
    .await
}

/// A host's bookings across all their properties, newest first.
pub async fn list_for_host(pool: &PgPool, host_id: Uuid) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE host_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(host_id)
    .fetch_all(pool)
    .await
}

/// A guest's past trips, most recent checkout first.
pub async fn list_past_for_guest(
    pool: &PgPool,
    guest_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT
            id, property_id, guest_id, host_id,
            check_in, check_out, guests, extras,
            total_price, discount_applied,
            total_nights, total_hours,
            status, completed, created_at
        FROM bookings
        WHERE guest_id = $1
          AND check_out < $2
        ORDER BY check_out DESC
        "#,
    )
    .bind(guest_id)
    .bind(now)
    .fetch_all(pool)
    .await
}

/// Mark confirmed bookings whose stay has ended. Returns the number of
/// rows swept.
pub async fn mark_completed_bookings(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET completed = TRUE
        WHERE status = 'confirmed'
          AND check_out <= $1
          AND NOT completed
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
