//! Booking route handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::error::{BookingError, Result};
use crate::AppState;

use super::models::Booking;
use super::queries;
use super::requests::{CreateBookingRequest, QuoteBookingRequest, UpdateStatusRequest};
use super::responses::{BookingResponse, QuoteResponse};
use super::services;

/// Authenticated caller id, forwarded by the gateway in `x-user-id`.
/// Session issuance itself lives upstream.
pub struct CallerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map(CallerId)
            .ok_or(BookingError::NotAuthorized)
    }
}

/// Booking API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create).get(list_mine))
        .route("/api/bookings/quote", post(quote))
        .route("/api/bookings/host", get(list_host))
        .route("/api/bookings/past", get(list_past))
        .route("/api/bookings/:id/status", put(set_status))
        .route("/api/bookings/:id/cancel", put(cancel))
        .route("/health", get(health))
}

/// POST /api/bookings - create a booking as the calling guest.
async fn create(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let booking = services::create_booking(&state.db, &state.cache, guest_id, &request).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// POST /api/bookings/quote - price a window without booking it.
async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteBookingRequest>,
) -> Result<Json<QuoteResponse>> {
    let priced = services::quote_booking(&state.db, &state.cache, &request).await?;
    Ok(Json(QuoteResponse::from_quote(request.property_id, priced)))
}

/// GET /api/bookings - the calling guest's bookings.
async fn list_mine(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
) -> Result<Json<Vec<BookingResponse>>> {
    let rows = queries::list_for_guest(&state.db, guest_id).await?;
    Ok(Json(to_responses(rows)))
}

/// GET /api/bookings/host - bookings across the calling host's properties.
async fn list_host(
    State(state): State<AppState>,
    CallerId(host_id): CallerId,
) -> Result<Json<Vec<BookingResponse>>> {
    let rows = queries::list_for_host(&state.db, host_id).await?;
    Ok(Json(to_responses(rows)))
}

/// GET /api/bookings/past - the calling guest's past trips.
async fn list_past(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
) -> Result<Json<Vec<BookingResponse>>> {
    let rows = queries::list_past_for_guest(&state.db, guest_id, Utc::now()).await?;
    Ok(Json(to_responses(rows)))
}

/// PUT /api/bookings/:id/status - host confirms or declines.
async fn set_status(
    State(state): State<AppState>,
    CallerId(host_id): CallerId,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>> {
    let booking =
        services::set_booking_status(&state.db, &state.cache, host_id, booking_id, &request.status)
            .await?;
    Ok(Json(booking.into()))
}

/// PUT /api/bookings/:id/cancel - guest cancels their booking.
async fn cancel(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = services::cancel_booking(&state.db, guest_id, booking_id).await?;
    Ok(Json(booking.into()))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

/// GET /health - liveness and cache statistics.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

fn to_responses(rows: Vec<super::models::BookingRow>) -> Vec<BookingResponse> {
    rows.into_iter()
        .map(Booking::from)
        .map(BookingResponse::from)
        .collect()
}
