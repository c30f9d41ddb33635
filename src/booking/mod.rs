//! Booking pricing & admission engine.
//!
//! Validates booking requests, detects date conflicts, computes prices
//! under the nightly/hourly models, and decides whether a new booking is
//! auto-confirmed or held for host review.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{decide_admission, price_booking, round_money, Admission, PriceQuote};
pub use models::{Booking, BookingStatus, PricingType};
pub use routes::router;
