//! Core booking calculations.
//!
//! Pure functions for span, price, discount, and admission math - no
//! database access.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::error::BookingError;

use super::models::{
    BookedSpan, BookingPolicy, BookingStatus, DiscountFlags, Extra, PricingConfig, PricingType,
};

const MILLIS_PER_NIGHT: i64 = 86_400_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Auto-approval quota per property.
pub const FIRST_FIVE_LIMIT: i32 = 5;

/// Round a money amount to 2 decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Number of nights covered by an interval: partial nights count as a
/// full night, and a positive interval is never fewer than 1.
pub fn nights_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    let millis = (check_out - check_in).num_milliseconds();
    let nights = (millis + MILLIS_PER_NIGHT - 1) / MILLIS_PER_NIGHT;
    nights.max(1)
}

/// Exact fractional hours covered by an interval, never rounded up.
pub fn hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Decimal {
    let millis = (check_out - check_in).num_milliseconds();
    Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR)
}

/// Half-open interval overlap: [a_in, a_out) and [b_in, b_out) overlap
/// iff a_in < b_out and b_in < a_out. A shared boundary instant is not
/// an overlap.
pub fn spans_overlap(
    a_in: DateTime<Utc>,
    a_out: DateTime<Utc>,
    b_in: DateTime<Utc>,
    b_out: DateTime<Utc>,
) -> bool {
    a_in < b_out && b_in < a_out
}

/// Intersect requested extra names with the configured extras, by exact
/// name match, preserving configured order.
pub fn select_extras(configured: &[Extra], requested: &[String]) -> Vec<Extra> {
    configured
        .iter()
        .filter(|extra| requested.iter().any(|name| name == &extra.name))
        .cloned()
        .collect()
}

/// Combined discount fraction for a nightly stay. Enabled flags stack by
/// summing their percentages.
pub fn discount_fraction(flags: &DiscountFlags, nights: i64) -> Decimal {
    let mut fraction = Decimal::ZERO;
    if flags.new_listing {
        fraction += Decimal::new(20, 2);
    }
    if flags.last_minute && nights == 1 {
        fraction += Decimal::new(1, 2);
    }
    if flags.weekly && nights >= 7 {
        fraction += Decimal::new(10, 2);
    }
    if flags.monthly && nights >= 30 {
        fraction += Decimal::new(20, 2);
    }
    fraction
}

/// Fully priced booking window, before admission.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub span: BookedSpan,
    pub selected_extras: Vec<Extra>,
    pub subtotal: Decimal,
    pub discount_applied: Decimal,
    pub total_price: Decimal,
}

/// Price a validated interval against a property's pricing config.
///
/// Nightly stays bill whole nights and may discount; hourly stays bill
/// the exact fractional duration, enforce the configured minimum, and
/// never discount.
pub fn price_booking(
    pricing: &PricingConfig,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    requested_extras: &[String],
) -> Result<PriceQuote, BookingError> {
    let selected_extras = select_extras(&pricing.extras, requested_extras);
    let extras_total: Decimal = selected_extras.iter().map(|e| e.price).sum();

    match pricing.pricing_type {
        PricingType::Nightly => {
            let nights = nights_between(check_in, check_out);
            let weekday_price = pricing
                .weekday_price
                .filter(|price| *price > Decimal::ZERO)
                .ok_or(BookingError::PriceNotConfigured)?;

            let subtotal = weekday_price * Decimal::from(nights) + extras_total;
            let discount = round_money(subtotal * discount_fraction(&pricing.discounts, nights));
            let total = round_money(subtotal - discount).max(Decimal::ZERO);

            Ok(PriceQuote {
                span: BookedSpan::Nights(nights),
                selected_extras,
                subtotal,
                discount_applied: discount,
                total_price: total,
            })
        }
        PricingType::Hourly => {
            let hours = hours_between(check_in, check_out);
            if hours < Decimal::from(pricing.min_hours) {
                return Err(BookingError::MinimumDurationNotMet {
                    min_hours: pricing.min_hours,
                });
            }
            let hourly_price = pricing
                .hourly_price
                .filter(|price| *price > Decimal::ZERO)
                .ok_or(BookingError::PriceNotConfigured)?;

            let subtotal = hours * hourly_price + extras_total;

            Ok(PriceQuote {
                span: BookedSpan::Hours(hours),
                selected_extras,
                subtotal,
                discount_applied: Decimal::ZERO,
                total_price: round_money(subtotal).max(Decimal::ZERO),
            })
        }
    }
}

/// Outcome of the admission decision for a new booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub status: BookingStatus,
    /// True when confirmation consumes one of the first five free
    /// approvals and the property counter must be incremented with the
    /// insert.
    pub consumes_free_slot: bool,
}

/// Assign the initial status of a booking from the host's policy.
pub fn decide_admission(policy: &BookingPolicy) -> Admission {
    if !policy.instant_book {
        return Admission {
            status: BookingStatus::Pending,
            consumes_free_slot: false,
        };
    }

    if policy.approve_first_five {
        if policy.first_five_approved < FIRST_FIVE_LIMIT {
            Admission {
                status: BookingStatus::Confirmed,
                consumes_free_slot: true,
            }
        } else {
            // Free-approval quota exhausted: back to manual review.
            Admission {
                status: BookingStatus::Pending,
                consumes_free_slot: false,
            }
        }
    } else {
        Admission {
            status: BookingStatus::Confirmed,
            consumes_free_slot: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn nightly(weekday_price: Decimal) -> PricingConfig {
        PricingConfig {
            pricing_type: PricingType::Nightly,
            weekday_price: Some(weekday_price),
            hourly_price: None,
            min_hours: 1,
            discounts: DiscountFlags::default(),
            extras: vec![],
        }
    }

    fn hourly(hourly_price: Decimal, min_hours: i32) -> PricingConfig {
        PricingConfig {
            pricing_type: PricingType::Hourly,
            weekday_price: None,
            hourly_price: Some(hourly_price),
            min_hours,
            discounts: DiscountFlags::default(),
            extras: vec![],
        }
    }

    // ==================== span tests ====================

    #[test]
    fn test_nights_between_whole_days() {
        assert_eq!(
            nights_between(at("2024-06-01T00:00:00Z"), at("2024-06-05T00:00:00Z")),
            4
        );
    }

    #[test]
    fn test_nights_between_partial_night_rounds_up() {
        assert_eq!(
            nights_between(at("2024-06-01T00:00:00Z"), at("2024-06-02T00:00:01Z")),
            2
        );
    }

    #[test]
    fn test_nights_between_sub_day_floors_at_one() {
        assert_eq!(
            nights_between(at("2024-06-01T10:00:00Z"), at("2024-06-01T16:00:00Z")),
            1
        );
    }

    #[test]
    fn test_hours_between_is_fractional() {
        assert_eq!(
            hours_between(at("2024-06-01T10:00:00Z"), at("2024-06-01T11:30:00Z")),
            dec!(1.5)
        );
    }

    // ==================== overlap tests ====================

    #[test]
    fn test_overlapping_intervals() {
        assert!(spans_overlap(
            at("2024-06-01T00:00:00Z"),
            at("2024-06-05T00:00:00Z"),
            at("2024-06-04T00:00:00Z"),
            at("2024-06-06T00:00:00Z"),
        ));
    }

    #[test]
    fn test_shared_boundary_is_not_overlap() {
        assert!(!spans_overlap(
            at("2024-06-01T00:00:00Z"),
            at("2024-06-05T00:00:00Z"),
            at("2024-06-05T00:00:00Z"),
            at("2024-06-07T00:00:00Z"),
        ));
    }

    #[test]
    fn test_contained_interval_overlaps() {
        assert!(spans_overlap(
            at("2024-06-01T00:00:00Z"),
            at("2024-06-10T00:00:00Z"),
            at("2024-06-03T00:00:00Z"),
            at("2024-06-04T00:00:00Z"),
        ));
    }

    // ==================== extras tests ====================

    #[test]
    fn test_select_extras_exact_name_match() {
        let configured = vec![
            Extra {
                name: "Cleaning".to_string(),
                price: dec!(25),
            },
            Extra {
                name: "Parking".to_string(),
                price: dec!(10),
            },
        ];
        let requested = vec!["Parking".to_string(), "Sauna".to_string()];
        let selected = select_extras(&configured, &requested);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Parking");
    }

    #[test]
    fn test_select_extras_is_case_sensitive() {
        let configured = vec![Extra {
            name: "Cleaning".to_string(),
            price: dec!(25),
        }];
        let requested = vec!["cleaning".to_string()];
        assert!(select_extras(&configured, &requested).is_empty());
    }

    // ==================== discount tests ====================

    #[test]
    fn test_discounts_stack() {
        let flags = DiscountFlags {
            new_listing: true,
            weekly: true,
            ..Default::default()
        };
        assert_eq!(discount_fraction(&flags, 7), dec!(0.30));
    }

    #[test]
    fn test_last_minute_only_for_single_night() {
        let flags = DiscountFlags {
            last_minute: true,
            ..Default::default()
        };
        assert_eq!(discount_fraction(&flags, 1), dec!(0.01));
        assert_eq!(discount_fraction(&flags, 2), Decimal::ZERO);
    }

    #[test]
    fn test_weekly_and_monthly_thresholds() {
        let flags = DiscountFlags {
            weekly: true,
            monthly: true,
            ..Default::default()
        };
        assert_eq!(discount_fraction(&flags, 6), Decimal::ZERO);
        assert_eq!(discount_fraction(&flags, 7), dec!(0.10));
        assert_eq!(discount_fraction(&flags, 30), dec!(0.30));
    }

    #[test]
    fn test_disabled_flags_never_discount() {
        assert_eq!(
            discount_fraction(&DiscountFlags::default(), 30),
            Decimal::ZERO
        );
    }

    // ==================== pricing tests ====================

    #[test]
    fn test_nightly_three_nights_at_100() {
        let quote = price_booking(
            &nightly(dec!(100)),
            at("2024-06-01T15:00:00Z"),
            at("2024-06-04T15:00:00Z"),
            &[],
        )
        .unwrap();
        assert_eq!(quote.span, BookedSpan::Nights(3));
        assert_eq!(quote.total_price, dec!(300.00));
        assert_eq!(quote.discount_applied, Decimal::ZERO);
    }

    #[test]
    fn test_nightly_discount_stacking_example() {
        // 7 nights at 100 with weekly + new_listing: 700 - 30% = 490.00
        let mut pricing = nightly(dec!(100));
        pricing.discounts.weekly = true;
        pricing.discounts.new_listing = true;

        let quote = price_booking(
            &pricing,
            at("2024-06-01T00:00:00Z"),
            at("2024-06-08T00:00:00Z"),
            &[],
        )
        .unwrap();
        assert_eq!(quote.subtotal, dec!(700));
        assert_eq!(quote.discount_applied, dec!(210.00));
        assert_eq!(quote.total_price, dec!(490.00));
    }

    #[test]
    fn test_extras_are_added_before_discount() {
        let mut pricing = nightly(dec!(100));
        pricing.discounts.new_listing = true;
        pricing.extras = vec![Extra {
            name: "Cleaning".to_string(),
            price: dec!(50),
        }];

        let quote = price_booking(
            &pricing,
            at("2024-06-01T00:00:00Z"),
            at("2024-06-03T00:00:00Z"),
            &["Cleaning".to_string()],
        )
        .unwrap();
        // (200 + 50) - 20% = 200.00
        assert_eq!(quote.subtotal, dec!(250));
        assert_eq!(quote.discount_applied, dec!(50.00));
        assert_eq!(quote.total_price, dec!(200.00));
        assert_eq!(quote.selected_extras.len(), 1);
    }

    #[test]
    fn test_nightly_requires_positive_weekday_price() {
        let err = price_booking(
            &nightly(dec!(0)),
            at("2024-06-01T00:00:00Z"),
            at("2024-06-03T00:00:00Z"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::PriceNotConfigured));

        let mut pricing = nightly(dec!(100));
        pricing.weekday_price = None;
        let err = price_booking(
            &pricing,
            at("2024-06-01T00:00:00Z"),
            at("2024-06-03T00:00:00Z"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::PriceNotConfigured));
    }

    #[test]
    fn test_hourly_bills_fractional_hours() {
        let quote = price_booking(
            &hourly(dec!(20), 1),
            at("2024-06-01T10:00:00Z"),
            at("2024-06-01T12:30:00Z"),
            &[],
        )
        .unwrap();
        assert_eq!(quote.span, BookedSpan::Hours(dec!(2.5)));
        assert_eq!(quote.total_price, dec!(50.00));
    }

    #[test]
    fn test_hourly_minimum_duration() {
        let err = price_booking(
            &hourly(dec!(20), 2),
            at("2024-06-01T10:00:00Z"),
            at("2024-06-01T11:30:00Z"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BookingError::MinimumDurationNotMet { min_hours: 2 }
        ));
    }

    #[test]
    fn test_hourly_never_discounts() {
        let mut pricing = hourly(dec!(20), 1);
        pricing.discounts = DiscountFlags {
            new_listing: true,
            last_minute: true,
            weekly: true,
            monthly: true,
        };
        let quote = price_booking(
            &pricing,
            at("2024-06-01T10:00:00Z"),
            at("2024-06-01T12:00:00Z"),
            &[],
        )
        .unwrap();
        assert_eq!(quote.discount_applied, Decimal::ZERO);
        assert_eq!(quote.total_price, dec!(40.00));
    }

    #[test]
    fn test_hourly_requires_positive_hourly_price() {
        let err = price_booking(
            &hourly(dec!(0), 1),
            at("2024-06-01T10:00:00Z"),
            at("2024-06-01T12:00:00Z"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::PriceNotConfigured));
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        // Every flag on at 30 nights stacks to 50%; total stays positive.
        let mut pricing = nightly(dec!(10));
        pricing.discounts = DiscountFlags {
            new_listing: true,
            last_minute: true,
            weekly: true,
            monthly: true,
        };
        let quote = price_booking(
            &pricing,
            at("2024-06-01T00:00:00Z"),
            at("2024-07-01T00:00:00Z"),
            &[],
        )
        .unwrap();
        assert_eq!(quote.subtotal, dec!(300));
        assert_eq!(quote.discount_applied, dec!(150.00));
        assert_eq!(quote.total_price, dec!(150.00));
        assert!(quote.discount_applied <= quote.subtotal);
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(489.999)), dec!(490.00));
    }

    // ==================== admission tests ====================

    fn policy(instant_book: bool, approve_first_five: bool, approved: i32) -> BookingPolicy {
        BookingPolicy {
            instant_book,
            approve_first_five,
            first_five_approved: approved,
        }
    }

    #[test]
    fn test_no_instant_book_is_always_pending() {
        for approved in [0, 5] {
            let admission = decide_admission(&policy(false, true, approved));
            assert_eq!(admission.status, BookingStatus::Pending);
            assert!(!admission.consumes_free_slot);
        }
    }

    #[test]
    fn test_instant_book_under_quota_confirms_and_consumes() {
        let admission = decide_admission(&policy(true, true, 4));
        assert_eq!(admission.status, BookingStatus::Confirmed);
        assert!(admission.consumes_free_slot);
    }

    #[test]
    fn test_instant_book_quota_exhausted_falls_back_to_pending() {
        let admission = decide_admission(&policy(true, true, 5));
        assert_eq!(admission.status, BookingStatus::Pending);
        assert!(!admission.consumes_free_slot);
    }

    #[test]
    fn test_instant_book_without_gate_confirms_without_counting() {
        let admission = decide_admission(&policy(true, false, 0));
        assert_eq!(admission.status, BookingStatus::Confirmed);
        assert!(!admission.consumes_free_slot);
    }

    #[test]
    fn test_spans_overlap_matches_chrono_ordering() {
        // Regression guard for the half-open convention used by the
        // conflict query.
        let a_in = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let a_out = Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap();
        assert!(!spans_overlap(a_in, a_out, a_out, a_out + chrono::Duration::days(2)));
        assert!(spans_overlap(a_in, a_out, a_out - chrono::Duration::seconds(1), a_out));
    }
}
