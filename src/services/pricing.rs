//! Pricing calculator.
//!
//! All amounts are `rust_decimal::Decimal` with two decimal places; no
//! floating point is involved anywhere on the money path.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BookingError, Result};
use crate::models::{Activity, RoomType, StayRange};

pub const MONEY_SCALE: u32 = 2;

/// Largest amount the `NUMERIC(10,2)` price columns hold.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Normalizes an amount to the stored fixed-point representation.
pub fn to_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `price_per_night × nights`, nights counted as whole calendar days.
pub fn room_total(room_type: &RoomType, stay: &StayRange) -> Result<Decimal> {
    if room_type.price_per_night.is_sign_negative() {
        return Err(BookingError::Storage(format!(
            "room type {} has a negative nightly price",
            room_type.id
        )));
    }
    let nights = Decimal::from(stay.nights());
    let total = room_type
        .price_per_night
        .checked_mul(nights)
        .map(to_money)
        .filter(|total| *total <= MAX_TOTAL)
        .ok_or_else(|| BookingError::validation(format!("stay total exceeds the maximum of {MAX_TOTAL}")))?;
    Ok(total)
}

/// Flat activity fee; participant count and duration do not enter pricing.
pub fn activity_total(activity: &Activity) -> Result<Decimal> {
    if activity.price.is_sign_negative() {
        return Err(BookingError::Storage(format!("activity {} has a negative price", activity.id)));
    }
    Ok(to_money(activity.price))
}
