use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::error::{BookingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Reservations in these states occupy their room or slot.
    pub fn holds_inventory(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// pending -> confirmed | cancelled, confirmed -> completed | cancelled.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open stay `[check_in, check_out)`; check-out is always after check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(BookingError::validation(format!(
                "check-out ({check_out}) must be after check-in ({check_in})"
            )));
        }
        Ok(Self { check_in, check_out })
    }

    /// Same as [`StayRange::new`], reporting missing dates as validation errors.
    pub fn from_parts(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> Result<Self> {
        match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => Self::new(check_in, check_out),
            (None, _) => Err(BookingError::validation("check-in date is required")),
            (_, None) => Err(BookingError::validation("check-out date is required")),
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// The two mutually exclusive reservation modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Booking {
    Room {
        room_id: i64,
        stay: StayRange,
        guests_count: i32,
    },
    Activity {
        activity_id: i64,
        schedule_id: i64,
    },
}

impl Booking {
    /// True when this is a room booking for `room_id` whose stay overlaps `stay`.
    pub fn occupies(&self, room_id: i64, stay: &StayRange) -> bool {
        match self {
            Booking::Room { room_id: id, stay: own, .. } => *id == room_id && own.overlaps(stay),
            Booking::Activity { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub guest: GuestContact,
    pub booking: Booking,
    pub status: ReservationStatus,
    pub total_price: Decimal,
    pub special_requests: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated reservation ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub guest: GuestContact,
    pub booking: Booking,
    pub status: ReservationStatus,
    pub total_price: Decimal,
    pub special_requests: String,
}

impl NewReservation {
    pub fn into_reservation(self, id: i64, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id,
            guest: self.guest,
            booking: self.booking,
            status: self.status,
            total_price: self.total_price,
            special_requests: self.special_requests,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Flat `reservations` row; mode columns are nullable in storage.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationRow {
    pub id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub room_id: Option<i64>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests_count: i32,
    pub activity_id: Option<i64>,
    pub schedule_id: Option<i64>,
    pub status: ReservationStatus,
    pub total_price: Decimal,
    pub special_requests: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = BookingError;

    fn try_from(row: ReservationRow) -> Result<Self> {
        let booking = match (row.room_id, row.check_in, row.check_out, row.activity_id, row.schedule_id) {
            (Some(room_id), Some(check_in), Some(check_out), None, None) => Booking::Room {
                room_id,
                stay: StayRange::new(check_in, check_out)
                    .map_err(|e| BookingError::Storage(format!("reservation {}: {e}", row.id)))?,
                guests_count: row.guests_count,
            },
            (None, None, None, Some(activity_id), Some(schedule_id)) => Booking::Activity {
                activity_id,
                schedule_id,
            },
            _ => {
                return Err(BookingError::Storage(format!(
                    "reservation {} is neither a room nor an activity booking",
                    row.id
                )))
            }
        };

        Ok(Reservation {
            id: row.id,
            guest: GuestContact {
                name: row.guest_name,
                email: row.guest_email,
                phone: Some(row.guest_phone).filter(|p| !p.is_empty()),
            },
            booking,
            status: row.status,
            total_price: row.total_price,
            special_requests: row.special_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row() -> ReservationRow {
        ReservationRow {
            id: 9,
            guest_name: "Ana".into(),
            guest_email: "ana@example.com".into(),
            guest_phone: String::new(),
            room_id: None,
            check_in: None,
            check_out: None,
            guests_count: 1,
            activity_id: Some(3),
            schedule_id: Some(4),
            status: ReservationStatus::Pending,
            total_price: Decimal::new(4000, 2),
            special_requests: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stay_requires_checkout_after_checkin() {
        assert!(StayRange::new(date(2024, 6, 1), date(2024, 6, 1)).is_err());
        assert!(StayRange::new(date(2024, 6, 2), date(2024, 6, 1)).is_err());
        assert_eq!(StayRange::new(date(2024, 6, 1), date(2024, 6, 4)).unwrap().nights(), 3);
    }

    #[test]
    fn missing_dates_are_validation_errors() {
        let err = StayRange::from_parts(None, Some(date(2024, 6, 4))).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        let err = StayRange::from_parts(Some(date(2024, 6, 1)), None).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn overlapping_january_stays_are_detected() {
        let first = StayRange::new(date(2025, 1, 10), date(2025, 1, 15)).unwrap();
        let second = StayRange::new(date(2025, 1, 12), date(2025, 1, 18)).unwrap();
        let back_to_back = StayRange::new(date(2025, 1, 15), date(2025, 1, 18)).unwrap();

        assert!(first.overlaps(&second));
        assert!(!first.overlaps(&back_to_back));
    }

    #[test]
    fn status_machine_allows_only_forward_edges() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(Pending.holds_inventory() && Confirmed.holds_inventory());
        assert!(!Cancelled.holds_inventory());
    }

    #[test]
    fn activity_row_converts() {
        let reservation = Reservation::try_from(row()).unwrap();
        assert_eq!(reservation.booking, Booking::Activity { activity_id: 3, schedule_id: 4 });
        assert_eq!(reservation.guest.phone, None);
    }

    #[test]
    fn row_with_both_modes_is_rejected() {
        let mut both = row();
        both.room_id = Some(1);
        both.check_in = Some(date(2024, 6, 1));
        both.check_out = Some(date(2024, 6, 2));
        assert!(matches!(Reservation::try_from(both), Err(BookingError::Storage(_))));

        let mut neither = row();
        neither.activity_id = None;
        neither.schedule_id = None;
        assert!(matches!(Reservation::try_from(neither), Err(BookingError::Storage(_))));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in 0i64..60, len_a in 1i64..15, b in 0i64..60, len_b in 1i64..15) {
            let base = date(2025, 1, 1);
            let first = StayRange::new(base + chrono::Duration::days(a), base + chrono::Duration::days(a + len_a)).unwrap();
            let second = StayRange::new(base + chrono::Duration::days(b), base + chrono::Duration::days(b + len_b)).unwrap();
            prop_assert_eq!(first.overlaps(&second), second.overlaps(&first));
            prop_assert!(first.overlaps(&first));
        }
    }
}
