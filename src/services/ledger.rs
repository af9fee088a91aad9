//! Reservation ledger: creation, lookup and status transitions.

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::availability::AvailabilityEngine;
use super::notification::{ConfirmationMessage, NotificationDispatcher};
use super::pricing;
use crate::error::{BookingError, Result};
use crate::models::{Booking, GuestContact, NewReservation, Reservation, ReservationStatus};
use chrono::NaiveDate;

/// Contact details and free text shared by both booking forms.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuestDetails {
    #[validate(length(min = 1, max = 100))]
    pub guest_name: String,
    #[validate(email, length(max = 254))]
    pub guest_email: String,
    #[validate(length(max = 20))]
    pub guest_phone: Option<String>,
    #[validate(length(max = 2000))]
    pub special_requests: Option<String>,
}

impl GuestDetails {
    fn into_parts(self) -> Result<(GuestContact, String)> {
        self.validate()?;
        let name = self.guest_name.trim().to_string();
        if name.is_empty() {
            return Err(BookingError::validation("guest name must not be blank"));
        }
        let phone = self
            .guest_phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let contact = GuestContact {
            name,
            email: self.guest_email.trim().to_string(),
            phone,
        };
        Ok((contact, self.special_requests.unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomReservationRequest {
    #[serde(flatten)]
    pub guest: GuestDetails,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityReservationRequest {
    #[serde(flatten)]
    pub guest: GuestDetails,
}

#[derive(Clone)]
pub struct ReservationLedger {
    availability: AvailabilityEngine,
    notifications: NotificationDispatcher,
}

impl ReservationLedger {
    pub fn new(availability: AvailabilityEngine, notifications: NotificationDispatcher) -> Self {
        Self { availability, notifications }
    }

    pub async fn create_room_reservation(&self, room_id: i64, request: RoomReservationRequest) -> Result<Reservation> {
        let (guest, special_requests) = request.guest.into_parts()?;
        let stay = self.availability.validate_stay(request.check_in, request.check_out)?;
        let guests_count = self.availability.validate_guests(request.guests_count.unwrap_or(1))?;

        let store = self.availability.store();
        let room = store
            .get_room(room_id)
            .await?
            .ok_or_else(|| BookingError::not_found("room", room_id))?;
        if !room.room_type.fits(guests_count) {
            return Err(BookingError::validation(format!(
                "{} holds at most {} guests",
                room.label(),
                room.room_type.max_capacity
            )));
        }
        if !room.room.is_available {
            return Err(BookingError::CapacityExhausted(format!("room {} is closed for booking", room.room.number)));
        }
        if store.room_is_booked(room_id, stay).await? {
            return Err(BookingError::CapacityExhausted(format!(
                "room {} is already booked between {} and {}",
                room.room.number,
                stay.check_in(),
                stay.check_out()
            )));
        }

        let total_price = pricing::room_total(&room.room_type, &stay)?;
        let reservation = store
            .insert_room_reservation(NewReservation {
                guest,
                booking: Booking::Room { room_id, stay, guests_count },
                status: ReservationStatus::Pending,
                total_price,
                special_requests,
            })
            .await?;

        info!(
            reservation_id = reservation.id,
            room = %room.room.number,
            nights = stay.nights(),
            total = %reservation.total_price,
            "room reservation created"
        );
        self.notifications
            .dispatch(reservation.id, ConfirmationMessage::for_room(&reservation, &room));
        Ok(reservation)
    }

    pub async fn create_activity_reservation(
        &self,
        schedule_id: i64,
        request: ActivityReservationRequest,
    ) -> Result<Reservation> {
        let (guest, special_requests) = request.guest.into_parts()?;

        let schedule = self.availability.check_slot(schedule_id).await?;
        let activity = self
            .availability
            .store()
            .get_activity(schedule.activity_id)
            .await?
            .ok_or_else(|| BookingError::not_found("activity", schedule.activity_id))?;
        if !activity.is_active {
            return Err(BookingError::validation(format!("{} is not offered any more", activity.name)));
        }
        let today = self.availability.today();
        if schedule.date < today {
            return Err(BookingError::validation(format!(
                "schedule {schedule_id} took place on {}",
                schedule.date
            )));
        }

        let total_price = pricing::activity_total(&activity)?;
        let reservation = self
            .availability
            .store()
            .insert_activity_reservation(NewReservation {
                guest,
                booking: Booking::Activity { activity_id: activity.id, schedule_id },
                status: ReservationStatus::Pending,
                total_price,
                special_requests,
            })
            .await?;

        info!(
            reservation_id = reservation.id,
            activity = %activity.name,
            schedule_id,
            total = %reservation.total_price,
            "activity reservation created"
        );
        self.notifications.dispatch(
            reservation.id,
            ConfirmationMessage::for_activity(&reservation, &activity, &schedule),
        );
        Ok(reservation)
    }

    pub async fn get(&self, reservation_id: i64) -> Result<Reservation> {
        self.availability
            .store()
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", reservation_id))
    }

    /// Moves a reservation along the status machine. A concurrent change
    /// between the read and the write surfaces as `Conflict`.
    pub async fn transition(&self, reservation_id: i64, to: ReservationStatus) -> Result<Reservation> {
        let current = self.get(reservation_id).await?;
        if !current.status.can_transition_to(to) {
            return Err(BookingError::validation(format!(
                "reservation {reservation_id} cannot move from {} to {to}",
                current.status
            )));
        }
        let updated = self
            .availability
            .store()
            .update_status(reservation_id, current.status, to)
            .await?;
        info!(reservation_id, from = %current.status, to = %to, "reservation status changed");
        Ok(updated)
    }
}
