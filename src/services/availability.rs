//! Availability engine: which rooms and activity slots can be booked.

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::clock::Clock;
use crate::config::BookingPolicy;
use crate::error::{BookingError, Result};
use crate::models::{Activity, ActivityFilter, AvailableRoom, RoomType, Schedule, StayRange};
use crate::store::ReservationStore;

/// Room search input as submitted by the presentation layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomSearch {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i32>,
}

#[derive(Clone)]
pub struct AvailabilityEngine {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl AvailabilityEngine {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, policy: BookingPolicy) -> Self {
        Self { store, clock, policy }
    }

    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Validated stay: both dates present, check-out after check-in,
    /// check-in not before today, and no longer than the policy allows.
    pub fn validate_stay(&self, check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> Result<StayRange> {
        let stay = StayRange::from_parts(check_in, check_out)?;
        let today = self.clock.today();
        if stay.check_in() < today {
            return Err(BookingError::validation(format!(
                "check-in ({}) cannot be before today ({today})",
                stay.check_in()
            )));
        }
        if stay.nights() > self.policy.max_stay_nights {
            return Err(BookingError::validation(format!(
                "stay of {} nights exceeds the maximum of {}",
                stay.nights(),
                self.policy.max_stay_nights
            )));
        }
        Ok(stay)
    }

    pub fn validate_guests(&self, guests: i32) -> Result<i32> {
        if guests < 1 || guests > self.policy.max_guests {
            return Err(BookingError::validation(format!(
                "guest count must be between 1 and {}",
                self.policy.max_guests
            )));
        }
        Ok(guests)
    }

    pub async fn search_rooms(&self, query: &RoomSearch) -> Result<Vec<AvailableRoom>> {
        let stay = self.validate_stay(query.check_in, query.check_out)?;
        let guests = self.validate_guests(query.guests.unwrap_or(1))?;

        let rooms = self.store.free_rooms(stay, guests).await?;
        debug!(
            check_in = %stay.check_in(),
            check_out = %stay.check_out(),
            guests,
            found = rooms.len(),
            "room search"
        );
        Ok(rooms)
    }

    pub async fn room_types(&self) -> Result<Vec<RoomType>> {
        self.store.list_room_types().await
    }

    pub async fn activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        self.store.list_activities(filter).await
    }

    /// Active activity by id; inactive ones are reported as missing.
    pub async fn activity(&self, activity_id: i64) -> Result<Activity> {
        match self.store.get_activity(activity_id).await? {
            Some(activity) if activity.is_active => Ok(activity),
            _ => Err(BookingError::not_found("activity", activity_id)),
        }
    }

    /// Slots of an active activity dated within the rolling window with
    /// spots left, ordered by date then start time.
    pub async fn open_slots(&self, activity_id: i64) -> Result<Vec<Schedule>> {
        let activity = self.activity(activity_id).await?;
        let (from, to) = self.slot_window();
        self.store.open_schedules(activity.id, from, to).await
    }

    /// Inclusive `[today, today + window]`, clamped to the last representable date.
    pub fn slot_window(&self) -> (NaiveDate, NaiveDate) {
        let today = self.clock.today();
        let days = u64::try_from(self.policy.activity_window_days).unwrap_or(0);
        let end = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        (today, end)
    }

    /// Pre-check for a slot claim. The decrement itself happens atomically
    /// in the store together with the reservation insert.
    pub async fn check_slot(&self, schedule_id: i64) -> Result<Schedule> {
        let schedule = self
            .store
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| BookingError::not_found("schedule", schedule_id))?;
        if !schedule.has_spots() {
            return Err(BookingError::CapacityExhausted(format!(
                "no spots left for schedule {schedule_id}"
            )));
        }
        Ok(schedule)
    }
}
