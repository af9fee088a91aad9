//! Persistence seam for the catalog and the reservation ledger.
//!
//! Each write on [`ReservationStore`] is a single check-and-act unit: the
//! backend must serialize it per resource so that two concurrent callers can
//! never both book overlapping dates on one room, or both take the last spot
//! of a schedule. Losing that race is reported as [`BookingError::Conflict`].
//!
//! [`BookingError::Conflict`]: crate::error::BookingError::Conflict

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    Activity, ActivityFilter, AvailableRoom, NewReservation, Reservation, ReservationStatus, RoomType,
    Schedule, StayRange,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read access to reference data.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_room_types(&self) -> Result<Vec<RoomType>>;

    async fn get_room(&self, room_id: i64) -> Result<Option<AvailableRoom>>;

    /// Active activities matching `filter`, ordered by name.
    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>>;

    async fn get_activity(&self, activity_id: i64) -> Result<Option<Activity>>;

    async fn get_schedule(&self, schedule_id: i64) -> Result<Option<Schedule>>;

    /// Schedules of `activity_id` dated within `[from, to]` with spots left,
    /// ordered by date then start time.
    async fn open_schedules(&self, activity_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Schedule>>;

    /// Administratively available rooms with capacity for `guests` and no
    /// pending/confirmed reservation overlapping `stay`, ordered by number.
    async fn free_rooms(&self, stay: StayRange, guests: i32) -> Result<Vec<AvailableRoom>>;

    /// Whether a pending/confirmed reservation on `room_id` overlaps `stay`.
    async fn room_is_booked(&self, room_id: i64, stay: StayRange) -> Result<bool>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait ReservationStore: CatalogStore {
    /// Persists a room-mode reservation after re-checking overlap under the
    /// room's serialization point.
    async fn insert_room_reservation(&self, new: NewReservation) -> Result<Reservation>;

    /// Decrements the schedule's spots and persists an activity-mode
    /// reservation as one atomic unit.
    async fn insert_activity_reservation(&self, new: NewReservation) -> Result<Reservation>;

    async fn get_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>>;

    /// Compare-and-set status change. Cancelling an activity reservation
    /// returns its spot to the schedule.
    async fn update_status(
        &self,
        reservation_id: i64,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Reservation>;
}
