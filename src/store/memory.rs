//! In-process store. A single mutex guards every table, so each trait call
//! is one critical section.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{CatalogStore, ReservationStore};
use crate::error::{BookingError, Result};
use crate::models::{
    Activity, ActivityCategory, ActivityFilter, AvailableRoom, Booking, NewReservation, Reservation,
    ReservationStatus, Room, RoomType, Schedule, StayRange,
};

#[derive(Debug, Default)]
struct Tables {
    room_types: BTreeMap<i64, RoomType>,
    rooms: BTreeMap<i64, Room>,
    activities: BTreeMap<i64, Activity>,
    schedules: BTreeMap<i64, Schedule>,
    reservations: BTreeMap<i64, Reservation>,
}

fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl Tables {
    fn joined_room(&self, room: &Room) -> Result<AvailableRoom> {
        let room_type = self.room_types.get(&room.room_type_id).ok_or_else(|| {
            BookingError::Storage(format!("room {} references missing room type {}", room.id, room.room_type_id))
        })?;
        Ok(AvailableRoom { room: room.clone(), room_type: room_type.clone() })
    }

    fn room_is_booked(&self, room_id: i64, stay: &StayRange) -> bool {
        self.reservations
            .values()
            .any(|r| r.status.holds_inventory() && r.booking.occupies(room_id, stay))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room_type(&self, name: &str, price_per_night: Decimal, max_capacity: i32, amenities: &[&str]) -> RoomType {
        let mut tables = self.tables.lock();
        let room_type = RoomType {
            id: next_id(&tables.room_types),
            name: name.to_string(),
            description: String::new(),
            price_per_night,
            max_capacity,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
        };
        tables.room_types.insert(room_type.id, room_type.clone());
        room_type
    }

    pub fn add_room(&self, number: &str, room_type_id: i64, floor: i32) -> Result<Room> {
        let mut tables = self.tables.lock();
        if !tables.room_types.contains_key(&room_type_id) {
            return Err(BookingError::not_found("room type", room_type_id));
        }
        if tables.rooms.values().any(|r| r.number == number) {
            return Err(BookingError::validation(format!("room number {number} already exists")));
        }
        let room = Room {
            id: next_id(&tables.rooms),
            number: number.to_string(),
            room_type_id,
            floor,
            is_available: true,
        };
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    pub fn set_room_available(&self, room_id: i64, is_available: bool) -> Result<()> {
        let mut tables = self.tables.lock();
        let room = tables
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| BookingError::not_found("room", room_id))?;
        room.is_available = is_available;
        Ok(())
    }

    /// Inserts `activity` under a fresh id, which is returned in the copy.
    pub fn add_activity(&self, mut activity: Activity) -> Activity {
        let mut tables = self.tables.lock();
        activity.id = next_id(&tables.activities);
        tables.activities.insert(activity.id, activity.clone());
        activity
    }

    pub fn add_schedule(
        &self,
        activity_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        available_spots: i32,
    ) -> Result<Schedule> {
        let mut tables = self.tables.lock();
        if !tables.activities.contains_key(&activity_id) {
            return Err(BookingError::not_found("activity", activity_id));
        }
        if available_spots < 0 {
            return Err(BookingError::validation("available spots cannot be negative"));
        }
        let duplicate = tables
            .schedules
            .values()
            .any(|s| s.activity_id == activity_id && s.date == date && s.start_time == start_time);
        if duplicate {
            return Err(BookingError::validation(format!(
                "activity {activity_id} already has a slot at {date} {start_time}"
            )));
        }
        let schedule = Schedule {
            id: next_id(&tables.schedules),
            activity_id,
            date,
            start_time,
            end_time,
            available_spots,
        };
        tables.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    /// Small catalog used when the service runs without a database.
    pub fn with_demo_catalog(today: NaiveDate) -> Result<Self> {
        let store = Self::new();
        let standard = store.add_room_type("Standard", Decimal::new(9000, 2), 2, &["WiFi", "TV"]);
        let deluxe = store.add_room_type("Deluxe", Decimal::new(15000, 2), 2, &["WiFi", "TV", "Minibar", "Sea view"]);
        let suite = store.add_room_type("Family Suite", Decimal::new(24000, 2), 5, &["WiFi", "TV", "Kitchenette"]);
        store.add_room("101", deluxe.id, 1)?;
        store.add_room("102", standard.id, 1)?;
        store.add_room("201", suite.id, 2)?;

        let activity = |name: &str, description: &str, category, cents, hours| Activity {
            id: 0,
            name: name.to_string(),
            description: description.to_string(),
            category,
            price: Decimal::new(cents, 2),
            duration_hours: hours,
            max_participants: 10,
            image_url: None,
            is_active: true,
        };
        let massage = store.add_activity(activity("Hot Stone Massage", "Relaxing full body massage", ActivityCategory::Spa, 8000, 1));
        let tennis = store.add_activity(activity("Tennis Clinic", "Group lesson with a coach", ActivityCategory::Sport, 3500, 2));

        let time = |h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0).ok_or_else(|| BookingError::Storage(format!("invalid hour {h}")))
        };
        for offset in 1..=7 {
            let day = today + Duration::days(offset);
            store.add_schedule(massage.id, day, time(10)?, time(11)?, 4)?;
            store.add_schedule(tennis.id, day, time(16)?, time(18)?, 8)?;
        }
        Ok(store)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_room_types(&self) -> Result<Vec<RoomType>> {
        Ok(self.tables.lock().room_types.values().cloned().collect())
    }

    async fn get_room(&self, room_id: i64) -> Result<Option<AvailableRoom>> {
        let tables = self.tables.lock();
        tables.rooms.get(&room_id).map(|room| tables.joined_room(room)).transpose()
    }

    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let tables = self.tables.lock();
        let mut activities: Vec<Activity> = tables
            .activities
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        activities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(activities)
    }

    async fn get_activity(&self, activity_id: i64) -> Result<Option<Activity>> {
        Ok(self.tables.lock().activities.get(&activity_id).cloned())
    }

    async fn get_schedule(&self, schedule_id: i64) -> Result<Option<Schedule>> {
        Ok(self.tables.lock().schedules.get(&schedule_id).cloned())
    }

    async fn open_schedules(&self, activity_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Schedule>> {
        let tables = self.tables.lock();
        let mut schedules: Vec<Schedule> = tables
            .schedules
            .values()
            .filter(|s| s.activity_id == activity_id && s.date >= from && s.date <= to && s.has_spots())
            .cloned()
            .collect();
        schedules.sort_by_key(|s| (s.date, s.start_time));
        Ok(schedules)
    }

    async fn free_rooms(&self, stay: StayRange, guests: i32) -> Result<Vec<AvailableRoom>> {
        let tables = self.tables.lock();
        let mut rooms = Vec::new();
        for room in tables.rooms.values().filter(|r| r.is_available) {
            let joined = tables.joined_room(room)?;
            if joined.room_type.max_capacity >= guests && !tables.room_is_booked(room.id, &stay) {
                rooms.push(joined);
            }
        }
        rooms.sort_by(|a, b| a.room.number.cmp(&b.room.number));
        Ok(rooms)
    }

    async fn room_is_booked(&self, room_id: i64, stay: StayRange) -> Result<bool> {
        Ok(self.tables.lock().room_is_booked(room_id, &stay))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert_room_reservation(&self, new: NewReservation) -> Result<Reservation> {
        let Booking::Room { room_id, stay, .. } = new.booking else {
            return Err(BookingError::Storage("expected a room booking".into()));
        };
        let mut tables = self.tables.lock();
        if !tables.rooms.contains_key(&room_id) {
            return Err(BookingError::not_found("room", room_id));
        }
        if tables.room_is_booked(room_id, &stay) {
            return Err(BookingError::Conflict(format!(
                "room {room_id} was booked for overlapping dates by another request"
            )));
        }
        let reservation = new.into_reservation(next_id(&tables.reservations), Utc::now());
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn insert_activity_reservation(&self, new: NewReservation) -> Result<Reservation> {
        let Booking::Activity { schedule_id, .. } = new.booking else {
            return Err(BookingError::Storage("expected an activity booking".into()));
        };
        let mut tables = self.tables.lock();
        let id = next_id(&tables.reservations);
        let schedule = tables
            .schedules
            .get_mut(&schedule_id)
            .ok_or_else(|| BookingError::not_found("schedule", schedule_id))?;
        if !schedule.has_spots() {
            return Err(BookingError::Conflict(format!(
                "the last spot of schedule {schedule_id} was taken by another request"
            )));
        }
        schedule.available_spots -= 1;
        let reservation = new.into_reservation(id, Utc::now());
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn get_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>> {
        Ok(self.tables.lock().reservations.get(&reservation_id).cloned())
    }

    async fn update_status(
        &self,
        reservation_id: i64,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Reservation> {
        let mut tables = self.tables.lock();
        let reservation = tables
            .reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| BookingError::not_found("reservation", reservation_id))?;
        if reservation.status != from {
            return Err(BookingError::Conflict(format!(
                "reservation {reservation_id} is {} now, expected {from}",
                reservation.status
            )));
        }
        reservation.status = to;
        reservation.updated_at = Utc::now();
        let updated = reservation.clone();

        if to == ReservationStatus::Cancelled {
            if let Booking::Activity { schedule_id, .. } = updated.booking {
                if let Some(schedule) = tables.schedules.get_mut(&schedule_id) {
                    schedule.available_spots += 1;
                }
            }
        }
        Ok(updated)
    }
}
