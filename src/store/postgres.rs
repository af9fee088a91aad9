use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, warn};

use super::{CatalogStore, ReservationStore};
use crate::error::{BookingError, Result};
use crate::models::{
    Activity, ActivityFilter, AvailableRoom, Booking, NewReservation, Reservation, ReservationRow,
    ReservationStatus, Room, RoomType, Schedule, StayRange,
};

/// SQLSTATE for `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";

const ROOM_COLUMNS: &str = r#"
    r.id, r.number, r.room_type_id, r.floor, r.is_available,
    t.name AS type_name, t.description AS type_description, t.price_per_night,
    t.max_capacity, t.amenities
"#;

const RESERVATION_COLUMNS: &str = r#"
    id, guest_name, guest_email, guest_phone, room_id, check_in, check_out, guests_count,
    activity_id, schedule_id, status, total_price, special_requests, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn available_room(row: &PgRow) -> std::result::Result<AvailableRoom, sqlx::Error> {
        Ok(AvailableRoom {
            room: Room {
                id: row.try_get("id")?,
                number: row.try_get("number")?,
                room_type_id: row.try_get("room_type_id")?,
                floor: row.try_get("floor")?,
                is_available: row.try_get("is_available")?,
            },
            room_type: RoomType {
                id: row.try_get("room_type_id")?,
                name: row.try_get("type_name")?,
                description: row.try_get("type_description")?,
                price_per_night: row.try_get("price_per_night")?,
                max_capacity: row.try_get("max_capacity")?,
                amenities: row.try_get("amenities")?,
            },
        })
    }

    async fn insert_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: &NewReservation,
    ) -> Result<Reservation> {
        let (room_id, check_in, check_out, guests_count, activity_id, schedule_id) = match &new.booking {
            Booking::Room { room_id, stay, guests_count } => {
                (Some(*room_id), Some(stay.check_in()), Some(stay.check_out()), *guests_count, None, None)
            }
            Booking::Activity { activity_id, schedule_id } => {
                (None, None, None, 1, Some(*activity_id), Some(*schedule_id))
            }
        };

        let sql = format!(
            r#"
            INSERT INTO reservations
                (guest_name, guest_email, guest_phone, room_id, check_in, check_out, guests_count,
                 activity_id, schedule_id, status, total_price, special_requests)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&new.guest.name)
            .bind(&new.guest.email)
            .bind(new.guest.phone.as_deref().unwrap_or_default())
            .bind(room_id)
            .bind(check_in)
            .bind(check_out)
            .bind(guests_count)
            .bind(activity_id)
            .bind(schedule_id)
            .bind(new.status)
            .bind(new.total_price)
            .bind(&new.special_requests)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                let excluded = matches!(
                    &e,
                    sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION)
                );
                if excluded {
                    BookingError::Conflict("the room was booked for overlapping dates by another request".into())
                } else {
                    BookingError::Database(e)
                }
            })?;

        Reservation::try_from(row)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_room_types(&self) -> Result<Vec<RoomType>> {
        let types = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, description, price_per_night, max_capacity, amenities
             FROM room_types
             ORDER BY price_per_night, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    async fn get_room(&self, room_id: i64) -> Result<Option<AvailableRoom>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms r JOIN room_types t ON t.id = r.room_type_id WHERE r.id = $1"
        );
        let row = sqlx::query(&sql).bind(room_id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::available_room).transpose()?)
    }

    async fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let pattern = filter.search_term().map(|t| format!("%{t}%"));
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, name, description, category, price, duration_hours, max_participants,
                   image_url, is_active
            FROM activities
            WHERE is_active = TRUE
              AND ($1::VARCHAR IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ORDER BY name
            "#,
        )
        .bind(filter.category)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn get_activity(&self, activity_id: i64) -> Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(
            "SELECT id, name, description, category, price, duration_hours, max_participants,
                    image_url, is_active
             FROM activities WHERE id = $1",
        )
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn get_schedule(&self, schedule_id: i64) -> Result<Option<Schedule>> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT id, activity_id, date, start_time, end_time, available_spots
             FROM schedules WHERE id = $1",
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    async fn open_schedules(&self, activity_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Schedule>> {
        let schedules = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, activity_id, date, start_time, end_time, available_spots
            FROM schedules
            WHERE activity_id = $1
              AND date BETWEEN $2 AND $3
              AND available_spots > 0
            ORDER BY date, start_time
            "#,
        )
        .bind(activity_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    async fn free_rooms(&self, stay: StayRange, guests: i32) -> Result<Vec<AvailableRoom>> {
        let sql = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM rooms r
            JOIN room_types t ON t.id = r.room_type_id
            WHERE r.is_available = TRUE
              AND t.max_capacity >= $1
              AND NOT EXISTS (
                  SELECT 1 FROM reservations b
                  WHERE b.room_id = r.id
                    AND b.status IN ('pending', 'confirmed')
                    AND b.check_in < $3
                    AND b.check_out > $2
              )
            ORDER BY r.number
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(guests)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .fetch_all(&self.pool)
            .await?;
        let rooms = rows.iter().map(Self::available_room).collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    async fn room_is_booked(&self, room_id: i64, stay: StayRange) -> Result<bool> {
        let booked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE room_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND check_in < $3
                  AND check_out > $2
            )
            "#,
        )
        .bind(room_id)
        .bind(stay.check_in())
        .bind(stay.check_out())
        .fetch_one(&self.pool)
        .await?;
        Ok(booked)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn insert_room_reservation(&self, new: NewReservation) -> Result<Reservation> {
        let Booking::Room { room_id, stay, .. } = new.booking else {
            return Err(BookingError::Storage("expected a room booking".into()));
        };

        let mut tx = self.pool.begin().await?;

        // Row lock on the room serializes concurrent bookings for it.
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Err(BookingError::not_found("room", room_id));
        }

        let clash = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE room_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND check_in < $3
                  AND check_out > $2
            )
            "#,
        )
        .bind(room_id)
        .bind(stay.check_in())
        .bind(stay.check_out())
        .fetch_one(&mut *tx)
        .await?;
        if clash {
            tx.rollback().await?;
            debug!(room_id, "room booking lost the race");
            return Err(BookingError::Conflict(format!(
                "room {room_id} was booked for overlapping dates by another request"
            )));
        }

        let reservation = match Self::insert_row(&mut tx, &new).await {
            Ok(r) => r,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };
        tx.commit().await?;
        Ok(reservation)
    }

    async fn insert_activity_reservation(&self, new: NewReservation) -> Result<Reservation> {
        let Booking::Activity { schedule_id, .. } = new.booking else {
            return Err(BookingError::Storage("expected an activity booking".into()));
        };

        let mut tx = self.pool.begin().await?;

        // Conditional decrement: never goes below zero, and only one of two
        // racing requests can take the last spot.
        let claimed = sqlx::query(
            "UPDATE schedules SET available_spots = available_spots - 1
             WHERE id = $1 AND available_spots > 0",
        )
        .bind(schedule_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !claimed {
            tx.rollback().await?;
            debug!(schedule_id, "slot claim lost the race");
            return Err(BookingError::Conflict(format!(
                "the last spot of schedule {schedule_id} was taken by another request"
            )));
        }

        let reservation = match Self::insert_row(&mut tx, &new).await {
            Ok(r) => r,
            Err(e) => {
                // Rolling back also restores the spot.
                let _ = tx.rollback().await;
                return Err(e);
            }
        };
        tx.commit().await?;
        Ok(reservation)
    }

    async fn get_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(reservation_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Reservation::try_from).transpose()
    }

    async fn update_status(
        &self,
        reservation_id: i64,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE reservations SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {RESERVATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(reservation_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            let exists = self.get_reservation(reservation_id).await?;
            return Err(match exists {
                Some(current) => BookingError::Conflict(format!(
                    "reservation {reservation_id} is {} now, expected {from}",
                    current.status
                )),
                None => BookingError::not_found("reservation", reservation_id),
            });
        };
        let reservation = Reservation::try_from(row)?;

        if to == ReservationStatus::Cancelled {
            if let Booking::Activity { schedule_id, .. } = reservation.booking {
                let restored = sqlx::query("UPDATE schedules SET available_spots = available_spots + 1 WHERE id = $1")
                    .bind(schedule_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                if restored == 0 {
                    warn!(reservation_id, schedule_id, "cancelled reservation points at a missing schedule");
                }
            }
        }

        tx.commit().await?;
        Ok(reservation)
    }
}
