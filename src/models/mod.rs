pub mod activity;
pub mod reservation;
pub mod room;

pub use activity::{Activity, ActivityCategory, ActivityFilter, Schedule};
pub use reservation::{
    Booking, GuestContact, NewReservation, Reservation, ReservationRow, ReservationStatus, StayRange,
};
pub use room::{AvailableRoom, Room, RoomType};
