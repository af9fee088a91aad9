pub mod availability;
pub mod clock;
pub mod ledger;
pub mod notification;
pub mod pricing;

pub use availability::{AvailabilityEngine, RoomSearch};
pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::{ActivityReservationRequest, GuestDetails, ReservationLedger, RoomReservationRequest};
pub use notification::{
    ConfirmationMessage, ConsoleNotifier, NotificationDispatcher, Notifier, NotifyError, SmtpNotifier,
};
