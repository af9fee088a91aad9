//! Notification dispatcher.
//!
//! Delivery is fire-and-forget: a failed send is logged and never reaches
//! the caller of the ledger.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::models::{Activity, AvailableRoom, Booking, Reservation, Schedule};

pub const CONFIRMATION_SUBJECT: &str = "Reservation confirmation - Hotel Paradise";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// SMTP delivery through lettre's tokio transport.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(host: &str, config: &MailConfig) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("from address: {e}")))?;

        Ok(Self { transport: builder.build(), from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("{recipient}: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Logs messages instead of sending them. Used when no SMTP host is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to = %recipient, subject = %subject, "email (console mode)\n{}", body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl ConfirmationMessage {
    pub fn for_room(reservation: &Reservation, room: &AvailableRoom) -> Self {
        let (check_in, check_out, guests) = match &reservation.booking {
            Booking::Room { stay, guests_count, .. } => {
                (stay.check_in().to_string(), stay.check_out().to_string(), *guests_count)
            }
            Booking::Activity { .. } => (String::new(), String::new(), 0),
        };
        let body = format!(
            "Dear {name},\n\n\
             Your room reservation #{id} has been received:\n\n\
             Room: {room}\n\
             Check-in: {check_in}\n\
             Check-out: {check_out}\n\
             Guests: {guests}\n\
             Total: ${total}\n\n\
             We look forward to your visit!\n",
            name = reservation.guest.name,
            id = reservation.id,
            room = room.label(),
            total = reservation.total_price,
        );
        Self::new(reservation, body)
    }

    pub fn for_activity(reservation: &Reservation, activity: &Activity, schedule: &Schedule) -> Self {
        let body = format!(
            "Dear {name},\n\n\
             Your activity reservation #{id} has been received:\n\n\
             Activity: {activity}\n\
             Date: {date}\n\
             Time: {start} - {end}\n\
             Total: ${total}\n\n\
             See you soon!\n",
            name = reservation.guest.name,
            id = reservation.id,
            activity = activity.name,
            date = schedule.date,
            start = schedule.start_time.format("%H:%M"),
            end = schedule.end_time.format("%H:%M"),
            total = reservation.total_price,
        );
        Self::new(reservation, body)
    }

    fn new(reservation: &Reservation, body: String) -> Self {
        Self {
            recipient: reservation.guest.email.clone(),
            subject: CONFIRMATION_SUBJECT.to_string(),
            body,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Sends in the background. The handle is only useful to tests.
    pub fn dispatch(&self, reservation_id: i64, message: ConfirmationMessage) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match notifier.send(&message.recipient, &message.subject, &message.body).await {
                Ok(()) => info!(reservation_id, "confirmation sent"),
                Err(e) => warn!(reservation_id, error = %e, "failed to send confirmation"),
            }
        })
    }
}
