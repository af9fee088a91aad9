#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;

use hotel_reservations::cache::CacheService;
use hotel_reservations::config::Config;
use hotel_reservations::models::{Activity, ActivityCategory, Schedule};
use hotel_reservations::services::{FixedClock, GuestDetails, Notifier, NotifyError};
use hotel_reservations::store::MemoryStore;
use hotel_reservations::AppState;

#[derive(Debug, Clone)]
pub struct Sent {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Forwards every message to a channel the test can await.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Sent>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Sent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let _ = self.tx.send(Sent {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp server unreachable".into()))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// "Today" for every integration test.
pub fn today() -> NaiveDate {
    date(2024, 5, 20)
}

pub fn config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

pub fn state(store: Arc<MemoryStore>, notifier: Arc<dyn Notifier>) -> Arc<AppState> {
    let cache = CacheService::new(None, store.clone(), 60);
    AppState::new(config(), store, cache, Arc::new(FixedClock::new(today())), notifier)
}

pub fn guest(name: &str) -> GuestDetails {
    GuestDetails {
        guest_name: name.to_string(),
        guest_email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        guest_phone: None,
        special_requests: None,
    }
}

pub fn add_activity(store: &MemoryStore, name: &str, category: ActivityCategory, cents: i64) -> Activity {
    store.add_activity(Activity {
        id: 0,
        name: name.to_string(),
        description: format!("{name} at the resort"),
        category,
        price: Decimal::new(cents, 2),
        duration_hours: 1,
        max_participants: 10,
        image_url: None,
        is_active: true,
    })
}

pub fn add_slot(store: &MemoryStore, activity_id: i64, days_ahead: i64, hour: u32, spots: i32) -> Schedule {
    let start = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
    store
        .add_schedule(activity_id, today() + Duration::days(days_ahead), start, start + Duration::hours(1), spots)
        .unwrap()
}
