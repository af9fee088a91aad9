use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct RoomType {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_per_night: Decimal,
    pub max_capacity: i32,
    pub amenities: Vec<String>,
}

impl RoomType {
    pub fn fits(&self, guests: i32) -> bool {
        guests >= 1 && guests <= self.max_capacity
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: String,
    pub room_type_id: i64,
    pub floor: i32,
    /// Administrative flag, independent of bookings.
    pub is_available: bool,
}

/// A room joined with its type, as returned by availability queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableRoom {
    #[serde(flatten)]
    pub room: Room,
    pub room_type: RoomType,
}

impl AvailableRoom {
    pub fn label(&self) -> String {
        format!("Room {} - {}", self.room.number, self.room_type.name)
    }
}
