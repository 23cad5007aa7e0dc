use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{required_text, Money, ParseEnumError, ReservationId, RoomId};
use crate::error::{StoreError, StoreResult};

/// Room status as shown on the front desk board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
    Cleaning,
}

impl RoomStatus {
    pub const ALL: [RoomStatus; 5] = [
        RoomStatus::Available,
        RoomStatus::Occupied,
        RoomStatus::Reserved,
        RoomStatus::Maintenance,
        RoomStatus::Cleaning,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Reserved => "reserved",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Cleaning => "cleaning",
        }
    }

    /// Whether a room in this status must carry an occupant
    pub fn has_occupant(self) -> bool {
        matches!(self, RoomStatus::Occupied | RoomStatus::Reserved)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        RoomStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| ParseEnumError::new("room status", s))
    }
}

/// Guest and stay dates cached on a room for offline display
///
/// This is a read model of the reservation it points at. Only the room
/// lifecycle writes it, in the same transaction as the reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occupant {
    pub reservation_id: ReservationId,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// A hotel room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    /// Room number, unique within the replica (e.g. "101")
    pub number: String,
    pub room_type: String,
    pub price_per_night: Money,
    pub status: RoomStatus,
    /// Ordered, de-duplicated
    pub amenities: Vec<String>,
    pub occupant: Option<Occupant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Not yet reflected in the remote system
    pub dirty: bool,
}

/// Input for creating a room; new rooms always start `Available`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub number: String,
    pub room_type: String,
    pub price_per_night: Money,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl NewRoom {
    pub fn new(number: impl Into<String>, room_type: impl Into<String>, price: Money) -> Self {
        Self {
            number: number.into(),
            room_type: room_type.into(),
            price_per_night: price,
            amenities: Vec::new(),
        }
    }

    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validated(&self) -> StoreResult<NewRoom> {
        Ok(NewRoom {
            number: required_text("number", &self.number)?,
            room_type: required_text("room_type", &self.room_type)?,
            price_per_night: validate_price(self.price_per_night)?,
            amenities: normalize_amenities(&self.amenities),
        })
    }
}

/// Partial update for a room
///
/// `status` is only honoured for transitions without reservation side
/// effects; everything else must go through the room lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPatch {
    pub room_type: Option<String>,
    pub price_per_night: Option<Money>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<RoomStatus>,
}

impl RoomPatch {
    pub(crate) fn validated(&self) -> StoreResult<RoomPatch> {
        Ok(RoomPatch {
            room_type: self
                .room_type
                .as_deref()
                .map(|t| required_text("room_type", t))
                .transpose()?,
            price_per_night: self.price_per_night.map(validate_price).transpose()?,
            amenities: self.amenities.as_deref().map(normalize_amenities),
            status: self.status,
        })
    }

    pub(crate) fn touches_columns(&self) -> bool {
        self.room_type.is_some() || self.price_per_night.is_some() || self.amenities.is_some()
    }
}

/// Equality filters for listing rooms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
    pub room_type: Option<String>,
}

impl RoomFilter {
    pub fn status(status: RoomStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

fn validate_price(price: Money) -> StoreResult<Money> {
    if price.is_negative() {
        return Err(StoreError::validation(
            "price_per_night",
            "must not be negative",
        ));
    }
    Ok(price)
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order
pub(crate) fn normalize_amenities(amenities: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(amenities.len());
    for amenity in amenities {
        let amenity = amenity.trim();
        if !amenity.is_empty() && !out.iter().any(|a| a == amenity) {
            out.push(amenity.to_string());
        }
    }
    out
}
