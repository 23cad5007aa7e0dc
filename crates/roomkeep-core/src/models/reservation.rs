use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{GuestId, Money, NewGuest, ParseEnumError, ReservationId, RoomId};
use crate::error::{StoreError, StoreResult};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Confirmed,
        ReservationStatus::CheckedIn,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Active reservations hold the room for their dates
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::CheckedIn
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('-', "_");
        ReservationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| ParseEnumError::new("reservation status", s))
    }
}

/// A booking of one room by one guest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: ReservationId,
    pub guest_id: GuestId,
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    /// Strictly after `check_in`
    pub check_out: NaiveDate,
    pub total_amount: Money,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dirty: bool,
}

impl Reservation {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Input for booking a room ahead of time; always created `Confirmed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub guest_id: GuestId,
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_amount: Money,
}

impl NewReservation {
    pub(crate) fn validate(&self) -> StoreResult<()> {
        validate_dates(self.check_in, self.check_out)?;
        validate_amount(self.total_amount)?;
        Ok(())
    }
}

/// Partial update for a reservation
///
/// Status is deliberately absent: it only changes through the room
/// lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationPatch {
    pub guest_id: Option<GuestId>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub total_amount: Option<Money>,
}

impl ReservationPatch {
    pub(crate) fn validate_amount(&self) -> StoreResult<()> {
        self.total_amount.map(validate_amount).transpose()?;
        Ok(())
    }

    pub(crate) fn changes_stay(&self) -> bool {
        self.guest_id.is_some() || self.check_in.is_some() || self.check_out.is_some()
    }
}

/// Equality filters for listing reservations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    pub room_id: Option<RoomId>,
    pub guest_id: Option<GuestId>,
    pub status: Option<ReservationStatus>,
}

/// Who a reservation is for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestRef {
    Existing(GuestId),
    /// Created in the same transaction as the reservation
    New(NewGuest),
}

/// Guest and dates for a reserve or walk-in check-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayRequest {
    pub guest: GuestRef,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Defaults to nights × the room's nightly price
    #[serde(default)]
    pub total_amount: Option<Money>,
}

impl StayRequest {
    pub fn new(guest: GuestRef, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            guest,
            check_in,
            check_out,
            total_amount: None,
        }
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = Some(total);
        self
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        validate_dates(self.check_in, self.check_out)?;
        self.total_amount.map(validate_amount).transpose()?;
        Ok(())
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> StoreResult<Self> {
        if to < from {
            return Err(StoreError::validation(
                "range",
                format!("end {} is before start {}", to, from),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

pub(crate) fn validate_dates(check_in: NaiveDate, check_out: NaiveDate) -> StoreResult<()> {
    if check_out <= check_in {
        return Err(StoreError::validation(
            "check_out",
            format!("{} must be after check-in {}", check_out, check_in),
        ));
    }
    Ok(())
}

fn validate_amount(amount: Money) -> StoreResult<Money> {
    if amount.is_negative() {
        return Err(StoreError::validation(
            "total_amount",
            "must not be negative",
        ));
    }
    Ok(amount)
}
