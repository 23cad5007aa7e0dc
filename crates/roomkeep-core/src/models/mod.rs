//! Data models for roomkeep
//!
//! Defines the typed records for the four persisted entities (rooms,
//! guests, reservations, users) plus the input types used to create,
//! patch and filter them.

mod guest;
mod money;
mod reservation;
mod room;
mod user;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use guest::{Guest, GuestFilter, GuestPatch, NewGuest};
pub use money::{Money, ParseMoneyError};
pub(crate) use reservation::validate_dates;
pub use reservation::{
    DateRange, GuestRef, NewReservation, Reservation, ReservationFilter, ReservationPatch,
    ReservationStatus, StayRequest,
};
pub use room::{NewRoom, Occupant, Room, RoomFilter, RoomPatch, RoomStatus};
pub use user::{NewUser, User, UserFilter, UserPatch, UserRole};

pub type RoomId = i64;
pub type GuestId = i64;
pub type ReservationId = i64;
pub type UserId = i64;

/// Error returned when parsing one of the enumerated column values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {what} '{value}'")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// The four persisted entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Room,
    Guest,
    Reservation,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Room,
        EntityKind::Guest,
        EntityKind::Reservation,
        EntityKind::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Room => "room",
            EntityKind::Guest => "guest",
            EntityKind::Reservation => "reservation",
            EntityKind::User => "user",
        }
    }

    /// Backing table name
    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::Room => "rooms",
            EntityKind::Guest => "guests",
            EntityKind::Reservation => "reservations",
            EntityKind::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" | "rooms" => Ok(EntityKind::Room),
            "guest" | "guests" => Ok(EntityKind::Guest),
            "reservation" | "reservations" => Ok(EntityKind::Reservation),
            "user" | "users" => Ok(EntityKind::User),
            _ => Err(ParseEnumError::new("entity kind", s)),
        }
    }
}

/// Trim a required text field, rejecting blank values
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
) -> crate::error::StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::StoreError::validation(
            field,
            "must not be empty",
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes `None`
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalize an optional email address
///
/// Emails are compared case-insensitively, so they are stored lowercased.
pub(crate) fn normalize_email(
    field: &'static str,
    value: Option<&str>,
) -> crate::error::StoreResult<Option<String>> {
    match optional_text(value) {
        None => Ok(None),
        Some(email) => {
            let valid = match email.split_once('@') {
                Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
                None => false,
            };
            if !valid || email.contains(char::is_whitespace) {
                return Err(crate::error::StoreError::validation(
                    field,
                    format!("'{}' is not a valid email address", email),
                ));
            }
            Ok(Some(email.to_ascii_lowercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("room".parse::<EntityKind>().unwrap(), EntityKind::Room);
        assert_eq!("Guests".parse::<EntityKind>().unwrap(), EntityKind::Guest);
        assert_eq!(
            " reservation ".parse::<EntityKind>().unwrap(),
            EntityKind::Reservation
        );
        assert!("invoice".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_entity_kind_tables() {
        let tables: Vec<&str> = EntityKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables, vec!["rooms", "guests", "reservations", "users"]);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("email", Some("  A.Smith@Example.com ")).unwrap(),
            Some("a.smith@example.com".to_string())
        );
        assert_eq!(normalize_email("email", Some("   ")).unwrap(), None);
        assert_eq!(normalize_email("email", None).unwrap(), None);
        assert!(normalize_email("email", Some("no-at-sign")).is_err());
        assert!(normalize_email("email", Some("@example.com")).is_err());
        assert!(normalize_email("email", Some("a b@example.com")).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Ada ").unwrap(), "Ada");
        assert!(required_text("name", " \t").is_err());
    }
}
