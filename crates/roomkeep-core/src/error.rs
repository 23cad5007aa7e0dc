//! Store error handling
//!
//! Provides typed errors for every store operation with descriptive
//! messages and recovery suggestions. Each variant belongs to one
//! [`ErrorKind`], which is what callers branch on.

use std::fmt;

use chrono::NaiveDate;
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::lifecycle::RoomEvent;
use crate::models::{EntityKind, ReservationId, ReservationStatus, RoomStatus};

/// Coarse error classification exposed to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Engine could not be created or opened; fatal
    Init,
    /// Operation attempted before initialization completed
    NotReady,
    /// Caller-supplied data violates a field constraint
    Validation,
    /// The room lifecycle rejected an event
    InvalidTransition,
    /// Referenced id does not exist
    NotFound,
    /// Underlying engine failure; possibly transient
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Init => "init",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Bootstrap failed; the store is unusable
    #[error("Store could not be initialized: {details}")]
    Init { details: String },

    /// Bootstrap has not finished yet
    #[error("Store is not ready yet; wait for initialization to finish")]
    NotReady,

    /// Field constraint violated
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Event not valid in the room's current status
    #[error("Cannot {event} room {room_number}: room is {status}")]
    InvalidTransition {
        room_number: String,
        status: RoomStatus,
        event: RoomEvent,
    },

    /// Direct status write that needs a guest or reservation
    #[error("Room status cannot be set to {requested} directly; use the {event} operation")]
    StatusRequiresEvent {
        requested: RoomStatus,
        event: RoomEvent,
    },

    /// Reservation is not in a status that allows the action
    #[error("Reservation {reservation_id} is {status} and cannot be {action}")]
    ReservationState {
        reservation_id: ReservationId,
        status: ReservationStatus,
        action: &'static str,
    },

    /// Active reservation already holds the room for overlapping dates
    #[error(
        "Room {room_number} is already booked from {check_in} to {check_out} (reservation {reservation_id})"
    )]
    BookingConflict {
        room_number: String,
        reservation_id: ReservationId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// Referenced record does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// SQLite engine error
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Init { .. } => ErrorKind::Init,
            StoreError::NotReady => ErrorKind::NotReady,
            StoreError::Validation { .. } => ErrorKind::Validation,
            StoreError::InvalidTransition { .. }
            | StoreError::StatusRequiresEvent { .. }
            | StoreError::ReservationState { .. }
            | StoreError::BookingConflict { .. } => ErrorKind::InvalidTransition,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Check if the caller can fix this by changing input or retrying
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Init)
    }

    /// Check if retrying the same call may succeed
    ///
    /// Only a busy or locked engine qualifies; the core never retries on
    /// its own.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NotReady => true,
            StoreError::Storage(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Init => {
                Some("Check that the data directory exists and is writable, then restart.")
            }
            ErrorKind::NotReady => Some("Wait for initialization to complete and try again."),
            ErrorKind::Validation => Some("Correct the highlighted field and submit again."),
            ErrorKind::InvalidTransition => {
                Some("Refresh the room board; the room changed since it was displayed.")
            }
            ErrorKind::NotFound => None,
            ErrorKind::Storage if self.is_transient() => {
                Some("The database is busy. Try again in a moment.")
            }
            ErrorKind::Storage => Some("Free up disk space or check file permissions."),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
