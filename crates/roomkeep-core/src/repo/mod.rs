//! Entity repositories
//!
//! Synchronous CRUD over a borrowed connection. Every function here runs
//! inside a transaction opened by [`crate::Store`], so a repository call
//! and the lifecycle writes around it commit or roll back together.
//!
//! Each entity has exactly one row-mapping function (`map_row`) paired
//! with a column list constant; queries select that list and nothing else.

pub(crate) mod guests;
pub(crate) mod reservations;
pub(crate) mod rooms;
pub(crate) mod users;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::models::{Money, ReservationStatus, RoomStatus, UserRole};

/// SQL fragment that marks a row as locally modified
///
/// `updated_at` strictly increases per row even when two writes land in
/// the same millisecond, which the optimistic dirty-clear relies on.
pub(crate) const TOUCH: &str = "dirty = 1, updated_at = MAX(:now, updated_at + 1)";

/// Current time in Unix milliseconds
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Read a Unix-millisecond column as a UTC timestamp
///
/// Values chrono cannot represent are a decode error rather than a
/// substitute, so the in-memory stamp always matches the stored one.
pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(FromSqlError::OutOfRange(ms)),
        )
    })
}

/// Wrap a decode failure for column `idx`
pub(crate) fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(Money::from_cents)
    }
}

macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(RoomStatus);
text_enum_sql!(ReservationStatus);
text_enum_sql!(UserRole);
