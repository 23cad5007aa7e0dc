//! Dirty tracking for the reconciliation engine
//!
//! Every local write sets `dirty = 1` and bumps `updated_at`. The
//! reconciler lists dirty rows, pushes them, then clears exactly the
//! versions it pushed: a row written again in between keeps its flag.

use rusqlite::{named_params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::EntityKind;

/// A dirty row and the version the reconciler observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub id: i64,
    /// `updated_at` in Unix milliseconds at listing time
    pub updated_at_ms: i64,
}

/// Number of dirty rows per entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyCounts {
    pub rooms: u64,
    pub guests: u64,
    pub reservations: u64,
    pub users: u64,
}

impl DirtyCounts {
    pub fn total(&self) -> u64 {
        self.rooms + self.guests + self.reservations + self.users
    }

    pub fn get(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Room => self.rooms,
            EntityKind::Guest => self.guests,
            EntityKind::Reservation => self.reservations,
            EntityKind::User => self.users,
        }
    }

    fn set(&mut self, kind: EntityKind, count: u64) {
        match kind {
            EntityKind::Room => self.rooms = count,
            EntityKind::Guest => self.guests = count,
            EntityKind::Reservation => self.reservations = count,
            EntityKind::User => self.users = count,
        }
    }
}

/// Dirty rows of one kind, ascending by id
pub(crate) fn list(conn: &Connection, kind: EntityKind) -> StoreResult<Vec<DirtyEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, updated_at FROM {} WHERE dirty = 1 ORDER BY id",
        kind.table()
    ))?;

    let entries = stmt
        .query_map([], |row| {
            Ok(DirtyEntry {
                id: row.get(0)?,
                updated_at_ms: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Clear the flag on rows still at the listed version
///
/// Unknown ids and rows modified since listing are skipped. Returns how
/// many rows were cleared. Clearing does not bump `updated_at`.
pub(crate) fn clear(
    conn: &Connection,
    kind: EntityKind,
    entries: &[DirtyEntry],
) -> StoreResult<usize> {
    let mut stmt = conn.prepare(&format!(
        "UPDATE {} SET dirty = 0 WHERE id = :id AND updated_at = :updated_at AND dirty = 1",
        kind.table()
    ))?;

    let mut cleared = 0;
    for entry in entries {
        cleared += stmt.execute(named_params! {
            ":id": entry.id,
            ":updated_at": entry.updated_at_ms,
        })?;
    }

    let skipped = entries.len() - cleared;
    if skipped > 0 {
        debug!(
            "Dirty clear for {}: cleared={}, skipped={} (modified or unknown)",
            kind, cleared, skipped
        );
    }
    Ok(cleared)
}

pub(crate) fn counts(conn: &Connection) -> StoreResult<DirtyCounts> {
    let mut counts = DirtyCounts::default();
    for kind in EntityKind::ALL {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE dirty = 1", kind.table()),
            [],
            |row| row.get(0),
        )?;
        let count = u64::try_from(count)
            .map_err(|_| StoreError::validation("count", "negative row count"))?;
        counts.set(kind, count);
    }
    Ok(counts)
}
