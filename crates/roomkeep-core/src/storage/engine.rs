//! Engine bootstrap
//!
//! Opens the SQLite connection, applies the schema and seeds the starter
//! catalog inside one transaction. A failed bootstrap leaves nothing
//! half-built behind: the transaction rolls back and the caller gets the
//! full error chain.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::storage::schema::{ensure_replica_id, init_schema, needs_init};
use crate::storage::seed::seed_rooms;

/// Where the engine keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLocation {
    File(PathBuf),
    Memory,
}

/// A freshly bootstrapped engine
#[derive(Debug)]
pub struct Bootstrap {
    pub conn: Connection,
    pub replica_id: String,
    pub seeded_rooms: usize,
}

/// Open the engine and bring its schema and seed data up to date
pub fn bootstrap(location: &EngineLocation, now_ms: i64) -> Result<Bootstrap> {
    let mut conn = open_connection(location)?;

    let tx = conn.transaction()?;
    if needs_init(&tx) {
        init_schema(&tx).context("Failed to initialize SQLite schema")?;
    }
    let seeded_rooms = seed_rooms(&tx, now_ms).context("Failed to seed starter rooms")?;
    let replica_id = ensure_replica_id(&tx).context("Failed to record replica id")?;
    tx.commit().context("Failed to commit bootstrap")?;

    info!(
        "Store bootstrapped (replica={}, seeded_rooms={})",
        replica_id, seeded_rooms
    );

    Ok(Bootstrap {
        conn,
        replica_id,
        seeded_rooms,
    })
}

fn open_connection(location: &EngineLocation) -> Result<Connection> {
    let conn = match location {
        EngineLocation::Memory => Connection::open_in_memory()?,
        EngineLocation::File(path) => {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }

            let conn = Connection::open(path)
                .with_context(|| format!("Failed to open SQLite database at {:?}", path))?;
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!("Opened {:?} (journal_mode={})", path, mode);
            conn
        }
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_in_memory() {
        let boot = bootstrap(&EngineLocation::Memory, 1).unwrap();
        assert_eq!(boot.seeded_rooms, 9);
        assert!(!boot.replica_id.is_empty());
    }

    #[test]
    fn test_bootstrap_file_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let location = EngineLocation::File(temp_dir.path().join("nested").join("hotel.db"));

        let first = bootstrap(&location, 1).unwrap();
        let replica_id = first.replica_id.clone();
        drop(first);

        let second = bootstrap(&location, 2).unwrap();
        assert_eq!(second.seeded_rooms, 0);
        assert_eq!(second.replica_id, replica_id);

        let count: i64 = second
            .conn
            .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn test_bootstrap_fails_when_directory_cannot_be_created() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let location = EngineLocation::File(blocker.join("hotel.db"));
        let err = bootstrap(&location, 1).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to create directory"));
    }
}
