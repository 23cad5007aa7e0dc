//! SQLite schema for the local replica
//!
//! Four domain tables (rooms, guests, reservations, users), each carrying
//! a `dirty` flag and an `updated_at` stamp in Unix milliseconds for the
//! reconciliation engine. CHECK constraints back the domain invariants so
//! that a bug above this layer fails loudly instead of persisting.

use rusqlite::{Connection, OptionalExtension, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version and replica identity
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT NOT NULL UNIQUE,
            room_type TEXT NOT NULL,
            price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'occupied', 'reserved', 'maintenance', 'cleaning')),
            amenities TEXT NOT NULL DEFAULT '[]',
            -- Occupant read model, written only by the room lifecycle
            occupant_reservation_id INTEGER REFERENCES reservations(id),
            occupant_name TEXT,
            occupant_check_in TEXT,
            occupant_check_out TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dirty INTEGER NOT NULL DEFAULT 1,
            CHECK ((status IN ('occupied', 'reserved')) = (occupant_reservation_id IS NOT NULL)),
            CHECK (occupant_reservation_id IS NULL OR (
                occupant_name IS NOT NULL
                AND occupant_check_in IS NOT NULL
                AND occupant_check_out IS NOT NULL))
        );

        CREATE TABLE IF NOT EXISTS guests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL CHECK (length(first_name) > 0),
            last_name TEXT NOT NULL CHECK (length(last_name) > 0),
            email TEXT UNIQUE,
            phone TEXT,
            address TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dirty INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guest_id INTEGER NOT NULL REFERENCES guests(id),
            room_id INTEGER NOT NULL REFERENCES rooms(id),
            check_in TEXT NOT NULL,
            check_out TEXT NOT NULL,
            total_cents INTEGER NOT NULL CHECK (total_cents >= 0),
            status TEXT NOT NULL
                CHECK (status IN ('confirmed', 'checked_in', 'completed', 'cancelled')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dirty INTEGER NOT NULL DEFAULT 1,
            CHECK (check_out > check_in)
        );

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL CHECK (length(full_name) > 0),
            role TEXT NOT NULL CHECK (role IN ('admin', 'manager', 'staff')),
            department TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dirty INTEGER NOT NULL DEFAULT 1
        );

        -- Filters used by list operations
        CREATE INDEX IF NOT EXISTS idx_rooms_status ON rooms(status);
        CREATE INDEX IF NOT EXISTS idx_reservations_room_status ON reservations(room_id, status);
        CREATE INDEX IF NOT EXISTS idx_reservations_guest ON reservations(guest_id);
        CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

        -- Dirty scans for the reconciliation engine
        CREATE INDEX IF NOT EXISTS idx_rooms_dirty ON rooms(dirty);
        CREATE INDEX IF NOT EXISTS idx_guests_dirty ON guests(dirty);
        CREATE INDEX IF NOT EXISTS idx_reservations_dirty ON reservations(dirty);
        CREATE INDEX IF NOT EXISTS idx_users_dirty ON users(dirty);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

/// Return the replica id, generating it on first call
///
/// The id identifies this local copy to the reconciliation engine and
/// never changes once written.
pub fn ensure_replica_id(conn: &Connection) -> Result<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'replica_id'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO schema_info (key, value) VALUES ('replica_id', ?)",
        [&id],
    )?;
    Ok(id)
}
