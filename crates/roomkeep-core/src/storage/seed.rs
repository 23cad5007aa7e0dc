//! Starter room catalog
//!
//! Seeded once, when the rooms table is empty. Each row is inserted with
//! `INSERT OR IGNORE` keyed by room number, so a repeated bootstrap can
//! never duplicate a room.

use rusqlite::{params, Connection, Result};

use crate::models::Money;

/// A row of the starter catalog
#[derive(Debug, Clone, Copy)]
pub struct SeedRoom {
    pub number: &'static str,
    pub room_type: &'static str,
    pub price_cents: i64,
    pub amenities: &'static [&'static str],
}

impl SeedRoom {
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

pub const STARTER_ROOMS: [SeedRoom; 9] = [
    SeedRoom {
        number: "101",
        room_type: "Single",
        price_cents: 8_000,
        amenities: &["WiFi", "TV"],
    },
    SeedRoom {
        number: "102",
        room_type: "Single",
        price_cents: 8_000,
        amenities: &["WiFi", "TV"],
    },
    SeedRoom {
        number: "103",
        room_type: "Double",
        price_cents: 12_000,
        amenities: &["WiFi", "TV", "Minibar"],
    },
    SeedRoom {
        number: "104",
        room_type: "Double",
        price_cents: 12_000,
        amenities: &["WiFi", "TV", "Minibar"],
    },
    SeedRoom {
        number: "105",
        room_type: "Deluxe",
        price_cents: 18_000,
        amenities: &["WiFi", "TV", "Minibar", "Balcony"],
    },
    SeedRoom {
        number: "201",
        room_type: "Double",
        price_cents: 13_000,
        amenities: &["WiFi", "TV", "Minibar"],
    },
    SeedRoom {
        number: "202",
        room_type: "Deluxe",
        price_cents: 19_000,
        amenities: &["WiFi", "TV", "Minibar", "Balcony"],
    },
    SeedRoom {
        number: "203",
        room_type: "Suite",
        price_cents: 30_000,
        amenities: &["WiFi", "TV", "Minibar", "Balcony", "Jacuzzi"],
    },
    SeedRoom {
        number: "204",
        room_type: "Suite",
        price_cents: 32_000,
        amenities: &["WiFi", "TV", "Minibar", "Balcony", "Jacuzzi", "Kitchen"],
    },
];

/// Seed the starter catalog into an empty rooms table
///
/// Returns the number of rows inserted. Seed rows are reference data
/// shared with the remote system, so they start clean.
pub fn seed_rooms(conn: &Connection, now_ms: i64) -> Result<usize> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }

    let mut stmt = conn.prepare(
        r#"
        INSERT OR IGNORE INTO rooms
            (number, room_type, price_cents, status, amenities, created_at, updated_at, dirty)
        VALUES (?, ?, ?, 'available', ?, ?, ?, 0)
        "#,
    )?;

    let mut inserted = 0;
    for room in &STARTER_ROOMS {
        let amenities = serde_json::to_string(room.amenities)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        inserted += stmt.execute(params![
            room.number,
            room.room_type,
            room.price_cents,
            amenities,
            now_ms,
            now_ms,
        ])?;
    }

    Ok(inserted)
}
