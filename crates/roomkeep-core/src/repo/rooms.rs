//! Room repository

use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{conversion_error, timestamp, TOUCH};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    EntityKind, NewRoom, Occupant, ReservationId, Room, RoomFilter, RoomId, RoomStatus,
};

const COLUMNS: &str = "id, number, room_type, price_cents, status, amenities, \
     occupant_reservation_id, occupant_name, occupant_check_in, occupant_check_out, \
     created_at, updated_at, dirty";

/// Map a row selected with [`COLUMNS`] to a room
fn map_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    let amenities: String = row.get(5)?;
    let amenities: Vec<String> =
        serde_json::from_str(&amenities).map_err(|e| conversion_error(5, e))?;

    let occupant_reservation: Option<ReservationId> = row.get(6)?;
    let occupant = match occupant_reservation {
        Some(reservation_id) => Some(Occupant {
            reservation_id,
            guest_name: row.get(7)?,
            check_in: row.get(8)?,
            check_out: row.get(9)?,
        }),
        None => None,
    };

    Ok(Room {
        id: row.get(0)?,
        number: row.get(1)?,
        room_type: row.get(2)?,
        price_per_night: row.get(3)?,
        status: row.get(4)?,
        amenities,
        occupant,
        created_at: timestamp(row, 10)?,
        updated_at: timestamp(row, 11)?,
        dirty: row.get(12)?,
    })
}

fn amenities_json(amenities: &[String]) -> StoreResult<String> {
    serde_json::to_string(amenities)
        .map_err(|e| StoreError::Storage(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))
}

/// Insert a validated room; new rooms start available
pub(crate) fn insert(conn: &Connection, room: &NewRoom, now: i64) -> StoreResult<RoomId> {
    if get_by_number(conn, &room.number)?.is_some() {
        return Err(StoreError::validation(
            "number",
            format!("room {} already exists", room.number),
        ));
    }

    conn.execute(
        r#"
        INSERT INTO rooms
            (number, room_type, price_cents, status, amenities, created_at, updated_at, dirty)
        VALUES (?, ?, ?, 'available', ?, ?, ?, 1)
        "#,
        params![
            room.number,
            room.room_type,
            room.price_per_night,
            amenities_json(&room.amenities)?,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!("Inserted room {} (id={})", room.number, id);
    Ok(id)
}

pub(crate) fn get(conn: &Connection, id: RoomId) -> StoreResult<Option<Room>> {
    let room = conn
        .query_row(
            &format!("SELECT {} FROM rooms WHERE id = ?", COLUMNS),
            params![id],
            map_row,
        )
        .optional()?;
    Ok(room)
}

pub(crate) fn get_required(conn: &Connection, id: RoomId) -> StoreResult<Room> {
    get(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::Room, id))
}

pub(crate) fn get_by_number(conn: &Connection, number: &str) -> StoreResult<Option<Room>> {
    let room = conn
        .query_row(
            &format!("SELECT {} FROM rooms WHERE number = ?", COLUMNS),
            params![number.trim()],
            map_row,
        )
        .optional()?;
    Ok(room)
}

/// List rooms ordered by room number (numeric where possible)
pub(crate) fn list(conn: &Connection, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM rooms
        WHERE (:status IS NULL OR status = :status)
          AND (:room_type IS NULL OR room_type = :room_type COLLATE NOCASE)
        ORDER BY CAST(number AS INTEGER), number
        "#,
        COLUMNS
    ))?;

    let rooms = stmt
        .query_map(
            named_params! {
                ":status": filter.status,
                ":room_type": filter.room_type.as_deref(),
            },
            map_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rooms)
}

/// Persist the descriptive columns of a room (never status or occupant)
pub(crate) fn save_details(conn: &Connection, room: &Room, now: i64) -> StoreResult<()> {
    conn.execute(
        &format!(
            "UPDATE rooms SET room_type = :room_type, price_cents = :price, \
             amenities = :amenities, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":room_type": room.room_type,
            ":price": room.price_per_night,
            ":amenities": amenities_json(&room.amenities)?,
            ":now": now,
            ":id": room.id,
        },
    )?;
    Ok(())
}

/// Write status and occupant together
///
/// Only the room lifecycle calls this; the schema rejects a status that
/// disagrees with the occupant.
pub(crate) fn set_status(
    conn: &Connection,
    id: RoomId,
    status: RoomStatus,
    occupant: Option<&Occupant>,
    now: i64,
) -> StoreResult<()> {
    conn.execute(
        &format!(
            "UPDATE rooms SET status = :status, occupant_reservation_id = :reservation, \
             occupant_name = :name, occupant_check_in = :check_in, \
             occupant_check_out = :check_out, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":status": status,
            ":reservation": occupant.map(|o| o.reservation_id),
            ":name": occupant.map(|o| o.guest_name.as_str()),
            ":check_in": occupant.map(|o| o.check_in),
            ":check_out": occupant.map(|o| o.check_out),
            ":now": now,
            ":id": id,
        },
    )?;
    Ok(())
}

/// Refresh the cached guest name on rooms showing any of the guest's stays
pub(crate) fn refresh_occupant_name(
    conn: &Connection,
    guest_id: i64,
    guest_name: &str,
    now: i64,
) -> StoreResult<usize> {
    let changed = conn.execute(
        &format!(
            "UPDATE rooms SET occupant_name = :name, {} \
             WHERE occupant_reservation_id IN (SELECT id FROM reservations WHERE guest_id = :guest) \
               AND occupant_name IS NOT :name",
            TOUCH
        ),
        named_params! {
            ":name": guest_name,
            ":now": now,
            ":guest": guest_id,
        },
    )?;
    Ok(changed)
}

/// Find the room that currently caches the given reservation
pub(crate) fn find_by_occupant(
    conn: &Connection,
    reservation_id: ReservationId,
) -> StoreResult<Option<Room>> {
    let room = conn
        .query_row(
            &format!(
                "SELECT {} FROM rooms WHERE occupant_reservation_id = ?",
                COLUMNS
            ),
            params![reservation_id],
            map_row,
        )
        .optional()?;
    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::storage::{init_schema, seed_rooms};
    use chrono::NaiveDate;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        seed_rooms(&conn, 1).unwrap();
        conn
    }

    #[test]
    fn test_list_is_ordered_by_number() {
        let conn = seeded();
        insert(&conn, &NewRoom::new("99", "Single", Money::from_units(60)), 5).unwrap();

        let numbers: Vec<String> = list(&conn, &RoomFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(
            numbers,
            vec!["99", "101", "102", "103", "104", "105", "201", "202", "203", "204"]
        );
    }

    #[test]
    fn test_list_filters() {
        let conn = seeded();
        let suites = list(
            &conn,
            &RoomFilter {
                room_type: Some("suite".to_string()),
                ..RoomFilter::default()
            },
        )
        .unwrap();
        assert_eq!(suites.len(), 2);

        let available = list(&conn, &RoomFilter::status(RoomStatus::Available)).unwrap();
        assert_eq!(available.len(), 9);
        let occupied = list(&conn, &RoomFilter::status(RoomStatus::Occupied)).unwrap();
        assert!(occupied.is_empty());
    }

    #[test]
    fn test_insert_marks_dirty_and_rejects_duplicate_number() {
        let conn = seeded();
        let id = insert(
            &conn,
            &NewRoom::new("301", "Suite", Money::from_units(280)).with_amenities(["WiFi"]),
            10,
        )
        .unwrap();

        let room = get_required(&conn, id).unwrap();
        assert!(room.dirty);
        assert_eq!(room.status, RoomStatus::Available);
        assert_eq!(room.amenities, vec!["WiFi"]);

        let err = insert(&conn, &NewRoom::new("301", "Suite", Money::ZERO), 11).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "number", .. }));
    }

    #[test]
    fn test_touch_strictly_increases_updated_at() {
        let conn = seeded();
        let mut room = get_by_number(&conn, "101").unwrap().unwrap();
        let before = room.updated_at;

        // Same "now" as the seed stamp
        room.room_type = "Single Plus".to_string();
        save_details(&conn, &room, 1).unwrap();

        let after = get_required(&conn, room.id).unwrap();
        assert!(after.updated_at > before);
        assert!(after.dirty);
    }

    #[test]
    fn test_set_status_with_occupant_maps_back() {
        let conn = seeded();
        conn.execute_batch(
            "INSERT INTO guests (first_name, last_name, created_at, updated_at) VALUES ('A.', 'Smith', 0, 0);
             INSERT INTO reservations (guest_id, room_id, check_in, check_out, total_cents, status, created_at, updated_at)
             VALUES (1, 1, '2024-01-10', '2024-01-12', 16000, 'confirmed', 0, 0);",
        )
        .unwrap();

        let occupant = Occupant {
            reservation_id: 1,
            guest_name: "A. Smith".to_string(),
            check_in: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
        };
        set_status(&conn, 1, RoomStatus::Reserved, Some(&occupant), 5).unwrap();

        let room = get_required(&conn, 1).unwrap();
        assert_eq!(room.status, RoomStatus::Reserved);
        assert_eq!(room.occupant, Some(occupant));
        assert_eq!(find_by_occupant(&conn, 1).unwrap().unwrap().id, 1);

        // Schema refuses an occupied room with no occupant
        assert!(set_status(&conn, 1, RoomStatus::Occupied, None, 6).is_err());
    }

    #[test]
    fn test_get_missing_room() {
        let conn = seeded();
        assert!(get(&conn, 999).unwrap().is_none());
        assert!(matches!(
            get_required(&conn, 999),
            Err(StoreError::NotFound {
                kind: EntityKind::Room,
                ..
            })
        ));
    }
}
