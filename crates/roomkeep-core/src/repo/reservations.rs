//! Reservation repository
//!
//! Status changes are not exposed here except to the room lifecycle
//! (`set_status`). Every path that creates or moves an active
//! reservation runs [`find_conflict`] first.

use chrono::NaiveDate;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{guests, rooms, timestamp, TOUCH};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    validate_dates, EntityKind, GuestId, Money, NewReservation, Occupant, Reservation,
    ReservationFilter, ReservationId, ReservationPatch, ReservationStatus, Room, RoomId,
};

const COLUMNS: &str = "id, guest_id, room_id, check_in, check_out, total_cents, status, \
     created_at, updated_at, dirty";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        guest_id: row.get(1)?,
        room_id: row.get(2)?,
        check_in: row.get(3)?,
        check_out: row.get(4)?,
        total_amount: row.get(5)?,
        status: row.get(6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
        dirty: row.get(9)?,
    })
}

/// Columns of a reservation row about to be inserted
pub(crate) struct ReservationRow {
    pub guest_id: GuestId,
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_amount: Money,
    pub status: ReservationStatus,
}

pub(crate) fn insert_row(
    conn: &Connection,
    row: &ReservationRow,
    now: i64,
) -> StoreResult<ReservationId> {
    conn.execute(
        r#"
        INSERT INTO reservations
            (guest_id, room_id, check_in, check_out, total_cents, status,
             created_at, updated_at, dirty)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
        "#,
        params![
            row.guest_id,
            row.room_id,
            row.check_in,
            row.check_out,
            row.total_amount,
            row.status,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!(
        "Inserted reservation id={} room={} status={}",
        id, row.room_id, row.status
    );
    Ok(id)
}

/// Book a room ahead of time without touching its status
pub(crate) fn insert(
    conn: &Connection,
    reservation: &NewReservation,
    now: i64,
) -> StoreResult<ReservationId> {
    reservation.validate()?;
    let room = rooms::get_required(conn, reservation.room_id)?;
    guests::get_required(conn, reservation.guest_id)?;
    ensure_no_conflict(
        conn,
        &room,
        reservation.check_in,
        reservation.check_out,
        None,
    )?;

    insert_row(
        conn,
        &ReservationRow {
            guest_id: reservation.guest_id,
            room_id: reservation.room_id,
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            total_amount: reservation.total_amount,
            status: ReservationStatus::Confirmed,
        },
        now,
    )
}

pub(crate) fn get(conn: &Connection, id: ReservationId) -> StoreResult<Option<Reservation>> {
    let reservation = conn
        .query_row(
            &format!("SELECT {} FROM reservations WHERE id = ?", COLUMNS),
            params![id],
            map_row,
        )
        .optional()?;
    Ok(reservation)
}

pub(crate) fn get_required(conn: &Connection, id: ReservationId) -> StoreResult<Reservation> {
    get(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::Reservation, id))
}

/// List reservations ordered by check-in date
pub(crate) fn list(
    conn: &Connection,
    filter: &ReservationFilter,
) -> StoreResult<Vec<Reservation>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM reservations
        WHERE (:room_id IS NULL OR room_id = :room_id)
          AND (:guest_id IS NULL OR guest_id = :guest_id)
          AND (:status IS NULL OR status = :status)
        ORDER BY check_in, id
        "#,
        COLUMNS
    ))?;

    let reservations = stmt
        .query_map(
            named_params! {
                ":room_id": filter.room_id,
                ":guest_id": filter.guest_id,
                ":status": filter.status,
            },
            map_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reservations)
}

/// Find an active reservation on the room whose dates overlap
///
/// Ranges are half-open: a check-out day may be the next check-in day.
pub(crate) fn find_conflict(
    conn: &Connection,
    room_id: RoomId,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude: Option<ReservationId>,
) -> StoreResult<Option<Reservation>> {
    let reservation = conn
        .query_row(
            &format!(
                r#"
                SELECT {} FROM reservations
                WHERE room_id = :room_id
                  AND status IN ('confirmed', 'checked_in')
                  AND check_in < :check_out
                  AND check_out > :check_in
                  AND (:exclude IS NULL OR id != :exclude)
                ORDER BY check_in
                LIMIT 1
                "#,
                COLUMNS
            ),
            named_params! {
                ":room_id": room_id,
                ":check_in": check_in,
                ":check_out": check_out,
                ":exclude": exclude,
            },
            map_row,
        )
        .optional()?;
    Ok(reservation)
}

/// Find a reservation on the room in `status` that no room caches
///
/// A room sent to maintenance mid-stay drops its occupant, leaving the
/// reservation behind; bookings made ahead with `insert` start out this
/// way too. `dates` narrows the match to an exact stay.
pub(crate) fn find_detached(
    conn: &Connection,
    room_id: RoomId,
    status: ReservationStatus,
    dates: Option<(NaiveDate, NaiveDate)>,
) -> StoreResult<Option<Reservation>> {
    let reservation = conn
        .query_row(
            &format!(
                r#"
                SELECT {} FROM reservations
                WHERE room_id = :room_id
                  AND status = :status
                  AND (:check_in IS NULL OR check_in = :check_in)
                  AND (:check_out IS NULL OR check_out = :check_out)
                  AND id NOT IN (
                      SELECT occupant_reservation_id FROM rooms
                      WHERE occupant_reservation_id IS NOT NULL
                  )
                ORDER BY check_in, id
                LIMIT 1
                "#,
                COLUMNS
            ),
            named_params! {
                ":room_id": room_id,
                ":status": status,
                ":check_in": dates.map(|(check_in, _)| check_in),
                ":check_out": dates.map(|(_, check_out)| check_out),
            },
            map_row,
        )
        .optional()?;
    Ok(reservation)
}

pub(crate) fn ensure_no_conflict(
    conn: &Connection,
    room: &Room,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude: Option<ReservationId>,
) -> StoreResult<()> {
    match find_conflict(conn, room.id, check_in, check_out, exclude)? {
        Some(existing) => Err(StoreError::BookingConflict {
            room_number: room.number.clone(),
            reservation_id: existing.id,
            check_in: existing.check_in,
            check_out: existing.check_out,
        }),
        None => Ok(()),
    }
}

/// Move a reservation to a new status; room lifecycle only
pub(crate) fn set_status(
    conn: &Connection,
    id: ReservationId,
    status: ReservationStatus,
    now: i64,
) -> StoreResult<()> {
    conn.execute(
        &format!(
            "UPDATE reservations SET status = :status, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":status": status,
            ":now": now,
            ":id": id,
        },
    )?;
    Ok(())
}

/// Apply a patch to guest, dates or amount
///
/// Only active reservations can move in time or change guest. When the
/// reservation is the one cached on its room, the room's occupant is
/// refreshed in the same transaction.
pub(crate) fn update(
    conn: &Connection,
    id: ReservationId,
    patch: &ReservationPatch,
    now: i64,
) -> StoreResult<Reservation> {
    patch.validate_amount()?;
    let mut reservation = get_required(conn, id)?;

    if patch.changes_stay() && !reservation.status.is_active() {
        return Err(StoreError::ReservationState {
            reservation_id: id,
            status: reservation.status,
            action: "rescheduled",
        });
    }

    if let Some(guest_id) = patch.guest_id {
        guests::get_required(conn, guest_id)?;
        reservation.guest_id = guest_id;
    }
    if let Some(check_in) = patch.check_in {
        reservation.check_in = check_in;
    }
    if let Some(check_out) = patch.check_out {
        reservation.check_out = check_out;
    }
    if let Some(total) = patch.total_amount {
        reservation.total_amount = total;
    }
    validate_dates(reservation.check_in, reservation.check_out)?;

    if reservation.status.is_active() {
        let room = rooms::get_required(conn, reservation.room_id)?;
        ensure_no_conflict(
            conn,
            &room,
            reservation.check_in,
            reservation.check_out,
            Some(id),
        )?;
    }

    conn.execute(
        &format!(
            "UPDATE reservations SET guest_id = :guest_id, check_in = :check_in, \
             check_out = :check_out, total_cents = :total, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":guest_id": reservation.guest_id,
            ":check_in": reservation.check_in,
            ":check_out": reservation.check_out,
            ":total": reservation.total_amount,
            ":now": now,
            ":id": id,
        },
    )?;

    if patch.changes_stay() {
        if let Some(room) = rooms::find_by_occupant(conn, id)? {
            let guest = guests::get_required(conn, reservation.guest_id)?;
            let occupant = Occupant {
                reservation_id: id,
                guest_name: guest.full_name(),
                check_in: reservation.check_in,
                check_out: reservation.check_out,
            };
            rooms::set_status(conn, room.id, room.status, Some(&occupant), now)?;
        }
    }

    get_required(conn, id)
}
