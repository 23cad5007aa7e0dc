//! Room lifecycle
//!
//! The only writer of `rooms.status` and the occupant read model. Each
//! event is checked against [`transition`] first; side effects on the
//! reservation table happen in the caller's transaction, so a failure at
//! any step leaves both tables untouched.
//!
//! | From                  | Event          | To          |
//! |-----------------------|----------------|-------------|
//! | Available             | reserve        | Reserved    |
//! | Reserved              | check in       | Occupied    |
//! | Available             | check in       | Occupied    |
//! | Occupied              | check out      | Available   |
//! | any                   | maintenance    | Maintenance |
//! | Maintenance, Cleaning | make available | Available   |
//! | Available, Maintenance| clean          | Cleaning    |
//! | Reserved              | cancel         | Available   |

use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    GuestRef, Occupant, Reservation, ReservationId, ReservationStatus, Room, RoomId, RoomStatus,
    StayRequest,
};
use crate::repo::reservations::{self, ReservationRow};
use crate::repo::{guests, rooms};

/// Events the front desk can apply to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEvent {
    Reserve,
    CheckIn,
    CheckOut,
    SetMaintenance,
    SetAvailable,
    SetCleaning,
    Cancel,
}

impl RoomEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomEvent::Reserve => "reserve",
            RoomEvent::CheckIn => "check in",
            RoomEvent::CheckOut => "check out",
            RoomEvent::SetMaintenance => "put under maintenance",
            RoomEvent::SetAvailable => "make available",
            RoomEvent::SetCleaning => "clean",
            RoomEvent::Cancel => "cancel",
        }
    }
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next status for `event` in status `from`, or `None` if not allowed
pub fn transition(from: RoomStatus, event: RoomEvent) -> Option<RoomStatus> {
    use RoomEvent::*;
    use RoomStatus::*;

    match (from, event) {
        (Available, Reserve) => Some(Reserved),
        (Reserved | Available, CheckIn) => Some(Occupied),
        (Occupied, CheckOut) => Some(Available),
        (_, SetMaintenance) => Some(Maintenance),
        (Maintenance | Cleaning, SetAvailable) => Some(Available),
        (Available | Maintenance, SetCleaning) => Some(Cleaning),
        (Reserved, Cancel) => Some(Available),
        _ => None,
    }
}

impl RoomStatus {
    /// Status after `event`, or `None` if the event is not allowed here
    pub fn on(self, event: RoomEvent) -> Option<RoomStatus> {
        transition(self, event)
    }
}

/// Result of a lifecycle event: the room after the event and the
/// reservation it touched, if any
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub room: Room,
    pub reservation: Option<Reservation>,
}

fn require(room: &Room, event: RoomEvent) -> StoreResult<RoomStatus> {
    room.status.on(event).ok_or_else(|| StoreError::InvalidTransition {
        room_number: room.number.clone(),
        status: room.status,
        event,
    })
}

fn log_transition(room: &Room, from: RoomStatus, event: RoomEvent) {
    info!(
        "Room {} {} -> {} ({})",
        room.number,
        from,
        room.status,
        event.as_str()
    );
}

/// Reserve an available room for a guest
pub(crate) fn reserve(
    conn: &Connection,
    room_id: RoomId,
    stay: &StayRequest,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    stay.validate()?;
    let room = rooms::get_required(conn, room_id)?;
    let to = require(&room, RoomEvent::Reserve)?;
    book(conn, &room, to, stay, ReservationStatus::Confirmed, now)
}

/// Check a guest in
///
/// A reserved room promotes its confirmed reservation and ignores `stay`.
/// An available room needs `stay`: a confirmed booking for the same guest
/// and dates that no room caches is promoted, anything else is a walk-in.
pub(crate) fn check_in(
    conn: &Connection,
    room_id: RoomId,
    stay: Option<&StayRequest>,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    let room = rooms::get_required(conn, room_id)?;
    let to = require(&room, RoomEvent::CheckIn)?;

    if room.status == RoomStatus::Available {
        let stay = stay.ok_or_else(|| {
            StoreError::validation(
                "stay",
                "guest and dates are required to check in to an available room",
            )
        })?;
        stay.validate()?;
        if let Some(booked) = booked_stay(conn, &room, stay)? {
            return promote(conn, &room, to, booked, now);
        }
        return book(conn, &room, to, stay, ReservationStatus::CheckedIn, now);
    }

    // Reserved: the occupant always points at the confirmed reservation
    let occupant = room
        .occupant
        .clone()
        .ok_or_else(|| StoreError::validation("room", "reserved room has no occupant"))?;
    let reservation = reservations::get_required(conn, occupant.reservation_id)?;
    if reservation.status != ReservationStatus::Confirmed {
        return Err(StoreError::ReservationState {
            reservation_id: reservation.id,
            status: reservation.status,
            action: "checked in",
        });
    }

    reservations::set_status(conn, reservation.id, ReservationStatus::CheckedIn, now)?;
    rooms::set_status(conn, room.id, to, Some(&occupant), now)?;
    finish(conn, &room, RoomEvent::CheckIn, Some(reservation.id))
}

/// Confirmed booking on the room matching the stay's dates and guest
fn booked_stay(
    conn: &Connection,
    room: &Room,
    stay: &StayRequest,
) -> StoreResult<Option<Reservation>> {
    let Some(booked) = reservations::find_detached(
        conn,
        room.id,
        ReservationStatus::Confirmed,
        Some((stay.check_in, stay.check_out)),
    )?
    else {
        return Ok(None);
    };

    let same_guest = match stay.guest {
        GuestRef::Existing(id) => id == booked.guest_id,
        GuestRef::New(ref new_guest) => {
            let guest = guests::get_required(conn, booked.guest_id)?;
            guest
                .first_name
                .eq_ignore_ascii_case(new_guest.first_name.trim())
                && guest
                    .last_name
                    .eq_ignore_ascii_case(new_guest.last_name.trim())
        }
    };
    Ok(same_guest.then_some(booked))
}

/// Check in a confirmed booking the room does not cache yet
fn promote(
    conn: &Connection,
    room: &Room,
    to: RoomStatus,
    reservation: Reservation,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    let guest = guests::get_required(conn, reservation.guest_id)?;
    let occupant = Occupant {
        reservation_id: reservation.id,
        guest_name: guest.full_name(),
        check_in: reservation.check_in,
        check_out: reservation.check_out,
    };

    reservations::set_status(conn, reservation.id, ReservationStatus::CheckedIn, now)?;
    rooms::set_status(conn, room.id, to, Some(&occupant), now)?;
    finish(conn, room, RoomEvent::CheckIn, Some(reservation.id))
}

/// Check the guest out and free the room
///
/// On a room that is not occupied, a checked-in stay no room caches is
/// completed instead and the room keeps its status.
pub(crate) fn check_out(
    conn: &Connection,
    room_id: RoomId,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    let room = rooms::get_required(conn, room_id)?;

    // A stay left behind by maintenance is closed without moving the room
    if room.status != RoomStatus::Occupied {
        let stranded =
            reservations::find_detached(conn, room.id, ReservationStatus::CheckedIn, None)?;
        if let Some(stranded) = stranded {
            reservations::set_status(conn, stranded.id, ReservationStatus::Completed, now)?;
            info!(
                "Reservation {} completed; room {} stays {}",
                stranded.id, room.number, room.status
            );
            return Ok(TransitionOutcome {
                room,
                reservation: Some(reservations::get_required(conn, stranded.id)?),
            });
        }
    }

    let to = require(&room, RoomEvent::CheckOut)?;

    let mut completed = None;
    if let Some(ref occupant) = room.occupant {
        match reservations::get(conn, occupant.reservation_id)? {
            Some(reservation) if reservation.status == ReservationStatus::CheckedIn => {
                reservations::set_status(conn, reservation.id, ReservationStatus::Completed, now)?;
                completed = Some(reservation.id);
            }
            other => warn!(
                "Room {} checked out without a checked-in reservation (cached={}, found={:?})",
                room.number,
                occupant.reservation_id,
                other.map(|r| r.status)
            ),
        }
    }

    rooms::set_status(conn, room.id, to, None, now)?;
    finish(conn, &room, RoomEvent::CheckOut, completed)
}

/// Apply an event with no reservation side effect
///
/// Used for maintenance, cleaning and making a room available. The
/// occupant cache is cleared because none of those statuses carries one;
/// any reservation stays as it was until [`check_in`], [`check_out`] or
/// [`cancel`] picks it up again.
pub(crate) fn apply_housekeeping(
    conn: &Connection,
    room_id: RoomId,
    event: RoomEvent,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    debug_assert!(matches!(
        event,
        RoomEvent::SetMaintenance | RoomEvent::SetAvailable | RoomEvent::SetCleaning
    ));
    let room = rooms::get_required(conn, room_id)?;
    let to = require(&room, event)?;

    rooms::set_status(conn, room.id, to, None, now)?;
    finish(conn, &room, event, None)
}

/// Cancel a confirmed reservation
///
/// If the reservation is the one cached on a reserved room, the room
/// goes back to available in the same transaction.
pub(crate) fn cancel(
    conn: &Connection,
    reservation_id: ReservationId,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    let reservation = reservations::get_required(conn, reservation_id)?;
    if reservation.status != ReservationStatus::Confirmed {
        return Err(StoreError::ReservationState {
            reservation_id,
            status: reservation.status,
            action: "cancelled",
        });
    }

    let room = rooms::get_required(conn, reservation.room_id)?;
    let caches_it = room
        .occupant
        .as_ref()
        .is_some_and(|o| o.reservation_id == reservation_id);

    reservations::set_status(conn, reservation_id, ReservationStatus::Cancelled, now)?;

    if caches_it && room.status == RoomStatus::Reserved {
        let to = require(&room, RoomEvent::Cancel)?;
        rooms::set_status(conn, room.id, to, None, now)?;
        return finish(conn, &room, RoomEvent::Cancel, Some(reservation_id));
    }

    info!(
        "Reservation {} cancelled; room {} stays {}",
        reservation_id, room.number, room.status
    );
    Ok(TransitionOutcome {
        room,
        reservation: Some(reservations::get_required(conn, reservation_id)?),
    })
}

/// Route a direct status write from a room patch
///
/// Only housekeeping statuses can be written this way; reserving and
/// occupying need a guest and go through their own operations.
pub(crate) fn apply_status_patch(
    conn: &Connection,
    room: &Room,
    requested: RoomStatus,
    now: i64,
) -> StoreResult<()> {
    if requested == room.status {
        return Ok(());
    }

    let event = match requested {
        RoomStatus::Maintenance => RoomEvent::SetMaintenance,
        RoomStatus::Available => RoomEvent::SetAvailable,
        RoomStatus::Cleaning => RoomEvent::SetCleaning,
        RoomStatus::Reserved => {
            return Err(StoreError::StatusRequiresEvent {
                requested,
                event: RoomEvent::Reserve,
            })
        }
        RoomStatus::Occupied => {
            return Err(StoreError::StatusRequiresEvent {
                requested,
                event: RoomEvent::CheckIn,
            })
        }
    };
    apply_housekeeping(conn, room.id, event, now)?;
    Ok(())
}

/// Create the reservation for a reserve or walk-in and cache it on the room
fn book(
    conn: &Connection,
    room: &Room,
    to: RoomStatus,
    stay: &StayRequest,
    status: ReservationStatus,
    now: i64,
) -> StoreResult<TransitionOutcome> {
    reservations::ensure_no_conflict(conn, room, stay.check_in, stay.check_out, None)?;

    let guest = match stay.guest {
        GuestRef::Existing(id) => guests::get_required(conn, id)?,
        GuestRef::New(ref new_guest) => {
            let id = guests::insert(conn, &new_guest.validated()?, now)?;
            guests::get_required(conn, id)?
        }
    };

    let total_amount = match stay.total_amount {
        Some(total) => total,
        None => room
            .price_per_night
            .checked_mul(stay.nights())
            .ok_or_else(|| StoreError::validation("total_amount", "stay total overflows"))?,
    };

    let reservation_id = reservations::insert_row(
        conn,
        &ReservationRow {
            guest_id: guest.id,
            room_id: room.id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            total_amount,
            status,
        },
        now,
    )?;

    let occupant = Occupant {
        reservation_id,
        guest_name: guest.full_name(),
        check_in: stay.check_in,
        check_out: stay.check_out,
    };
    rooms::set_status(conn, room.id, to, Some(&occupant), now)?;

    let event = match status {
        ReservationStatus::CheckedIn => RoomEvent::CheckIn,
        _ => RoomEvent::Reserve,
    };
    finish(conn, room, event, Some(reservation_id))
}

fn finish(
    conn: &Connection,
    before: &Room,
    event: RoomEvent,
    reservation_id: Option<ReservationId>,
) -> StoreResult<TransitionOutcome> {
    let room = rooms::get_required(conn, before.id)?;
    log_transition(&room, before.status, event);
    let reservation = match reservation_id {
        Some(id) => Some(reservations::get_required(conn, id)?),
        None => None,
    };
    Ok(TransitionOutcome { room, reservation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, NewGuest};
    use crate::storage::{init_schema, seed_rooms};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        init_schema(&conn).unwrap();
        seed_rooms(&conn, 1).unwrap();
        conn
    }

    fn walk_in(name: &str) -> StayRequest {
        StayRequest::new(GuestRef::New(NewGuest::new(name, "Guest")), date(10), date(12))
    }

    fn count_reservations(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM reservations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_transition_table() {
        use RoomEvent::*;
        use RoomStatus::*;

        assert_eq!(transition(Available, Reserve), Some(Reserved));
        assert_eq!(transition(Reserved, CheckIn), Some(Occupied));
        assert_eq!(transition(Available, CheckIn), Some(Occupied));
        assert_eq!(transition(Occupied, CheckOut), Some(Available));
        assert_eq!(transition(Reserved, Cancel), Some(Available));
        for status in RoomStatus::ALL {
            assert_eq!(transition(status, SetMaintenance), Some(Maintenance));
        }
        assert_eq!(transition(Maintenance, SetAvailable), Some(Available));
        assert_eq!(transition(Cleaning, SetAvailable), Some(Available));
        assert_eq!(transition(Available, SetCleaning), Some(Cleaning));

        assert_eq!(transition(Occupied, CheckIn), None);
        assert_eq!(transition(Reserved, Reserve), None);
        assert_eq!(transition(Available, CheckOut), None);
        assert_eq!(transition(Occupied, SetAvailable), None);
        assert_eq!(transition(Available, Cancel), None);
        assert_eq!(transition(Occupied, SetCleaning), None);
    }

    #[test]
    fn test_walk_in_total_defaults_to_nightly_price() {
        let conn = setup();
        let outcome = check_in(&conn, 1, Some(&walk_in("Walk")), 2).unwrap();

        let reservation = outcome.reservation.unwrap();
        assert_eq!(reservation.status, ReservationStatus::CheckedIn);
        assert_eq!(reservation.total_amount, Money::from_units(160));
        assert_eq!(outcome.room.status, RoomStatus::Occupied);
        assert_eq!(
            outcome.room.occupant.unwrap().guest_name,
            "Walk Guest".to_string()
        );
    }

    #[test]
    fn test_check_in_available_requires_stay() {
        let conn = setup();
        let err = check_in(&conn, 1, None, 2).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "stay", .. }));
        assert_eq!(count_reservations(&conn), 0);
    }

    #[test]
    fn test_reserve_conflict_leaves_room_alone() {
        let conn = setup();
        let guest = guests::insert(&conn, &NewGuest::new("Anna", "Smith").validated().unwrap(), 1)
            .unwrap();
        reservations::insert(
            &conn,
            &crate::models::NewReservation {
                guest_id: guest,
                room_id: 1,
                check_in: date(11),
                check_out: date(14),
                total_amount: Money::ZERO,
            },
            1,
        )
        .unwrap();

        let stay = StayRequest::new(GuestRef::Existing(guest), date(10), date(12));
        let err = reserve(&conn, 1, &stay, 2).unwrap_err();
        assert!(matches!(err, StoreError::BookingConflict { .. }));
        assert_eq!(
            rooms::get_required(&conn, 1).unwrap().status,
            RoomStatus::Available
        );
    }

    #[test]
    fn test_cancel_unrelated_confirmed_reservation_keeps_room_status() {
        let conn = setup();
        let guest = guests::insert(&conn, &NewGuest::new("Anna", "Smith").validated().unwrap(), 1)
            .unwrap();
        let future = reservations::insert(
            &conn,
            &crate::models::NewReservation {
                guest_id: guest,
                room_id: 2,
                check_in: date(20),
                check_out: date(22),
                total_amount: Money::ZERO,
            },
            1,
        )
        .unwrap();

        let outcome = cancel(&conn, future, 2).unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Available);
        assert_eq!(
            outcome.reservation.unwrap().status,
            ReservationStatus::Cancelled
        );

        // A second cancel is rejected
        let err = cancel(&conn, future, 3).unwrap_err();
        assert!(matches!(err, StoreError::ReservationState { .. }));
    }

    #[test]
    fn test_status_patch_routing() {
        let conn = setup();
        let room = rooms::get_required(&conn, 1).unwrap();

        let err = apply_status_patch(&conn, &room, RoomStatus::Occupied, 2).unwrap_err();
        assert!(matches!(err, StoreError::StatusRequiresEvent { .. }));

        apply_status_patch(&conn, &room, RoomStatus::Cleaning, 2).unwrap();
        let room = rooms::get_required(&conn, 1).unwrap();
        assert_eq!(room.status, RoomStatus::Cleaning);

        apply_status_patch(&conn, &room, RoomStatus::Available, 3).unwrap();
        assert_eq!(
            rooms::get_required(&conn, 1).unwrap().status,
            RoomStatus::Available
        );
    }

    #[test]
    fn test_check_out_closes_stay_stranded_by_maintenance() {
        let conn = setup();
        let outcome = check_in(&conn, 5, Some(&walk_in("Ada")), 2).unwrap();
        let stay_id = outcome.reservation.unwrap().id;

        apply_housekeeping(&conn, 5, RoomEvent::SetMaintenance, 3).unwrap();
        apply_housekeeping(&conn, 5, RoomEvent::SetAvailable, 4).unwrap();

        let closed = check_out(&conn, 5, 5).unwrap();
        assert_eq!(closed.room.status, RoomStatus::Available);
        let reservation = closed.reservation.unwrap();
        assert_eq!(reservation.id, stay_id);
        assert_eq!(reservation.status, ReservationStatus::Completed);

        // Dates are free again
        check_in(&conn, 5, Some(&walk_in("Bob")), 6).unwrap();

        // Nothing stranded left on an available room
        apply_housekeeping(&conn, 1, RoomEvent::SetCleaning, 7).unwrap();
        let err = check_out(&conn, 1, 8).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_check_in_promotes_booking_after_maintenance() {
        let conn = setup();
        let booked = reserve(&conn, 1, &walk_in("Ada"), 2).unwrap();
        let booked_id = booked.reservation.unwrap().id;

        apply_housekeeping(&conn, 1, RoomEvent::SetMaintenance, 3).unwrap();
        apply_housekeeping(&conn, 1, RoomEvent::SetAvailable, 4).unwrap();

        // Someone else cannot take the booked dates
        let err = check_in(&conn, 1, Some(&walk_in("Bob")), 5).unwrap_err();
        assert!(matches!(err, StoreError::BookingConflict { .. }));

        let outcome = check_in(&conn, 1, Some(&walk_in("ada")), 6).unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Occupied);
        assert_eq!(
            outcome.room.occupant.as_ref().map(|o| o.reservation_id),
            Some(booked_id)
        );
        let reservation = outcome.reservation.unwrap();
        assert_eq!(reservation.id, booked_id);
        assert_eq!(reservation.status, ReservationStatus::CheckedIn);
        assert_eq!(count_reservations(&conn), 1);

        let guests: i64 = conn
            .query_row("SELECT COUNT(*) FROM guests", [], |row| row.get(0))
            .unwrap();
        assert_eq!(guests, 1);
    }

    #[test]
    fn test_check_in_promotes_reservation_booked_ahead() {
        let conn = setup();
        let guest = guests::insert(&conn, &NewGuest::new("Anna", "Smith").validated().unwrap(), 1)
            .unwrap();
        let id = reservations::insert(
            &conn,
            &crate::models::NewReservation {
                guest_id: guest,
                room_id: 2,
                check_in: date(10),
                check_out: date(12),
                total_amount: Money::from_units(150),
            },
            1,
        )
        .unwrap();

        let stay = StayRequest::new(GuestRef::Existing(guest), date(10), date(12));
        let outcome = check_in(&conn, 2, Some(&stay), 2).unwrap();
        let reservation = outcome.reservation.unwrap();
        assert_eq!(reservation.id, id);
        assert_eq!(reservation.total_amount, Money::from_units(150));
        assert_eq!(outcome.room.occupant.unwrap().guest_name, "Anna Smith");
    }

    #[test]
    fn test_reserved_room_ignores_supplied_stay() {
        let conn = setup();
        reserve(&conn, 1, &walk_in("Ada"), 2).unwrap();

        let backwards = StayRequest::new(GuestRef::Existing(999), date(12), date(10));
        let outcome = check_in(&conn, 1, Some(&backwards), 3).unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Occupied);
        assert_eq!(
            outcome.reservation.unwrap().status,
            ReservationStatus::CheckedIn
        );
    }
}
