//! Unified storage interface
//!
//! The `Store` is the one handle the UI layer talks to. It owns the SQLite
//! engine and coordinates between:
//! - the entity repositories (plain CRUD)
//! - the room lifecycle (the only writer of room status)
//! - dirty tracking and the read-only aggregates
//!
//! ## Initialization
//!
//! A `Store` is created cold. [`Store::initialize`] bootstraps the engine
//! exactly once; concurrent callers await the same attempt, and a failed
//! attempt is remembered. Until it succeeds every other operation returns
//! [`StoreError::NotReady`] (or the original [`StoreError::Init`]).
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open(&Config::load()?);
//! store.initialize().await?;
//!
//! let room = store.get_room_by_number("101").await?.unwrap();
//! store.reserve_room(room.id, stay).await?;
//! ```
//!
//! Every write runs in a single transaction behind an async mutex, so two
//! interleaved calls on the same room are applied one after the other and
//! the second one sees the first one's result.

use std::path::PathBuf;

use rusqlite::Connection;
use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info};

use crate::config::Config;
use crate::dirty::{self, DirtyCounts, DirtyEntry};
use crate::error::{StoreError, StoreResult};
use crate::lifecycle::{self, RoomEvent, TransitionOutcome};
use crate::models::{
    DateRange, EntityKind, Guest, GuestFilter, GuestId, GuestPatch, NewGuest, NewReservation,
    NewRoom, NewUser, Reservation, ReservationFilter, ReservationId, ReservationPatch, Room,
    RoomFilter, RoomId, RoomPatch, StayRequest, User, UserFilter, UserId, UserPatch,
};
use crate::repo::{self, guests, reservations, rooms, users};
use crate::stats::{self, HotelStats, RevenueReport};
use crate::storage::{bootstrap, EngineLocation};

/// A bootstrapped engine
struct Engine {
    conn: Mutex<Connection>,
    replica_id: String,
}

/// Unified storage interface for the hotel replica
pub struct Store {
    location: EngineLocation,
    /// Outcome of the one bootstrap attempt; errors are kept as text
    engine: OnceCell<Result<Engine, String>>,
}

impl Store {
    /// Create a handle for the database named by `config`
    ///
    /// No I/O happens until [`Store::initialize`].
    pub fn open(config: &Config) -> Self {
        Self::open_with_path(config.database_path())
    }

    /// Create a handle for a database at a specific path
    pub fn open_with_path(path: impl Into<PathBuf>) -> Self {
        Self::with_location(EngineLocation::File(path.into()))
    }

    /// Create a handle backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self::with_location(EngineLocation::Memory)
    }

    fn with_location(location: EngineLocation) -> Self {
        Self {
            location,
            engine: OnceCell::new(),
        }
    }

    /// Bootstrap the engine: schema, starter rooms and replica id
    ///
    /// Safe to call any number of times from any number of tasks; only
    /// the first call does the work and everyone gets its outcome.
    pub async fn initialize(&self) -> StoreResult<()> {
        let outcome = self
            .engine
            .get_or_init(|| async {
                let location = self.location.clone();
                let now = repo::now_millis();
                let result = tokio::task::spawn_blocking(move || bootstrap(&location, now)).await;

                match result {
                    Ok(Ok(boot)) => Ok(Engine {
                        conn: Mutex::new(boot.conn),
                        replica_id: boot.replica_id,
                    }),
                    Ok(Err(err)) => {
                        error!("Store initialization failed: {:#}", err);
                        Err(format!("{:#}", err))
                    }
                    Err(err) => {
                        error!("Store initialization task failed: {}", err);
                        Err(err.to_string())
                    }
                }
            })
            .await;

        outcome.as_ref().map(|_| ()).map_err(|details| StoreError::Init {
            details: details.clone(),
        })
    }

    /// Check whether initialization has completed successfully
    pub fn is_ready(&self) -> bool {
        matches!(self.engine.get(), Some(Ok(_)))
    }

    /// Identity of this local replica
    pub fn replica_id(&self) -> StoreResult<&str> {
        Ok(&self.engine()?.replica_id)
    }

    fn engine(&self) -> StoreResult<&Engine> {
        match self.engine.get() {
            Some(Ok(engine)) => Ok(engine),
            Some(Err(details)) => Err(StoreError::Init {
                details: details.clone(),
            }),
            None => Err(StoreError::NotReady),
        }
    }

    async fn read<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let engine = self.engine()?;
        let conn = engine.conn.lock().await;
        op(&conn)
    }

    /// Run `op` in one transaction; any error rolls everything back
    async fn write<T>(
        &self,
        op: impl FnOnce(&Connection, i64) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let engine = self.engine()?;
        let mut conn = engine.conn.lock().await;
        let tx = conn.transaction()?;
        let value = op(&tx, repo::now_millis())?;
        tx.commit()?;
        Ok(value)
    }

    // ==================== Room Operations ====================

    /// Add a room to the catalog; it starts available
    pub async fn create_room(&self, room: NewRoom) -> StoreResult<RoomId> {
        let room = room.validated()?;
        self.write(|conn, now| rooms::insert(conn, &room, now))
            .await
    }

    pub async fn get_room(&self, id: RoomId) -> StoreResult<Option<Room>> {
        self.read(|conn| rooms::get(conn, id)).await
    }

    pub async fn get_room_by_number(&self, number: &str) -> StoreResult<Option<Room>> {
        self.read(|conn| rooms::get_by_number(conn, number)).await
    }

    /// List rooms ordered by room number
    pub async fn list_rooms(&self, filter: RoomFilter) -> StoreResult<Vec<Room>> {
        self.read(|conn| rooms::list(conn, &filter)).await
    }

    /// Update room details
    ///
    /// A status in the patch is applied through the room lifecycle and
    /// only for maintenance, cleaning and available.
    pub async fn update_room(&self, id: RoomId, patch: RoomPatch) -> StoreResult<Room> {
        let patch = patch.validated()?;
        self.write(|conn, now| {
            let mut room = rooms::get_required(conn, id)?;

            if patch.touches_columns() {
                if let Some(ref room_type) = patch.room_type {
                    room.room_type = room_type.clone();
                }
                if let Some(price) = patch.price_per_night {
                    room.price_per_night = price;
                }
                if let Some(ref amenities) = patch.amenities {
                    room.amenities = amenities.clone();
                }
                rooms::save_details(conn, &room, now)?;
            }
            if let Some(status) = patch.status {
                lifecycle::apply_status_patch(conn, &room, status, now)?;
            }

            rooms::get_required(conn, id)
        })
        .await
    }

    // ==================== Room Lifecycle ====================

    /// Reserve an available room; creates a confirmed reservation
    pub async fn reserve_room(
        &self,
        room_id: RoomId,
        stay: StayRequest,
    ) -> StoreResult<TransitionOutcome> {
        self.write(|conn, now| lifecycle::reserve(conn, room_id, &stay, now))
            .await
    }

    /// Check in to a reserved room, or walk in to an available one
    pub async fn check_in(
        &self,
        room_id: RoomId,
        stay: Option<StayRequest>,
    ) -> StoreResult<TransitionOutcome> {
        self.write(|conn, now| lifecycle::check_in(conn, room_id, stay.as_ref(), now))
            .await
    }

    pub async fn check_out(&self, room_id: RoomId) -> StoreResult<TransitionOutcome> {
        self.write(|conn, now| lifecycle::check_out(conn, room_id, now))
            .await
    }

    /// Take a room out of service; reservations are left alone
    pub async fn set_maintenance(&self, room_id: RoomId) -> StoreResult<TransitionOutcome> {
        self.housekeeping(room_id, RoomEvent::SetMaintenance).await
    }

    pub async fn set_available(&self, room_id: RoomId) -> StoreResult<TransitionOutcome> {
        self.housekeeping(room_id, RoomEvent::SetAvailable).await
    }

    pub async fn set_cleaning(&self, room_id: RoomId) -> StoreResult<TransitionOutcome> {
        self.housekeeping(room_id, RoomEvent::SetCleaning).await
    }

    async fn housekeeping(
        &self,
        room_id: RoomId,
        event: RoomEvent,
    ) -> StoreResult<TransitionOutcome> {
        self.write(|conn, now| lifecycle::apply_housekeeping(conn, room_id, event, now))
            .await
    }

    /// Cancel a confirmed reservation, releasing its room if reserved
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> StoreResult<TransitionOutcome> {
        self.write(|conn, now| lifecycle::cancel(conn, reservation_id, now))
            .await
    }

    // ==================== Guest Operations ====================

    pub async fn create_guest(&self, guest: NewGuest) -> StoreResult<GuestId> {
        let guest = guest.validated()?;
        self.write(|conn, now| guests::insert(conn, &guest, now))
            .await
    }

    pub async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
        self.read(|conn| guests::get(conn, id)).await
    }

    /// List guests ordered by last name, first name
    pub async fn list_guests(&self, filter: GuestFilter) -> StoreResult<Vec<Guest>> {
        self.read(|conn| guests::list(conn, &filter)).await
    }

    pub async fn update_guest(&self, id: GuestId, patch: GuestPatch) -> StoreResult<Guest> {
        let patch = patch.validated()?;
        self.write(|conn, now| guests::update(conn, id, &patch, now))
            .await
    }

    // ==================== Reservation Operations ====================

    /// Book a room ahead without changing its status
    pub async fn create_reservation(
        &self,
        reservation: NewReservation,
    ) -> StoreResult<ReservationId> {
        reservation.validate()?;
        self.write(|conn, now| reservations::insert(conn, &reservation, now))
            .await
    }

    pub async fn get_reservation(&self, id: ReservationId) -> StoreResult<Option<Reservation>> {
        self.read(|conn| reservations::get(conn, id)).await
    }

    /// List reservations ordered by check-in date
    pub async fn list_reservations(
        &self,
        filter: ReservationFilter,
    ) -> StoreResult<Vec<Reservation>> {
        self.read(|conn| reservations::list(conn, &filter)).await
    }

    pub async fn update_reservation(
        &self,
        id: ReservationId,
        patch: ReservationPatch,
    ) -> StoreResult<Reservation> {
        patch.validate_amount()?;
        self.write(|conn, now| reservations::update(conn, id, &patch, now))
            .await
    }

    // ==================== User Operations ====================

    pub async fn create_user(&self, user: NewUser) -> StoreResult<UserId> {
        let user = user.validated()?;
        self.write(|conn, now| users::insert(conn, &user, now))
            .await
    }

    pub async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.read(|conn| users::get(conn, id)).await
    }

    pub async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<User>> {
        self.read(|conn| users::list(conn, &filter)).await
    }

    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        let patch = patch.validated()?;
        self.write(|conn, now| users::update(conn, id, &patch, now))
            .await
    }

    // ==================== Stats ====================

    pub async fn get_stats(&self) -> StoreResult<HotelStats> {
        self.read(stats::compute_stats).await
    }

    /// Revenue from checked-in and completed stays, by check-in date
    pub async fn get_revenue(&self, range: Option<DateRange>) -> StoreResult<RevenueReport> {
        self.read(|conn| stats::compute_revenue(conn, range)).await
    }

    // ==================== Dirty Tracking ====================

    pub async fn list_dirty(&self, kind: EntityKind) -> StoreResult<Vec<DirtyEntry>> {
        self.read(|conn| dirty::list(conn, kind)).await
    }

    /// Clear dirty flags for rows still at the listed version
    pub async fn clear_dirty(&self, kind: EntityKind, entries: &[DirtyEntry]) -> StoreResult<usize> {
        let cleared = self
            .write(|conn, _| dirty::clear(conn, kind, entries))
            .await?;
        info!(
            "Dirty clear complete, kind={}, requested={}, cleared={}",
            kind,
            entries.len(),
            cleared
        );
        Ok(cleared)
    }

    pub async fn dirty_counts(&self) -> StoreResult<DirtyCounts> {
        self.read(dirty::counts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{GuestRef, Money, ReservationStatus, RoomStatus};
    use chrono::NaiveDate;
    use futures_util::future::join_all;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn smith_stay() -> StayRequest {
        StayRequest::new(
            GuestRef::New(NewGuest::new("A.", "Smith")),
            date(2024, 1, 10),
            date(2024, 1, 12),
        )
    }

    async fn ready_store() -> Store {
        let store = Store::in_memory();
        store.initialize().await.unwrap();
        store
    }

    async fn room_id(store: &Store, number: &str) -> RoomId {
        store.get_room_by_number(number).await.unwrap().unwrap().id
    }

    async fn all_reservations(store: &Store) -> Vec<Reservation> {
        store
            .list_reservations(ReservationFilter::default())
            .await
            .unwrap()
    }

    /// Occupant cache agrees with status on every room
    async fn assert_occupant_invariant(store: &Store) {
        for room in store.list_rooms(RoomFilter::default()).await.unwrap() {
            assert_eq!(
                room.status.has_occupant(),
                room.occupant.is_some(),
                "room {} is {} with occupant {:?}",
                room.number,
                room.status,
                room.occupant
            );
        }
    }

    #[tokio::test]
    async fn test_operations_before_initialize_are_not_ready() {
        let store = Store::in_memory();
        assert!(!store.is_ready());

        let err = store.list_rooms(RoomFilter::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(matches!(store.replica_id(), Err(StoreError::NotReady)));
    }

    #[tokio::test]
    async fn test_concurrent_initialize_seeds_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open_with_path(temp_dir.path().join("hotel.db"));

        let results = join_all((0..8).map(|_| store.initialize())).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(store.is_ready());

        let rooms = store.list_rooms(RoomFilter::default()).await.unwrap();
        assert_eq!(rooms.len(), 9);
        assert!(rooms.iter().all(|r| r.status == RoomStatus::Available));

        // A second handle on the same file sees the same replica and no new rows
        let replica = store.replica_id().unwrap().to_string();
        drop(store);
        let reopened = Store::open_with_path(temp_dir.path().join("hotel.db"));
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.replica_id().unwrap(), replica);
        assert_eq!(
            reopened.list_rooms(RoomFilter::default()).await.unwrap().len(),
            9
        );
    }

    #[tokio::test]
    async fn test_initialize_failure_is_sticky() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = Store::open_with_path(blocker.join("hotel.db"));
        let first = store.initialize().await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Init);
        assert!(!first.is_recoverable());

        let second = store.initialize().await.unwrap_err();
        assert_eq!(second.to_string(), first.to_string());

        let err = store.get_stats().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Init);
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_reserve_check_in_check_out_scenario() {
        let store = ready_store().await;
        let id = room_id(&store, "101").await;

        let outcome = store.reserve_room(id, smith_stay()).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Reserved);
        let reservation = outcome.reservation.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(outcome.room.occupant.as_ref().unwrap().guest_name, "A. Smith");
        assert_eq!(all_reservations(&store).await.len(), 1);
        assert_occupant_invariant(&store).await;

        let outcome = store.check_in(id, None).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Occupied);
        assert_eq!(
            outcome.reservation.unwrap().status,
            ReservationStatus::CheckedIn
        );

        let outcome = store.check_out(id).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Available);
        assert!(outcome.room.occupant.is_none());
        let completed = store.get_reservation(reservation.id).await.unwrap().unwrap();
        assert_eq!(completed.status, ReservationStatus::Completed);
        assert_occupant_invariant(&store).await;
    }

    #[tokio::test]
    async fn test_walk_in_and_double_check_in() {
        let store = ready_store().await;
        let id = room_id(&store, "103").await;

        let outcome = store.check_in(id, Some(smith_stay())).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Occupied);
        let reservations = all_reservations(&store).await;
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].status, ReservationStatus::CheckedIn);
        assert_eq!(reservations[0].total_amount, Money::from_units(240));

        let before = store.get_room(id).await.unwrap().unwrap();
        let err = store.check_in(id, Some(smith_stay())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        // Nothing changed, not even the guest table
        let after = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(all_reservations(&store).await.len(), 1);
        assert_eq!(
            store.list_guests(GuestFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_interleaved_check_ins_only_one_succeeds() {
        let store = ready_store().await;
        let id = room_id(&store, "102").await;

        let (a, b) = tokio::join!(
            store.check_in(id, Some(smith_stay())),
            store.check_in(id, Some(smith_stay()))
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

        let reservations = all_reservations(&store).await;
        assert_eq!(reservations.len(), 1);
        assert_occupant_invariant(&store).await;
    }

    #[tokio::test]
    async fn test_stats_scenario() {
        let store = ready_store().await;
        for number in ["101", "102"] {
            let id = room_id(&store, number).await;
            store.check_in(id, Some(smith_stay())).await.unwrap();
        }
        let id = room_id(&store, "201").await;
        store.reserve_room(id, smith_stay()).await.unwrap();

        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats.total_rooms, 9);
        assert_eq!(stats.occupied, 2);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.available, 6);
        assert_eq!(stats.occupancy_rate, 33);
        assert_eq!(stats.active_reservations, 3);
        assert_eq!(stats.guests, 3);
    }

    #[tokio::test]
    async fn test_maintenance_from_occupied_leaves_reservation() {
        let store = ready_store().await;
        let id = room_id(&store, "105").await;
        store.check_in(id, Some(smith_stay())).await.unwrap();
        let before = all_reservations(&store).await;

        let outcome = store.set_maintenance(id).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Maintenance);
        assert!(outcome.room.occupant.is_none());
        assert!(outcome.reservation.is_none());

        let after = all_reservations(&store).await;
        assert_eq!(before.len(), after.len());
        assert_eq!(before[0].status, after[0].status);
        assert_eq!(before[0].updated_at, after[0].updated_at);
        assert_occupant_invariant(&store).await;

        store.set_cleaning(id).await.unwrap();
        let outcome = store.set_available(id).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Available);
        assert_eq!(store.get_stats().await.unwrap().active_reservations, 1);

        // Checking out the now-available room closes the leftover stay
        let outcome = store.check_out(id).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Available);
        assert_eq!(
            outcome.reservation.map(|r| r.status),
            Some(ReservationStatus::Completed)
        );
        assert_eq!(store.get_stats().await.unwrap().active_reservations, 0);
        store.check_in(id, Some(smith_stay())).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_releases_reserved_room() {
        let store = ready_store().await;
        let id = room_id(&store, "202").await;
        let reservation = store
            .reserve_room(id, smith_stay())
            .await
            .unwrap()
            .reservation
            .unwrap();

        let outcome = store.cancel_reservation(reservation.id).await.unwrap();
        assert_eq!(outcome.room.status, RoomStatus::Available);
        assert_eq!(
            outcome.reservation.unwrap().status,
            ReservationStatus::Cancelled
        );

        // The same dates can be booked again
        store.reserve_room(id, smith_stay()).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_room_status_rules() {
        let store = ready_store().await;
        let id = room_id(&store, "104").await;

        let err = store
            .update_room(
                id,
                RoomPatch {
                    status: Some(RoomStatus::Occupied),
                    ..RoomPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let room = store
            .update_room(
                id,
                RoomPatch {
                    price_per_night: Some(Money::from_units(125)),
                    status: Some(RoomStatus::Maintenance),
                    ..RoomPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(room.status, RoomStatus::Maintenance);
        assert_eq!(room.price_per_night, Money::from_units(125));
    }

    #[tokio::test]
    async fn test_guest_rename_refreshes_occupant() {
        let store = ready_store().await;
        let id = room_id(&store, "101").await;
        let outcome = store.reserve_room(id, smith_stay()).await.unwrap();
        let guest_id = outcome.reservation.unwrap().guest_id;

        store
            .update_guest(
                guest_id,
                GuestPatch {
                    first_name: Some("Alice".to_string()),
                    ..GuestPatch::default()
                },
            )
            .await
            .unwrap();

        let room = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room.occupant.unwrap().guest_name, "Alice Smith");
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let store = ready_store().await;

        let err = store.create_guest(NewGuest::new("", "Smith")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let stay = StayRequest::new(
            GuestRef::New(NewGuest::new("A.", "Smith")),
            date(2024, 1, 12),
            date(2024, 1, 12),
        );
        let id = room_id(&store, "101").await;
        let err = store.reserve_room(id, stay).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(store.list_guests(GuestFilter::default()).await.unwrap().is_empty());
        assert_eq!(store.dirty_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_failed_booking_rolls_back_new_guest() {
        let store = ready_store().await;
        let id = store
            .create_room(NewRoom::new("900", "Penthouse", Money::from_cents(i64::MAX / 2 + 1)))
            .await
            .unwrap();
        let room_before = store.get_room(id).await.unwrap().unwrap();
        let counts_before = store.dirty_counts().await.unwrap();

        // The guest row is written before the two-night total overflows
        let err = store.reserve_room(id, smith_stay()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation {
                field: "total_amount",
                ..
            }
        ));

        assert!(store.list_guests(GuestFilter::default()).await.unwrap().is_empty());
        assert!(all_reservations(&store).await.is_empty());
        let room_after = store.get_room(id).await.unwrap().unwrap();
        assert_eq!(room_after.status, RoomStatus::Available);
        assert!(room_after.occupant.is_none());
        assert_eq!(room_after.updated_at, room_before.updated_at);
        assert_eq!(store.dirty_counts().await.unwrap(), counts_before);
        assert_occupant_invariant(&store).await;

        // The failed write left the store usable
        let id = room_id(&store, "101").await;
        store.reserve_room(id, smith_stay()).await.unwrap();
        assert_eq!(store.list_guests(GuestFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dirty_round_trip() {
        let store = ready_store().await;
        assert_eq!(store.dirty_counts().await.unwrap().total(), 0);

        let id = room_id(&store, "101").await;
        store.reserve_room(id, smith_stay()).await.unwrap();

        let counts = store.dirty_counts().await.unwrap();
        assert_eq!(counts.rooms, 1);
        assert_eq!(counts.guests, 1);
        assert_eq!(counts.reservations, 1);

        let listed = store.list_dirty(EntityKind::Room).await.unwrap();
        assert_eq!(listed.len(), 1);

        // Room changes again before the reconciler clears it
        store.check_in(id, None).await.unwrap();
        assert_eq!(store.clear_dirty(EntityKind::Room, &listed).await.unwrap(), 0);
        assert_eq!(store.list_dirty(EntityKind::Room).await.unwrap().len(), 1);

        let listed = store.list_dirty(EntityKind::Room).await.unwrap();
        assert_eq!(store.clear_dirty(EntityKind::Room, &listed).await.unwrap(), 1);
        assert!(store.list_dirty(EntityKind::Room).await.unwrap().is_empty());

        // Clearing again is a no-op
        assert_eq!(store.clear_dirty(EntityKind::Room, &listed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_users_are_deactivated_not_removed() {
        let store = ready_store().await;
        let id = store
            .create_user(NewUser::new(
                "Desk@Hotel.test",
                "Dana Desk",
                crate::models::UserRole::Staff,
            ))
            .await
            .unwrap();

        let user = store
            .update_user(
                id,
                UserPatch {
                    active: Some(false),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(!user.active);
        assert_eq!(user.email, "desk@hotel.test");

        let active = store
            .list_users(UserFilter {
                active: Some(true),
                ..UserFilter::default()
            })
            .await
            .unwrap();
        assert!(active.is_empty());
        assert_eq!(store.list_users(UserFilter::default()).await.unwrap().len(), 1);
    }
}
