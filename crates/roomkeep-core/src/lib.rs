//! Roomkeep Core Library
//!
//! This crate provides the offline-first persistence core for Roomkeep, a
//! front-desk system for a single hotel. Everything the desk does is
//! recorded in a local SQLite replica first; an external reconciliation
//! engine later pushes the rows this crate marks dirty.
//!
//! # Architecture
//!
//! - **Storage**: schema, starter room catalog and engine bootstrap
//! - **Repositories**: typed CRUD for rooms, guests, reservations and users
//! - **Lifecycle**: the room state machine, sole writer of room status
//! - **Dirty tracking**: what changed locally since the last sync
//! - **Stats**: occupancy and revenue computed on demand
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open(&Config::load()?);
//! store.initialize().await?;
//!
//! let room = store.get_room_by_number("101").await?.unwrap();
//! let stay = StayRequest::new(GuestRef::New(NewGuest::new("Ada", "Smith")), from, to);
//! store.reserve_room(room.id, stay).await?;
//!
//! let stats = store.get_stats().await?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Rooms, guests, reservations, users and money
//! - `lifecycle`: Room state machine
//! - `dirty`: Dirty row bookkeeping for sync
//! - `stats`: Occupancy and revenue aggregates
//! - `storage`: SQLite schema, seed data and bootstrap
//! - `config`: Application configuration

pub mod config;
pub mod dirty;
pub mod error;
pub mod lifecycle;
pub mod models;
mod repo;
pub mod stats;
pub mod storage;
pub mod store;

pub use config::Config;
pub use dirty::{DirtyCounts, DirtyEntry};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use lifecycle::{transition, RoomEvent, TransitionOutcome};
pub use models::{
    DateRange, EntityKind, Guest, GuestFilter, GuestId, GuestPatch, GuestRef, Money, NewGuest,
    NewReservation, NewRoom, NewUser, Occupant, Reservation, ReservationFilter, ReservationId,
    ReservationPatch, ReservationStatus, Room, RoomFilter, RoomId, RoomPatch, RoomStatus,
    StayRequest, User, UserFilter, UserId, UserPatch, UserRole,
};
pub use stats::{DailyRevenue, HotelStats, RevenueReport};
pub use store::Store;
