//! Room command handlers
//!
//! Rooms are addressed by their number on the command line.

use anyhow::{Context, Result};

use roomkeep_core::{Money, NewRoom, Room, RoomFilter, RoomStatus, StayRequest, Store};

use crate::output::Output;

/// Look up a room by number
pub async fn resolve(store: &Store, number: &str) -> Result<Room> {
    store
        .get_room_by_number(number)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Room not found: {}", number))
}

/// List rooms, optionally filtered
pub async fn list(
    store: &Store,
    status: Option<RoomStatus>,
    room_type: Option<String>,
    output: &Output,
) -> Result<()> {
    let rooms = store.list_rooms(RoomFilter { status, room_type }).await?;
    output.print_rooms(&rooms)
}

pub async fn show(store: &Store, number: &str, output: &Output) -> Result<()> {
    let room = resolve(store, number).await?;
    output.print_room(&room)
}

/// Add a room to the catalog
pub async fn add(
    store: &Store,
    number: String,
    room_type: String,
    price: Money,
    amenities: Vec<String>,
    output: &Output,
) -> Result<()> {
    let new_room = NewRoom::new(number, room_type, price).with_amenities(amenities);
    let id = store
        .create_room(new_room)
        .await
        .context("Failed to create room")?;

    let room = store
        .get_room(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Room {} vanished after create", id))?;
    output.success(&format!("Created room {}", room.number));
    output.print_room(&room)
}

pub async fn reserve(store: &Store, number: &str, stay: StayRequest, output: &Output) -> Result<()> {
    let room = resolve(store, number).await?;
    let outcome = store.reserve_room(room.id, stay).await?;
    output.print_outcome(&outcome)
}

/// Check in; a stay is only needed for a walk-in
pub async fn check_in(
    store: &Store,
    number: &str,
    stay: Option<StayRequest>,
    output: &Output,
) -> Result<()> {
    let room = resolve(store, number).await?;
    let outcome = store.check_in(room.id, stay).await?;
    output.print_outcome(&outcome)
}

pub async fn check_out(store: &Store, number: &str, output: &Output) -> Result<()> {
    let room = resolve(store, number).await?;
    let outcome = store.check_out(room.id).await?;
    output.print_outcome(&outcome)
}

/// Apply one of the housekeeping statuses
pub async fn housekeeping(
    store: &Store,
    number: &str,
    status: RoomStatus,
    output: &Output,
) -> Result<()> {
    let room = resolve(store, number).await?;
    let outcome = match status {
        RoomStatus::Maintenance => store.set_maintenance(room.id).await?,
        RoomStatus::Cleaning => store.set_cleaning(room.id).await?,
        RoomStatus::Available => store.set_available(room.id).await?,
        other => anyhow::bail!("{} is not a housekeeping status", other),
    };
    output.print_outcome(&outcome)
}
