//! Reservation command handlers

use anyhow::Result;

use roomkeep_core::{GuestId, ReservationFilter, ReservationId, ReservationStatus, Store};

use crate::commands::room;
use crate::output::Output;

pub async fn list(
    store: &Store,
    room_number: Option<String>,
    guest_id: Option<GuestId>,
    status: Option<ReservationStatus>,
    output: &Output,
) -> Result<()> {
    let room_id = match room_number {
        Some(ref number) => Some(room::resolve(store, number).await?.id),
        None => None,
    };

    let reservations = store
        .list_reservations(ReservationFilter {
            room_id,
            guest_id,
            status,
        })
        .await?;
    output.print_reservations(&reservations)
}

pub async fn cancel(store: &Store, id: ReservationId, output: &Output) -> Result<()> {
    let outcome = store.cancel_reservation(id).await?;
    output.print_outcome(&outcome)
}
