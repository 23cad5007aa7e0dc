//! Guest command handlers

use anyhow::{Context, Result};

use roomkeep_core::{GuestFilter, NewGuest, Store};

use crate::output::Output;

pub async fn add(store: &Store, guest: NewGuest, output: &Output) -> Result<()> {
    let id = store
        .create_guest(guest)
        .await
        .context("Failed to create guest")?;

    if output.is_quiet() {
        println!("{}", id);
    } else {
        output.success(&format!("Created guest {}", id));
    }
    Ok(())
}

pub async fn list(
    store: &Store,
    email: Option<String>,
    last_name: Option<String>,
    output: &Output,
) -> Result<()> {
    let guests = store.list_guests(GuestFilter { email, last_name }).await?;
    output.print_guests(&guests)
}
