//! Staff user command handlers

use anyhow::{Context, Result};

use roomkeep_core::{NewUser, Store, UserFilter, UserId, UserPatch, UserRole};

use crate::output::Output;

pub async fn add(store: &Store, user: NewUser, output: &Output) -> Result<()> {
    let id = store
        .create_user(user)
        .await
        .context("Failed to create user")?;

    if output.is_quiet() {
        println!("{}", id);
    } else {
        output.success(&format!("Created user {}", id));
    }
    Ok(())
}

pub async fn list(
    store: &Store,
    role: Option<UserRole>,
    active: Option<bool>,
    output: &Output,
) -> Result<()> {
    let users = store.list_users(UserFilter { role, active }).await?;
    output.print_users(&users)
}

/// Retire a user; users are never removed
pub async fn deactivate(store: &Store, id: UserId, output: &Output) -> Result<()> {
    let user = store
        .update_user(
            id,
            UserPatch {
                active: Some(false),
                ..UserPatch::default()
            },
        )
        .await?;
    output.success(&format!("Deactivated {}", user.email));
    Ok(())
}
