//! User repository

use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{timestamp, TOUCH};
use crate::error::{StoreError, StoreResult};
use crate::models::{EntityKind, NewUser, User, UserFilter, UserId, UserPatch};

const COLUMNS: &str =
    "id, email, full_name, role, department, active, created_at, updated_at, dirty";

fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: row.get(3)?,
        department: row.get(4)?,
        active: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
        dirty: row.get(8)?,
    })
}

/// Insert a validated user
pub(crate) fn insert(conn: &Connection, user: &NewUser, now: i64) -> StoreResult<UserId> {
    let taken: bool = conn
        .prepare("SELECT 1 FROM users WHERE email = ?")?
        .exists(params![user.email])?;
    if taken {
        return Err(StoreError::validation(
            "email",
            format!("{} is already in use", user.email),
        ));
    }

    conn.execute(
        r#"
        INSERT INTO users
            (email, full_name, role, department, active, created_at, updated_at, dirty)
        VALUES (?, ?, ?, ?, 1, ?, ?, 1)
        "#,
        params![
            user.email,
            user.full_name,
            user.role,
            user.department,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!("Inserted user id={} role={}", id, user.role);
    Ok(id)
}

pub(crate) fn get(conn: &Connection, id: UserId) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?", COLUMNS),
            params![id],
            map_row,
        )
        .optional()?;
    Ok(user)
}

pub(crate) fn get_required(conn: &Connection, id: UserId) -> StoreResult<User> {
    get(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::User, id))
}

/// List users ordered by email
pub(crate) fn list(conn: &Connection, filter: &UserFilter) -> StoreResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM users
        WHERE (:role IS NULL OR role = :role)
          AND (:active IS NULL OR active = :active)
        ORDER BY email
        "#,
        COLUMNS
    ))?;

    let users = stmt
        .query_map(
            named_params! {
                ":role": filter.role,
                ":active": filter.active,
            },
            map_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Apply a validated patch; deactivation is the only way to retire a user
pub(crate) fn update(
    conn: &Connection,
    id: UserId,
    patch: &UserPatch,
    now: i64,
) -> StoreResult<User> {
    let mut user = get_required(conn, id)?;

    if let Some(ref full_name) = patch.full_name {
        user.full_name = full_name.clone();
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    if let Some(ref department) = patch.department {
        user.department = department.clone();
    }
    if let Some(active) = patch.active {
        user.active = active;
    }

    conn.execute(
        &format!(
            "UPDATE users SET full_name = :full_name, role = :role, \
             department = :department, active = :active, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":full_name": user.full_name,
            ":role": user.role,
            ":department": user.department,
            ":active": user.active,
            ":now": now,
            ":id": id,
        },
    )?;

    get_required(conn, id)
}
