//! Guest repository

use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{rooms, timestamp, TOUCH};
use crate::error::{StoreError, StoreResult};
use crate::models::{EntityKind, Guest, GuestFilter, GuestId, GuestPatch, NewGuest};

const COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, created_at, updated_at, dirty";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Guest> {
    Ok(Guest {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
        dirty: row.get(8)?,
    })
}

fn ensure_email_free(
    conn: &Connection,
    email: Option<&str>,
    except: Option<GuestId>,
) -> StoreResult<()> {
    let Some(email) = email else {
        return Ok(());
    };
    let owner: Option<GuestId> = conn
        .query_row(
            "SELECT id FROM guests WHERE email = ?",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    match owner {
        Some(id) if Some(id) != except => Err(StoreError::validation(
            "email",
            format!("{} is already registered to another guest", email),
        )),
        _ => Ok(()),
    }
}

/// Insert a validated guest
pub(crate) fn insert(conn: &Connection, guest: &NewGuest, now: i64) -> StoreResult<GuestId> {
    ensure_email_free(conn, guest.email.as_deref(), None)?;

    conn.execute(
        r#"
        INSERT INTO guests
            (first_name, last_name, email, phone, address, created_at, updated_at, dirty)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1)
        "#,
        params![
            guest.first_name,
            guest.last_name,
            guest.email,
            guest.phone,
            guest.address,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!("Inserted guest id={}", id);
    Ok(id)
}

pub(crate) fn get(conn: &Connection, id: GuestId) -> StoreResult<Option<Guest>> {
    let guest = conn
        .query_row(
            &format!("SELECT {} FROM guests WHERE id = ?", COLUMNS),
            params![id],
            map_row,
        )
        .optional()?;
    Ok(guest)
}

pub(crate) fn get_required(conn: &Connection, id: GuestId) -> StoreResult<Guest> {
    get(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::Guest, id))
}

/// List guests ordered by last name, first name
pub(crate) fn list(conn: &Connection, filter: &GuestFilter) -> StoreResult<Vec<Guest>> {
    let email = filter
        .email
        .as_deref()
        .map(|e| e.trim().to_ascii_lowercase());

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM guests
        WHERE (:email IS NULL OR email = :email)
          AND (:last_name IS NULL OR last_name = :last_name COLLATE NOCASE)
        ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, id
        "#,
        COLUMNS
    ))?;

    let guests = stmt
        .query_map(
            named_params! {
                ":email": email,
                ":last_name": filter.last_name.as_deref().map(str::trim),
            },
            map_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(guests)
}

/// Apply a validated patch
///
/// A rename also refreshes the occupant name cached on any room that
/// shows one of this guest's reservations.
pub(crate) fn update(
    conn: &Connection,
    id: GuestId,
    patch: &GuestPatch,
    now: i64,
) -> StoreResult<Guest> {
    let mut guest = get_required(conn, id)?;

    if let Some(ref first_name) = patch.first_name {
        guest.first_name = first_name.clone();
    }
    if let Some(ref last_name) = patch.last_name {
        guest.last_name = last_name.clone();
    }
    if let Some(ref email) = patch.email {
        ensure_email_free(conn, email.as_deref(), Some(id))?;
        guest.email = email.clone();
    }
    if let Some(ref phone) = patch.phone {
        guest.phone = phone.clone();
    }
    if let Some(ref address) = patch.address {
        guest.address = address.clone();
    }

    conn.execute(
        &format!(
            "UPDATE guests SET first_name = :first_name, last_name = :last_name, \
             email = :email, phone = :phone, address = :address, {} WHERE id = :id",
            TOUCH
        ),
        named_params! {
            ":first_name": guest.first_name,
            ":last_name": guest.last_name,
            ":email": guest.email,
            ":phone": guest.phone,
            ":address": guest.address,
            ":now": now,
            ":id": id,
        },
    )?;

    if patch.renames() {
        let refreshed = rooms::refresh_occupant_name(conn, id, &guest.full_name(), now)?;
        if refreshed > 0 {
            debug!("Refreshed occupant name on {} room(s) for guest {}", refreshed, id);
        }
    }

    get_required(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn add(conn: &Connection, first: &str, last: &str, email: Option<&str>) -> GuestId {
        let mut guest = NewGuest::new(first, last);
        if let Some(email) = email {
            guest = guest.with_email(email);
        }
        insert(conn, &guest.validated().unwrap(), 1).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let conn = conn();
        let id = add(&conn, "Anna", "Smith", Some("anna@example.com"));

        let guest = get_required(&conn, id).unwrap();
        assert_eq!(guest.full_name(), "Anna Smith");
        assert_eq!(guest.email.as_deref(), Some("anna@example.com"));
        assert!(guest.dirty);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = conn();
        add(&conn, "Anna", "Smith", Some("anna@example.com"));

        let dup = NewGuest::new("Other", "Person")
            .with_email("ANNA@example.com")
            .validated()
            .unwrap();
        let err = insert(&conn, &dup, 2).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "email", .. }));
    }

    #[test]
    fn test_guests_without_email_coexist() {
        let conn = conn();
        add(&conn, "Anna", "Smith", None);
        add(&conn, "Ben", "Jones", None);
        assert_eq!(list(&conn, &GuestFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_list_order_and_filter() {
        let conn = conn();
        add(&conn, "Zoe", "Adams", None);
        add(&conn, "Anna", "smith", Some("anna@example.com"));
        add(&conn, "Ben", "Adams", None);

        let names: Vec<String> = list(&conn, &GuestFilter::default())
            .unwrap()
            .iter()
            .map(Guest::full_name)
            .collect();
        assert_eq!(names, vec!["Ben Adams", "Zoe Adams", "Anna smith"]);

        let adams = list(
            &conn,
            &GuestFilter {
                last_name: Some("ADAMS".to_string()),
                ..GuestFilter::default()
            },
        )
        .unwrap();
        assert_eq!(adams.len(), 2);

        let by_email = list(
            &conn,
            &GuestFilter {
                email: Some(" Anna@Example.com ".to_string()),
                ..GuestFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_email.len(), 1);
    }

    #[test]
    fn test_update_keeps_own_email() {
        let conn = conn();
        let id = add(&conn, "Anna", "Smith", Some("anna@example.com"));

        let patch = GuestPatch {
            email: Some(Some("anna@example.com".to_string())),
            phone: Some(Some("+1 555 0100".to_string())),
            ..GuestPatch::default()
        }
        .validated()
        .unwrap();
        let guest = update(&conn, id, &patch, 5).unwrap();
        assert_eq!(guest.phone.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn test_update_missing_guest() {
        let conn = conn();
        let err = update(&conn, 42, &GuestPatch::default(), 5).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
