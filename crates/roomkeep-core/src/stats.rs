//! Read-only aggregates over the current replica
//!
//! Nothing here is cached; every call queries the tables it needs.

use chrono::NaiveDate;
use rusqlite::{named_params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::{DateRange, Money, ReservationStatus, RoomStatus};

/// Room board summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelStats {
    pub total_rooms: u32,
    pub available: u32,
    pub occupied: u32,
    pub reserved: u32,
    pub maintenance: u32,
    pub cleaning: u32,
    /// Whole percent of rooms occupied or reserved
    pub occupancy_rate: u8,
    pub guests: u32,
    pub active_reservations: u32,
}

/// Revenue for one check-in date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub amount: Money,
    pub reservations: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub total: Money,
    pub by_date: Vec<DailyRevenue>,
}

/// Percentage of `taken` over `total`, rounded half up; 0 for no rooms
pub fn occupancy_rate(taken: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let taken = u64::from(taken.min(total));
    let total = u64::from(total);
    let rate = (taken * 200 + total) / (total * 2);
    u8::try_from(rate).unwrap_or(100)
}

fn count(conn: &Connection, sql: &str) -> StoreResult<u32> {
    let n: u32 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n)
}

pub(crate) fn compute_stats(conn: &Connection) -> StoreResult<HotelStats> {
    let mut stats = HotelStats::default();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM rooms GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, RoomStatus>(0)?, row.get::<_, u32>(1)?))
    })?;
    for row in rows {
        let (status, n) = row?;
        stats.total_rooms += n;
        match status {
            RoomStatus::Available => stats.available = n,
            RoomStatus::Occupied => stats.occupied = n,
            RoomStatus::Reserved => stats.reserved = n,
            RoomStatus::Maintenance => stats.maintenance = n,
            RoomStatus::Cleaning => stats.cleaning = n,
        }
    }

    stats.occupancy_rate = occupancy_rate(stats.occupied + stats.reserved, stats.total_rooms);
    stats.guests = count(conn, "SELECT COUNT(*) FROM guests")?;
    stats.active_reservations = count(
        conn,
        "SELECT COUNT(*) FROM reservations WHERE status IN ('confirmed', 'checked_in')",
    )?;
    Ok(stats)
}

/// Revenue from checked-in and completed stays, grouped by check-in date
pub(crate) fn compute_revenue(
    conn: &Connection,
    range: Option<DateRange>,
) -> StoreResult<RevenueReport> {
    let mut stmt = conn.prepare(
        r#"
        SELECT check_in, SUM(total_cents), COUNT(*)
        FROM reservations
        WHERE status IN (:checked_in, :completed)
          AND (:from IS NULL OR check_in >= :from)
          AND (:to IS NULL OR check_in <= :to)
        GROUP BY check_in
        ORDER BY check_in
        "#,
    )?;

    let by_date = stmt
        .query_map(
            named_params! {
                ":checked_in": ReservationStatus::CheckedIn,
                ":completed": ReservationStatus::Completed,
                ":from": range.map(|r| r.from),
                ":to": range.map(|r| r.to),
            },
            |row| {
                Ok(DailyRevenue {
                    date: row.get(0)?,
                    amount: row.get(1)?,
                    reservations: row.get(2)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let total = by_date.iter().map(|day| day.amount).sum();
    Ok(RevenueReport { total, by_date })
}
