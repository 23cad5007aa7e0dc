//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::{Context, Result};
use serde::Serialize;

use roomkeep_core::{
    DirtyCounts, DirtyEntry, Guest, HotelStats, Reservation, RevenueReport, Room,
    TransitionOutcome, User,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(())
    }

    /// Print a single room
    pub fn print_room(&self, room: &Room) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Room:      {}", room.number);
                println!("Type:      {}", room.room_type);
                println!("Price:     {} / night", room.price_per_night);
                println!("Status:    {}", room.status);
                if !room.amenities.is_empty() {
                    println!("Amenities: {}", room.amenities.join(", "));
                }
                if let Some(ref occupant) = room.occupant {
                    println!(
                        "Guest:     {} ({} to {}, reservation {})",
                        occupant.guest_name,
                        occupant.check_in,
                        occupant.check_out,
                        occupant.reservation_id
                    );
                }
                println!("Updated:   {}", room.updated_at.format("%Y-%m-%d %H:%M"));
                if room.dirty {
                    println!("           (not yet synced)");
                }
            }
            OutputFormat::Json => self.json(room)?,
            OutputFormat::Quiet => println!("{}", room.number),
        }
        Ok(())
    }

    /// Print the room board
    pub fn print_rooms(&self, rooms: &[Room]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if rooms.is_empty() {
                    println!("No rooms found.");
                    return Ok(());
                }
                for room in rooms {
                    let guest = room
                        .occupant
                        .as_ref()
                        .map(|o| format!(" | {} until {}", truncate(&o.guest_name, 24), o.check_out))
                        .unwrap_or_default();
                    println!(
                        "{:<5} | {:<8} | {:>8} | {:<11}{}",
                        room.number,
                        truncate(&room.room_type, 8),
                        room.price_per_night.to_string(),
                        room.status.as_str(),
                        guest
                    );
                }
                println!("\n{} room(s)", rooms.len());
            }
            OutputFormat::Json => self.json(rooms)?,
            OutputFormat::Quiet => {
                for room in rooms {
                    println!("{}", room.number);
                }
            }
        }
        Ok(())
    }

    /// Print the result of a room lifecycle event
    pub fn print_outcome(&self, outcome: &TransitionOutcome) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Room {} is now {}", outcome.room.number, outcome.room.status);
                if let Some(ref reservation) = outcome.reservation {
                    println!(
                        "  Reservation {}: {} ({} to {}, {})",
                        reservation.id,
                        reservation.status,
                        reservation.check_in,
                        reservation.check_out,
                        reservation.total_amount
                    );
                }
            }
            OutputFormat::Json => self.json(outcome)?,
            OutputFormat::Quiet => {
                if let Some(ref reservation) = outcome.reservation {
                    println!("{}", reservation.id);
                }
            }
        }
        Ok(())
    }

    pub fn print_reservations(&self, reservations: &[Reservation]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if reservations.is_empty() {
                    println!("No reservations found.");
                    return Ok(());
                }
                for r in reservations {
                    println!(
                        "#{:<5} | room {:<4} | guest {:<5} | {} → {} ({} night(s)) | {:>9} | {}",
                        r.id,
                        r.room_id,
                        r.guest_id,
                        r.check_in,
                        r.check_out,
                        r.nights(),
                        r.total_amount.to_string(),
                        r.status
                    );
                }
                println!("\n{} reservation(s)", reservations.len());
            }
            OutputFormat::Json => self.json(reservations)?,
            OutputFormat::Quiet => {
                for r in reservations {
                    println!("{}", r.id);
                }
            }
        }
        Ok(())
    }

    pub fn print_guests(&self, guests: &[Guest]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if guests.is_empty() {
                    println!("No guests found.");
                    return Ok(());
                }
                for g in guests {
                    println!(
                        "{:<5} | {:<30} | {}",
                        g.id,
                        truncate(&g.full_name(), 30),
                        g.email.as_deref().unwrap_or("-")
                    );
                }
                println!("\n{} guest(s)", guests.len());
            }
            OutputFormat::Json => self.json(guests)?,
            OutputFormat::Quiet => {
                for g in guests {
                    println!("{}", g.id);
                }
            }
        }
        Ok(())
    }

    pub fn print_users(&self, users: &[User]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if users.is_empty() {
                    println!("No users found.");
                    return Ok(());
                }
                for u in users {
                    println!(
                        "{:<5} | {:<30} | {:<24} | {:<7} | {}{}",
                        u.id,
                        truncate(&u.email, 30),
                        truncate(&u.full_name, 24),
                        u.role,
                        u.department.as_deref().unwrap_or("-"),
                        if u.active { "" } else { " (inactive)" }
                    );
                }
                println!("\n{} user(s)", users.len());
            }
            OutputFormat::Json => self.json(users)?,
            OutputFormat::Quiet => {
                for u in users {
                    println!("{}", u.id);
                }
            }
        }
        Ok(())
    }

    pub fn print_stats(&self, stats: &HotelStats, dirty: &DirtyCounts) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Rooms:        {}", stats.total_rooms);
                println!("  available:  {}", stats.available);
                println!("  occupied:   {}", stats.occupied);
                println!("  reserved:   {}", stats.reserved);
                println!("  cleaning:   {}", stats.cleaning);
                println!("  maintenance:{:>2}", stats.maintenance);
                println!("Occupancy:    {}%", stats.occupancy_rate);
                println!("Guests:       {}", stats.guests);
                println!("Active stays: {}", stats.active_reservations);
                println!();
                println!("Unsynced changes: {}", dirty.total());
                if dirty.total() > 0 {
                    println!(
                        "  rooms {}, guests {}, reservations {}, users {}",
                        dirty.rooms, dirty.guests, dirty.reservations, dirty.users
                    );
                }
            }
            OutputFormat::Json => self.json(&serde_json::json!({
                "stats": stats,
                "dirty": dirty,
            }))?,
            OutputFormat::Quiet => println!("{}", stats.occupancy_rate),
        }
        Ok(())
    }

    pub fn print_revenue(&self, report: &RevenueReport) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if report.by_date.is_empty() {
                    println!("No revenue in range.");
                    return Ok(());
                }
                for day in &report.by_date {
                    println!(
                        "{} | {:>10} | {} stay(s)",
                        day.date,
                        day.amount.to_string(),
                        day.reservations
                    );
                }
                println!("\nTotal: {}", report.total);
            }
            OutputFormat::Json => self.json(report)?,
            OutputFormat::Quiet => println!("{}", report.total),
        }
        Ok(())
    }

    pub fn print_dirty(&self, entries: &[DirtyEntry]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("Nothing to sync.");
                    return Ok(());
                }
                for entry in entries {
                    println!("{} (updated_at={})", entry.id, entry.updated_at_ms);
                }
                println!("\n{} dirty row(s)", entries.len());
            }
            OutputFormat::Json => self.json(entries)?,
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
