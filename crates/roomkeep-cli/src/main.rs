//! Roomkeep CLI
//!
//! Command-line front desk for a roomkeep replica.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use roomkeep_core::{
    Config, EntityKind, GuestId, GuestRef, Money, NewGuest, NewUser, ReservationId,
    ReservationStatus, RoomStatus, StayRequest, Store, UserId, UserRole,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "roomkeep")]
#[command(about = "Roomkeep - offline-first hotel front desk")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local database and seed the starter rooms
    Init,
    /// Show occupancy and pending sync work
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Manage rooms
    Room {
        #[command(subcommand)]
        command: RoomCommands,
    },
    /// Manage reservations
    Reservation {
        #[command(subcommand)]
        command: ReservationCommands,
    },
    /// Manage guests
    Guest {
        #[command(subcommand)]
        command: GuestCommands,
    },
    /// Manage staff users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Revenue from checked-in and completed stays
    Revenue {
        /// First check-in date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last check-in date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Inspect rows waiting for sync
    Dirty {
        #[command(subcommand)]
        command: DirtyCommands,
    },
}

#[derive(Subcommand)]
enum RoomCommands {
    /// List rooms
    #[command(alias = "ls")]
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<RoomStatus>,
        /// Filter by room type
        #[arg(short = 't', long = "type")]
        room_type: Option<String>,
    },
    /// Show room details
    Show { number: String },
    /// Add a room to the catalog
    Add {
        number: String,
        /// Room type, e.g. Double
        room_type: String,
        /// Nightly price, e.g. 120.00
        price: Money,
        /// Amenity (repeatable)
        #[arg(short, long)]
        amenity: Vec<String>,
    },
    /// Reserve an available room
    Reserve {
        number: String,
        #[command(flatten)]
        stay: StayArgs,
    },
    /// Check in (walk-ins need guest and dates)
    CheckIn {
        number: String,
        #[command(flatten)]
        stay: StayArgs,
    },
    /// Check out and free the room
    CheckOut { number: String },
    /// Put a room under maintenance
    Maintenance { number: String },
    /// Send a room to cleaning
    Cleaning { number: String },
    /// Make a room available again
    Available { number: String },
}

/// Guest and dates for reserving or checking in
#[derive(Args, Clone, Debug, Default)]
struct StayArgs {
    /// Existing guest id
    #[arg(long, conflicts_with_all = ["first_name", "last_name"])]
    guest: Option<GuestId>,
    /// First name of a new guest
    #[arg(long)]
    first_name: Option<String>,
    /// Last name of a new guest
    #[arg(long)]
    last_name: Option<String>,
    /// Email of a new guest
    #[arg(long)]
    email: Option<String>,
    /// Check-in date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Check-out date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Total amount; defaults to nights × nightly price
    #[arg(long)]
    total: Option<Money>,
}

impl StayArgs {
    fn is_empty(&self) -> bool {
        self.guest.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.total.is_none()
    }

    /// Build a stay request, or `None` when no stay option was given
    fn into_request(self) -> Result<Option<StayRequest>> {
        if self.is_empty() {
            return Ok(None);
        }

        let guest = match (self.guest, self.first_name, self.last_name) {
            (Some(id), _, _) => GuestRef::Existing(id),
            (None, Some(first), Some(last)) => {
                let mut guest = NewGuest::new(first, last);
                guest.email = self.email;
                GuestRef::New(guest)
            }
            _ => bail!("Give --guest <id>, or --first-name and --last-name for a new guest"),
        };
        let (Some(from), Some(to)) = (self.from, self.to) else {
            bail!("Both --from and --to are required");
        };

        let mut stay = StayRequest::new(guest, from, to);
        stay.total_amount = self.total;
        Ok(Some(stay))
    }

    fn require(self) -> Result<StayRequest> {
        self.into_request()?
            .context("Guest and dates are required (--guest or --first-name/--last-name, --from, --to)")
    }
}

#[derive(Subcommand)]
enum ReservationCommands {
    /// List reservations
    #[command(alias = "ls")]
    List {
        /// Filter by room number
        #[arg(long)]
        room: Option<String>,
        /// Filter by guest id
        #[arg(long)]
        guest: Option<GuestId>,
        /// Filter by status
        #[arg(short, long)]
        status: Option<ReservationStatus>,
    },
    /// Cancel a confirmed reservation
    Cancel { id: ReservationId },
}

#[derive(Subcommand)]
enum GuestCommands {
    /// Register a guest
    #[command(alias = "add")]
    Create {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List guests
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a staff user
    #[command(alias = "add")]
    Create {
        email: String,
        full_name: String,
        #[arg(short, long, default_value = "staff")]
        role: UserRole,
        #[arg(short, long)]
        department: Option<String>,
    },
    /// List users
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        role: Option<UserRole>,
        /// Only active (true) or inactive (false) users
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a user
    Deactivate { id: UserId },
}

#[derive(Subcommand)]
enum DirtyCommands {
    /// List rows changed since the last sync
    #[command(alias = "ls")]
    List { kind: EntityKind },
    /// Mark all currently dirty rows of a kind as synced
    Clear { kind: EntityKind },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_file, log_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.unwrap_or_else(Config::config_file_path);

    // Config commands work even when the config file is broken
    if let Commands::Config { command } = cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(&config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(&key, &value, &config_path, &output)
            }
        };
    }

    let config = Config::load_from_path(&config_path).context("Failed to load configuration")?;
    init_logging(&config.log_level);
    debug!("Using database {:?}", config.database_path());

    let store = Store::open(&config);
    store
        .initialize()
        .await
        .context("Failed to open the hotel database")?;

    match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Init => {
            output.success(&format!(
                "Database ready at {} (replica {})",
                config.database_path().display(),
                store.replica_id()?
            ));
            Ok(())
        }
        Commands::Status => commands::status::show(&store, &config, &output).await,
        Commands::Room { command } => handle_room_command(command, &store, &output).await,
        Commands::Reservation { command } => {
            handle_reservation_command(command, &store, &output).await
        }
        Commands::Guest { command } => handle_guest_command(command, &store, &output).await,
        Commands::User { command } => handle_user_command(command, &store, &output).await,
        Commands::Revenue { from, to } => commands::revenue::show(&store, from, to, &output).await,
        Commands::Dirty { command } => match command {
            DirtyCommands::List { kind } => commands::dirty::list(&store, kind, &output).await,
            DirtyCommands::Clear { kind } => commands::dirty::clear(&store, kind, &output).await,
        },
    }
}

async fn handle_room_command(command: RoomCommands, store: &Store, output: &Output) -> Result<()> {
    use commands::room;

    match command {
        RoomCommands::List { status, room_type } => room::list(store, status, room_type, output).await,
        RoomCommands::Show { number } => room::show(store, &number, output).await,
        RoomCommands::Add {
            number,
            room_type,
            price,
            amenity,
        } => room::add(store, number, room_type, price, amenity, output).await,
        RoomCommands::Reserve { number, stay } => {
            room::reserve(store, &number, stay.require()?, output).await
        }
        RoomCommands::CheckIn { number, stay } => {
            room::check_in(store, &number, stay.into_request()?, output).await
        }
        RoomCommands::CheckOut { number } => room::check_out(store, &number, output).await,
        RoomCommands::Maintenance { number } => {
            room::housekeeping(store, &number, RoomStatus::Maintenance, output).await
        }
        RoomCommands::Cleaning { number } => {
            room::housekeeping(store, &number, RoomStatus::Cleaning, output).await
        }
        RoomCommands::Available { number } => {
            room::housekeeping(store, &number, RoomStatus::Available, output).await
        }
    }
}

async fn handle_reservation_command(
    command: ReservationCommands,
    store: &Store,
    output: &Output,
) -> Result<()> {
    match command {
        ReservationCommands::List {
            room,
            guest,
            status,
        } => commands::reservation::list(store, room, guest, status, output).await,
        ReservationCommands::Cancel { id } => {
            commands::reservation::cancel(store, id, output).await
        }
    }
}

async fn handle_guest_command(command: GuestCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        GuestCommands::Create {
            first_name,
            last_name,
            email,
            phone,
            address,
        } => {
            let guest = NewGuest {
                email,
                phone,
                address,
                ..NewGuest::new(first_name, last_name)
            };
            commands::guest::add(store, guest, output).await
        }
        GuestCommands::List { email, last_name } => {
            commands::guest::list(store, email, last_name, output).await
        }
    }
}

async fn handle_user_command(command: UserCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        UserCommands::Create {
            email,
            full_name,
            role,
            department,
        } => {
            let user = NewUser {
                department,
                ..NewUser::new(email, full_name, role)
            };
            commands::user::add(store, user, output).await
        }
        UserCommands::List { role, active } => {
            commands::user::list(store, role, active, output).await
        }
        UserCommands::Deactivate { id } => commands::user::deactivate(store, id, output).await,
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "roomkeep_core={},roomkeep_cli={}",
            log_level, log_level
        ))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
