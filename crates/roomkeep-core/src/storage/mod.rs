//! Storage layer
//!
//! Owns everything that talks to SQLite below the repositories:
//! schema, starter data and connection bootstrap.

pub mod engine;
pub mod schema;
pub mod seed;

pub use engine::{bootstrap, Bootstrap, EngineLocation};
pub use schema::{ensure_replica_id, init_schema, needs_init, SCHEMA_VERSION};
pub use seed::{seed_rooms, SeedRoom, STARTER_ROOMS};
