//! Command handlers, one module per top-level subcommand

pub mod config;
pub mod dirty;
pub mod guest;
pub mod reservation;
pub mod revenue;
pub mod room;
pub mod status;
pub mod user;
