//! Status command handler

use anyhow::Result;

use roomkeep_core::{Config, Store};

use crate::output::{Output, OutputFormat};

/// Show replica location, occupancy and pending sync work
pub async fn show(store: &Store, config: &Config, output: &Output) -> Result<()> {
    let stats = store.get_stats().await?;
    let dirty = store.dirty_counts().await?;

    if output.format == OutputFormat::Human {
        println!("Roomkeep Status");
        println!("===============");
        println!();
        println!("Replica:  {}", store.replica_id()?);
        println!("Database: {}", config.database_path().display());
        println!();
    }
    output.print_stats(&stats, &dirty)
}
