//! Dirty row inspection for sync troubleshooting

use anyhow::Result;

use roomkeep_core::{EntityKind, Store};

use crate::output::Output;

pub async fn list(store: &Store, kind: EntityKind, output: &Output) -> Result<()> {
    let entries = store.list_dirty(kind).await?;
    output.print_dirty(&entries)
}

/// Mark every currently dirty row of `kind` as synced
pub async fn clear(store: &Store, kind: EntityKind, output: &Output) -> Result<()> {
    let entries = store.list_dirty(kind).await?;
    let cleared = store.clear_dirty(kind, &entries).await?;

    if output.is_json() {
        output.json(&serde_json::json!({
            "kind": kind.as_str(),
            "listed": entries.len(),
            "cleared": cleared,
        }))
    } else {
        output.success(&format!("Cleared {} {} row(s)", cleared, kind));
        Ok(())
    }
}
