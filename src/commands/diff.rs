// ABOUTME: Diff command: exports flagged pseudo nodes inside one transaction
// ABOUTME: Commits only after the whole osmChange document has been written

use anyhow::{Context, Result};
use std::io::Write;
use tokio_postgres::Client;

use crate::config::Config;
use crate::export::{write_diff, ExportStats};
use crate::osc::OscWriter;
use crate::pseudo_nodes::PgNodeStore;

/// Run an incremental diff against `client`, writing the document to `out`.
///
/// Deletes and flag updates share one transaction. On error the transaction is
/// dropped and rolled back, leaving the table as it was.
pub async fn run<W: Write>(client: &mut Client, config: &Config, out: W) -> Result<ExportStats> {
    tracing::info!(
        "Starting diff export from {} (page size {})",
        config.export.table,
        config.export.page_size
    );

    let transaction = client
        .transaction()
        .await
        .context("Failed to start diff transaction")?;

    let stats = {
        let mut store = PgNodeStore::new(&transaction, &config.export);
        let mut writer = OscWriter::new(out, config);
        write_diff(&mut store, &mut writer, &config.export).await?
    };

    transaction
        .commit()
        .await
        .context("Failed to commit diff transaction")?;

    tracing::info!(
        "Diff complete: {} deleted, {} modified, {} created, {} skipped without coordinates ({} page reads)",
        stats.deleted,
        stats.modified,
        stats.created,
        stats.skipped,
        stats.pages
    );
    Ok(stats)
}
