// ABOUTME: Full dump command: exports every pseudo node as a create
// ABOUTME: Reads through a portal inside a read-only transaction

use anyhow::{Context, Result};
use std::io::Write;
use tokio_postgres::Client;

use crate::config::Config;
use crate::export::{write_dump, ExportStats};
use crate::osc::OscWriter;
use crate::pseudo_nodes::PgNodeCursor;

/// Run a full dump against `client`, writing the document to `out`.
pub async fn run<W: Write>(client: &mut Client, config: &Config, out: W) -> Result<ExportStats> {
    tracing::info!(
        "Starting full dump of {} (page size {})",
        config.export.table,
        config.export.page_size
    );

    let transaction = client
        .build_transaction()
        .read_only(true)
        .start()
        .await
        .context("Failed to start dump transaction")?;

    let stats = {
        let mut cursor = PgNodeCursor::open(&transaction, &config.export).await?;
        let mut writer = OscWriter::new(out, config);
        write_dump(&mut cursor, &mut writer, &config.export).await?
    };

    transaction
        .commit()
        .await
        .context("Failed to close dump transaction")?;

    tracing::info!(
        "Dump complete: {} rows, {} skipped without coordinates ({} page reads)",
        stats.created,
        stats.skipped,
        stats.pages
    );
    Ok(stats)
}
