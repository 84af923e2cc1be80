// ABOUTME: Incremental diff export: drains delete, modify and create sections
// ABOUTME: Each page is written, flushed, then acknowledged before the next read

use anyhow::{bail, Context, Result};
use std::io::Write;

use super::{ExportStats, Pager};
use crate::config::ExportConfig;
use crate::osc::{Action, OscWriter};
use crate::pseudo_nodes::NodeStore;

/// Write a complete osmChange diff and apply the matching state changes.
///
/// Sections run in `delete`, `modify`, `create` order. A row is acknowledged
/// even when it had no coordinates and produced no node element.
pub async fn write_diff<S, W>(
    store: &mut S,
    writer: &mut OscWriter<W>,
    config: &ExportConfig,
) -> Result<ExportStats>
where
    S: NodeStore + ?Sized,
    W: Write,
{
    let mut stats = ExportStats::default();

    writer.begin()?;
    for action in Action::DIFF_ORDER {
        drain_section(store, writer, action, config.page_size, &mut stats)
            .await
            .with_context(|| format!("Failed to export <{}> section", action))?;
    }
    writer.end()?;

    Ok(stats)
}

async fn drain_section<S, W>(
    store: &mut S,
    writer: &mut OscWriter<W>,
    action: Action,
    page_size: usize,
    stats: &mut ExportStats,
) -> Result<()>
where
    S: NodeStore + ?Sized,
    W: Write,
{
    writer.begin_section(action)?;

    let mut pager = Pager::new(page_size);
    let mut rows = 0u64;

    while !pager.is_exhausted() {
        let page = store.fetch_page(action, pager.page_size()).await?;
        if !pager.accept(page.len()) {
            break;
        }

        let mut ids = Vec::with_capacity(page.len());
        for node in &page {
            if !writer.write_node(node, action.includes_tags())? {
                stats.skipped += 1;
            }
            ids.push(node.osm_id);
        }
        writer.flush()?;

        let affected = store.acknowledge(action, &ids).await?;
        // The next page is selected by the same flags; rows left unacknowledged would be read again.
        if affected == 0 {
            bail!(
                "None of the {} <{}> rows could be acknowledged",
                ids.len(),
                action
            );
        }
        if affected < ids.len() as u64 {
            tracing::warn!(
                "Only {} of {} <{}> rows were acknowledged",
                affected,
                ids.len(),
                action
            );
        }

        stats.record(action, affected);
        rows += page.len() as u64;
        tracing::debug!("<{}> page {}: {} rows", action, pager.pages(), page.len());
    }

    stats.pages += pager.pages();
    writer.end_section()?;

    tracing::info!(
        "Wrote <{}> section: {} rows in {} page reads",
        action,
        rows,
        pager.pages()
    );
    Ok(())
}
