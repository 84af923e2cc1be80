// ABOUTME: Full dump export: every pseudo node inside a single create section
// ABOUTME: Read-only; pages through a forward cursor without touching flags

use anyhow::{Context, Result};
use std::io::Write;

use super::{ExportStats, Pager};
use crate::config::ExportConfig;
use crate::osc::{Action, OscWriter};
use crate::pseudo_nodes::NodeCursor;

/// Write every row of `cursor` as a `create`.
///
/// Used to seed or fully resynchronize a consumer. Rows still flagged
/// `deleted` are exported like any other row, so they should be purged and
/// `dirty` cleared beforehand:
///
/// ```sql
/// DELETE FROM pseudo_nodes WHERE deleted = true;
/// UPDATE pseudo_nodes SET dirty = false;
/// ```
pub async fn write_dump<C, W>(
    cursor: &mut C,
    writer: &mut OscWriter<W>,
    config: &ExportConfig,
) -> Result<ExportStats>
where
    C: NodeCursor + ?Sized,
    W: Write,
{
    let mut stats = ExportStats::default();
    let mut pager = Pager::new(config.page_size);

    writer.begin()?;
    writer.begin_section(Action::Create)?;

    while !pager.is_exhausted() {
        let page = cursor
            .fetch_next(pager.page_size())
            .await
            .with_context(|| format!("Failed to read dump page {}", pager.pages() + 1))?;
        if !pager.accept(page.len()) {
            break;
        }

        for node in &page {
            if !writer.write_node(node, true)? {
                stats.skipped += 1;
            }
        }
        writer.flush()?;

        stats.record(Action::Create, page.len() as u64);
        tracing::debug!("Dump page {}: {} rows", pager.pages(), page.len());
    }

    writer.end_section()?;
    writer.end()?;

    stats.pages = pager.pages();
    Ok(stats)
}
