// ABOUTME: Storage seams used by the export orchestrators
// ABOUTME: NodeStore drains flagged rows page by page, NodeCursor scans every row

use anyhow::Result;
use async_trait::async_trait;

use super::PseudoNode;
use crate::osc::Action;

/// Source of flagged rows for an incremental diff.
///
/// Each page is fetched after the previous page was acknowledged, so a
/// `LIMIT`-bounded query always returns rows that have not been exported yet.
#[async_trait]
pub trait NodeStore: Send {
    /// Fetch up to `limit` rows selected by `action`.
    async fn fetch_page(&mut self, action: Action, limit: usize) -> Result<Vec<PseudoNode>>;

    /// Apply the state change of `action` to `ids` and return the affected row count.
    ///
    /// `Delete` removes the rows, `Modify` clears both flags, `Create` clears `dirty`.
    async fn acknowledge(&mut self, action: Action, ids: &[i64]) -> Result<u64>;
}

/// Forward-only scan over every row, used for full dumps.
#[async_trait]
pub trait NodeCursor: Send {
    async fn fetch_next(&mut self, limit: usize) -> Result<Vec<PseudoNode>>;
}
