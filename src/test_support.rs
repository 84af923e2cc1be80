// ABOUTME: In-memory NodeStore and NodeCursor for orchestrator tests
// ABOUTME: Mirrors the dirty/deleted flag semantics of the pseudo_nodes table

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::osc::Action;
use crate::pseudo_nodes::{NodeCursor, NodeStore, PseudoNode};

#[derive(Debug, Clone)]
pub struct MemoryRow {
    pub node: PseudoNode,
    pub dirty: bool,
    pub deleted: bool,
}

/// Table stand-in keyed by osm_id, recording every page read.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    pub rows: BTreeMap<i64, MemoryRow>,
    /// (action, rows returned) per page read
    pub reads: Vec<(Action, usize)>,
    pub fail_acknowledge: Option<Action>,
}

impl MemoryNodeStore {
    pub fn insert(&mut self, node: PseudoNode, dirty: bool, deleted: bool) {
        self.rows.insert(
            node.osm_id,
            MemoryRow {
                node,
                dirty,
                deleted,
            },
        );
    }

    /// Insert `count` located rows with consecutive ids starting at `first_id`.
    pub fn insert_many(&mut self, first_id: i64, count: i64, dirty: bool, deleted: bool) {
        for id in first_id..first_id + count {
            self.insert(PseudoNode::new(id, Some(1.0), Some(2.0)), dirty, deleted);
        }
    }

    pub fn reads_for(&self, action: Action) -> Vec<usize> {
        self.reads
            .iter()
            .filter(|(read, _)| *read == action)
            .map(|(_, len)| *len)
            .collect()
    }

    fn selects(action: Action, row: &MemoryRow) -> bool {
        match action {
            Action::Delete => row.deleted && !row.dirty,
            Action::Modify => row.dirty && row.deleted,
            Action::Create => row.dirty && !row.deleted,
        }
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn fetch_page(&mut self, action: Action, limit: usize) -> Result<Vec<PseudoNode>> {
        let page: Vec<PseudoNode> = self
            .rows
            .values()
            .filter(|row| Self::selects(action, row))
            .take(limit)
            .map(|row| row.node.clone())
            .collect();
        self.reads.push((action, page.len()));
        Ok(page)
    }

    async fn acknowledge(&mut self, action: Action, ids: &[i64]) -> Result<u64> {
        if self.fail_acknowledge == Some(action) {
            bail!("simulated failure acknowledging <{}>", action);
        }

        let mut affected = 0;
        for id in ids {
            match action {
                Action::Delete => {
                    if self.rows.remove(id).is_some() {
                        affected += 1;
                    }
                }
                Action::Modify => {
                    if let Some(row) = self.rows.get_mut(id) {
                        row.dirty = false;
                        row.deleted = false;
                        affected += 1;
                    }
                }
                Action::Create => {
                    if let Some(row) = self.rows.get_mut(id) {
                        row.dirty = false;
                        affected += 1;
                    }
                }
            }
        }
        Ok(affected)
    }
}

/// Cursor over a fixed list of nodes.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    pub nodes: Vec<PseudoNode>,
    pub position: usize,
    pub reads: Vec<usize>,
}

impl MemoryCursor {
    pub fn new(nodes: Vec<PseudoNode>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }
}

#[async_trait]
impl NodeCursor for MemoryCursor {
    async fn fetch_next(&mut self, limit: usize) -> Result<Vec<PseudoNode>> {
        let page: Vec<PseudoNode> = self
            .nodes
            .iter()
            .skip(self.position)
            .take(limit)
            .cloned()
            .collect();
        self.position += page.len();
        self.reads.push(page.len());
        Ok(page)
    }
}

/// Collapse indented XML output onto one line.
pub fn compact_xml(xml: &[u8]) -> String {
    String::from_utf8_lossy(xml).lines().map(str::trim).collect()
}
