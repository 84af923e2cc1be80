// ABOUTME: Export orchestrators producing osmChange documents from pseudo nodes
// ABOUTME: Shared paging state and run statistics for the diff and dump modes

pub mod diff;
pub mod dump;

pub use diff::write_diff;
pub use dump::write_dump;

use crate::osc::Action;

/// Page bookkeeping for a fetch loop.
///
/// A page shorter than the page size means the source is exhausted, so no
/// extra empty read is issued.
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    pages: u64,
    exhausted: bool,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pages: 0,
            exhausted: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Record a fetched page of `len` rows. Returns `false` for an empty page.
    pub fn accept(&mut self, len: usize) -> bool {
        self.pages += 1;
        if len < self.page_size {
            self.exhausted = true;
        }
        len > 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }
}

/// Counters for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Rows removed from the table after the delete section
    pub deleted: u64,
    /// Rows whose flags were cleared after the modify section
    pub modified: u64,
    /// Rows written to a create section
    pub created: u64,
    /// Rows consumed without a node element because a coordinate was missing
    pub skipped: u64,
    /// Page reads issued
    pub pages: u64,
}

impl ExportStats {
    pub fn record(&mut self, action: Action, rows: u64) {
        match action {
            Action::Delete => self.deleted += rows,
            Action::Modify => self.modified += rows,
            Action::Create => self.created += rows,
        }
    }

    pub fn total(&self) -> u64 {
        self.deleted + self.modified + self.created
    }
}
