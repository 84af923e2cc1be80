// ABOUTME: osmChange document model and streaming XML writer
// ABOUTME: Exposes the create/modify/delete actions and OscWriter

pub mod writer;

pub use writer::{format_coordinate, OscWriter};

/// An osmChange section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Delete,
    Modify,
    Create,
}

impl Action {
    /// Section order of an incremental diff.
    pub const DIFF_ORDER: [Action; 3] = [Action::Delete, Action::Modify, Action::Create];

    pub fn element_name(self) -> &'static str {
        match self {
            Action::Delete => "delete",
            Action::Modify => "modify",
            Action::Create => "create",
        }
    }

    /// Deleted nodes are written without their tags.
    pub fn includes_tags(self) -> bool {
        !matches!(self, Action::Delete)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.element_name())
    }
}
