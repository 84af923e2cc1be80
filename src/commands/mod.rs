// ABOUTME: Command implementations for the two export modes
// ABOUTME: Resolves the -f / -d switches and runs dump or diff against PostgreSQL

pub mod diff;
pub mod dump;

/// Printed when neither or both mode switches are given.
pub const USAGE: &str = "please use one of -f (full dump) or -d (diff)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every row as a create, read-only
    Full,
    /// Flagged rows as delete/modify/create, acknowledged in one transaction
    Diff,
}

impl Mode {
    /// Exactly one switch selects a mode.
    pub fn from_flags(full: bool, diff: bool) -> Option<Self> {
        match (full, diff) {
            (true, false) => Some(Mode::Full),
            (false, true) => Some(Mode::Diff),
            _ => None,
        }
    }
}
