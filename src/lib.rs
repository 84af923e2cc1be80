// ABOUTME: Library root for pseudo-node-osc
// ABOUTME: Exports pseudo nodes from PostGIS as osmChange documents (full dump or diff)

pub mod commands;
pub mod config;
pub mod export;
pub mod osc;
pub mod postgres;
pub mod pseudo_nodes;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use export::ExportStats;
pub use osc::{Action, OscWriter};
pub use pseudo_nodes::PseudoNode;
