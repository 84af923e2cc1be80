// ABOUTME: Access to the pseudo_nodes table: row model, tag decoding and paged reads
// ABOUTME: Re-exports the store traits and their PostgreSQL implementations

pub mod hstore;
pub mod node;
pub mod reader;
pub mod store;

pub use node::PseudoNode;
pub use reader::{PgNodeCursor, PgNodeStore};
pub use store::{NodeCursor, NodeStore};
