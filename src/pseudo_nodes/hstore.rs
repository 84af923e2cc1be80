// ABOUTME: Conversion of a decoded hstore column into the node tag map
// ABOUTME: tokio-postgres decodes hstore natively; NULL values are dropped here

use std::collections::{BTreeMap, HashMap};

/// The shape tokio-postgres decodes an `hstore` column into.
pub type Hstore = HashMap<String, Option<String>>;

/// Turn a decoded `tags` column into a key-ordered tag map.
///
/// A NULL column gives an empty map. A pair whose value is SQL NULL is left
/// out, because an osmChange tag needs a value.
pub fn into_tags(column: Option<Hstore>) -> BTreeMap<String, String> {
    column
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(value) => Some((key, value)),
            None => {
                tracing::trace!("Dropping NULL hstore value for key '{}'", key);
                None
            }
        })
        .collect()
}
