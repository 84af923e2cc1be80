// ABOUTME: PseudoNode row model decoded from the pseudo_nodes table
// ABOUTME: Holds id, optional coordinates, categorical columns and decoded tags

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tokio_postgres::Row;

use super::hstore::{self, Hstore};

/// Column positions of the fixed part of the select list.
/// Categorical columns follow from `FIRST_FIELD_COLUMN` in configured order.
pub(crate) const OSM_ID_COLUMN: usize = 0;
pub(crate) const TAGS_COLUMN: usize = 1;
pub(crate) const X_COLUMN: usize = 2;
pub(crate) const Y_COLUMN: usize = 3;
pub(crate) const FIRST_FIELD_COLUMN: usize = 4;

/// A point of interest derived from an area feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoNode {
    pub osm_id: i64,
    /// Longitude
    pub x: Option<f64>,
    /// Latitude
    pub y: Option<f64>,
    /// Non-null categorical columns as (column, value), in configured order
    pub categories: Vec<(String, String)>,
    pub tags: BTreeMap<String, String>,
}

impl PseudoNode {
    pub fn new(osm_id: i64, x: Option<f64>, y: Option<f64>) -> Self {
        Self {
            osm_id,
            x,
            y,
            categories: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, column: &str, value: &str) -> Self {
        self.categories.push((column.to_string(), value.to_string()));
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// `(lat, lon)` when both coordinates are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.y?, self.x?))
    }

    /// Decode a row produced by the pseudo node select list.
    pub fn from_row(row: &Row, fields: &[String]) -> Result<Self> {
        let osm_id: i64 = row
            .try_get(OSM_ID_COLUMN)
            .context("Failed to decode osm_id")?;
        let raw_tags: Option<Hstore> = row
            .try_get(TAGS_COLUMN)
            .with_context(|| format!("Failed to decode tags of node {}", osm_id))?;
        let x: Option<f64> = row
            .try_get(X_COLUMN)
            .with_context(|| format!("Failed to decode x of node {}", osm_id))?;
        let y: Option<f64> = row
            .try_get(Y_COLUMN)
            .with_context(|| format!("Failed to decode y of node {}", osm_id))?;

        let mut categories = Vec::new();
        for (offset, field) in fields.iter().enumerate() {
            let value: Option<String> = row
                .try_get(FIRST_FIELD_COLUMN + offset)
                .with_context(|| format!("Failed to decode {} of node {}", field, osm_id))?;
            if let Some(value) = value {
                categories.push((field.clone(), value));
            }
        }

        let tags = hstore::into_tags(raw_tags);

        Ok(Self {
            osm_id,
            x,
            y,
            categories,
            tags,
        })
    }
}
