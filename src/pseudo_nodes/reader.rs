// ABOUTME: PostgreSQL implementations of NodeStore and NodeCursor
// ABOUTME: Builds the pseudo node select list, flag predicates and acknowledgement statements

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_postgres::{GenericClient, Portal, Transaction};

use super::store::{NodeCursor, NodeStore};
use super::PseudoNode;
use crate::config::ExportConfig;
use crate::osc::Action;
use crate::utils::quote_ident;

/// Quote a possibly schema-qualified table name (`schema.table`).
pub fn quote_table(table: &str) -> String {
    table
        .split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// `SELECT` over all pseudo nodes. Column order matches `PseudoNode::from_row`.
pub fn select_sql(config: &ExportConfig) -> String {
    let geometry = quote_ident(&config.geometry_column);
    let mut columns = vec![
        "osm_id::bigint".to_string(),
        "tags".to_string(),
        format!("ST_X({})::float8", geometry),
        format!("ST_Y({})::float8", geometry),
    ];
    columns.extend(
        config
            .fields
            .iter()
            .map(|field| format!("{}::text", quote_ident(field))),
    );

    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_table(&config.table)
    )
}

/// Flag predicate selecting the rows of one diff section.
pub fn predicate(action: Action) -> &'static str {
    match action {
        Action::Delete => "deleted = true AND dirty = false",
        // Rows flagged deleted and then touched again before the delete went out.
        Action::Modify => "dirty = true AND deleted = true",
        Action::Create => "dirty = true AND deleted = false",
    }
}

/// One page of a diff section. `$1` is the page size.
pub fn page_sql(config: &ExportConfig, action: Action) -> String {
    format!(
        "{} WHERE {} ORDER BY osm_id LIMIT $1",
        select_sql(config),
        predicate(action)
    )
}

/// State change applied to exported rows. `$1` is the `bigint[]` of ids,
/// cast explicitly so `integer` id columns accept it.
pub fn acknowledge_sql(config: &ExportConfig, action: Action) -> String {
    let table = quote_table(&config.table);
    match action {
        Action::Delete => format!("DELETE FROM {} WHERE osm_id = ANY($1::bigint[])", table),
        Action::Modify => format!(
            "UPDATE {} SET dirty = false, deleted = false WHERE osm_id = ANY($1::bigint[])",
            table
        ),
        Action::Create => format!(
            "UPDATE {} SET dirty = false WHERE osm_id = ANY($1::bigint[])",
            table
        ),
    }
}

/// Per-section statements, built once per run.
struct SectionStatements {
    page: String,
    acknowledge: String,
}

impl SectionStatements {
    fn new(config: &ExportConfig, action: Action) -> Self {
        Self {
            page: page_sql(config, action),
            acknowledge: acknowledge_sql(config, action),
        }
    }
}

/// Reads flagged rows with `LIMIT`-bounded queries and acknowledges them.
///
/// Meant to run on the diff transaction so every acknowledgement rolls back
/// together on failure.
pub struct PgNodeStore<'a, C: GenericClient + Sync> {
    client: &'a C,
    fields: Vec<String>,
    delete: SectionStatements,
    modify: SectionStatements,
    create: SectionStatements,
}

impl<'a, C: GenericClient + Sync> PgNodeStore<'a, C> {
    pub fn new(client: &'a C, config: &ExportConfig) -> Self {
        Self {
            client,
            fields: config.fields.clone(),
            delete: SectionStatements::new(config, Action::Delete),
            modify: SectionStatements::new(config, Action::Modify),
            create: SectionStatements::new(config, Action::Create),
        }
    }

    fn statements(&self, action: Action) -> &SectionStatements {
        match action {
            Action::Delete => &self.delete,
            Action::Modify => &self.modify,
            Action::Create => &self.create,
        }
    }
}

#[async_trait]
impl<'a, C: GenericClient + Sync> NodeStore for PgNodeStore<'a, C> {
    async fn fetch_page(&mut self, action: Action, limit: usize) -> Result<Vec<PseudoNode>> {
        let limit = i64::try_from(limit).context("Page size does not fit in a bigint")?;
        let sql = self.statements(action).page.as_str();

        let rows = self
            .client
            .query(sql, &[&limit])
            .await
            .with_context(|| format!("Failed to read <{}> page of pseudo nodes", action))?;

        rows.iter()
            .map(|row| PseudoNode::from_row(row, &self.fields))
            .collect()
    }

    async fn acknowledge(&mut self, action: Action, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = self.statements(action).acknowledge.as_str();
        let affected = self
            .client
            .execute(sql, &[&ids])
            .await
            .with_context(|| {
                format!("Failed to acknowledge {} <{}> pseudo nodes", ids.len(), action)
            })?;

        tracing::debug!("Acknowledged {} rows for <{}>", affected, action);
        Ok(affected)
    }
}

/// Forward-only portal over every pseudo node, the protocol-level
/// equivalent of `DECLARE ... CURSOR` / `FETCH FORWARD n`.
pub struct PgNodeCursor<'t, 'c> {
    transaction: &'t Transaction<'c>,
    portal: Portal,
    fields: Vec<String>,
}

impl<'t, 'c> PgNodeCursor<'t, 'c> {
    /// Bind the portal. It lives until the transaction ends.
    pub async fn open(transaction: &'t Transaction<'c>, config: &ExportConfig) -> Result<Self> {
        let sql = select_sql(config);
        let portal = transaction
            .bind(sql.as_str(), &[])
            .await
            .context("Failed to open pseudo node cursor")?;

        Ok(Self {
            transaction,
            portal,
            fields: config.fields.clone(),
        })
    }
}

#[async_trait]
impl<'t, 'c> NodeCursor for PgNodeCursor<'t, 'c> {
    async fn fetch_next(&mut self, limit: usize) -> Result<Vec<PseudoNode>> {
        let max_rows = i32::try_from(limit).context("Page size does not fit in an int")?;
        let rows = self
            .transaction
            .query_portal(&self.portal, max_rows)
            .await
            .context("Failed to fetch from pseudo node cursor")?;

        rows.iter()
            .map(|row| PseudoNode::from_row(row, &self.fields))
            .collect()
    }
}
