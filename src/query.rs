//! Query context and row sinks
//!
//! The narrow contracts a scope listing needs from whoever drives it: an
//! optional row limit, the selected organization qualifier, and a sink that
//! accepts rows in order and reports how many more it wants.

use crate::error::Error;
use crate::resource::NormalizedResourceRow;

/// Per-query settings shared by organization discovery and listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Maximum number of rows the query wants, if any
    pub limit: Option<u64>,
}

impl QueryContext {
    pub fn with_limit(limit: u64) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn unlimited() -> Self {
        Self { limit: None }
    }
}

/// Equality qualifiers supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    /// Restrict the query to one organization id
    pub organization: Option<String>,
}

impl Qualifiers {
    pub fn organization(id: &str) -> Self {
        Self {
            organization: Some(id.to_string()),
        }
    }
}

/// Receives rows one at a time, in order
pub trait RowSink: Send {
    fn emit(&mut self, row: NormalizedResourceRow) -> Result<(), Error>;

    /// Rows still wanted; `None` means no limit
    fn rows_remaining(&self) -> Option<u64>;
}

/// Sink that keeps every row in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    rows: Vec<NormalizedResourceRow>,
    limit: Option<u64>,
}

impl CollectingSink {
    pub fn new(ctx: &QueryContext) -> Self {
        Self {
            rows: Vec::new(),
            limit: ctx.limit,
        }
    }

    pub fn rows(&self) -> &[NormalizedResourceRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<NormalizedResourceRow> {
        self.rows
    }
}

impl RowSink for CollectingSink {
    fn emit(&mut self, row: NormalizedResourceRow) -> Result<(), Error> {
        self.rows.push(row);
        Ok(())
    }

    fn rows_remaining(&self) -> Option<u64> {
        self.limit
            .map(|limit| limit.saturating_sub(self.rows.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use std::collections::BTreeMap;

    fn row(id: i64) -> NormalizedResourceRow {
        NormalizedResourceRow {
            resource_id: id,
            resource_type: ResourceType::Folder,
            name: format!("folders/{}", id),
            display_name: String::new(),
            title: String::new(),
            description: None,
            lifecycle_state: "ACTIVE".to_string(),
            create_time: None,
            update_time: None,
            organization: None,
            parent: Some("organizations/1".to_string()),
            parent_asset_type: Some("Organization".to_string()),
            labels: BTreeMap::new(),
            tags: None,
            akas: vec![format!("gcp:folders/{}", id)],
            location: "global".to_string(),
            project: None,
        }
    }

    #[test]
    fn test_collecting_sink_counts_down() {
        let mut sink = CollectingSink::new(&QueryContext::with_limit(2));
        assert_eq!(sink.rows_remaining(), Some(2));
        sink.emit(row(1)).unwrap();
        assert_eq!(sink.rows_remaining(), Some(1));
        sink.emit(row(2)).unwrap();
        assert_eq!(sink.rows_remaining(), Some(0));
        sink.emit(row(3)).unwrap();
        assert_eq!(sink.rows_remaining(), Some(0));
    }

    #[test]
    fn test_unlimited_sink_has_no_budget() {
        let mut sink = CollectingSink::new(&QueryContext::unlimited());
        sink.emit(row(1)).unwrap();
        assert_eq!(sink.rows_remaining(), None);
        assert_eq!(sink.into_rows().len(), 1);
    }
}
