//! Output formatting
//!
//! Renders normalized rows (or organization records) as a table, JSON,
//! JSON lines, YAML, or CSV.

mod csv;
mod stream;
mod table;

pub use stream::JsonLinesSink;

use crate::gcp::organizations::Organization;
use crate::resource::NormalizedResourceRow;
use clap::ValueEnum;
use serde::Serialize;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    /// One JSON object per line, written as rows arrive
    Jsonl,
    Yaml,
    Csv,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Columns shown by table and CSV output for resource rows
pub const RESOURCE_COLUMNS: &[&str] = &[
    "resource_id",
    "resource_type",
    "name",
    "display_name",
    "lifecycle_state",
    "parent",
    "parent_asset_type",
    "project",
    "location",
];

/// Columns shown by table and CSV output for organizations
pub const ORGANIZATION_COLUMNS: &[&str] = &["id", "name", "display_name", "lifecycle_state"];

/// Rows flattened to strings for tabular output
#[derive(Debug, Clone)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularResult {
    pub fn from_resources(rows: &[NormalizedResourceRow]) -> Self {
        Self {
            columns: RESOURCE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    vec![
                        row.resource_id.to_string(),
                        row.resource_type.to_string(),
                        row.name.clone(),
                        row.display_name.clone(),
                        row.lifecycle_state.clone(),
                        row.parent.clone().unwrap_or_default(),
                        row.parent_asset_type.clone().unwrap_or_default(),
                        row.project.clone().unwrap_or_default(),
                        row.location.clone(),
                    ]
                })
                .collect(),
        }
    }

    pub fn from_organizations(orgs: &[Organization]) -> Self {
        Self {
            columns: ORGANIZATION_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: orgs
                .iter()
                .map(|org| {
                    vec![
                        org.id().to_string(),
                        org.name.clone(),
                        org.display_name.clone(),
                        org.lifecycle_state.clone(),
                    ]
                })
                .collect(),
        }
    }
}

/// Render resource rows in `format`
pub fn format_resources(rows: &[NormalizedResourceRow], format: OutputFormat, no_headers: bool) -> String {
    match format {
        OutputFormat::Table => table::format(&TabularResult::from_resources(rows), no_headers),
        OutputFormat::Csv => csv::format(&TabularResult::from_resources(rows), no_headers),
        _ => format_serialized(rows, format),
    }
}

/// Render organization records in `format`
pub fn format_organizations(orgs: &[Organization], format: OutputFormat, no_headers: bool) -> String {
    match format {
        OutputFormat::Table => table::format(&TabularResult::from_organizations(orgs), no_headers),
        OutputFormat::Csv => csv::format(&TabularResult::from_organizations(orgs), no_headers),
        _ => format_serialized(orgs, format),
    }
}

fn format_serialized<T: Serialize>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(items).unwrap_or_else(|_| "[]".to_string()),
        OutputFormat::Jsonl => items
            .iter()
            .filter_map(|item| serde_json::to_string(item).ok())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string()),
    }
}
