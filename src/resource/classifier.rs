//! Resource classification
//!
//! Turns one heterogeneous asset search result into a
//! [`NormalizedResourceRow`]. The resource kind is decided once from the
//! asset type tag, and every kind-specific field is derived from that
//! decision.

use super::path::{last_path_element, last_two_path_elements};
use crate::error::ClassifyError;
use crate::gcp::assets::ResourceSearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The three resource kinds in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Organization,
    Project,
    Folder,
}

impl ResourceType {
    /// Map the last segment of an asset type tag to a kind
    pub fn from_asset_type(asset_type: &str) -> Option<Self> {
        match last_path_element(asset_type) {
            "Organization" => Some(ResourceType::Organization),
            "Project" => Some(ResourceType::Project),
            "Folder" => Some(ResourceType::Folder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Organization => "Organization",
            ResourceType::Project => "Project",
            ResourceType::Folder => "Folder",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parent link shared by projects and folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// `kind/id`, e.g. `organizations/999`
    pub name: String,
    /// e.g. `Organization`
    pub asset_type: String,
}

/// Kind-specific payload of a classified result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Organization {
        id: i64,
        name: String,
    },
    Folder {
        id: i64,
        parent: ParentRef,
    },
    Project {
        id: i64,
        name: String,
        /// The project's own id, last segment of the resource name
        project: String,
        parent: ParentRef,
    },
}

impl ResourceKind {
    /// Decide the kind of `raw` and extract its identity fields
    pub fn from_search_result(raw: &ResourceSearchResult) -> Result<Self, ClassifyError> {
        let resource_type = ResourceType::from_asset_type(&raw.asset_type)
            .ok_or_else(|| ClassifyError::UnsupportedAssetType(raw.asset_type.clone()))?;

        let kind = match resource_type {
            ResourceType::Organization => ResourceKind::Organization {
                id: parse_resource_id(&raw.organization)?,
                name: raw.organization.clone(),
            },
            ResourceType::Folder => ResourceKind::Folder {
                id: parse_resource_id(&raw.name)?,
                parent: parent_ref(raw)?,
            },
            ResourceType::Project => ResourceKind::Project {
                id: parse_resource_id(&raw.project)?,
                name: raw.project.clone(),
                project: last_path_element(&raw.name).to_string(),
                parent: parent_ref(raw)?,
            },
        };

        Ok(kind)
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Organization { .. } => ResourceType::Organization,
            ResourceKind::Folder { .. } => ResourceType::Folder,
            ResourceKind::Project { .. } => ResourceType::Project,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ResourceKind::Organization { id, .. }
            | ResourceKind::Folder { id, .. }
            | ResourceKind::Project { id, .. } => *id,
        }
    }

    /// Canonical resource name
    pub fn name(&self) -> String {
        match self {
            ResourceKind::Organization { name, .. } | ResourceKind::Project { name, .. } => {
                name.clone()
            }
            ResourceKind::Folder { id, .. } => format!("folders/{}", id),
        }
    }

    pub fn parent(&self) -> Option<&ParentRef> {
        match self {
            ResourceKind::Organization { .. } => None,
            ResourceKind::Folder { parent, .. } | ResourceKind::Project { parent, .. } => {
                Some(parent)
            }
        }
    }

    pub fn project(&self) -> Option<&str> {
        match self {
            ResourceKind::Project { project, .. } => Some(project),
            _ => None,
        }
    }
}

/// One output row, identical in shape for every resource kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResourceRow {
    pub resource_id: i64,
    pub resource_type: ResourceType,
    pub name: String,
    pub display_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lifecycle_state: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub organization: Option<String>,
    pub parent: Option<String>,
    pub parent_asset_type: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub tags: Option<Vec<Value>>,
    pub akas: Vec<String>,
    pub location: String,
    pub project: Option<String>,
}

/// Normalize one search result into a row.
///
/// A resource id that is not an integer is an error, never a default.
pub fn classify(raw: &ResourceSearchResult) -> Result<NormalizedResourceRow, ClassifyError> {
    let kind = ResourceKind::from_search_result(raw)?;
    let parent = kind.parent();

    let row = NormalizedResourceRow {
        resource_id: kind.id(),
        resource_type: kind.resource_type(),
        name: kind.name(),
        display_name: raw.display_name.clone(),
        title: raw.display_name.clone(),
        description: non_empty(&raw.description),
        lifecycle_state: raw.state.clone(),
        create_time: raw.create_time,
        update_time: raw
            .update_time
            .filter(|t| t.timestamp() != 0 || t.timestamp_subsec_nanos() != 0),
        organization: non_empty(&raw.organization),
        parent: parent.map(|p| p.name.clone()),
        parent_asset_type: parent.map(|p| p.asset_type.clone()).and_then(|s| non_empty(&s)),
        labels: raw.labels.clone(),
        tags: if raw.tags.is_empty() {
            None
        } else {
            Some(raw.tags.clone())
        },
        akas: vec![format!("gcp:{}", raw.name)],
        location: raw.location.clone(),
        project: kind.project().map(|p| p.to_string()),
    };

    tracing::trace!(
        resource_id = row.resource_id,
        resource_type = %row.resource_type,
        name = %row.name,
        parent = ?row.parent,
        "classified search result"
    );

    Ok(row)
}

fn parse_resource_id(path: &str) -> Result<i64, ClassifyError> {
    let value = last_path_element(path);
    value
        .parse::<i64>()
        .map_err(|source| ClassifyError::InvalidResourceId {
            name: path.to_string(),
            value: value.to_string(),
            source,
        })
}

fn parent_ref(raw: &ResourceSearchResult) -> Result<ParentRef, ClassifyError> {
    let name = last_two_path_elements(&raw.parent_full_resource_name)
        .ok_or_else(|| ClassifyError::MalformedParent(raw.parent_full_resource_name.clone()))?;

    Ok(ParentRef {
        name,
        asset_type: last_path_element(&raw.parent_asset_type).to_string(),
    })
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
