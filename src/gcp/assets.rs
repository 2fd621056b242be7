//! Cloud Asset Inventory search
//!
//! Wire types for `searchAllResources` and the trait the scope lister
//! pulls pages through.

use super::client::GcpClient;
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const ORGANIZATION_ASSET_TYPE: &str = "cloudresourcemanager.googleapis.com/Organization";
pub const PROJECT_ASSET_TYPE: &str = "cloudresourcemanager.googleapis.com/Project";
pub const FOLDER_ASSET_TYPE: &str = "cloudresourcemanager.googleapis.com/Folder";

/// One `ResourceSearchResult` as returned by the Cloud Asset API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSearchResult {
    pub name: String,
    pub asset_type: String,
    pub project: String,
    pub folders: Vec<String>,
    pub organization: String,
    pub display_name: String,
    pub description: String,
    pub location: String,
    pub labels: BTreeMap<String, String>,
    pub network_tags: Vec<String>,
    pub state: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub parent_full_resource_name: String,
    pub parent_asset_type: String,
    pub tags: Vec<Value>,
}

/// Parameters of one `searchAllResources` call, minus the page token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAllResourcesRequest {
    /// e.g. `organizations/123`
    pub scope: String,
    pub asset_types: Vec<String>,
    pub order_by: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchAllResourcesResponse {
    pub results: Vec<ResourceSearchResult>,
    pub next_page_token: Option<String>,
}

/// Access to the asset search API
#[async_trait]
pub trait AssetSearchApi: Send + Sync {
    async fn search_all_resources(
        &self,
        request: &SearchAllResourcesRequest,
        page_token: Option<&str>,
    ) -> Result<SearchAllResourcesResponse, FetchError>;
}

#[async_trait]
impl AssetSearchApi for GcpClient {
    async fn search_all_resources(
        &self,
        request: &SearchAllResourcesRequest,
        page_token: Option<&str>,
    ) -> Result<SearchAllResourcesResponse, FetchError> {
        let base = self.cloudasset_url(&format!("{}:searchAllResources", request.scope));
        let mut url = url::Url::parse(&base)?;

        {
            let mut query = url.query_pairs_mut();
            for asset_type in &request.asset_types {
                query.append_pair("assetTypes", asset_type);
            }
            if !request.order_by.is_empty() {
                query.append_pair("orderBy", &request.order_by);
            }
            if request.page_size > 0 {
                query.append_pair("pageSize", &request.page_size.to_string());
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let response = self.get(url.as_str()).await?;
        if response.is_null() {
            return Ok(SearchAllResourcesResponse::default());
        }

        let mut page: SearchAllResourcesResponse = serde_json::from_value(response)?;
        // An empty token means the last page
        if page.next_page_token.as_deref() == Some("") {
            page.next_page_token = None;
        }
        Ok(page)
    }
}
