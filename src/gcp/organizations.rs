//! GCP Organizations
//!
//! Searching the organizations visible to the caller.

use super::client::GcpClient;
use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Organization information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    /// `organizations/<id>`
    pub name: String,
    pub display_name: String,
    pub lifecycle_state: String,
    pub creation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
}

impl Organization {
    /// Numeric organization id, the last segment of `name`
    pub fn id(&self) -> &str {
        crate::resource::last_path_element(&self.name)
    }
}

/// One page of an organization search
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationPage {
    pub organizations: Vec<Organization>,
    pub next_page_token: Option<String>,
}

/// Access to the organization search API
#[async_trait]
pub trait OrganizationSearchApi: Send + Sync {
    async fn search_organizations(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<OrganizationPage, FetchError>;
}

#[async_trait]
impl OrganizationSearchApi for GcpClient {
    async fn search_organizations(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<OrganizationPage, FetchError> {
        let url = self.resourcemanager_url("organizations:search");

        let mut body = json!({ "pageSize": page_size });
        if let Some(token) = page_token {
            body["pageToken"] = Value::String(token.to_string());
        }

        let response = self.post(&url, &body).await?;
        if response.is_null() {
            return Ok(OrganizationPage::default());
        }

        let mut page: OrganizationPage = serde_json::from_value(response)?;
        if page.next_page_token.as_deref() == Some("") {
            page.next_page_token = None;
        }
        Ok(page)
    }
}

/// List every organization visible to the caller, following page tokens
pub async fn list_organizations(
    api: &dyn OrganizationSearchApi,
    page_size: u32,
) -> Result<Vec<Organization>, FetchError> {
    let mut all = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = api
            .search_organizations(page_size, page_token.as_deref())
            .await?;
        all.extend(page.organizations);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(all)
}
