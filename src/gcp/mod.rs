//! GCP API interaction module
//!
//! This module provides the REST plumbing for the two Google Cloud APIs the
//! inventory reads from.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`organizations`] - Cloud Resource Manager organization search
//! - [`assets`] - Cloud Asset Inventory resource search
//!
//! # Example
//!
//! ```ignore
//! use gcporg::gcp::client::{Endpoints, GcpClient};
//! use gcporg::gcp::organizations::list_organizations;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(Endpoints::default()).await?;
//!     let orgs = list_organizations(&client, 1000).await?;
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod auth;
pub mod client;
pub mod http;
pub mod organizations;
