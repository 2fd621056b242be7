//! gcporg - GCP organizations, folders, and projects as one table
//!
//! Discovers the organizations visible to the caller, searches each one with
//! Cloud Asset Inventory, and normalizes every organization, folder, and
//! project into a [`resource::NormalizedResourceRow`].

pub mod cache;
pub mod config;
pub mod error;
pub mod gcp;
pub mod output;
pub mod query;
pub mod resource;
pub mod session;

pub use error::{ClassifyError, Error, FetchError};
pub use query::{CollectingSink, QueryContext, Qualifiers, RowSink};
pub use resource::{NormalizedResourceRow, ResourceType};
pub use session::Session;
