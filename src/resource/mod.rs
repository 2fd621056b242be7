//! Resource normalization layer
//!
//! Turns the Cloud Asset search stream for an organization into uniform
//! rows, whatever kind of resource each result describes.
//!
//! # Architecture
//!
//! - [`path`] - Resource path segment helpers
//! - [`classifier`] - Maps one search result to a [`NormalizedResourceRow`]
//! - [`fetcher`] - Pages through one organization and streams rows to a sink
//!
//! # Example
//!
//! ```ignore
//! use gcporg::query::{CollectingSink, QueryContext};
//! use gcporg::resource::OrganizationScopedLister;
//!
//! async fn folders(client: &gcporg::gcp::client::GcpClient) -> Result<(), gcporg::Error> {
//!     let ctx = QueryContext::with_limit(100);
//!     let mut sink = CollectingSink::new(&ctx);
//!     OrganizationScopedLister::new(client).list("123456", &ctx, &mut sink).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod fetcher;
pub mod path;

pub use classifier::{classify, NormalizedResourceRow, ParentRef, ResourceKind, ResourceType};
pub use fetcher::{
    search_page_size, ListOutcome, OrganizationScopedLister, Page, SearchPager,
    MAX_SEARCH_PAGE_SIZE,
};
pub use path::{last_path_element, last_two_path_elements};
