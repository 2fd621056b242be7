//! Session
//!
//! A connection to GCP: the API clients, the connection-scoped cache of
//! discovered organizations, and the query driver that fans listings out
//! across organizations.

use crate::cache::ConnectionCache;
use crate::config::Settings;
use crate::error::{Error, FetchError};
use crate::gcp::assets::AssetSearchApi;
use crate::gcp::client::GcpClient;
use crate::gcp::organizations::{list_organizations, Organization, OrganizationSearchApi};
use crate::query::{CollectingSink, QueryContext, Qualifiers, RowSink};
use crate::resource::{last_path_element, ListOutcome, OrganizationScopedLister};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Cache key for the discovered organization list
pub const ORGANIZATIONS_CACHE_KEY: &str = "Organizations";

/// Numeric id of one organization to search under
pub type OrganizationScope = String;

/// How one organization's listing ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOutcome {
    pub organization: OrganizationScope,
    pub outcome: ListOutcome,
    pub rows: usize,
}

pub struct Session {
    organizations_api: Arc<dyn OrganizationSearchApi>,
    assets_api: Arc<dyn AssetSearchApi>,
    cache: ConnectionCache<Vec<OrganizationScope>>,
    settings: Settings,
}

impl Session {
    /// Connect with Application Default Credentials
    pub async fn connect(settings: Settings) -> Result<Self, Error> {
        let client = GcpClient::new(settings.endpoints.clone())
            .await
            .map_err(|e| Error::Service(format!("{:#}", e)))?;
        Ok(Self::from_client(client, settings))
    }

    /// Use one REST client for both APIs
    pub fn from_client(client: GcpClient, settings: Settings) -> Self {
        let client = Arc::new(client);
        Self::from_parts(client.clone(), client, settings)
    }

    pub fn from_parts(
        organizations_api: Arc<dyn OrganizationSearchApi>,
        assets_api: Arc<dyn AssetSearchApi>,
        settings: Settings,
    ) -> Self {
        Self {
            organizations_api,
            assets_api,
            cache: ConnectionCache::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Organization ids visible to the caller.
    ///
    /// Discovered once per session and cached. A failed discovery yields
    /// an empty list instead of an error, and is retried on the next call.
    pub async fn organizations(&self, ctx: &QueryContext) -> Vec<OrganizationScope> {
        let result = self
            .cache
            .get_or_try_compute(ORGANIZATIONS_CACHE_KEY, || self.discover_organizations(ctx))
            .await;

        match result {
            Ok(scopes) => {
                tracing::trace!("organizations: {:?}", scopes);
                scopes
            }
            Err(err) => {
                tracing::warn!("Failed to list organizations, continuing without them: {}", err);
                Vec::new()
            }
        }
    }

    async fn discover_organizations(
        &self,
        ctx: &QueryContext,
    ) -> Result<Vec<OrganizationScope>, FetchError> {
        let page_size = organization_page_size(self.settings.organization_page_size, ctx.limit);
        let mut scopes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .organizations_api
                .search_organizations(page_size, page_token.as_deref())
                .await?;

            scopes.extend(
                page.organizations
                    .iter()
                    .map(|org| last_path_element(&org.name).to_string()),
            );

            if ctx.limit.is_some_and(|limit| scopes.len() as u64 >= limit) {
                break;
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Discovered {} organizations", scopes.len());
        Ok(scopes)
    }

    /// Full organization records, uncached
    pub async fn describe_organizations(&self) -> Result<Vec<Organization>, Error> {
        Ok(list_organizations(
            self.organizations_api.as_ref(),
            self.settings.organization_page_size,
        )
        .await?)
    }

    /// List everything under one organization into `sink`
    pub async fn list_scope(
        &self,
        organization: &str,
        ctx: &QueryContext,
        sink: &mut dyn RowSink,
    ) -> Result<ListOutcome, Error> {
        OrganizationScopedLister::new(self.assets_api.as_ref())
            .with_page_size(self.settings.search_page_size)
            .list(organization, ctx, sink)
            .await
    }

    /// Organizations a query runs against: the qualifier when given,
    /// otherwise every discovered organization
    pub async fn scopes(&self, ctx: &QueryContext, quals: &Qualifiers) -> Vec<OrganizationScope> {
        match &quals.organization {
            Some(org) => vec![org.clone()],
            None => self.organizations(ctx).await,
        }
    }

    /// Run the organization / folder / project query.
    ///
    /// Rows reach `sink` grouped by organization, in discovery order, and
    /// in upstream order within each organization. With a concurrency above
    /// one, several organizations are searched at once and each one's rows
    /// are held until the organizations before it have been forwarded.
    pub async fn query(
        &self,
        ctx: &QueryContext,
        quals: &Qualifiers,
        sink: &mut dyn RowSink,
    ) -> Result<Vec<ScopeOutcome>, Error> {
        let scopes = self.scopes(ctx, quals).await;
        let concurrency = self.settings.concurrency.max(1);
        tracing::debug!(
            scopes = scopes.len(),
            concurrency,
            limit = ?ctx.limit,
            "query"
        );

        let mut outcomes = Vec::with_capacity(scopes.len());

        if concurrency == 1 {
            for organization in scopes {
                if sink.rows_remaining() == Some(0) {
                    break;
                }
                let mut counter = CountingSink::new(&mut *sink);
                let outcome = self.list_scope(&organization, ctx, &mut counter).await?;
                outcomes.push(ScopeOutcome {
                    rows: counter.count,
                    organization,
                    outcome,
                });
            }
            return Ok(outcomes);
        }

        let mut listings = stream::iter(scopes.into_iter().map(|organization| async move {
            let mut buffer = CollectingSink::new(ctx);
            let outcome = self.list_scope(&organization, ctx, &mut buffer).await;
            (organization, outcome, buffer.into_rows())
        }))
        .buffered(concurrency);

        while let Some((organization, outcome, rows)) = listings.next().await {
            let mut forwarded = 0;
            for row in rows {
                if sink.rows_remaining() == Some(0) {
                    break;
                }
                sink.emit(row)?;
                forwarded += 1;
            }

            let mut outcome = outcome?;
            if sink.rows_remaining() == Some(0) {
                outcome = ListOutcome::LimitReached;
            }
            outcomes.push(ScopeOutcome {
                organization,
                outcome,
                rows: forwarded,
            });

            if outcome == ListOutcome::LimitReached {
                break;
            }
        }

        Ok(outcomes)
    }
}

/// Organization search page size: the configured size, lowered to the
/// query limit when that is smaller
pub fn organization_page_size(configured: u32, limit: Option<u64>) -> u32 {
    match limit {
        Some(limit) if limit < configured as u64 => limit as u32,
        _ => configured,
    }
}

/// Forwards to another sink and counts what passed through
struct CountingSink<'a> {
    inner: &'a mut dyn RowSink,
    count: usize,
}

impl<'a> CountingSink<'a> {
    fn new(inner: &'a mut dyn RowSink) -> Self {
        Self { inner, count: 0 }
    }
}

impl RowSink for CountingSink<'_> {
    fn emit(&mut self, row: crate::resource::NormalizedResourceRow) -> Result<(), Error> {
        self.inner.emit(row)?;
        self.count += 1;
        Ok(())
    }

    fn rows_remaining(&self) -> Option<u64> {
        self.inner.rows_remaining()
    }
}
