//! Resource Fetcher
//!
//! Pages through the asset search for one organization and streams
//! classified rows into a sink.

use super::classifier::classify;
use crate::error::{Error, FetchError};
use crate::gcp::assets::{
    AssetSearchApi, ResourceSearchResult, SearchAllResourcesRequest, FOLDER_ASSET_TYPE,
    ORGANIZATION_ASSET_TYPE, PROJECT_ASSET_TYPE,
};
use crate::query::{QueryContext, RowSink};

/// The asset search accepts page sizes in [0, 500]
pub const MAX_SEARCH_PAGE_SIZE: u32 = 500;

/// Result of pulling one page
#[derive(Debug)]
pub enum Page<T> {
    Items { items: Vec<T>, has_more: bool },
    Exhausted,
}

/// Walks `searchAllResources` pages by token
pub struct SearchPager<'a> {
    api: &'a dyn AssetSearchApi,
    request: SearchAllResourcesRequest,
    next_token: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a> SearchPager<'a> {
    pub fn new(api: &'a dyn AssetSearchApi, request: SearchAllResourcesRequest) -> Self {
        Self {
            api,
            request,
            next_token: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or report that there are none left
    pub async fn next_page(&mut self) -> Result<Page<ResourceSearchResult>, FetchError> {
        if self.exhausted {
            return Ok(Page::Exhausted);
        }

        let response = self
            .api
            .search_all_resources(&self.request, self.next_token.as_deref())
            .await?;
        self.pages_fetched += 1;

        self.next_token = response.next_page_token;
        let has_more = self.next_token.is_some();
        self.exhausted = !has_more;

        Ok(Page::Items {
            items: response.results,
            has_more,
        })
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

/// How a scope listing ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// Every page was read
    Done,
    /// The sink's row budget reached zero
    LimitReached,
    /// The scope does not exist or is not searchable
    NotFound,
    /// No organization was selected for this scope
    NoScope,
}

/// Page size for a search: the configured size clamped to [0, 500],
/// lowered further to the query limit when that is smaller
pub fn search_page_size(configured: u32, limit: Option<u64>) -> u32 {
    let page_size = configured.min(MAX_SEARCH_PAGE_SIZE);
    match limit {
        Some(limit) if limit < page_size as u64 => limit as u32,
        _ => page_size,
    }
}

/// Lists organizations, folders, and projects under one organization
pub struct OrganizationScopedLister<'a> {
    api: &'a dyn AssetSearchApi,
    page_size: u32,
}

impl<'a> OrganizationScopedLister<'a> {
    pub fn new(api: &'a dyn AssetSearchApi) -> Self {
        Self {
            api,
            page_size: MAX_SEARCH_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Search request for `organizations/<org>` across the three asset types
    pub fn request(&self, org: &str, ctx: &QueryContext) -> SearchAllResourcesRequest {
        SearchAllResourcesRequest {
            scope: format!("organizations/{}", org),
            asset_types: vec![
                ORGANIZATION_ASSET_TYPE.to_string(),
                PROJECT_ASSET_TYPE.to_string(),
                FOLDER_ASSET_TYPE.to_string(),
            ],
            order_by: "assetType".to_string(),
            page_size: search_page_size(self.page_size, ctx.limit),
        }
    }

    /// Stream every resource under `org` into `sink`.
    ///
    /// Rows are emitted as soon as they are classified. A 404 from the
    /// search ends the listing quietly; any other fetch error is returned
    /// after the rows already emitted. Stops pulling pages once the sink
    /// wants no more rows.
    pub async fn list(
        &self,
        org: &str,
        ctx: &QueryContext,
        sink: &mut dyn RowSink,
    ) -> Result<ListOutcome, Error> {
        if org.is_empty() {
            // The organization qualifier is empty when discovery found nothing to scope by
            tracing::debug!("list_organization_resources: no organization selected");
            return Ok(ListOutcome::NoScope);
        }

        if sink.rows_remaining() == Some(0) {
            return Ok(ListOutcome::LimitReached);
        }

        let request = self.request(org, ctx);
        tracing::debug!(
            org = %org,
            page_size = request.page_size,
            "list_organization_resources"
        );

        let mut pager = SearchPager::new(self.api, request);

        loop {
            let items = match pager.next_page().await {
                Ok(Page::Items { items, .. }) => items,
                Ok(Page::Exhausted) => break,
                Err(FetchError::NotFound(message)) => {
                    tracing::debug!(org = %org, "organization not searchable: {}", message);
                    return Ok(ListOutcome::NotFound);
                }
                Err(err) => {
                    tracing::error!(org = %org, "list_organization_resources api_error: {}", err);
                    return Err(err.into());
                }
            };

            for item in items {
                let row = classify(&item).map_err(|err| {
                    tracing::error!(org = %org, name = %item.name, "could not classify resource: {}", err);
                    err
                })?;
                sink.emit(row)?;

                if sink.rows_remaining() == Some(0) {
                    tracing::debug!(
                        org = %org,
                        pages = pager.pages_fetched(),
                        "row limit reached"
                    );
                    return Ok(ListOutcome::LimitReached);
                }
            }
        }

        Ok(ListOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::assets::SearchAllResourcesResponse;
    use crate::query::CollectingSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn folder(id: u32) -> ResourceSearchResult {
        ResourceSearchResult {
            name: format!("//cloudresourcemanager.googleapis.com/folders/{}", id),
            asset_type: FOLDER_ASSET_TYPE.to_string(),
            organization: "organizations/999".to_string(),
            parent_full_resource_name: "//cloudresourcemanager.googleapis.com/organizations/999"
                .to_string(),
            parent_asset_type: ORGANIZATION_ASSET_TYPE.to_string(),
            ..Default::default()
        }
    }

    /// Serves `total` folders in pages of the requested size, optionally
    /// failing on a given (1-based) call
    struct FakeAssets {
        total: u32,
        fail_on_call: Option<(usize, fn() -> FetchError)>,
        calls: AtomicUsize,
        requests: Mutex<Vec<SearchAllResourcesRequest>>,
    }

    impl FakeAssets {
        fn new(total: u32) -> Self {
            Self {
                total,
                fail_on_call: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(total: u32, call: usize, err: fn() -> FetchError) -> Self {
            Self {
                fail_on_call: Some((call, err)),
                ..Self::new(total)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetSearchApi for FakeAssets {
        async fn search_all_resources(
            &self,
            request: &SearchAllResourcesRequest,
            page_token: Option<&str>,
        ) -> Result<SearchAllResourcesResponse, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());

            if let Some((fail_call, err)) = self.fail_on_call {
                if call == fail_call {
                    return Err(err());
                }
            }

            let start: u32 = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let size = if request.page_size == 0 { 500 } else { request.page_size };
            let end = (start + size).min(self.total);

            Ok(SearchAllResourcesResponse {
                results: (start..end).map(|i| folder(i + 1)).collect(),
                next_page_token: if end < self.total {
                    Some(end.to_string())
                } else {
                    None
                },
            })
        }
    }

    #[test]
    fn test_search_page_size() {
        assert_eq!(search_page_size(500, None), 500);
        assert_eq!(search_page_size(1000, None), 500);
        assert_eq!(search_page_size(500, Some(10)), 10);
        assert_eq!(search_page_size(100, Some(200)), 100);
        assert_eq!(search_page_size(500, Some(0)), 0);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let api = FakeAssets::new(0);
        let lister = OrganizationScopedLister::new(&api);
        let request = lister.request("999", &QueryContext::with_limit(25));

        assert_eq!(request.scope, "organizations/999");
        assert_eq!(request.order_by, "assetType");
        assert_eq!(request.page_size, 25);
        assert_eq!(
            request.asset_types,
            vec![
                ORGANIZATION_ASSET_TYPE.to_string(),
                PROJECT_ASSET_TYPE.to_string(),
                FOLDER_ASSET_TYPE.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_lists_all_pages_in_order() {
        let api = FakeAssets::new(7);
        let lister = OrganizationScopedLister::new(&api).with_page_size(3);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let outcome = lister.list("999", &ctx, &mut sink).await.unwrap();

        assert_eq!(outcome, ListOutcome::Done);
        assert_eq!(api.calls(), 3);
        let ids: Vec<i64> = sink.rows().iter().map(|r| r.resource_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_limit_stops_paging() {
        let api = FakeAssets::new(50);
        let lister = OrganizationScopedLister::new(&api);
        let ctx = QueryContext::with_limit(10);
        let mut sink = CollectingSink::new(&ctx);

        let outcome = lister.list("999", &ctx, &mut sink).await.unwrap();

        assert_eq!(outcome, ListOutcome::LimitReached);
        assert_eq!(sink.rows().len(), 10);
        // page size is capped to the limit, so one page covers it
        assert_eq!(api.calls(), 1);
        assert_eq!(api.requests.lock().unwrap()[0].page_size, 10);
    }

    #[tokio::test]
    async fn test_limit_with_small_pages_fetches_ceil_pages() {
        let api = FakeAssets::new(50);
        let lister = OrganizationScopedLister::new(&api).with_page_size(4);
        let ctx = QueryContext::with_limit(10);
        let mut sink = CollectingSink::new(&ctx);

        lister.list("999", &ctx, &mut sink).await.unwrap();

        assert_eq!(sink.rows().len(), 10);
        assert!(api.calls() <= 3);
    }

    #[tokio::test]
    async fn test_not_found_is_quiet() {
        let api = FakeAssets::failing(10, 1, || FetchError::NotFound("no such org".into()));
        let lister = OrganizationScopedLister::new(&api);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let outcome = lister.list("404", &ctx, &mut sink).await.unwrap();

        assert_eq!(outcome, ListOutcome::NotFound);
        assert!(sink.rows().is_empty());
    }

    #[tokio::test]
    async fn test_api_error_keeps_earlier_rows() {
        let api = FakeAssets::failing(10, 2, || FetchError::Api {
            status: 500,
            message: "backend error".into(),
        });
        let lister = OrganizationScopedLister::new(&api).with_page_size(4);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let err = lister.list("999", &ctx, &mut sink).await.unwrap_err();

        assert!(matches!(err, Error::Fetch(FetchError::Api { status: 500, .. })));
        assert_eq!(sink.rows().len(), 4);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_auth_error_is_service_error() {
        let api = FakeAssets::failing(10, 1, || FetchError::Auth("no ADC".into()));
        let lister = OrganizationScopedLister::new(&api);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let err = lister.list("999", &ctx, &mut sink).await.unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_empty_scope_makes_no_request() {
        let api = FakeAssets::new(10);
        let lister = OrganizationScopedLister::new(&api);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let outcome = lister.list("", &ctx, &mut sink).await.unwrap();

        assert_eq!(outcome, ListOutcome::NoScope);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_limit_makes_no_request() {
        let api = FakeAssets::new(10);
        let lister = OrganizationScopedLister::new(&api);
        let ctx = QueryContext::with_limit(0);
        let mut sink = CollectingSink::new(&ctx);

        let outcome = lister.list("999", &ctx, &mut sink).await.unwrap();

        assert_eq!(outcome, ListOutcome::LimitReached);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_row_aborts_listing() {
        struct BadRow;

        #[async_trait]
        impl AssetSearchApi for BadRow {
            async fn search_all_resources(
                &self,
                _request: &SearchAllResourcesRequest,
                _page_token: Option<&str>,
            ) -> Result<SearchAllResourcesResponse, FetchError> {
                let mut bad = folder(1);
                bad.name = "folders/abc".to_string();
                Ok(SearchAllResourcesResponse {
                    results: vec![folder(2), bad, folder(3)],
                    next_page_token: None,
                })
            }
        }

        let lister = OrganizationScopedLister::new(&BadRow);
        let ctx = QueryContext::unlimited();
        let mut sink = CollectingSink::new(&ctx);

        let err = lister.list("999", &ctx, &mut sink).await.unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(sink.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_pager_reports_exhausted() {
        let api = FakeAssets::new(2);
        let lister = OrganizationScopedLister::new(&api);
        let mut pager = SearchPager::new(&api, lister.request("999", &QueryContext::unlimited()));

        match pager.next_page().await.unwrap() {
            Page::Items { items, has_more } => {
                assert_eq!(items.len(), 2);
                assert!(!has_more);
            }
            Page::Exhausted => panic!("expected a page"),
        }
        assert!(matches!(pager.next_page().await.unwrap(), Page::Exhausted));
        assert_eq!(pager.pages_fetched(), 1);
    }
}
