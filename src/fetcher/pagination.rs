//! Paginated fetch-and-merge
//!
//! Page 1 is requested without a `page` parameter and carries the header
//! metadata (declared total, owner identity). Later pages are requested with
//! `page=2, 3, ...` and merged into the same aggregate until one of:
//!
//! - the aggregate reports it has everything it expects ([`PageAggregate::needs_more`])
//! - a page yields zero new items (the server over- or under-counted)
//! - a later page fails with a protocol error (partial result is kept)
//!
//! Includes a hard page cap against runaway loops.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::bgg_http::BggHttpClient;
use super::{FetcherError, FetcherResult};

/// Maximum number of pages requested for one aggregate
pub const MAX_PAGES: usize = 10_000;

/// Error returned by a progress callback to abort a fetch
pub type ProgressError = Box<dyn std::error::Error + Send + Sync>;

/// Receives `(fetched, total)` after every merged page
///
/// Returning an error aborts the fetch with [`FetcherError::Aborted`].
pub trait ProgressSink: Send {
    /// Report progress
    fn report(&mut self, fetched: usize, total: usize) -> Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize) -> Result<(), ProgressError> + Send,
{
    fn report(&mut self, fetched: usize, total: usize) -> Result<(), ProgressError> {
        self(fetched, total)
    }
}

/// An entity assembled from one or more pages of the same endpoint
pub trait PageAggregate: Sized + Send {
    /// Caller supplied identity (guild id, user name, ...)
    type Owner: ?Sized + Sync;
    /// Parsed page document
    type Page: DeserializeOwned + Send;

    /// Items the endpoint lists per page, when the API documents it
    const PAGE_SIZE: Option<usize> = None;

    /// Build the aggregate from page 1, including its items.
    ///
    /// Fails with [`FetcherError::NotFound`] when the header shows the owner
    /// does not exist.
    fn from_first_page(owner: &Self::Owner, page: Self::Page) -> FetcherResult<Self>;

    /// Merge a later page, returning how many new items it contributed
    fn merge_page(&mut self, page: Self::Page) -> FetcherResult<usize>;

    /// Whether the declared total has not been reached yet
    fn needs_more(&self) -> bool;

    /// Items accumulated so far
    fn accumulated(&self) -> usize;

    /// `(fetched, total)` as reported to the progress callback
    fn progress(&self) -> (usize, usize);
}

/// Pages needed to list `total` items `page_size` at a time (at least one)
pub fn expected_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// Pagination driver shared by every paged endpoint
pub struct PaginationHelper;

impl PaginationHelper {
    /// Fetch every page of `endpoint` into an `A`
    ///
    /// # Arguments
    /// * `http` - client applying the retry policy per page
    /// * `endpoint` - API path (e.g. `"guild"`)
    /// * `params` - query parameters sent with every page
    /// * `owner` - identity passed to [`PageAggregate::from_first_page`]
    /// * `progress` - optional callback invoked after each merged page
    ///
    /// # Errors
    /// Any error on page 1, a callback error, or exceeding [`MAX_PAGES`].
    /// Non-protocol errors on later pages propagate as well.
    pub async fn fetch_all<A>(
        http: &BggHttpClient,
        endpoint: &str,
        params: &[(&str, String)],
        owner: &A::Owner,
        mut progress: Option<&mut dyn ProgressSink>,
    ) -> FetcherResult<A>
    where
        A: PageAggregate,
    {
        let first: A::Page = http.fetch_page(endpoint, params).await?;
        let mut aggregate = A::from_first_page(owner, first)?;
        Self::report(&mut progress, &aggregate)?;

        if let Some(page_size) = A::PAGE_SIZE {
            let (_, total) = aggregate.progress();
            debug!(
                "{} declares {} items, expecting {} pages of {}",
                endpoint,
                total,
                expected_pages(total, page_size),
                page_size
            );
        }

        let mut last_new = aggregate.accumulated();
        let mut page_number = 1;

        while aggregate.needs_more() {
            if last_new == 0 {
                warn!(
                    "Page {} of {} yielded no new items, stopping at {}",
                    page_number,
                    endpoint,
                    aggregate.accumulated()
                );
                break;
            }

            page_number += 1;
            if page_number > MAX_PAGES {
                return Err(FetcherError::Protocol(format!(
                    "max pages ({MAX_PAGES}) exceeded for {endpoint} - possible infinite loop. Accumulated: {}",
                    aggregate.accumulated()
                )));
            }

            let mut page_params = params.to_vec();
            page_params.push(("page", page_number.to_string()));

            debug!("Fetching {} page {}", endpoint, page_number);

            let page: A::Page = match http.fetch_page(endpoint, &page_params).await {
                Ok(page) => page,
                Err(FetcherError::Protocol(message)) => {
                    warn!(
                        "Page {} of {} could not be parsed, keeping {} items: {}",
                        page_number,
                        endpoint,
                        aggregate.accumulated(),
                        message
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let before = aggregate.accumulated();
            last_new = aggregate.merge_page(page)?;
            debug!("Page {} of {} added {} items", page_number, endpoint, last_new);
            let grown = aggregate.accumulated().saturating_sub(before);
            if let Some(page_size) = A::PAGE_SIZE.filter(|size| grown > *size) {
                warn!(
                    "Page {} of {} added {} items, more than the {} listed per page",
                    page_number, endpoint, grown, page_size
                );
            }
            Self::report(&mut progress, &aggregate)?;
        }

        let (fetched, total) = aggregate.progress();
        info!(
            "Fetched {} of {} items from {} in {} pages",
            fetched, total, endpoint, page_number
        );

        Ok(aggregate)
    }

    fn report<A: PageAggregate>(
        progress: &mut Option<&mut dyn ProgressSink>,
        aggregate: &A,
    ) -> FetcherResult<()> {
        if let Some(sink) = progress.as_deref_mut() {
            let (fetched, total) = aggregate.progress();
            sink.report(fetched, total).map_err(FetcherError::Aborted)?;
        }
        Ok(())
    }
}
