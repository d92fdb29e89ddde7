//! Offset-based pagination over ticket collections.
//!
//! The API pages with a `page_start` offset. Each request carries the offset
//! of the first record it wants; the next offset is the previous one plus the
//! number of records returned. The collection is exhausted when a page comes
//! back empty or the server answers `204 No Content`.

use std::collections::{BTreeMap, VecDeque};

use futures::stream::{self, Stream};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::QiClient;
use crate::error::{QiError, Result};
use crate::query::TicketQuery;
use crate::record::Record;

/// Query parameter carrying the page offset.
pub const PAGE_START_PARAM: &str = "page_start";

/// One page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// The records on this page, in server order.
    pub items: Vec<Record>,
    /// Offset that produced this page.
    pub page_start: u64,
}

impl Page {
    /// Create a new page.
    #[must_use]
    pub fn new(items: Vec<Record>, page_start: u64) -> Self {
        Self { items, page_start }
    }

    /// Offset the following request should use.
    #[must_use]
    pub fn next_page_start(&self) -> u64 {
        self.page_start + self.items.len() as u64
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }
}

impl IntoIterator for Page {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Lazy producer of records from a paginated endpoint.
///
/// Nothing is requested until the first call to
/// [`next_record`](Self::next_record), [`next_page`](Self::next_page),
/// [`collect_all`](Self::collect_all) or the stream returned by
/// [`into_stream`](Self::into_stream) is polled. Requests are sequential.
///
/// A pager cannot be resumed: once it has ended, or once a request has
/// failed, it yields nothing more. Issue a fresh query to start over.
///
/// There is no built-in page cap unless the client was configured with
/// [`ClientConfig::with_max_pages`](crate::ClientConfig::with_max_pages).
#[derive(Debug)]
pub struct Pager {
    client: QiClient,
    path: String,
    params: BTreeMap<String, String>,
    page_start: u64,
    requests: u32,
    buffer: VecDeque<Record>,
    done: bool,
}

impl Pager {
    /// Validate the query and prepare a pager. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Validation`] for conflicting or malformed window
    /// filters.
    pub fn new(client: &QiClient, path: impl Into<String>, query: &TicketQuery) -> Result<Self> {
        let path = path.into().trim_start_matches('/').to_string();
        let params = query.resolve()?;

        debug!("Querying {} with parameters ({:?})", path, params);

        Ok(Self {
            client: client.clone(),
            path,
            params,
            page_start: 0,
            requests: 0,
            buffer: VecDeque::new(),
            done: false,
        })
    }

    /// Resource path being paged.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Offset the next request will use.
    pub fn page_start(&self) -> u64 {
        self.page_start
    }

    /// Number of requests issued so far.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Whether the pager has nothing more to yield.
    pub fn is_done(&self) -> bool {
        self.done && self.buffer.is_empty()
    }

    /// Fetch the next page, or `None` once the collection is exhausted.
    ///
    /// Records buffered by [`next_record`](Self::next_record) are not
    /// returned again here.
    ///
    /// # Errors
    ///
    /// Returns [`QiError::Query`] for non-success statuses (other than 204)
    /// and [`QiError::Parse`] for bodies that are not a JSON array of
    /// objects. The pager is finished afterwards.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.done {
            return Ok(None);
        }

        if let Some(max_pages) = self.client.max_pages() {
            if self.requests >= max_pages {
                warn!(
                    "Reached pagination limit of {} pages for {}, stopping",
                    max_pages, self.path
                );
                self.done = true;
                return Ok(None);
            }
        }

        self.requests += 1;
        match self.fetch_page().await {
            Ok(Some(page)) => {
                self.page_start = page.next_page_start();
                Ok(Some(page))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    async fn fetch_page(&self) -> Result<Option<Page>> {
        let mut params = self.params.clone();
        params.insert(PAGE_START_PARAM.to_string(), self.page_start.to_string());

        let response = self.client.get_with_query(&self.path, &params).await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!(path = %self.path, page_start = self.page_start, "no content, end of results");
            return Ok(None);
        }

        let body = response.text().await.map_err(QiError::Http)?;
        let items: Vec<Record> = serde_json::from_str(&body)?;

        debug!(
            path = %self.path,
            page_start = self.page_start,
            count = items.len(),
            "fetched page"
        );

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(Page::new(items, self.page_start)))
    }

    /// Next record in server order, or `None` once exhausted.
    ///
    /// # Errors
    ///
    /// See [`next_page`](Self::next_page).
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.next_page().await? {
                Some(page) => self.buffer.extend(page.items),
                None => return Ok(None),
            }
        }
    }

    /// Drain the pager into a vector.
    ///
    /// # Errors
    ///
    /// See [`next_page`](Self::next_page). Records fetched before the
    /// failure are discarded.
    pub async fn collect_all(mut self) -> Result<Vec<Record>> {
        let mut all_items: Vec<Record> = self.buffer.drain(..).collect();
        while let Some(page) = self.next_page().await? {
            all_items.extend(page.items);
        }
        Ok(all_items)
    }

    /// Adapt the pager into a [`Stream`] of records.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        stream::try_unfold(self, |mut pager| async move {
            let next = pager.next_record().await?;
            Ok::<_, QiError>(next.map(|record| (record, pager)))
        })
    }
}
