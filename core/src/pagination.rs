//! Offset pagination over collection endpoints.
//!
//! # Design
//! Every collection endpoint answers with the same envelope
//! (`limit`/`offset`/`totalNumberOfItems`/`items`); only the item shape
//! differs. `Pages` walks the offsets and yields one decoded envelope per
//! request; `Session::fetch_all_pages` flattens them through an extractor.
//! `fetch_all_pages` is all-or-nothing: the first failed page discards
//! everything. Callers that want the pages fetched before a failure iterate
//! `Session::pages` themselves.

use std::marker::PhantomData;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::session::Session;

/// One page of a collection response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<I> {
    pub limit: usize,
    pub offset: usize,
    pub total_number_of_items: usize,
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
}

/// A collection item wrapped together with its type tag, as returned by
/// album item listings and favorites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wrapped<T> {
    pub item: T,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl<T> Wrapped<T> {
    pub fn into_inner(self) -> T {
        self.item
    }
}

/// Iterator over the pages of one collection endpoint.
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct Pages<'a, I> {
    session: &'a Session,
    endpoint: String,
    offset: usize,
    done: bool,
    _item: PhantomData<fn() -> I>,
}

impl<'a, I: DeserializeOwned> Pages<'a, I> {
    pub(crate) fn new(session: &'a Session, endpoint: impl Into<String>) -> Self {
        Self {
            session,
            endpoint: endpoint.into(),
            offset: 0,
            done: false,
            _item: PhantomData,
        }
    }

    fn fetch(&mut self) -> Result<Page<I>, ApiError> {
        let offset = self.offset.to_string();
        let limit = self.session.config().page_size.map(|n| n.to_string());

        let mut params = vec![("offset", offset.as_str())];
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }

        let page: Page<I> = self.session.get_json(&self.endpoint, &params, &[])?;
        debug!(
            "{}: page at offset {} with {} items (limit {}, total {})",
            self.endpoint,
            self.offset,
            page.items.len(),
            page.limit,
            page.total_number_of_items
        );

        let stalled = || ApiError::PaginationStalled {
            endpoint: self.endpoint.clone(),
            offset: self.offset,
            total: page.total_number_of_items,
        };
        let next = self.offset.checked_add(page.limit).ok_or_else(stalled)?;
        if page.limit == 0 && next < page.total_number_of_items {
            return Err(stalled());
        }
        self.offset = next;
        self.done = self.offset >= page.total_number_of_items;
        Ok(page)
    }
}

impl<I: DeserializeOwned> Iterator for Pages<'_, I> {
    type Item = Result<Page<I>, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.fetch();
        if page.is_err() {
            self.done = true;
        }
        Some(page)
    }
}

impl Session {
    /// Iterate the pages of `endpoint`, starting at offset 0.
    pub fn pages<I: DeserializeOwned>(&self, endpoint: impl Into<String>) -> Pages<'_, I> {
        Pages::new(self, endpoint)
    }

    /// Fetch every page of `endpoint` and flatten the items through
    /// `extract`, preserving server order.
    pub fn fetch_all_pages<I, T, F>(&self, endpoint: &str, mut extract: F) -> Result<Vec<T>, ApiError>
    where
        I: DeserializeOwned,
        F: FnMut(I) -> T,
    {
        let mut result = Vec::new();
        for page in self.pages::<I>(endpoint) {
            let page = page?;
            result.extend(page.items.into_iter().map(&mut extract));
        }
        Ok(result)
    }
}
