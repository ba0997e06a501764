// src/application/filter_browser.rs
use tracing::{debug, instrument};

use crate::application::{BrowseQuery, BrowseScope, FilterRepository, SessionProvider};
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{
    CategorySelector, Cursor, CursorDecode, DomainError, FilterPredicate, FilterSummary, Page,
    SortMode,
};
use crate::util::text::normalize_search;

/// Whose filters a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingScope {
    #[default]
    Public,
    /// The caller's own filters, narrowed by a category selector.
    Mine(CategorySelector),
}

/// A listing request as it arrives from a client.
#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub sort: SortMode,
    /// Opaque token from a previous page. Garbage means "start over".
    pub cursor: Option<String>,
    pub scope: ListingScope,
    pub search: Option<String>,
    pub page_size: Option<usize>,
}

pub struct FilterBrowser<R: FilterRepository, S: SessionProvider> {
    repository: R,
    session: S,
    default_page_size: usize,
}

impl<R: FilterRepository, S: SessionProvider> FilterBrowser<R, S> {
    pub fn new(repository: R, session: S) -> Self {
        Self {
            repository,
            session,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Fetch one page of filters in keyset order.
    ///
    /// `next_cursor` is set only when at least one more row exists beyond this
    /// page. An invalid cursor, or one minted for a different sort mode,
    /// restarts the listing from the top.
    #[instrument(level = "debug", skip(self))]
    pub fn browse(&mut self, request: &ListingRequest) -> Result<Page<FilterSummary>, DomainError> {
        let sort = request.sort;
        let limit = request
            .page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE);

        let scope = match request.scope {
            ListingScope::Public => BrowseScope::Public,
            ListingScope::Mine(selector) => {
                let user = self.session.current_user()?;
                BrowseScope::Owned(FilterPredicate::new(user, selector))
            }
        };

        let query = BrowseQuery {
            sort,
            after: resume_point(request.cursor.as_deref(), sort),
            scope,
            search: request.search.as_deref().and_then(normalize_search),
            limit: limit + 1,
        };

        let mut rows = self.repository.browse_filters(&query)?;
        let next_cursor = if rows.len() > limit {
            rows.truncate(limit);
            rows.last().map(|row| Cursor::for_row(sort, row).encode())
        } else {
            None
        };

        debug!(rows = rows.len(), has_more = next_cursor.is_some(), "Listed page");
        Ok(Page {
            items: rows,
            next_cursor,
        })
    }
}

fn resume_point(token: Option<&str>, sort: SortMode) -> Option<Cursor> {
    match Cursor::decode(token?) {
        CursorDecode::Valid(cursor) if cursor.applies_to(sort) => Some(cursor),
        CursorDecode::Valid(cursor) => {
            debug!(cursor_sort = %cursor.s, %sort, "Ignoring cursor minted for another listing");
            None
        }
        CursorDecode::Invalid => None,
    }
}
