//! Pagination policy for listing places.
//!
//! Page validation happens in two phases. [`Pagination::parse_page`] rejects
//! unusable page values before the store is contacted; once the store has
//! reported the total hit count, [`PageRequest::resolve`] rejects pages that
//! lie past the last one. The second check necessarily costs one query.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ErrorKind, Place};

/// Number of places listed per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: NonZeroU64 = match NonZeroU64::new(10) {
    Some(size) => size,
    None => NonZeroU64::MIN,
};

/// Errors raised by the pagination policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The page value was zero or not a positive integer.
    #[error("invalid 'page' value: {value}")]
    InvalidPage {
        /// Raw value supplied by the caller.
        value: String,
    },
    /// The page lies beyond the last page of results.
    #[error("invalid 'page' value: {page} (last page is {last_page})")]
    PageOutOfRange {
        /// Requested page.
        page: u64,
        /// Last page available for the reported total.
        last_page: u64,
    },
}

impl PageError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPage { .. } => ErrorKind::InvalidPage,
            Self::PageOutOfRange { .. } => ErrorKind::PageOutOfRange,
        }
    }
}

/// Fixed page-size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: NonZeroU64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Create a policy listing `page_size` places per page.
    #[must_use]
    pub const fn new(page_size: NonZeroU64) -> Self {
        Self { page_size }
    }

    /// Places listed per page.
    #[must_use]
    pub const fn page_size(&self) -> NonZeroU64 {
        self.page_size
    }

    /// Validate a raw page value.
    ///
    /// A missing or empty value selects the first page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidPage`] when the value is zero, negative or
    /// not an integer.
    ///
    /// # Examples
    /// ```
    /// use tasty_core::Pagination;
    ///
    /// let policy = Pagination::default();
    /// assert_eq!(policy.parse_page(None)?.page(), 1);
    /// assert_eq!(policy.parse_page(Some("3"))?.offset(), 20);
    /// assert!(policy.parse_page(Some("0")).is_err());
    /// # Ok::<(), tasty_core::PageError>(())
    /// ```
    pub fn parse_page(&self, raw: Option<&str>) -> Result<PageRequest, PageError> {
        let value = raw.filter(|text| !text.is_empty()).unwrap_or("1");
        let page = value
            .parse::<u64>()
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or_else(|| PageError::InvalidPage {
                value: value.to_owned(),
            })?;
        Ok(PageRequest {
            page,
            page_size: self.page_size,
        })
    }
}

/// A validated page request awaiting the store's total hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: NonZeroU64,
    page_size: NonZeroU64,
}

impl PageRequest {
    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page.get()
    }

    /// Maximum number of places on the page.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.page_size.get()
    }

    /// Number of places skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.get() - 1).saturating_mul(self.page_size.get())
    }

    /// Last page for `total` matching places.
    #[must_use]
    pub const fn last_page(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size.get())
    }

    /// Combine the store's answer with the request, rejecting pages past the
    /// end of the results.
    ///
    /// An empty result set has no pages, so every request against it is out
    /// of range.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::PageOutOfRange`] when the page exceeds the last
    /// page for `total`.
    pub fn resolve(self, places: Vec<Place>, total: u64) -> Result<PlacesPage, PageError> {
        let last_page = self.last_page(total);
        let page = self.page();
        if page > last_page {
            return Err(PageError::PageOutOfRange { page, last_page });
        }
        Ok(PlacesPage {
            name: PlacesPage::NAME.to_owned(),
            total,
            places,
            current_page: page,
            prev_page: page - 1,
            next_page: page.saturating_add(1),
            last_page,
        })
    }
}

/// One page of places plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacesPage {
    /// Response label, always `"Places"`.
    pub name: String,
    /// Number of matching places across all pages.
    pub total: u64,
    /// Places on this page in the store's sort order.
    pub places: Vec<Place>,
    /// Current one-based page.
    pub current_page: u64,
    /// Previous page; zero on the first page.
    pub prev_page: u64,
    /// Next page; may exceed `last_page` on the final page.
    pub next_page: u64,
    /// Last page, `ceil(total / page_size)`.
    pub last_page: u64,
}

impl PlacesPage {
    /// Label carried by every page response.
    pub const NAME: &'static str = "Places";
}
