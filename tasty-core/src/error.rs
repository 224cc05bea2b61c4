//! Classification shared by every error raised across the workspace.
//!
//! Each concrete error type maps itself onto an [`ErrorKind`] so callers
//! can decide between failing a run, reporting a client error or logging
//! and carrying on without matching on every variant.

use std::fmt;

/// Broad failure categories for ingestion and query handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source data could not be decoded (e.g. a non-numeric coordinate).
    MalformedInput,
    /// The search store could not be reached or rejected the request.
    StoreUnavailable,
    /// The search store answered with an unexpected document shape.
    MalformedResponse,
    /// The requested page is zero or not a number.
    InvalidPage,
    /// The requested page lies beyond the last page of results.
    PageOutOfRange,
    /// A latitude or longitude query value is not a number.
    InvalidCoordinate,
    /// A single document failed inside an otherwise healthy bulk request.
    PerDocumentFailure,
    /// The run was cancelled or a worker stopped before finishing.
    Interrupted,
}

impl ErrorKind {
    /// Report whether the failure was caused by the caller's input.
    ///
    /// # Examples
    /// ```
    /// use tasty_core::ErrorKind;
    ///
    /// assert!(ErrorKind::InvalidPage.is_client_error());
    /// assert!(!ErrorKind::StoreUnavailable.is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::InvalidPage | Self::PageOutOfRange | Self::InvalidCoordinate
        )
    }

    /// Report whether the failure aborts an ingestion run.
    #[must_use]
    pub const fn is_fatal_for_ingestion(self) -> bool {
        matches!(
            self,
            Self::MalformedInput | Self::StoreUnavailable | Self::Interrupted
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MalformedInput => "malformed input",
            Self::StoreUnavailable => "store unavailable",
            Self::MalformedResponse => "malformed response",
            Self::InvalidPage => "invalid page",
            Self::PageOutOfRange => "page out of range",
            Self::InvalidCoordinate => "invalid coordinate",
            Self::PerDocumentFailure => "per-document failure",
            Self::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}
