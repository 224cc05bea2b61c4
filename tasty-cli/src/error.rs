//! Error types emitted by the Tasty CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tasty_core::{CoordinateError, ErrorKind};
use tasty_data::store::StoreBuildError;
use tasty_data::{CatalogError, IngestError};
use thiserror::Error;

/// Errors emitted by the Tasty CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was supplied with a value the command cannot use.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The async runtime could not start.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Constructing the search engine client failed.
    #[error("failed to build search client for {url:?}: {source}")]
    BuildSearchStore {
        url: String,
        #[source]
        source: StoreBuildError,
    },
    /// Ingestion aborted.
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    /// A listing or recommendation query failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The recommendation origin could not be parsed.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Domain classification, when the failure came from a place operation.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ingest(err) => Some(err.kind()),
            Self::Catalog(err) => Some(err.kind()),
            Self::InvalidCoordinate(err) => Some(err.kind()),
            _ => None,
        }
    }
}
