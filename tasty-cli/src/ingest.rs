//! Ingest command implementation for the Tasty CLI.

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tasty_data::{BulkIndexerConfig, DEFAULT_INDEX, DEFAULT_SEARCH_URL, ingest_file};
use tokio_util::sync::CancellationToken;

use crate::{
    ARG_FILE, ARG_FLUSH_BYTES, ARG_FLUSH_INTERVAL_SECS, ARG_INDEX, ARG_SEARCH_URL, ARG_WORKERS,
    CliError, ENV_INGEST_FILE, StoreConnector, write_json,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "ingest",
    long_about = "Create the place index if it is missing, then bulk index \
                 every row of a tab-separated file. Rows are numbered from 1 \
                 after the header and the number becomes the document id.",
    about = "Index a tab-separated place file"
)]
#[ortho_config(prefix = "TASTY")]
pub(crate) struct IngestArgs {
    /// Tab-separated place file; the first row is a header.
    #[arg(long = ARG_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) file: Option<Utf8PathBuf>,
    /// Target index name (default "places").
    #[arg(long = ARG_INDEX, value_name = "name")]
    #[serde(default)]
    pub(crate) index: Option<String>,
    /// Concurrent bulk workers (default: available CPUs).
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Buffered bytes per worker that trigger a bulk request.
    #[arg(long = ARG_FLUSH_BYTES, value_name = "bytes")]
    #[serde(default)]
    pub(crate) flush_bytes: Option<usize>,
    /// Seconds a partial buffer may wait before it is sent.
    #[arg(long = ARG_FLUSH_INTERVAL_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) flush_interval_secs: Option<u64>,
    /// Base URL of the search engine (e.g. "http://localhost:9200").
    #[arg(long = ARG_SEARCH_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) search_url: Option<String>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    /// Place file to read.
    pub(crate) file: Utf8PathBuf,
    /// Search engine base URL.
    pub(crate) search_url: String,
    /// Pool settings, including the target index.
    pub(crate) bulk: BulkIndexerConfig,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.file, ARG_FILE)
    }
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match tasty_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let file = args.file.ok_or(CliError::MissingArgument {
            field: ARG_FILE,
            env: ENV_INGEST_FILE,
        })?;

        let index = args.index.unwrap_or_else(|| DEFAULT_INDEX.to_owned());
        let mut bulk = BulkIndexerConfig::new(index);
        if let Some(workers) = args.workers {
            let workers = NonZeroUsize::new(workers).ok_or(CliError::InvalidArgument {
                field: ARG_WORKERS,
                reason: "must be at least 1",
            })?;
            bulk = bulk.with_workers(workers);
        }
        if let Some(flush_bytes) = args.flush_bytes {
            if flush_bytes == 0 {
                return Err(CliError::InvalidArgument {
                    field: ARG_FLUSH_BYTES,
                    reason: "must be at least 1",
                });
            }
            bulk = bulk.with_flush_bytes(flush_bytes);
        }
        if let Some(secs) = args.flush_interval_secs {
            if secs == 0 {
                return Err(CliError::InvalidArgument {
                    field: ARG_FLUSH_INTERVAL_SECS,
                    reason: "must be at least 1",
                });
            }
            bulk = bulk.with_flush_interval(Duration::from_secs(secs));
        }

        Ok(Self {
            file,
            search_url: args
                .search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_owned()),
            bulk,
        })
    }
}

pub(crate) async fn run_ingest_with(
    args: IngestArgs,
    connector: &dyn StoreConnector,
    cancel: CancellationToken,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_ingest_config(args)?;
    let store = connector.connect(&config.search_url)?;
    log::info!(
        "ingesting {} into {} at {}",
        config.file,
        config.bulk.index,
        config.search_url
    );
    let report = ingest_file(store, &config.file, config.bulk, cancel).await?;
    write_json(writer, &report)
}

fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
