//! Command-line interface for loading and querying Tasty Discoveries places.
#![forbid(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tasty_data::{HttpSearchStore, SearchStore};
use tokio_util::sync::CancellationToken;

mod error;
mod ingest;
mod query;

pub use error::CliError;

use ingest::IngestArgs;
use query::{PlacesArgs, RecommendArgs};

const ARG_FILE: &str = "file";
const ARG_INDEX: &str = "index";
const ARG_WORKERS: &str = "workers";
const ARG_FLUSH_BYTES: &str = "flush-bytes";
const ARG_FLUSH_INTERVAL_SECS: &str = "flush-interval-secs";
const ARG_SEARCH_URL: &str = "search-url";
const ARG_PAGE: &str = "page";
const ARG_PAGE_SIZE: &str = "page-size";
const ARG_LAT: &str = "lat";
const ARG_LON: &str = "lon";
const ENV_INGEST_FILE: &str = "TASTY_CMDS_INGEST_FILE";
const ENV_RECOMMEND_LAT: &str = "TASTY_CMDS_RECOMMEND_LAT";
const ENV_RECOMMEND_LON: &str = "TASTY_CMDS_RECOMMEND_LON";

/// Run the Tasty CLI with the current process arguments and environment.
///
/// Ctrl-C cancels an in-flight ingestion; documents already acknowledged
/// by the engine stay indexed.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let cancel = CancellationToken::new();
    let mut stdout = std::io::stdout().lock();
    runtime.block_on(async {
        tokio::spawn(cancel_on_interrupt(cancel.clone()));
        dispatch(cli.command, &HttpStoreConnector, cancel, &mut stdout).await
    })
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::warn!("interrupt received; stopping");
        cancel.cancel();
    }
}

async fn dispatch(
    command: Command,
    connector: &dyn StoreConnector,
    cancel: CancellationToken,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => ingest::run_ingest_with(args, connector, cancel, writer).await,
        Command::Places(args) => query::run_places_with(args, connector, writer).await,
        Command::Recommend(args) => query::run_recommend_with(args, connector, writer).await,
    }
}

/// Connects to the search engine for the current invocation.
pub(crate) trait StoreConnector {
    fn connect(&self, search_url: &str) -> Result<Arc<dyn SearchStore>, CliError>;
}

pub(crate) struct HttpStoreConnector;

impl StoreConnector for HttpStoreConnector {
    fn connect(&self, search_url: &str) -> Result<Arc<dyn SearchStore>, CliError> {
        let store =
            HttpSearchStore::new(search_url).map_err(|source| CliError::BuildSearchStore {
                url: search_url.to_owned(),
                source,
            })?;
        Ok(Arc::new(store))
    }
}

fn write_json<T: serde::Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *writer, value).map_err(CliError::SerialiseOutput)?;
    writeln!(writer).map_err(CliError::WriteOutput)
}

#[derive(Debug, Parser)]
#[command(
    name = "tasty",
    about = "Load restaurant listings into a search index and query them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a tab-separated place file.
    Ingest(IngestArgs),
    /// List one page of places in id order.
    Places(PlacesArgs),
    /// Show the three places nearest a coordinate.
    Recommend(RecommendArgs),
}

#[cfg(test)]
mod tests;
