//! Listing and recommendation commands for the Tasty CLI.

use std::io::Write;
use std::num::NonZeroU64;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tasty_core::{GeoPoint, Pagination};
use tasty_data::{DEFAULT_INDEX, DEFAULT_SEARCH_URL, PlaceCatalog};

use crate::{
    ARG_INDEX, ARG_LAT, ARG_LON, ARG_PAGE, ARG_PAGE_SIZE, ARG_SEARCH_URL, CliError,
    ENV_RECOMMEND_LAT, ENV_RECOMMEND_LON, StoreConnector, write_json,
};

/// CLI arguments for the `places` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "places",
    long_about = "Print one page of places ordered by id, together with the \
                 total count and the neighbouring page numbers. Pages start \
                 at 1; omitting the page lists the first one.",
    about = "List one page of places"
)]
#[ortho_config(prefix = "TASTY")]
pub(crate) struct PlacesArgs {
    /// Page number, starting at 1.
    #[arg(long = ARG_PAGE, value_name = "n", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) page: Option<String>,
    /// Places per page (default 10).
    #[arg(long = ARG_PAGE_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) page_size: Option<u64>,
    /// Index to query (default "places").
    #[arg(long = ARG_INDEX, value_name = "name")]
    #[serde(default)]
    pub(crate) index: Option<String>,
    /// Base URL of the search engine.
    #[arg(long = ARG_SEARCH_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) search_url: Option<String>,
}

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "recommend",
    long_about = "Print the three places closest to a coordinate, nearest \
                 first, by great-circle distance.",
    about = "Recommend places near a coordinate"
)]
#[ortho_config(prefix = "TASTY")]
pub(crate) struct RecommendArgs {
    /// Latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<String>,
    /// Longitude in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<String>,
    /// Index to query (default "places").
    #[arg(long = ARG_INDEX, value_name = "name")]
    #[serde(default)]
    pub(crate) index: Option<String>,
    /// Base URL of the search engine.
    #[arg(long = ARG_SEARCH_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) search_url: Option<String>,
}

/// Where a query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryTarget {
    pub(crate) index: String,
    pub(crate) search_url: String,
}

impl QueryTarget {
    fn resolve(index: Option<String>, search_url: Option<String>) -> Self {
        Self {
            index: index.unwrap_or_else(|| DEFAULT_INDEX.to_owned()),
            search_url: search_url.unwrap_or_else(|| DEFAULT_SEARCH_URL.to_owned()),
        }
    }

    fn catalog(
        &self,
        connector: &dyn StoreConnector,
    ) -> Result<PlaceCatalog<dyn tasty_data::SearchStore>, CliError> {
        let store = connector.connect(&self.search_url)?;
        Ok(PlaceCatalog::new(store).with_index(self.index.clone()))
    }
}

/// Resolved `places` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlacesConfig {
    pub(crate) target: QueryTarget,
    /// Raw page value; validated by the catalogue.
    pub(crate) page: Option<String>,
    pub(crate) pagination: Pagination,
}

impl TryFrom<PlacesArgs> for PlacesConfig {
    type Error = CliError;

    fn try_from(args: PlacesArgs) -> Result<Self, Self::Error> {
        let pagination = match args.page_size {
            None => Pagination::default(),
            Some(size) => NonZeroU64::new(size).map(Pagination::new).ok_or(
                CliError::InvalidArgument {
                    field: ARG_PAGE_SIZE,
                    reason: "must be at least 1",
                },
            )?,
        };
        Ok(Self {
            target: QueryTarget::resolve(args.index, args.search_url),
            page: args.page,
            pagination,
        })
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecommendConfig {
    pub(crate) target: QueryTarget,
    pub(crate) origin: GeoPoint,
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_RECOMMEND_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_RECOMMEND_LON,
        })?;
        let origin = GeoPoint::from_query(&lat, &lon)?;
        Ok(Self {
            target: QueryTarget::resolve(args.index, args.search_url),
            origin,
        })
    }
}

pub(crate) async fn run_places_with(
    args: PlacesArgs,
    connector: &dyn StoreConnector,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = PlacesConfig::try_from(merged)?;
    let catalog = config
        .target
        .catalog(connector)?
        .with_pagination(config.pagination);
    let page = catalog.places(config.page.as_deref()).await?;
    write_json(writer, &page)
}

pub(crate) async fn run_recommend_with(
    args: RecommendArgs,
    connector: &dyn StoreConnector,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = RecommendConfig::try_from(merged)?;
    let recommendation = config.target.catalog(connector)?.recommend(config.origin).await?;
    write_json(writer, &recommendation)
}
