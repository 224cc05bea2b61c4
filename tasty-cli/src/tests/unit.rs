//! Command-line parsing and output formatting.

use super::*;
use camino::Utf8PathBuf;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn parses_ingest_flags() {
    let cli = Cli::try_parse_from([
        "tasty",
        "ingest",
        "--file",
        "places.tsv",
        "--workers",
        "4",
        "--flush-bytes",
        "1024",
        "--flush-interval-secs",
        "5",
        "--index",
        "venues",
        "--search-url",
        "http://search:9200",
    ])
    .expect("ingest flags should parse");
    let Command::Ingest(args) = cli.command else {
        panic!("expected ingest command");
    };
    assert_eq!(args.file, Some(Utf8PathBuf::from("places.tsv")));
    assert_eq!(args.workers, Some(4));
    assert_eq!(args.flush_bytes, Some(1024));
    assert_eq!(args.flush_interval_secs, Some(5));
    assert_eq!(args.index.as_deref(), Some("venues"));
    assert_eq!(args.search_url.as_deref(), Some("http://search:9200"));
}

#[rstest]
fn recommend_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from(["tasty", "recommend", "--lat", "-33.86", "--lon", "-151.2"])
        .expect("negative coordinates should parse");
    let Command::Recommend(args) = cli.command else {
        panic!("expected recommend command");
    };
    assert_eq!(args.lat.as_deref(), Some("-33.86"));
    assert_eq!(args.lon.as_deref(), Some("-151.2"));
}

#[rstest]
#[case::numeric("3")]
#[case::negative("-2")]
#[case::text("abc")]
fn places_keeps_raw_page(#[case] raw: &str) {
    let cli = Cli::try_parse_from(["tasty", "places", "--page", raw]).expect("page should parse");
    let Command::Places(args) = cli.command else {
        panic!("expected places command");
    };
    assert_eq!(args.page.as_deref(), Some(raw));
}

#[rstest]
fn missing_subcommand_is_rejected() {
    let err = Cli::try_parse_from(["tasty"]).expect_err("subcommand is required");
    assert!(matches!(CliError::from(err), CliError::ArgumentParsing(_)));
}

#[rstest]
fn workers_must_be_numeric() {
    let err = Cli::try_parse_from(["tasty", "ingest", "--workers", "many"])
        .expect_err("workers must be numeric");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[rstest]
fn output_is_pretty_json_with_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &json!({ "indexed": 2 })).expect("write output");
    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert_eq!(text, "{\n  \"indexed\": 2\n}\n");
}

#[rstest]
fn domain_errors_expose_their_kind() {
    let coordinate = tasty_core::GeoPoint::from_query("north", "0").expect_err("bad latitude");
    let err = CliError::from(coordinate);
    assert_eq!(err.kind(), Some(tasty_core::ErrorKind::InvalidCoordinate));
    let missing = CliError::MissingArgument {
        field: ARG_FILE,
        env: ENV_INGEST_FILE,
    };
    assert_eq!(missing.kind(), None);
    assert_eq!(
        missing.to_string(),
        "missing file (set --file or TASTY_CMDS_INGEST_FILE)"
    );
}
