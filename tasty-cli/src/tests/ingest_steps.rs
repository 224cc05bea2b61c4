//! Behaviour-driven step definitions driving the ingest CLI scenarios.

use super::helpers::{MemoryConnector, block_on, utf8_root, write_place_file};
use super::*;
use crate::ingest::run_ingest_with;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tasty_core::ErrorKind;
use tasty_data::store::test_support::MemorySearchStore;
use tempfile::TempDir;

struct IngestWorld {
    _tmp: TempDir,
    place_file: Utf8PathBuf,
    include_file: RefCell<bool>,
    connector: MemoryConnector,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl IngestWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let place_file = utf8_root(&tmp).join("places.tsv");
        Self {
            _tmp: tmp,
            place_file,
            include_file: RefCell::new(true),
            connector: MemoryConnector::new(MemorySearchStore::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["tasty".to_owned(), "ingest".to_owned()];
        if *self.include_file.borrow() {
            argv.extend([format!("--{ARG_FILE}"), self.place_file.to_string()]);
        }
        argv.extend([format!("--{ARG_WORKERS}"), "2".to_owned()]);
        argv.extend([format!("--{ARG_FLUSH_BYTES}"), "256".to_owned()]);
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> IngestWorld {
    IngestWorld::new()
}

#[given("a place file with {count} rows")]
fn place_file_with_rows(#[from(world)] world: &IngestWorld, count: usize) {
    write_place_file(&world.place_file, count);
}

#[given("the place file does not exist")]
fn place_file_missing(#[from(world)] world: &IngestWorld) {
    assert!(!world.place_file.exists());
}

#[given("I omit the place file option")]
fn omit_place_file(#[from(world)] world: &IngestWorld) {
    *world.include_file.borrow_mut() = false;
}

#[given("the place file has a malformed longitude")]
fn malformed_longitude(#[from(world)] world: &IngestWorld) {
    let contents = std::fs::read_to_string(&world.place_file).expect("read place file");
    let broken = contents.replacen("-73.02", "west", 1);
    std::fs::write(&world.place_file, broken).expect("rewrite place file");
}

#[when("I run the ingest command")]
fn run_ingest_command(#[from(world)] world: &IngestWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Ingest(args) => {
            let mut buffer = world.stdout.borrow_mut();
            block_on(run_ingest_with(
                args,
                &world.connector,
                CancellationToken::new(),
                &mut *buffer,
            ))
        }
        other => panic!("expected ingest command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and reports {count} indexed places")]
fn command_reports_indexed(#[from(world)] world: &IngestWorld, count: u64) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let report: serde_json::Value =
        serde_json::from_slice(&world.stdout.borrow()).expect("output should be JSON");
    assert_eq!(report["indexed"], serde_json::json!(count));
    assert_eq!(report["failed"], serde_json::json!(0));
}

#[then("the search store holds {count} places")]
fn store_holds(#[from(world)] world: &IngestWorld, count: usize) {
    assert_eq!(world.connector.store.document_count("places"), count);
}

#[then("the search store was never written")]
fn store_untouched(#[from(world)] world: &IngestWorld) {
    assert_eq!(world.connector.store.bulk_calls(), 0);
    assert_eq!(world.connector.store.definition("places"), None);
}

#[then("the command fails because the place file is missing")]
fn fails_missing_file(#[from(world)] world: &IngestWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_FILE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[then("the command fails because the file option is missing")]
fn fails_missing_option(#[from(world)] world: &IngestWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_FILE);
            assert_eq!(*env, ENV_INGEST_FILE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the place file is malformed")]
fn fails_malformed(#[from(world)] world: &IngestWorld) {
    let error = world.error();
    assert!(matches!(&*error, CliError::Ingest(_)));
    assert_eq!(error.kind(), Some(ErrorKind::MalformedInput));
}

macro_rules! register_ingest_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/ingest_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: IngestWorld) {
            let _ = world;
        }
    };
}

register_ingest_scenario!(ingest_happy_path, "ingesting a place file");
register_ingest_scenario!(ingest_missing_file, "rejecting a missing place file");
register_ingest_scenario!(ingest_missing_option, "rejecting a missing file option");
register_ingest_scenario!(ingest_malformed_file, "rejecting a malformed place file");
