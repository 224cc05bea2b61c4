//! Behaviour-driven step definitions for the places and recommend commands.

use super::helpers::{MemoryConnector, block_on, place_documents};
use super::*;
use crate::query::{run_places_with, run_recommend_with};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tasty_core::ErrorKind;
use tasty_data::store::test_support::MemorySearchStore;

struct QueryWorld {
    connector: RefCell<MemoryConnector>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl QueryWorld {
    fn new() -> Self {
        Self {
            connector: RefCell::new(MemoryConnector::new(MemorySearchStore::new())),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn run(&self, argv: &[&str]) {
        let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
        let connector = self.connector.borrow();
        let mut buffer = self.stdout.borrow_mut();
        let outcome = parsed.and_then(|cli| match cli.command {
            Command::Places(args) => block_on(run_places_with(args, &*connector, &mut *buffer)),
            Command::Recommend(args) => {
                block_on(run_recommend_with(args, &*connector, &mut *buffer))
            }
            other => panic!("expected a query command, found {other:?}"),
        });
        self.result.replace(Some(outcome));
    }

    fn output(&self) -> Value {
        let borrowed = self.result.borrow();
        borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect("expected success");
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be JSON")
    }

    fn error_kind(&self) -> Option<ErrorKind> {
        let borrowed = self.result.borrow();
        borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error")
            .kind()
    }
}

fn ids(places: &Value) -> Vec<u64> {
    places
        .as_array()
        .expect("places array")
        .iter()
        .map(|place| place["id"].as_u64().expect("numeric id"))
        .collect()
}

#[fixture]
fn world() -> QueryWorld {
    QueryWorld::new()
}

#[given("an index holding {count} places")]
fn index_holding(#[from(world)] world: &QueryWorld, count: u64) {
    let store = MemorySearchStore::new().with_documents("places", place_documents(count));
    world.connector.replace(MemoryConnector::new(store));
}

#[when("I list page {page}")]
fn list_page(#[from(world)] world: &QueryWorld, page: String) {
    world.run(&["tasty", "places", "--page", page.trim_matches('"')]);
}

#[when("I list places without a page")]
fn list_without_page(#[from(world)] world: &QueryWorld) {
    world.run(&["tasty", "places"]);
}

#[when("I ask for places near latitude {lat} and longitude {lon}")]
fn ask_near(#[from(world)] world: &QueryWorld, lat: String, lon: String) {
    world.run(&["tasty", "recommend", "--lat", lat.as_str(), "--lon", lon.as_str()]);
}

#[then("the listing shows places {first} to {last} of {total}")]
fn listing_shows(#[from(world)] world: &QueryWorld, first: u64, last: u64, total: u64) {
    let page = world.output();
    assert_eq!(page["name"], Value::from("Places"));
    assert_eq!(page["total"], Value::from(total));
    assert_eq!(ids(&page["places"]), (first..=last).collect::<Vec<_>>());
}

#[then("the previous page is {prev} and the next page is {next}")]
fn neighbouring_pages(#[from(world)] world: &QueryWorld, prev: u64, next: u64) {
    let page = world.output();
    assert_eq!(page["prev_page"], Value::from(prev));
    assert_eq!(page["next_page"], Value::from(next));
}

#[then("the command fails with an invalid page")]
fn fails_invalid_page(#[from(world)] world: &QueryWorld) {
    assert_eq!(world.error_kind(), Some(ErrorKind::InvalidPage));
}

#[then("the search store was not queried")]
fn store_not_queried(#[from(world)] world: &QueryWorld) {
    assert_eq!(world.connector.borrow().store.search_calls(), 0);
}

#[then("the command fails because the page is out of range")]
fn fails_out_of_range(#[from(world)] world: &QueryWorld) {
    assert_eq!(world.error_kind(), Some(ErrorKind::PageOutOfRange));
}

#[then("the recommendation lists places {first}, {second} and {third}")]
fn recommendation_lists(
    #[from(world)] world: &QueryWorld,
    first: u64,
    second: u64,
    third: u64,
) {
    let recommendation = world.output();
    assert_eq!(recommendation["name"], Value::from("Recommendation"));
    assert_eq!(ids(&recommendation["places"]), vec![first, second, third]);
}

#[then("the command fails with an invalid coordinate")]
fn fails_invalid_coordinate(#[from(world)] world: &QueryWorld) {
    assert_eq!(world.error_kind(), Some(ErrorKind::InvalidCoordinate));
}

macro_rules! register_query_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/query_commands.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: QueryWorld) {
            let _ = world;
        }
    };
}

register_query_scenario!(places_final_page, "listing the final page");
register_query_scenario!(places_default_page, "listing without a page");
register_query_scenario!(places_invalid_page, "rejecting a non-numeric page");
register_query_scenario!(places_out_of_range, "rejecting a page past the end");
register_query_scenario!(recommend_nearby, "recommending nearby places");
register_query_scenario!(recommend_bad_latitude, "rejecting a malformed latitude");
