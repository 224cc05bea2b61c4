//! Shared test harness modules for the Tasty CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod helpers;
mod ingest_steps;
mod query_steps;
mod unit;
