//! Test helpers: a recording store connector and place file writers.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::future::Future;
use std::io::Write as _;
use tasty_data::store::test_support::MemorySearchStore;
use tempfile::TempDir;

pub(super) const HEADER: &str = "id\tname\taddress\tphone\tlongitude\tlatitude";

/// Hands out one shared in-memory store and records the URLs requested.
pub(super) struct MemoryConnector {
    pub(super) store: Arc<MemorySearchStore>,
    pub(super) urls: RefCell<Vec<String>>,
}

impl MemoryConnector {
    pub(super) fn new(store: MemorySearchStore) -> Self {
        Self {
            store: Arc::new(store),
            urls: RefCell::new(Vec::new()),
        }
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self, search_url: &str) -> Result<Arc<dyn SearchStore>, CliError> {
        self.urls.borrow_mut().push(search_url.to_owned());
        let store: Arc<dyn SearchStore> = self.store.clone();
        Ok(store)
    }
}

pub(super) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("build runtime")
        .block_on(future)
}

pub(super) fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace")
}

/// Write a header and `count` well-formed rows to `path`.
pub(super) fn write_place_file(path: &Utf8Path, count: usize) {
    let mut file = std::fs::File::create(path).expect("create place file");
    writeln!(file, "{HEADER}").expect("write header");
    for index in 1..=count {
        writeln!(
            file,
            "src-{index}\tPlace {index}\t{index} Main Street\t555-{index:04}\t-73.{index:02}\t40.{index:02}"
        )
        .expect("write row");
    }
}

pub(super) fn place_documents(count: u64) -> Vec<serde_json::Value> {
    tasty_core::test_support::sample_places(count)
        .iter()
        .map(|place| serde_json::to_value(place).expect("serialise place"))
        .collect()
}
