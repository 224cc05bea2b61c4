//! Concurrent bulk indexing of places.
//!
//! [`BulkIndexer`] runs a fixed pool of worker tasks that pull documents from
//! a shared bounded queue. Each worker buffers documents and flushes them to
//! the store in one bulk request once the buffered size reaches the byte
//! threshold or its flush timer fires, whichever comes first. Per-document
//! outcomes flow to a single aggregator task; the counts are only read back
//! through [`BulkIndexer::close`].
//!
//! Failed documents are logged and counted, never retried. A transport
//! failure marks every document of the affected batch as failed.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tasty_core::{ErrorKind, Place};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::store::{BulkItem, BulkResponseItem, DocumentOutcome, SearchStore};

/// Index written to when none is configured.
pub const DEFAULT_INDEX: &str = "places";

/// Buffered bytes that trigger a flush.
pub const DEFAULT_FLUSH_BYTES: usize = 5_000_000;

/// Maximum time a worker keeps documents buffered.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest timer period; the runtime rejects a zero period.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// Queue slots reserved per worker.
const QUEUE_DEPTH_PER_WORKER: usize = 256;

/// Tuning for [`BulkIndexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkIndexerConfig {
    /// Target index.
    pub index: String,
    /// Number of concurrent worker tasks.
    pub workers: NonZeroUsize,
    /// Buffered bytes per worker that trigger a flush.
    pub flush_bytes: usize,
    /// Time after which a worker flushes whatever it holds.
    pub flush_interval: Duration,
}

impl Default for BulkIndexerConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_owned(),
            workers: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            flush_bytes: DEFAULT_FLUSH_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl BulkIndexerConfig {
    /// Default tuning writing to `index`.
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the byte threshold.
    #[must_use]
    pub fn with_flush_bytes(mut self, flush_bytes: usize) -> Self {
        self.flush_bytes = flush_bytes;
        self
    }

    /// Set the flush timer period.
    #[must_use]
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }
}

/// Outcome of one submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The store accepted the document.
    Indexed {
        /// Document id.
        id: String,
    },
    /// The store refused the document or the request carrying it failed.
    Failed(ItemFailure),
}

/// A document that was not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Document id.
    pub id: String,
    /// Engine-provided `type: reason`, or the transport error.
    pub reason: String,
}

impl ItemFailure {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::PerDocumentFailure
    }
}

/// Totals for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents the store accepted.
    pub indexed: u64,
    /// Documents that were not indexed.
    pub failed: u64,
    /// Details of every failed document, in arrival order.
    pub failures: Vec<ItemFailure>,
}

impl IngestReport {
    /// Documents accounted for, successful or not.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.indexed.saturating_add(self.failed)
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Indexed { .. } => self.indexed = self.indexed.saturating_add(1),
            ItemOutcome::Failed(failure) => {
                log::error!("failed to index document {}: {}", failure.id, failure.reason);
                self.failed = self.failed.saturating_add(1);
                self.failures.push(failure);
            }
        }
    }
}

/// Pool-level errors that abort a bulk run.
#[derive(Debug, Error)]
pub enum BulkError {
    /// A place could not be serialised.
    #[error("failed to encode place {id}: {source}")]
    Encode {
        /// Place id.
        id: String,
        /// Serialiser failure.
        #[source]
        source: serde_json::Error,
    },
    /// The run was cancelled before every batch was acknowledged.
    #[error("bulk indexing was cancelled")]
    Cancelled,
    /// A worker or the aggregator task did not finish normally.
    #[error("bulk worker stopped unexpectedly: {source}")]
    WorkerPanicked {
        /// Join failure reported by the runtime.
        #[source]
        source: JoinError,
    },
    /// The document queue or outcome channel closed early.
    #[error("bulk indexer queue closed before the run finished")]
    QueueClosed,
}

impl BulkError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Encode { .. } => ErrorKind::MalformedInput,
            Self::Cancelled | Self::WorkerPanicked { .. } | Self::QueueClosed => {
                ErrorKind::Interrupted
            }
        }
    }
}

/// Bounded-concurrency bulk writer.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasty_core::{GeoPoint, Place};
/// use tasty_data::bulk::{BulkIndexer, BulkIndexerConfig};
/// use tasty_data::store::test_support::MemorySearchStore;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = Arc::new(MemorySearchStore::new());
/// let indexer = BulkIndexer::start(
///     Arc::clone(&store),
///     BulkIndexerConfig::new("places"),
///     CancellationToken::new(),
/// );
/// indexer
///     .add(&Place::new(1, "Cafe", "123 St", "555", GeoPoint::new(40.7, -74.0)))
///     .await
///     .unwrap();
/// let report = indexer.close().await.unwrap();
/// assert_eq!(report.indexed, 1);
/// assert_eq!(store.document_count("places"), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct BulkIndexer {
    sender: mpsc::Sender<BulkItem>,
    workers: JoinSet<Result<(), BulkError>>,
    aggregator: JoinHandle<IngestReport>,
    cancel: CancellationToken,
}

impl BulkIndexer {
    /// Spawn the worker pool and the outcome aggregator.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S>(store: Arc<S>, config: BulkIndexerConfig, cancel: CancellationToken) -> Self
    where
        S: SearchStore + ?Sized + 'static,
    {
        let workers = config.workers.get();
        let (sender, receiver) =
            mpsc::channel(workers.saturating_mul(QUEUE_DEPTH_PER_WORKER));
        let queue = Arc::new(Mutex::new(receiver));
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let index: Arc<str> = Arc::from(config.index.as_str());

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let task = Worker {
                id: worker,
                store: Arc::clone(&store),
                index: Arc::clone(&index),
                queue: Arc::clone(&queue),
                outcomes: outcome_tx.clone(),
                flush_bytes: config.flush_bytes,
                cancel: cancel.clone(),
            };
            pool.spawn(task.run(config.flush_interval));
        }
        drop(outcome_tx);

        log::debug!(
            "started {workers} bulk workers for index {} (flush at {} bytes or every {:?})",
            config.index,
            config.flush_bytes,
            config.flush_interval
        );

        Self {
            sender,
            workers: pool,
            aggregator: tokio::spawn(aggregate(outcome_rx)),
            cancel,
        }
    }

    /// Queue a place for indexing under its string-encoded id.
    ///
    /// Returns once the document is queued; its outcome is only visible in
    /// the report returned by [`BulkIndexer::close`].
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::Encode`] if the place cannot be serialised,
    /// [`BulkError::Cancelled`] once the run is cancelled and
    /// [`BulkError::QueueClosed`] if every worker has stopped.
    pub async fn add(&self, place: &Place) -> Result<(), BulkError> {
        let id = place.document_id();
        let source = serde_json::to_vec(place).map_err(|source| BulkError::Encode {
            id: id.clone(),
            source,
        })?;
        let item = BulkItem::new(id, source);
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(BulkError::Cancelled),
            sent = self.sender.send(item) => sent.map_err(|_| BulkError::QueueClosed),
        }
    }

    /// Stop accepting documents, flush every worker and wait for every
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns the first pool-level error raised by a worker. Documents
    /// acknowledged before the error stay indexed.
    pub async fn close(self) -> Result<IngestReport, BulkError> {
        let Self {
            sender,
            mut workers,
            aggregator,
            ..
        } = self;
        drop(sender);

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let result = joined.unwrap_or_else(|source| Err(BulkError::WorkerPanicked { source }));
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }

        let report = aggregator
            .await
            .map_err(|source| BulkError::WorkerPanicked { source })?;
        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

async fn aggregate(mut outcomes: mpsc::UnboundedReceiver<ItemOutcome>) -> IngestReport {
    let mut report = IngestReport::default();
    while let Some(outcome) = outcomes.recv().await {
        report.record(outcome);
    }
    report
}

struct Worker<S: ?Sized> {
    id: usize,
    store: Arc<S>,
    index: Arc<str>,
    queue: Arc<Mutex<mpsc::Receiver<BulkItem>>>,
    outcomes: mpsc::UnboundedSender<ItemOutcome>,
    flush_bytes: usize,
    cancel: CancellationToken,
}

impl<S> Worker<S>
where
    S: SearchStore + ?Sized,
{
    async fn run(self, flush_interval: Duration) -> Result<(), BulkError> {
        let mut buffer = Vec::new();
        let mut buffered = 0_usize;
        let period = flush_interval.max(MIN_FLUSH_INTERVAL);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(BulkError::Cancelled),
                _ = ticker.tick() => {
                    self.flush(&mut buffer, &mut buffered).await?;
                    continue;
                }
                item = self.next_item() => item,
            };

            let Some(item) = next else {
                self.flush(&mut buffer, &mut buffered).await?;
                return Ok(());
            };
            buffered = buffered.saturating_add(item.encoded_len());
            buffer.push(item);
            if buffered >= self.flush_bytes {
                self.flush(&mut buffer, &mut buffered).await?;
                ticker.reset();
            }
        }
    }

    async fn next_item(&self) -> Option<BulkItem> {
        self.queue.lock().await.recv().await
    }

    async fn flush(
        &self,
        buffer: &mut Vec<BulkItem>,
        buffered: &mut usize,
    ) -> Result<(), BulkError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(buffer);
        *buffered = 0;
        log::debug!("worker {} flushing {} documents", self.id, batch.len());

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(BulkError::Cancelled),
            result = self.store.bulk(&self.index, &batch) => result,
        };
        match result {
            Ok(responses) => self.report(batch, responses),
            Err(err) => {
                log::warn!("bulk request from worker {} failed: {err}", self.id);
                let reason = err.to_string();
                batch.into_iter().try_for_each(|item| {
                    self.send(ItemOutcome::Failed(ItemFailure {
                        id: item.id,
                        reason: reason.clone(),
                    }))
                })
            }
        }
    }

    fn report(
        &self,
        batch: Vec<BulkItem>,
        responses: Vec<BulkResponseItem>,
    ) -> Result<(), BulkError> {
        let mut by_id: BTreeMap<String, DocumentOutcome> = responses
            .into_iter()
            .map(|response| (response.id, response.outcome))
            .collect();
        batch.into_iter().try_for_each(|item| {
            let outcome = match by_id.remove(&item.id) {
                Some(DocumentOutcome::Indexed) => ItemOutcome::Indexed { id: item.id },
                Some(DocumentOutcome::Rejected { reason }) => {
                    ItemOutcome::Failed(ItemFailure { id: item.id, reason })
                }
                None => ItemOutcome::Failed(ItemFailure {
                    id: item.id,
                    reason: "missing from bulk response".to_owned(),
                }),
            };
            self.send(outcome)
        })
    }

    fn send(&self, outcome: ItemOutcome) -> Result<(), BulkError> {
        self.outcomes
            .send(outcome)
            .map_err(|_| BulkError::QueueClosed)
    }
}
