use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, join_all};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Priority, SchedulerConfig};
use crate::dns::cache::PHI;

/// Failure of a single batch item. Never aborts sibling items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchItemError {
    #[error("Processing timeout")]
    Timeout,
    #[error("Processing failed: {0}")]
    Failed(String),
}

pub type ItemOutcome<R> = Result<R, BatchItemError>;

/// One unit of scheduled work: a processor future bound at enqueue time and
/// a completion channel that is resolved exactly once.
struct BatchItem<R> {
    id: Uuid,
    task: BoxFuture<'static, ItemOutcome<R>>,
    done: oneshot::Sender<ItemOutcome<R>>,
}

/// Aggregate queue statistics, captured at drain-loop boundaries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    started_instant: Option<Instant>,
    #[serde(skip)]
    elapsed: Option<Duration>,
}

impl BatchStats {
    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
            self.started_instant = Some(Instant::now());
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.elapsed = self.started_instant.map(|s| s.elapsed());
    }

    /// Percentage of processed items that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.successful as f64 / self.processed as f64 * 100.0
    }

    /// Items per second over the drained interval.
    pub fn throughput(&self) -> f64 {
        match self.elapsed {
            Some(elapsed) if elapsed.as_secs_f64() > 0.0 => {
                self.processed as f64 / elapsed.as_secs_f64()
            }
            _ => 0.0,
        }
    }
}

/// Pending-count thresholds (Fibonacci bounds) and the nominal batch level
/// for each tier. Actual batch sizes are the levels scaled by 1/phi, giving
/// the 3/6/15/31/62 progression.
const TIER_LEVELS: [(usize, usize); 5] = [
    (5, 5),
    (13, 10),
    (34, 25),
    (89, 50),
    (usize::MAX, 100),
];

/// Batch size for the current total pending count.
pub fn batch_size_for(pending: usize) -> usize {
    let level = TIER_LEVELS
        .iter()
        .find(|(bound, _)| pending <= *bound)
        .map(|(_, level)| *level)
        .unwrap_or(100);
    ((level as f64 / PHI).round() as usize).max(1)
}

struct QueueState<R> {
    buckets: [VecDeque<BatchItem<R>>; 4],
    draining: bool,
    stats: BatchStats,
}

impl<R> QueueState<R> {
    fn pending(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }
}

/// Priority batch scheduler.
///
/// Each scheduler owns one queue; unrelated batch requests use separate
/// instances so their statistics and buckets never interfere. The DNS cache
/// behind the processors may still be shared.
///
/// The drain loop takes from the highest-priority non-empty bucket first,
/// runs the whole batch concurrently with a per-item timeout, then pauses
/// for the inter-batch delay before re-checking. Batches never overlap, so
/// at most one batch's worth of lookups is in flight at any moment.
pub struct BatchScheduler<R> {
    config: SchedulerConfig,
    queue: Arc<Mutex<QueueState<R>>>,
}

// Cloned handles share the same queue and stats.
impl<R> Clone for BatchScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            queue: self.queue.clone(),
        }
    }
}

impl<R: Send + 'static> BatchScheduler<R> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queue: Arc::new(Mutex::new(QueueState {
                buckets: [const { VecDeque::new() }; 4],
                draining: false,
                stats: BatchStats::default(),
            })),
        }
    }

    /// Snapshot of the queue statistics.
    pub fn stats(&self) -> BatchStats {
        self.queue.lock().unwrap().stats.clone()
    }

    /// Enqueues `payloads` at the given priority, binding `processor` to
    /// each, and resolves once every enqueued item has settled. Outcomes are
    /// returned in input order regardless of completion order.
    ///
    /// The first enqueue on an idle queue spawns the drain loop; enqueues
    /// landing on a draining queue just park their items and wait. Because
    /// the drain runs on its own task, dropping an `enqueue` future mid-wait
    /// abandons only that caller's outcomes, never the queue.
    pub async fn enqueue<T, F, Fut>(
        &self,
        payloads: Vec<T>,
        priority: Priority,
        processor: F,
    ) -> Vec<ItemOutcome<R>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = ItemOutcome<R>> + Send + 'static,
    {
        let mut receivers = Vec::with_capacity(payloads.len());

        let should_drain = {
            let mut queue = self.queue.lock().unwrap();
            for payload in payloads {
                let (done, receiver) = oneshot::channel();
                queue.buckets[priority.index()].push_back(BatchItem {
                    id: Uuid::new_v4(),
                    task: Box::pin(processor(payload)),
                    done,
                });
                receivers.push(receiver);
            }
            if !queue.draining && queue.pending() > 0 {
                queue.draining = true;
                queue.stats.start();
                true
            } else {
                false
            }
        };

        if should_drain {
            let driver = self.clone();
            tokio::spawn(async move { driver.drain().await });
        }

        let mut outcomes = Vec::with_capacity(receivers.len());
        for receiver in receivers {
            outcomes.push(receiver.await.unwrap_or_else(|_| {
                Err(BatchItemError::Failed(
                    "item dropped before completion".to_string(),
                ))
            }));
        }
        outcomes
    }

    /// idle -> draining -> idle. Runs until every bucket is empty.
    async fn drain(&self) {
        loop {
            let batch = {
                let mut queue = self.queue.lock().unwrap();
                let pending = queue.pending();
                if pending == 0 {
                    queue.draining = false;
                    queue.stats.finish();
                    info!(
                        processed = queue.stats.processed,
                        successful = queue.stats.successful,
                        failed = queue.stats.failed,
                        "batch queue drained"
                    );
                    return;
                }
                let size = batch_size_for(pending);
                let mut batch = Vec::with_capacity(size.min(pending));
                // Highest-priority bucket first; spill into lower buckets
                // only once the higher ones are exhausted.
                for bucket in queue.buckets.iter_mut() {
                    while batch.len() < size {
                        match bucket.pop_front() {
                            Some(item) => batch.push(item),
                            None => break,
                        }
                    }
                    if batch.len() >= size {
                        break;
                    }
                }
                batch
            };

            debug!(size = batch.len(), "executing batch");
            let timeout = self.config.batch_timeout;
            let settled = join_all(batch.into_iter().map(|item| run_item(item, timeout))).await;

            {
                let mut queue = self.queue.lock().unwrap();
                for succeeded in settled {
                    queue.stats.processed += 1;
                    if succeeded {
                        queue.stats.successful += 1;
                    } else {
                        queue.stats.failed += 1;
                    }
                }
            }

            // Backpressure against downstream resources between batches.
            let more_pending = self.queue.lock().unwrap().pending() > 0;
            if more_pending {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }
    }
}

/// Races one item's processor against the batch timeout and settles its
/// completion channel exactly once. A timed-out or panicked processor fails
/// only this item; the underlying task may still finish in the background
/// and is ignored.
async fn run_item<R: Send + 'static>(item: BatchItem<R>, timeout: Duration) -> bool {
    let handle = tokio::spawn(item.task);
    let outcome = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(BatchItemError::Failed(format!(
            "processor panicked: {join_error}"
        ))),
        Err(_) => Err(BatchItemError::Timeout),
    };

    let succeeded = outcome.is_ok();
    if item.done.send(outcome).is_err() {
        warn!(id = %item.id, "completion receiver dropped before settlement");
    }
    succeeded
}
