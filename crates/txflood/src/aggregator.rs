//! Collection of per-transaction outcomes.
//!
//! Workers push [`SubmissionResult`]s into a [`ResultSink`]. A single [`ResultAggregator`]
//! drains the channel, so completion order is whatever order the results arrive in. When
//! [`OrderingMode::Ordered`] is selected the aggregator stamps each result with a global
//! sequence number as it is appended.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant, SystemTime},
};

use alloy_primitives::B256;
use tokio::sync::mpsc;
use tracing::info;

/// Whether completed results receive a global sequence number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingMode {
    /// Results keep only their worker-local labels.
    #[default]
    Unordered,
    /// Results are numbered in completion order.
    Ordered,
}

impl OrderingMode {
    /// Maps the `ordered` flag onto a mode.
    pub const fn from_flag(ordered: bool) -> Self {
        if ordered { Self::Ordered } else { Self::Unordered }
    }
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Pool index of the sending identity.
    pub identity_index: u32,
    /// Iteration within the identity's stream.
    pub sequence_index: u64,
    /// Nonce the transfer carried.
    pub nonce: u64,
    /// Hash of the signed transfer, absent if signing failed.
    pub tx_hash: Option<B256>,
    /// Failure description, absent on success.
    pub error: Option<String>,
    /// Time between the start of the attempt and the node's answer.
    pub latency: Duration,
    /// Wall-clock completion time.
    pub timestamp: SystemTime,
    /// Completion sequence number, only populated in ordered mode.
    pub global_index: Option<u64>,
}

impl SubmissionResult {
    /// Records a transfer the node accepted.
    pub fn success(
        identity_index: u32,
        sequence_index: u64,
        nonce: u64,
        tx_hash: B256,
        latency: Duration,
    ) -> Self {
        Self {
            identity_index,
            sequence_index,
            nonce,
            tx_hash: Some(tx_hash),
            error: None,
            latency,
            timestamp: SystemTime::now(),
            global_index: None,
        }
    }

    /// Records a failed attempt.
    pub fn failure(
        identity_index: u32,
        sequence_index: u64,
        nonce: u64,
        tx_hash: Option<B256>,
        error: impl ToString,
        latency: Duration,
    ) -> Self {
        Self {
            identity_index,
            sequence_index,
            nonce,
            tx_hash,
            error: Some(error.to_string()),
            latency,
            timestamp: SystemTime::now(),
            global_index: None,
        }
    }

    /// Returns `true` if the node accepted the transfer.
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Live counters, readable while a run is in flight.
#[derive(Debug, Default)]
pub struct Stats {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    aborted_workers: AtomicU64,
    numbered: AtomicU64,
}

impl Stats {
    fn record(&self, success: bool) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Attempts recorded so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Transfers the node accepted.
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Attempts that failed to sign or submit.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Workers whose stream ended during setup.
    pub fn aborted_workers(&self) -> u64 {
        self.aborted_workers.load(Ordering::Relaxed)
    }

    /// Results the aggregator has numbered so far in ordered mode.
    pub fn numbered(&self) -> u64 {
        self.numbered.load(Ordering::Acquire)
    }

    /// Snapshot of the counters together with the elapsed time.
    pub fn summary(&self, elapsed: Duration) -> Summary {
        Summary {
            submitted: self.submitted(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            aborted_workers: self.aborted_workers(),
            elapsed,
        }
    }
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Attempts recorded.
    pub submitted: u64,
    /// Transfers the node accepted.
    pub succeeded: u64,
    /// Attempts that failed.
    pub failed: u64,
    /// Workers whose stream ended during setup.
    pub aborted_workers: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl Summary {
    /// Accepted transfers per second over the run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.succeeded as f64 / secs
    }
}

/// Cloneable handle workers record through.
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<SubmissionResult>,
    stats: Arc<Stats>,
}

impl ResultSink {
    /// Appends `result`. Results recorded after the aggregator finished are only counted.
    pub fn record(&self, result: SubmissionResult) {
        self.stats.record(result.is_success());
        let _ = self.tx.send(result);
    }

    /// Notes that a worker's stream ended before its first send.
    pub fn record_abort(&self) {
        self.stats.aborted_workers.fetch_add(1, Ordering::Relaxed);
    }
}

/// Results of a finished run, in completion order.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Every recorded result.
    pub results: Vec<SubmissionResult>,
    /// Aggregate counts.
    pub summary: Summary,
}

/// Single consumer of every [`ResultSink`].
#[derive(Debug)]
pub struct ResultAggregator {
    ordering: OrderingMode,
    rx: mpsc::UnboundedReceiver<SubmissionResult>,
    stats: Arc<Stats>,
    started: Instant,
}

impl ResultAggregator {
    /// Creates an aggregator and the first sink feeding it.
    pub fn new(ordering: OrderingMode) -> (Self, ResultSink) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Stats::default());
        let sink = ResultSink { tx, stats: Arc::clone(&stats) };
        let aggregator = Self { ordering, rx, stats, started: Instant::now() };
        (aggregator, sink)
    }

    /// Shared handle to the live counters.
    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Current counts and the time since the aggregator was created.
    pub fn summary(&self) -> Summary {
        self.stats.summary(self.started.elapsed())
    }

    /// Drains results until every sink has been dropped.
    ///
    /// Run this concurrently with the producers: in ordered mode each result is numbered
    /// and logged the moment it is received.
    pub async fn collect(mut self) -> Collected {
        let mut results = Vec::new();
        while let Some(mut result) = self.rx.recv().await {
            if self.ordering == OrderingMode::Ordered {
                let index = self.stats.numbered.fetch_add(1, Ordering::AcqRel);
                result.global_index = Some(index);
                log_completion(index, &result);
            }
            results.push(result);
        }
        Collected { results, summary: self.summary() }
    }
}

fn log_completion(index: u64, result: &SubmissionResult) {
    match (&result.error, result.tx_hash) {
        (None, Some(tx_hash)) => info!(
            global_index = index,
            identity = result.identity_index,
            nonce = result.nonce,
            %tx_hash,
            "Transaction sent"
        ),
        (error, tx_hash) => info!(
            global_index = index,
            identity = result.identity_index,
            nonce = result.nonce,
            tx_hash = ?tx_hash,
            error = error.as_deref(),
            "Transaction failed"
        ),
    }
}
