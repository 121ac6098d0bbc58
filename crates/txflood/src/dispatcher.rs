//! Fan-out of one worker per identity and the join barrier over them.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Semaphore,
    task::{JoinHandle, JoinSet},
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    Collected, DEFAULT_GAS_PRICE, Dialer, Identity, LoadError, ResultAggregator, ResultSink,
    RunConfig, Stats, SubmissionResult, Summary, TransferPlan, Worker, WorkerOutcome,
    resolve_gas_price,
};

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Per-transaction results in completion order.
    pub results: Vec<SubmissionResult>,
    /// Aggregate counts.
    pub summary: Summary,
    /// One outcome per worker, sorted by identity index.
    pub outcomes: Vec<WorkerOutcome>,
    /// Gas price the run signed with.
    pub gas_price: u128,
}

/// Handle to a load run in flight.
///
/// [`RunHandle::stats`] reads the live counters, [`RunHandle::wait`] waits for the join
/// barrier and returns the report.
#[derive(Debug)]
pub struct RunHandle {
    stats: Arc<Stats>,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Live counters of the run.
    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Whether every worker has finished and the report is ready.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for every worker and returns the report.
    pub async fn wait(self) -> Result<RunReport, LoadError> {
        self.task.await.map_err(|e| {
            error!(error = %e, "Load run task did not complete");
            LoadError::RunFailed(e.to_string())
        })
    }
}

/// Spawns workers over a pool of identities and waits for all of them.
#[derive(Debug)]
pub struct Dispatcher<D> {
    dialer: Arc<D>,
    config: RunConfig,
}

impl<D: Dialer> Dispatcher<D> {
    /// Creates a dispatcher dialing through `dialer`.
    pub fn new(dialer: D, config: RunConfig) -> Self {
        Self { dialer: Arc::new(dialer), config }
    }

    /// The run configuration.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs one worker per identity and returns once every worker has finished.
    ///
    /// Workers never cancel each other: an identity whose setup fails ends its own stream
    /// and the rest carry on. Only an invalid configuration fails the run as a whole.
    pub async fn run(&self, identities: Vec<Identity>) -> Result<RunReport, LoadError> {
        self.start(identities)?.wait().await
    }

    /// Validates the configuration and starts the run in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, identities: Vec<Identity>) -> Result<RunHandle, LoadError> {
        self.config.validate()?;

        let (aggregator, sink) = ResultAggregator::new(self.config.ordering);
        let stats = aggregator.stats();
        let task = tokio::spawn(drive(
            Arc::clone(&self.dialer),
            self.config.clone(),
            identities,
            aggregator,
            sink,
        ));
        Ok(RunHandle { stats, task })
    }
}

/// Body of a run: fans out the workers and drains their results while they send.
async fn drive<D: Dialer>(
    dialer: Arc<D>,
    config: RunConfig,
    identities: Vec<Identity>,
    aggregator: ResultAggregator,
    sink: ResultSink,
) -> RunReport {
    let gas_price = dial_gas_price(&*dialer, config.gas_price).await;
    let plan = TransferPlan::from_config(&config, gas_price);
    let worker_count = identities.len();

    let progress = CancellationToken::new();
    if let Some(every) = config.progress_interval {
        let expected = expected_sends(worker_count, plan.count);
        spawn_progress_reporter(aggregator.stats(), expected, every, progress.clone());
    }
    let limiter = config.max_concurrency.map(|max| Arc::new(Semaphore::new(max)));

    info!(
        workers = worker_count,
        tx_per_account = plan.count,
        gas_price,
        chain_id = plan.chain_id,
        ordering = ?config.ordering,
        max_concurrency = ?config.max_concurrency,
        "Starting load run"
    );

    let mut workers = JoinSet::new();
    for identity in identities {
        let dialer = Arc::clone(&dialer);
        let limiter = limiter.clone();
        let sink = sink.clone();
        workers.spawn(async move {
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };
            run_worker(&*dialer, identity, plan, sink).await
        });
    }
    drop(sink);

    let (mut outcomes, collected) =
        tokio::join!(join_all(workers, worker_count), aggregator.collect());
    progress.cancel();
    outcomes.sort_by_key(|outcome| outcome.identity_index);

    let Collected { results, summary } = collected;
    info!(
        submitted = summary.submitted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        aborted_workers = summary.aborted_workers,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        tps = summary.throughput(),
        "Load run finished"
    );

    RunReport { results, summary, outcomes, gas_price }
}

/// Transactions a run sends if every stream completes. Saturates on overflow.
fn expected_sends(workers: usize, per_worker: u64) -> u64 {
    u64::try_from(workers).unwrap_or(u64::MAX).saturating_mul(per_worker)
}

/// The join barrier: waits for every worker task.
async fn join_all(mut workers: JoinSet<WorkerOutcome>, expected: usize) -> Vec<WorkerOutcome> {
    let mut outcomes = Vec::with_capacity(expected);
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!(error = %e, "Worker task did not complete"),
        }
    }
    outcomes
}

/// Configured gas price, else the node's suggestion over a fresh connection.
async fn dial_gas_price<D: Dialer>(dialer: &D, configured: Option<u128>) -> u128 {
    if let Some(gas_price) = configured {
        return gas_price;
    }
    match dialer.dial() {
        Ok(client) => resolve_gas_price(&client, None).await,
        Err(e) => {
            warn!(error = %e, fallback = DEFAULT_GAS_PRICE, "Gas price dial failed, using fallback");
            DEFAULT_GAS_PRICE
        }
    }
}

/// Dials a dedicated connection and runs the worker. A failed dial ends the stream like a
/// failed nonce query.
async fn run_worker<D: Dialer>(
    dialer: &D,
    identity: Identity,
    plan: TransferPlan,
    sink: ResultSink,
) -> WorkerOutcome {
    match dialer.dial() {
        Ok(client) => Worker::new(identity, client, plan, sink).run().await,
        Err(e) => {
            warn!(identity = identity.index(), error = %e, "Dial failed, ending stream");
            sink.record_abort();
            WorkerOutcome::aborted(identity.index(), &e)
        }
    }
}

fn spawn_progress_reporter(
    stats: Arc<Stats>,
    expected: u64,
    every: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    info!(
                        submitted = stats.submitted(),
                        succeeded = stats.succeeded(),
                        failed = stats.failed(),
                        aborted_workers = stats.aborted_workers(),
                        expected,
                        "Load progress"
                    );
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use alloy_primitives::{Address, B256, Bytes, U256};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        BlockSummary, ChainClient, DEFAULT_MNEMONIC, IdentityPool, InMemoryChain, OrderingMode,
    };

    /// Holds the nonce query of one address until released.
    #[derive(Debug)]
    struct GatedChain {
        inner: InMemoryChain,
        held: Address,
        release: Notify,
    }

    #[async_trait]
    impl ChainClient for GatedChain {
        async fn pending_nonce(&self, address: Address) -> Result<u64, LoadError> {
            if address == self.held {
                self.release.notified().await;
            }
            self.inner.pending_nonce(address).await
        }

        async fn balance(&self, address: Address) -> Result<U256, LoadError> {
            self.inner.balance(address).await
        }

        async fn gas_price(&self) -> Result<u128, LoadError> {
            self.inner.gas_price().await
        }

        async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, LoadError> {
            self.inner.send_raw_transaction(raw).await
        }

        async fn block_by_number(&self, number: u64) -> Result<Option<BlockSummary>, LoadError> {
            self.inner.block_by_number(number).await
        }
    }

    impl Dialer for Arc<GatedChain> {
        type Client = Self;

        fn dial(&self) -> Result<Self::Client, LoadError> {
            Ok(Arc::clone(self))
        }
    }

    fn config() -> RunConfig {
        RunConfig::default()
            .with_recipient(Address::repeat_byte(0x42))
            .with_send_pause(Duration::ZERO)
            .with_progress_interval(None)
    }

    #[tokio::test]
    async fn every_identity_gets_a_gap_free_stream() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 4).unwrap();
        let chain = Arc::new(InMemoryChain::new());
        let dispatcher = Dispatcher::new(Arc::clone(&chain), config().with_tx_per_account(5));

        let report = dispatcher.run(pool.into_identities()).await.unwrap();

        assert_eq!(report.summary.submitted, 20);
        assert_eq!(report.summary.succeeded, 20);
        assert_eq!(report.outcomes.len(), 4);
        for identity in 0..4 {
            let mut nonces: Vec<_> = report
                .results
                .iter()
                .filter(|r| r.identity_index == identity)
                .map(|r| r.nonce)
                .collect();
            nonces.sort_unstable();
            assert_eq!(nonces, (0..5).collect::<Vec<_>>());
        }
        let pairs: HashSet<_> = report.results.iter().map(|r| (r.identity_index, r.nonce)).collect();
        assert_eq!(pairs.len(), report.results.len());
        assert_eq!(chain.submitted_count(), 20);
    }

    #[tokio::test]
    async fn ordered_mode_numbers_completions() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 3).unwrap();
        let chain = Arc::new(InMemoryChain::new());
        let dispatcher = Dispatcher::new(
            chain,
            config().with_tx_per_account(4).with_ordering(OrderingMode::Ordered),
        );

        let report = dispatcher.run(pool.into_identities()).await.unwrap();

        let indices: Vec<_> = report.results.iter().map(|r| r.global_index).collect();
        let expected: Vec<_> = (0..12).map(Some).collect();
        assert_eq!(indices, expected);
    }

    #[tokio::test]
    async fn gas_price_falls_back_when_query_fails() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 1).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_gas_price(None));
        let report = Dispatcher::new(Arc::clone(&chain), config().with_tx_per_account(1))
            .run(pool.into_identities())
            .await
            .unwrap();

        assert_eq!(report.gas_price, DEFAULT_GAS_PRICE);
        assert_eq!(chain.submitted()[0].gas_price, Some(DEFAULT_GAS_PRICE));
    }

    #[tokio::test]
    async fn configured_gas_price_wins() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 1).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_gas_price(Some(7)));
        let report = Dispatcher::new(chain, config().with_gas_price(Some(3)).with_tx_per_account(1))
            .run(pool.into_identities())
            .await
            .unwrap();
        assert_eq!(report.gas_price, 3);
    }

    #[tokio::test]
    async fn refused_dials_abort_every_stream() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 2).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_refused_dials());
        let report = Dispatcher::new(chain, config()).run(pool.into_identities()).await.unwrap();

        assert_eq!(report.summary.submitted, 0);
        assert_eq!(report.summary.aborted_workers, 2);
        assert!(report.outcomes.iter().all(WorkerOutcome::is_aborted));
    }

    #[tokio::test]
    async fn concurrency_limit_still_runs_everyone() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 5).unwrap();
        let chain = Arc::new(InMemoryChain::new());
        let report = Dispatcher::new(
            Arc::clone(&chain),
            config().with_tx_per_account(2).with_max_concurrency(Some(2)),
        )
        .run(pool.into_identities())
        .await
        .unwrap();

        assert_eq!(report.summary.succeeded, 10);
        assert_eq!(chain.submitted_count(), 10);
    }

    #[tokio::test]
    async fn invalid_config_fails_the_run() {
        let chain = Arc::new(InMemoryChain::new());
        let result = Dispatcher::new(chain, config().with_chain_id(0)).run(Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_pool_is_a_noop() {
        let chain = Arc::new(InMemoryChain::new());
        let report = Dispatcher::new(chain, config()).run(Vec::new()).await.unwrap();
        assert!(report.results.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn completions_are_numbered_before_the_barrier_releases() {
        let pool = IdentityPool::derive(DEFAULT_MNEMONIC, 3).unwrap();
        let held = pool.addresses()[2];
        let chain =
            Arc::new(GatedChain { inner: InMemoryChain::new(), held, release: Notify::new() });
        let dispatcher = Dispatcher::new(
            Arc::clone(&chain),
            config()
                .with_tx_per_account(2)
                .with_gas_price(Some(1))
                .with_ordering(OrderingMode::Ordered),
        );

        let handle = dispatcher.start(pool.into_identities()).unwrap();
        let stats = handle.stats();
        tokio::time::timeout(Duration::from_secs(5), async {
            while stats.numbered() < 4 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(!handle.is_finished());
        assert_eq!(chain.inner.submitted_count(), 4);

        chain.release.notify_one();
        let report = handle.wait().await.unwrap();

        assert_eq!(stats.numbered(), 6);
        let late: Vec<_> = report
            .results
            .iter()
            .filter(|r| r.identity_index == 2)
            .filter_map(|r| r.global_index)
            .collect();
        assert_eq!(late, vec![4, 5]);
    }

    #[test]
    fn expected_sends_saturates() {
        assert_eq!(expected_sends(3, 2), 6);
        assert_eq!(expected_sends(5_000, u64::MAX), u64::MAX);
    }
}
