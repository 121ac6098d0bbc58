//! One identity's transfer stream.

use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    ChainClient, Identity, LoadError, NonceTracker, ResultSink, RunConfig, SubmissionResult,
    TransactionBuilder, TransferRequest,
};

/// Transfer parameters shared by every worker of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Recipient of every transfer.
    pub recipient: Address,
    /// Value in wei.
    pub amount: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Chain id.
    pub chain_id: u64,
    /// Transfers per worker.
    pub count: u64,
    /// Pause after each send.
    pub pause: Duration,
}

impl TransferPlan {
    /// Derives the plan from `config` with an already resolved gas price.
    pub const fn from_config(config: &RunConfig, gas_price: u128) -> Self {
        Self {
            recipient: config.recipient,
            amount: config.amount,
            gas_limit: config.gas_limit,
            gas_price,
            chain_id: config.chain_id,
            count: config.tx_per_account,
            pause: config.send_pause,
        }
    }

    /// The request for a transfer from `from` with `nonce`.
    pub const fn request(&self, from: Address, nonce: u64) -> TransferRequest {
        TransferRequest {
            from,
            to: self.recipient,
            amount: self.amount,
            nonce,
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
            chain_id: self.chain_id,
        }
    }
}

/// How a worker's stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Pool index of the identity.
    pub identity_index: u32,
    /// Transfers the node accepted.
    pub sent: u64,
    /// Attempts that failed to sign or submit.
    pub failed: u64,
    /// Setup error that ended the stream before its first send.
    pub aborted: Option<String>,
}

impl WorkerOutcome {
    const fn new(identity_index: u32) -> Self {
        Self { identity_index, sent: 0, failed: 0, aborted: None }
    }

    /// Builds the outcome of a stream that never started.
    pub fn aborted(identity_index: u32, error: &LoadError) -> Self {
        Self { aborted: Some(error.to_string()), ..Self::new(identity_index) }
    }

    /// Returns `true` if setup failed.
    pub const fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Drives one identity through `plan.count` transfers.
#[derive(Debug)]
pub struct Worker<C> {
    identity: Identity,
    client: C,
    plan: TransferPlan,
    sink: ResultSink,
}

impl<C: ChainClient> Worker<C> {
    /// Creates a worker owning `identity` and its dedicated `client`.
    pub const fn new(identity: Identity, client: C, plan: TransferPlan, sink: ResultSink) -> Self {
        Self { identity, client, plan, sink }
    }

    /// Runs the stream to completion.
    ///
    /// A failed nonce query ends the stream with no sends. Signing and submission failures
    /// are recorded and the stream moves on. A signing failure does not consume its nonce, a
    /// submission failure does. An exhausted nonce sequence ends the stream.
    pub async fn run(self) -> WorkerOutcome {
        let Self { identity, client, plan, sink } = self;
        let index = identity.index();
        let mut outcome = WorkerOutcome::new(index);

        let mut nonces = match NonceTracker::prime(&client, identity.address()).await {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(identity = index, error = %e, "Nonce query failed, ending stream");
                sink.record_abort();
                return WorkerOutcome::aborted(index, &e);
            }
        };
        debug!(identity = index, first_nonce = nonces.peek(), count = plan.count, "Worker started");

        for sequence in 0..plan.count {
            let started = Instant::now();
            let nonce = nonces.peek();
            let request = plan.request(identity.address(), nonce);

            let signed = match TransactionBuilder::build_signed(&request, &identity) {
                Ok(signed) => signed,
                Err(e) => {
                    warn!(identity = index, sequence, nonce, error = %e, "Signing failed, skipping");
                    sink.record(SubmissionResult::failure(
                        index,
                        sequence,
                        nonce,
                        None,
                        &e,
                        started.elapsed(),
                    ));
                    outcome.failed += 1;
                    pause(plan.pause).await;
                    continue;
                }
            };
            if let Err(e) = nonces.next() {
                warn!(identity = index, sequence, nonce, error = %e, "Ending stream");
                sink.record(SubmissionResult::failure(
                    index,
                    sequence,
                    nonce,
                    None,
                    &e,
                    started.elapsed(),
                ));
                outcome.failed += 1;
                break;
            }

            let tx_hash = signed.hash;
            match client.send_raw_transaction(signed.raw).await {
                Ok(_) => {
                    debug!(identity = index, sequence, nonce, %tx_hash, "Transaction sent");
                    sink.record(SubmissionResult::success(
                        index,
                        sequence,
                        nonce,
                        tx_hash,
                        started.elapsed(),
                    ));
                    outcome.sent += 1;
                }
                Err(e) => {
                    let e = LoadError::Submission { tx_hash, reason: e.to_string() };
                    warn!(identity = index, sequence, nonce, error = %e, "Transaction failed");
                    sink.record(SubmissionResult::failure(
                        index,
                        sequence,
                        nonce,
                        Some(tx_hash),
                        &e,
                        started.elapsed(),
                    ));
                    outcome.failed += 1;
                }
            }

            pause(plan.pause).await;
        }

        debug!(identity = index, sent = outcome.sent, failed = outcome.failed, "Worker finished");
        outcome
    }
}

async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{DEFAULT_MNEMONIC, InMemoryChain, OrderingMode, ResultAggregator};

    fn plan(count: u64) -> TransferPlan {
        TransferPlan::from_config(
            &RunConfig::default()
                .with_tx_per_account(count)
                .with_recipient(Address::repeat_byte(0x99))
                .with_send_pause(Duration::ZERO),
            1_000_000_000,
        )
    }

    #[tokio::test]
    async fn nonces_follow_the_primed_value() {
        let identity = Identity::derive(DEFAULT_MNEMONIC, 0).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_nonce(identity.address(), 40));
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Unordered);

        let outcome = Worker::new(identity, Arc::clone(&chain), plan(3), sink).run().await;
        let collected = aggregator.collect().await;

        assert_eq!(outcome.sent, 3);
        assert!(!outcome.is_aborted());
        let nonces: Vec<_> = collected.results.iter().map(|r| r.nonce).collect();
        assert_eq!(nonces, vec![40, 41, 42]);
        let sequences: Vec<_> = collected.results.iter().map(|r| r.sequence_index).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        let on_chain: Vec<_> = chain.submitted().iter().map(|tx| tx.nonce).collect();
        assert_eq!(on_chain, vec![40, 41, 42]);
        assert!(chain.submitted().iter().all(|tx| tx.to == Some(Address::repeat_byte(0x99))));
    }

    #[tokio::test]
    async fn nonce_failure_ends_stream_without_sends() {
        let identity = Identity::derive(DEFAULT_MNEMONIC, 1).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_nonce_failure(identity.address()));
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Unordered);

        let outcome = Worker::new(identity, Arc::clone(&chain), plan(5), sink).run().await;
        let collected = aggregator.collect().await;

        assert!(outcome.is_aborted());
        assert_eq!(outcome.sent + outcome.failed, 0);
        assert!(collected.results.is_empty());
        assert_eq!(collected.summary.aborted_workers, 1);
        assert_eq!(chain.submitted_count(), 0);
    }

    #[tokio::test]
    async fn submission_failure_is_recorded_and_stream_continues() {
        let identity = Identity::derive(DEFAULT_MNEMONIC, 2).unwrap();
        let chain = Arc::new(
            InMemoryChain::new().with_nonce(identity.address(), 10).with_rejected_nonce(11),
        );
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Unordered);

        let outcome = Worker::new(identity, Arc::clone(&chain), plan(3), sink).run().await;
        let collected = aggregator.collect().await;

        assert_eq!((outcome.sent, outcome.failed), (2, 1));
        let failed = collected.results.iter().find(|r| !r.is_success()).unwrap();
        assert_eq!(failed.nonce, 11);
        assert!(failed.tx_hash.is_some());
        let on_chain: Vec<_> = chain.submitted().iter().map(|tx| tx.nonce).collect();
        assert_eq!(on_chain, vec![10, 12]);
    }

    #[tokio::test]
    async fn signing_failure_keeps_the_nonce() {
        let identity = Identity::derive(DEFAULT_MNEMONIC, 3).unwrap();
        let chain = Arc::new(InMemoryChain::new());
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Unordered);
        let mut bad_plan = plan(2);
        bad_plan.gas_limit = 0;

        let outcome = Worker::new(identity, Arc::clone(&chain), bad_plan, sink).run().await;
        let collected = aggregator.collect().await;

        assert_eq!((outcome.sent, outcome.failed), (0, 2));
        assert!(collected.results.iter().all(|r| r.nonce == 0 && r.tx_hash.is_none()));
        assert_eq!(chain.submitted_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_nonce_sequence_ends_stream() {
        let identity = Identity::derive(DEFAULT_MNEMONIC, 4).unwrap();
        let chain = Arc::new(InMemoryChain::new().with_nonce(identity.address(), u64::MAX - 1));
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Unordered);

        let outcome = Worker::new(identity, Arc::clone(&chain), plan(3), sink).run().await;
        let collected = aggregator.collect().await;

        assert_eq!((outcome.sent, outcome.failed), (1, 1));
        assert_eq!(collected.results.len(), 2);
        let last = collected.results.last().unwrap();
        assert_eq!(last.nonce, u64::MAX);
        assert!(last.tx_hash.is_none());
        let on_chain: Vec<_> = chain.submitted().iter().map(|tx| tx.nonce).collect();
        assert_eq!(on_chain, vec![u64::MAX - 1]);
    }
}
