//! Funding of derived identities from a privileged faucet account.

use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    ChainClient, Collected, DEFAULT_CHAIN_ID, DEFAULT_FUNDING_PAUSE, DEFAULT_GAS_PRICE,
    DEFAULT_TRANSFER_GAS_LIMIT, Identity, LoadError, NonceTracker, OrderingMode, ResultAggregator,
    SubmissionResult, TransactionBuilder, TransferRequest,
};

/// Result of a funding pass.
#[derive(Debug, Clone, Default)]
pub struct FundingReport {
    /// Value sent to each target.
    pub amount_each: U256,
    /// One result per target, in send order.
    pub collected: Collected,
}

/// Sends value from a single faucet identity to many targets, one at a time.
///
/// The faucet is the only writer of its nonce sequence, so sends are strictly sequential.
#[derive(Debug)]
pub struct Funder<C> {
    client: C,
    faucet: Identity,
    chain_id: u64,
    gas_limit: u64,
    gas_price: u128,
    pause: Duration,
    amount: Option<U256>,
}

impl<C: ChainClient> Funder<C> {
    /// Creates a funder with default transfer parameters.
    pub const fn new(client: C, faucet: Identity) -> Self {
        Self {
            client,
            faucet,
            chain_id: DEFAULT_CHAIN_ID,
            gas_limit: DEFAULT_TRANSFER_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            pause: DEFAULT_FUNDING_PAUSE,
            amount: None,
        }
    }

    /// Sets the chain id.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the gas price.
    pub const fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Sets the pause after each funding transfer.
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sends exactly `amount` to each target instead of a share of the faucet balance.
    pub const fn with_amount(mut self, amount: Option<U256>) -> Self {
        self.amount = amount;
        self
    }

    /// Value each of `targets` receives: the fixed amount if set, otherwise
    /// `balance / (2 * targets)`, leaving half the faucet balance untouched.
    pub async fn amount_per_target(&self, targets: usize) -> Result<U256, LoadError> {
        if let Some(amount) = self.amount {
            return Ok(amount);
        }
        let balance = self.client.balance(self.faucet.address()).await?;
        let share = balance / U256::from(targets as u64 * 2);
        if share.is_zero() {
            return Err(LoadError::InsufficientBalance { balance, targets });
        }
        Ok(share)
    }

    /// Funds every target in order.
    ///
    /// Balance and nonce queries fail the whole pass. Per-transfer failures are recorded and
    /// the pass continues with the next target.
    pub async fn fund(&self, targets: &[Address]) -> Result<FundingReport, LoadError> {
        if targets.is_empty() {
            return Ok(FundingReport::default());
        }

        let amount_each = self.amount_per_target(targets.len()).await?;
        let mut nonces = NonceTracker::prime(&self.client, self.faucet.address()).await?;
        let (aggregator, sink) = ResultAggregator::new(OrderingMode::Ordered);
        let index = self.faucet.index();

        info!(
            faucet = %self.faucet.address(),
            targets = targets.len(),
            %amount_each,
            first_nonce = nonces.peek(),
            "Funding accounts"
        );

        for (sequence, to) in targets.iter().copied().enumerate() {
            let sequence = sequence as u64;
            let started = Instant::now();
            let nonce = nonces.peek();
            let request = TransferRequest {
                from: self.faucet.address(),
                to,
                amount: amount_each,
                nonce,
                gas_limit: self.gas_limit,
                gas_price: self.gas_price,
                chain_id: self.chain_id,
            };

            let signed = match TransactionBuilder::build_signed(&request, &self.faucet) {
                Ok(signed) => signed,
                Err(e) => {
                    warn!(%to, nonce, error = %e, "Funding transfer could not be signed");
                    sink.record(SubmissionResult::failure(
                        index,
                        sequence,
                        nonce,
                        None,
                        &e,
                        started.elapsed(),
                    ));
                    continue;
                }
            };
            if let Err(e) = nonces.next() {
                warn!(%to, nonce, error = %e, "Funding stopped");
                sink.record(SubmissionResult::failure(
                    index,
                    sequence,
                    nonce,
                    None,
                    &e,
                    started.elapsed(),
                ));
                break;
            }

            let tx_hash = signed.hash;
            let result = match self.client.send_raw_transaction(signed.raw).await {
                Ok(_) => {
                    debug!(%to, nonce, %tx_hash, "Funding transfer sent");
                    SubmissionResult::success(index, sequence, nonce, tx_hash, started.elapsed())
                }
                Err(e) => {
                    let e = LoadError::Submission { tx_hash, reason: e.to_string() };
                    warn!(%to, nonce, error = %e, "Funding transfer failed");
                    SubmissionResult::failure(
                        index,
                        sequence,
                        nonce,
                        Some(tx_hash),
                        &e,
                        started.elapsed(),
                    )
                }
            };
            sink.record(result);

            if !self.pause.is_zero() {
                sleep(self.pause).await;
            }
        }
        drop(sink);

        let collected = aggregator.collect().await;
        info!(
            succeeded = collected.summary.succeeded,
            failed = collected.summary.failed,
            "Funding finished"
        );
        Ok(FundingReport { amount_each, collected })
    }
}
