//! In-memory [`ChainClient`] used for dry runs and tests.
//!
//! The chain never executes anything: submitted transactions are decoded and recorded,
//! nonces and balances stay at whatever they were seeded with.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

use super::{BlockSummary, ChainClient, Dialer};
use crate::{DEFAULT_GAS_PRICE, LoadError};

/// A transaction accepted by [`InMemoryChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    /// Transaction hash.
    pub hash: B256,
    /// Transaction nonce.
    pub nonce: u64,
    /// Recipient, if any.
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: U256,
    /// Gas price the transaction pays.
    pub gas_price: Option<u128>,
    /// Chain id the transaction was signed for.
    pub chain_id: Option<u64>,
}

#[derive(Debug)]
struct ChainState {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    gas_price: Option<u128>,
    blocks: BTreeMap<u64, BlockSummary>,
    nonce_failures: HashSet<Address>,
    rejected_nonces: HashSet<u64>,
    refuse_dials: bool,
    submitted: Vec<SubmittedTx>,
    known: HashSet<B256>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            nonces: HashMap::new(),
            balances: HashMap::new(),
            gas_price: Some(DEFAULT_GAS_PRICE),
            blocks: BTreeMap::new(),
            nonce_failures: HashSet::new(),
            rejected_nonces: HashSet::new(),
            refuse_dials: false,
            submitted: Vec::new(),
            known: HashSet::new(),
        }
    }
}

/// A scripted chain that records submissions instead of executing them.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    /// Creates an empty chain suggesting a 1 gwei gas price.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds the pending nonce of `address`.
    pub fn with_nonce(self, address: Address, nonce: u64) -> Self {
        self.state().nonces.insert(address, nonce);
        self
    }

    /// Seeds the balance of `address`.
    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state().balances.insert(address, balance);
        self
    }

    /// Sets the suggested gas price; `None` makes the query fail.
    pub fn with_gas_price(self, gas_price: Option<u128>) -> Self {
        self.state().gas_price = gas_price;
        self
    }

    /// Adds a block.
    pub fn with_block(self, block: BlockSummary) -> Self {
        self.state().blocks.insert(block.number, block);
        self
    }

    /// Makes pending-nonce queries for `address` fail.
    pub fn with_nonce_failure(self, address: Address) -> Self {
        self.state().nonce_failures.insert(address);
        self
    }

    /// Makes submissions carrying `nonce` fail.
    pub fn with_rejected_nonce(self, nonce: u64) -> Self {
        self.state().rejected_nonces.insert(nonce);
        self
    }

    /// Makes every dial fail.
    pub fn with_refused_dials(self) -> Self {
        self.state().refuse_dials = true;
        self
    }

    /// Transactions accepted so far, in arrival order.
    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.state().submitted.clone()
    }

    /// Number of transactions accepted so far.
    pub fn submitted_count(&self) -> usize {
        self.state().submitted.len()
    }
}

#[async_trait]
impl ChainClient for InMemoryChain {
    async fn pending_nonce(&self, address: Address) -> Result<u64, LoadError> {
        let state = self.state();
        if state.nonce_failures.contains(&address) {
            return Err(LoadError::Transport(format!("nonce unavailable for {address}")));
        }
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn balance(&self, address: Address) -> Result<U256, LoadError> {
        Ok(self.state().balances.get(&address).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128, LoadError> {
        self.state().gas_price.ok_or_else(|| LoadError::Transport("gas price unavailable".into()))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, LoadError> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| LoadError::Transport(format!("invalid transaction encoding: {e}")))?;
        let hash = *envelope.tx_hash();

        let mut state = self.state();
        if state.rejected_nonces.contains(&envelope.nonce()) {
            return Err(LoadError::Transport(format!("nonce {} rejected", envelope.nonce())));
        }
        if !state.known.insert(hash) {
            return Err(LoadError::Transport("already known".into()));
        }

        state.submitted.push(SubmittedTx {
            hash,
            nonce: envelope.nonce(),
            to: envelope.to(),
            value: envelope.value(),
            gas_price: envelope.gas_price(),
            chain_id: envelope.chain_id(),
        });
        Ok(hash)
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockSummary>, LoadError> {
        Ok(self.state().blocks.get(&number).copied())
    }
}

impl Dialer for Arc<InMemoryChain> {
    type Client = Self;

    fn dial(&self) -> Result<Self::Client, LoadError> {
        if self.state().refuse_dials {
            return Err(LoadError::Transport("connection refused".into()));
        }
        Ok(Arc::clone(self))
    }
}
