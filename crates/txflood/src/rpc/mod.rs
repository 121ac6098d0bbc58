//! RPC seam between the load generator and the node.
//!
//! Everything the generator needs from the chain goes through [`ChainClient`]. The
//! [`Dialer`] hands out one client per worker so each stream gets its own connection.

mod http;
pub use http::{AlloyClient, HttpDialer};

mod memory;
pub use memory::{InMemoryChain, SubmittedTx};

use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use tracing::warn;

use crate::{DEFAULT_GAS_PRICE, LoadError};

/// Header-level view of a block, enough to measure throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    /// Block number.
    pub number: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
    /// Number of transactions included.
    pub tx_count: usize,
}

/// The node operations consumed by the generator.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns the pending transaction count of `address`.
    async fn pending_nonce(&self, address: Address) -> Result<u64, LoadError>;

    /// Returns the latest balance of `address` in wei.
    async fn balance(&self, address: Address) -> Result<U256, LoadError>;

    /// Returns the gas price suggested by the node.
    async fn gas_price(&self) -> Result<u128, LoadError>;

    /// Submits an EIP-2718 encoded signed transaction and returns its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, LoadError>;

    /// Fetches block `number`, or `None` if the node does not have it yet.
    async fn block_by_number(&self, number: u64) -> Result<Option<BlockSummary>, LoadError>;
}

#[async_trait]
impl<T: ChainClient + ?Sized> ChainClient for Arc<T> {
    async fn pending_nonce(&self, address: Address) -> Result<u64, LoadError> {
        (**self).pending_nonce(address).await
    }

    async fn balance(&self, address: Address) -> Result<U256, LoadError> {
        (**self).balance(address).await
    }

    async fn gas_price(&self) -> Result<u128, LoadError> {
        (**self).gas_price().await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, LoadError> {
        (**self).send_raw_transaction(raw).await
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockSummary>, LoadError> {
        (**self).block_by_number(number).await
    }
}

/// The configured gas price, or the node's suggestion with a 1 gwei fallback when the
/// query fails.
pub async fn resolve_gas_price<C: ChainClient + ?Sized>(
    client: &C,
    configured: Option<u128>,
) -> u128 {
    if let Some(gas_price) = configured {
        return gas_price;
    }
    client.gas_price().await.unwrap_or_else(|e| {
        warn!(error = %e, fallback = DEFAULT_GAS_PRICE, "Gas price query failed, using fallback");
        DEFAULT_GAS_PRICE
    })
}

/// Opens connections to the node.
pub trait Dialer: Send + Sync + 'static {
    /// Connection type produced by [`Dialer::dial`].
    type Client: ChainClient + 'static;

    /// Opens a new connection.
    fn dial(&self) -> Result<Self::Client, LoadError>;
}
