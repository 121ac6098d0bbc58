//! Read-only queries used to check a run's effect on the chain.

use alloy_primitives::{Address, U256};
use tracing::warn;

use crate::{BlockSummary, ChainClient, Identity, LoadError};

/// Balance of one pool identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    /// Pool index.
    pub index: u32,
    /// Address.
    pub address: Address,
    /// Balance in wei, `None` if the query failed.
    pub balance: Option<U256>,
}

/// Queries the balance of every identity. Failed queries are logged and reported as `None`.
pub async fn balances<C: ChainClient + ?Sized>(
    client: &C,
    identities: &[Identity],
) -> Vec<AccountBalance> {
    let mut out = Vec::with_capacity(identities.len());
    for identity in identities {
        let balance = match client.balance(identity.address()).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(index = identity.index(), address = %identity.address(), error = %e, "Balance query failed");
                None
            }
        };
        out.push(AccountBalance { index: identity.index(), address: identity.address(), balance });
    }
    out
}

/// Fetches blocks `from..=to`. Blocks that cannot be fetched are logged and skipped.
pub async fn block_range<C: ChainClient + ?Sized>(
    client: &C,
    from: u64,
    to: u64,
) -> Result<Vec<BlockSummary>, LoadError> {
    if from > to {
        return Err(LoadError::InvalidConfig(format!("empty block range {from}..={to}")));
    }
    let mut blocks = Vec::new();
    for number in from..=to {
        match client.block_by_number(number).await {
            Ok(Some(block)) => blocks.push(block),
            Ok(None) => warn!(error = %LoadError::BlockNotFound(number), "Skipping block"),
            Err(e) => warn!(number, error = %e, "Block query failed"),
        }
    }
    Ok(blocks)
}

/// Transaction throughput over a span of blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockThroughput {
    /// Blocks considered.
    pub blocks: usize,
    /// Transactions across those blocks.
    pub transactions: usize,
    /// Seconds between the first and last block.
    pub span_secs: u64,
}

impl BlockThroughput {
    /// Summarises `blocks`, which must be sorted by number. `None` when empty.
    pub fn from_blocks(blocks: &[BlockSummary]) -> Option<Self> {
        let first = blocks.first()?;
        let last = blocks.last()?;
        Some(Self {
            blocks: blocks.len(),
            transactions: blocks.iter().map(|b| b.tx_count).sum(),
            span_secs: last.timestamp.saturating_sub(first.timestamp),
        })
    }

    /// Transactions per second, `None` if all blocks share a timestamp.
    pub fn tps(&self) -> Option<f64> {
        (self.span_secs > 0).then(|| self.transactions as f64 / self.span_secs as f64)
    }
}
