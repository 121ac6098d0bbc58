//! Run configuration.

use std::time::Duration;

use alloy_primitives::{Address, U256};

use crate::{
    DEFAULT_CHAIN_ID, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SEND_PAUSE, DEFAULT_TRANSFER_GAS_LIMIT,
    DEFAULT_TRANSFER_VALUE, DEFAULT_TX_PER_ACCOUNT, LoadError, OrderingMode,
};

/// Parameters of one load run, handed to the [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Transfers each identity sends.
    pub tx_per_account: u64,
    /// Recipient of every transfer.
    pub recipient: Address,
    /// Value of every transfer in wei.
    pub amount: U256,
    /// Gas limit of every transfer.
    pub gas_limit: u64,
    /// Fixed gas price in wei; queried from the node when unset.
    pub gas_price: Option<u128>,
    /// Chain id transfers are signed for.
    pub chain_id: u64,
    /// Pause after each send.
    pub send_pause: Duration,
    /// Whether completions receive a global sequence number.
    pub ordering: OrderingMode,
    /// Upper bound on concurrently sending workers; unbounded when unset.
    pub max_concurrency: Option<usize>,
    /// Interval between progress log lines; silent when unset.
    pub progress_interval: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tx_per_account: DEFAULT_TX_PER_ACCOUNT,
            recipient: Address::ZERO,
            amount: U256::from(DEFAULT_TRANSFER_VALUE),
            gas_limit: DEFAULT_TRANSFER_GAS_LIMIT,
            gas_price: None,
            chain_id: DEFAULT_CHAIN_ID,
            send_pause: DEFAULT_SEND_PAUSE,
            ordering: OrderingMode::Unordered,
            max_concurrency: None,
            progress_interval: Some(DEFAULT_PROGRESS_INTERVAL),
        }
    }
}

impl RunConfig {
    /// Sets the number of transfers per identity.
    pub const fn with_tx_per_account(mut self, count: u64) -> Self {
        self.tx_per_account = count;
        self
    }

    /// Sets the recipient of every transfer.
    pub const fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = recipient;
        self
    }

    /// Sets the value of every transfer.
    pub const fn with_amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the gas limit of every transfer.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Pins the gas price instead of asking the node.
    pub const fn with_gas_price(mut self, gas_price: Option<u128>) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Sets the chain id.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the pause after each send.
    pub const fn with_send_pause(mut self, pause: Duration) -> Self {
        self.send_pause = pause;
        self
    }

    /// Sets the ordering mode.
    pub const fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    /// Bounds the number of workers sending at once.
    pub const fn with_max_concurrency(mut self, max: Option<usize>) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Sets the progress log interval.
    pub const fn with_progress_interval(mut self, interval: Option<Duration>) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Rejects configurations no run could use.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.chain_id == 0 {
            return Err(LoadError::InvalidConfig("chain id must be non-zero".into()));
        }
        if self.gas_limit == 0 {
            return Err(LoadError::InvalidConfig("gas limit must be non-zero".into()));
        }
        if self.max_concurrency == Some(0) {
            return Err(LoadError::InvalidConfig("max concurrency must be non-zero".into()));
        }
        if self.progress_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(LoadError::InvalidConfig("progress interval must be non-zero".into()));
        }
        Ok(())
    }
}
