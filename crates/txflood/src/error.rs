//! Error types for the load generator.

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Errors raised while deriving identities, talking to the node or sending transfers.
///
/// Setup failures ([`LoadError::Derivation`], [`LoadError::NonceQuery`]) end the affected
/// run or stream. Steady-state failures ([`LoadError::Signing`], [`LoadError::Submission`])
/// are recorded against a single transaction and the stream carries on.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The mnemonic or derivation path could not be turned into a signer.
    #[error("failed to derive identity at path {path}: {reason}")]
    Derivation {
        /// Derivation path that failed.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// A raw private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The pending nonce of an identity could not be read.
    #[error("failed to query pending nonce for {address}: {reason}")]
    NonceQuery {
        /// Address whose nonce was requested.
        address: Address,
        /// Underlying reason.
        reason: String,
    },

    /// The nonce sequence of an identity cannot advance past `u64::MAX`.
    #[error("nonce sequence of {address} is exhausted")]
    NonceExhausted {
        /// Address whose sequence ran out.
        address: Address,
    },

    /// A transfer could not be signed.
    #[error("failed to sign transfer with nonce {nonce}: {reason}")]
    Signing {
        /// Nonce of the rejected transfer.
        nonce: u64,
        /// Underlying reason.
        reason: String,
    },

    /// The node rejected or never received a signed transfer.
    #[error("failed to submit transaction {tx_hash}: {reason}")]
    Submission {
        /// Hash of the signed transaction.
        tx_hash: B256,
        /// Underlying reason.
        reason: String,
    },

    /// Transport-level RPC failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The faucet cannot cover the requested funding.
    #[error("faucet balance {balance} is too low to fund {targets} accounts")]
    InsufficientBalance {
        /// Faucet balance in wei.
        balance: U256,
        /// Number of accounts to fund.
        targets: usize,
    },

    /// A load run ended without producing a report.
    #[error("load run failed: {0}")]
    RunFailed(String),

    /// The node does not know the requested block.
    #[error("block {0} not found")]
    BlockNotFound(u64),
}

impl LoadError {
    /// Returns `true` for errors that only affect a single transaction.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Signing { .. } | Self::Submission { .. })
    }
}
