//! Defaults used when a run does not override them.

use std::time::Duration;

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:9545";

/// Default chain id (`0x385`).
pub const DEFAULT_CHAIN_ID: u64 = 0x385;

/// Mnemonic the identity pool is derived from unless overridden.
pub const DEFAULT_MNEMONIC: &str =
    "pepper hair process town say voyage exhibit over carry property follow define";

/// Private key of the default funding account (Anvil account #0).
pub const DEFAULT_FAUCET_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Derivation path prefix; the account index is appended.
pub const DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0/";

/// Gas limit of a plain value transfer.
pub const DEFAULT_TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Gas price used when none is configured and the node cannot suggest one: 1 gwei.
pub const DEFAULT_GAS_PRICE: u128 = 1_000_000_000;

/// Value of each load transfer in wei.
pub const DEFAULT_TRANSFER_VALUE: u64 = 1;

/// Number of identities in the pool.
pub const DEFAULT_ACCOUNT_COUNT: u32 = 5_000;

/// Transfers each identity sends per run.
pub const DEFAULT_TX_PER_ACCOUNT: u64 = 2;

/// Pause after each load transfer.
pub const DEFAULT_SEND_PAUSE: Duration = Duration::from_nanos(100);

/// Pause after each funding transfer.
pub const DEFAULT_FUNDING_PAUSE: Duration = Duration::from_millis(50);

/// Interval between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);
