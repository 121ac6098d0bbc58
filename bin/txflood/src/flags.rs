//! Global CLI flags.

use alloy_primitives::U256;
use clap::Parser;
use eyre::{Result, WrapErr};
use txflood::{
    DEFAULT_ACCOUNT_COUNT, DEFAULT_CHAIN_ID, DEFAULT_FAUCET_KEY, DEFAULT_MNEMONIC, DEFAULT_RPC_URL,
    Identity, IdentityPool, InMemoryChain,
};
use txflood_cli_utils::LogArgs;

/// Pool index reported for the faucet identity.
const FAUCET_INDEX: u32 = u32::MAX;

/// Faucet balance seeded into the in-memory chain: 1000 ether.
const DRY_RUN_FAUCET_BALANCE: U256 = U256::from_limbs([0x35c9_adc5_dea0_0000, 0x36, 0, 0]);

/// Arguments shared by every subcommand.
#[derive(Parser, Debug, Clone)]
pub(crate) struct GlobalArgs {
    /// JSON-RPC endpoint.
    #[arg(
        long = "rpc-url",
        short = 'r',
        global = true,
        default_value = DEFAULT_RPC_URL,
        env = "TXFLOOD_RPC_URL"
    )]
    pub(crate) rpc_url: String,

    /// Mnemonic the account pool is derived from.
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_MNEMONIC,
        env = "TXFLOOD_MNEMONIC",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub(crate) mnemonic: String,

    /// Hex private key of the faucet account.
    #[arg(
        long = "faucet-key",
        global = true,
        default_value = DEFAULT_FAUCET_KEY,
        env = "TXFLOOD_FAUCET_KEY",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub(crate) faucet_key: String,

    /// Chain id transactions are signed for.
    #[arg(long = "chain-id", global = true, default_value_t = DEFAULT_CHAIN_ID, env = "TXFLOOD_CHAIN_ID")]
    pub(crate) chain_id: u64,

    /// Number of accounts derived from the mnemonic.
    #[arg(
        long,
        short = 'n',
        global = true,
        default_value_t = DEFAULT_ACCOUNT_COUNT,
        env = "TXFLOOD_ACCOUNTS"
    )]
    pub(crate) accounts: u32,

    /// Derivation index of the first account.
    #[arg(long = "start-index", global = true, default_value_t = 0, env = "TXFLOOD_START_INDEX")]
    pub(crate) start_index: u32,

    /// Record transfers against an in-memory chain instead of a node.
    #[arg(long = "dry-run", global = true)]
    pub(crate) dry_run: bool,

    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log: LogArgs,
}

impl GlobalArgs {
    /// Derives the account pool.
    pub(crate) fn pool(&self) -> Result<IdentityPool> {
        IdentityPool::derive_range(&self.mnemonic, self.start_index, self.accounts)
            .wrap_err("failed to derive account pool")
    }

    /// Loads the faucet identity.
    pub(crate) fn faucet(&self) -> Result<Identity> {
        Identity::from_private_key_hex(FAUCET_INDEX, &self.faucet_key)
            .wrap_err("failed to load faucet key")
    }

    /// An in-memory chain where only the faucet holds value.
    pub(crate) fn dry_run_chain(&self) -> Result<InMemoryChain> {
        let faucet = self.faucet()?;
        Ok(InMemoryChain::new().with_balance(faucet.address(), DRY_RUN_FAUCET_BALANCE))
    }
}

#[cfg(test)]
mod tests {
    use txflood::DEFAULT_MNEMONIC;

    use super::*;

    fn args(extra: &[&str]) -> GlobalArgs {
        GlobalArgs::parse_from(std::iter::once("txflood").chain(extra.iter().copied()))
    }

    #[test]
    fn dry_run_balance_is_1000_ether() {
        let ether = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(DRY_RUN_FAUCET_BALANCE, U256::from(1000u64) * ether);
    }

    #[test]
    fn pool_respects_start_and_count() {
        let pool = args(&["-n", "3", "--start-index", "2"]).pool().unwrap();
        let indices: Vec<u32> = pool.iter().map(|identity| identity.index()).collect();
        assert_eq!(indices, vec![2, 3, 4]);

        let full = IdentityPool::derive(DEFAULT_MNEMONIC, 5).unwrap();
        assert_eq!(pool.addresses(), full.addresses()[2..].to_vec());
    }

    #[test]
    fn bad_faucet_key_is_an_error() {
        assert!(args(&["--faucet-key", "0x1234"]).faucet().is_err());
    }

    #[test]
    fn faucet_uses_reserved_index() {
        assert_eq!(args(&[]).faucet().unwrap().index(), FAUCET_INDEX);
    }
}
