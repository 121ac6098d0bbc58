//! The `fund` command.

use std::time::Duration;

use alloy_primitives::{U256, utils::parse_ether};
use clap::Args;
use eyre::{Result, WrapErr};
use tracing::{info, warn};
use txflood::{
    DEFAULT_FUNDING_PAUSE, Dialer, Funder, FundingReport, IdentityPool, resolve_gas_price,
};

use crate::flags::GlobalArgs;

/// Funds every pool account from the faucet.
#[derive(Debug, Clone, Args)]
pub(crate) struct FundCommand {
    /// Ether sent to each account; defaults to half the faucet balance split evenly.
    #[arg(long, value_parser = parse_ether)]
    pub(crate) amount: Option<U256>,

    /// Gas price in wei; queried from the node when unset.
    #[arg(long = "gas-price")]
    pub(crate) gas_price: Option<u128>,

    /// Pause after each funding transfer (e.g. "50ms").
    #[arg(long, default_value = "50ms", value_parser = humantime::parse_duration)]
    pub(crate) pause: Duration,
}

impl Default for FundCommand {
    fn default() -> Self {
        Self { amount: None, gas_price: None, pause: DEFAULT_FUNDING_PAUSE }
    }
}

impl FundCommand {
    /// Runs the command.
    pub(crate) async fn run<D: Dialer>(&self, global: &GlobalArgs, dialer: &D) -> Result<()> {
        let pool = global.pool()?;
        self.fund_pool(global, dialer, &pool).await.map(|_| ())
    }

    /// Funds `pool` and logs the outcome. Individual failed transfers do not fail the command.
    pub(crate) async fn fund_pool<D: Dialer>(
        &self,
        global: &GlobalArgs,
        dialer: &D,
        pool: &IdentityPool,
    ) -> Result<FundingReport> {
        let client = dialer.dial().wrap_err("failed to connect to node")?;
        let gas_price = resolve_gas_price(&client, self.gas_price).await;

        let report = Funder::new(client, global.faucet()?)
            .with_chain_id(global.chain_id)
            .with_gas_price(gas_price)
            .with_pause(self.pause)
            .with_amount(self.amount)
            .fund(&pool.addresses())
            .await
            .wrap_err("funding failed")?;

        let summary = report.collected.summary;
        if summary.failed > 0 {
            warn!(target: "cli", failed = summary.failed, "Some funding transfers failed");
        }
        info!(
            target: "cli",
            funded = summary.succeeded,
            failed = summary.failed,
            amount_each = %report.amount_each,
            elapsed = ?summary.elapsed,
            "Funding complete"
        );
        Ok(report)
    }
}
