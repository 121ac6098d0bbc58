//! The `blast` command.

use std::time::Duration;

use alloy_primitives::{Address, U256};
use clap::Args;
use eyre::{Result, WrapErr};
use tracing::{info, warn};
use txflood::{
    DEFAULT_SEND_PAUSE, DEFAULT_TRANSFER_GAS_LIMIT, DEFAULT_TRANSFER_VALUE, DEFAULT_TX_PER_ACCOUNT,
    Dialer, Dispatcher, OrderingMode, RunConfig, RunReport,
};

use super::FundCommand;
use crate::flags::GlobalArgs;

/// Sends transfers from every pool account concurrently.
#[derive(Debug, Clone, Args)]
pub(crate) struct BlastCommand {
    /// Transfers sent by each account.
    #[arg(
        long = "tx-per-account",
        short = 't',
        default_value_t = DEFAULT_TX_PER_ACCOUNT,
        env = "TXFLOOD_TX_PER_ACCOUNT"
    )]
    pub(crate) tx_per_account: u64,

    /// Number completions in the order they arrive.
    #[arg(long, env = "TXFLOOD_ORDERED")]
    pub(crate) ordered: bool,

    /// Recipient of every transfer; defaults to the faucet.
    #[arg(long)]
    pub(crate) recipient: Option<Address>,

    /// Value of every transfer in wei.
    #[arg(long, default_value_t = DEFAULT_TRANSFER_VALUE)]
    pub(crate) value: u64,

    /// Gas limit of every transfer.
    #[arg(long = "gas-limit", default_value_t = DEFAULT_TRANSFER_GAS_LIMIT)]
    pub(crate) gas_limit: u64,

    /// Gas price in wei; queried from the node when unset.
    #[arg(long = "gas-price")]
    pub(crate) gas_price: Option<u128>,

    /// Upper bound on accounts sending at once.
    #[arg(long = "max-concurrency")]
    pub(crate) max_concurrency: Option<usize>,

    /// Pause after each send (e.g. "100ns", "5ms").
    #[arg(long = "send-pause", default_value = "100ns", value_parser = humantime::parse_duration)]
    pub(crate) send_pause: Duration,

    /// Interval between progress lines.
    #[arg(long = "progress-interval", default_value = "5s", value_parser = humantime::parse_duration)]
    pub(crate) progress_interval: Duration,

    /// Disable progress lines.
    #[arg(long = "no-progress")]
    pub(crate) no_progress: bool,

    /// Fund the pool from the faucet before sending.
    #[arg(long)]
    pub(crate) fund: bool,
}

impl BlastCommand {
    /// Builds the run configuration, sending to `default_recipient` unless overridden.
    pub(crate) fn run_config(&self, chain_id: u64, default_recipient: Address) -> RunConfig {
        RunConfig::default()
            .with_tx_per_account(self.tx_per_account)
            .with_recipient(self.recipient.unwrap_or(default_recipient))
            .with_amount(U256::from(self.value))
            .with_gas_limit(self.gas_limit)
            .with_gas_price(self.gas_price)
            .with_chain_id(chain_id)
            .with_send_pause(self.send_pause)
            .with_ordering(OrderingMode::from_flag(self.ordered))
            .with_max_concurrency(self.max_concurrency)
            .with_progress_interval((!self.no_progress).then_some(self.progress_interval))
    }

    /// Runs the command.
    pub(crate) async fn run<D: Dialer>(&self, global: &GlobalArgs, dialer: D) -> Result<()> {
        self.execute(global, dialer).await.map(|report| log_report(&report))
    }

    async fn execute<D: Dialer>(&self, global: &GlobalArgs, dialer: D) -> Result<RunReport> {
        let pool = global.pool()?;
        let faucet = global.faucet()?;

        if self.fund {
            let funding = FundCommand { gas_price: self.gas_price, ..FundCommand::default() };
            funding.fund_pool(global, &dialer, &pool).await?;
        }

        let config = self.run_config(global.chain_id, faucet.address());
        Dispatcher::new(dialer, config)
            .run(pool.into_identities())
            .await
            .wrap_err("load run failed")
    }
}

fn log_report(report: &RunReport) {
    for outcome in report.outcomes.iter().filter(|o| o.is_aborted()) {
        warn!(
            target: "cli",
            identity = outcome.identity_index,
            error = outcome.aborted.as_deref().unwrap_or_default(),
            "Account sent nothing"
        );
    }

    let latencies: Vec<Duration> =
        report.results.iter().filter(|r| r.is_success()).map(|r| r.latency).collect();
    let max_latency = latencies.iter().max().copied().unwrap_or_default();
    let mean_latency = if latencies.is_empty() {
        Duration::ZERO
    } else {
        latencies.iter().sum::<Duration>() / latencies.len() as u32
    };

    let summary = report.summary;
    info!(
        target: "cli",
        sent = summary.succeeded,
        failed = summary.failed,
        aborted_accounts = summary.aborted_workers,
        gas_price = report.gas_price,
        ?mean_latency,
        ?max_latency,
        tps = summary.throughput(),
        "Blast complete"
    );
}
