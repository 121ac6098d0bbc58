//! Top-level command line interface.

use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use txflood::HttpDialer;
use txflood_cli_utils::LogConfig;

use crate::{commands::Commands, flags::GlobalArgs};

/// Floods an Ethereum JSON-RPC endpoint with signed value transfers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Global arguments.
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    /// The workflow to run.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

impl Cli {
    /// Installs logging, then runs the selected workflow on a multi-threaded runtime.
    pub(crate) fn run(self) -> Result<()> {
        let _log_guard = LogConfig::from(self.global.log.clone()).init_tracing_subscriber()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("failed to build tokio runtime")?;
        runtime.block_on(self.execute())
    }

    async fn execute(self) -> Result<()> {
        if self.global.dry_run {
            let chain = Arc::new(self.global.dry_run_chain()?);
            tracing::info!(target: "cli", "Dry run, transfers are recorded in memory only");
            return self.command.run(&self.global, chain).await;
        }

        let dialer = HttpDialer::new(&self.global.rpc_url).wrap_err("invalid RPC url")?;
        self.command.run(&self.global, dialer).await
    }
}
