//! The `blocks` command.

use clap::Args;
use eyre::{Result, WrapErr};
use tracing::info;
use txflood::{
    Dialer,
    inspect::{self, BlockThroughput},
};

/// Prints the transaction count of every block in a range.
#[derive(Debug, Clone, Args)]
pub(crate) struct BlocksCommand {
    /// First block, inclusive.
    #[arg(long)]
    pub(crate) from: u64,

    /// Last block, inclusive.
    #[arg(long)]
    pub(crate) to: u64,
}

impl BlocksCommand {
    /// Runs the command.
    pub(crate) async fn run<D: Dialer>(&self, dialer: &D) -> Result<()> {
        let client = dialer.dial().wrap_err("failed to connect to node")?;
        let blocks = inspect::block_range(&client, self.from, self.to).await?;

        for block in &blocks {
            println!("{:>10} {:>12} {}", block.number, block.timestamp, block.tx_count);
        }

        match BlockThroughput::from_blocks(&blocks) {
            Some(throughput) => info!(
                target: "cli",
                blocks = throughput.blocks,
                transactions = throughput.transactions,
                span_secs = throughput.span_secs,
                tps = throughput.tps(),
                "Block range summary"
            ),
            None => info!(target: "cli", from = self.from, to = self.to, "No blocks found"),
        }
        Ok(())
    }
}
