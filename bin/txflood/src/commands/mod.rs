//! Subcommands of the CLI.

use clap::Subcommand;
use eyre::Result;
use txflood::Dialer;

use crate::flags::GlobalArgs;

mod accounts;
pub(crate) use accounts::AccountsCommand;

mod balances;
pub(crate) use balances::BalancesCommand;

mod blast;
pub(crate) use blast::BlastCommand;

mod blocks;
pub(crate) use blocks::BlocksCommand;

mod fund;
pub(crate) use fund::FundCommand;

/// Workflows the CLI can run.
#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Commands {
    /// Sends a share of the faucet balance to every pool account.
    #[command(alias = "f")]
    Fund(FundCommand),
    /// Sends concurrent transfers from every pool account.
    #[command(alias = "b")]
    Blast(BlastCommand),
    /// Prints the balance of every pool account.
    Balances(BalancesCommand),
    /// Prints transaction counts for a range of blocks.
    Blocks(BlocksCommand),
    /// Prints the pool's addresses and optionally its private keys.
    Accounts(AccountsCommand),
}

impl Commands {
    /// Runs the command against the chain reached through `dialer`.
    pub(crate) async fn run<D: Dialer>(&self, global: &GlobalArgs, dialer: D) -> Result<()> {
        match self {
            Self::Fund(cmd) => cmd.run(global, &dialer).await,
            Self::Blast(cmd) => cmd.run(global, dialer).await,
            Self::Balances(cmd) => cmd.run(global, &dialer).await,
            Self::Blocks(cmd) => cmd.run(&dialer).await,
            Self::Accounts(cmd) => cmd.run(global),
        }
    }
}
