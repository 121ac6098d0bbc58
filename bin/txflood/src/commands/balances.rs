//! The `balances` command.

use clap::Args;
use eyre::{Result, WrapErr};
use txflood::{
    Dialer,
    inspect::{self, AccountBalance},
};

use crate::flags::GlobalArgs;

/// Prints the balance of every pool account.
#[derive(Debug, Clone, Args)]
pub(crate) struct BalancesCommand {
    /// Also print the faucet balance.
    #[arg(long)]
    pub(crate) faucet: bool,
}

impl BalancesCommand {
    /// Runs the command.
    pub(crate) async fn run<D: Dialer>(&self, global: &GlobalArgs, dialer: &D) -> Result<()> {
        let client = dialer.dial().wrap_err("failed to connect to node")?;
        let mut identities = global.pool()?.into_identities();
        if self.faucet {
            identities.insert(0, global.faucet()?);
        }

        for balance in inspect::balances(&client, &identities).await {
            println!("{}", format_balance(&balance));
        }
        Ok(())
    }
}

fn format_balance(balance: &AccountBalance) -> String {
    match balance.balance {
        Some(wei) => format!("{:>6} {} {wei}", balance.index, balance.address),
        None => format!("{:>6} {} unavailable", balance.index, balance.address),
    }
}
