//! The `accounts` command.

use clap::Args;
use eyre::Result;
use txflood::Identity;

use crate::flags::GlobalArgs;

/// Prints the derived pool.
#[derive(Debug, Clone, Args)]
pub(crate) struct AccountsCommand {
    /// Print hex private keys alongside addresses.
    #[arg(long = "show-keys")]
    pub(crate) show_keys: bool,
}

impl AccountsCommand {
    /// Runs the command. Needs no node.
    pub(crate) fn run(&self, global: &GlobalArgs) -> Result<()> {
        for identity in global.pool()?.iter() {
            println!("{}", self.format(identity));
        }
        Ok(())
    }

    fn format(&self, identity: &Identity) -> String {
        if self.show_keys {
            format!("{:>6} {} {}", identity.index(), identity.address(), identity.private_key())
        } else {
            format!("{:>6} {}", identity.index(), identity.address())
        }
    }
}
