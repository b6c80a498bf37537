//! CLI arguments, environment fallbacks, and display constants.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tips shown by the `tips` listing, matching the tip page's recent cut.
pub const RECENT_TIPS_SHOWN: usize = 10;

/// Local tip jar for the Stacks blockchain.
///
/// Claim a username for a wallet address, record tips against it, and
/// rank recipients on a leaderboard. State lives in a SQLite database
/// under the data directory; the on-chain settlement path is stubbed.
///
/// Configuration comes from CLI arguments or environment variables; CLI
/// arguments take precedence.
#[derive(Parser, Debug)]
#[command(name = "tipjar", version, about)]
pub struct Cli {
    /// Data directory for the database and session [env: TIPJAR_HOME] [default: ~/.tipjar]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect a wallet address on this device
    Connect { address: String },
    /// Forget the connected wallet address
    Disconnect,
    /// Show the connected address and its claimed username
    Whoami,
    /// Claim a username for the connected address
    Claim { username: String },
    /// Send a (demo) tip to a username
    Tip {
        username: String,
        /// Amount in STX, e.g. 2.5
        amount: String,
        /// Message shown with the tip, up to 280 characters
        #[arg(long, short = 'm', default_value = "")]
        message: String,
    },
    /// List recent tips received by a username
    Tips { username: String },
    /// Show totals for a username
    Stats { username: String },
    /// Show the ranked leaderboard and global totals
    Leaderboard,
}

pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_cli_and_env(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| std::env::var("TIPJAR_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".tipjar"))
                    .unwrap_or_else(|_| PathBuf::from(".tipjar"))
            });
        Self { data_dir }
    }
}
