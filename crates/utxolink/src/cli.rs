use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use utxolink_core::snapshot::LiquidNetwork;
use utxolink_core::SearchMode;

/// utxolink: snapshot Liquid wallet outputs and find spend paths between
/// wallets through an Esplora explorer.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(flatten)]
    pub explorer: ExplorerArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct ExplorerArgs {
    /// Esplora API base URL. Defaults to Blockstream's instance for --network.
    #[arg(long, global = true, env = "UTXOLINK_ESPLORA_URL")]
    pub esplora_url: Option<String>,

    /// Liquid network the explorer serves.
    #[arg(long, global = true, default_value = "liquidv1")]
    pub network: LiquidNetwork,

    /// Minimum delay between two explorer requests, in milliseconds.
    #[arg(long, global = true, default_value = "100", env = "UTXOLINK_DELAY_MS")]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, global = true, default_value = "30")]
    pub timeout_secs: u64,
}

impl ExplorerArgs {
    pub fn base_url(&self) -> &str {
        self.esplora_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_esplora_url())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Collect the unspent outputs of a set of addresses into a snapshot file.
    Snapshot {
        /// Wallet address to include (repeatable).
        #[arg(long = "address", required = true)]
        addresses: Vec<String>,

        /// Where to write the snapshot.
        #[arg(long, default_value = "utxos.json")]
        out: PathBuf,

        /// Also record spend status for every collected output.
        #[arg(long)]
        enrich: bool,
    },

    /// Refresh the spend status of every record in a snapshot file.
    Enrich {
        snapshot: PathBuf,

        /// Write the result here instead of rewriting the input.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Walk spends from START's outputs until one of REFERENCE's outputs is
    /// reached. Runs until interrupted with Ctrl-C.
    Compare {
        /// Snapshot whose outputs are the search targets.
        reference: PathBuf,

        /// Snapshot whose outputs seed the search.
        start: PathBuf,

        #[arg(long, default_value = "descendants")]
        mode: SearchMode,

        /// Only follow spends that are confirmed.
        #[arg(long)]
        confirmed_only: bool,

        /// Seconds to wait between hops once there is nothing left to expand.
        #[arg(long, default_value = "5")]
        idle_secs: u64,
    },
}
