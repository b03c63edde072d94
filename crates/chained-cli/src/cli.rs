use std::path::PathBuf;

use chained_ledger::MiningConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chained",
    about = "Append-only, proof-of-work sealed ledger of JSON snapshots",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Chain file (overrides `store_path` from the config file)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the chain file with a sealed genesis block
    Init(InitArgs),
    /// Record a JSON snapshot as a new sealed block
    Append(AppendArgs),
    /// Check every seal and the links between blocks
    Verify(VerifyArgs),
    /// Show block history, newest first
    Log(LogArgs),
    /// Show a single block
    Show(ShowArgs),
    /// Print the materialized document
    State(StateArgs),
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct AppendArgs {
    /// JSON file holding the full snapshot
    pub snapshot: PathBuf,
    /// Leading zero bits required of the seal
    #[arg(short, long)]
    pub difficulty: Option<u32>,
    /// Mining threads
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub max_attempts: Option<u64>,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl AppendArgs {
    /// Mining settings with any command-line values taking precedence.
    pub fn mining(&self, base: &MiningConfig) -> MiningConfig {
        MiningConfig {
            workers: self.workers.unwrap_or(base.workers),
            max_attempts: self.max_attempts.or(base.max_attempts),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
        }
    }
}

#[derive(Args)]
pub struct VerifyArgs {}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub index: u64,
}

#[derive(Args)]
pub struct StateArgs {
    /// Materialize the document as of this block instead of the head
    #[arg(long)]
    pub at: Option<u64>,
}
