use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "oidtrace",
    about = "Explain how objects in a persistent object store hang off the root",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON store snapshot to analyze
    #[arg(long, global = true, default_value = "store.json")]
    pub store: PathBuf,

    /// TOML file with analysis settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for reference caches (overrides the config file)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Never read or write the reference cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan a blob directory and report each blob's fingerprint and owner
    Blobs(BlobsArgs),
    /// Show the objects modified by a window of recent transactions
    Transactions(TransactionsArgs),
    /// Show everything known about one or more objects
    Info(InfoArgs),
    /// Show the OID path and ID path of an object
    Path(PathArgs),
    /// List the scored back-references of an object
    Backrefs(BackrefsArgs),
}

#[derive(Args)]
pub struct BlobsArgs {
    #[arg(long)]
    pub blob_dir: PathBuf,
}

/// Transactions are indexed newest first: `0 1` is the most recent one,
/// `2 5` is five transactions starting at the third most recent.
#[derive(Args)]
pub struct TransactionsArgs {
    pub start: usize,
    pub count: usize,
}

#[derive(Args)]
pub struct InfoArgs {
    #[arg(required = true)]
    pub oids: Vec<String>,
}

#[derive(Args)]
pub struct PathArgs {
    pub oid: String,
}

#[derive(Args)]
pub struct BackrefsArgs {
    pub oid: String,
}
