use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use oidtrace_graph::{AnalysisConfig, BuildSource, GraphSession};
use oidtrace_store::{fingerprint, BlobDirectory, StoreSnapshot};
use oidtrace_types::{render_id_path, render_oid_path};
use tracing::info;

use crate::cli::*;

const SEPARATOR_WIDTH: usize = 80;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), &cli)?;
    let mut session = open_session(&cli.store, config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Blobs(args) => cmd_blobs(&mut session, &args.blob_dir, &mut out),
        Command::Transactions(args) => {
            cmd_transactions(&mut session, args.start, args.count, &mut out)
        }
        Command::Info(args) => cmd_info(&mut session, &args.oids, &mut out),
        Command::Path(args) => cmd_path(&mut session, &args.oid, &mut out),
        Command::Backrefs(args) => cmd_backrefs(&mut session, &args.oid, &mut out),
    }?;

    info!("finished");
    Ok(())
}

/// Settings from the TOML file, if any, with command-line overrides applied.
fn load_config(path: Option<&Path>, cli: &Cli) -> anyhow::Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if cli.no_cache {
        config.use_cache = false;
    }
    Ok(config)
}

/// Replay the snapshot and build its reference maps.
fn open_session(store_path: &Path, config: AnalysisConfig) -> anyhow::Result<GraphSession> {
    let store = StoreSnapshot::load(store_path)
        .and_then(StoreSnapshot::into_store)
        .with_context(|| format!("opening store {}", store_path.display()))?;
    let mut session = GraphSession::from_store(Arc::new(store), config);
    let source = session.build().context("building reference maps")?;
    match source {
        BuildSource::Cache => info!("reference maps loaded from cache"),
        BuildSource::Scratch => info!("reference maps built from store"),
    }
    Ok(session)
}

fn percent_done(done: usize, total: usize) -> usize {
    (done * 100).div_ceil(total.max(1))
}

fn cmd_blobs(session: &mut GraphSession, dir: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let blobs = BlobDirectory::new(dir);
    let paths = blobs.blob_paths()?;
    let total = paths.len();
    writeln!(out, "{} {}", "Number of blobs:".bold(), total)?;
    writeln!(out)?;

    for (i, path) in paths.iter().enumerate() {
        let num = i + 1;
        info!("Processing blob {} of {} ({}%)...", num, total, percent_done(num, total));
        writeln!(out, "Blob path: {}", path.display())?;
        writeln!(out, "Blob hash: {}", fingerprint(path)?)?;
        let oid = blobs.oid_for_path(path)?;
        writeln!(out, "{}", session.get_oid_info(oid)?)?;
        writeln!(out)?;
    }
    Ok(())
}

fn cmd_transactions(
    session: &mut GraphSession,
    start: usize,
    count: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for (index, transaction) in session.recent_transactions(start, count)? {
        writeln!(out, "{}", format!("Transaction {index}").bold())?;
        writeln!(out, "Number of modified objects: {}", transaction.oids.len())?;
        for oid in transaction.oids {
            writeln!(out)?;
            writeln!(out, "{}", session.get_oid_info(oid)?)?;
        }
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    }
    Ok(())
}

fn cmd_info(session: &mut GraphSession, oids: &[String], out: &mut impl Write) -> anyhow::Result<()> {
    for (i, oid) in oids.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", session.get_oid_info(oid)?)?;
    }
    Ok(())
}

fn cmd_path(session: &mut GraphSession, oid: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let oid_path = session.get_oid_path(oid)?;
    let id_path = session.get_id_path(oid)?;
    writeln!(out, "{} {}", "oid_path:".cyan(), render_oid_path(&oid_path))?;
    writeln!(out, "{} {}", "id_path:".cyan(), render_id_path(&id_path))?;
    Ok(())
}

fn cmd_backrefs(session: &mut GraphSession, oid: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let mut found = session.get_identified_back_references(oid)?;
    found.sort_by_key(|b| (b.score, b.oid));
    if found.is_empty() {
        writeln!(out, "No back-references.")?;
    }
    for backref in found {
        writeln!(
            out,
            "{:>3}  {}  {}",
            backref.score,
            backref.oid.repr().yellow(),
            backref.label.as_deref().unwrap_or("None")
        )?;
    }
    Ok(())
}
