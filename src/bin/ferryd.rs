use anyhow::{Context, Result};
use clap::Parser;

use ferry::cli::ServerOpts;
use ferry::logger::{Logger, StderrLogger, TextLogger};
use ferry::server;

fn main() -> Result<()> {
    let opts = ServerOpts::parse();
    let mut cfg = opts.session_config()?;

    // Validate root directory exists and is a directory
    if !cfg.root.is_dir() {
        anyhow::bail!("Error: Root directory does not exist: {}", cfg.root.display());
    }
    cfg.root = std::fs::canonicalize(&cfg.root)
        .with_context(|| format!("Failed to canonicalize root path: {}", cfg.root.display()))?;

    println!("Starting ferry daemon:");
    println!("  Root: {}", cfg.root.display());
    println!("  Bind: {}", cfg.listen_address);

    if !cfg.confine_paths {
        eprintln!("WARNING: file names are not confined to the served root");
        eprintln!("   Set confine_paths = true to reject '..' and absolute paths");
    }

    let logger: Box<dyn Logger> = match opts.log_file {
        Some(ref p) => Box::new(
            TextLogger::new(p).with_context(|| format!("open log file {}", p.display()))?,
        ),
        None => Box::new(StderrLogger::stderr()),
    };

    server::serve(&cfg, logger.as_ref())
}
