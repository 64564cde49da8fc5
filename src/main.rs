//! ferry - interactive client for a ferryd server
//!
//! Reads LIST / UPLOAD <file> / DOWNLOAD <file> / EXIT from stdin and runs
//! each against the server over a single connection.

use anyhow::Result;
use clap::Parser;
use std::io;

use ferry::cli::ClientOpts;
use ferry::client;

fn main() -> Result<()> {
    let opts = ClientOpts::parse();
    let cfg = opts.session_config()?;

    let mut stream = client::connect(&cfg)?;
    println!("Connected to server.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    client::run(&mut stream, stdin.lock(), &mut stdout, &cfg)?;
    Ok(())
}
