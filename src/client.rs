//! Client side: interactive command loop over one connection.

use anyhow::{Context, Result};
use std::io::{BufRead, Read, Write};
use std::net::TcpStream;

use crate::command::{parse_input, Command, Input, Verb};
use crate::config::SessionConfig;
use crate::frame::send_command;
use crate::server::tune_socket;
use crate::transfer::{self, DownloadOutcome, TransferError, UploadOutcome};
use crate::wire::WireError;

/// Why the command loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    /// User typed EXIT; the EXIT frame was sent.
    Exit,
    /// User input reached end-of-file. Nothing was sent.
    InputClosed,
    /// A transport or protocol failure made the connection unusable.
    ConnectionLost,
}

pub fn connect(cfg: &SessionConfig) -> Result<TcpStream> {
    let stream = TcpStream::connect(&cfg.server_address)
        .with_context(|| format!("connect {}", cfg.server_address))?;
    tune_socket(&stream);
    Ok(stream)
}

/// Read commands from `input` until EXIT, end of input, or a lost connection.
/// Every status line goes to `out`.
pub fn run<S, I, O>(stream: &mut S, mut input: I, out: &mut O, cfg: &SessionConfig) -> Result<LoopEnd>
where
    S: Read + Write + ?Sized,
    I: BufRead,
    O: Write + ?Sized,
{
    let mut raw = Vec::new();
    loop {
        write!(out, "\nEnter command: ")?;
        out.flush()?;
        raw.clear();
        if input.read_until(b'\n', &mut raw).context("read command input")? == 0 {
            writeln!(out, "\nInput closed. Exiting.")?;
            return Ok(LoopEnd::InputClosed);
        }
        // Typed bytes need not be UTF-8; odd bytes become U+FFFD in the name
        let line = String::from_utf8_lossy(&raw);

        let cmd = match parse_input(&line) {
            Input::Blank => continue,
            Input::Command(cmd) => cmd,
            Input::MissingArgument(verb) => {
                writeln!(out, "Usage: {} <filename>", verb)?;
                continue;
            }
            Input::Invalid(_) => {
                writeln!(out, "Invalid command")?;
                continue;
            }
        };

        let keep_going = match cmd.verb {
            Verb::List => run_list(stream, out, cfg)?,
            Verb::Upload => run_upload(stream, out, &cmd, cfg)?,
            Verb::Download => run_download(stream, out, &cmd, cfg)?,
            Verb::Exit => {
                let _ = send_command(stream, &cmd, cfg.frame_size);
                writeln!(out, "Connection closed.")?;
                return Ok(LoopEnd::Exit);
            }
        };
        if !keep_going {
            return Ok(LoopEnd::ConnectionLost);
        }
    }
}

fn run_list<S, O>(stream: &mut S, out: &mut O, cfg: &SessionConfig) -> Result<bool>
where
    S: Read + Write + ?Sized,
    O: Write + ?Sized,
{
    match transfer::list(stream, cfg) {
        Ok(text) => {
            out.write_all(text.as_bytes())?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Failed to receive LIST response: {}", e)?;
            Ok(false)
        }
    }
}

fn run_upload<S, O>(stream: &mut S, out: &mut O, cmd: &Command, cfg: &SessionConfig) -> Result<bool>
where
    S: Read + Write + ?Sized,
    O: Write + ?Sized,
{
    let local = cfg.root.join(&cmd.argument);
    match transfer::upload(stream, &local, &cmd.argument, cfg) {
        Ok(UploadOutcome::MissingLocal) => writeln!(out, "File not found on client side")?,
        Ok(UploadOutcome::Completed { .. }) => writeln!(out, "Upload completed")?,
        Ok(UploadOutcome::Rejected { .. }) => {
            writeln!(out, "Upload failed: server could not store file")?
        }
        Err(e) => {
            writeln!(out, "Upload failed: {}", e)?;
            return Ok(!e.is_connection_fatal());
        }
    }
    Ok(true)
}

fn run_download<S, O>(
    stream: &mut S,
    out: &mut O,
    cmd: &Command,
    cfg: &SessionConfig,
) -> Result<bool>
where
    S: Read + Write + ?Sized,
    O: Write + ?Sized,
{
    let local = cfg.root.join(&cmd.argument);
    match transfer::download(stream, &local, &cmd.argument, cfg) {
        Ok(DownloadOutcome::Completed { .. }) => writeln!(out, "Download completed")?,
        Ok(DownloadOutcome::NotFound) => writeln!(out, "File not found on server side")?,
        Err(e) => {
            match &e {
                TransferError::Wire(WireError::Closed) => {
                    writeln!(out, "Download failed: connection interrupted")?
                }
                TransferError::InvalidStatus(_) => {
                    writeln!(out, "Download failed: invalid status from server")?
                }
                _ => writeln!(out, "Download failed: {}", e)?,
            }
            return Ok(!e.is_connection_fatal());
        }
    }
    Ok(true)
}
