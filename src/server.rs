//! Server side: one session per accepted connection.
//!
//! [`handle_connection`] owns the whole protocol conversation and works on
//! any byte stream. [`serve_on`] is the accept loop around it; by default it
//! serves a single client and returns.

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use crate::command::{Request, Verb};
use crate::config::SessionConfig;
use crate::frame::receive_request;
use crate::logger::Logger;
use crate::transfer::{serve_download, serve_list, serve_upload, TransferError};
use crate::wire::WireError;

/// How a session ended without a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent EXIT.
    Exit,
    /// Client closed the connection between commands.
    Disconnected,
}

/// Run the command loop until EXIT, disconnect, or a fatal error.
pub fn handle_connection<S: Read + Write + ?Sized>(
    stream: &mut S,
    cfg: &SessionConfig,
    logger: &dyn Logger,
) -> Result<SessionEnd, TransferError> {
    loop {
        let request = match receive_request(stream, cfg.frame_size) {
            Ok(r) => r,
            Err(WireError::Closed) => return Ok(SessionEnd::Disconnected),
            Err(e) => return Err(e.into()),
        };
        let cmd = match request {
            Request::Command(cmd) => cmd,
            Request::Empty => continue,
            Request::Unknown(line) => {
                logger.unknown_command(&line);
                continue;
            }
        };
        let result = match cmd.verb {
            Verb::List => serve_list(stream, cfg, logger),
            Verb::Upload => serve_upload(stream, &cmd.argument, cfg, logger),
            Verb::Download => serve_download(stream, &cmd.argument, cfg, logger),
            Verb::Exit => return Ok(SessionEnd::Exit),
        };
        if let Err(e) = result {
            if e.is_connection_fatal() {
                return Err(e);
            }
            logger.error(cmd.verb.as_str(), &cmd.argument, &e.to_string());
        }
    }
}

// Socket tuning: disable Nagle so small frames go out immediately
pub(crate) fn tune_socket(stream: &TcpStream) {
    let _ = stream.set_nodelay(true);
}

/// Bind `cfg.listen_address` and serve.
pub fn serve(cfg: &SessionConfig, logger: &dyn Logger) -> Result<()> {
    let listener = TcpListener::bind(&cfg.listen_address)
        .with_context(|| format!("bind {}", cfg.listen_address))?;
    serve_on(listener, cfg, logger)
}

/// Accept on an already-bound listener. Serves one client, or clients one
/// after another with `keep_listening`.
pub fn serve_on(listener: TcpListener, cfg: &SessionConfig, logger: &dyn Logger) -> Result<()> {
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| cfg.listen_address.clone());
    logger.listening(&addr, &cfg.root);

    for conn in listener.incoming() {
        match conn {
            Ok(stream) => handle_client(stream, cfg, logger),
            Err(e) if cfg.keep_listening => {
                logger.error("accept", &addr, &e.to_string());
                continue;
            }
            Err(e) => return Err(e).context("accept"),
        }
        if !cfg.keep_listening {
            break;
        }
    }
    Ok(())
}

fn handle_client(mut stream: TcpStream, cfg: &SessionConfig, logger: &dyn Logger) {
    tune_socket(&stream);
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    logger.connected(&peer);
    match handle_connection(&mut stream, cfg, logger) {
        Ok(_) => logger.disconnected(&peer),
        Err(e) => logger.error("session", &peer, &e.to_string()),
    }
}
