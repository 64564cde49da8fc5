//! Upload, download and listing over an established connection.
//!
//! Payload layout is the same in both directions:
//!
//! ```text
//! UPLOAD:   client -> [frame "UPLOAD name"] [u64 len] [len bytes]
//!           server -> [status OK|ERROR]                 (only with upload_ack)
//! DOWNLOAD: client -> [frame "DOWNLOAD name"]
//!           server -> [status ERROR]
//!                   | [status OK] [u64 len] [len bytes]
//! LIST:     client -> [frame "LIST"]
//!           server -> raw text, below frame_size, read with one receive
//! ```
//!
//! Once a length has been announced the receiver always consumes exactly
//! that many bytes, discarding them when they cannot be stored, so a local
//! filesystem failure never desynchronizes the stream.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::{recv_u64, send_u64};
use crate::command::{Command, Verb};
use crate::config::SessionConfig;
use crate::frame::{receive_status, send_command, send_status, Status};
use crate::listing::list_directory;
use crate::logger::Logger;
use crate::paths;
use crate::wire::{self, WireError};

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Wire(#[from] WireError),
    /// Neither OK nor ERROR where a status marker was expected.
    #[error("invalid status from server: {0:?}")]
    InvalidStatus(String),
    /// Peer closed before the download status marker arrived.
    #[error("missing status from server")]
    MissingStatus,
    /// Peer closed between the OK marker and the length prefix.
    #[error("missing file size")]
    MissingSize,
    #[error("{}: {}", path.display(), source)]
    LocalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file being sent failed after its length was announced.
    #[error("source {} failed mid-payload: {}", path.display(), source)]
    PayloadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Whether the connection can carry further commands after this error.
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(self, TransferError::LocalFile { .. })
    }

    fn local(path: &Path, source: io::Error) -> Self {
        TransferError::LocalFile {
            path: path.to_path_buf(),
            source,
        }
    }

    // Peer close at a known step becomes `missing`; other wire errors pass through
    fn closed_as(missing: TransferError) -> impl FnOnce(WireError) -> TransferError {
        move |e| match e {
            WireError::Closed => missing,
            e => TransferError::Wire(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Source missing or unreadable. Nothing was sent.
    MissingLocal,
    /// Payload sent (and acknowledged, with upload_ack).
    Completed { bytes: u64 },
    /// Payload sent but the server could not store it.
    Rejected { bytes: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { bytes: u64 },
    /// Server answered ERROR. No local file was created.
    NotFound,
}

/// Stream exactly `size` bytes of `source`, `chunk_size` at a time.
fn send_payload<W: Write + ?Sized>(
    stream: &mut W,
    source: &mut File,
    source_path: &Path,
    size: u64,
    chunk_size: usize,
) -> Result<(), TransferError> {
    let mut buf = vec![0u8; chunk_size];
    let mut remaining = size;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = match source.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(TransferError::PayloadSource {
                    path: source_path.to_path_buf(),
                    source: io::Error::new(ErrorKind::UnexpectedEof, "file shrank during transfer"),
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(TransferError::PayloadSource {
                    path: source_path.to_path_buf(),
                    source: e,
                })
            }
        };
        wire::write_all(stream, &buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

/// Read exactly `size` bytes into `sink`. After the first write failure the
/// rest of the payload is still read and discarded; that failure is returned
/// as `Ok(Some(_))`.
fn receive_payload<R: Read + ?Sized>(
    stream: &mut R,
    sink: &mut File,
    size: u64,
    chunk_size: usize,
) -> Result<Option<io::Error>, WireError> {
    let mut buf = vec![0u8; chunk_size];
    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        wire::read_exact(stream, &mut buf[..n])?;
        remaining -= n as u64;
        if let Err(e) = sink.write_all(&buf[..n]) {
            wire::discard(stream, remaining, chunk_size)?;
            return Ok(Some(e));
        }
    }
    Ok(None)
}

// --- Client side ---

/// Push `local` to the server as `name`.
pub fn upload<S: Read + Write + ?Sized>(
    stream: &mut S,
    local: &Path,
    name: &str,
    cfg: &SessionConfig,
) -> Result<UploadOutcome, TransferError> {
    // Checked before anything is framed: a missing source costs no round-trip
    let mut file = match File::open(local) {
        Ok(f) => f,
        Err(_) => return Ok(UploadOutcome::MissingLocal),
    };
    let meta = file.metadata().map_err(|e| TransferError::local(local, e))?;
    if !meta.is_file() {
        return Ok(UploadOutcome::MissingLocal);
    }
    let size = meta.len();

    send_command(stream, &Command::new(Verb::Upload, name), cfg.frame_size)?;
    send_u64(stream, size)?;
    send_payload(stream, &mut file, local, size, cfg.chunk_size)?;

    if !cfg.upload_ack {
        return Ok(UploadOutcome::Completed { bytes: size });
    }
    match receive_status(stream, cfg.frame_size)? {
        Ok(Status::Ok) => Ok(UploadOutcome::Completed { bytes: size }),
        Ok(Status::Error) => Ok(UploadOutcome::Rejected { bytes: size }),
        Err(line) => Err(TransferError::InvalidStatus(line)),
    }
}

/// Pull `name` from the server into `local`. On any failure after the
/// status marker the partial local file is removed.
pub fn download<S: Read + Write + ?Sized>(
    stream: &mut S,
    local: &Path,
    name: &str,
    cfg: &SessionConfig,
) -> Result<DownloadOutcome, TransferError> {
    send_command(stream, &Command::new(Verb::Download, name), cfg.frame_size)?;
    let status = receive_status(stream, cfg.frame_size)
        .map_err(TransferError::closed_as(TransferError::MissingStatus))?;
    match status {
        Ok(Status::Ok) => {}
        Ok(Status::Error) => return Ok(DownloadOutcome::NotFound),
        Err(line) => return Err(TransferError::InvalidStatus(line)),
    }
    let size = recv_u64(stream).map_err(TransferError::closed_as(TransferError::MissingSize))?;

    let mut file = match File::create(local) {
        Ok(f) => f,
        Err(e) => {
            wire::discard(stream, size, cfg.chunk_size)?;
            return Err(TransferError::local(local, e));
        }
    };
    let received = receive_payload(stream, &mut file, size, cfg.chunk_size);
    drop(file);
    match received {
        Ok(None) => Ok(DownloadOutcome::Completed { bytes: size }),
        Ok(Some(e)) => {
            let _ = fs::remove_file(local);
            Err(TransferError::local(local, e))
        }
        Err(e) => {
            let _ = fs::remove_file(local);
            Err(e.into())
        }
    }
}

/// Ask for the server's file list. Returns whatever one receive delivers.
pub fn list<S: Read + Write + ?Sized>(
    stream: &mut S,
    cfg: &SessionConfig,
) -> Result<String, TransferError> {
    send_command(stream, &Command::bare(Verb::List), cfg.frame_size)?;
    let mut buf = vec![0u8; cfg.frame_size];
    let n = wire::read_some(stream, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

// --- Server side ---

/// Answer `UPLOAD name`: consume the announced payload, store what we can,
/// acknowledge when configured to.
pub fn serve_upload<S: Read + Write + ?Sized>(
    stream: &mut S,
    name: &str,
    cfg: &SessionConfig,
    logger: &dyn Logger,
) -> Result<(), TransferError> {
    let size = recv_u64(stream).map_err(|e| {
        logger.error("upload size", name, &e.to_string());
        e
    })?;

    let file = paths::resolve(&cfg.root, name, cfg.confine_paths)
        .and_then(|path| File::create(&path).map_err(anyhow::Error::from));
    let mut file = match file {
        Ok(f) => f,
        Err(e) => {
            logger.error("upload open", name, &e.to_string());
            wire::discard(stream, size, cfg.chunk_size)?;
            return ack_upload(stream, Status::Error, cfg);
        }
    };

    match receive_payload(stream, &mut file, size, cfg.chunk_size) {
        Ok(None) => {
            logger.upload_done(name, size);
            ack_upload(stream, Status::Ok, cfg)
        }
        Ok(Some(e)) => {
            // Left truncated on disk; the client learns about it through the ack
            logger.error("upload write", name, &e.to_string());
            ack_upload(stream, Status::Error, cfg)
        }
        Err(e) => {
            logger.error("upload interrupted", name, &e.to_string());
            Err(e.into())
        }
    }
}

fn ack_upload<W: Write + ?Sized>(
    stream: &mut W,
    status: Status,
    cfg: &SessionConfig,
) -> Result<(), TransferError> {
    if cfg.upload_ack {
        send_status(stream, status, cfg.frame_size)?;
    }
    Ok(())
}

/// Answer `DOWNLOAD name` with ERROR, or OK + length + payload.
pub fn serve_download<S: Read + Write + ?Sized>(
    stream: &mut S,
    name: &str,
    cfg: &SessionConfig,
    logger: &dyn Logger,
) -> Result<(), TransferError> {
    let opened = paths::resolve(&cfg.root, name, cfg.confine_paths).and_then(|path| {
        let file = File::open(&path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            anyhow::bail!("not a regular file");
        }
        Ok((path, file, meta.len()))
    });
    let (path, mut file, size) = match opened {
        Ok(found) => found,
        Err(_) => {
            logger.not_found(name);
            send_status(stream, Status::Error, cfg.frame_size)?;
            return Ok(());
        }
    };

    send_status(stream, Status::Ok, cfg.frame_size)?;
    send_u64(stream, size)?;
    if let Err(e) = send_payload(stream, &mut file, &path, size, cfg.chunk_size) {
        logger.error("download send", name, &e.to_string());
        return Err(e);
    }
    logger.download_done(name, size);
    Ok(())
}

/// Answer `LIST` with the raw listing text.
pub fn serve_list<W: Write + ?Sized>(
    stream: &mut W,
    cfg: &SessionConfig,
    logger: &dyn Logger,
) -> Result<(), TransferError> {
    let listing = list_directory(&cfg.root, cfg.frame_size);
    wire::write_all(stream, listing.text.as_bytes())?;
    logger.listed(listing.entries);
    Ok(())
}
