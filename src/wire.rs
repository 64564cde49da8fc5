//! Byte-exact stream I/O.
//!
//! Stream sockets hand back arbitrary amounts of data per call. Every
//! protocol step above this module relies on these helpers never returning
//! short: a write either sends everything or fails, a read either fills the
//! whole buffer or fails. Interrupted calls are retried transparently.

use std::io::{self, ErrorKind, Read, Write};

/// Transport failure. Always fatal for the connection it happened on.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Peer closed the stream (0-byte read).
    #[error("connection closed by peer")]
    Closed,
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

/// Send every byte of `data`, retrying on interruption.
pub fn write_all<W: Write + ?Sized>(stream: &mut W, mut data: &[u8]) -> Result<(), WireError> {
    while !data.is_empty() {
        match stream.write(data) {
            Ok(0) => {
                return Err(WireError::Io(io::Error::new(
                    ErrorKind::WriteZero,
                    "stream accepted zero bytes",
                )))
            }
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Fill `buf` completely. A 0-byte read before the buffer is full is reported
/// as [`WireError::Closed`], even if some bytes already arrived.
pub fn read_exact<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(WireError::Closed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// One receive call: whatever the transport delivers, up to `buf.len()`.
/// Only the unframed LIST response is read this way.
pub fn read_some<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> Result<usize, WireError> {
    loop {
        match stream.read(buf) {
            Ok(0) if !buf.is_empty() => return Err(WireError::Closed),
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read and throw away exactly `len` bytes, `chunk_size` at a time.
/// Keeps the stream aligned when a payload cannot be stored.
pub fn discard<R: Read + ?Sized>(
    stream: &mut R,
    len: u64,
    chunk_size: usize,
) -> Result<(), WireError> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        read_exact(stream, &mut buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}
