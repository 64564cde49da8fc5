//! Fixed-size command frames and status markers.
//!
//! A frame is `frame_size` bytes: the line, a terminating zero, then zero
//! padding. Lines that do not fit are cut at `frame_size - 1` bytes so the
//! terminator always survives. Receivers read exactly one frame and take
//! everything before the first zero byte.

use std::io::{Read, Write};

use crate::command::{Command, Request};
use crate::protocol::status;
use crate::wire::{self, WireError};

pub fn encode_frame(line: &str, frame_size: usize) -> Vec<u8> {
    let mut frame = vec![0u8; frame_size];
    let bytes = line.as_bytes();
    let n = bytes.len().min(frame_size.saturating_sub(1));
    frame[..n].copy_from_slice(&bytes[..n]);
    frame
}

pub fn decode_frame(frame: &[u8]) -> String {
    let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
    String::from_utf8_lossy(&frame[..end]).into_owned()
}

pub fn send_line<W: Write + ?Sized>(
    stream: &mut W,
    line: &str,
    frame_size: usize,
) -> Result<(), WireError> {
    wire::write_all(stream, &encode_frame(line, frame_size))
}

pub fn receive_line<R: Read + ?Sized>(
    stream: &mut R,
    frame_size: usize,
) -> Result<String, WireError> {
    let mut frame = vec![0u8; frame_size];
    wire::read_exact(stream, &mut frame)?;
    Ok(decode_frame(&frame))
}

pub fn send_command<W: Write + ?Sized>(
    stream: &mut W,
    command: &Command,
    frame_size: usize,
) -> Result<(), WireError> {
    send_line(stream, &command.line(), frame_size)
}

pub fn receive_request<R: Read + ?Sized>(
    stream: &mut R,
    frame_size: usize,
) -> Result<Request, WireError> {
    Ok(Request::from_line(&receive_line(stream, frame_size)?))
}

/// Server verdict preceding a download payload, or following an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => status::OK,
            Status::Error => status::ERROR,
        }
    }

    pub fn from_line(line: &str) -> Option<Status> {
        match line {
            status::OK => Some(Status::Ok),
            status::ERROR => Some(Status::Error),
            _ => None,
        }
    }
}

pub fn send_status<W: Write + ?Sized>(
    stream: &mut W,
    status: Status,
    frame_size: usize,
) -> Result<(), WireError> {
    send_line(stream, status.as_str(), frame_size)
}

/// Read one status frame. `Err(line)` carries anything that is neither marker.
pub fn receive_status<R: Read + ?Sized>(
    stream: &mut R,
    frame_size: usize,
) -> Result<Result<Status, String>, WireError> {
    let line = receive_line(stream, frame_size)?;
    Ok(Status::from_line(&line).ok_or(line))
}
