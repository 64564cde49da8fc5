//! Ferry library
//!
//! Minimal remote file access over TCP: a server exposes one directory, a
//! client lists it and pushes or pulls files with line commands framed into
//! fixed-size blocks.

pub mod cli;
pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod frame;
pub mod listing;
pub mod logger;
pub mod paths;
pub mod protocol;
pub mod server;
pub mod transfer;
pub mod wire;

pub use command::{Command, Verb};
pub use config::SessionConfig;
pub use frame::Status;
pub use transfer::{DownloadOutcome, TransferError, UploadOutcome};
pub use wire::WireError;
