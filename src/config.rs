//! Session configuration shared by client and server.
//!
//! File format is TOML; every key is optional and falls back to the
//! defaults below. Command-line overrides are applied on top by the binaries.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::protocol::{
    DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_SIZE, DEFAULT_PORT, MAX_BUFFER_SIZE, MIN_FRAME_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Size of every command frame and status marker.
    pub frame_size: usize,
    /// Largest single payload read or write.
    pub chunk_size: usize,
    /// Server bind address.
    pub listen_address: String,
    /// Address the client connects to.
    pub server_address: String,
    /// Directory file names are resolved against (served directory on the
    /// server, local directory on the client).
    pub root: PathBuf,
    /// Server answers every upload with an OK/ERROR status marker.
    /// Both ends must agree.
    pub upload_ack: bool,
    /// Keep accepting clients one after another instead of exiting after the first.
    pub keep_listening: bool,
    /// Reject names that would escape `root`.
    pub confine_paths: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            listen_address: format!("0.0.0.0:{}", DEFAULT_PORT),
            server_address: format!("127.0.0.1:{}", DEFAULT_PORT),
            root: PathBuf::from("."),
            upload_ack: true,
            keep_listening: false,
            confine_paths: false,
        }
    }
}

impl SessionConfig {
    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: SessionConfig = toml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_size < MIN_FRAME_SIZE {
            bail!(
                "frame_size must be at least {} bytes (got {})",
                MIN_FRAME_SIZE,
                self.frame_size
            );
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1 byte");
        }
        if self.frame_size > MAX_BUFFER_SIZE || self.chunk_size > MAX_BUFFER_SIZE {
            bail!(
                "frame_size and chunk_size must not exceed {} bytes (got {} and {})",
                MAX_BUFFER_SIZE,
                self.frame_size,
                self.chunk_size
            );
        }
        Ok(())
    }
}
