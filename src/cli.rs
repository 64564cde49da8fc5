//! Shared CLI helpers and small reusable Clap fragments

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::SessionConfig;

/// ferryd: serve a directory to one ferry client
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
pub struct ServerOpts {
    /// TOML config file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind address (host:port), overrides listen_address
    #[arg(long)]
    pub bind: Option<String>,

    /// Directory to serve, overrides root
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Append server events to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Serve clients one after another instead of exiting after the first
    #[arg(long)]
    pub keep_listening: bool,
}

impl ServerOpts {
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut cfg = SessionConfig::load(self.config.as_deref())?;
        if let Some(ref bind) = self.bind {
            cfg.listen_address = bind.clone();
        }
        if let Some(ref root) = self.root {
            cfg.root = root.clone();
        }
        if self.keep_listening {
            cfg.keep_listening = true;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// ferry: interactive client for a ferryd server
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
pub struct ClientOpts {
    /// TOML config file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Server address (host:port), overrides server_address
    #[arg(long)]
    pub connect: Option<String>,

    /// Local directory for uploads and downloads, overrides root
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl ClientOpts {
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut cfg = SessionConfig::load(self.config.as_deref())?;
        if let Some(ref addr) = self.connect {
            cfg.server_address = addr.clone();
        }
        if let Some(ref root) = self.root {
            cfg.root = root.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
