use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, Stderr, Write};
use std::path::Path;
use std::sync::Mutex;

/// Server-side event sink. Every hook defaults to doing nothing.
pub trait Logger: Send + Sync {
    fn listening(&self, _addr: &str, _root: &Path) {}
    fn connected(&self, _peer: &str) {}
    fn disconnected(&self, _peer: &str) {}
    fn unknown_command(&self, _line: &str) {}
    fn listed(&self, _entries: usize) {}
    fn upload_done(&self, _name: &str, _bytes: u64) {}
    fn download_done(&self, _name: &str, _bytes: u64) {}
    fn not_found(&self, _name: &str) {}
    fn error(&self, _context: &str, _name: &str, _msg: &str) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

/// Timestamped `EVENT key=value` lines to any writer.
pub struct LineLogger<W: Write + Send> {
    out: Mutex<W>,
}

/// Appends to a log file.
pub type TextLogger = LineLogger<File>;

/// Writes to the process error stream.
pub type StderrLogger = LineLogger<Stderr>;

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_writer(f))
    }
}

impl StderrLogger {
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }
}

impl<W: Write + Send> LineLogger<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, s: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl<W: Write + Send> Logger for LineLogger<W> {
    fn listening(&self, addr: &str, root: &Path) {
        self.line(&format!("LISTEN addr={} root={}", addr, root.display()));
    }
    fn connected(&self, peer: &str) {
        self.line(&format!("CONNECT peer={peer}"));
    }
    fn disconnected(&self, peer: &str) {
        self.line(&format!("DISCONNECT peer={peer}"));
    }
    fn unknown_command(&self, line: &str) {
        self.line(&format!("UNKNOWN command={line}"));
    }
    fn listed(&self, entries: usize) {
        self.line(&format!("LIST entries={entries}"));
    }
    fn upload_done(&self, name: &str, bytes: u64) {
        self.line(&format!("UPLOAD name={name} bytes={bytes}"));
    }
    fn download_done(&self, name: &str, bytes: u64) {
        self.line(&format!("DOWNLOAD name={name} bytes={bytes}"));
    }
    fn not_found(&self, name: &str) {
        self.line(&format!("NOT_FOUND name={name}"));
    }
    fn error(&self, context: &str, name: &str, msg: &str) {
        self.line(&format!("ERROR ctx={} name={} msg={}", context, name, msg));
    }
}
