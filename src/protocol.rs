//! Shared protocol constants for the ferry line protocol

// Command frames and status markers are always this many bytes on the wire
pub const DEFAULT_FRAME_SIZE: usize = 1024;

// Upper bound on a single payload read/write
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub const DEFAULT_PORT: u16 = 8080;

// Smallest frame that still leaves room for LIST_RESERVE and the markers
pub const MIN_FRAME_SIZE: usize = 64;

// Frames and chunks are allocated whole; keep configured sizes sane
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

// Length prefix width (u64, big-endian)
pub const LEN_SIZE: usize = 8;

// Verbs as they appear on the wire
pub mod verb {
    pub const LIST: &str = "LIST";
    pub const UPLOAD: &str = "UPLOAD";
    pub const DOWNLOAD: &str = "DOWNLOAD";
    pub const EXIT: &str = "EXIT";
}

// Status markers, framed like commands
pub mod status {
    pub const OK: &str = "OK";
    pub const ERROR: &str = "ERROR";
}

// LIST response layout
// The response is raw bytes (not padded, not length-prefixed) and the
// client reads it with a single receive, so it must stay below frame_size.
pub mod listing {
    // Bytes kept free for the truncation notice
    pub const RESERVE: usize = 32;
    pub const TRUNCATED: &str = "... output truncated ...\n";
    pub const EMPTY: &str = "No files found\n";
    pub const UNREADABLE: &str = "Unable to open directory\n";
}
