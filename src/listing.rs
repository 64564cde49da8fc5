//! Directory listing for the LIST response.

use std::fs;
use std::path::Path;

use crate::protocol::listing::{EMPTY, RESERVE, TRUNCATED, UNREADABLE};

/// Rendered LIST response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub text: String,
    /// Names included in `text`.
    pub entries: usize,
}

/// One `name\n` line per visible entry of `dir`, sorted by name.
/// Names starting with `.` are skipped. The text stays below
/// `frame_size - RESERVE` bytes plus the truncation notice, so it always
/// fits in a single `frame_size` receive.
pub fn list_directory(dir: &Path, frame_size: usize) -> Listing {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => {
            return Listing {
                text: UNREADABLE.to_string(),
                entries: 0,
            }
        }
    };

    let mut names: Vec<String> = rd
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();

    let cap = frame_size.saturating_sub(RESERVE);
    let mut text = String::new();
    let mut entries = 0;
    for name in names {
        if text.len() + name.len() + 1 >= cap {
            text.push_str(TRUNCATED);
            break;
        }
        text.push_str(&name);
        text.push('\n');
        entries += 1;
    }

    if text.is_empty() {
        text.push_str(EMPTY);
    }
    Listing { text, entries }
}
