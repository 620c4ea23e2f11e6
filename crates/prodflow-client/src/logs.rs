//! Log tail extraction.
//!
//! Log files arrive from the server as opaque bytes. Viewing "the last entries" keeps only
//! the trailing `max_bytes` of the file and, of the text decoded from those bytes, the last
//! `max_lines` lines.

use std::borrow::Cow;

/// Lines kept when viewing the last entries of a log.
pub const LAST_LINES: usize = 20;
/// Bytes read from the end of a log before splitting it into lines.
pub const LAST_BYTES: usize = 512 * 1024;

/// How much of a log file to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogView {
    /// The whole decoded file.
    #[default]
    Full,
    /// The last [`LAST_LINES`] lines of the last [`LAST_BYTES`] bytes.
    Last,
}

impl LogView {
    pub fn render(self, bytes: &[u8]) -> String {
        match self {
            Self::Full => decode(bytes).into_owned(),
            Self::Last => last_entries(bytes),
        }
    }
}

/// Tail of `bytes` using the default [`LAST_BYTES`] and [`LAST_LINES`] limits.
pub fn last_entries(bytes: &[u8]) -> String {
    tail(bytes, LAST_BYTES, LAST_LINES)
}

/// Keeps the last `max_bytes` of `bytes`, decodes them, and returns the last `max_lines`
/// lines joined with `'\n'`.
///
/// When the decoded text has no more than `max_lines` lines it is returned unchanged.
/// Lines are split on `'\n'` only, so a trailing newline contributes an empty final line.
/// A byte cut that lands inside a multi-byte character decodes to U+FFFD.
pub fn tail(bytes: &[u8], max_bytes: usize, max_lines: usize) -> String {
    let start = bytes.len().saturating_sub(max_bytes);
    let text = decode(&bytes[start..]);

    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > max_lines {
        lines[lines.len() - max_lines..].join("\n")
    } else {
        text.into_owned()
    }
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
