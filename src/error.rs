use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("channel {channel} has {found} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("unsupported FFT overlap {0} (expected 1, 2, 4 or 8)")]
    InvalidOverlap(u32),

    #[error("unsupported log base {0} (expected 0, 2 or 10)")]
    InvalidLogBase(u32),

    #[error("cannot allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to load font from {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("failed to decode snapshot on line {line}: {source}")]
    Snapshot {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
