use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type. Variants name the stage that failed, mirroring the
/// taxonomy a single worker can hit; they never carry cross-worker state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open input file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open output file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("huffman code for code point U+{code_point:04X} would exceed {max} bits")]
    CodeOverflow { code_point: u32, max: usize },

    #[error("archive record truncated while reading {what}")]
    ArchiveTruncated { what: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
