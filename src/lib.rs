//! Batch Huffman compressor/decompressor for UTF-8 text files.
//!
//! See `SPEC_FULL.md` at the repository root for the full component
//! breakdown; this crate is organized as one module per component named
//! there: [`utf8`] (byte<->code point), [`heap`] (priority queue),
//! [`huffman`] (tree + code table), [`bitcodec`] (payload wire format),
//! [`sidetable`] (frequency dump format), [`archive`] (bundle container),
//! and [`driver`] (parallel dispatch).

pub mod archive;
pub mod bitcodec;
pub mod driver;
pub mod error;
pub mod heap;
pub mod huffman;
pub mod sidetable;
pub mod utf8;

pub use error::{Error, Result};
