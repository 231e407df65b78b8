//! Bit-packed payload codec: prefix-encode a code-point stream into a bit
//! sequence headed by its exact bit length, and the inverse tree walk.
//! Wire shape grounded on the reference C `encodeUnicode`/`decode` pair
//! (header written after the fact via a rewind-and-patch in the source;
//! here the header is simply computed up front since we buffer in memory).

use bitvec::prelude::*;
use log::debug;

use crate::error::{Error, Result};
use crate::huffman::{CodeTable, Tree};
use crate::utf8::{self, Decoded};

/// Encode `input`'s UTF-8 code points into a length-prefixed bit-packed
/// payload using `table`. Code points with no table entry (dropped during
/// frequency collection, or a malformed byte run) are skipped, preserving
/// the UTF-8 resync behavior end to end.
pub fn encode_payload(input: &[u8], table: &CodeTable) -> Vec<u8> {
    let mut bits: BitVec<u8, Msb0> = BitVec::new();
    let mut pos = 0;

    loop {
        match utf8::decode_next(input, &mut pos) {
            Decoded::CodePoint { value, .. } => {
                if let Some(code) = table.get(&value) {
                    bits.extend_from_bitslice(code);
                }
            }
            Decoded::Invalid => {
                debug!("dropped malformed UTF-8 byte run while encoding payload");
            }
            Decoded::End => break,
        }
    }

    let total_bits = bits.len() as u32;
    let mut out = Vec::with_capacity(4 + bits.as_raw_slice().len());
    out.extend_from_slice(&total_bits.to_le_bytes());
    out.extend_from_slice(bits.as_raw_slice());
    out
}

/// Decode a length-prefixed bit-packed payload back into UTF-8 bytes by
/// walking `tree` bit by bit. `tree` is `None` for the zero-code-point edge
/// case (an originally empty input), in which case the payload is empty.
/// A `None` tree paired with a nonzero `total_bits` means the side-table
/// was corrupt or empty while the payload it describes was not; this is
/// reported as `ArchiveTruncated` rather than treated as a bug.
pub fn decode_payload(payload: &[u8], tree: Option<&Tree>) -> Result<Vec<u8>> {
    if payload.len() < 4 {
        return Err(Error::ArchiveTruncated {
            what: "payload bit-length header",
        });
    }
    let total_bits = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;

    if total_bits == 0 {
        return Ok(Vec::new());
    }

    let tree = tree.ok_or(Error::ArchiveTruncated {
        what: "payload bit stream with no side-table",
    })?;
    let body = &payload[4..];
    let bits: &BitSlice<u8, Msb0> = BitSlice::from_slice(body);
    if total_bits > bits.len() {
        return Err(Error::ArchiveTruncated {
            what: "payload bit stream",
        });
    }

    let mut out = Vec::new();
    let mut node = tree;
    for bit in &bits[..total_bits] {
        node = match node {
            Tree::Node { left, right, .. } => {
                if *bit {
                    right.as_ref()
                } else {
                    left.as_ref()
                }
            }
            Tree::Leaf { .. } => unreachable!("cursor reset to root before reading a bit"),
        };

        if let Tree::Leaf { code_point, .. } = node {
            out.extend_from_slice(&utf8::encode(*code_point));
            node = tree;
        }
    }

    Ok(out)
}
