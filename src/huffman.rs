//! Huffman tree construction and code-table derivation over Unicode code
//! points. Shape of `Tree` is carried over from the teacher's byte-oriented
//! coder (`examples/kijudev-huffman-rust/src/huffman.rs`), generalized from
//! `u8` tokens to `u32` code points and rebuilt on top of the standalone
//! [`crate::heap`] module instead of `std::collections::BinaryHeap`.

use std::collections::{BTreeMap, HashMap};

use bitvec::prelude::*;

use crate::error::{Error, Result};
use crate::heap::MinHeap;

/// Huffman codes longer than this are rejected as `CodeOverflow`.
pub const MAX_CODE_BITS: usize = 32;

/// Code point -> occurrence count, kept in a `BTreeMap` so iteration is
/// always ascending by code point (the order the side-table format needs).
pub type FrequencyMap = BTreeMap<u32, u64>;

/// Code point -> Huffman bit-string, packed MSB-first matching the on-disk
/// bit layout so the bit codec can extend a payload accumulator directly.
pub type CodeTable = HashMap<u32, BitVec<u8, Msb0>>;

/// Huffman tree node. Left = `0`, right = `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Leaf { code_point: u32, freq: u64 },
    Node {
        left: Box<Tree>,
        right: Box<Tree>,
        freq: u64,
    },
}

impl Tree {
    pub fn freq(&self) -> u64 {
        match self {
            Tree::Leaf { freq, .. } => *freq,
            Tree::Node { freq, .. } => *freq,
        }
    }

    fn new_node(left: Tree, right: Tree) -> Self {
        let freq = left.freq() + right.freq();
        Tree::Node {
            left: Box::new(left),
            right: Box::new(right),
            freq,
        }
    }
}

/// Deterministic tie-break key, cheaper than storing insertion order on the
/// node itself: leaves rank by their code point, internal nodes rank above
/// every leaf and then by insertion order. See SPEC_FULL.md §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TieRank(u64);

const LEAF_RANK_CEILING: u64 = 0x110000;

struct HeapItem {
    freq: u64,
    rank: TieRank,
    tree: Tree,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.rank == other.rank
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.freq.cmp(&other.freq).then(self.rank.cmp(&other.rank))
    }
}

/// Build a Huffman tree from a frequency map. `None` if the map is empty
/// (the zero-code-point edge case, handled by callers before any tree work).
pub fn build_tree(freqs: &FrequencyMap) -> Option<Tree> {
    if freqs.is_empty() {
        return None;
    }

    if freqs.len() == 1 {
        let (&code_point, &freq) = freqs.iter().next().unwrap();
        // Lone distinct symbol: wrap under a synthetic internal parent so
        // the real leaf gets a non-empty one-bit code (SPEC_FULL.md §9b).
        // The right child is a zero-frequency copy of the same code point;
        // it is never reachable by any emitted bit, so its presence is
        // purely structural.
        return Some(Tree::new_node(
            Tree::Leaf { code_point, freq },
            Tree::Leaf { code_point, freq: 0 },
        ));
    }

    let mut heap: MinHeap<HeapItem> = MinHeap::new();
    let mut next_internal_rank = LEAF_RANK_CEILING;

    for (&code_point, &freq) in freqs.iter() {
        heap.insert(HeapItem {
            freq,
            rank: TieRank(code_point as u64),
            tree: Tree::Leaf { code_point, freq },
        });
    }

    while heap.len() > 1 {
        let a = heap.pop_min();
        let b = heap.pop_min();
        let combined = Tree::new_node(a.tree, b.tree);
        let freq = combined.freq();
        heap.insert(HeapItem {
            freq,
            rank: TieRank(next_internal_rank),
            tree: combined,
        });
        next_internal_rank += 1;
    }

    Some(heap.pop_min().tree)
}

/// Depth-first derivation of the code table from a built tree.
pub fn build_code_table(tree: &Tree) -> Result<CodeTable> {
    let mut table = CodeTable::new();
    let mut code: BitVec<u8, Msb0> = BitVec::new();
    walk(tree, &mut code, &mut table)?;
    Ok(table)
}

fn walk(node: &Tree, code: &mut BitVec<u8, Msb0>, table: &mut CodeTable) -> Result<()> {
    match node {
        Tree::Leaf { code_point, freq } => {
            if *freq == 0 {
                // The synthetic right-child placeholder from the
                // single-symbol case: unreachable, not assigned a code.
                return Ok(());
            }
            if code.len() > MAX_CODE_BITS {
                return Err(Error::CodeOverflow {
                    code_point: *code_point,
                    max: MAX_CODE_BITS,
                });
            }
            table.insert(*code_point, code.clone());
            Ok(())
        }
        Tree::Node { left, right, .. } => {
            code.push(false);
            walk(left, code, table)?;
            code.pop();

            code.push(true);
            walk(right, code, table)?;
            code.pop();

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs_from(pairs: &[(u32, u64)]) -> FrequencyMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn heap_law_respected_by_tree_build() {
        // a:4 b:2 c:1 -> code lengths should satisfy len(a) <= len(b) <= len(c)
        let freqs = freqs_from(&[('a' as u32, 4), ('b' as u32, 2), ('c' as u32, 1)]);
        let tree = build_tree(&freqs).unwrap();
        let table = build_code_table(&tree).unwrap();

        let len_a = table[&('a' as u32)].len();
        let len_b = table[&('b' as u32)].len();
        let len_c = table[&('c' as u32)].len();
        assert!(len_a <= len_b);
        assert!(len_b <= len_c);
    }

    #[test]
    fn uniform_frequencies_give_equal_length_codes() {
        let freqs = freqs_from(&[
            ('h' as u32, 1),
            ('o' as u32, 1),
            ('l' as u32, 1),
            ('a' as u32, 1),
        ]);
        let tree = build_tree(&freqs).unwrap();
        let table = build_code_table(&tree).unwrap();
        let lens: Vec<usize> = table.values().map(|c| c.len()).collect();
        assert!(lens.iter().all(|&l| l == lens[0]));
        assert_eq!(lens[0], 2);
    }

    #[test]
    fn prefix_free_code_table() {
        let freqs = freqs_from(&[
            ('a' as u32, 4),
            ('b' as u32, 2),
            ('c' as u32, 1),
            ('d' as u32, 1),
        ]);
        let tree = build_tree(&freqs).unwrap();
        let table = build_code_table(&tree).unwrap();

        let codes: Vec<&BitVec<u8, Msb0>> = table.values().collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let shorter = a.len().min(b.len());
                assert_ne!(&a[..shorter], &b[..shorter], "codes must be prefix-free");
            }
        }
    }

    #[test]
    fn single_distinct_symbol_gets_nonempty_code() {
        let freqs = freqs_from(&[(0x1F600, 10)]);
        let tree = build_tree(&freqs).unwrap();
        let table = build_code_table(&tree).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[&0x1F600].len(), 1);
    }

    #[test]
    fn empty_frequency_map_has_no_tree() {
        let freqs = FrequencyMap::new();
        assert!(build_tree(&freqs).is_none());
    }
}
