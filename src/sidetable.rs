//! Side-table I/O: the human-readable `(code_point, frequency)` dump that
//! lets a decoder rebuild an identical Huffman tree without ever seeing the
//! original tree's node graph. Format grounded on the reference C
//! `import_table` / table-dump loops (`U+%04X %d`).

use log::warn;

use crate::huffman::FrequencyMap;

/// Render a frequency map as side-table text, one `U+XXXX freq` line per
/// entry in ascending code-point order.
pub fn write_side_table(freqs: &FrequencyMap) -> String {
    let mut out = String::new();
    for (&code_point, &freq) in freqs.iter() {
        out.push_str(&format!("U+{:04X} {}\n", code_point, freq));
    }
    out
}

/// Parse side-table text back into a frequency map. Blank lines are
/// ignored; lines that don't match `U+<hex> <decimal>` are logged at `warn`
/// and skipped, matching the source's silently-permissive parser.
pub fn read_side_table(text: &str) -> FrequencyMap {
    let mut freqs = FrequencyMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(code_tok), Some(freq_tok), None) = (parts.next(), parts.next(), parts.next())
        else {
            warn!("skipping malformed side-table line: {line:?}");
            continue;
        };

        let Some(hex) = code_tok.strip_prefix("U+") else {
            warn!("skipping side-table line with no U+ prefix: {line:?}");
            continue;
        };

        let (Ok(code_point), Ok(freq)) = (u32::from_str_radix(hex, 16), freq_tok.parse::<u64>())
        else {
            warn!("skipping unparsable side-table line: {line:?}");
            continue;
        };

        freqs.insert(code_point, freq);
    }

    freqs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut freqs = FrequencyMap::new();
        freqs.insert(0x00E1, 1);
        freqs.insert(0x00E9, 1);
        freqs.insert(0x00ED, 1);

        let text = write_side_table(&freqs);
        assert_eq!(text, "U+00E1 1\nU+00E9 1\nU+00ED 1\n");

        let parsed = read_side_table(&text);
        assert_eq!(parsed, freqs);
    }

    #[test]
    fn blank_and_malformed_lines_are_skipped() {
        let text = "U+0041 3\n\n   \nnot a line\nU+0042 2\nU+ZZZZ 1\n";
        let parsed = read_side_table(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&0x41], 3);
        assert_eq!(parsed[&0x42], 2);
    }

    #[test]
    fn hex_formatted_with_at_least_four_digits_uppercase() {
        let mut freqs = FrequencyMap::new();
        freqs.insert(0x41, 5);
        let text = write_side_table(&freqs);
        assert_eq!(text, "U+0041 5\n");
    }
}
