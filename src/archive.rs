//! Archive container: concatenates every `.huffman` payload and
//! `.huffman.table` side-table in a directory into one bundle file, and the
//! inverse explode operation. Record layout grounded on the reference C
//! `compressFiles`/`decompressFiles`; the `thiserror` error shape is
//! grounded on `examples/dbalsom-fluxfox/src/containers/archive.rs`'s
//! `FileArchiveError`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while {what} the archive: {source}")]
    Io {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("archive record truncated while reading {what}")]
    Truncated { what: &'static str },
    #[error("archive record name exceeds {max} bytes")]
    NameTooLong { max: usize },
}

impl From<std::io::Error> for ArchiveError {
    fn from(source: std::io::Error) -> Self {
        ArchiveError::Io {
            what: "reading/writing",
            source,
        }
    }
}

/// A directory entry is bundled if its name ends with `.huffman` or
/// `.huffman.table` — suffix matching, a deliberate correction of the
/// source's `strstr` substring match (SPEC_FULL.md §9).
fn is_bundled_name(name: &str) -> bool {
    name.ends_with(".huffman") || name.ends_with(".huffman.table")
}

/// Pack every `.huffman` / `.huffman.table` file directly inside `dir` into
/// `archive_path`, deleting each source file once its bytes are written.
pub fn pack(dir: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_bundled_name(name) {
            entries.push(entry.path());
        }
    }

    let mut out = fs::File::create(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    out.write_all(&(entries.len() as i32).to_le_bytes())?;

    for path in &entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("bundled path always has a UTF-8 file name");
        if name.len() + 1 > MAX_NAME_LEN {
            return Err(ArchiveError::NameTooLong { max: MAX_NAME_LEN });
        }

        let content = fs::read(path)?;

        out.write_all(name.as_bytes())?;
        out.write_all(&[0u8])?;
        out.write_all(&(content.len() as i64).to_le_bytes())?;
        out.write_all(&content)?;

        fs::remove_file(path)?;
    }

    info!("packed {} files into {}", entries.len(), archive_path.display());
    Ok(entries.len())
}

/// Explode `archive_path` into per-file records written inside `dir`,
/// deleting the archive once every record has been extracted.
pub fn unpack(archive_path: &Path, dir: &Path) -> Result<usize, ArchiveError> {
    let mut data = Vec::new();
    fs::File::open(archive_path)
        .map_err(|source| ArchiveError::Open {
            path: archive_path.to_path_buf(),
            source,
        })?
        .read_to_end(&mut data)?;

    let mut cursor = 0usize;
    let file_count = read_i32(&data, &mut cursor, "file count")? as usize;

    for _ in 0..file_count {
        let name = read_nul_terminated_name(&data, &mut cursor)?;
        let size = read_i64(&data, &mut cursor, "record size")? as usize;

        if cursor + size > data.len() {
            return Err(ArchiveError::Truncated { what: "record body" });
        }
        let content = &data[cursor..cursor + size];
        cursor += size;

        fs::write(dir.join(&name), content)?;
    }

    fs::remove_file(archive_path)?;
    info!("unpacked {} files from {}", file_count, archive_path.display());
    Ok(file_count)
}

fn read_i32(data: &[u8], cursor: &mut usize, what: &'static str) -> Result<i32, ArchiveError> {
    if *cursor + 4 > data.len() {
        return Err(ArchiveError::Truncated { what });
    }
    let bytes = [data[*cursor], data[*cursor + 1], data[*cursor + 2], data[*cursor + 3]];
    *cursor += 4;
    Ok(i32::from_le_bytes(bytes))
}

fn read_i64(data: &[u8], cursor: &mut usize, what: &'static str) -> Result<i64, ArchiveError> {
    if *cursor + 8 > data.len() {
        return Err(ArchiveError::Truncated { what });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[*cursor..*cursor + 8]);
    *cursor += 8;
    Ok(i64::from_le_bytes(bytes))
}

fn read_nul_terminated_name(data: &[u8], cursor: &mut usize) -> Result<String, ArchiveError> {
    let start = *cursor;
    let mut end = start;
    while end < data.len() && data[end] != 0 {
        end += 1;
        if end - start >= MAX_NAME_LEN {
            return Err(ArchiveError::NameTooLong { max: MAX_NAME_LEN });
        }
    }
    if end >= data.len() {
        return Err(ArchiveError::Truncated { what: "file name" });
    }
    let name = String::from_utf8_lossy(&data[start..end]).into_owned();
    *cursor = end + 1;
    Ok(name)
}
