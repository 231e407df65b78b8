//! `decode` — explodes `compressed_files.bin` in the current directory,
//! rebuilds each file's Huffman tree from its side-table, and writes the
//! decoded text under `./decoded/`. No flags.

use anyhow::Context;
use huffman_archiver::driver;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let archive_path = cwd.join("compressed_files.bin");
    let output_dir = cwd.join("decoded");

    let report =
        driver::run_decode(&archive_path, &cwd, &output_dir).context("decode run failed")?;

    log::info!(
        "{} file(s) decoded, {} failed -> {}",
        report.processed,
        report.failed,
        output_dir.display()
    );

    if report.failed > 0 {
        anyhow::bail!("{} file(s) failed to decode", report.failed);
    }

    Ok(())
}
