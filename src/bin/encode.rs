//! `encode` — reads every `*.txt` file in the current directory, Huffman-
//! codes each one in parallel, and bundles the results into
//! `compressed_files.bin`. No flags.

use anyhow::Context;
use huffman_archiver::driver;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let archive_path = cwd.join("compressed_files.bin");

    let report = driver::run_encode(&cwd, &archive_path).context("encode run failed")?;

    log::info!(
        "{} file(s) encoded, {} skipped, {} failed -> {}",
        report.processed,
        report.skipped,
        report.failed,
        archive_path.display()
    );

    if report.failed > 0 {
        anyhow::bail!("{} file(s) failed to encode", report.failed);
    }

    Ok(())
}
