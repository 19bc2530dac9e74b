//! Miscellaneous utilities for the enforcement agent.

use std::{fs, io, io::Write};

use camino::Utf8Path;

/// Atomically write a file: write to a temporary file in the same
/// directory, then rename it over the target.
///
/// # Panics
///
/// Panics if `path` has no containing directory.
pub fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .expect("'path' must be a file, so it must have a parent");
    fs::create_dir_all(dir)?;

    let mut tmp_file = tempfile::Builder::new().tempfile_in(dir)?;
    tmp_file.as_file_mut().write_all(contents)?;
    let _ = tmp_file.persist(path)?;

    Ok(())
}

/// Run a blocking external command with a bounded timeout, for the
/// best-effort enforcement surfaces (browser tab close, resolver cache
/// flush). Returns `Ok(())` only if the process exited successfully.
pub async fn run_best_effort(mut command: tokio::process::Command) -> io::Result<()> {
    let timeout = std::time::Duration::from_secs(2);
    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "command timed out"))??;

    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "command exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}
