//! Filesystem helpers shared across the store's persistence code.

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
