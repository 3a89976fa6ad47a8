//! Reading and writing the generated dataset.
//!
//! The artifact is a single JSON array of [`GeneratedPoint`] records. It is
//! always written as a whole document: the bytes go to a temporary file next
//! to the destination which is renamed into place only after a successful
//! flush, so a failed run never leaves a truncated file behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::points::GeneratedPoint;

/// Serializes `points` to `path` as one JSON array.
///
/// # Errors
///
/// Returns an error if:
/// - The destination directory does not exist or is not writable
/// - Serialization or the final rename fails
///
/// An existing file at `path` is only replaced once the new document is
/// completely on disk. The replacement keeps the permissions of the file it
/// replaces; a new file is created world-readable (`0644` on Unix).
pub fn write_dataset(path: impl AsRef<Path>, points: &[GeneratedPoint]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, points)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    set_output_mode(&tmp, path)?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Wrote {} points to {}", points.len(), path.display());
    Ok(())
}

#[cfg(unix)]
const DEFAULT_OUTPUT_MODE: u32 = 0o644;

// Temp files are created 0600, so the mode is set before the rename.
#[cfg(unix)]
fn set_output_mode(tmp: &NamedTempFile, path: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o7777)
        .unwrap_or(DEFAULT_OUTPUT_MODE);
    tmp.as_file().set_permissions(Permissions::from_mode(mode))?;
    Ok(())
}

/// Parses a dataset previously written by [`write_dataset`].
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<GeneratedPoint>> {
    let file = File::open(path.as_ref())?;
    let points = serde_json::from_reader(BufReader::new(file))?;
    Ok(points)
}
