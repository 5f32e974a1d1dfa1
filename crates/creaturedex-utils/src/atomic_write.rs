//! Atomic file writes for uploaded images
//!
//! Bytes are written to a temporary file in the target directory, fsynced, and
//! renamed over the destination, so readers never observe a partial image.
//! When the rename crosses filesystems the write falls back to
//! copy→fsync→replace.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of bytes written
    pub bytes_written: usize,
    /// Whether cross-filesystem fallback was used
    pub used_cross_filesystem_fallback: bool,
    /// Any warnings generated during the operation
    pub warnings: Vec<String>,
}

/// Atomically write raw bytes to `path`, creating parent directories.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult {
        bytes_written: content.len(),
        ..AtomicWriteResult::default()
    };

    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {parent}"))?;
    }

    let temp_dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {temp_dir}"))?;

    temp_file
        .write_all(content)
        .with_context(|| "Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();

    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(persist_error) => {
            let err = anyhow::anyhow!(persist_error.error);
            if is_cross_filesystem_error(&err) {
                result.used_cross_filesystem_fallback = true;
                result
                    .warnings
                    .push("Used cross-filesystem fallback (copy→fsync→replace)".to_string());
                cross_filesystem_copy_from_path(&temp_path, path)?;
            } else {
                return Err(err).with_context(|| format!("Failed to atomically write file: {path}"));
            }
        }
    }

    Ok(result)
}

/// Check if an error indicates a cross-filesystem operation
#[cfg(unix)]
fn is_cross_filesystem_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .and_then(std::io::Error::raw_os_error)
        .is_some_and(|code| code == 18) // EXDEV on Linux/macOS
}

#[cfg(not(unix))]
fn is_cross_filesystem_error(_err: &anyhow::Error) -> bool {
    false
}

fn cross_filesystem_copy_from_path(temp_path: &Path, target: &Utf8Path) -> Result<()> {
    let content = fs::read(temp_path)
        .with_context(|| "Failed to read temporary file for cross-filesystem copy")?;

    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut target_temp = NamedTempFile::new_in(target_dir)
        .with_context(|| format!("Failed to create temp file in target directory: {target_dir}"))?;

    target_temp
        .write_all(&content)
        .with_context(|| "Failed to write content during cross-filesystem copy")?;
    target_temp
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync during cross-filesystem copy")?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| "Failed to persist during cross-filesystem copy")?;

    let _ = fs::remove_file(temp_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_bytes_atomic_basic() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("panda.png");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        let content = [0x89_u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let result = write_bytes_atomic(file_path, &content).unwrap();

        assert_eq!(result.bytes_written, content.len());
        assert!(!result.used_cross_filesystem_fallback);
        assert!(result.warnings.is_empty());
        assert_eq!(fs::read(file_path.as_std_path()).unwrap(), content);
    }

    #[test]
    fn test_write_bytes_atomic_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("uploads").join("nested").join("a.jpg");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_bytes_atomic(file_path, b"jpeg").unwrap();

        assert!(file_path.exists());
    }

    #[test]
    fn test_write_bytes_atomic_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("a.webp");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_bytes_atomic(file_path, b"first").unwrap();
        write_bytes_atomic(file_path, b"second").unwrap();

        assert_eq!(fs::read(file_path.as_std_path()).unwrap(), b"second");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("only.png");
        let file_path = Utf8Path::from_path(path_buf.as_path()).unwrap();

        write_bytes_atomic(file_path, b"bytes").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
