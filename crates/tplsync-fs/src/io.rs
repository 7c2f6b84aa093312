//! File I/O helpers: atomic writes with locking, mode-aware writes

use crate::{Error, NormalizedPath, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock on the temp file while writing.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    ensure_parent(path)?;

    // Temp file in the same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    Ok(())
}

/// Read a file's bytes, returning `None` when it does not exist.
pub fn read_optional(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent(path: &NormalizedPath) -> Result<()> {
    if let Some(parent) = path.to_native().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Write `content` to `path`, creating parent directories, and apply the
/// permission bits in `mode` (ignored on non-Unix platforms).
pub fn write_file(path: &NormalizedPath, content: &[u8], mode: u32) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(path)?;
    fs::write(&native_path, content).map_err(|e| Error::io(&native_path, e))?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &NormalizedPath, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let native_path = path.to_native();
    fs::set_permissions(&native_path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io(&native_path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &NormalizedPath, _mode: u32) -> Result<()> {
    Ok(())
}
