use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{AppError, Result};

/// Prefix prepended to a name until it no longer collides in the destination.
pub const CONFLICT_PREFIX: &str = "copy_";

/// `EXDEV`: rename across filesystems.
#[cfg(unix)]
const CROSS_DEVICE_ERRNO: i32 = 18;

/// Check a user-supplied entry name before any filesystem call.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::EmptyInput);
    }
    if name == "." || name == ".." || name.contains('/') || name.contains(std::path::MAIN_SEPARATOR)
    {
        return Err(AppError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Derive a name that does not exist in `dir` by repeatedly prepending
/// [`CONFLICT_PREFIX`].
pub fn unique_name(name: &str, dir: &Path) -> Result<String> {
    let existing: HashSet<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();

    let mut candidate = name.to_string();
    while existing.contains(&candidate) {
        candidate = format!("{}{}", CONFLICT_PREFIX, candidate);
    }
    Ok(candidate)
}

/// Create an empty file. Fails if the path already exists.
pub fn create_file(path: &Path) -> Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(())
}

/// Create a new directory at the given path.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)?;
    Ok(())
}

/// Delete a file or directory. Directories are removed recursively,
/// symlinks are removed without following them.
pub fn delete(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Refuse to copy or move a directory into its own subtree.
pub fn ensure_not_into_itself(src: &Path, dest_dir: &Path) -> Result<()> {
    let is_dir = fs::symlink_metadata(src)
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if is_dir && dest_dir.starts_with(src) {
        return Err(AppError::IntoItself(src.to_path_buf()));
    }
    Ok(())
}

/// Atomically reserve `dest` with an empty placeholder of the right kind.
///
/// Fails with [`AppError::Conflict`] if something already exists there.
fn claim(dest: &Path, is_dir: bool) -> Result<()> {
    let claimed = if is_dir {
        fs::create_dir(dest)
    } else {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .map(|_| ())
    };
    claimed.map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => AppError::Conflict(dest.to_path_buf()),
        _ => AppError::Io(e),
    })
}

/// Drop a placeholder made by [`claim`]. Only ever removes an empty directory.
fn release(dest: &Path, is_dir: bool) {
    let _ = if is_dir {
        fs::remove_dir(dest)
    } else {
        fs::remove_file(dest)
    };
}

/// Recursively copy `src` to `dest` without overwriting anything at `dest`.
pub fn copy_recursive(src: &Path, dest: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src)?;
    claim(dest, meta.is_dir())?;
    let copied = copy_into_claimed(src, dest, &meta);
    if copied.is_err() && !meta.is_dir() {
        release(dest, false);
    }
    copied
}

/// Fill an already claimed destination with the contents of `src`.
fn copy_into_claimed(src: &Path, dest: &Path, meta: &fs::Metadata) -> Result<()> {
    if meta.is_dir() {
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else if meta.file_type().is_symlink() {
        copy_symlink(src, dest)?;
    } else {
        fs::copy(src, dest)?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src)?;
    fs::remove_file(dest)?;
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)?;
    Ok(())
}

/// Move `src` to `dest` with must-not-clobber semantics.
///
/// The destination is claimed first, so an entry appearing there after any
/// earlier existence check is reported as [`AppError::Conflict`] instead of
/// being overwritten. Falls back to copy + delete across filesystems.
pub fn move_no_clobber(src: &Path, dest: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src)?;
    claim(dest, meta.is_dir())?;

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            copy_into_claimed(src, dest, &meta)?;
            delete(src)
        }
        Err(e) => {
            release(dest, meta.is_dir());
            Err(e.into())
        }
    }
}

#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(CROSS_DEVICE_ERRNO)
}

#[cfg(not(unix))]
fn is_cross_device(_e: &io::Error) -> bool {
    false
}
