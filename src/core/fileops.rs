//! File operations: create, rename and shallow delete.
//!
//! None of these ever overwrite. Creation relies on the exclusive-create primitives
//! (`O_CREAT | O_EXCL`, `mkdir`), so there is no window between an existence check
//! and the create. Renames use `link(2)` or, on Linux, `renameat2(RENAME_NOREPLACE)`.
//! Deletion never recurses.

use crate::core::fm::Entry;

use log::{debug, warn};
use thiserror::Error;

use std::ffi::OsStr;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

const DIR_MODE: u32 = 0o755;

#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("Invalid name: {0}")]
    InvalidName(&'static str),
    #[error("'{}' already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Directory not empty: {}", .0.display())]
    NotEmpty(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileOpError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::AlreadyExists => FileOpError::AlreadyExists(path),
            io::ErrorKind::DirectoryNotEmpty => FileOpError::NotEmpty(path),
            io::ErrorKind::PermissionDenied => FileOpError::PermissionDenied(path),
            io::ErrorKind::NotFound => FileOpError::NotFound(path),
            _ => FileOpError::Io { path, source },
        }
    }
}

/// Rejects names that would not denote a single new entry of the directory.
pub fn validate_entry_name(name: &OsStr) -> Result<(), FileOpError> {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return Err(FileOpError::InvalidName("name is empty"));
    }
    if bytes.contains(&b'/') {
        return Err(FileOpError::InvalidName("name contains '/'"));
    }
    if bytes.contains(&0) {
        return Err(FileOpError::InvalidName("name contains a NUL byte"));
    }
    if bytes == b"." || bytes == b".." {
        return Err(FileOpError::InvalidName("'.' and '..' are reserved"));
    }
    Ok(())
}

/// Creates an empty file `name` in `dir`. Fails if anything by that name exists.
pub fn create_file(dir: &Path, name: &OsStr) -> Result<PathBuf, FileOpError> {
    validate_entry_name(name)?;
    let path = dir.join(name);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| FileOpError::from_io(&path, e))?;
    debug!("created file {}", path.display());
    Ok(path)
}

/// Creates directory `name` in `dir` with mode 0755. Fails if anything by that name exists.
pub fn create_directory(dir: &Path, name: &OsStr) -> Result<PathBuf, FileOpError> {
    validate_entry_name(name)?;
    let path = dir.join(name);
    DirBuilder::new()
        .mode(DIR_MODE)
        .create(&path)
        .map_err(|e| FileOpError::from_io(&path, e))?;
    debug!("created directory {}", path.display());
    Ok(path)
}

/// Renames `entry` to `new_name` within the same directory without ever replacing a target.
pub fn rename(entry: &Entry, new_name: &OsStr) -> Result<PathBuf, FileOpError> {
    validate_entry_name(entry.name())?;
    validate_entry_name(new_name)?;

    let src = entry.path();
    let parent = src
        .parent()
        .ok_or(FileOpError::InvalidName("entry has no parent directory"))?;
    let dest = parent.join(new_name);

    if entry.name() == new_name {
        return Ok(dest);
    }

    if !entry.is_dir() {
        // link(2) fails with EEXIST atomically; the source is unlinked afterwards.
        match fs::hard_link(src, &dest) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(src) {
                    let _ = fs::remove_file(&dest);
                    return Err(FileOpError::from_io(src, e));
                }
                debug!("renamed {} -> {}", src.display(), dest.display());
                return Ok(dest);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(FileOpError::AlreadyExists(dest));
            }
            Err(e) => {
                warn!(
                    "hard link rename failed for {} ({}), falling back to rename(2)",
                    src.display(),
                    e
                );
            }
        }
    }

    match rename_noreplace(src, &dest) {
        Some(Ok(())) => {
            debug!("renamed {} -> {}", src.display(), dest.display());
            return Ok(dest);
        }
        Some(Err(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(FileOpError::AlreadyExists(dest));
        }
        Some(Err(e)) => return Err(FileOpError::from_io(src, e)),
        None => {}
    }

    // No atomic variant on this system: check, then rename(2).
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(FileOpError::AlreadyExists(dest));
    }
    fs::rename(src, &dest).map_err(|e| FileOpError::from_io(src, e))?;
    debug!("renamed {} -> {}", src.display(), dest.display());
    Ok(dest)
}

/// `rename(2)` that fails with `EEXIST` instead of replacing `dest`.
///
/// `None` when the kernel or the filesystem does not support it.
#[cfg(target_os = "linux")]
fn rename_noreplace(src: &Path, dest: &Path) -> Option<io::Result<()>> {
    use std::ffi::CString;

    // <linux/fs.h>
    const RENAME_NOREPLACE: libc::c_uint = 1;

    let (Ok(src_c), Ok(dest_c)) = (
        CString::new(src.as_os_str().as_bytes()),
        CString::new(dest.as_os_str().as_bytes()),
    ) else {
        return Some(Err(io::ErrorKind::InvalidInput.into()));
    };

    // SAFETY: both pointers are NUL-terminated and outlive the call.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_renameat2,
            libc::AT_FDCWD,
            src_c.as_ptr(),
            libc::AT_FDCWD,
            dest_c.as_ptr(),
            RENAME_NOREPLACE,
        )
    };
    if ret == 0 {
        return Some(Ok(()));
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EINVAL) | Some(libc::ENOSYS) => {
            debug!("renameat2 unavailable ({}), using rename(2)", err);
            None
        }
        _ => Some(Err(err)),
    }
}

#[cfg(not(target_os = "linux"))]
fn rename_noreplace(_src: &Path, _dest: &Path) -> Option<io::Result<()>> {
    None
}

/// Removes `entry`. Directories are removed only when empty.
pub fn delete(entry: &Entry) -> Result<(), FileOpError> {
    validate_entry_name(entry.name())?;
    let path = entry.path();
    let res = if entry.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    res.map_err(|e| FileOpError::from_io(path, e))?;
    debug!("deleted {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::tempdir;

    #[test]
    fn rejects_illegal_names() {
        for bad in ["", ".", "..", "a/b", "/abs"] {
            assert!(
                matches!(validate_entry_name(OsStr::new(bad)), Err(FileOpError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_entry_name(OsStr::new("...")).is_ok());
        assert!(validate_entry_name(OsStr::new(".env")).is_ok());
    }

    #[test]
    fn create_directory_collides_with_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        create_file(dir.path(), OsStr::new("thing"))?;
        let res = create_directory(dir.path(), OsStr::new("thing"));
        assert!(matches!(res, Err(FileOpError::AlreadyExists(_))));
        assert!(dir.path().join("thing").is_file());
        Ok(())
    }

    #[test]
    fn rename_file_and_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        create_file(dir.path(), OsStr::new("old.txt"))?;
        create_directory(dir.path(), OsStr::new("old_dir"))?;

        let f = Entry::from_lstat(dir.path(), OsString::from("old.txt"));
        rename(&f, OsStr::new("new.txt"))?;
        assert!(!dir.path().join("old.txt").exists());
        assert!(dir.path().join("new.txt").is_file());

        let d = Entry::from_lstat(dir.path(), OsString::from("old_dir"));
        rename(&d, OsStr::new("new_dir"))?;
        assert!(dir.path().join("new_dir").is_dir());
        Ok(())
    }

    #[test]
    fn rename_refuses_to_overwrite() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a"), "first")?;
        fs::write(dir.path().join("b"), "second")?;
        create_directory(dir.path(), OsStr::new("d1"))?;
        create_directory(dir.path(), OsStr::new("d2"))?;

        let a = Entry::from_lstat(dir.path(), OsString::from("a"));
        assert!(matches!(rename(&a, OsStr::new("b")), Err(FileOpError::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(dir.path().join("a"))?, "first");
        assert_eq!(fs::read_to_string(dir.path().join("b"))?, "second");

        let d1 = Entry::from_lstat(dir.path(), OsString::from("d1"));
        assert!(matches!(rename(&d1, OsStr::new("d2")), Err(FileOpError::AlreadyExists(_))));
        assert!(dir.path().join("d1").is_dir());
        Ok(())
    }

    #[test]
    fn directory_rename_never_replaces_an_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
        // plain rename(2) would silently swap an empty target directory
        let dir = tempdir()?;
        create_directory(dir.path(), OsStr::new("src"))?;
        fs::write(dir.path().join("src/keep"), "x")?;
        create_directory(dir.path(), OsStr::new("empty"))?;

        let src = Entry::from_lstat(dir.path(), OsString::from("src"));
        assert!(matches!(rename(&src, OsStr::new("empty")), Err(FileOpError::AlreadyExists(_))));
        assert!(dir.path().join("src/keep").is_file());
        assert_eq!(fs::read_dir(dir.path().join("empty"))?.count(), 0);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn noreplace_rename_reports_existing_target() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (a, b) = (dir.path().join("a"), dir.path().join("b"));
        fs::create_dir(&a)?;
        fs::create_dir(&b)?;

        match rename_noreplace(&a, &b) {
            Some(Err(e)) => assert_eq!(e.kind(), io::ErrorKind::AlreadyExists),
            Some(Ok(())) => panic!("existing directory was replaced"),
            None => {}
        }
        assert!(a.is_dir() && b.is_dir());

        let c = dir.path().join("c");
        if let Some(res) = rename_noreplace(&a, &c) {
            res?;
            assert!(!a.exists() && c.is_dir());
        }
        Ok(())
    }

    #[test]
    fn delete_file_and_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        create_file(dir.path(), OsStr::new("f"))?;
        create_directory(dir.path(), OsStr::new("d"))?;

        delete(&Entry::from_lstat(dir.path(), OsString::from("f")))?;
        delete(&Entry::from_lstat(dir.path(), OsString::from("d")))?;
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
