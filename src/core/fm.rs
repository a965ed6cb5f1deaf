//! Directory enumeration and entry metadata for burrow.
//!
//! Provides the [Entry] struct which is used throughout burrow, and [browse_dir]
//! which reads one directory level into a bounded list of entries.

use std::ffi::{OsStr, OsString};
use std::fs::{self, Metadata};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Maximum number of entries kept per directory listing.
/// Enumeration stops silently once this many entries have been kept.
pub const MAX_ITEMS: usize = 1024;

/// Executable bits for user, group and other.
const EXEC_FLAG: u32 = 0o111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single object in a directory listing.
///
/// Entries are immutable. A reload replaces the whole list.
/// The type is decided by `lstat`, so a symlink to a directory is a [EntryKind::File].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: OsString,
    path: PathBuf,
    kind: EntryKind,
    size: u64,
    modified: SystemTime,
    mode: u32,
    hidden: bool,
}

impl Entry {
    /// Builds an entry for `name` inside `dir` from `lstat`.
    ///
    /// A failing `lstat` yields a zero-size, epoch-time file placeholder instead of an error.
    pub fn from_lstat(dir: &Path, name: OsString) -> Self {
        let path = dir.join(&name);
        let metadata = fs::symlink_metadata(&path);
        Self::with_metadata(name, path, metadata.ok().as_ref())
    }

    pub(crate) fn with_metadata(name: OsString, path: PathBuf, md: Option<&Metadata>) -> Self {
        let hidden = is_hidden_name(&name);
        match md {
            Some(md) => Entry {
                kind: if md.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: md.len(),
                modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                mode: md.permissions().mode(),
                name,
                path,
                hidden,
            },
            None => Entry {
                kind: EntryKind::File,
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
                mode: 0,
                name,
                path,
                hidden,
            },
        }
    }

    // Accessors

    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    #[inline]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn is_executable(&self) -> bool {
        !self.is_dir() && self.mode & EXEC_FLAG != 0
    }
}

#[inline]
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.as_bytes().first() == Some(&b'.')
}

/// Reads one directory level.
///
/// Hidden names are skipped before any `lstat` unless `show_hidden` is set; `keep`
/// decides for the remaining entries. At most `limit` entries are returned.
pub fn browse_dir<F>(dir: &Path, show_hidden: bool, limit: usize, keep: F) -> io::Result<Vec<Entry>>
where
    F: Fn(&Entry) -> bool,
{
    let mut entries = Vec::with_capacity(limit.min(256));

    for dirent in fs::read_dir(dir)? {
        if entries.len() >= limit {
            break;
        }
        let Ok(dirent) = dirent else {
            continue;
        };

        let name = dirent.file_name();
        if !show_hidden && is_hidden_name(&name) {
            continue;
        }

        let entry = Entry::from_lstat(dir, name);
        if keep(&entry) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn entry_from_lstat_file_and_dir() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let mut f = File::create(tmp.path().join("hello.txt"))?;
        writeln!(f, "abc123")?;
        fs::create_dir(tmp.path().join(".cache"))?;

        let file = Entry::from_lstat(tmp.path(), OsString::from("hello.txt"));
        assert_eq!(file.kind(), EntryKind::File);
        assert_eq!(file.size(), 7);
        assert!(!file.is_hidden());

        let dir = Entry::from_lstat(tmp.path(), OsString::from(".cache"));
        assert!(dir.is_dir());
        assert!(dir.is_hidden());
        Ok(())
    }

    #[test]
    fn missing_entry_degrades_to_placeholder() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let ghost = Entry::from_lstat(tmp.path(), OsString::from("ghost"));
        assert_eq!(ghost.kind(), EntryKind::File);
        assert_eq!(ghost.size(), 0);
        assert_eq!(ghost.modified(), SystemTime::UNIX_EPOCH);
        Ok(())
    }

    #[test]
    fn symlink_to_dir_is_a_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        fs::create_dir(tmp.path().join("real"))?;
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link"))?;

        let link = Entry::from_lstat(tmp.path(), OsString::from("link"));
        assert_eq!(link.kind(), EntryKind::File);
        Ok(())
    }

    #[test]
    fn browse_dir_skips_hidden_and_honours_limit() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        for i in 0..10 {
            File::create(tmp.path().join(format!("f{i}")))?;
        }
        File::create(tmp.path().join(".dotfile"))?;

        let visible = browse_dir(tmp.path(), false, MAX_ITEMS, |_| true)?;
        assert_eq!(visible.len(), 10);
        assert!(visible.iter().all(|e| !e.is_hidden()));

        let all = browse_dir(tmp.path(), true, MAX_ITEMS, |_| true)?;
        assert_eq!(all.len(), 11);

        let capped = browse_dir(tmp.path(), true, 4, |_| true)?;
        assert_eq!(capped.len(), 4);
        Ok(())
    }

    #[test]
    fn browse_nonexistent() {
        let result = browse_dir(Path::new("/path/does/not/exist"), false, MAX_ITEMS, |_| true);
        assert!(result.is_err());
    }
}
