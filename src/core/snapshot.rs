//! Directory snapshot: the filtered, sorted listing of one directory plus its cursor.
//!
//! A [Snapshot] is rebuilt from disk on every load, hidden toggle, sort or filter
//! change and after every file operation. It is never patched in place.
//!
//! Selection invariant: `selected < len` when the listing is non-empty, `selected == 0`
//! otherwise, and for a known viewport height `h`,
//! `scroll_offset <= selected < scroll_offset + h`. Every method that moves the
//! selection restores it before returning.

use crate::core::fm::{Entry, MAX_ITEMS, browse_dir};
use crate::core::formatter::{FilterSpec, Formatter, SortSpec};

use log::debug;
use thiserror::Error;

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    current_dir: PathBuf,
    entries: Vec<Entry>,
    selected: usize,
    scroll_offset: usize,
    show_hidden: bool,
}

impl Snapshot {
    /// Loads `path` with the given rules.
    ///
    /// The directory is canonicalized when possible; otherwise the literal path is used.
    pub fn load(
        path: &Path,
        show_hidden: bool,
        sort: &SortSpec,
        filter: &FilterSpec,
    ) -> Result<Self, SnapshotError> {
        let current_dir = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Ok(md) = std::fs::metadata(&current_dir)
            && !md.is_dir()
        {
            return Err(SnapshotError::NotADirectory(current_dir));
        }

        let formatter = Formatter::new(*sort, filter.clone());
        let mut entries = browse_dir(&current_dir, show_hidden, MAX_ITEMS, |e| {
            formatter.keeps(e)
        })
        .map_err(|source| match source.kind() {
            io::ErrorKind::PermissionDenied => SnapshotError::PermissionDenied(current_dir.clone()),
            io::ErrorKind::NotADirectory => SnapshotError::NotADirectory(current_dir.clone()),
            _ => SnapshotError::Io {
                path: current_dir.clone(),
                source,
            },
        })?;

        formatter.sort_entries(&mut entries);
        debug!(
            "loaded {} ({} entries, sort={}, filter={})",
            current_dir.display(),
            entries.len(),
            sort,
            filter
        );

        Ok(Self {
            current_dir,
            entries,
            selected: 0,
            scroll_offset: 0,
            show_hidden,
        })
    }

    // Accessors

    #[inline]
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn selected_idx(&self) -> usize {
        self.selected
    }

    #[inline]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[inline]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.selected)
    }

    /// The entries currently inside a viewport of `height` rows.
    pub fn visible(&self, height: usize) -> &[Entry] {
        let start = self.scroll_offset.min(self.entries.len());
        let end = (start + height).min(self.entries.len());
        &self.entries[start..end]
    }

    // Navigation functions

    pub fn move_down(&mut self, height: usize) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
        self.scroll_into_view(height);
    }

    pub fn move_up(&mut self, height: usize) {
        self.selected = self.selected.saturating_sub(1);
        self.scroll_into_view(height);
    }

    pub fn jump_top(&mut self, _height: usize) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    /// Selects the last entry and pins the last page.
    pub fn jump_bottom(&mut self, height: usize) {
        let height = height.max(1);
        self.selected = self.entries.len().saturating_sub(1);
        self.scroll_offset = self.entries.len().saturating_sub(height);
    }

    /// Selects the entry called `name`. Returns false when it is not in the listing.
    pub fn select_name(&mut self, name: &OsStr, height: usize) -> bool {
        match self.entries.iter().position(|e| e.name() == name) {
            Some(idx) => {
                self.selected = idx;
                self.scroll_into_view(height);
                true
            }
            None => false,
        }
    }

    /// Moves the selection to `idx`, clamped to the listing.
    pub fn select_clamped(&mut self, idx: usize, height: usize) {
        self.selected = idx.min(self.entries.len().saturating_sub(1));
        self.scroll_into_view(height);
    }

    /// Re-applies the selection invariant, e.g. after the viewport was resized.
    pub fn clamp_selection(&mut self, height: usize) {
        self.select_clamped(self.selected, height);
    }

    /// Scrolls just enough to bring the selection into view.
    fn scroll_into_view(&mut self, height: usize) {
        let height = height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
        let max_offset = self.entries.len().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_offset).min(self.selected);
    }
}
