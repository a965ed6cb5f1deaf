//! Sorting, filtering, and display formatting for directory entries in burrow.
//!
//! The [Formatter] holds the active [SortSpec] and [FilterSpec] and is used by the
//! snapshot loader to decide which entries are kept and in what order.

use crate::core::fm::Entry;

use humansize::{BINARY, format_size};
use serde::Deserialize;

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    #[serde(alias = "time", alias = "mtime")]
    Modified,
    #[serde(alias = "ext")]
    Extension,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Size => "size",
            SortKey::Modified => "time",
            SortKey::Extension => "ext",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub reversed: bool,
}

impl SortSpec {
    pub fn new(key: SortKey, reversed: bool) -> Self {
        Self { key, reversed }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.label())?;
        if self.reversed {
            f.write_str(" (rev)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterSpec {
    #[default]
    All,
    FilesOnly,
    DirectoriesOnly,
    /// Case-sensitive byte substring of the name. Empty text keeps everything.
    Contains(String),
}

impl FilterSpec {
    pub fn keeps(&self, entry: &Entry) -> bool {
        match self {
            FilterSpec::All => true,
            FilterSpec::FilesOnly => !entry.is_dir(),
            FilterSpec::DirectoriesOnly => entry.is_dir(),
            FilterSpec::Contains(text) => contains_bytes(entry.name_bytes(), text.as_bytes()),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::All => f.write_str("all"),
            FilterSpec::FilesOnly => f.write_str("files"),
            FilterSpec::DirectoriesOnly => f.write_str("dirs"),
            FilterSpec::Contains(text) if text.is_empty() => f.write_str("contains:*"),
            FilterSpec::Contains(text) => write!(f, "contains:{}", text),
        }
    }
}

/// Sort and filter rules applied while a directory is loaded.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    sort: SortSpec,
    filter: FilterSpec,
}

impl Formatter {
    pub fn new(sort: SortSpec, filter: FilterSpec) -> Self {
        Self { sort, filter }
    }

    #[inline]
    pub fn keeps(&self, entry: &Entry) -> bool {
        self.filter.keeps(entry)
    }

    /// Sorts the given entries in place according to the formatter's settings.
    pub fn sort_entries(&self, entries: &mut [Entry]) {
        entries.sort_by(|a, b| compare_entries(a, b, &self.sort));
    }
}

/// Total order used for listings.
///
/// Directories always come first; `reversed` only flips the order inside each group.
/// The raw name bytes are the last tie-break, so two different names never compare equal.
pub fn compare_entries(a: &Entry, b: &Entry, sort: &SortSpec) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let by_name = || {
        cmp_ignore_ascii_case(a.name_bytes(), b.name_bytes())
            .then_with(|| a.name_bytes().cmp(b.name_bytes()))
    };

    let ord = match sort.key {
        SortKey::Name => by_name(),
        SortKey::Size => a.size().cmp(&b.size()).then_with(by_name),
        SortKey::Modified => a.modified().cmp(&b.modified()).then_with(by_name),
        SortKey::Extension => {
            cmp_ignore_ascii_case(extension(a.name_bytes()), extension(b.name_bytes()))
                .then_with(by_name)
        }
    };

    if sort.reversed { ord.reverse() } else { ord }
}

/// The bytes after the last `.`; empty when there is none or it is the leading dot.
pub fn extension(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b'.') {
        Some(0) | None => &[],
        Some(idx) => &name[idx + 1..],
    }
}

/// ASCII case-insensitive byte comparison, the same ordering `strcasecmp` gives.
pub fn cmp_ignore_ascii_case(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Formats a file size for the listing, e.g. `1.5 KiB`. Directories show nothing.
pub fn format_entry_size(entry: &Entry) -> String {
    if entry.is_dir() {
        String::new()
    } else {
        format_size(entry.size(), BINARY)
    }
}
