//! Module for mapping entries to a category tag with a Nerd Font icon and a color.
//!
//! The tag is a pure function of the [Entry]: directories and executables first, then
//! special file names, then the lowercased extension.

use crate::core::fm::Entry;
use crate::core::formatter::extension;

use phf::phf_map;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTag {
    Directory,
    Executable,
    Source,
    Document,
    Archive,
    Image,
    Media,
    Config,
    Other,
}

/// File extension (lowercase) to tag mapping
static EXT_TAG_MAP: phf::Map<&'static str, EntryTag> = phf_map! {
    "rs" => EntryTag::Source,
    "py" => EntryTag::Source,
    "js" => EntryTag::Source,
    "ts" => EntryTag::Source,
    "tsx" => EntryTag::Source,
    "jsx" => EntryTag::Source,
    "go" => EntryTag::Source,
    "c" => EntryTag::Source,
    "h" => EntryTag::Source,
    "cpp" => EntryTag::Source,
    "hpp" => EntryTag::Source,
    "java" => EntryTag::Source,
    "kt" => EntryTag::Source,
    "rb" => EntryTag::Source,
    "lua" => EntryTag::Source,
    "sh" => EntryTag::Source,
    "html" => EntryTag::Source,
    "css" => EntryTag::Source,
    "sql" => EntryTag::Source,

    "md" => EntryTag::Document,
    "txt" => EntryTag::Document,
    "pdf" => EntryTag::Document,
    "doc" => EntryTag::Document,
    "docx" => EntryTag::Document,
    "odt" => EntryTag::Document,
    "log" => EntryTag::Document,

    "zip" => EntryTag::Archive,
    "tar" => EntryTag::Archive,
    "gz" => EntryTag::Archive,
    "xz" => EntryTag::Archive,
    "bz2" => EntryTag::Archive,
    "zst" => EntryTag::Archive,
    "7z" => EntryTag::Archive,
    "deb" => EntryTag::Archive,
    "rpm" => EntryTag::Archive,
    "iso" => EntryTag::Archive,

    "png" => EntryTag::Image,
    "jpg" => EntryTag::Image,
    "jpeg" => EntryTag::Image,
    "gif" => EntryTag::Image,
    "svg" => EntryTag::Image,
    "webp" => EntryTag::Image,
    "bmp" => EntryTag::Image,

    "mp3" => EntryTag::Media,
    "flac" => EntryTag::Media,
    "ogg" => EntryTag::Media,
    "wav" => EntryTag::Media,
    "mp4" => EntryTag::Media,
    "mkv" => EntryTag::Media,
    "webm" => EntryTag::Media,

    "toml" => EntryTag::Config,
    "yaml" => EntryTag::Config,
    "yml" => EntryTag::Config,
    "json" => EntryTag::Config,
    "ini" => EntryTag::Config,
    "cfg" => EntryTag::Config,
    "conf" => EntryTag::Config,
    "lock" => EntryTag::Config,
};

/// Special file names
pub(crate) static SPECIAL_FILE_TAG_MAP: phf::Map<&'static str, EntryTag> = phf_map! {
    "Makefile" => EntryTag::Source,
    "Dockerfile" => EntryTag::Source,
    "README" => EntryTag::Document,
    "LICENSE" => EntryTag::Document,
    "COPYING" => EntryTag::Document,
    ".gitignore" => EntryTag::Config,
    ".gitconfig" => EntryTag::Config,
    ".bashrc" => EntryTag::Config,
    ".profile" => EntryTag::Config,
    ".env" => EntryTag::Config,
};

impl EntryTag {
    pub fn of(entry: &Entry) -> Self {
        if entry.is_dir() {
            return EntryTag::Directory;
        }

        let name = entry.name_bytes();
        if let Ok(name) = std::str::from_utf8(name)
            && let Some(tag) = SPECIAL_FILE_TAG_MAP.get(name)
        {
            return *tag;
        }

        let ext = extension(name).to_ascii_lowercase();
        if let Ok(ext) = std::str::from_utf8(&ext)
            && let Some(tag) = EXT_TAG_MAP.get(ext)
        {
            return *tag;
        }

        if entry.is_executable() {
            return EntryTag::Executable;
        }
        EntryTag::Other
    }

    pub fn icon(self) -> &'static str {
        match self {
            EntryTag::Directory => "\u{f07b}",
            EntryTag::Executable => "\u{f489}",
            EntryTag::Source => "\u{f121}",
            EntryTag::Document => "\u{f15c}",
            EntryTag::Archive => "\u{f1c6}",
            EntryTag::Image => "\u{f1c5}",
            EntryTag::Media => "\u{f1c8}",
            EntryTag::Config => "\u{f013}",
            EntryTag::Other => "\u{f15b}",
        }
    }

    pub fn color(self) -> Color {
        match self {
            EntryTag::Directory => Color::Blue,
            EntryTag::Executable => Color::Green,
            EntryTag::Source => Color::Yellow,
            EntryTag::Document => Color::Reset,
            EntryTag::Archive => Color::Red,
            EntryTag::Image => Color::Magenta,
            EntryTag::Media => Color::Cyan,
            EntryTag::Config => Color::Gray,
            EntryTag::Other => Color::Reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn tag_of(dir: &std::path::Path, name: &str) -> EntryTag {
        EntryTag::of(&Entry::from_lstat(dir, name.into()))
    }

    #[test]
    fn tags_by_kind_name_and_extension() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("src.rs"))?;
        for name in ["main.RS", "Makefile", "photo.jpeg", ".bashrc", "notes"] {
            fs::write(dir.path().join(name), "")?;
        }
        let script = dir.path().join("run");
        fs::write(&script, "#!/bin/sh\n")?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;

        assert_eq!(tag_of(dir.path(), "src.rs"), EntryTag::Directory);
        assert_eq!(tag_of(dir.path(), "main.RS"), EntryTag::Source);
        assert_eq!(tag_of(dir.path(), "Makefile"), EntryTag::Source);
        assert_eq!(tag_of(dir.path(), "photo.jpeg"), EntryTag::Image);
        assert_eq!(tag_of(dir.path(), ".bashrc"), EntryTag::Config);
        assert_eq!(tag_of(dir.path(), "run"), EntryTag::Executable);
        assert_eq!(tag_of(dir.path(), "notes"), EntryTag::Other);
        Ok(())
    }
}
