//! Helpers for burrow.
//!
//! - Home directory lookup, `~` expansion and `~` shortening for display
//! - Resolving the start directory from the command line or `BW_START_DIR`
//! - Writing the hand-off file read by the shell wrapper after `o`

use std::ffi::OsStr;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

pub const START_DIR_ENV: &str = "BW_START_DIR";

#[inline]
pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expands a leading `~` or `~/` to the home directory. Anything else is returned as is.
///
/// Works on the raw bytes, so paths that are not valid UTF-8 pass through untouched.
pub fn expand_home_path<S: AsRef<OsStr>>(path: S) -> PathBuf {
    let path = path.as_ref();
    let bytes = path.as_bytes();
    if bytes == b"~" {
        if let Some(home) = get_home() {
            return home;
        }
    } else if let Some(rest) = bytes.strip_prefix(b"~/")
        && let Some(home) = get_home()
    {
        return home.join(OsStr::from_bytes(rest));
    }
    PathBuf::from(path)
}

/// Displays paths under the home directory as `~/...`.
pub fn shorten_home_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    if let Some(home_dir) = get_home()
        && let Ok(stripped) = path.strip_prefix(&home_dir)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~{}{}", MAIN_SEPARATOR, stripped.display());
    }
    path.display().to_string()
}

/// The directory burrow starts in.
///
/// The command line argument wins over `BW_START_DIR`; with neither, the current
/// directory is used. Given paths are `~`-expanded and canonicalized, falling back to
/// the expanded path when canonicalization fails.
pub fn resolve_start_dir(cli_arg: Option<&OsStr>) -> io::Result<PathBuf> {
    let env_value = std::env::var_os(START_DIR_ENV);
    let raw = cli_arg
        .or(env_value.as_deref())
        .map(|s| OsStr::from_bytes(s.as_bytes().trim_ascii()))
        .filter(|s| !s.is_empty());

    match raw {
        Some(raw) => {
            let expanded = expand_home_path(raw);
            Ok(expanded.canonicalize().unwrap_or(expanded))
        }
        None => std::env::current_dir(),
    }
}

/// Whether `path` is a directory burrow can list.
pub fn is_usable_directory(path: &Path) -> bool {
    path.is_dir() && std::fs::read_dir(path).is_ok()
}

/// Writes `dir` to the hand-off file as raw bytes, no trailing newline.
///
/// The content goes to a fresh temp file next to `target` which is then renamed over
/// it, so an existing symlink at `target` is replaced rather than followed.
pub fn write_handoff_file(target: &Path, dir: &Path) -> io::Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = target.file_name().unwrap_or(OsStr::new(".bw_lastdir"));

    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(dir.as_os_str().as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
