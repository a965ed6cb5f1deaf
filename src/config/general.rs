//! The general configuration settings for burrow.
//!
//! [General] is deserialized from the `[general]` table of burrow.toml and turned into
//! [InternalGeneral], which holds the processed values burrow uses at runtime.

use crate::core::formatter::{SortKey, SortSpec};
use crate::utils::expand_home_path;

use serde::Deserialize;

use std::path::{Path, PathBuf};

/// Where `o` writes the current directory for the shell wrapper to `cd` into.
pub const DEFAULT_HANDOFF_FILE: &str = "/tmp/.bw_lastdir";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct General {
    show_hidden: bool,
    sort: SortKey,
    reversed: bool,
    handoff_file: String,
    icons: bool,
}

impl Default for General {
    fn default() -> Self {
        General {
            show_hidden: false,
            sort: SortKey::Name,
            reversed: false,
            handoff_file: DEFAULT_HANDOFF_FILE.to_string(),
            icons: true,
        }
    }
}

#[derive(Debug)]
pub struct InternalGeneral {
    show_hidden: bool,
    sort: SortSpec,
    handoff_file: PathBuf,
    icons: bool,
}

impl From<General> for InternalGeneral {
    fn from(g: General) -> Self {
        let handoff = g.handoff_file.trim();
        let handoff_file = if handoff.is_empty() {
            PathBuf::from(DEFAULT_HANDOFF_FILE)
        } else {
            expand_home_path(handoff)
        };
        Self {
            show_hidden: g.show_hidden,
            sort: SortSpec::new(g.sort, g.reversed),
            handoff_file,
            icons: g.icons,
        }
    }
}

impl InternalGeneral {
    #[inline]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    #[inline]
    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    #[inline]
    pub fn handoff_file(&self) -> &Path {
        &self.handoff_file
    }

    #[inline]
    pub fn icons(&self) -> bool {
        self.icons
    }
}
