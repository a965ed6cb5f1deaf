//! The main config loading module for burrow.
//!
//! Handles loading and deserializing settings from `burrow.toml`.
//!
//! Provides the main [Config] struct, as well as the internal [RawConfig] used for
//! parsing. Also writes the default config file for `bw --init`.

use crate::config::{General, Input, InternalGeneral, Keys, Tools};
use crate::utils::get_home;

use log::info;
use serde::Deserialize;

use std::path::{Path, PathBuf};
use std::{fs, io};

pub const CONFIG_ENV: &str = "BW_CONFIG";

/// Raw configuration as read from the toml file.
/// Converted into the main [Config] struct after parsing.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RawConfig {
    general: General,
    tools: Tools,
    input: Input,
    keys: Keys,
}

/// Processed configuration used by burrow.
#[derive(Debug)]
pub struct Config {
    general: InternalGeneral,
    tools: Tools,
    input: Input,
    keys: Keys,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            general: InternalGeneral::from(raw.general),
            tools: raw.tools,
            input: raw.input.clamped(),
            keys: raw.keys,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    /// A missing file gives the defaults; a broken one is reported and gives the defaults.
    ///
    /// Called by the entry point at startup, before the terminal is taken over.
    pub fn load() -> Self {
        let path = Self::default_path();

        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error parsing config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawConfig>(content).map(Config::from)
    }

    // Getters

    #[inline]
    pub fn general(&self) -> &InternalGeneral {
        &self.general
    }

    #[inline]
    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    #[inline]
    pub fn input(&self) -> &Input {
        &self.input
    }

    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Determine the configuration file path.
    /// Checks BW_CONFIG first, then XDG_CONFIG_HOME,
    /// then defaults to ~/.config/burrow/burrow.toml.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|p| !p.is_empty()) {
            return PathBuf::from(xdg_config).join("burrow/burrow.toml");
        }

        if let Some(home) = get_home() {
            return home.join(".config/burrow/burrow.toml");
        }
        PathBuf::from("burrow.toml")
    }

    /// Write the default configuration file to `path`.
    /// Fails if the file already exists.
    pub fn generate_default(path: &Path) -> io::Result<()> {
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {}", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_TOML)?;
        println!("Default config generated at {}", path.display());
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

const DEFAULT_TOML: &str = r##"# burrow.toml - default configuration for burrow (bw)
#
# Commented values are the internal defaults.

[general]
# show_hidden = false
# sort = "name"                   # name | size | modified | extension
# reversed = false
# handoff_file = "/tmp/.bw_lastdir"
# icons = true

# Used when EDITOR, PAGER or BW_FINDER are unset.
[tools]
# editor = "vi"
# pager = "less -R"
# finder = "fzf"

[input]
# Time to wait for a second "?" (help) after "?" (grep), in milliseconds. 0 = no wait.
# lookahead_ms = 250

# Sort ("s" + n/s/t/e/r) and filter ("f" + f/d/F/c) prefixes are fixed.
[keys]
# go_up = ["k", "Up"]
# go_down = ["j", "Down"]
# go_to_top = ["g"]
# go_to_bottom = ["G"]
# go_into_dir = ["l", "Enter", "Right"]
# go_parent = ["Backspace", "Left"]
# toggle_hidden = ["h"]
# create = ["n"]
# create_directory = ["N"]
# rename = ["r"]
# delete = ["d"]
# find = ["/"]
# edit = ["e"]
# edit_in_split = ["v"]
# pager = ["p"]
# grep = ["?"]
# toggle_terminal = ["t"]
# quit_with_cd = ["o"]
# quit = ["q"]
"##;
