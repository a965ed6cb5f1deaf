//! Input configuration options for burrow
//!
//! This module defines the `[keys]`, `[tools]` and `[input]` tables of burrow.toml.

use crate::core::proc::ToolDefaults;

use serde::Deserialize;

use std::time::Duration;

/// Default lookahead window after an ambiguous key, in milliseconds.
pub const DEFAULT_LOOKAHEAD_MS: u64 = 250;
/// Upper bound accepted for `lookahead_ms`.
pub const MAX_LOOKAHEAD_MS: u64 = 2000;

/// Key bindings of all non-prefix actions
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Keys {
    go_up: Vec<String>,
    go_down: Vec<String>,
    go_to_top: Vec<String>,
    go_to_bottom: Vec<String>,
    go_into_dir: Vec<String>,
    go_parent: Vec<String>,
    toggle_hidden: Vec<String>,
    create: Vec<String>,
    create_directory: Vec<String>,
    rename: Vec<String>,
    delete: Vec<String>,
    find: Vec<String>,
    edit: Vec<String>,
    edit_in_split: Vec<String>,
    pager: Vec<String>,
    grep: Vec<String>,
    toggle_terminal: Vec<String>,
    quit_with_cd: Vec<String>,
    quit: Vec<String>,
}

macro_rules! accessor {
    ($($name:ident),+ $(,)?) => {
        impl Keys {
            $(
                #[inline]
                pub fn $name(&self) -> &[String] {
                    &self.$name
                }
            )+
        }
    };
}

accessor!(
    go_up,
    go_down,
    go_to_top,
    go_to_bottom,
    go_into_dir,
    go_parent,
    toggle_hidden,
    create,
    create_directory,
    rename,
    delete,
    find,
    edit,
    edit_in_split,
    pager,
    grep,
    toggle_terminal,
    quit_with_cd,
    quit,
);

impl Default for Keys {
    fn default() -> Self {
        Keys {
            go_up: vec!["k".into(), "Up".into()],
            go_down: vec!["j".into(), "Down".into()],
            go_to_top: vec!["g".into()],
            go_to_bottom: vec!["G".into()],
            go_into_dir: vec!["l".into(), "Enter".into(), "Right".into()],
            go_parent: vec!["Backspace".into(), "Left".into()],

            toggle_hidden: vec!["h".into()],

            create: vec!["n".into()],
            create_directory: vec!["N".into()],
            rename: vec!["r".into()],
            delete: vec!["d".into()],

            find: vec!["/".into()],
            edit: vec!["e".into()],
            edit_in_split: vec!["v".into()],
            pager: vec!["p".into()],
            grep: vec!["?".into()],
            toggle_terminal: vec!["t".into()],

            quit_with_cd: vec!["o".into()],
            quit: vec!["q".into()],
        }
    }
}

/// External tools used when `EDITOR`, `PAGER` or `BW_FINDER` are unset
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Tools {
    editor: String,
    pager: String,
    finder: String,
}

impl Default for Tools {
    fn default() -> Self {
        let d = ToolDefaults::default();
        Tools {
            editor: d.editor,
            pager: d.pager,
            finder: d.finder,
        }
    }
}

impl Tools {
    /// Blank entries fall back to the built-in tool.
    pub fn defaults(&self) -> ToolDefaults {
        let builtin = ToolDefaults::default();
        let pick = |configured: &str, fallback: String| {
            let trimmed = configured.trim();
            if trimmed.is_empty() {
                fallback
            } else {
                trimmed.to_string()
            }
        };
        ToolDefaults {
            editor: pick(&self.editor, builtin.editor),
            pager: pick(&self.pager, builtin.pager),
            finder: pick(&self.finder, builtin.finder),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Input {
    lookahead_ms: u64,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            lookahead_ms: DEFAULT_LOOKAHEAD_MS,
        }
    }
}

impl Input {
    /// How long to wait for a second key after `?`. Zero means do not wait at all.
    #[inline]
    pub fn lookahead(&self) -> Duration {
        Duration::from_millis(self.lookahead_ms)
    }

    pub(crate) fn clamped(self) -> Self {
        Input {
            lookahead_ms: self.lookahead_ms.min(MAX_LOOKAHEAD_MS),
        }
    }
}
