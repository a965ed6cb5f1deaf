//! Miscellaneous utilities for burrow.
//!
//! - [helpers]: home path handling, start directory resolution and the hand-off file.
//! - [cli]: command-line parsing and help output.
//! - [logging]: the optional file logger.

pub mod cli;
pub mod helpers;
pub mod logging;

pub use helpers::{
    expand_home_path, get_home, is_usable_directory, resolve_start_dir, shorten_home_path,
    write_handoff_file,
};
