//! Core runtime logic for burrow.
//!
//! This module contains the non-UI "engine" pieces used by the application:
//! - [fm]: directory enumeration and the [Entry] type.
//! - [formatter]: sort and filter rules and size formatting.
//! - [snapshot]: the sorted, filtered listing of one directory with its cursor.
//! - [fileops]: create, rename and delete without overwriting.
//! - [quote]: POSIX shell quoting and tool name validation.
//! - [mux]: tmux command lines and the tracked terminal pane.
//! - [proc]: running external tools through `sh -c`.
//! - [signals]: the flags set by SIGINT, SIGTERM and SIGHUP.
//! - [terminal]: terminal setup/teardown and the main crossterm/ratatui event loop.

pub mod fileops;
pub mod fm;
pub mod formatter;
pub mod mux;
pub mod proc;
pub mod quote;
pub mod signals;
pub mod snapshot;
pub mod terminal;

pub use fm::{Entry, EntryKind, browse_dir};
pub use formatter::{FilterSpec, Formatter, SortKey, SortSpec};
pub use proc::{DispatchError, Dispatcher, ToolDefaults};
pub use signals::SignalFlags;
pub use snapshot::{Snapshot, SnapshotError};
