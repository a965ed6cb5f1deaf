//! Application layer of burrow.
//!
//! - [state]: the [Session] that owns the snapshot, dispatcher and UI state.
//! - [handlers]: what each key does.
//! - [keymap]: single-key bindings and the `s`/`f` prefix machine.
//! - [actions]: prompts and their input buffer.

pub mod actions;
pub mod handlers;
pub mod keymap;
pub mod state;

pub use actions::{ActionContext, ActionMode, InputMode};
pub use keymap::{Action, CommandPrefix, Keymap, PrefixOutcome, PrefixState};
pub use state::{KeypressResult, Session};
