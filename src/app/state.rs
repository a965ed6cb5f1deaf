//! Session state and main controller module for burrow.
//!
//! This module defines the [Session] struct, which owns everything one run of burrow
//! works on:
//! - the configuration and the keymap built from it
//! - the [Snapshot] of the current directory with its sort, filter and hidden rules
//! - the prefix machine, the prompt context and the overlays
//! - the [Dispatcher] used for every child process
//! - the pushback queue of keys read ahead during disambiguation
//!
//! Key handling lives in [crate::app::handlers]; this module holds the state and the
//! top-level keypress routing.

use crate::app::actions::ActionContext;
use crate::app::keymap::{Action, CommandPrefix, Keymap, PrefixOutcome, PrefixState};
use crate::config::Config;
use crate::core::formatter::{FilterSpec, SortSpec};
use crate::core::proc::Dispatcher;
use crate::core::signals::SignalFlags;
use crate::core::snapshot::{Snapshot, SnapshotError};
use crate::core::terminal::KeySource;
use crate::ui::overlays::{Overlay, OverlayStack};

use crossterm::event::KeyEvent;
use log::{debug, info};

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::Path;

/// Viewport height assumed until the first render reports the real one.
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Enumeration for each individual keypress result processed.
///
/// `OpenedChild` tells the event loop that a child owned the terminal and the screen
/// needs a full redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypressResult {
    Continue,
    Consumed,
    Quit,
    OpenedChild,
}

/// Main struct which holds the state of one burrow run.
pub struct Session<'a> {
    pub(super) config: &'a Config,
    pub(super) keymap: Keymap,

    pub(super) snapshot: Snapshot,
    pub(super) sort: SortSpec,
    pub(super) filter: FilterSpec,
    pub(super) show_hidden: bool,

    pub(super) prefix: CommandPrefix,
    pub(super) actions: ActionContext,
    pub(super) overlays: OverlayStack,

    pub(super) dispatcher: Dispatcher,
    pub(super) viewport_height: usize,
    pub(super) queued: VecDeque<KeyEvent>,
    pub(super) signals: SignalFlags,
}

impl<'a> Session<'a> {
    /// Opens `start_dir` with the configured hidden and sort rules and no filter.
    pub fn new(
        config: &'a Config,
        start_dir: &Path,
        dispatcher: Dispatcher,
        signals: SignalFlags,
    ) -> Result<Self, SnapshotError> {
        let general = config.general();
        let sort = general.sort();
        let filter = FilterSpec::All;
        let show_hidden = general.show_hidden();
        let snapshot = Snapshot::load(start_dir, show_hidden, &sort, &filter)?;
        info!("session started in {}", snapshot.current_dir().display());

        Ok(Self {
            config,
            keymap: Keymap::from_keys(config.keys()),
            snapshot,
            sort,
            filter,
            show_hidden,
            prefix: CommandPrefix::default(),
            actions: ActionContext::default(),
            overlays: OverlayStack::new(),
            dispatcher,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            queued: VecDeque::new(),
            signals,
        })
    }

    // Getters/ accessors

    #[inline]
    pub fn config(&self) -> &Config {
        self.config
    }

    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[inline]
    pub fn current_dir(&self) -> &Path {
        self.snapshot.current_dir()
    }

    #[inline]
    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    #[inline]
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    #[inline]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    #[inline]
    pub fn prefix_state(&self) -> PrefixState {
        self.prefix.state()
    }

    #[inline]
    pub fn actions(&self) -> &ActionContext {
        &self.actions
    }

    #[inline]
    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    #[inline]
    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Keys read ahead but not handled yet.
    #[inline]
    pub fn queued_keys(&self) -> usize {
        self.queued.len()
    }

    // Event loop hooks

    /// Returns true once a termination signal was received.
    pub fn tick(&mut self) -> bool {
        if self.signals.raised() {
            info!("termination signal received, shutting down");
            return true;
        }
        false
    }

    /// Next key from the pushback queue, if any. The event loop drains it before reading
    /// the terminal again.
    pub fn take_queued_key(&mut self) -> Option<KeyEvent> {
        self.queued.pop_front()
    }

    /// Called by the render pass with the number of list rows on screen.
    pub fn set_viewport_height(&mut self, height: usize) {
        let height = height.max(1);
        if height != self.viewport_height {
            self.viewport_height = height;
            self.snapshot.clamp_selection(height);
        }
    }

    /// Removes registered temp files. Called on every exit path.
    pub fn cleanup(&mut self) {
        self.dispatcher.cleanup();
    }

    pub fn push_message(&mut self, title: impl Into<String>, text: impl Into<String>) {
        let (title, text) = (title.into(), text.into());
        debug!("message: {}: {}", title, text);
        self.overlays.push(Overlay::Message { title, text });
    }

    /// Central key handler.
    ///
    /// An open overlay swallows the key and closes. A prompt takes every key. Otherwise
    /// the prefix machine sees the key first and the keymap gets what it passes through.
    /// `keys` is only read for the lookahead after an ambiguous key.
    pub fn handle_keypress(&mut self, key: KeyEvent, keys: &mut dyn KeySource) -> KeypressResult {
        if self.overlays.pop().is_some() {
            return KeypressResult::Consumed;
        }

        if self.actions.is_input_mode() {
            return self.handle_input_mode(key);
        }

        match self.prefix.feed(&key) {
            PrefixOutcome::Started(state) => {
                debug!("prefix {:?}", state);
                return KeypressResult::Consumed;
            }
            PrefixOutcome::Sort(cmd) => return self.handle_sort_command(cmd),
            PrefixOutcome::Filter(cmd) => return self.handle_filter_command(cmd),
            PrefixOutcome::Unrecognized => {
                debug!("unrecognized prefix suffix {:?}", key.code);
                return KeypressResult::Consumed;
            }
            PrefixOutcome::Passthrough => {}
        }

        if let Some(action) = self.keymap.lookup(key) {
            return match action {
                Action::Nav(nav_act) => self.handle_nav_action(nav_act),
                Action::File(file_act) => self.handle_file_action(file_act),
                Action::Tool(tool_act) => self.handle_tool_action(tool_act, keys),
                Action::System(sys_act) => self.handle_sys_action(sys_act),
            };
        }

        KeypressResult::Continue
    }

    // Snapshot reloading

    /// Rebuilds the snapshot of the current directory with the active rules.
    ///
    /// Focuses `focus` when it is in the new listing, otherwise keeps the previous index
    /// clamped to the new length. A failed load keeps the old snapshot and reports it.
    pub(super) fn reload(&mut self, focus: Option<&OsStr>) {
        let dir = self.snapshot.current_dir().to_path_buf();
        let previous = self.snapshot.selected_idx();
        match Snapshot::load(&dir, self.show_hidden, &self.sort, &self.filter) {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                let h = self.viewport_height;
                let focused = focus.is_some_and(|name| self.snapshot.select_name(name, h));
                if !focused {
                    self.snapshot.select_clamped(previous, h);
                }
            }
            Err(e) => self.push_message("Error", e.to_string()),
        }
    }

    /// Reloads keeping the selected entry focused by name.
    pub(super) fn reload_keep_selection(&mut self) {
        let name = self.snapshot.selected_entry().map(|e| e.name().to_os_string());
        self.reload(name.as_deref());
    }

    /// Switches to `dir`, focusing `focus` if given. On failure the current listing stays.
    pub(super) fn load_dir(&mut self, dir: &Path, focus: Option<&OsStr>) {
        match Snapshot::load(dir, self.show_hidden, &self.sort, &self.filter) {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                if let Some(name) = focus {
                    self.snapshot.select_name(name, self.viewport_height);
                }
            }
            Err(e) => self.push_message("Error", e.to_string()),
        }
    }
}
