//! Input action handler methods for burrow.
//!
//! This module implements [Session] methods that process key events: navigation,
//! sort and filter commands, file operations with their prompts, and the flows that
//! hand the terminal to an external tool.

use crate::app::actions::{ActionMode, InputMode};
use crate::app::keymap::{
    FileAction, FilterCommand, NavAction, SortCommand, SystemAction, ToolAction, plain_char,
};
use crate::app::state::{KeypressResult, Session};
use crate::core::fileops::{self, FileOpError};
use crate::core::formatter::FilterSpec;
use crate::core::mux::SplitSide;
use crate::core::proc::{ChildReport, DispatchError, Dispatcher, PaneToggle, ToolKind};
use crate::core::terminal::KeySource;
use crate::ui::overlays::Overlay;
use crate::utils::write_handoff_file;

use crossterm::event::{KeyCode::*, KeyEvent};
use log::{debug, warn};

use std::ffi::OsString;
use std::path::Path;

const DIRECTORY_GUARD: &str = "That is a directory. Use 'l' to enter it.";

/// Session input and action handlers
impl<'a> Session<'a> {
    // Prompt handling

    /// Handles key events while a prompt is open.
    ///
    /// Enter confirms and Esc cancels. The delete confirmation accepts only `y`/`Y`;
    /// every other key cancels it.
    pub(super) fn handle_input_mode(&mut self, key: KeyEvent) -> KeypressResult {
        let Some(mode) = self.actions.input_mode() else {
            return KeypressResult::Continue;
        };

        if mode == InputMode::ConfirmDelete {
            self.actions.exit_mode();
            if matches!(key.code, Char('y') | Char('Y')) {
                self.delete_selected();
            } else {
                debug!("delete cancelled");
            }
            return KeypressResult::Consumed;
        }

        match key.code {
            Enter => {
                let input = self.actions.take_input();
                match mode {
                    InputMode::NewFile => self.create_entry(input, false),
                    InputMode::NewDirectory => self.create_entry(input, true),
                    InputMode::Rename => self.rename_selected(input),
                    InputMode::FilterContains => self.apply_contains_filter(input),
                    InputMode::ConfirmDelete => {}
                }
            }
            Esc => {
                self.actions.exit_mode();
                if mode == InputMode::FilterContains {
                    self.apply_contains_filter(None);
                }
            }
            Left => self.actions.action_move_cursor_left(),
            Right => self.actions.action_move_cursor_right(),
            Home => self.actions.action_cursor_home(),
            End => self.actions.action_cursor_end(),
            Backspace => self.actions.action_backspace_at_cursor(),
            Delete => self.actions.action_delete_at_cursor(),
            Char(c) if plain_char(&key).is_some() => self.actions.action_insert_at_cursor(c),
            _ => {}
        }
        KeypressResult::Consumed
    }

    fn open_prompt(&mut self, mode: InputMode, prompt: impl Into<String>, initial: String) {
        self.actions.enter_mode(
            ActionMode::Input {
                mode,
                prompt: prompt.into(),
            },
            initial,
        );
    }

    // Navigation

    pub(super) fn handle_nav_action(&mut self, action: NavAction) -> KeypressResult {
        let h = self.viewport_height;
        match action {
            NavAction::GoUp => self.snapshot.move_up(h),
            NavAction::GoDown => self.snapshot.move_down(h),
            NavAction::GoToTop => self.snapshot.jump_top(h),
            NavAction::GoToBottom => self.snapshot.jump_bottom(h),
            NavAction::GoIntoDir => {
                if let Some(entry) = self.snapshot.selected_entry()
                    && entry.is_dir()
                {
                    let target = entry.path().to_path_buf();
                    self.load_dir(&target, None);
                }
            }
            NavAction::GoParent => {
                let current = self.snapshot.current_dir().to_path_buf();
                if let Some(parent) = current.parent() {
                    self.load_dir(parent, current.file_name());
                }
            }
            NavAction::ToggleHidden => {
                self.show_hidden = !self.show_hidden;
                self.reload_keep_selection();
            }
        }
        KeypressResult::Consumed
    }

    pub(super) fn handle_sort_command(&mut self, cmd: SortCommand) -> KeypressResult {
        match cmd {
            SortCommand::By(key) => self.sort.key = key,
            SortCommand::ToggleReverse => self.sort.reversed = !self.sort.reversed,
        }
        debug!("sort is now {}", self.sort);
        self.reload_keep_selection();
        KeypressResult::Consumed
    }

    pub(super) fn handle_filter_command(&mut self, cmd: FilterCommand) -> KeypressResult {
        let filter = match cmd {
            FilterCommand::FilesOnly => FilterSpec::FilesOnly,
            FilterCommand::DirectoriesOnly => FilterSpec::DirectoriesOnly,
            FilterCommand::Clear => FilterSpec::All,
            FilterCommand::PromptContains => {
                self.open_prompt(InputMode::FilterContains, "Filter: ", String::new());
                return KeypressResult::Consumed;
            }
        };
        self.filter = filter;
        self.reload_keep_selection();
        KeypressResult::Consumed
    }

    /// Empty or cancelled input clears the filter.
    fn apply_contains_filter(&mut self, input: Option<String>) {
        self.filter = match input {
            Some(text) => FilterSpec::Contains(text),
            None => FilterSpec::All,
        };
        self.reload_keep_selection();
    }

    // File operations

    pub(super) fn handle_file_action(&mut self, action: FileAction) -> KeypressResult {
        match action {
            FileAction::Create => {
                self.open_prompt(InputMode::NewFile, "New file: ", String::new());
            }
            FileAction::CreateDirectory => {
                self.open_prompt(InputMode::NewDirectory, "New directory: ", String::new());
            }
            FileAction::Rename => {
                if let Some(entry) = self.snapshot.selected_entry() {
                    let current = entry.name().to_string_lossy().into_owned();
                    self.open_prompt(InputMode::Rename, "Rename: ", current);
                }
            }
            FileAction::Delete => {
                if let Some(entry) = self.snapshot.selected_entry() {
                    let prompt = format!(
                        "Delete '{}'? This cannot be undone. [y/N]",
                        entry.name().to_string_lossy()
                    );
                    self.open_prompt(InputMode::ConfirmDelete, prompt, String::new());
                }
            }
        }
        KeypressResult::Consumed
    }

    fn create_entry(&mut self, input: Option<String>, directory: bool) {
        let Some(name) = input else {
            return;
        };
        let name = OsString::from(name);
        let dir = self.snapshot.current_dir().to_path_buf();
        let res = if directory {
            fileops::create_directory(&dir, &name)
        } else {
            fileops::create_file(&dir, &name)
        };
        match res {
            Ok(_) => self.reload(Some(&name)),
            Err(e) => {
                self.reload(None);
                let what = if directory { "directory" } else { "file" };
                self.report_file_error(format!("Failed to create {}", what), e);
            }
        }
    }

    fn rename_selected(&mut self, input: Option<String>) {
        let (Some(new_name), Some(entry)) = (input, self.snapshot.selected_entry().cloned())
        else {
            return;
        };
        let new_name = OsString::from(new_name);
        match fileops::rename(&entry, &new_name) {
            Ok(_) => self.reload(Some(&new_name)),
            Err(e) => {
                self.reload(None);
                self.report_file_error("Rename failed".to_string(), e);
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(entry) = self.snapshot.selected_entry().cloned() else {
            return;
        };
        let res = fileops::delete(&entry);
        self.reload(None);
        if let Err(e) = res {
            self.report_file_error("Delete failed".to_string(), e);
        }
    }

    fn report_file_error(&mut self, context: String, err: FileOpError) {
        warn!("{}: {}", context, err);
        self.push_message("Error", format!("{}: {}", context, err));
    }

    // External tools

    pub(super) fn handle_tool_action(
        &mut self,
        action: ToolAction,
        keys: &mut dyn KeySource,
    ) -> KeypressResult {
        match action {
            ToolAction::Edit => self.open_with(ToolKind::Editor, None, None),
            ToolAction::EditInSplit => {
                self.open_with(ToolKind::Editor, None, Some(SplitSide::Right))
            }
            ToolAction::Page => self.open_with(ToolKind::Pager, None, None),
            ToolAction::FuzzyFind => self.fuzzy_find(),
            ToolAction::Grep => self.grep_or_help(keys),
            ToolAction::ToggleTerminal => self.toggle_terminal(),
        }
    }

    /// Opens the selected file with the tool of `kind`, optionally at `line` and
    /// optionally in a multiplexer split. The hand-off file is written first.
    fn open_with(
        &mut self,
        kind: ToolKind,
        line: Option<usize>,
        split: Option<SplitSide>,
    ) -> KeypressResult {
        let Some(entry) = self.snapshot.selected_entry().cloned() else {
            return KeypressResult::Continue;
        };
        if entry.is_dir() {
            self.push_message("Cannot open", DIRECTORY_GUARD);
            return KeypressResult::Consumed;
        }
        if matches!(entry.name_bytes(), b"." | b"..") {
            return KeypressResult::Consumed;
        }

        self.write_handoff();

        let tool = match self.dispatcher.resolve(kind) {
            Ok(tool) => tool,
            Err(e) => {
                self.report_dispatch_error(e);
                return KeypressResult::Consumed;
            }
        };

        let mut args: Vec<OsString> = Vec::with_capacity(2);
        if let Some(n) = line {
            args.push(format!("+{}", n).into());
        }
        args.push(entry.path().as_os_str().to_os_string());

        let cwd = self.snapshot.current_dir().to_path_buf();
        let res = self.in_foreground(|d| match split {
            Some(side) => d.run_in_split(&tool, &args, side, &cwd),
            None => d.run(&tool, &args),
        });
        self.finish_child(res)
    }

    /// Runs a dispatcher flow that hands the terminal to a child.
    ///
    /// The child shares burrow's process group, so SIGINT raised while it runs was
    /// typed at the child and must not end the session.
    pub(super) fn in_foreground<T>(&mut self, run: impl FnOnce(&mut Dispatcher) -> T) -> T {
        let _shield = self.signals.shield_interrupt();
        run(&mut self.dispatcher)
    }

    /// Reports a failed child and reloads the listing, which the child may have changed.
    fn finish_child(&mut self, res: Result<ChildReport, DispatchError>) -> KeypressResult {
        if let Err(e) = res.and_then(ChildReport::check) {
            self.report_dispatch_error(e);
        }
        self.reload_keep_selection();
        KeypressResult::OpenedChild
    }

    /// `?` on its own greps the selected file; `??` shows the key help.
    ///
    /// Waits at most the configured lookahead for the second key. A different key is
    /// queued and handled after the grep flow.
    fn grep_or_help(&mut self, keys: &mut dyn KeySource) -> KeypressResult {
        let window = self.config.input().lookahead();
        match keys.poll_key(window) {
            Ok(Some(next)) if plain_char(&next) == Some('?') => {
                self.overlays.push(Overlay::Help);
                return KeypressResult::Consumed;
            }
            Ok(Some(next)) => self.queued.push_back(next),
            Ok(None) => {}
            Err(e) => warn!("lookahead read failed: {}", e),
        }
        self.grep_search()
    }

    fn grep_search(&mut self) -> KeypressResult {
        let Some(entry) = self.snapshot.selected_entry().cloned() else {
            return KeypressResult::Continue;
        };
        if entry.is_dir() {
            self.push_message("Cannot search", DIRECTORY_GUARD);
            return KeypressResult::Consumed;
        }

        match self.in_foreground(|d| d.grep_select_line(entry.path())) {
            Ok(Some(line)) => {
                debug!("grep picked line {} of {}", line, entry.path().display());
                self.open_with(ToolKind::Editor, Some(line), None)
            }
            Ok(None) => {
                self.reload_keep_selection();
                KeypressResult::OpenedChild
            }
            Err(e) => {
                self.report_dispatch_error(e);
                KeypressResult::OpenedChild
            }
        }
    }

    /// Jumps to a path picked with the finder.
    ///
    /// A directory is entered. A file is focused in its parent, which is entered first
    /// when it is not the current directory.
    fn fuzzy_find(&mut self) -> KeypressResult {
        let cwd = self.snapshot.current_dir().to_path_buf();
        let picked = match self.in_foreground(|d| d.fuzzy_select_path(&cwd)) {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.reload_keep_selection();
                return KeypressResult::OpenedChild;
            }
            Err(e) => {
                self.report_dispatch_error(e);
                return KeypressResult::OpenedChild;
            }
        };

        debug!("finder picked {}", picked.display());
        if picked.is_dir() {
            self.load_dir(&picked, None);
        } else {
            self.focus_file(&cwd, &picked);
        }
        KeypressResult::OpenedChild
    }

    fn focus_file(&mut self, cwd: &Path, file: &Path) {
        let name = file.file_name();
        match file.parent() {
            Some(parent) if parent == cwd => self.reload(name),
            Some(parent) => self.load_dir(parent, name),
            None => self.reload_keep_selection(),
        }
    }

    fn toggle_terminal(&mut self) -> KeypressResult {
        let cwd = self.snapshot.current_dir().to_path_buf();
        match self.dispatcher.toggle_terminal(&cwd) {
            Ok(PaneToggle::Opened) => debug!("terminal pane opened"),
            Ok(PaneToggle::Closed) => debug!("terminal pane closed"),
            Err(e) => self.report_dispatch_error(e),
        }
        KeypressResult::Consumed
    }

    fn report_dispatch_error(&mut self, err: DispatchError) {
        warn!("{}", err);
        let title = match err {
            DispatchError::ToolNotFound(_) => "Missing tool",
            _ => "Error",
        };
        self.push_message(title, err.to_string());
    }

    // Quit

    pub(super) fn handle_sys_action(&mut self, action: SystemAction) -> KeypressResult {
        match action {
            SystemAction::Quit => KeypressResult::Quit,
            SystemAction::QuitWithCd => {
                let target = self.config.general().handoff_file();
                match write_handoff_file(target, self.snapshot.current_dir()) {
                    Ok(()) => KeypressResult::Quit,
                    Err(e) => {
                        let text = format!("Could not write {}: {}", target.display(), e);
                        self.push_message("Error", text);
                        KeypressResult::Consumed
                    }
                }
            }
        }
    }

    /// Best effort: a failed hand-off write must not block opening a file.
    fn write_handoff(&self) {
        let target = self.config.general().handoff_file();
        if let Err(e) = write_handoff_file(target, self.snapshot.current_dir()) {
            warn!("could not write hand-off file {}: {}", target.display(), e);
        }
    }
}
