//! Action context and input mode logic for burrow.
//!
//! Contains the [ActionContext] struct, which tracks the modal prompt burrow shows for
//! create, rename, delete confirmation and the name filter, together with its input
//! buffer and cursor.

use unicode_width::UnicodeWidthStr;

/// Describes the current mode for action handling/input.
///
/// Variants:
/// * `Normal` - Default browsing mode.
/// * `Input` - A prompt with a specific [InputMode] and prompt string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionMode {
    Normal,
    Input { mode: InputMode, prompt: String },
}

/// Enumerates all the available prompts
///
/// Variants:
/// * `NewFile` - Create new file prompt.
/// * `NewDirectory` - Create new directory prompt.
/// * `Rename` - Rename the selected entry, pre-filled with its name.
/// * `FilterContains` - Name substring filter prompt.
/// * `ConfirmDelete` - Yes/no confirmation before deleting the selected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    NewFile,
    NewDirectory,
    Rename,
    FilterContains,
    ConfirmDelete,
}

/// Tracks the current prompt and its input buffer.
///
/// The cursor is a byte offset into the buffer and always sits on a char boundary.
#[derive(Debug)]
pub struct ActionContext {
    mode: ActionMode,
    input_buffer: String,
    input_cursor_pos: usize,
}

impl ActionContext {
    // Getters / accessors

    pub fn mode(&self) -> &ActionMode {
        &self.mode
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn input_cursor_pos(&self) -> usize {
        self.input_cursor_pos
    }

    /// Display column of the cursor, for placing the terminal cursor.
    pub fn input_cursor_column(&self) -> usize {
        self.input_buffer[..self.input_cursor_pos].width()
    }

    // Mode functions

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, ActionMode::Input { .. })
    }

    pub fn input_mode(&self) -> Option<InputMode> {
        match &self.mode {
            ActionMode::Input { mode, .. } => Some(*mode),
            ActionMode::Normal => None,
        }
    }

    pub fn enter_mode(&mut self, mode: ActionMode, initial_value: String) {
        self.mode = mode;
        self.input_buffer = initial_value;
        self.input_cursor_pos = self.input_buffer.len();
    }

    pub fn exit_mode(&mut self) {
        self.mode = ActionMode::Normal;
        self.input_buffer.clear();
        self.input_cursor_pos = 0;
    }

    /// Leaves the prompt and returns its trimmed input. Empty input is `None`.
    pub fn take_input(&mut self) -> Option<String> {
        let value = self.input_buffer.trim().to_string();
        self.exit_mode();
        if value.is_empty() { None } else { Some(value) }
    }

    // Cursor actions

    /// Moves the input cursor one character to the left, if possible.
    pub fn action_move_cursor_left(&mut self) {
        if let Some((previous, _)) = self.input_buffer[..self.input_cursor_pos]
            .char_indices()
            .next_back()
        {
            self.input_cursor_pos = previous;
        }
    }

    /// Moves the input cursor one character to the right, if possible.
    pub fn action_move_cursor_right(&mut self) {
        if let Some(ch) = self.input_buffer[self.input_cursor_pos..].chars().next() {
            self.input_cursor_pos += ch.len_utf8();
        }
    }

    pub fn action_insert_at_cursor(&mut self, ch: char) {
        self.input_buffer.insert(self.input_cursor_pos, ch);
        self.input_cursor_pos += ch.len_utf8();
    }

    /// Deletes the character before the cursor and moves the cursor back.
    pub fn action_backspace_at_cursor(&mut self) {
        if let Some((previous, _)) = self.input_buffer[..self.input_cursor_pos]
            .char_indices()
            .next_back()
        {
            self.input_buffer.remove(previous);
            self.input_cursor_pos = previous;
        }
    }

    /// Deletes the character under the cursor.
    pub fn action_delete_at_cursor(&mut self) {
        if self.input_cursor_pos < self.input_buffer.len() {
            self.input_buffer.remove(self.input_cursor_pos);
        }
    }

    pub fn action_cursor_home(&mut self) {
        self.input_cursor_pos = 0;
    }

    pub fn action_cursor_end(&mut self) {
        self.input_cursor_pos = self.input_buffer.len();
    }
}

impl Default for ActionContext {
    fn default() -> Self {
        Self {
            mode: ActionMode::Normal,
            input_buffer: String::new(),
            input_cursor_pos: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(initial: &str) -> ActionContext {
        let mut ctx = ActionContext::default();
        ctx.enter_mode(
            ActionMode::Input {
                mode: InputMode::Rename,
                prompt: "Rename: ".into(),
            },
            initial.to_string(),
        );
        ctx
    }

    #[test]
    fn cursor_moves_over_multibyte_chars() {
        let mut ctx = prompt("añb");
        assert_eq!(ctx.input_cursor_pos(), 4);
        ctx.action_move_cursor_left();
        assert_eq!(ctx.input_cursor_pos(), 3);
        ctx.action_move_cursor_left();
        assert_eq!(ctx.input_cursor_pos(), 1);
        ctx.action_move_cursor_right();
        assert_eq!(ctx.input_cursor_pos(), 3);
        ctx.action_backspace_at_cursor();
        assert_eq!(ctx.input_buffer(), "ab");
        assert_eq!(ctx.input_cursor_pos(), 1);
    }

    #[test]
    fn insert_and_delete_in_the_middle() {
        let mut ctx = prompt("ac");
        ctx.action_cursor_home();
        ctx.action_move_cursor_right();
        ctx.action_insert_at_cursor('🦀');
        assert_eq!(ctx.input_buffer(), "a🦀c");
        assert_eq!(ctx.input_cursor_column(), 3);
        ctx.action_delete_at_cursor();
        assert_eq!(ctx.input_buffer(), "a🦀");
        ctx.action_cursor_end();
        ctx.action_move_cursor_right();
        assert_eq!(ctx.input_cursor_pos(), ctx.input_buffer().len());
    }

    #[test]
    fn take_input_trims_and_treats_blank_as_cancel() {
        let mut ctx = prompt("  notes.txt ");
        assert_eq!(ctx.input_mode(), Some(InputMode::Rename));
        assert_eq!(ctx.take_input().as_deref(), Some("notes.txt"));
        assert!(!ctx.is_input_mode());

        let mut ctx = prompt("   ");
        assert_eq!(ctx.take_input(), None);
    }
}
