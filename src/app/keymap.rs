//! Key mapping and the sort/filter prefix machine for burrow
//!
//! [Keymap] maps single keys to actions and is built from the `[keys]` config table.
//! [CommandPrefix] handles the two-key commands `s<key>` (sort) and `f<key>` (filter).

use crate::config::Keys;
use crate::core::formatter::SortKey;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Represents any single-key action in the app.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Nav(NavAction),
    File(FileAction),
    Tool(ToolAction),
    System(SystemAction),
}

/// Navigation actions (move, enter, parent, hidden toggle)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavAction {
    GoUp,
    GoDown,
    GoToTop,
    GoToBottom,
    GoIntoDir,
    GoParent,
    ToggleHidden,
}

/// File actions (create, rename, delete)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileAction {
    Create,
    CreateDirectory,
    Rename,
    Delete,
}

/// Actions that hand off to an external program
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToolAction {
    Edit,
    EditInSplit,
    Page,
    FuzzyFind,
    /// `?`; a second `?` right after it shows the help instead.
    Grep,
    ToggleTerminal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SystemAction {
    Quit,
    QuitWithCd,
}

/// Key + modifiers as used in keybind/keymap
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

/// Stores the mapping from Key to action, which is built from the config
#[derive(Debug)]
pub struct Keymap {
    map: HashMap<Key, Action>,
}

impl Keymap {
    #[rustfmt::skip]
    pub fn from_keys(keys: &Keys) -> Self {
        let mut map = HashMap::new();

        macro_rules! bind {
            ($keys:expr, $action:expr) => {
                bind($keys, $action, &mut map);
            };
        }

        use NavAction as N;
        use FileAction as F;
        use ToolAction as T;
        use SystemAction as S;

        // NavActions
        bind!(keys.go_up(),             Action::Nav(N::GoUp));
        bind!(keys.go_down(),           Action::Nav(N::GoDown));
        bind!(keys.go_to_top(),         Action::Nav(N::GoToTop));
        bind!(keys.go_to_bottom(),      Action::Nav(N::GoToBottom));
        bind!(keys.go_into_dir(),       Action::Nav(N::GoIntoDir));
        bind!(keys.go_parent(),         Action::Nav(N::GoParent));
        bind!(keys.toggle_hidden(),     Action::Nav(N::ToggleHidden));

        // FileActions
        bind!(keys.create(),            Action::File(F::Create));
        bind!(keys.create_directory(),  Action::File(F::CreateDirectory));
        bind!(keys.rename(),            Action::File(F::Rename));
        bind!(keys.delete(),            Action::File(F::Delete));

        // ToolActions
        bind!(keys.edit(),              Action::Tool(T::Edit));
        bind!(keys.edit_in_split(),     Action::Tool(T::EditInSplit));
        bind!(keys.pager(),             Action::Tool(T::Page));
        bind!(keys.find(),              Action::Tool(T::FuzzyFind));
        bind!(keys.grep(),              Action::Tool(T::Grep));
        bind!(keys.toggle_terminal(),   Action::Tool(T::ToggleTerminal));

        // SystemActions
        bind!(keys.quit_with_cd(),      Action::System(S::QuitWithCd));
        bind!(keys.quit(),              Action::System(S::Quit));

        Keymap { map }
    }

    /// Looks up the action for a given key event
    pub fn lookup(&self, key: KeyEvent) -> Option<Action> {
        let k = Key {
            code: key.code,
            modifiers: key.modifiers,
        };

        if let Some(action) = self.map.get(&k).copied() {
            return Some(action);
        }

        // Terminals disagree on whether `G` or `?` carry SHIFT.
        if matches!(key.code, KeyCode::Char(_)) && key.modifiers.contains(KeyModifiers::SHIFT) {
            let k2 = Key {
                code: key.code,
                modifiers: key.modifiers - KeyModifiers::SHIFT,
            };
            return self.map.get(&k2).copied();
        }
        None
    }
}

/// Suffix commands after `s`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortCommand {
    By(SortKey),
    ToggleReverse,
}

/// Suffix commands after `f`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterCommand {
    FilesOnly,
    DirectoriesOnly,
    Clear,
    PromptContains,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PrefixState {
    #[default]
    Idle,
    AwaitingSortSuffix,
    AwaitingFilterSuffix,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixOutcome {
    /// The key started a prefix; the next key completes it.
    Started(PrefixState),
    Sort(SortCommand),
    Filter(FilterCommand),
    /// A pending prefix got a suffix it does not know. The key is swallowed.
    Unrecognized,
    /// Not a prefix key and no prefix pending; the keymap decides.
    Passthrough,
}

/// The `s`/`f` prefix state machine. Whatever key follows a prefix, the state is
/// back to `Idle` afterwards.
#[derive(Debug, Default)]
pub struct CommandPrefix {
    state: PrefixState,
}

impl CommandPrefix {
    #[inline]
    pub fn state(&self) -> PrefixState {
        self.state
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state != PrefixState::Idle
    }

    pub fn feed(&mut self, key: &KeyEvent) -> PrefixOutcome {
        let ch = plain_char(key);
        match std::mem::take(&mut self.state) {
            PrefixState::Idle => match ch {
                Some('s') => {
                    self.state = PrefixState::AwaitingSortSuffix;
                    PrefixOutcome::Started(self.state)
                }
                Some('f') => {
                    self.state = PrefixState::AwaitingFilterSuffix;
                    PrefixOutcome::Started(self.state)
                }
                _ => PrefixOutcome::Passthrough,
            },
            PrefixState::AwaitingSortSuffix => match ch {
                Some('n') => PrefixOutcome::Sort(SortCommand::By(SortKey::Name)),
                Some('s') => PrefixOutcome::Sort(SortCommand::By(SortKey::Size)),
                Some('t') => PrefixOutcome::Sort(SortCommand::By(SortKey::Modified)),
                Some('e') => PrefixOutcome::Sort(SortCommand::By(SortKey::Extension)),
                Some('r') => PrefixOutcome::Sort(SortCommand::ToggleReverse),
                _ => PrefixOutcome::Unrecognized,
            },
            PrefixState::AwaitingFilterSuffix => match ch {
                Some('f') => PrefixOutcome::Filter(FilterCommand::FilesOnly),
                Some('d') => PrefixOutcome::Filter(FilterCommand::DirectoriesOnly),
                Some('F') => PrefixOutcome::Filter(FilterCommand::Clear),
                Some('c') => PrefixOutcome::Filter(FilterCommand::PromptContains),
                _ => PrefixOutcome::Unrecognized,
            },
        }
    }
}

/// The character of a key pressed without Ctrl/Alt. Shift is allowed since it is
/// already reflected in the character.
pub fn plain_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if (key.modifiers - KeyModifiers::SHIFT).is_empty() => Some(c),
        _ => None,
    }
}

/// Parses a key description such as `j`, `Up`, `Ctrl+c`, `<c-x>` or `F2`.
pub fn parse_key(s: &str) -> Option<Key> {
    let mut modifiers = KeyModifiers::NONE;
    let mut code: Option<KeyCode> = None;

    // Single characters are taken literally, so "+" and "-" can be bound.
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key {
            code: KeyCode::Char(c),
            modifiers,
        });
    }

    let is_bracketed = s.starts_with('<') && s.ends_with('>');
    let mut input = s.trim_start_matches('<').trim_end_matches('>').to_string();

    if is_bracketed && input.contains('-') {
        let parts: Vec<&str> = input.split('-').collect();

        for &prefix in parts.iter().take(parts.len().saturating_sub(1)) {
            match prefix.to_lowercase().as_str() {
                "c" | "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "a" | "m" | "alt" => modifiers |= KeyModifiers::ALT,
                "s" | "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }
        input = parts.last()?.to_string();
    }

    for part in input.split('+') {
        let p_low = part.to_lowercase();
        match p_low.as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" | "meta" => modifiers |= KeyModifiers::ALT,
            "shift" => modifiers |= KeyModifiers::SHIFT,

            "up" => code = Some(KeyCode::Up),
            "down" => code = Some(KeyCode::Down),
            "left" => code = Some(KeyCode::Left),
            "right" => code = Some(KeyCode::Right),
            "enter" => code = Some(KeyCode::Enter),
            "esc" => code = Some(KeyCode::Esc),
            "backspace" | "back" => code = Some(KeyCode::Backspace),
            "tab" => code = Some(KeyCode::Tab),
            "space" | "spc" => code = Some(KeyCode::Char(' ')),

            _ => {
                let mut part_chars = part.chars();
                if let (Some(c), None) = (part_chars.next(), part_chars.next()) {
                    let c = if modifiers.contains(KeyModifiers::SHIFT) {
                        modifiers -= KeyModifiers::SHIFT;
                        c.to_ascii_uppercase()
                    } else {
                        c
                    };
                    code = Some(KeyCode::Char(c));
                } else if p_low.starts_with('f')
                    && p_low.len() > 1
                    && p_low[1..].chars().all(|c| c.is_ascii_digit())
                {
                    let n = p_low[1..].parse().ok()?;
                    code = Some(KeyCode::F(n));
                } else if part.is_empty() {
                    continue;
                } else {
                    return None;
                }
            }
        }
    }

    Some(Key {
        code: code?,
        modifiers,
    })
}

fn bind(key_list: &[String], action: Action, map: &mut HashMap<Key, Action>) {
    for k in key_list {
        match parse_key(k) {
            Some(key) => {
                map.insert(key, action);
            }
            None => log::warn!("ignoring unknown key binding {:?}", k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn parse_key_forms() {
        assert_eq!(
            parse_key("Ctrl+c"),
            Some(Key {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL
            })
        );
        assert_eq!(parse_key("<c-x>"), parse_key("ctrl+x"));
        assert_eq!(parse_key("Shift+n"), parse_key("N"));
        assert_eq!(parse_key("Up").map(|k| k.code), Some(KeyCode::Up));
        assert_eq!(parse_key("F5").map(|k| k.code), Some(KeyCode::F(5)));
        assert_eq!(parse_key("?").map(|k| k.code), Some(KeyCode::Char('?')));
        assert_eq!(parse_key("+").map(|k| k.code), Some(KeyCode::Char('+')));
        assert_eq!(parse_key("Hyper+x"), None);
    }

    #[test]
    fn default_keymap_lookup() {
        let keymap = Keymap::from_keys(&Keys::default());
        assert_eq!(keymap.lookup(key('j')), Some(Action::Nav(NavAction::GoDown)));
        assert_eq!(
            keymap.lookup(KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(Action::Nav(NavAction::GoToBottom))
        );
        assert_eq!(
            keymap.lookup(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(Action::Tool(ToolAction::Grep))
        );
        assert_eq!(
            keymap.lookup(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(Action::Nav(NavAction::GoParent))
        );
        assert_eq!(keymap.lookup(key('z')), None);
    }

    #[test]
    fn sort_suffixes() {
        let mut prefix = CommandPrefix::default();
        assert_eq!(
            prefix.feed(&key('s')),
            PrefixOutcome::Started(PrefixState::AwaitingSortSuffix)
        );
        assert!(prefix.is_pending());
        assert_eq!(
            prefix.feed(&key('t')),
            PrefixOutcome::Sort(SortCommand::By(SortKey::Modified))
        );
        assert_eq!(prefix.state(), PrefixState::Idle);

        prefix.feed(&key('s'));
        assert_eq!(prefix.feed(&key('r')), PrefixOutcome::Sort(SortCommand::ToggleReverse));
    }

    #[test]
    fn filter_suffixes_are_case_sensitive() {
        let mut prefix = CommandPrefix::default();
        prefix.feed(&key('f'));
        assert_eq!(
            prefix.feed(&KeyEvent::new(KeyCode::Char('F'), KeyModifiers::SHIFT)),
            PrefixOutcome::Filter(FilterCommand::Clear)
        );
        prefix.feed(&key('f'));
        assert_eq!(prefix.feed(&key('f')), PrefixOutcome::Filter(FilterCommand::FilesOnly));
        prefix.feed(&key('f'));
        assert_eq!(prefix.feed(&key('D')), PrefixOutcome::Unrecognized);
    }

    #[test]
    fn unknown_suffix_returns_to_idle_without_reinterpreting() {
        let mut prefix = CommandPrefix::default();
        prefix.feed(&key('s'));
        // `f` would start a filter prefix from Idle, but here it is only a bad suffix.
        assert_eq!(prefix.feed(&key('f')), PrefixOutcome::Unrecognized);
        assert_eq!(prefix.state(), PrefixState::Idle);
        assert_eq!(prefix.feed(&key('j')), PrefixOutcome::Passthrough);

        prefix.feed(&key('s'));
        let ctrl_n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert_eq!(prefix.feed(&ctrl_n), PrefixOutcome::Unrecognized);
    }
}
