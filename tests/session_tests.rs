//! Session key handling tests for burrow
//!
//! These drive a [Session] with synthetic key events: the sort/filter prefixes, the
//! lookahead after `?`, overlays, quitting with the hand-off file and shutdown.
//! No terminal is involved; the dispatcher runs with a no-op terminal driver.

use burrow_tui::app::{KeypressResult, PrefixState, Session};
use burrow_tui::config::Config;
use burrow_tui::core::formatter::{FilterSpec, SortKey, SortSpec};
use burrow_tui::core::mux::Multiplexer;
use burrow_tui::core::proc::{Dispatcher, ToolDefaults};
use burrow_tui::core::signals::SignalFlags;
use burrow_tui::core::terminal::{KeySource, NullDriver};
use burrow_tui::ui::overlays::Overlay;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Replays a fixed list of keys for lookahead reads, then reports none.
struct Scripted {
    keys: VecDeque<KeyEvent>,
    polls: Vec<Duration>,
}

impl Scripted {
    fn new(keys: &[KeyEvent]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            polls: Vec::new(),
        }
    }
}

impl KeySource for Scripted {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        self.polls.push(timeout);
        Ok(self.keys.pop_front())
    }
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn dispatcher(defaults: ToolDefaults) -> Dispatcher {
    Dispatcher::new(
        defaults,
        Box::new(NullDriver),
        Multiplexer::with_availability(false),
    )
}

fn session<'a>(config: &'a Config, dir: &Path) -> Result<Session<'a>, Box<dyn std::error::Error>> {
    Ok(Session::new(config, dir, dispatcher(ToolDefaults::default()), SignalFlags::new())?)
}

fn press(s: &mut Session, keys: &[char]) -> KeypressResult {
    let mut last = KeypressResult::Continue;
    for &c in keys {
        last = s.handle_keypress(key(c), &mut Scripted::new(&[]));
    }
    last
}

#[test]
fn sort_prefix_with_unknown_suffix_changes_nothing() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join("x"), "")?;
    let config = Config::default();
    let mut s = session(&config, dir.path())?;
    let before = s.sort();

    assert_eq!(press(&mut s, &['s']), KeypressResult::Consumed);
    assert_eq!(s.prefix_state(), PrefixState::AwaitingSortSuffix);
    assert_eq!(press(&mut s, &['x']), KeypressResult::Consumed);
    assert_eq!(s.prefix_state(), PrefixState::Idle);
    assert_eq!(s.sort(), before);

    // `j` after a failed prefix is a plain key again
    press(&mut s, &['s', 'q']);
    assert_eq!(s.sort(), before);
    assert_eq!(press(&mut s, &['j']), KeypressResult::Consumed);
    Ok(())
}

#[test]
fn sort_and_filter_suffixes_apply() -> TestResult {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("sub"))?;
    fs::write(dir.path().join("big"), vec![0u8; 64])?;
    fs::write(dir.path().join("small"), "1")?;
    let config = Config::default();
    let mut s = session(&config, dir.path())?;

    press(&mut s, &['s', 's']);
    assert_eq!(s.sort(), SortSpec::new(SortKey::Size, false));
    press(&mut s, &['s', 'r']);
    assert_eq!(s.sort(), SortSpec::new(SortKey::Size, true));
    let order: Vec<_> = s.snapshot().entries().iter().map(|e| e.name().to_owned()).collect();
    assert_eq!(order, ["sub", "big", "small"]);

    press(&mut s, &['f', 'd']);
    assert_eq!(s.filter(), &FilterSpec::DirectoriesOnly);
    assert_eq!(s.snapshot().len(), 1);

    press(&mut s, &['f', 'f']);
    assert_eq!(s.snapshot().len(), 2);

    s.handle_keypress(
        KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE),
        &mut Scripted::new(&[]),
    );
    s.handle_keypress(
        KeyEvent::new(KeyCode::Char('F'), KeyModifiers::SHIFT),
        &mut Scripted::new(&[]),
    );
    assert_eq!(s.filter(), &FilterSpec::All);
    assert_eq!(s.snapshot().len(), 3);
    Ok(())
}

#[test]
fn toggle_hidden_keeps_selection_by_name() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join(".a"), "")?;
    fs::write(dir.path().join("b"), "")?;
    fs::write(dir.path().join("c"), "")?;
    let config = Config::default();
    let mut s = session(&config, dir.path())?;

    press(&mut s, &['j']);
    assert_eq!(s.snapshot().selected_entry().map(|e| e.name().to_owned()), Some("c".into()));
    press(&mut s, &['h']);
    assert!(s.show_hidden());
    assert_eq!(s.snapshot().len(), 3);
    assert_eq!(s.snapshot().selected_entry().map(|e| e.name().to_owned()), Some("c".into()));
    Ok(())
}

#[test]
fn double_question_mark_shows_help() -> TestResult {
    let dir = tempdir()?;
    let config = Config::default();
    let mut s = session(&config, dir.path())?;

    let mut keys = Scripted::new(&[KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT)]);
    let res = s.handle_keypress(key('?'), &mut keys);
    assert_eq!(res, KeypressResult::Consumed);
    assert_eq!(s.overlays().top(), Some(&Overlay::Help));
    assert_eq!(keys.polls, [config.input().lookahead()]);
    assert_eq!(s.queued_keys(), 0);

    // any key closes the help and does nothing else
    assert_eq!(press(&mut s, &['q']), KeypressResult::Consumed);
    assert!(s.overlays().is_empty());
    Ok(())
}

#[test]
fn key_read_during_lookahead_is_pushed_back() -> TestResult {
    // an empty directory: grep has nothing to search, so no tool runs
    let dir = tempdir()?;
    let config = Config::default();
    let mut s = session(&config, dir.path())?;

    let mut keys = Scripted::new(&[key('j')]);
    s.handle_keypress(key('?'), &mut keys);
    assert!(s.overlays().is_empty());
    assert_eq!(s.queued_keys(), 1);
    assert_eq!(s.take_queued_key(), Some(key('j')));
    assert_eq!(s.take_queued_key(), None);
    Ok(())
}

#[test]
fn lookahead_window_comes_from_config() -> TestResult {
    let dir = tempdir()?;
    let config = Config::parse("[input]\nlookahead_ms = 99999\n")?;
    let mut s = session(&config, dir.path())?;

    let mut keys = Scripted::new(&[]);
    s.handle_keypress(key('?'), &mut keys);
    assert_eq!(keys.polls, [Duration::from_millis(2000)]);
    Ok(())
}

#[test]
fn missing_finder_reports_install_hint() -> TestResult {
    if std::env::var_os("BW_FINDER").is_some() {
        return Ok(());
    }
    let dir = tempdir()?;
    let config = Config::default();
    let defaults = ToolDefaults {
        finder: "bw-no-such-finder".to_string(),
        ..ToolDefaults::default()
    };
    let mut s = Session::new(
        &config,
        dir.path(),
        dispatcher(defaults),
        SignalFlags::new(),
    )?;

    press(&mut s, &['/']);
    match s.overlays().top() {
        Some(Overlay::Message { text, .. }) => {
            assert!(text.contains("bw-no-such-finder was not found in PATH"), "{text}");
        }
        other => panic!("expected a message, got {other:?}"),
    }
    Ok(())
}

#[test]
fn quit_with_cd_writes_handoff_file() -> TestResult {
    let dir = tempdir()?;
    let target = dir.path().join("lastdir");
    let work = dir.path().join("work dir");
    fs::create_dir(&work)?;
    let toml = format!(
        "[general]\nhandoff_file = \"{}\"\n",
        target.to_str().ok_or("non UTF-8 temp path")?
    );
    let config = Config::parse(&toml)?;
    let mut s = session(&config, &work)?;

    assert_eq!(press(&mut s, &['o']), KeypressResult::Quit);
    assert_eq!(fs::read(&target)?, work.canonicalize()?.as_os_str().as_encoded_bytes());
    Ok(())
}

#[test]
fn plain_quit_leaves_no_handoff_file() -> TestResult {
    let dir = tempdir()?;
    let target = dir.path().join("lastdir");
    let toml = format!(
        "[general]\nhandoff_file = \"{}\"\n",
        target.to_str().ok_or("non UTF-8 temp path")?
    );
    let config = Config::parse(&toml)?;
    let mut s = session(&config, dir.path())?;

    assert_eq!(press(&mut s, &['q']), KeypressResult::Quit);
    assert!(!target.exists());
    Ok(())
}

#[test]
fn shutdown_flag_ends_the_session() -> TestResult {
    let dir = tempdir()?;
    let config = Config::default();
    let signals = SignalFlags::new();
    let mut s = Session::new(
        &config,
        dir.path(),
        dispatcher(ToolDefaults::default()),
        signals.clone(),
    )?;

    assert!(!s.tick());
    signals.terminate_flag().store(true, Ordering::Relaxed);
    assert!(s.tick());
    Ok(())
}

#[test]
fn viewport_shrink_keeps_selection_visible() -> TestResult {
    let dir = tempdir()?;
    for i in 0..30 {
        fs::write(dir.path().join(format!("f{i:02}")), "")?;
    }
    let config = Config::default();
    let mut s = session(&config, dir.path())?;

    press(&mut s, &['G']);
    assert_eq!(s.snapshot().selected_idx(), 29);
    s.set_viewport_height(5);
    let snap = s.snapshot();
    assert!(snap.scroll_offset() <= 29 && 29 < snap.scroll_offset() + 5);
    Ok(())
}
