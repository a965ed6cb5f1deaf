//! UI renderer implementation.
//!
//! Contains the top-level `render` entry point used by the terminal loop. The screen is
//! a path header, the listing, a status bar and a key help line, with popups drawn on top.
//!
//! This module stays "pure rendering" apart from reporting the listing height back to
//! the [Session].

use crate::app::{PrefixState, Session};
use crate::core::fm::Entry;
use crate::core::formatter::format_entry_size;
use crate::ui::icons::EntryTag;
use crate::ui::overlays::Overlay;
use crate::ui::widgets::draw;
use crate::utils::shorten_home_path;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const HELP_LINE: &str =
    "j/k move  l enter  Backspace up  n/N new  r rename  d delete  e edit  / find  ?? help  q quit";

/// Renders the whole UI for one frame.
pub fn render(frame: &mut Frame, session: &mut Session) {
    let [header, list, status, help] = layout_chunks(frame.area());
    session.set_viewport_height(list.height as usize);
    let session = &*session;

    let accent = Style::default().fg(Color::Cyan);

    draw_header(frame, header, session, accent);
    draw_list(frame, list, session);
    draw_status_bar(frame, status, session);
    frame.render_widget(
        Paragraph::new(Line::styled(HELP_LINE, Style::default().add_modifier(Modifier::DIM))),
        help,
    );

    if session.actions().is_input_mode() {
        draw::draw_input_dialog(frame, session, accent);
    }

    match session.overlays().top() {
        Some(Overlay::Message { title, text }) => {
            draw::draw_message_overlay(frame, title, text, Style::default().fg(Color::Red))
        }
        Some(Overlay::Help) => draw::draw_keybind_help(frame, accent),
        None => {}
    }
}

/// Header, listing, status bar and help line. The listing gets at least one row.
pub fn layout_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

fn draw_header(frame: &mut Frame, area: Rect, session: &Session, accent: Style) {
    let path = shorten_home_path(session.current_dir());
    let line = Line::from(Span::styled(path, accent.add_modifier(Modifier::BOLD)));
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_list(frame: &mut Frame, area: Rect, session: &Session) {
    let snapshot = session.snapshot();
    if snapshot.is_empty() {
        let msg = Line::styled("(empty)", Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(Paragraph::new(msg), area);
        return;
    }

    let icons = session.config().general().icons();
    let width = area.width as usize;
    let items: Vec<ListItem> = snapshot
        .visible(area.height as usize)
        .iter()
        .map(|entry| ListItem::new(entry_line(entry, width, icons)))
        .collect();

    let mut state = ListState::default();
    state.select(Some(
        snapshot.selected_idx().saturating_sub(snapshot.scroll_offset()),
    ));

    let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

/// One listing row: icon, name (directories get a trailing `/`) and the right-aligned size.
pub fn entry_line(entry: &Entry, width: usize, icons: bool) -> Line<'static> {
    let tag = EntryTag::of(entry);
    let name_style = match tag {
        EntryTag::Directory => Style::default().fg(tag.color()).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(tag.color()),
    };

    let mut name = sanitize(&entry.name().to_string_lossy());
    if entry.is_dir() {
        name.push('/');
    }
    let size = format_entry_size(entry);

    let icon = if icons {
        format!("{} ", tag.icon())
    } else {
        String::new()
    };
    let fixed = icon.width() + size.width() + 1;
    let name = fit_to_width(&name, width.saturating_sub(fixed));
    let pad = width.saturating_sub(fixed + name.width());

    Line::from(vec![
        Span::styled(icon, Style::default().fg(tag.color())),
        Span::styled(name, name_style),
        Span::raw(" ".repeat(pad + 1)),
        Span::raw(size),
    ])
}

fn draw_status_bar(frame: &mut Frame, area: Rect, session: &Session) {
    let snapshot = session.snapshot();
    let position = if snapshot.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", snapshot.selected_idx() + 1, snapshot.len())
    };

    let mut left = format!(
        "Hidden:{}  Sort:{}  Filter:{}",
        if session.show_hidden() { "ON" } else { "OFF" },
        session.sort(),
        session.filter(),
    );
    if session.prefix_state() != PrefixState::Idle {
        left.push_str("  [prefix]");
    }

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    frame.render_widget(Paragraph::new(Line::styled(left, style)).style(style), area);
    frame.render_widget(
        Paragraph::new(Line::styled(position, style)).alignment(Alignment::Right),
        area,
    );
}

/// Replaces control characters so a file name can never move the cursor.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

/// Cuts `s` to at most `width` columns, marking a cut with `~`.
pub fn fit_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('~');
    out
}
