//! Draw functions for the popups: prompt input, messages and the key help.
//!
//! They read the [Session] and never change it.

use crate::app::Session;
use crate::app::actions::{ActionMode, InputMode};
use crate::ui::widgets::{DialogLayout, DialogPosition, DialogSize, DialogStyle, draw_dialog};
use crate::utils::cli::KEYBINDS_TEXT;

use ratatui::{
    Frame,
    layout::{Alignment, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Borders,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MESSAGE_FOOTER: &str = "Press any key";

/// Draws the open prompt. Text prompts get an input line with the terminal cursor in it,
/// the delete confirmation only shows its question.
pub(crate) fn draw_input_dialog(frame: &mut Frame, session: &Session, accent: Style) {
    let ActionMode::Input { mode, prompt } = session.actions().mode() else {
        return;
    };
    let area = frame.area();

    if *mode == InputMode::ConfirmDelete {
        let width = (prompt.width() as u16 + 4).max(30);
        let red = Style::default().fg(Color::Red);
        draw_dialog(
            frame,
            DialogLayout {
                area,
                position: DialogPosition::Center,
                size: DialogSize::Custom(width, 3),
            },
            &DialogStyle {
                border: Borders::ALL,
                border_style: red,
                title: Some(Span::styled(" Confirm Delete ", red)),
            },
            Line::raw(prompt.as_str()),
            Some(Alignment::Center),
        );
        return;
    }

    let style = DialogStyle {
        border: Borders::ALL,
        border_style: accent,
        title: Some(Span::styled(format!(" {} ", prompt.trim()), accent)),
    };

    let rect = crate::ui::widgets::dialog_area(area, DialogSize::Small, DialogPosition::Center);
    let visible_width = rect.width.saturating_sub(2) as usize;
    let (visible, cursor_offset) = input_field_view(
        session.actions().input_buffer(),
        session.actions().input_cursor_pos(),
        visible_width.saturating_sub(1),
    );

    let rect = draw_dialog(
        frame,
        DialogLayout {
            area,
            position: DialogPosition::Center,
            size: DialogSize::Small,
        },
        &style,
        Line::raw(visible),
        Some(Alignment::Left),
    );
    frame.set_cursor_position(Position::new(
        rect.x + 1 + cursor_offset as u16,
        rect.y + 1,
    ));
}

/// Message popup at the bottom right. It stays until the next key.
pub(crate) fn draw_message_overlay(frame: &mut Frame, title: &str, text: &str, accent: Style) {
    let area = frame.area();

    let mut lines: Vec<Line> = text.lines().map(Line::raw).collect();
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        MESSAGE_FOOTER,
        Style::default().add_modifier(Modifier::DIM),
    ));

    let widest = text
        .lines()
        .map(UnicodeWidthStr::width)
        .chain(std::iter::once(MESSAGE_FOOTER.width()))
        .max()
        .unwrap_or(0);
    let min_width = 27;
    let width = ((widest + 2).max(min_width) + 2).min(area.width as usize) as u16;
    let height = (lines.len() + 2).min(area.height as usize) as u16;

    draw_dialog(
        frame,
        DialogLayout {
            area,
            position: DialogPosition::BottomRight,
            size: DialogSize::Custom(width, height),
        },
        &DialogStyle {
            border: Borders::ALL,
            border_style: accent,
            title: Some(Span::styled(format!(" {} ", title), accent)),
        },
        Text::from(lines),
        Some(Alignment::Left),
    );
}

pub(crate) fn draw_keybind_help(frame: &mut Frame, accent: Style) {
    let area = frame.area();
    let size = DialogSize::Custom(
        area.width.saturating_sub(6).clamp(40, 90),
        area.height.saturating_sub(4).clamp(12, 30),
    );

    let lines: Vec<Line> = KEYBINDS_TEXT
        .lines()
        .map(|l| {
            if !l.is_empty() && !l.starts_with(' ') {
                Line::styled(l, accent.add_modifier(Modifier::BOLD))
            } else {
                Line::raw(l)
            }
        })
        .collect();

    draw_dialog(
        frame,
        DialogLayout {
            area,
            position: DialogPosition::Center,
            size,
        },
        &DialogStyle {
            border: Borders::ALL,
            border_style: accent,
            title: Some(Span::styled(" Keybinds ", accent)),
        },
        Text::from(lines),
        Some(Alignment::Left),
    );
}

/// Helper function to calculate cursor offset for cursor moving
/// Handles horizontal truncation, variable width with unicode_width and clamps cursor to buffer.
fn input_field_view(input_text: &str, cursor_pos: usize, visible_width: usize) -> (&str, usize) {
    let cursor_pos = cursor_pos.min(input_text.len());
    if input_text.width() <= visible_width {
        return (input_text, input_text[..cursor_pos].width());
    }

    // show the tail that fits, ending at the cursor
    let mut current_w = 0;
    let mut start = cursor_pos;
    for (idx, ch) in input_text[..cursor_pos].char_indices().rev() {
        current_w += ch.width().unwrap_or(0);
        if current_w > visible_width {
            break;
        }
        start = idx;
    }

    let tail = &input_text[start..];
    (tail, input_text[start..cursor_pos].width())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_view_fits_without_scrolling() {
        assert_eq!(input_field_view("abc", 2, 10), ("abc", 2));
    }

    #[test]
    fn input_view_keeps_cursor_visible() {
        let text = "abcdefghij";
        let (view, offset) = input_field_view(text, text.len(), 4);
        assert_eq!(view, "ghij");
        assert_eq!(offset, 4);

        let (view, offset) = input_field_view(text, 2, 4);
        assert_eq!(view, text);
        assert_eq!(offset, 2);
    }
}
