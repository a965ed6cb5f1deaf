//! Dialog primitives shared by the draw functions in [draw].
//!
//! A dialog is a bordered box placed relative to the frame by a [DialogPosition] and a
//! [DialogSize]. The area underneath is cleared before drawing.

pub mod draw;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPosition {
    Center,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogSize {
    /// Prompt-sized: 60% of the width, 3 rows.
    Small,
    Custom(u16, u16),
}

pub struct DialogStyle<'a> {
    pub border: Borders,
    pub border_style: Style,
    pub title: Option<Span<'a>>,
}

pub struct DialogLayout {
    pub area: Rect,
    pub position: DialogPosition,
    pub size: DialogSize,
}

/// Computes the rectangle of a dialog inside `area`, clamped to it.
pub fn dialog_area(area: Rect, size: DialogSize, position: DialogPosition) -> Rect {
    let (w, h) = match size {
        DialogSize::Small => ((area.width as u32 * 60 / 100) as u16, 3),
        DialogSize::Custom(w, h) => (w, h),
    };
    let w = w.clamp(1, area.width.max(1));
    let h = h.clamp(1, area.height.max(1));

    let (x, y) = match position {
        DialogPosition::Center => (
            area.x + (area.width.saturating_sub(w)) / 2,
            area.y + (area.height.saturating_sub(h)) / 2,
        ),
        DialogPosition::BottomRight => (
            area.x + area.width.saturating_sub(w),
            area.y + area.height.saturating_sub(h),
        ),
    };
    Rect::new(x, y, w, h)
}

/// Clears the dialog area and draws `content` inside a bordered block. Returns the area.
pub fn draw_dialog<'a, T>(
    frame: &mut Frame,
    layout: DialogLayout,
    style: &DialogStyle<'a>,
    content: T,
    alignment: Option<Alignment>,
) -> Rect
where
    T: Into<Text<'a>>,
{
    let rect = dialog_area(layout.area, layout.size, layout.position);
    frame.render_widget(Clear, rect);

    let mut block = Block::default()
        .borders(style.border)
        .border_style(style.border_style);
    if let Some(title) = &style.title {
        block = block.title(title.clone());
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(alignment.unwrap_or(Alignment::Left));
    frame.render_widget(paragraph, rect);
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_area_is_clamped_to_frame() {
        let frame = Rect::new(0, 0, 20, 5);
        let r = dialog_area(frame, DialogSize::Custom(50, 50), DialogPosition::Center);
        assert_eq!(r, frame);

        let r = dialog_area(frame, DialogSize::Custom(6, 2), DialogPosition::BottomRight);
        assert_eq!(r, Rect::new(14, 3, 6, 2));

        let r = dialog_area(frame, DialogSize::Small, DialogPosition::Center);
        assert_eq!((r.width, r.height), (12, 3));
    }
}
