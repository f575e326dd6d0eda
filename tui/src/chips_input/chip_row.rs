//! Layout and drawing of the inline chip row.
//!
//! The row is laid out on a virtual line (chips, the `+N` trigger, then the text field) and drawn
//! through a horizontal scroll offset that keeps the end of the line, and the cursor, in view.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::hit_map::HitMap;
use super::hit_map::HitTarget;

pub(crate) const REMOVE_GLYPH: &str = "×";

fn chip_style() -> Style {
    Style::default().reversed()
}

fn trigger_style() -> Style {
    Style::default().cyan().bold()
}

#[derive(Debug, Clone)]
struct RowSegment {
    text: String,
    style: Style,
    target: Option<HitTarget>,
}

impl RowSegment {
    fn plain(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            target: None,
        }
    }

    fn targeted(text: impl Into<String>, style: Style, target: HitTarget) -> Self {
        Self {
            text: text.into(),
            style,
            target: Some(target),
        }
    }

    fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChipRow {
    segments: Vec<RowSegment>,
    /// Virtual column where the text field starts.
    input_start: usize,
    /// Virtual column of the text cursor.
    cursor: usize,
    /// Virtual width of the whole line, including one cell for the cursor.
    total: usize,
}

impl ChipRow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, segment: RowSegment) {
        self.input_start += segment.width();
        self.segments.push(segment);
    }

    /// `email ×` with the remove affordance for store index `index`.
    pub(crate) fn push_chip(&mut self, index: usize, email: &str) {
        let style = chip_style();
        self.push(RowSegment::plain(format!(" {email} "), style));
        self.push(RowSegment::targeted(
            REMOVE_GLYPH,
            style.bold(),
            HitTarget::RemoveVisible(index),
        ));
        self.push(RowSegment::plain(" ", style));
        self.push(RowSegment::plain(" ", Style::default()));
    }

    pub(crate) fn push_trigger(&mut self, label: &str) {
        self.push(RowSegment::targeted(
            format!(" {label} "),
            trigger_style(),
            HitTarget::OverflowTrigger,
        ));
        self.push(RowSegment::plain(" ", Style::default()));
    }

    /// Finish the line with the text field. `placeholder` is drawn when `text` is empty but never
    /// affects scrolling.
    pub(crate) fn finish_with_input(
        mut self,
        text: &str,
        cursor_column: usize,
        placeholder: Option<&str>,
    ) -> Self {
        let text_width = UnicodeWidthStr::width(text);
        self.cursor = self.input_start + cursor_column;
        self.total = self.input_start + text_width + 1;
        let segment = match placeholder {
            Some(placeholder) if text.is_empty() => {
                RowSegment::targeted(placeholder, Style::default().dim(), HitTarget::Input)
            }
            _ => RowSegment::targeted(text, Style::default(), HitTarget::Input),
        };
        self.segments.push(segment);
        self
    }

    /// Pin the end of the line to the right edge, unless that would hide the cursor.
    pub(crate) fn scroll_offset(&self, width: u16) -> usize {
        let offset = self.total.saturating_sub(usize::from(width));
        offset.min(self.cursor)
    }

    pub(crate) fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.is_empty() {
            return None;
        }
        let column = self.cursor - self.scroll_offset(area.width);
        let column = u16::try_from(column).ok()?.min(area.width.saturating_sub(1));
        Some((area.x + column, area.y))
    }

    pub(crate) fn render(&self, area: Rect, buf: &mut Buffer, hit_map: &mut HitMap) {
        if area.is_empty() {
            return;
        }
        let offset = self.scroll_offset(area.width);
        let visible_end = offset + usize::from(area.width);
        let screen_x = |virtual_x: usize| area.x + (virtual_x - offset) as u16;

        let mut vx = 0usize;
        for segment in &self.segments {
            let start = vx;
            for grapheme in segment.text.graphemes(true) {
                let width = UnicodeWidthStr::width(grapheme);
                if width > 0 && vx >= offset && vx + width <= visible_end {
                    buf.set_string(screen_x(vx), area.y, grapheme, segment.style);
                }
                vx += width;
            }

            let Some(target) = segment.target else {
                continue;
            };
            if target == HitTarget::OverflowTrigger {
                hit_map.set_trigger_left(i32::from(area.x) + start as i32 - offset as i32);
            }
            let lo = start.max(offset);
            let hi = vx.min(visible_end);
            if hi > lo {
                hit_map.push(
                    Rect::new(screen_x(lo), area.y, (hi - lo) as u16, 1),
                    target,
                );
            }
        }
    }
}
