//! Drawing of the overflow popover: a bordered list of the hidden entries, each removable.

use email_chips_core::Entry;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::widgets::Block;
use ratatui::widgets::Clear;
use ratatui::widgets::Widget;

use super::chip_row::REMOVE_GLYPH;
use super::hit_map::HitMap;
use super::hit_map::HitTarget;
use crate::render::Insets;
use crate::render::RectExt;
use crate::text_formatting::truncate_to_width;

pub(crate) const MAX_POPOVER_ROWS: usize = 6;

/// Rows needed to draw `hidden_len` entries, borders included.
pub(crate) fn popover_height(hidden_len: usize) -> u16 {
    if hidden_len == 0 {
        return 0;
    }
    hidden_len.min(MAX_POPOVER_ROWS) as u16 + 2
}

/// First hidden index shown so that `selected` stays inside the window.
fn first_visible_row(selected: Option<usize>, len: usize) -> usize {
    let window = MAX_POPOVER_ROWS.min(len);
    match selected {
        Some(selected) if selected >= window => selected + 1 - window,
        _ => 0,
    }
}

pub(crate) struct OverflowPopoverView<'a> {
    pub(crate) hidden: &'a [Entry],
    pub(crate) selected: Option<usize>,
}

impl OverflowPopoverView<'_> {
    pub(crate) fn render(&self, area: Rect, buf: &mut Buffer, hit_map: &mut HitMap) {
        if area.is_empty() || self.hidden.is_empty() {
            return;
        }
        Clear.render(area, buf);
        Block::bordered()
            .border_style(Style::default().cyan())
            .title(format!(" {} more ", self.hidden.len()))
            .render(area, buf);
        hit_map.push(area, HitTarget::Popover);

        let inner = area.inset(Insets::uniform(1));
        if inner.width < 4 {
            return;
        }
        let text_width = usize::from(inner.width - 4);
        let first = first_visible_row(self.selected, self.hidden.len());
        let rows = self
            .hidden
            .iter()
            .enumerate()
            .skip(first)
            .take(usize::from(inner.height));

        for (offset, (hidden_index, entry)) in rows.enumerate() {
            let y = inner.y + offset as u16;
            let style = if self.selected == Some(hidden_index) {
                Style::default().reversed()
            } else {
                Style::default()
            };
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            buf.set_string(
                inner.x + 1,
                y,
                truncate_to_width(entry.as_str(), text_width),
                style,
            );
            let remove_x = inner.right() - 2;
            buf.set_string(remove_x, y, REMOVE_GLYPH, style.bold());
            hit_map.push(
                Rect::new(remove_x, y, 1, 1),
                HitTarget::RemoveHidden(hidden_index),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use email_chips_core::ChipStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn height_caps_at_max_rows() {
        assert_eq!(popover_height(0), 0);
        assert_eq!(popover_height(1), 3);
        assert_eq!(popover_height(20), MAX_POPOVER_ROWS as u16 + 2);
    }

    #[test]
    fn window_follows_selection() {
        assert_eq!(first_visible_row(None, 20), 0);
        assert_eq!(first_visible_row(Some(5), 20), 0);
        assert_eq!(first_visible_row(Some(6), 20), 1);
        assert_eq!(first_visible_row(Some(19), 20), 14);
    }

    #[test]
    fn renders_hidden_entries_with_remove_targets() {
        let mut store = ChipStore::default();
        store
            .submit("c@x.com averyveryverylongaddress@example.com")
            .expect("tokens");
        let view = OverflowPopoverView {
            hidden: store.entries(),
            selected: Some(1),
        };

        let area = Rect::new(0, 0, 24, 4);
        let mut buf = Buffer::empty(area);
        let mut hit_map = HitMap::default();
        hit_map.reset(area, area);
        view.render(area, &mut buf, &mut hit_map);

        let row = |y: u16| {
            (area.x..area.right())
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        };
        assert_eq!(row(0), "┌ 2 more ──────────────┐");
        assert_eq!(row(1), "│ c@x.com            × │");
        assert_eq!(row(2), "│ averyveryverylong… × │");
        assert_eq!(row(3), "└──────────────────────┘");
        assert_eq!(hit_map.hit(21, 2, true), Some(HitTarget::RemoveHidden(1)));
        assert_eq!(hit_map.hit(5, 1, true), Some(HitTarget::Popover));
    }
}
