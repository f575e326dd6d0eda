//! Single-line pending-text buffer for the chip input.
//!
//! Cursor positions are byte offsets that always sit on a grapheme boundary.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Display column of the cursor.
    pub(crate) fn cursor_column(&self) -> usize {
        UnicodeWidthStr::width(&self.text[..self.cursor])
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        if text.is_empty() {
            return;
        }
        self.text.insert_str(self.cursor, &text);
        self.cursor += text.len();
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        let mut utf8 = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut utf8));
    }

    /// Delete the grapheme before the cursor. Returns false at the start of the buffer.
    pub(crate) fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.prev_boundary();
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    /// Delete the grapheme after the cursor. Returns false at the end of the buffer.
    pub(crate) fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let end = self.next_boundary();
        self.text.replace_range(self.cursor..end, "");
        true
    }

    pub(crate) fn move_left(&mut self) -> bool {
        let pos = self.prev_boundary();
        self.set_cursor(pos)
    }

    pub(crate) fn move_right(&mut self) -> bool {
        let pos = self.next_boundary();
        self.set_cursor(pos)
    }

    pub(crate) fn move_home(&mut self) -> bool {
        self.set_cursor(0)
    }

    pub(crate) fn move_end(&mut self) -> bool {
        self.set_cursor(self.text.len())
    }

    fn set_cursor(&mut self, pos: usize) -> bool {
        let moved = pos != self.cursor;
        self.cursor = pos;
        moved
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.text.len(), |g| self.cursor + g.len())
    }
}
