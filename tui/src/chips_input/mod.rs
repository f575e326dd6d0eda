//! The email chip input: a single-line text field that turns typed or pasted addresses into
//! removable chips.
//!
//! [`EmailChipsInput`] is the interaction layer over the headless pieces in `email_chips_core`:
//!
//! - Keys: <kbd>Enter</kbd>, <kbd>,</kbd> and <kbd>;</kbd> submit the pending text. Backspace on
//!   an empty field removes the last chip. <kbd>Ctrl</kbd>+<kbd>O</kbd> activates the `+N`
//!   trigger; while the popover is open <kbd>↑</kbd>/<kbd>↓</kbd> pick a hidden chip and
//!   <kbd>Del</kbd> removes it.
//! - Paste: text containing a separator is submitted as one batch; anything else is inserted into
//!   the field for further editing.
//! - Mouse: presses are resolved against the regions recorded by the last render (see
//!   [`HitMap`](hit_map::HitMap)). The popover's document-level pointer listener runs first, then
//!   the press is dispatched to its target.
//!
//! Every command that changes the accepted entries sends exactly one
//! [`AppEvent::EntriesChanged`]. Focus returns to the text field after a removal, but only once the
//! host has drawn the removal and calls [`EmailChipsInput::run_deferred`].

mod chip_row;
mod hit_map;
mod input_buffer;
mod overflow_popover;

use std::cell::RefCell;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use email_chips_core::ChipStore;
use email_chips_core::ChipsConfig;
use email_chips_core::Entry;
use email_chips_core::OverflowView;
use email_chips_core::PopoverController;
use email_chips_core::popover::CloseReason;
use email_chips_core::popover::DocumentListeners;
use email_chips_core::popover::PointerTarget;
use email_chips_core::tokenizer::contains_separator;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Widget;

use self::chip_row::ChipRow;
use self::hit_map::HitMap;
use self::hit_map::HitTarget;
use self::input_buffer::InputBuffer;
use self::overflow_popover::OverflowPopoverView;
use self::overflow_popover::popover_height;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::key_hint;
use crate::key_hint::has_ctrl_or_alt;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::Renderable;

/// Popover width in terminal cells.
pub const TERMINAL_POPOVER_WIDTH: i32 = 36;

const ROW_BLOCK_HEIGHT: u16 = 3;

const TOGGLE_OVERFLOW_KEY: key_hint::KeyBinding = key_hint::ctrl(KeyCode::Char('o'));

#[derive(Clone)]
pub struct EmailChipsInputParams {
    pub config: ChipsConfig,
    pub app_event_tx: AppEventSender,
    /// Shared by every control on the same terminal.
    pub listeners: DocumentListeners,
    pub placeholder_text: String,
}

/// Work that must wait until the host has drawn the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredEffect {
    FocusInput,
}

pub struct EmailChipsInput {
    store: ChipStore,
    visible_limit: usize,
    buffer: InputBuffer,
    popover: PopoverController,
    /// Highlighted hidden entry while the popover is open.
    popover_selection: Option<usize>,
    app_event_tx: AppEventSender,
    placeholder_text: String,
    has_focus: bool,
    deferred: Vec<DeferredEffect>,
    hit_map: RefCell<HitMap>,
}

impl EmailChipsInput {
    pub fn new(params: EmailChipsInputParams) -> Self {
        let EmailChipsInputParams {
            config,
            app_event_tx,
            listeners,
            placeholder_text,
        } = params;

        Self {
            store: ChipStore::from_config(&config),
            visible_limit: config.visible_limit,
            buffer: InputBuffer::new(),
            popover: PopoverController::new(listeners, config.popover_width),
            popover_selection: None,
            app_event_tx,
            placeholder_text,
            has_focus: true,
            deferred: Vec::new(),
            hit_map: RefCell::new(HitMap::default()),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    /// The pending, not yet submitted text.
    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn last_error(&self) -> Option<String> {
        self.store.last_error()
    }

    pub fn overflow(&self) -> OverflowView<'_> {
        OverflowView::split(self.store.entries(), self.visible_limit)
    }

    pub fn is_popover_open(&self) -> bool {
        self.popover.is_open()
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Returns true if focus changed.
    pub fn set_focus(&mut self, focused: bool) -> bool {
        let changed = self.has_focus != focused;
        self.has_focus = focused;
        changed
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run effects scheduled by earlier commands. Hosts call this after drawing.
    ///
    /// Returns true if anything visible changed.
    pub fn run_deferred(&mut self) -> bool {
        let mut changed = false;
        for effect in std::mem::take(&mut self.deferred) {
            match effect {
                DeferredEffect::FocusInput => changed |= self.set_focus(true),
            }
        }
        changed
    }

    /// Document-level key listener: sees every key, focused or not. Returns true if consumed.
    pub fn handle_document_key(&mut self, key_event: KeyEvent) -> bool {
        if key_event.kind == KeyEventKind::Release || key_event.code != KeyCode::Esc {
            return false;
        }
        if self.popover.on_document_escape() {
            self.popover_selection = None;
            return true;
        }
        false
    }

    /// Handle a key delivered to the focused text field. Returns true if a redraw is needed.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        if key_event.kind == KeyEventKind::Release {
            return false;
        }
        if TOGGLE_OVERFLOW_KEY.is_press(key_event) {
            return self.toggle_overflow();
        }

        match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => self.submit_pending(),
            KeyEvent {
                code: KeyCode::Char(',' | ';'),
                modifiers,
                ..
            } if !has_ctrl_or_alt(modifiers) => self.submit_pending(),
            KeyEvent {
                code: KeyCode::Up, ..
            } if self.popover.is_open() => self.move_popover_selection(-1),
            KeyEvent {
                code: KeyCode::Down,
                ..
            } if self.popover.is_open() => self.move_popover_selection(1),
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } if self.popover.is_open() && self.popover_selection.is_some() => {
                let selected = self.popover_selection.unwrap_or_default();
                self.remove_hidden_at(selected)
            }
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                if !self.buffer.is_empty() {
                    let changed = self.buffer.backspace();
                    self.on_edit();
                    return changed;
                }
                match self.store.len() {
                    0 => false,
                    len => self.remove_at(len - 1),
                }
            }
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => {
                let changed = self.buffer.delete_forward();
                if changed {
                    self.on_edit();
                }
                changed
            }
            KeyEvent {
                code: KeyCode::Left,
                ..
            } => self.buffer.move_left(),
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => self.buffer.move_right(),
            KeyEvent {
                code: KeyCode::Home,
                ..
            } => self.buffer.move_home(),
            KeyEvent {
                code: KeyCode::End, ..
            } => self.buffer.move_end(),
            KeyEvent {
                code: KeyCode::Char(ch),
                modifiers,
                ..
            } if !has_ctrl_or_alt(modifiers) => {
                self.buffer.insert_char(ch);
                self.on_edit();
                true
            }
            _ => false,
        }
    }

    /// Integrate pasted text. Multi-token pastes become a batch submission.
    pub fn handle_paste(&mut self, pasted: String) -> bool {
        if pasted.is_empty() {
            return false;
        }
        if contains_separator(&pasted) {
            tracing::debug!(chars = pasted.chars().count(), "submitting pasted batch");
            return self.submit(&pasted);
        }
        self.buffer.insert_str(&pasted);
        self.on_edit();
        true
    }

    /// Handle a mouse event anywhere on the terminal. Returns true if a redraw is needed.
    pub fn handle_mouse_event(&mut self, mouse_event: MouseEvent) -> bool {
        let MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        } = mouse_event
        else {
            return false;
        };

        let target = self
            .hit_map
            .borrow()
            .hit(column, row, self.popover.is_open());
        let pointer_target = match target {
            Some(HitTarget::Popover | HitTarget::RemoveHidden(_)) => PointerTarget::Popover,
            Some(HitTarget::OverflowTrigger) => PointerTarget::Trigger,
            _ => PointerTarget::Outside,
        };

        let mut changed = false;
        if self.popover.on_document_pointer_down(pointer_target) {
            self.popover_selection = None;
            changed = true;
        }

        changed |= match target {
            Some(HitTarget::RemoveVisible(index)) => self.remove_at(index),
            Some(HitTarget::OverflowTrigger) => self.toggle_overflow(),
            Some(HitTarget::RemoveHidden(hidden_index)) => self.remove_hidden_at(hidden_index),
            // Presses inside the popover never reach the control's own focus handling.
            Some(HitTarget::Popover) => false,
            Some(HitTarget::Input | HitTarget::Background) => self.set_focus(true),
            None => self.set_focus(false),
        };
        changed
    }

    /// Activate the `+N` trigger.
    pub fn toggle_overflow(&mut self) -> bool {
        let was_open = self.popover.is_open();
        let has_hidden = self.overflow().has_overflow();
        let geometry = self.hit_map.borrow().anchor_geometry();
        let is_open = self.popover.toggle(has_hidden, geometry);
        self.popover_selection = is_open.then_some(0);
        was_open != is_open
    }

    /// Remove the entry at store `index`.
    pub fn remove_at(&mut self, index: usize) -> bool {
        let removed = match self.store.remove_at(index) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!("ignoring chip removal: {err}");
                return false;
            }
        };
        tracing::debug!(index, remaining = self.store.len(), "removed chip {removed}");

        let hidden_len = self.overflow().hidden().len();
        self.popover.sync_overflow(hidden_len);
        self.popover_selection = match self.popover_selection {
            Some(_) if !self.popover.is_open() => None,
            Some(selected) => Some(selected.min(hidden_len.saturating_sub(1))),
            None => None,
        };

        if !self.deferred.contains(&DeferredEffect::FocusInput) {
            self.deferred.push(DeferredEffect::FocusInput);
        }
        self.notify_entries_changed();
        true
    }

    /// Remove the entry shown at `hidden_index` in the popover.
    pub fn remove_hidden_at(&mut self, hidden_index: usize) -> bool {
        let Some(index) = self.overflow().store_index_of_hidden(hidden_index) else {
            return false;
        };
        self.remove_at(index)
    }

    fn submit_pending(&mut self) -> bool {
        let pending = self.buffer.text().to_string();
        self.submit(&pending)
    }

    fn submit(&mut self, raw: &str) -> bool {
        let Some(outcome) = self.store.submit(raw) else {
            return false;
        };
        if outcome.changed() {
            self.popover.close(CloseReason::EntryAdded);
            self.popover_selection = None;
        }
        self.buffer.clear();
        if outcome.changed() {
            self.notify_entries_changed();
        }
        true
    }

    fn on_edit(&mut self) {
        self.store.clear_error();
    }

    fn move_popover_selection(&mut self, delta: isize) -> bool {
        let len = self.overflow().hidden().len();
        if len == 0 {
            return false;
        }
        let current = self.popover_selection.unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        let changed = self.popover_selection != Some(next);
        self.popover_selection = Some(next);
        changed
    }

    fn notify_entries_changed(&self) {
        self.app_event_tx
            .send(AppEvent::EntriesChanged(self.store.to_strings()));
    }

    fn chip_row(&self) -> ChipRow {
        let overflow = self.overflow();
        let mut row = ChipRow::new();
        for (index, entry) in overflow.visible().iter().enumerate() {
            row.push_chip(index, entry.as_str());
        }
        if let Some(label) = overflow.overflow_label() {
            row.push_trigger(&label);
        }
        let placeholder = self
            .store
            .is_empty()
            .then_some(self.placeholder_text.as_str());
        row.finish_with_input(self.buffer.text(), self.buffer.cursor_column(), placeholder)
    }

    fn popover_rows(&self) -> u16 {
        if !self.popover.is_open() {
            return 0;
        }
        popover_height(self.overflow().hidden().len())
    }

    /// `[row block, row inner, popover band, error line]`
    fn layout_areas(&self, area: Rect) -> [Rect; 4] {
        let row_block = Rect {
            height: ROW_BLOCK_HEIGHT.min(area.height),
            ..area
        };
        let row_inner = row_block.inset(Insets::uniform(1));
        let popover = Rect::new(
            area.x,
            row_block.bottom(),
            area.width,
            self.popover_rows(),
        )
        .intersection(area);
        let error = Rect::new(
            area.x,
            row_block.bottom() + popover.height,
            area.width,
            u16::from(self.store.last_error().is_some()),
        )
        .intersection(area);
        [row_block, row_inner, popover, error]
    }

    fn popover_area(&self, band: Rect, row_inner: Rect) -> Rect {
        let Some(left) = self.popover.anchor_left() else {
            return Rect::default();
        };
        let left = u16::try_from(left).unwrap_or(0).min(row_inner.width);
        let width = u16::try_from(self.popover.popover_width())
            .unwrap_or(u16::MAX)
            .min(row_inner.width - left);
        Rect::new(row_inner.x + left, band.y, width, band.height)
    }
}

impl Renderable for EmailChipsInput {
    fn desired_height(&self, _width: u16) -> u16 {
        ROW_BLOCK_HEIGHT + self.popover_rows() + u16::from(self.store.last_error().is_some())
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if !self.has_focus {
            return None;
        }
        let [_, row_inner, _, _] = self.layout_areas(area);
        self.chip_row().cursor_pos(row_inner)
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        let [row_block, row_inner, popover_band, error_area] = self.layout_areas(area);
        let mut hit_map = self.hit_map.borrow_mut();
        hit_map.reset(area, row_inner);

        let border_style = if self.has_focus {
            Style::default().cyan()
        } else {
            Style::default().dim()
        };
        Block::bordered()
            .border_style(border_style)
            .render(row_block, buf);
        self.chip_row().render(row_inner, buf, &mut hit_map);

        if !popover_band.is_empty() {
            let popover_area = self.popover_area(popover_band, row_inner);
            OverflowPopoverView {
                hidden: self.overflow().hidden(),
                selected: self.popover_selection,
            }
            .render(popover_area, buf, &mut hit_map);
        }

        if let Some(error) = self.store.last_error().filter(|_| !error_area.is_empty()) {
            buf.set_line(
                error_area.x + 1,
                error_area.y,
                &Line::from(error.red()),
                error_area.width.saturating_sub(1),
            );
        }
    }
}
