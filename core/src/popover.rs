//! Overflow popover state machine.
//!
//! The popover has two states, `Closed` (initial) and `Open`. Opening requires at least one hidden
//! entry and computes a horizontal anchor from the trigger's geometry. While open, the popover
//! holds document-level listeners for outside pointer-down and Escape; the registrations live
//! inside the `Open` state, so every path back to `Closed` releases them.

use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

use strum_macros::Display;

/// Popover width used when a host does not supply its own (reference sizing, in pixels).
pub const DEFAULT_POPOVER_WIDTH: i32 = 321;

/// Horizontal geometry sampled from the host when the trigger is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorGeometry {
    /// Left edge of the "+N" trigger.
    pub trigger_left: i32,
    /// Left edge of the control that contains the popover.
    pub container_left: i32,
    /// Inner width of the control.
    pub container_width: i32,
}

impl AnchorGeometry {
    /// Offset of the popover relative to the control's left edge, clamped so that a popover of
    /// `popover_width` stays inside the control.
    pub fn anchor_offset(&self, popover_width: i32) -> i32 {
        let raw = self.trigger_left.saturating_sub(self.container_left);
        let max_left = self.container_width.saturating_sub(popover_width).max(0);
        raw.clamp(0, max_left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DocumentListener {
    PointerDown,
    KeyDown,
}

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: u64,
    active: Vec<(u64, DocumentListener)>,
}

/// Process-wide listener table shared by every control attached to one document (or terminal).
#[derive(Debug, Clone, Default)]
pub struct DocumentListeners {
    table: Rc<RefCell<ListenerTable>>,
}

impl DocumentListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, kind: DocumentListener) -> ListenerRegistration {
        let mut table = self.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.active.push((id, kind));
        ListenerRegistration {
            id,
            table: Rc::downgrade(&self.table),
        }
    }

    pub fn count(&self, kind: DocumentListener) -> usize {
        self.table
            .borrow()
            .active
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    pub fn active_count(&self) -> usize {
        self.table.borrow().active.len()
    }
}

/// Keeps one listener registered until dropped.
#[derive(Debug)]
#[must_use = "the listener is removed as soon as the registration is dropped"]
pub struct ListenerRegistration {
    id: u64,
    table: Weak<RefCell<ListenerTable>>,
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().active.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Where a document-level pointer-down landed, relative to the popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Popover,
    Trigger,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CloseReason {
    Toggle,
    OutsidePointer,
    Escape,
    EntryAdded,
    OverflowEmptied,
}

#[derive(Debug)]
enum PopoverState {
    Closed,
    Open {
        _pointer_down: ListenerRegistration,
        _key_down: ListenerRegistration,
    },
}

#[derive(Debug)]
pub struct PopoverController {
    listeners: DocumentListeners,
    popover_width: i32,
    anchor_left: i32,
    state: PopoverState,
}

impl PopoverController {
    pub fn new(listeners: DocumentListeners, popover_width: i32) -> Self {
        Self {
            listeners,
            popover_width,
            anchor_left: 0,
            state: PopoverState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PopoverState::Open { .. })
    }

    pub fn popover_width(&self) -> i32 {
        self.popover_width
    }

    /// Anchor offset relative to the control's left edge, while open.
    pub fn anchor_left(&self) -> Option<i32> {
        self.is_open().then_some(self.anchor_left)
    }

    /// Trigger activation. Returns whether the popover is open afterwards.
    ///
    /// When `geometry` is unavailable (the trigger has not been laid out yet) the state still
    /// toggles and the previous anchor is reused.
    pub fn toggle(&mut self, has_hidden: bool, geometry: Option<AnchorGeometry>) -> bool {
        if self.is_open() {
            self.close(CloseReason::Toggle);
            return false;
        }
        if !has_hidden {
            return false;
        }
        if let Some(geometry) = geometry {
            self.anchor_left = geometry.anchor_offset(self.popover_width);
        }
        self.state = PopoverState::Open {
            _pointer_down: self.listeners.register(DocumentListener::PointerDown),
            _key_down: self.listeners.register(DocumentListener::KeyDown),
        };
        tracing::debug!(anchor_left = self.anchor_left, "overflow popover opened");
        true
    }

    /// Returns true if the popover was open.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = PopoverState::Closed;
        tracing::debug!(%reason, "overflow popover closed");
        true
    }

    /// Document-level pointer-down. Only presses outside both the popover and its trigger dismiss.
    pub fn on_document_pointer_down(&mut self, target: PointerTarget) -> bool {
        if !self.is_open() || target != PointerTarget::Outside {
            return false;
        }
        self.close(CloseReason::OutsidePointer)
    }

    /// Document-level Escape key.
    pub fn on_document_escape(&mut self) -> bool {
        self.close(CloseReason::Escape)
    }

    /// Close when nothing is left to show. Call after every removal.
    pub fn sync_overflow(&mut self, hidden_len: usize) -> bool {
        if hidden_len == 0 {
            return self.close(CloseReason::OverflowEmptied);
        }
        false
    }
}
