//! Invite-by-email card: the chip input plus an "Add Users" button.
//!
//! The card only consumes the control. It mirrors the accepted entries from
//! [`AppEvent::EntriesChanged`], and on submit it logs the batch and swaps in a fresh control,
//! which is the only way the entries are ever cleared all at once.

use std::cell::Cell;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use derive_more::IsVariant;
use email_chips_core::ChipsConfig;
use itertools::Itertools;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::app_event::AppEvent;
use crate::chips_input::EmailChipsInput;
use crate::chips_input::EmailChipsInputParams;
use crate::chips_input::TERMINAL_POPOVER_WIDTH;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::ColumnRenderable;
use crate::render::renderable::Renderable;
use crate::render::renderable::RenderableItem;

/// Chips shown inline by the invite card before collapsing into `+N`.
pub const INVITE_VISIBLE_LIMIT: usize = 5;

pub const INVITE_PLACEHOLDER: &str = "Add emails";

const BUTTON_HEIGHT: u16 = 3;

const FOOTER_HINTS: [(KeyBinding, &str); 5] = [
    (key_hint::plain(KeyCode::Enter), "add"),
    (key_hint::plain(KeyCode::Tab), "switch"),
    (key_hint::ctrl(KeyCode::Char('o')), "more"),
    (key_hint::plain(KeyCode::Esc), "close"),
    (key_hint::ctrl(KeyCode::Char('c')), "quit"),
];

/// Control settings the invite card starts from before user overrides.
pub fn invite_config() -> ChipsConfig {
    ChipsConfig {
        visible_limit: INVITE_VISIBLE_LIMIT,
        popover_width: TERMINAL_POPOVER_WIDTH,
        ..ChipsConfig::default()
    }
}

/// `Add User`, `Add User (1)`, `Add Users (3)`.
pub fn button_label(count: usize) -> String {
    match count {
        0 => "Add User".to_string(),
        1 => "Add User (1)".to_string(),
        n => format!("Add Users ({n})"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
enum CardFocus {
    Input,
    Button,
}

pub struct InviteCard {
    params: EmailChipsInputParams,
    input: EmailChipsInput,
    /// Latest entries reported by the control.
    emails: Vec<String>,
    focus: CardFocus,
    submitted: Vec<Vec<String>>,
    button_area: Cell<Rect>,
}

impl InviteCard {
    pub fn new(params: EmailChipsInputParams) -> Self {
        let input = EmailChipsInput::new(params.clone());
        Self {
            params,
            input,
            emails: Vec::new(),
            focus: CardFocus::Input,
            submitted: Vec::new(),
            button_area: Cell::new(Rect::default()),
        }
    }

    pub fn input(&self) -> &EmailChipsInput {
        &self.input
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn can_submit(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn button_label(&self) -> String {
        button_label(self.emails.len())
    }

    /// Batches submitted so far, oldest first.
    pub fn submitted(&self) -> &[Vec<String>] {
        &self.submitted
    }

    pub fn into_submitted(self) -> Vec<Vec<String>> {
        self.submitted
    }

    pub fn on_app_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::EntriesChanged(emails) => {
                let changed = self.emails != emails;
                self.emails = emails;
                changed
            }
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        if key_event.kind == KeyEventKind::Release {
            return false;
        }
        // Document-level listeners see every key before the focused element.
        if self.input.handle_document_key(key_event) {
            return true;
        }

        match key_event.code {
            KeyCode::Tab | KeyCode::BackTab => {
                let next = match self.focus {
                    CardFocus::Input => CardFocus::Button,
                    CardFocus::Button => CardFocus::Input,
                };
                self.set_focus(next);
                true
            }
            _ if self.focus.is_input() => self.input.handle_key_event(key_event),
            KeyCode::Enter | KeyCode::Char(' ') => self.submit(),
            _ => false,
        }
    }

    pub fn handle_paste(&mut self, pasted: String) -> bool {
        self.set_focus(CardFocus::Input);
        self.input.handle_paste(pasted)
    }

    pub fn handle_mouse_event(&mut self, mouse_event: MouseEvent) -> bool {
        let mut changed = self.input.handle_mouse_event(mouse_event);
        if mouse_event.kind != MouseEventKind::Down(MouseButton::Left) {
            return changed;
        }

        let position = Position::new(mouse_event.column, mouse_event.row);
        if self.button_area.get().contains(position) {
            changed |= self.focus != CardFocus::Button;
            self.set_focus(CardFocus::Button);
            changed |= self.submit();
        } else if self.input.has_focus() {
            self.focus = CardFocus::Input;
        }
        changed
    }

    /// Run the control's deferred effects. Call after drawing.
    pub fn run_deferred(&mut self) -> bool {
        let changed = self.input.run_deferred();
        if self.input.has_focus() {
            self.focus = CardFocus::Input;
        }
        changed
    }

    pub fn has_deferred(&self) -> bool {
        self.input.has_deferred()
    }

    /// Submit the current entries. Does nothing while there are none.
    pub fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        let batch = std::mem::take(&mut self.emails);
        tracing::info!(count = batch.len(), emails = ?batch, "Inviting emails");
        self.submitted.push(batch);

        // Dropping the old control also releases any document listeners its popover held.
        self.input = EmailChipsInput::new(self.params.clone());
        self.set_focus(CardFocus::Input);
        true
    }

    fn set_focus(&mut self, focus: CardFocus) {
        self.focus = focus;
        self.input.set_focus(focus.is_input());
    }

    fn layout(&self) -> ColumnRenderable<'_> {
        let title = Line::from("Invite by email".bold());
        let body = CardBody {
            input: &self.input,
            label: self.button_label(),
            button_style: self.button_style(),
            button_area: &self.button_area,
        };
        let children: Vec<RenderableItem<'_>> =
            vec![title.into(), body.into(), footer_line().into()];
        ColumnRenderable::with(children)
    }

    fn button_style(&self) -> Style {
        if !self.can_submit() {
            Style::default().dim()
        } else if self.focus.is_button() {
            Style::default().cyan().bold()
        } else {
            Style::default().bold()
        }
    }
}

fn footer_line() -> Line<'static> {
    let hints = FOOTER_HINTS
        .iter()
        .map(|(binding, action)| vec![Span::from(binding), format!(" {action}").dim()]);
    Itertools::intersperse(hints, vec!["  ".into()])
        .flatten()
        .collect::<Vec<_>>()
        .into()
}

impl Renderable for InviteCard {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        self.layout().render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.layout().desired_height(width)
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.layout().cursor_pos(area)
    }
}

/// The control with the submit button to its right.
struct CardBody<'a> {
    input: &'a EmailChipsInput,
    label: String,
    button_style: Style,
    button_area: &'a Cell<Rect>,
}

impl CardBody<'_> {
    fn button_width(&self) -> u16 {
        u16::try_from(self.label.width()).unwrap_or(u16::MAX).saturating_add(4)
    }

    /// `[input, button]`
    fn areas(&self, area: Rect) -> [Rect; 2] {
        let button_width = self.button_width().min(area.width);
        let input = Rect {
            width: area.width.saturating_sub(button_width + 1),
            ..area
        };
        let button = Rect::new(
            area.right() - button_width,
            area.y,
            button_width,
            BUTTON_HEIGHT.min(area.height),
        );
        [input, button]
    }
}

impl Renderable for CardBody<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let [input_area, button_area] = self.areas(area);
        self.input.render(input_area, buf);

        Block::bordered()
            .border_style(self.button_style)
            .render(button_area, buf);
        let label_area = button_area.inset(Insets::tlbr(1, 2, 1, 2));
        if !label_area.is_empty() {
            buf.set_stringn(
                label_area.x,
                label_area.y,
                &self.label,
                usize::from(label_area.width),
                self.button_style,
            );
        }
        self.button_area.set(button_area);
    }

    fn desired_height(&self, width: u16) -> u16 {
        let [input_area, _] = self.areas(Rect::new(0, 0, width, BUTTON_HEIGHT));
        self.input
            .desired_height(input_area.width)
            .max(BUTTON_HEIGHT)
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let [input_area, _] = self.areas(area);
        self.input.cursor_pos(input_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use email_chips_core::popover::DocumentListeners;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    use crate::app_event_sender::AppEventSender;

    fn card() -> (InviteCard, UnboundedReceiver<AppEvent>, DocumentListeners) {
        let (tx, rx) = unbounded_channel();
        let listeners = DocumentListeners::new();
        let card = InviteCard::new(EmailChipsInputParams {
            config: invite_config(),
            app_event_tx: AppEventSender::new(tx),
            listeners: listeners.clone(),
            placeholder_text: INVITE_PLACEHOLDER.to_string(),
        });
        (card, rx, listeners)
    }

    /// Deliver pending notifications the way the app loop does.
    fn pump(card: &mut InviteCard, rx: &mut UnboundedReceiver<AppEvent>) {
        while let Ok(event) = rx.try_recv() {
            card.on_app_event(event);
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render_lines(card: &InviteCard, width: u16) -> String {
        let area = Rect::new(0, 0, width, card.desired_height(width));
        let mut buf = Buffer::empty(area);
        card.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .join("\n")
    }

    #[test]
    fn button_label_tracks_the_entry_count() {
        assert_eq!(button_label(0), "Add User");
        assert_eq!(button_label(1), "Add User (1)");
        assert_eq!(button_label(3), "Add Users (3)");
    }

    #[test]
    fn mirrors_entries_from_change_notifications() {
        let (mut card, mut rx, _) = card();

        card.handle_paste("a@x.com, b@x.com".to_string());
        pump(&mut card, &mut rx);

        assert_eq!(card.emails(), ["a@x.com", "b@x.com"]);
        assert_eq!(card.button_label(), "Add Users (2)");
        assert!(card.can_submit());
    }

    #[test]
    fn submit_without_entries_is_disabled() {
        let (mut card, _rx, _) = card();

        card.handle_key_event(key(KeyCode::Tab));
        assert!(!card.handle_key_event(key(KeyCode::Enter)));
        assert!(card.submitted().is_empty());
    }

    #[test]
    fn submitting_records_the_batch_and_resets_the_control() {
        let (mut card, mut rx, listeners) = card();
        card.handle_paste("a@x.com b@x.com c@x.com d@x.com e@x.com f@x.com".to_string());
        pump(&mut card, &mut rx);
        card.input.toggle_overflow();
        assert_eq!(listeners.active_count(), 2);

        card.handle_key_event(key(KeyCode::Tab));
        assert!(!card.input().has_focus());
        assert!(card.handle_key_event(key(KeyCode::Enter)));

        assert_eq!(
            card.submitted(),
            [vec![
                "a@x.com".to_string(),
                "b@x.com".to_string(),
                "c@x.com".to_string(),
                "d@x.com".to_string(),
                "e@x.com".to_string(),
                "f@x.com".to_string(),
            ]]
        );
        assert!(card.emails().is_empty());
        assert!(card.input().entries().is_empty());
        assert!(card.input().has_focus());
        assert_eq!(card.button_label(), "Add User");
        assert_eq!(listeners.active_count(), 0);
    }

    #[test]
    fn escape_reaches_the_popover_even_when_the_button_has_focus() {
        let (mut card, mut rx, _) = card();
        card.handle_paste("a@x.com b@x.com c@x.com d@x.com e@x.com f@x.com".to_string());
        pump(&mut card, &mut rx);
        card.input.toggle_overflow();
        card.handle_key_event(key(KeyCode::Tab));

        assert!(card.handle_key_event(key(KeyCode::Esc)));
        assert!(!card.input().is_popover_open());
        assert!(card.submitted().is_empty());
    }

    #[test]
    fn typing_goes_to_the_control_only_while_it_has_focus() {
        let (mut card, _rx, _) = card();

        card.handle_key_event(key(KeyCode::Char('a')));
        card.handle_key_event(key(KeyCode::Tab));
        card.handle_key_event(key(KeyCode::Char('b')));

        assert_eq!(card.input().text(), "a");
    }

    #[test]
    fn clicking_the_button_submits() {
        let (mut card, mut rx, _) = card();
        card.handle_paste("a@x.com b@x.com".to_string());
        pump(&mut card, &mut rx);
        render_lines(&card, 64);

        let button = card.button_area.get();
        let changed = card.handle_mouse_event(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: button.x + 1,
            row: button.y + 1,
            modifiers: KeyModifiers::NONE,
        });

        assert!(changed);
        assert_eq!(card.submitted().len(), 1);
        assert!(card.input().has_focus());
    }

    #[test]
    fn renders_empty_card() {
        let (card, _rx, _) = card();

        assert_snapshot!(render_lines(&card, 64), @r"
        Invite by email
        ┌─────────────────────────────────────────────────┐ ┌──────────┐
        │Add emails                                       │ │ Add User │
        └─────────────────────────────────────────────────┘ └──────────┘
        enter add  tab switch  ctrl + o more  esc close  ctrl + c quit
        ");
    }

    #[test]
    fn short_viewport_clips_the_error_line() {
        let (mut card, mut rx, _) = card();
        card.handle_paste("a@x.com nope".to_string());
        pump(&mut card, &mut rx);
        assert_eq!(card.desired_height(80), 6);

        let area = Rect::new(0, 0, 80, 4);
        let mut buf = Buffer::empty(area);
        card.render(area, &mut buf);

        let lines: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect();
        assert_eq!(lines[0].trim_end(), "Invite by email");
        assert!(lines[2].starts_with("│ a@x.com ×"));
        assert!(lines.iter().all(|line| !line.contains("Invalid email")));
    }

    #[test]
    fn renders_chips_and_count_on_the_button() {
        let (mut card, mut rx, _) = card();
        card.handle_paste("a@x.com nope".to_string());
        pump(&mut card, &mut rx);

        assert_snapshot!(render_lines(&card, 64), @r#"
        Invite by email
        ┌─────────────────────────────────────────────┐ ┌──────────────┐
        │ a@x.com ×                                   │ │ Add User (1) │
        └─────────────────────────────────────────────┘ └──────────────┘
         Invalid email: "nope"
        enter add  tab switch  ctrl + o more  esc close  ctrl + c quit
        "#);
    }
}
