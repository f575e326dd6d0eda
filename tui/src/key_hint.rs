use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Span;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyBinding {
    key: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn is_press(&self, event: KeyEvent) -> bool {
        self.key == event.code
            && self.modifiers == event.modifiers
            && (event.kind == KeyEventKind::Press || event.kind == KeyEventKind::Repeat)
    }

    fn label(&self) -> String {
        let mut label = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            label.push_str("ctrl + ");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            label.push_str("alt + ");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            label.push_str("shift + ");
        }
        let key = match self.key {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Delete => "del".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
            other => format!("{other}").to_ascii_lowercase(),
        };
        label.push_str(&key);
        label
    }
}

pub const fn plain(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::NONE)
}

pub const fn ctrl(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::CONTROL)
}

impl From<KeyBinding> for Span<'static> {
    fn from(binding: KeyBinding) -> Self {
        Span::styled(binding.label(), key_hint_style())
    }
}

impl From<&KeyBinding> for Span<'static> {
    fn from(binding: &KeyBinding) -> Self {
        (*binding).into()
    }
}

fn key_hint_style() -> Style {
    Style::default().dim()
}

pub fn has_ctrl_or_alt(mods: KeyModifiers) -> bool {
    (mods.contains(KeyModifiers::CONTROL) || mods.contains(KeyModifiers::ALT)) && !is_altgr(mods)
}

#[cfg(windows)]
#[inline]
fn is_altgr(mods: KeyModifiers) -> bool {
    mods.contains(KeyModifiers::ALT) && mods.contains(KeyModifiers::CONTROL)
}

#[cfg(not(windows))]
#[inline]
fn is_altgr(_mods: KeyModifiers) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_include_modifiers() {
        let span: Span<'static> = ctrl(KeyCode::Char('O')).into();
        assert_eq!(span.content, "ctrl + o");
        let span: Span<'static> = plain(KeyCode::Enter).into();
        assert_eq!(span.content, "enter");
    }

    #[test]
    fn is_press_ignores_release_events() {
        let binding = ctrl(KeyCode::Char('c'));
        let mut event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(binding.is_press(event));
        event.kind = KeyEventKind::Release;
        assert!(!binding.is_press(event));
        assert!(!binding.is_press(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
