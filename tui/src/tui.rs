//! Terminal session plumbing: raw mode, bracketed paste, mouse capture and an inline viewport.

use std::io;
use std::io::Stdout;
use std::io::stdout;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::event::MouseEvent;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::TerminalOptions;
use ratatui::Viewport;
use ratatui::backend::CrosstermBackend;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

use crate::render::renderable::Renderable;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Rows reserved below the shell prompt. Fits the card with a full popover and an error line.
pub const VIEWPORT_HEIGHT: u16 = 14;

/// Terminal input the app loop reacts to.
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Mouse(MouseEvent),
    Draw,
}

/// Enter raw mode and create an inline terminal below the cursor.
pub fn init() -> io::Result<Terminal> {
    set_modes()?;
    set_panic_hook();

    let backend = CrosstermBackend::new(stdout());
    ratatui::Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        },
    )
}

fn set_modes() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnableBracketedPaste, EnableMouseCapture)?;
    Ok(())
}

/// Undo everything [`init`] changed. Safe to call more than once.
pub fn restore() -> io::Result<()> {
    execute!(stdout(), DisableMouseCapture, DisableBracketedPaste)?;
    disable_raw_mode()
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Leave the shell usable before printing the panic.
        let _ = restore();
        hook(panic_info);
    }));
}

/// Stream of terminal input, with resizes folded into [`TuiEvent::Draw`].
pub fn event_stream() -> impl Stream<Item = TuiEvent> {
    EventStream::new().filter_map(|event| match event {
        Ok(Event::Key(key_event)) => Some(TuiEvent::Key(key_event)),
        Ok(Event::Paste(pasted)) => Some(TuiEvent::Paste(pasted)),
        Ok(Event::Mouse(mouse_event)) => Some(TuiEvent::Mouse(mouse_event)),
        Ok(Event::Resize(_, _) | Event::FocusGained) => Some(TuiEvent::Draw),
        Ok(Event::FocusLost) => None,
        Err(err) => {
            tracing::warn!("failed to read terminal event: {err}");
            None
        }
    })
}

pub struct Tui {
    pub terminal: Terminal,
}

impl Tui {
    pub fn new(terminal: Terminal) -> Self {
        Self { terminal }
    }

    /// Draw `widget` over the whole viewport and place the cursor where it asks for one.
    pub fn draw(&mut self, widget: &impl Renderable) -> io::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();
            widget.render(area, frame.buffer_mut());
            if let Some(position) = widget.cursor_pos(area) {
                frame.set_cursor_position(position);
            }
        })?;
        Ok(())
    }
}
