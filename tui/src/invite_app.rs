//! Event loop hosting the [`InviteCard`] in an inline terminal viewport.

use anyhow::Context;
use crossterm::event::KeyCode;
use email_chips_core::ChipsConfig;
use email_chips_core::popover::DocumentListeners;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::chips_input::EmailChipsInputParams;
use crate::invite_card::INVITE_PLACEHOLDER;
use crate::invite_card::InviteCard;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::tui;
use crate::tui::Tui;
use crate::tui::TuiEvent;

const QUIT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('c'));

/// Run the invite card until the user quits with <kbd>Ctrl</kbd>+<kbd>C</kbd>.
///
/// Returns every submitted batch, oldest first.
pub async fn run_invite_app(config: ChipsConfig) -> anyhow::Result<Vec<Vec<String>>> {
    let terminal = tui::init().context("failed to initialize terminal")?;
    let mut tui = Tui::new(terminal);

    let result = run_invite_app_with_tui(&mut tui, config).await;

    // Best-effort: leave a clean shell prompt behind, even if the loop failed.
    let _ = tui.terminal.clear();
    let _ = tui::restore();
    result
}

pub async fn run_invite_app_with_tui(
    tui: &mut Tui,
    config: ChipsConfig,
) -> anyhow::Result<Vec<Vec<String>>> {
    let (app_event_tx, mut app_event_rx) = unbounded_channel::<AppEvent>();
    let mut card = InviteCard::new(EmailChipsInputParams {
        config,
        app_event_tx: AppEventSender::new(app_event_tx),
        listeners: DocumentListeners::new(),
        placeholder_text: INVITE_PLACEHOLDER.to_string(),
    });
    tracing::debug!(?config, "invite card started");
    tui.draw(&card).context("failed to draw invite card")?;

    let events = tui::event_stream();
    tokio::pin!(events);

    loop {
        let mut redraw = tokio::select! {
            Some(app_event) = app_event_rx.recv() => card.on_app_event(app_event),
            event = events.next() => match event {
                None => break,
                Some(TuiEvent::Key(key_event)) if QUIT_KEY.is_press(key_event) => break,
                Some(TuiEvent::Key(key_event)) => card.handle_key_event(key_event),
                Some(TuiEvent::Paste(pasted)) => card.handle_paste(pasted),
                Some(TuiEvent::Mouse(mouse_event)) => card.handle_mouse_event(mouse_event),
                Some(TuiEvent::Draw) => true,
            },
        };
        while let Ok(app_event) = app_event_rx.try_recv() {
            redraw |= card.on_app_event(app_event);
        }

        if redraw || card.has_deferred() {
            tui.draw(&card)?;
            // Effects such as focus return only run once the change is on screen.
            if card.run_deferred() {
                tui.draw(&card)?;
            }
        }
    }

    let submitted = card.into_submitted();
    tracing::debug!(batches = submitted.len(), "invite card closed");
    Ok(submitted)
}
