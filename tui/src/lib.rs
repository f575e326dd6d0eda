// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod chips_input;
mod invite_app;
mod invite_card;
mod key_hint;
mod render;
mod text_formatting;
mod tui;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use chips_input::EmailChipsInput;
pub use chips_input::EmailChipsInputParams;
pub use chips_input::TERMINAL_POPOVER_WIDTH;
pub use invite_app::run_invite_app;
pub use invite_card::INVITE_VISIBLE_LIMIT;
pub use invite_card::InviteCard;
pub use invite_card::button_label;
pub use invite_card::invite_config;
pub use render::renderable::Renderable;
