//! Headless state engine for an email "chip" input.
//!
//! Raw text flows one way: [`tokenizer`] splits it, [`validator`] checks each token, and
//! [`ChipStore`] accepts or rejects it. [`OverflowView`] and [`PopoverController`] are derived
//! views over the store that front ends render.

mod chip_store;
mod config;
mod error;
pub mod popover;
pub mod tokenizer;
pub mod validator;
mod visibility;

pub use chip_store::ChipStore;
pub use chip_store::Entry;
pub use chip_store::SubmitOutcome;
pub use config::ChipsConfig;
pub use config::DEFAULT_MAX_EMAILS;
pub use config::DEFAULT_VISIBLE_LIMIT;
pub use config::ErrorPolicy;
pub use error::RejectedToken;
pub use error::RemoveError;
pub use popover::AnchorGeometry;
pub use popover::DEFAULT_POPOVER_WIDTH;
pub use popover::PopoverController;
pub use visibility::OverflowView;
