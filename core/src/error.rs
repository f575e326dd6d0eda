use thiserror::Error;

/// Why a token was not accepted into the [`ChipStore`](crate::ChipStore).
///
/// The `Display` output is the message shown next to the control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedToken {
    #[error("Invalid email: \"{0}\"")]
    Invalid(String),

    #[error("Duplicate email: \"{0}\"")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoveError {
    #[error("no entry at index {index} (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
