//! Application-level events used to coordinate UI actions.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The chip input's accepted entries changed (add, remove or batch add). Carries the full,
    /// ordered list so receivers can stay idempotent.
    EntriesChanged(Vec<String>),
}
