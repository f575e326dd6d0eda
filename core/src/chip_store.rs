//! Ordered, case-insensitively deduplicated collection of accepted email entries.
//!
//! The store owns the accept/reject policy for raw text and the user-visible rejection message.
//! Entries keep the casing they were typed with; uniqueness is decided on the lowercased form.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ChipsConfig;
use crate::ErrorPolicy;
use crate::RejectedToken;
use crate::RemoveError;
use crate::tokenizer::split_tokens;
use crate::validator::is_email;

/// A validated, accepted email address, stored as typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(String);

impl Entry {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form used for duplicate detection.
    fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for Entry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single [`ChipStore::submit`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Number of tokens appended to the store.
    pub added: usize,
    /// Tokens rejected in this batch, in the order they were seen.
    pub rejected: Vec<RejectedToken>,
    /// Tokens discarded without inspection because the store was full.
    pub dropped: usize,
}

impl SubmitOutcome {
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

#[derive(Debug, Clone)]
pub struct ChipStore {
    entries: Vec<Entry>,
    max_entries: usize,
    error_policy: ErrorPolicy,
    errors: Vec<RejectedToken>,
}

impl ChipStore {
    pub fn new(max_entries: usize, error_policy: ErrorPolicy) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            error_policy,
            errors: Vec::new(),
        }
    }

    pub fn from_config(config: &ChipsConfig) -> Self {
        Self::new(config.max_emails, config.error_policy)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Owned copy of the entries, as handed to change listeners.
    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_entries
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, address: &str) -> bool {
        let key = address.to_lowercase();
        self.entries.iter().any(|e| e.key() == key)
    }

    /// Rejections currently on display, oldest first.
    pub fn errors(&self) -> &[RejectedToken] {
        &self.errors
    }

    /// The message to show next to the control, if any.
    pub fn last_error(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        Some(messages.join("; "))
    }

    /// Called whenever the pending text is edited.
    pub fn clear_error(&mut self) {
        self.errors.clear();
    }

    /// Tokenize `raw` and try to accept each token in order.
    ///
    /// Returns `None` when `raw` holds no tokens at all; the caller decides what to do with its
    /// pending text in that case. Processing stops as soon as the store is full, and the remaining
    /// tokens are counted in [`SubmitOutcome::dropped`] without producing a message.
    ///
    /// Rejections from this batch replace whatever message was showing (filtered through the
    /// configured [`ErrorPolicy`]). A batch that only adds entries clears the message.
    pub fn submit(&mut self, raw: &str) -> Option<SubmitOutcome> {
        let tokens = split_tokens(raw);
        if tokens.is_empty() {
            return None;
        }

        let mut seen: HashSet<String> = self.entries.iter().map(Entry::key).collect();
        let mut outcome = SubmitOutcome::default();
        let mut remaining = tokens.into_iter();

        while self.entries.len() < self.max_entries {
            let Some(token) = remaining.next() else {
                break;
            };

            if !is_email(&token) {
                outcome.rejected.push(RejectedToken::Invalid(token));
                continue;
            }

            if !seen.insert(token.to_lowercase()) {
                outcome.rejected.push(RejectedToken::Duplicate(token));
                continue;
            }

            self.entries.push(Entry(token));
            outcome.added += 1;
        }
        outcome.dropped = remaining.count();

        if !outcome.rejected.is_empty() {
            self.record_rejections(&outcome.rejected);
        } else if outcome.added > 0 {
            self.errors.clear();
        }

        tracing::debug!(
            added = outcome.added,
            rejected = outcome.rejected.len(),
            dropped = outcome.dropped,
            total = self.entries.len(),
            "submitted chip batch"
        );
        Some(outcome)
    }

    /// Remove the entry at `index`, keeping the relative order of the rest.
    pub fn remove_at(&mut self, index: usize) -> Result<Entry, RemoveError> {
        if index >= self.entries.len() {
            return Err(RemoveError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    fn record_rejections(&mut self, rejected: &[RejectedToken]) {
        let kept = match self.error_policy {
            ErrorPolicy::KeepLast => rejected.last().into_iter().cloned().collect(),
            ErrorPolicy::FirstWins => rejected.first().into_iter().cloned().collect(),
            ErrorPolicy::CollectAll => rejected.to_vec(),
        };
        self.errors = kept;
    }
}

impl Default for ChipStore {
    fn default() -> Self {
        Self::from_config(&ChipsConfig::default())
    }
}
