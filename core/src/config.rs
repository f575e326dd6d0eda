use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumString;

use crate::popover::DEFAULT_POPOVER_WIDTH;

pub const DEFAULT_MAX_EMAILS: usize = 200;
pub const DEFAULT_VISIBLE_LIMIT: usize = 2;

/// Which rejection messages survive a `submit` batch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorPolicy {
    /// Every failure overwrites the previous message; the last one in a batch is shown.
    #[default]
    KeepLast,
    /// The first failure of a batch replaces the old message; later failures are ignored.
    FirstWins,
    /// All failures of a batch are kept and shown together.
    CollectAll,
}

/// Construction-time settings for one chip input control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipsConfig {
    /// Hard cap on accepted entries.
    pub max_emails: usize,
    /// Entries shown inline before the rest collapse behind the "+N" trigger.
    pub visible_limit: usize,
    /// Popover width, in the same units as the geometry handed to the popover controller.
    pub popover_width: i32,
    pub error_policy: ErrorPolicy,
}

impl Default for ChipsConfig {
    fn default() -> Self {
        Self {
            max_emails: DEFAULT_MAX_EMAILS,
            visible_limit: DEFAULT_VISIBLE_LIMIT,
            popover_width: DEFAULT_POPOVER_WIDTH,
            error_policy: ErrorPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ChipsConfig =
            serde_json::from_str(r#"{"visible_limit": 5}"#).expect("parse config");
        assert_eq!(
            config,
            ChipsConfig {
                visible_limit: 5,
                ..ChipsConfig::default()
            }
        );
        assert_eq!(config.max_emails, 200);
        assert_eq!(config.popover_width, 321);
    }

    #[test]
    fn error_policy_uses_snake_case_names() {
        assert_eq!(ErrorPolicy::CollectAll.to_string(), "collect_all");
        assert_eq!(
            ErrorPolicy::from_str("first_wins").expect("parse policy"),
            ErrorPolicy::FirstWins
        );
        let parsed: ErrorPolicy = serde_json::from_str(r#""keep_last""#).expect("parse policy");
        assert_eq!(parsed, ErrorPolicy::KeepLast);
    }
}
