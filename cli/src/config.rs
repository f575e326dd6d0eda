use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use email_chips_core::ChipsConfig;
use email_chips_core::ErrorPolicy;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

const CHIPS_TABLE: &str = "chips";

/// Values found in the `[chips]` table of `config.toml`. Absent keys stay `None`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChipsSettings {
    pub max_emails: Option<usize>,
    pub visible_limit: Option<usize>,
    pub popover_width: Option<i32>,
    pub error_policy: Option<ErrorPolicy>,
}

impl ChipsSettings {
    /// Overwrite the fields of `config` this file sets.
    pub fn apply(&self, config: &mut ChipsConfig) {
        if let Some(max_emails) = self.max_emails {
            config.max_emails = max_emails;
        }
        if let Some(visible_limit) = self.visible_limit {
            config.visible_limit = visible_limit;
        }
        if let Some(popover_width) = self.popover_width {
            config.popover_width = popover_width;
        }
        if let Some(error_policy) = self.error_policy {
            config.error_policy = error_policy;
        }
    }

    fn set(&mut self, key: &str, raw: RawValue<'_>) {
        match key {
            "max_emails" => self.max_emails = raw.as_count(key),
            "visible_limit" => self.visible_limit = raw.as_count(key),
            "popover_width" => {
                self.popover_width = raw
                    .as_integer(key)
                    .and_then(|width| i32::try_from(width).ok());
            }
            "error_policy" => self.error_policy = raw.as_error_policy(key),
            other => tracing::debug!("ignoring unknown key `{CHIPS_TABLE}.{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the `[chips]` table. A missing file yields empty settings; a file that is not valid
    /// TOML is still scanned line by line.
    pub fn chips_settings(&self) -> anyhow::Result<ChipsSettings> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(ChipsSettings::default());
        };

        let doc = match content.parse::<DocumentMut>() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    "{} is not valid TOML, falling back to a line scan: {err}",
                    self.path.display()
                );
                return Ok(parse_chips_settings_fallback(&content));
            }
        };

        Ok(read_chips_settings(&doc))
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".email-chips").join("config.toml")
}

/// A scalar from either the parsed document or the fallback scan.
#[derive(Debug, Clone, Copy)]
enum RawValue<'a> {
    Integer(i64),
    String(&'a str),
    Other,
}

impl RawValue<'_> {
    fn as_integer(self, key: &str) -> Option<i64> {
        match self {
            RawValue::Integer(value) => Some(value),
            _ => {
                tracing::warn!("`{CHIPS_TABLE}.{key}` must be an integer");
                None
            }
        }
    }

    fn as_count(self, key: &str) -> Option<usize> {
        let value = self.as_integer(key)?;
        let count = usize::try_from(value).ok();
        if count.is_none() {
            tracing::warn!("`{CHIPS_TABLE}.{key}` must not be negative");
        }
        count
    }

    fn as_error_policy(self, key: &str) -> Option<ErrorPolicy> {
        let RawValue::String(value) = self else {
            tracing::warn!("`{CHIPS_TABLE}.{key}` must be a string");
            return None;
        };
        match ErrorPolicy::from_str(value) {
            Ok(policy) => Some(policy),
            Err(_) => {
                tracing::warn!("unknown error policy `{value}` in `{CHIPS_TABLE}.{key}`");
                None
            }
        }
    }
}

fn read_chips_settings(doc: &DocumentMut) -> ChipsSettings {
    let mut settings = ChipsSettings::default();
    let Some(chips) = doc.get(CHIPS_TABLE).and_then(TomlItem::as_table_like) else {
        return settings;
    };
    for (key, item) in chips.iter() {
        let raw = match item.as_value() {
            Some(value) => value
                .as_integer()
                .map(RawValue::Integer)
                .or_else(|| value.as_str().map(RawValue::String))
                .unwrap_or(RawValue::Other),
            None => RawValue::Other,
        };
        settings.set(key, raw);
    }
    settings
}

fn parse_chips_settings_fallback(contents: &str) -> ChipsSettings {
    let mut in_chips = false;
    let mut settings = ChipsSettings::default();

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_chips = matches!(parse_table_header_name(trimmed), Some(CHIPS_TABLE));
            continue;
        }

        if !in_chips {
            continue;
        }

        let Some(line) = strip_toml_comment(trimmed) else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        settings.set(key.trim(), parse_fallback_value(value.trim()));
    }

    settings
}

fn parse_fallback_value(token: &str) -> RawValue<'_> {
    if let Some(quoted) = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return RawValue::String(quoted);
    }
    match token.replace('_', "").parse::<i64>() {
        Ok(value) => RawValue::Integer(value),
        Err(_) => RawValue::Other,
    }
}

fn parse_table_header_name(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if !line.starts_with('[') {
        return None;
    }
    let end = line.find(']')?;
    if end <= 1 {
        return None;
    }
    let name = line[1..end].trim();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

fn strip_toml_comment(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
    if line.is_empty() { None } else { Some(line) }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(contents: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).expect("write config");
        (dir, ConfigStore::new(path))
    }

    #[test]
    fn reads_chips_table() {
        let (_dir, store) = store_with(
            r#"# top comment
[chips]
max_emails = 50
visible_limit = 3 # inline
popover_width = 40
error_policy = "collect_all"

[other]
max_emails = 1
"#,
        );

        assert_eq!(
            store.chips_settings().expect("read settings"),
            ChipsSettings {
                max_emails: Some(50),
                visible_limit: Some(3),
                popover_width: Some(40),
                error_policy: Some(ErrorPolicy::CollectAll),
            }
        );
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("config.toml"));

        assert_eq!(
            store.chips_settings().expect("read settings"),
            ChipsSettings::default()
        );
    }

    #[test]
    fn reads_chips_table_when_toml_is_invalid() {
        let (_dir, store) = store_with(
            r#"# broken table header makes this TOML invalid
[other
max_emails = 1

[chips]
max_emails = 1_000 # keep me
error_policy = "first_wins"
"#,
        );

        assert_eq!(
            store.chips_settings().expect("read settings"),
            ChipsSettings {
                max_emails: Some(1000),
                error_policy: Some(ErrorPolicy::FirstWins),
                ..ChipsSettings::default()
            }
        );
    }

    #[test]
    fn ignores_values_of_the_wrong_type() {
        let (_dir, store) = store_with(
            r#"[chips]
max_emails = "many"
visible_limit = -1
error_policy = "loudest"
popover_width = 30
"#,
        );

        assert_eq!(
            store.chips_settings().expect("read settings"),
            ChipsSettings {
                popover_width: Some(30),
                ..ChipsSettings::default()
            }
        );
    }

    #[test]
    fn apply_only_overrides_present_keys() {
        let mut config = ChipsConfig {
            visible_limit: 5,
            ..ChipsConfig::default()
        };
        ChipsSettings {
            max_emails: Some(10),
            ..ChipsSettings::default()
        }
        .apply(&mut config);

        assert_eq!(config.max_emails, 10);
        assert_eq!(config.visible_limit, 5);
        assert_eq!(config.error_policy, ErrorPolicy::KeepLast);
    }

    #[test]
    fn default_config_path_uses_email_chips_home_dir() {
        let home = Path::new("home");
        assert_eq!(
            default_config_path(home),
            home.join(".email-chips").join("config.toml")
        );
    }
}
