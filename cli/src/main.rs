mod config;
mod output;

use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use email_chips_core::ChipsConfig;
use email_chips_core::ErrorPolicy;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::ConfigStore;

const LOG_FILTER_ENV: &str = "EMAIL_CHIPS_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
enum CliErrorPolicy {
    KeepLast,
    FirstWins,
    CollectAll,
}

impl From<CliErrorPolicy> for ErrorPolicy {
    fn from(policy: CliErrorPolicy) -> Self {
        match policy {
            CliErrorPolicy::KeepLast => ErrorPolicy::KeepLast,
            CliErrorPolicy::FirstWins => ErrorPolicy::FirstWins,
            CliErrorPolicy::CollectAll => ErrorPolicy::CollectAll,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Collect email addresses in an inline chip input and print each submitted batch"
)]
struct Cli {
    /// Maximum number of accepted addresses (must be >= 1).
    #[arg(long, env = "EMAIL_CHIPS_MAX_EMAILS")]
    max_emails: Option<usize>,

    /// Addresses shown inline before the rest collapse behind `+N`.
    #[arg(long, env = "EMAIL_CHIPS_VISIBLE_LIMIT")]
    visible_limit: Option<usize>,

    /// Width of the overflow popover, in terminal cells.
    #[arg(long)]
    popover_width: Option<i32>,

    /// Which rejection messages are kept when several tokens of one batch fail.
    #[arg(long, value_enum)]
    error_policy: Option<CliErrorPolicy>,

    /// Config file to read instead of `~/.email-chips/config.toml`.
    #[arg(long, env = "EMAIL_CHIPS_CONFIG")]
    config: Option<PathBuf>,

    /// Append logs to this file. The terminal belongs to the UI, so nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the submitted batches as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ChipsConfig) {
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
            config.error_policy = error_policy.into();
        }
    }
}

/// Invite-card defaults, then the config file, then command-line flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<ChipsConfig> {
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let settings = store
        .chips_settings()
        .with_context(|| format!("load {}", store.path().display()))?;

    let mut config = email_chips_tui::invite_config();
    settings.apply(&mut config);
    cli.apply_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ChipsConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        config.max_emails >= 1,
        "max_emails must be at least 1 (got {})",
        config.max_emails
    );
    anyhow::ensure!(
        config.popover_width >= 1,
        "popover_width must be at least 1 (got {})",
        config.popover_width
    );
    Ok(())
}

fn setup_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(log_path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(path = %log_path.display(), "tracing initialized");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.log_file.as_deref())?;

    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");

    let batches = email_chips_tui::run_invite_app(config).await?;

    let mut stdout = std::io::stdout().lock();
    output::write_batches(&mut stdout, &batches, cli.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cli_with_config(args: &[&str], config_toml: &str) -> (tempfile::TempDir, Cli) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, config_toml).expect("write config");

        let path_arg = path.display().to_string();
        let mut argv = vec!["email-chips", "--config", path_arg.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("parse args");
        (dir, cli)
    }

    #[test]
    fn flags_override_the_config_file() {
        let (_dir, cli) = cli_with_config(
            &["--visible-limit", "3", "--error-policy", "collect-all"],
            "[chips]\nvisible_limit = 8\nmax_emails = 20\n",
        );

        let config = resolve_config(&cli).expect("resolve config");

        assert_eq!(
            config,
            ChipsConfig {
                max_emails: 20,
                visible_limit: 3,
                popover_width: email_chips_tui::TERMINAL_POPOVER_WIDTH,
                error_policy: ErrorPolicy::CollectAll,
            }
        );
    }

    #[test]
    fn defaults_follow_the_invite_card() {
        let (_dir, cli) = cli_with_config(&[], "");

        let config = resolve_config(&cli).expect("resolve config");

        assert_eq!(config, email_chips_tui::invite_config());
        assert_eq!(config.visible_limit, email_chips_tui::INVITE_VISIBLE_LIMIT);
        assert_eq!(config.max_emails, email_chips_core::DEFAULT_MAX_EMAILS);
    }

    #[test]
    fn zero_max_emails_is_rejected() {
        let (_dir, cli) = cli_with_config(&["--max-emails", "0"], "");

        let err = resolve_config(&cli).expect_err("zero cap");
        assert_eq!(err.to_string(), "max_emails must be at least 1 (got 0)");
    }

    #[test]
    fn non_positive_popover_width_from_file_is_rejected() {
        let (_dir, cli) = cli_with_config(&[], "[chips]\npopover_width = 0\n");

        assert!(resolve_config(&cli).is_err());
    }
}
