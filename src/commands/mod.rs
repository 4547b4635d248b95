pub mod accounts;
pub mod auth;
pub mod chats;
pub mod contacts;
pub mod messages;

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dialoguer::Confirm;
use serde::Serialize;
use tracing::debug;

use crate::api::ApiClient;
pub(crate) use crate::config::non_empty;
use crate::config::Config;
use crate::dates;
use crate::errors::CliError;
use crate::output::{self, OutputMode, Render};

/// A leaf (or group) of the command tree.
pub(crate) trait Run {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError>;
}

#[derive(Clone, Debug, Default)]
pub struct GlobalFlags {
    pub output: OutputMode,
    pub timeout: Option<Duration>,
    pub base_url: Option<String>,
    pub force: bool,
}

/// Everything a command needs from the outside world, resolved once in `main`.
pub struct Context {
    pub config: Config,
    pub flags: GlobalFlags,
    pub interactive: bool,
    pub now: DateTime<Utc>,
}

impl Context {
    pub fn base_url(&self) -> &str {
        self.flags
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.config.base_url.as_str())
    }

    pub fn client(&self) -> Result<ApiClient, CliError> {
        let (token, source) = self.config.get_token()?;
        debug!(source = %source, base_url = self.base_url(), "creating api client");
        Ok(ApiClient::new(self.base_url(), token, self.flags.timeout)?)
    }

    pub fn emit<T: Render + Serialize + ?Sized>(&self, out: &mut dyn Write, value: &T) -> Result<(), CliError> {
        output::emit(out, self.flags.output, value)?;
        Ok(())
    }
}

pub fn output_mode(json: bool, plain: bool) -> Result<OutputMode, CliError> {
    match (json, plain) {
        (true, true) => Err(CliError::usage("cannot use both --json and --plain")),
        (true, false) => Ok(OutputMode::Json),
        (false, true) => Ok(OutputMode::Plain),
        (false, false) => Ok(OutputMode::Human),
    }
}

/// Asks before destructive actions. Without a terminal the action is refused
/// unless `--force` was given.
pub fn confirm_destructive(ctx: &Context, action: &str) -> Result<(), CliError> {
    if ctx.flags.force {
        return Ok(());
    }
    if !ctx.interactive {
        return Err(CliError::usage(format!(
            "refusing to {action} without confirmation (use --force in non-interactive mode)"
        )));
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Are you sure you want to {action}?"))
        .default(false)
        .interact()?;
    if !confirmed {
        return Err(CliError::usage(format!("cancelled: {action}")));
    }
    Ok(())
}

pub fn parse_date_flag(
    flag: &str,
    value: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, CliError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    dates::parse_time(raw, now)
        .map(Some)
        .map_err(|_| CliError::usage(format!("invalid --{flag} {raw:?} (expected RFC3339 or duration)")))
}

pub fn require(value: &str, message: &str) -> Result<String, CliError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::usage(message));
    }
    Ok(value.to_string())
}

pub fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_stdin() -> Result<String, CliError> {
    Ok(io::read_to_string(io::stdin())?)
}

#[derive(Serialize)]
pub struct VersionOutput {
    pub version: &'static str,
}

impl VersionOutput {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Render for VersionOutput {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", self.version)
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "beeper {}", self.version)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::config::Env;
    use chrono::TimeZone;
    use std::path::Path;

    /// Context with no tokens and a private config dir.
    pub fn context(config_home: &Path) -> Context {
        Context {
            config: Config::load(Env {
                config_home: Some(config_home.to_path_buf()),
                ..Env::default()
            }),
            flags: GlobalFlags::default(),
            interactive: false,
            now: Utc
                .with_ymd_and_hms(2026, 1, 28, 15, 4, 5)
                .single()
                .expect("valid datetime"),
        }
    }

    pub fn assert_usage(result: Result<(), CliError>, needle: &str) {
        match result {
            Err(CliError::Usage(message)) => assert!(
                message.contains(needle),
                "usage message {message:?} should contain {needle:?}"
            ),
            Err(other) => panic!("expected usage error, got {other:?}"),
            Ok(()) => panic!("expected usage error, got success"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn json_and_plain_conflict() {
        let error = output_mode(true, true).expect_err("conflict");
        assert!(error.is_usage());
        assert!(error.to_string().contains("cannot use both --json and --plain"));

        assert_eq!(output_mode(true, false).expect("json"), OutputMode::Json);
        assert_eq!(output_mode(false, true).expect("plain"), OutputMode::Plain);
        assert_eq!(output_mode(false, false).expect("human"), OutputMode::Human);
    }

    #[test]
    fn confirm_destructive_refuses_non_interactive() {
        let tmp = TempDir::new().expect("tempdir");
        let ctx = testutil::context(tmp.path());
        testutil::assert_usage(confirm_destructive(&ctx, "archive chat"), "archive chat");
    }

    #[test]
    fn confirm_destructive_skips_prompt_with_force() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctx = testutil::context(tmp.path());
        ctx.flags.force = true;
        assert!(confirm_destructive(&ctx, "archive chat").is_ok());
    }

    #[test]
    fn date_flags_report_the_flag_name() {
        let tmp = TempDir::new().expect("tempdir");
        let ctx = testutil::context(tmp.path());

        assert_eq!(parse_date_flag("date-after", None, ctx.now).expect("none"), None);
        assert_eq!(parse_date_flag("date-after", Some("  "), ctx.now).expect("blank"), None);
        assert!(parse_date_flag("date-after", Some("2h"), ctx.now).expect("2h").is_some());

        let error = parse_date_flag("date-before", Some("nope"), ctx.now).expect_err("invalid");
        assert!(error.is_usage());
        assert!(error.to_string().contains("--date-before \"nope\""));
    }

    #[test]
    fn flag_base_url_overrides_config() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctx = testutil::context(tmp.path());
        assert_eq!(ctx.base_url(), crate::config::DEFAULT_BASE_URL);

        ctx.flags.base_url = Some("http://127.0.0.1:4000".to_string());
        assert_eq!(ctx.base_url(), "http://127.0.0.1:4000");
    }

    #[test]
    fn client_requires_a_token() {
        let tmp = TempDir::new().expect("tempdir");
        let ctx = testutil::context(tmp.path());
        let error = ctx.client().err().expect("missing token");
        assert!(matches!(error, CliError::Config(crate::config::ConfigError::NoToken)));
        assert!(!error.is_usage());
    }
}
