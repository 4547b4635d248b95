use std::io::{self, Write};

use clap::{Args, Subcommand};
use serde::Serialize;

use super::{Context, Run, confirm_destructive, read_stdin, require};
use crate::config::{ConfigError, TokenSource};
use crate::errors::CliError;
use crate::output::{Render, warn};

#[derive(Subcommand)]
pub enum AuthCommand {
    #[command(about = "Save an access token to the config file")]
    Set(AuthSetArgs),
    #[command(about = "Show which access token is in effect")]
    Status,
    #[command(about = "Remove the saved access token")]
    Clear,
}

impl Run for AuthCommand {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            AuthCommand::Set(args) => args.run(ctx, out).await,
            AuthCommand::Status => status(ctx, out),
            AuthCommand::Clear => clear(ctx, out),
        }
    }
}

#[derive(Args)]
pub struct AuthSetArgs {
    #[arg(help = "Access token from Beeper Desktop settings")]
    pub token: Option<String>,

    #[arg(long, help = "Read the token from stdin")]
    pub stdin: bool,
}

impl AuthSetArgs {
    fn token(&self) -> Result<String, CliError> {
        match (&self.token, self.stdin) {
            (Some(_), true) => Err(CliError::usage("pass the token as an argument or --stdin, not both")),
            (Some(token), false) => require(token, "token is required"),
            (None, true) => require(&read_stdin()?, "token is required"),
            (None, false) => Err(CliError::usage("token is required (pass it as an argument or use --stdin)")),
        }
    }
}

#[derive(Serialize)]
struct AuthSetOutput {
    saved: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    overridden_by: Option<&'static str>,
}

impl Render for AuthSetOutput {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", self.path)
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Token saved to {}", self.path)?;
        if let Some(var) = self.overridden_by {
            warn(out, &format!("Note: {var} is set and takes precedence over the config file"))?;
        }
        Ok(())
    }
}

impl Run for AuthSetArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let token = self.token()?;
        let path = ctx.config.set_token(&token)?;
        let overridden_by = match ctx.config.get_token() {
            Ok((_, source)) if source != TokenSource::Config => Some(source.describe()),
            _ => None,
        };
        ctx.emit(
            out,
            &AuthSetOutput {
                saved: true,
                path: path.display().to_string(),
                overridden_by,
            },
        )
    }
}

#[derive(Serialize)]
struct AuthStatusOutput {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    config_path: String,
    base_url: String,
}

impl Render for AuthStatusOutput {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "{}\t{}\t{}",
            self.authenticated,
            self.source.unwrap_or(""),
            self.token.as_deref().unwrap_or("")
        )
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        match (self.source, self.token.as_deref()) {
            (Some(source), Some(token)) => {
                writeln!(out, "Authenticated")?;
                writeln!(out, "Token:    {token}")?;
                writeln!(out, "Source:   {source}")?;
            }
            _ => {
                warn(out, "Not authenticated")?;
                writeln!(out, "Run `beeper auth set <token>` or set BEEPER_TOKEN.")?;
            }
        }
        writeln!(out, "Config:   {}", self.config_path)?;
        writeln!(out, "Base URL: {}", self.base_url)
    }
}

fn status(ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
    let config_path = ctx
        .config
        .file_path()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    let resolved = match ctx.config.get_token() {
        Ok(resolved) => Some(resolved),
        Err(ConfigError::NoToken) => None,
        Err(err) => return Err(err.into()),
    };
    let (source, token) = match resolved {
        Some((token, source)) => (Some(source.as_str()), Some(mask_token(&token))),
        None => (None, None),
    };
    ctx.emit(
        out,
        &AuthStatusOutput {
            authenticated: token.is_some(),
            source,
            token,
            config_path,
            base_url: ctx.base_url().to_string(),
        },
    )
}

#[derive(Serialize)]
struct AuthClearOutput {
    cleared: bool,
    path: String,
}

impl Render for AuthClearOutput {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}\t{}", self.cleared, self.path)
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.cleared {
            writeln!(out, "Token removed from {}", self.path)
        } else {
            warn(out, "No saved token")
        }
    }
}

fn clear(ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
    confirm_destructive(ctx, "remove the saved access token")?;
    let path = ctx.config.file_path()?;
    let cleared = ctx.config.clear_token()?;
    ctx.emit(
        out,
        &AuthClearOutput {
            cleared,
            path: path.display().to_string(),
        },
    )
}

/// Keeps the first and last four characters of long tokens.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
