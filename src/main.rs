mod api;
mod commands;
mod config;
mod dates;
mod display;
mod errors;
mod logging;
mod output;

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::commands::accounts::AccountsCommand;
use crate::commands::auth::AuthCommand;
use crate::commands::chats::ChatsCommand;
use crate::commands::contacts::ContactsCommand;
use crate::commands::messages::MessagesCommand;
use crate::commands::{Context, GlobalFlags, Run, VersionOutput, output_mode};
use crate::config::{Config, Env};
use crate::errors::{CliError, EXIT_ERROR, EXIT_OK, EXIT_USAGE};

#[derive(Parser)]
#[command(
    name = "beeper",
    version,
    about = "Beeper Desktop CLI",
    after_help = "Examples:\n  beeper auth set <token>\n  beeper accounts list\n  beeper contacts search whatsapp \"jamie\"\n  beeper chats search \"lunch\" --unread-only\n  beeper chats create whatsapp --participant @jamie\n  beeper messages list <chat-id> --json\n  beeper messages search \"invoice\" --date-after 7d --limit 10\n  beeper messages send <chat-id> \"on my way\"\n  echo \"hello\" | beeper messages send <chat-id> --stdin"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, help = "Output JSON")]
    json: bool,

    #[arg(long, global = true, help = "Output tab-separated values")]
    plain: bool,

    #[arg(long, global = true, default_value_t = 30, value_name = "SECS", help = "Request timeout in seconds (0 disables)")]
    timeout: u64,

    #[arg(long = "base-url", global = true, value_name = "URL", help = "Beeper Desktop API base URL")]
    base_url: Option<String>,

    #[arg(long = "no-input", global = true, help = "Never prompt; fail instead")]
    no_input: bool,

    #[arg(long, global = true, help = "Skip confirmation prompts")]
    force: bool,

    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Manage the access token")]
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    #[command(about = "List connected accounts")]
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
    #[command(about = "Search contacts")]
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
    #[command(about = "Search, create and archive chats")]
    Chats {
        #[command(subcommand)]
        command: ChatsCommand,
    },
    #[command(about = "List, search and send messages")]
    Messages {
        #[command(subcommand)]
        command: MessagesCommand,
    },
    #[command(about = "Print the CLI version")]
    Version,
}

impl Run for Command {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            Command::Auth { command } => command.run(ctx, out).await,
            Command::Accounts { command } => command.run(ctx, out).await,
            Command::Contacts { command } => command.run(ctx, out).await,
            Command::Chats { command } => command.run(ctx, out).await,
            Command::Messages { command } => command.run(ctx, out).await,
            Command::Version => ctx.emit(out, &VersionOutput::current()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return exit_code(if err.use_stderr() { EXIT_USAGE } else { EXIT_OK });
        }
    };

    let env = Env::from_process();
    logging::init(cli.verbose, env.log_filter.as_deref());

    match run(cli, env).await {
        Ok(()) => exit_code(EXIT_OK),
        Err(error) => {
            debug!(?error, "command failed");
            eprintln!("error: {error}");
            exit_code(error.exit_code())
        }
    }
}

async fn run(cli: Cli, env: Env) -> Result<(), CliError> {
    let flags = GlobalFlags {
        output: output_mode(cli.json, cli.plain)?,
        timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
        base_url: cli.base_url,
        force: cli.force,
    };
    let ctx = Context {
        config: Config::load(env),
        flags,
        interactive: !cli.no_input && io::stdin().is_terminal(),
        now: Utc::now(),
    };

    let mut stdout = io::stdout();
    cli.command.run(&ctx, &mut stdout).await
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_ERROR as u8))
}
