use std::io::Write;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{Context, Run, clean_list, non_empty, parse_date_flag, read_stdin, require};
use crate::api::{ChatType, Direction, MessageListParams, MessageSearchParams, SendParams};
use crate::errors::CliError;

const MAX_SEARCH_LIMIT: i64 = 20;
const MEDIA_TYPES: [&str; 5] = ["any", "image", "video", "link", "file"];

#[derive(Subcommand)]
pub enum MessagesCommand {
    #[command(about = "List messages in a chat")]
    List(MessagesListArgs),
    #[command(about = "Search messages across chats (literal word match)")]
    Search(MessagesSearchArgs),
    #[command(about = "Send a text message to a chat")]
    Send(MessagesSendArgs),
}

impl Run for MessagesCommand {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            MessagesCommand::List(args) => args.run(ctx, out).await,
            MessagesCommand::Search(args) => args.run(ctx, out).await,
            MessagesCommand::Send(args) => args.run(ctx, out).await,
        }
    }
}

#[derive(Args)]
pub struct MessagesListArgs {
    #[arg(value_name = "CHAT_ID")]
    pub chat_id: String,

    #[arg(long, help = "Pagination cursor from a previous page")]
    pub cursor: Option<String>,

    #[arg(long, value_enum, default_value = "before", help = "Page direction relative to the cursor")]
    pub direction: Direction,
}

impl Run for MessagesListArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let chat_id = require(&self.chat_id, "chat ID is required")?;
        let params = MessageListParams {
            cursor: non_empty(self.cursor.as_deref()),
            direction: Some(self.direction),
        };

        let client = ctx.client()?;
        let result = client.list_messages(&chat_id, &params).await?;
        ctx.emit(out, &result)
    }
}

#[derive(Args)]
pub struct MessagesSearchArgs {
    #[arg(help = "Literal words to match")]
    pub query: Option<String>,

    #[arg(long = "account-ids", value_delimiter = ',', help = "Limit to these account IDs (comma-separated)")]
    pub account_ids: Vec<String>,

    #[arg(long = "chat-id", value_delimiter = ',', help = "Limit to these chat IDs (repeatable)")]
    pub chat_ids: Vec<String>,

    #[arg(long = "chat-type", value_enum)]
    pub chat_type: Option<ChatType>,

    #[arg(long, help = "Sender filter: me, others, or a user ID")]
    pub sender: Option<String>,

    #[arg(long = "media-types", value_delimiter = ',', help = "any, image, video, link, file")]
    pub media_types: Vec<String>,

    #[arg(long = "date-after", help = "RFC3339 timestamp, date, or duration like 24h or 7d")]
    pub date_after: Option<String>,

    #[arg(long = "date-before", help = "RFC3339 timestamp, date, or duration like 24h or 7d")]
    pub date_before: Option<String>,

    #[arg(long = "include-muted", num_args = 0..=1, default_missing_value = "true")]
    pub include_muted: Option<bool>,

    #[arg(long = "exclude-low-priority", num_args = 0..=1, default_missing_value = "true")]
    pub exclude_low_priority: Option<bool>,

    #[arg(long)]
    pub cursor: Option<String>,

    #[arg(long, value_enum)]
    pub direction: Option<Direction>,

    #[arg(long, default_value_t = MAX_SEARCH_LIMIT, allow_negative_numbers = true, help = "Results per page (1-20)")]
    pub limit: i64,
}

impl MessagesSearchArgs {
    fn params(&self, now: DateTime<Utc>) -> Result<MessageSearchParams, CliError> {
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.limit) {
            return Err(CliError::usage(format!(
                "invalid --limit {} (expected 1-{MAX_SEARCH_LIMIT})",
                self.limit
            )));
        }

        let media_types = clean_list(&self.media_types);
        if let Some(bad) = media_types.iter().find(|kind| !MEDIA_TYPES.contains(&kind.as_str())) {
            return Err(CliError::usage(format!(
                "invalid --media-types {bad:?} (expected {})",
                MEDIA_TYPES.join("|")
            )));
        }

        Ok(MessageSearchParams {
            query: non_empty(self.query.as_deref()),
            account_ids: clean_list(&self.account_ids),
            chat_ids: clean_list(&self.chat_ids),
            chat_type: self.chat_type,
            sender: non_empty(self.sender.as_deref()),
            media_types,
            date_after: parse_date_flag("date-after", self.date_after.as_deref(), now)?,
            date_before: parse_date_flag("date-before", self.date_before.as_deref(), now)?,
            include_muted: self.include_muted,
            exclude_low_priority: self.exclude_low_priority,
            cursor: non_empty(self.cursor.as_deref()),
            direction: self.direction,
            limit: u32::try_from(self.limit).ok(),
        })
    }
}

impl Run for MessagesSearchArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let params = self.params(ctx.now)?;

        let client = ctx.client()?;
        let result = client.search_messages(&params).await?;
        ctx.emit(out, &result)
    }
}

#[derive(Args)]
pub struct MessagesSendArgs {
    #[arg(value_name = "CHAT_ID")]
    pub chat_id: String,

    #[arg(help = "Message text")]
    pub text: Option<String>,

    #[arg(long = "reply-to", value_name = "MESSAGE_ID", help = "Reply to this message")]
    pub reply_to: Option<String>,

    #[arg(long, help = "Read the message text from stdin")]
    pub stdin: bool,
}

impl MessagesSendArgs {
    /// Message text exactly as given. Only the line ending `--stdin` input
    /// picks up from the terminal or a pipe is stripped.
    fn text(&self) -> Result<String, CliError> {
        let text = match (&self.text, self.stdin) {
            (Some(_), true) => {
                return Err(CliError::usage("pass message text as an argument or --stdin, not both"));
            }
            (Some(text), false) => text.clone(),
            (None, true) => strip_line_ending(read_stdin()?),
            (None, false) => String::new(),
        };
        if text.trim().is_empty() {
            return Err(CliError::usage("message text is required"));
        }
        Ok(text)
    }
}

fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

impl Run for MessagesSendArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let chat_id = require(&self.chat_id, "chat ID is required")?;
        let params = SendParams {
            text: self.text()?,
            reply_to_message_id: non_empty(self.reply_to.as_deref()),
        };

        let client = ctx.client()?;
        let result = client.send_message(&chat_id, &params).await?;
        ctx.emit(out, &result)
    }
}
