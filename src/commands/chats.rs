use std::io::Write;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{
    Context, Run, clean_list, confirm_destructive, non_empty, parse_date_flag, require,
};
use crate::api::{ChatSearchParams, ChatType, ChatTypeFilter, CreateChatParams, Direction, Inbox};
use crate::errors::CliError;

const MAX_CHAT_LIMIT: i64 = 200;

#[derive(Subcommand)]
pub enum ChatsCommand {
    #[command(about = "Search chats by title or participants")]
    Search(ChatsSearchArgs),
    #[command(about = "Create a single or group chat")]
    Create(ChatsCreateArgs),
    #[command(about = "Archive or unarchive a chat")]
    Archive(ChatsArchiveArgs),
}

impl Run for ChatsCommand {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            ChatsCommand::Search(args) => args.run(ctx, out).await,
            ChatsCommand::Create(args) => args.run(ctx, out).await,
            ChatsCommand::Archive(args) => args.run(ctx, out).await,
        }
    }
}

#[derive(Args)]
pub struct ChatsSearchArgs {
    pub query: Option<String>,

    #[arg(long = "account-ids", value_delimiter = ',', help = "Limit to these account IDs (comma-separated)")]
    pub account_ids: Vec<String>,

    #[arg(long = "type", value_enum)]
    pub chat_type: Option<ChatTypeFilter>,

    #[arg(long, value_enum)]
    pub inbox: Option<Inbox>,

    #[arg(long = "unread-only")]
    pub unread_only: bool,

    #[arg(long = "include-muted", num_args = 0..=1, default_missing_value = "true")]
    pub include_muted: Option<bool>,

    #[arg(long = "last-activity-after")]
    pub last_activity_after: Option<String>,

    #[arg(long = "last-activity-before")]
    pub last_activity_before: Option<String>,

    #[arg(long)]
    pub cursor: Option<String>,

    #[arg(long, value_enum)]
    pub direction: Option<Direction>,

    #[arg(long, default_value_t = 20, allow_negative_numbers = true, help = "Results per page (1-200)")]
    pub limit: i64,
}

impl ChatsSearchArgs {
    fn params(&self, now: DateTime<Utc>) -> Result<ChatSearchParams, CliError> {
        if !(1..=MAX_CHAT_LIMIT).contains(&self.limit) {
            return Err(CliError::usage(format!(
                "invalid --limit {} (expected 1-{MAX_CHAT_LIMIT})",
                self.limit
            )));
        }

        Ok(ChatSearchParams {
            query: non_empty(self.query.as_deref()),
            account_ids: clean_list(&self.account_ids),
            chat_type: self.chat_type,
            inbox: self.inbox,
            unread_only: self.unread_only,
            include_muted: self.include_muted,
            last_activity_after: parse_date_flag(
                "last-activity-after",
                self.last_activity_after.as_deref(),
                now,
            )?,
            last_activity_before: parse_date_flag(
                "last-activity-before",
                self.last_activity_before.as_deref(),
                now,
            )?,
            cursor: non_empty(self.cursor.as_deref()),
            direction: self.direction,
            limit: u32::try_from(self.limit).ok(),
        })
    }
}

impl Run for ChatsSearchArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let params = self.params(ctx.now)?;

        let client = ctx.client()?;
        let result = client.search_chats(&params).await?;
        ctx.emit(out, &result)
    }
}

#[derive(Args)]
pub struct ChatsCreateArgs {
    #[arg(value_name = "ACCOUNT_ID")]
    pub account_id: String,

    #[arg(long = "participant", value_name = "USER_ID", help = "Participant user ID (repeatable)")]
    pub participants: Vec<String>,

    #[arg(long = "type", value_enum, default_value = "single")]
    pub chat_type: ChatType,

    #[arg(long, help = "Group title")]
    pub title: Option<String>,

    #[arg(long = "message", help = "First message to send")]
    pub message: Option<String>,
}

impl ChatsCreateArgs {
    fn params(&self) -> Result<CreateChatParams, CliError> {
        let account_id = require(&self.account_id, "account ID is required")?;
        let participant_ids = clean_list(&self.participants);
        if participant_ids.is_empty() {
            return Err(CliError::usage("at least one --participant is required"));
        }
        match self.chat_type {
            ChatType::Single if participant_ids.len() != 1 => {
                return Err(CliError::usage("single chats require exactly one --participant"));
            }
            ChatType::Group if participant_ids.len() < 2 => {
                return Err(CliError::usage("group chats require at least two --participant values"));
            }
            _ => {}
        }

        Ok(CreateChatParams {
            account_id,
            participant_ids,
            chat_type: self.chat_type,
            title: non_empty(self.title.as_deref()),
            message_text: non_empty(self.message.as_deref()),
        })
    }
}

impl Run for ChatsCreateArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let params = self.params()?;

        let client = ctx.client()?;
        let result = client.create_chat(&params).await?;
        ctx.emit(out, &result)
    }
}

#[derive(Args)]
pub struct ChatsArchiveArgs {
    #[arg(value_name = "CHAT_ID")]
    pub chat_id: String,

    #[arg(long, help = "Move the chat back to the inbox")]
    pub unarchive: bool,
}

impl Run for ChatsArchiveArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let chat_id = require(&self.chat_id, "chat ID is required")?;
        let archived = !self.unarchive;
        if archived {
            confirm_destructive(ctx, &format!("archive chat {chat_id}"))?;
        }

        let client = ctx.client()?;
        let result = client.archive_chat(&chat_id, archived).await?;
        ctx.emit(out, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil;
    use tempfile::TempDir;

    fn create(chat_type: ChatType, participants: &[&str]) -> ChatsCreateArgs {
        ChatsCreateArgs {
            account_id: "whatsapp".to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            chat_type,
            title: None,
            message: None,
        }
    }

    #[tokio::test]
    async fn create_validates_participant_counts() {
        let tmp = TempDir::new().expect("tempdir");
        let ctx = testutil::context(tmp.path());
        let mut out = Vec::new();

        let cases = [
            (create(ChatType::Single, &[]), "at least one --participant"),
            (create(ChatType::Single, &["  "]), "at least one --participant"),
            (create(ChatType::Single, &["a", "b"]), "exactly one"),
            (create(ChatType::Group, &["a"]), "at least two"),
        ];
        for (args, needle) in cases {
            testutil::assert_usage(args.run(&ctx, &mut out).await, needle);
        }
        assert!(out.is_empty());
    }

    #[test]
    fn create_params_trim_values() {
        let mut args = create(ChatType::Group, &[" a ", "b"]);
        args.title = Some(" Lunch crew ".to_string());
        args.message = Some("   ".to_string());
        let params = args.params().expect("params");
        assert_eq!(params.participant_ids, vec!["a", "b"]);
        assert_eq!(params.title.as_deref(), Some("Lunch crew"));
        assert_eq!(params.message_text, None);
    }

    #[tokio::test]
    async fn search_limit_and_dates_are_validated() {
        let tmp = TempDir::new().expect("tempdir");
        let ctx = testutil::context(tmp.path());
        let mut out = Vec::new();

        for limit in [0, 201] {
            let args = ChatsSearchArgs {
                query: None,
                account_ids: Vec::new(),
                chat_type: None,
                inbox: None,
                unread_only: false,
                include_muted: None,
                last_activity_after: None,
                last_activity_before: None,
                cursor: None,
                direction: None,
                limit,
            };
            testutil::assert_usage(args.run(&ctx, &mut out).await, "invalid --limit");
        }

        let args = ChatsSearchArgs {
            query: None,
            account_ids: Vec::new(),
            chat_type: None,
            inbox: None,
            unread_only: false,
            include_muted: None,
            last_activity_after: Some("tomorrow".to_string()),
            last_activity_before: None,
            cursor: None,
            direction: None,
            limit: 200,
        };
        testutil::assert_usage(args.run(&ctx, &mut out).await, "--last-activity-after");
    }

    #[tokio::test]
    async fn archive_is_refused_without_confirmation() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctx = testutil::context(tmp.path());
        ctx.config.env.token = Some("tok".to_string());

        let args = ChatsArchiveArgs {
            chat_id: "chat-1".to_string(),
            unarchive: false,
        };
        let mut out = Vec::new();
        testutil::assert_usage(args.run(&ctx, &mut out).await, "archive chat chat-1");
    }

    #[tokio::test]
    async fn unarchive_skips_confirmation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chats/chat-1/archive")
            .match_body(mockito::Matcher::Json(serde_json::json!({"archived": false})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let tmp = TempDir::new().expect("tempdir");
        let mut ctx = testutil::context(tmp.path());
        ctx.config.env.token = Some("tok".to_string());
        ctx.flags.base_url = Some(server.url());

        let args = ChatsArchiveArgs {
            chat_id: "chat-1".to_string(),
            unarchive: true,
        };
        let mut out = Vec::new();
        args.run(&ctx, &mut out).await.expect("run");

        mock.assert_async().await;
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.starts_with("Chat unarchived\n"));
    }
}
