use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

use super::messages::{ChatType, Direction, push_opt};
use super::wire;
use super::{ApiClient, ApiError, is_false, rfc3339};
use crate::display::display_name_for_chat;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ChatTypeFilter {
    Single,
    Group,
    Any,
}

impl ChatTypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatTypeFilter::Single => "single",
            ChatTypeFilter::Group => "group",
            ChatTypeFilter::Any => "any",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Inbox {
    Primary,
    LowPriority,
    Archive,
}

impl Inbox {
    pub fn as_str(&self) -> &'static str {
        match self {
            Inbox::Primary => "primary",
            Inbox::LowPriority => "low-priority",
            Inbox::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatSearchParams {
    pub query: Option<String>,
    pub account_ids: Vec<String>,
    pub chat_type: Option<ChatTypeFilter>,
    pub inbox: Option<Inbox>,
    pub unread_only: bool,
    pub include_muted: Option<bool>,
    pub last_activity_after: Option<DateTime<Utc>>,
    pub last_activity_before: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    pub direction: Option<Direction>,
    pub limit: Option<u32>,
}

impl ChatSearchParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_opt(&mut query, "query", self.query.as_deref());
        for id in &self.account_ids {
            query.push(("accountIDs", id.clone()));
        }
        if let Some(chat_type) = self.chat_type {
            query.push(("type", chat_type.as_str().to_string()));
        }
        if let Some(inbox) = self.inbox {
            query.push(("inbox", inbox.as_str().to_string()));
        }
        if self.unread_only {
            query.push(("unreadOnly", "true".to_string()));
        }
        if let Some(include_muted) = self.include_muted {
            query.push(("includeMuted", include_muted.to_string()));
        }
        if let Some(after) = self.last_activity_after {
            query.push((
                "lastActivityAfter",
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if let Some(before) = self.last_activity_before {
            query.push((
                "lastActivityBefore",
                before.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        push_opt(&mut query, "cursor", self.cursor.as_deref());
        if let Some(direction) = self.direction {
            query.push(("direction", direction.as_str().to_string()));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatItem {
    pub id: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "type")]
    pub chat_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_archived: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_muted: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_pinned: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_activity: String,
}

impl From<wire::Chat> for ChatItem {
    fn from(chat: wire::Chat) -> Self {
        let existing = chat.title.unwrap_or_default();
        let participants = chat.participants.map(|p| p.items).unwrap_or_default();
        let resolved = display_name_for_chat(&chat.chat_type, &existing, &participants);
        Self {
            title: if resolved.is_empty() { existing } else { resolved },
            id: chat.id,
            account_id: chat.account_id,
            network: chat.network.unwrap_or_default(),
            chat_type: chat.chat_type,
            unread_count: chat.unread_count,
            is_archived: chat.is_archived,
            is_muted: chat.is_muted,
            is_pinned: chat.is_pinned,
            last_activity: rfc3339(chat.last_activity),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSearchResult {
    pub items: Vec<ChatItem>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateChatParams {
    pub account_id: String,
    pub participant_ids: Vec<String>,
    pub chat_type: ChatType,
    pub title: Option<String>,
    pub message_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChatPayload<'a> {
    #[serde(rename = "accountID")]
    account_id: &'a str,
    #[serde(rename = "participantIDs")]
    participant_ids: &'a [String],
    #[serde(rename = "type")]
    chat_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_text: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChatResult {
    pub chat_id: String,
}

#[derive(Serialize)]
struct ArchivePayload {
    archived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveResult {
    pub chat_id: String,
    pub archived: bool,
}

impl ApiClient {
    pub async fn search_chats(&self, params: &ChatSearchParams) -> Result<ChatSearchResult, ApiError> {
        let page: wire::Page<wire::Chat> = self
            .get(&["v1", "chats", "search"], &params.to_query())
            .await?;
        Ok(ChatSearchResult {
            items: page.items.into_iter().map(ChatItem::from).collect(),
            has_more: page.has_more,
            oldest_cursor: page.oldest_cursor.filter(|cursor| !cursor.is_empty()),
            newest_cursor: page.newest_cursor.filter(|cursor| !cursor.is_empty()),
        })
    }

    pub async fn create_chat(&self, params: &CreateChatParams) -> Result<CreateChatResult, ApiError> {
        let payload = CreateChatPayload {
            account_id: &params.account_id,
            participant_ids: &params.participant_ids,
            chat_type: params.chat_type.as_str(),
            title: params.title.as_deref().filter(|title| !title.is_empty()),
            message_text: params.message_text.as_deref().filter(|text| !text.is_empty()),
        };
        let response: wire::CreateChatResponse = self.post(&["v1", "chats"], &payload).await?;
        Ok(CreateChatResult {
            chat_id: response.chat_id,
        })
    }

    /// Archives or unarchives a chat. The response body is ignored.
    pub async fn archive_chat(&self, chat_id: &str, archived: bool) -> Result<ArchiveResult, ApiError> {
        self.post_raw(&["v1", "chats", chat_id, "archive"], &ArchivePayload { archived })
            .await?;
        Ok(ArchiveResult {
            chat_id: chat_id.to_string(),
            archived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn search_chats_resolves_single_chat_titles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/chats/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "jamie".into()),
                Matcher::UrlEncoded("inbox".into(), "low-priority".into()),
                Matcher::UrlEncoded("unreadOnly".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[
                    {"id":"c1","accountID":"wa","network":"WhatsApp","title":"+1555","type":"single",
                     "participants":{"items":[{"id":"@me","isSelf":true},{"id":"@j","fullName":"Jamie Young"}],"hasMore":false,"total":2},
                     "unreadCount":3,"lastActivity":"2026-01-02T03:04:05Z"},
                    {"id":"c2","accountID":"wa","title":"Family","type":"group",
                     "participants":{"items":[{"id":"@me","isSelf":true},{"id":"@a","fullName":"Alex"}]},
                     "isMuted":true}
                ],"hasMore":false}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), "tok".to_string(), None).expect("client");
        let params = ChatSearchParams {
            query: Some("jamie".to_string()),
            inbox: Some(Inbox::LowPriority),
            unread_only: true,
            ..ChatSearchParams::default()
        };
        let result = client.search_chats(&params).await.expect("search");

        assert_eq!(result.items[0].title, "Jamie Young");
        assert_eq!(result.items[0].unread_count, Some(3));
        assert_eq!(result.items[0].last_activity, "2026-01-02T03:04:05Z");
        assert_eq!(result.items[1].title, "Family");
        assert!(result.items[1].is_muted);
        mock.assert_async().await;
    }

    #[test]
    fn single_chat_without_counterpart_keeps_backend_title() {
        let chat = wire::Chat {
            id: "c3".to_string(),
            title: Some("Note to self".to_string()),
            chat_type: "single".to_string(),
            participants: Some(wire::Participants {
                items: vec![wire::User {
                    id: "@me".to_string(),
                    is_self: true,
                    ..wire::User::default()
                }],
            }),
            ..wire::Chat::default()
        };
        assert_eq!(ChatItem::from(chat).title, "Note to self");
    }

    #[tokio::test]
    async fn create_chat_posts_participants() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chats")
            .match_body(Matcher::Json(serde_json::json!({
                "accountID": "signal",
                "participantIDs": ["u1", "u2"],
                "type": "group",
                "title": "Climbing"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"chatID":"new-chat"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), "tok".to_string(), None).expect("client");
        let params = CreateChatParams {
            account_id: "signal".to_string(),
            participant_ids: vec!["u1".to_string(), "u2".to_string()],
            chat_type: ChatType::Group,
            title: Some("Climbing".to_string()),
            message_text: None,
        };
        let result = client.create_chat(&params).await.expect("create");
        assert_eq!(result.chat_id, "new-chat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn archive_chat_ignores_response_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chats/c1/archive")
            .match_body(Matcher::Json(serde_json::json!({"archived": false})))
            .with_status(200)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), "tok".to_string(), None).expect("client");
        let result = client.archive_chat("c1", false).await.expect("archive");
        assert_eq!(result.chat_id, "c1");
        assert!(!result.archived);
        mock.assert_async().await;
    }
}
