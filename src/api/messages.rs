use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

use super::wire;
use super::{ApiClient, ApiError, is_false, rfc3339};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Direction {
    Before,
    After,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Before => "before",
            Direction::After => "after",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ChatType {
    Single,
    Group,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Single => "single",
            ChatType::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageListParams {
    pub cursor: Option<String>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Default)]
pub struct MessageSearchParams {
    pub query: Option<String>,
    pub account_ids: Vec<String>,
    pub chat_ids: Vec<String>,
    pub chat_type: Option<ChatType>,
    /// "me", "others", or a user id.
    pub sender: Option<String>,
    pub media_types: Vec<String>,
    pub date_after: Option<DateTime<Utc>>,
    pub date_before: Option<DateTime<Utc>>,
    pub include_muted: Option<bool>,
    pub exclude_low_priority: Option<bool>,
    pub cursor: Option<String>,
    pub direction: Option<Direction>,
    pub limit: Option<u32>,
}

impl MessageSearchParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_opt(&mut query, "query", self.query.as_deref());
        for id in &self.account_ids {
            query.push(("accountIDs", id.clone()));
        }
        for id in &self.chat_ids {
            query.push(("chatIDs", id.clone()));
        }
        if let Some(chat_type) = self.chat_type {
            query.push(("chatType", chat_type.as_str().to_string()));
        }
        push_opt(&mut query, "sender", self.sender.as_deref());
        for media in &self.media_types {
            query.push(("mediaTypes", media.clone()));
        }
        if let Some(after) = self.date_after {
            query.push(("dateAfter", after.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(before) = self.date_before {
            query.push(("dateBefore", before.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(include_muted) = self.include_muted {
            query.push(("includeMuted", include_muted.to_string()));
        }
        if let Some(exclude) = self.exclude_low_priority {
            query.push(("excludeLowPriority", exclude.to_string()));
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

pub(crate) fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        query.push((key, value.to_string()));
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MessageItem {
    pub id: String,
    pub chat_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sender_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sender_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort_key: String,
    #[serde(skip_serializing_if = "is_false")]
    pub has_media: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<String>,
}

impl From<wire::Message> for MessageItem {
    fn from(message: wire::Message) -> Self {
        let sender_name = message
            .sender_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| message.sender_id.clone());
        Self {
            sort_key: wire::sort_key_string(message.sort_key.as_ref()),
            has_media: message
                .attachments
                .as_ref()
                .is_some_and(|attachments| !attachments.is_empty()),
            reactions: message
                .reactions
                .unwrap_or_default()
                .into_iter()
                .map(|reaction| reaction.reaction_key)
                .collect(),
            timestamp: rfc3339(message.timestamp),
            text: message.text.unwrap_or_default(),
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            sender_name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageListResult {
    pub items: Vec<MessageItem>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageSearchResult {
    pub items: Vec<MessageItem>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_cursor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SendParams {
    pub text: String,
    pub reply_to_message_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendPayload<'a> {
    text: &'a str,
    #[serde(rename = "replyToMessageID", skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub chat_id: String,
    pub pending_message_id: String,
}

impl ApiClient {
    /// Lists one page of messages in a chat.
    pub async fn list_messages(
        &self,
        chat_id: &str,
        params: &MessageListParams,
    ) -> Result<MessageListResult, ApiError> {
        let mut query = Vec::new();
        push_opt(&mut query, "cursor", params.cursor.as_deref());
        if let Some(direction) = params.direction {
            query.push(("direction", direction.as_str().to_string()));
        }

        let page: wire::Page<wire::Message> =
            self.get(&["v1", "chats", chat_id, "messages"], &query).await?;
        Ok(list_result(page))
    }

    pub async fn search_messages(
        &self,
        params: &MessageSearchParams,
    ) -> Result<MessageSearchResult, ApiError> {
        let page: wire::Page<wire::Message> = self
            .get(&["v1", "messages", "search"], &params.to_query())
            .await?;
        Ok(MessageSearchResult {
            items: page.items.into_iter().map(MessageItem::from).collect(),
            has_more: page.has_more,
            oldest_cursor: page.oldest_cursor.filter(|cursor| !cursor.is_empty()),
            newest_cursor: page.newest_cursor.filter(|cursor| !cursor.is_empty()),
        })
    }

    pub async fn send_message(&self, chat_id: &str, params: &SendParams) -> Result<SendResult, ApiError> {
        let payload = SendPayload {
            text: &params.text,
            reply_to_message_id: params
                .reply_to_message_id
                .as_deref()
                .filter(|id| !id.is_empty()),
        };
        let response: wire::SendMessageResponse =
            self.post(&["v1", "chats", chat_id, "messages"], &payload).await?;
        Ok(SendResult {
            chat_id: response.chat_id,
            pending_message_id: response.pending_message_id,
        })
    }
}

fn list_result(page: wire::Page<wire::Message>) -> MessageListResult {
    let items: Vec<MessageItem> = page.items.into_iter().map(MessageItem::from).collect();
    let next_cursor = if page.has_more {
        items
            .last()
            .map(|last| last.sort_key.clone())
            .filter(|key| !key.is_empty())
    } else {
        None
    };
    MessageListResult {
        items,
        has_more: page.has_more,
        next_cursor,
    }
}
