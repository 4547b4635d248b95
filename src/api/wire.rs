//! Response shapes of the Beeper Desktop API `v1` surface.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub cannot_message: bool,
    #[serde(rename = "imgURL")]
    pub img_url: Option<String>,
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(rename = "accountID")]
    pub account_id: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    pub oldest_cursor: Option<String>,
    pub newest_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "chatID")]
    pub chat_id: String,
    #[serde(default, rename = "senderID")]
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub sort_key: Option<Value>,
    pub attachments: Option<Vec<Value>>,
    pub reactions: Option<Vec<Reaction>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    #[serde(default)]
    pub reaction_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(default, rename = "chatID")]
    pub chat_id: String,
    #[serde(default, rename = "pendingMessageID")]
    pub pending_message_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "accountID")]
    pub account_id: String,
    pub network: Option<String>,
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub chat_type: String,
    pub participants: Option<Participants>,
    pub last_activity: Option<DateTime<Utc>>,
    pub unread_count: Option<i64>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participants {
    #[serde(default)]
    pub items: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChatResponse {
    #[serde(default, rename = "chatID")]
    pub chat_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Sort keys arrive as strings or numbers depending on the network.
pub fn sort_key_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Number(key)) => key.to_string(),
        _ => String::new(),
    }
}
