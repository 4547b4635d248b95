use std::io::{self, Write};

use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::{
    Account, ArchiveResult, ChatSearchResult, Contact, CreateChatResult, MessageItem,
    MessageListResult, MessageSearchResult, SendResult,
};

const PLAIN_TEXT_WIDTH: usize = 50;
const LIST_TEXT_WIDTH: usize = 60;
const SEARCH_TEXT_WIDTH: usize = 50;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
    Plain,
}

/// Plain (TSV) and human renderings of a command result. JSON comes from `Serialize`.
pub trait Render {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()>;
    fn human(&self, out: &mut dyn Write) -> io::Result<()>;
}

pub fn emit<T: Render + Serialize + ?Sized>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
) -> Result<(), OutputError> {
    match mode {
        OutputMode::Json => write_json(out, value)?,
        OutputMode::Plain => value.plain(out)?,
        OutputMode::Human => value.human(out)?,
    }
    out.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Collapses newlines, trims, and shortens to `max_width` columns with a
/// trailing "..." when anything was cut.
pub fn truncate(value: &str, max_width: usize) -> String {
    let collapsed = value.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let trimmed = collapsed.trim();
    if display_width(trimmed) <= max_width {
        return trimmed.to_string();
    }
    if max_width <= 3 {
        return take_width(trimmed, max_width);
    }
    let mut output = take_width(trimmed, max_width - 3);
    output.push_str("...");
    output
}

fn take_width(value: &str, max_width: usize) -> String {
    let mut width = 0usize;
    let mut output = String::new();
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        output.push(ch);
        width += ch_width;
    }
    output
}

fn display_width(value: &str) -> usize {
    UnicodeWidthStr::width(value)
}

fn pad_right(value: &str, width: usize) -> String {
    let mut output = value.to_string();
    let current = display_width(value);
    if current < width {
        output.push_str(&" ".repeat(width - current));
    }
    output
}

fn pad_left(value: &str, width: usize) -> String {
    let current = display_width(value);
    if current >= width {
        return value.to_string();
    }
    let mut output = " ".repeat(width - current);
    output.push_str(value);
    output
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>, max: usize) -> usize {
    values
        .map(display_width)
        .fold(display_width(header), usize::max)
        .min(max)
}

fn tsv_line(out: &mut dyn Write, fields: &[&str]) -> io::Result<()> {
    let cleaned: Vec<String> = fields
        .iter()
        .map(|field| field.replace(['\t', '\n', '\r'], " "))
        .collect();
    writeln!(out, "{}", cleaned.join("\t"))
}

pub fn warn(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{message}")
}

fn short_time(timestamp: &str, format: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_default()
}

fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

impl Render for Vec<Contact> {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        for contact in self {
            tsv_line(
                out,
                &[
                    &contact.id,
                    &contact.full_name,
                    &contact.username,
                    &contact.phone_number,
                    if contact.cannot_message { "true" } else { "false" },
                ],
            )?;
        }
        Ok(())
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.is_empty() {
            return warn(out, "No contacts found");
        }

        let name_width = column_width("name", self.iter().map(|c| c.display_name()), 28);
        let id_width = column_width("id", self.iter().map(|c| c.id.as_str()), 32);
        let username_width = column_width("username", self.iter().map(|c| c.username.as_str()), 20);

        writeln!(out, "Contacts ({}):", self.len())?;
        for contact in self {
            let status = if contact.cannot_message { "cannot-message" } else { "" };
            let line = format!(
                "  {}  {}  {}  {}",
                pad_right(&truncate(contact.display_name(), name_width), name_width),
                pad_right(&truncate(&contact.id, id_width), id_width),
                pad_right(&truncate(&contact.username, username_width), username_width),
                status,
            );
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl Render for Vec<Account> {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        for account in self {
            let user = account.user.as_ref().map(Contact::display_name).unwrap_or("");
            tsv_line(out, &[&account.account_id, &account.network, user])?;
        }
        Ok(())
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.is_empty() {
            return warn(out, "No accounts found");
        }

        let id_width = column_width("account", self.iter().map(|a| a.account_id.as_str()), 32);
        let network_width = column_width("network", self.iter().map(|a| a.network.as_str()), 20);

        writeln!(out, "Accounts ({}):", self.len())?;
        for account in self {
            let user = account.user.as_ref().map(Contact::display_name).unwrap_or("-");
            let line = format!(
                "  {}  {}  {}",
                pad_right(&truncate(&account.account_id, id_width), id_width),
                pad_right(&truncate(&account.network, network_width), network_width),
                truncate(user, 32),
            );
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl Render for MessageListResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        for item in &self.items {
            tsv_line(
                out,
                &[
                    &item.id,
                    &item.sender_name,
                    &item.timestamp,
                    &truncate(&item.text, PLAIN_TEXT_WIDTH),
                ],
            )?;
        }
        Ok(())
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.items.is_empty() {
            return warn(out, "No messages found");
        }

        writeln!(out, "Messages ({}):", self.items.len())?;
        for item in &self.items {
            writeln!(
                out,
                "  [{}] {}: {}",
                short_time(&item.timestamp, "%b %-d %H:%M"),
                item.sender_name,
                message_text(item, LIST_TEXT_WIDTH),
            )?;
        }

        if let Some(cursor) = self.next_cursor.as_deref().filter(|_| self.has_more) {
            writeln!(out)?;
            writeln!(out, "More messages available. Use --cursor={}", quoted(cursor))?;
        }
        Ok(())
    }
}

impl Render for MessageSearchResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        for item in &self.items {
            tsv_line(
                out,
                &[
                    &item.id,
                    &item.chat_id,
                    &item.sender_name,
                    &truncate(&item.text, PLAIN_TEXT_WIDTH),
                ],
            )?;
        }
        Ok(())
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.items.is_empty() {
            warn(out, "No messages found")?;
            return writeln!(out, "Note: Search uses literal word match, not semantic search.");
        }

        let dates: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("[{}]", short_time(&item.timestamp, "%b %-d")))
            .collect();
        let senders: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{}:", item.sender_name))
            .collect();
        let date_width = column_width("", dates.iter().map(String::as_str), 8);
        let sender_width = column_width("", senders.iter().map(String::as_str), 24);

        writeln!(out, "Found {} messages:", self.items.len())?;
        for ((item, date), sender) in self.items.iter().zip(&dates).zip(&senders) {
            writeln!(
                out,
                "  {}  {}  {}",
                pad_right(date, date_width),
                pad_right(&truncate(sender, sender_width), sender_width),
                message_text(item, SEARCH_TEXT_WIDTH),
            )?;
        }

        if let Some(cursor) = self.oldest_cursor.as_deref().filter(|_| self.has_more) {
            writeln!(out)?;
            writeln!(
                out,
                "More results available. Use --cursor={} --direction=before",
                quoted(cursor)
            )?;
        }
        Ok(())
    }
}

fn message_text(item: &MessageItem, width: usize) -> String {
    let text = truncate(&item.text, width);
    if text.is_empty() && item.has_media {
        return "<media>".to_string();
    }
    text
}

impl Render for SendResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        tsv_line(out, &[&self.chat_id, &self.pending_message_id])
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Message sent")?;
        writeln!(out, "Chat ID:    {}", self.chat_id)?;
        writeln!(out, "Pending ID: {}", self.pending_message_id)
    }
}

impl Render for ChatSearchResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        for chat in &self.items {
            let unread = chat.unread_count.unwrap_or(0).to_string();
            tsv_line(
                out,
                &[&chat.id, &chat.title, &chat.chat_type, &chat.network, &unread],
            )?;
        }
        Ok(())
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.items.is_empty() {
            return warn(out, "No chats found");
        }

        let title_width = column_width("title", self.items.iter().map(|c| c.title.as_str()), 32);
        let id_width = column_width("id", self.items.iter().map(|c| c.id.as_str()), 36);
        let network_width = column_width("network", self.items.iter().map(|c| c.network.as_str()), 14);

        writeln!(out, "Chats ({}):", self.items.len())?;
        for chat in &self.items {
            let mut flags = Vec::new();
            if chat.is_pinned {
                flags.push("pinned");
            }
            if chat.is_muted {
                flags.push("muted");
            }
            if chat.is_archived {
                flags.push("archived");
            }
            let unread = match chat.unread_count {
                Some(count) if count > 0 => count.to_string(),
                _ => String::new(),
            };
            let line = format!(
                "  {}  {}  {}  {}  {}",
                pad_right(&truncate(&chat.title, title_width), title_width),
                pad_right(&truncate(&chat.id, id_width), id_width),
                pad_right(&truncate(&chat.network, network_width), network_width),
                pad_left(&unread, 4),
                flags.join(","),
            );
            writeln!(out, "{}", line.trim_end())?;
        }

        if let Some(cursor) = self.oldest_cursor.as_deref().filter(|_| self.has_more) {
            writeln!(out)?;
            writeln!(
                out,
                "More chats available. Use --cursor={} --direction=before",
                quoted(cursor)
            )?;
        }
        Ok(())
    }
}

impl Render for CreateChatResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        tsv_line(out, &[&self.chat_id])
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Chat created")?;
        writeln!(out, "Chat ID: {}", self.chat_id)
    }
}

impl Render for ArchiveResult {
    fn plain(&self, out: &mut dyn Write) -> io::Result<()> {
        tsv_line(out, &[&self.chat_id, if self.archived { "true" } else { "false" }])
    }

    fn human(&self, out: &mut dyn Write) -> io::Result<()> {
        let verb = if self.archived { "archived" } else { "unarchived" };
        writeln!(out, "Chat {verb}")?;
        writeln!(out, "Chat ID: {}", self.chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Render + Serialize>(mode: OutputMode, value: &T) -> String {
        let mut buffer = Vec::new();
        emit(&mut buffer, mode, value).expect("emit");
        String::from_utf8(buffer).expect("utf8")
    }

    fn message(id: &str, text: &str) -> MessageItem {
        MessageItem {
            id: id.to_string(),
            chat_id: "chat-1".to_string(),
            sender_id: "@jamie".to_string(),
            sender_name: "Jamie".to_string(),
            text: text.to_string(),
            timestamp: "2026-01-02T15:04:05Z".to_string(),
            ..MessageItem::default()
        }
    }

    #[test]
    fn truncate_cases() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hello\nworld", 20), "hello world");
        assert_eq!(truncate("  hello  ", 20), "hello");
        assert_eq!(truncate("line\r\nbreak", 20), "line break");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn truncate_counts_display_columns() {
        assert_eq!(truncate("日本語のテキスト", 9), "日本語...");
    }

    #[test]
    fn human_list_prints_rows_and_cursor_hint() {
        let result = MessageListResult {
            items: vec![message("m1", "hello\nthere")],
            has_more: true,
            next_cursor: Some("101".to_string()),
        };
        let rendered = render(OutputMode::Human, &result);
        assert!(rendered.starts_with("Messages (1):\n"));
        assert!(rendered.contains("  [Jan 2 15:04] Jamie: hello there\n"));
        assert!(rendered.contains("More messages available. Use --cursor=\"101\""));
    }

    #[test]
    fn human_empty_results_warn_without_table() {
        let rendered = render(OutputMode::Human, &MessageListResult::default());
        assert_eq!(rendered, "No messages found\n");

        let rendered = render(OutputMode::Human, &Vec::<Contact>::new());
        assert_eq!(rendered, "No contacts found\n");
    }

    #[test]
    fn plain_list_is_tab_separated() {
        let long = "x".repeat(80);
        let result = MessageListResult {
            items: vec![message("m1", &long)],
            has_more: false,
            next_cursor: None,
        };
        let rendered = render(OutputMode::Plain, &result);
        let fields: Vec<&str> = rendered.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "m1");
        assert_eq!(fields[1], "Jamie");
        assert_eq!(fields[2], "2026-01-02T15:04:05Z");
        assert_eq!(fields[3].len(), PLAIN_TEXT_WIDTH);
        assert!(fields[3].ends_with("..."));
    }

    #[test]
    fn plain_output_is_empty_for_no_results() {
        assert_eq!(render(OutputMode::Plain, &MessageSearchResult::default()), "");
    }

    #[test]
    fn json_output_is_a_single_document() {
        let result = SendResult {
            chat_id: "chat-1".to_string(),
            pending_message_id: "p1".to_string(),
        };
        let rendered = render(OutputMode::Json, &result);
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["chat_id"], "chat-1");
        assert_eq!(value["pending_message_id"], "p1");
    }

    #[test]
    fn human_search_aligns_columns_and_hints_oldest_cursor() {
        let mut second = message("m2", "see you there");
        second.sender_name = "Alexandra".to_string();
        let result = MessageSearchResult {
            items: vec![message("m1", "lunch?"), second],
            has_more: true,
            oldest_cursor: Some("old".to_string()),
            newest_cursor: Some("new".to_string()),
        };
        let rendered = render(OutputMode::Human, &result);
        assert!(rendered.starts_with("Found 2 messages:\n"));
        assert!(rendered.contains("  [Jan 2]  Jamie:      lunch?\n"));
        assert!(rendered.contains("  [Jan 2]  Alexandra:  see you there\n"));
        assert!(rendered.contains("Use --cursor=\"old\" --direction=before"));
    }
}
