use crate::api::wire::User;

/// Human label for a chat. Group chats keep their existing name; 1:1 chats
/// are named after the first participant that is not the current user.
pub fn display_name_for_chat(chat_type: &str, existing: &str, participants: &[User]) -> String {
    if chat_type != "single" {
        return existing.to_string();
    }

    participants
        .iter()
        .find(|participant| !participant.is_self)
        .map(user_display_name)
        .unwrap_or_default()
}

/// Full name, then username, then id.
pub fn user_display_name(user: &User) -> String {
    [user.full_name.as_deref(), user.username.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(user.id.as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> User {
        User {
            id: "@me".to_string(),
            is_self: true,
            ..User::default()
        }
    }

    fn other(full_name: Option<&str>, username: Option<&str>) -> User {
        User {
            id: "@other".to_string(),
            full_name: full_name.map(str::to_string),
            username: username.map(str::to_string),
            ..User::default()
        }
    }

    #[test]
    fn group_chat_keeps_existing_name() {
        let participants = vec![me(), other(Some("Other"), None)];
        assert_eq!(display_name_for_chat("group", "", &participants), "");
        assert_eq!(
            display_name_for_chat("group", "Weekend plans", &participants),
            "Weekend plans"
        );
        assert_eq!(display_name_for_chat("group", "Team", &[]), "Team");
    }

    #[test]
    fn single_chat_prefers_full_name() {
        let participants = vec![me(), other(Some("Jamie Young"), Some("jamie"))];
        assert_eq!(
            display_name_for_chat("single", "ignored", &participants),
            "Jamie Young"
        );
    }

    #[test]
    fn single_chat_falls_back_to_username() {
        let participants = vec![me(), other(None, Some("jamie"))];
        assert_eq!(display_name_for_chat("single", "", &participants), "jamie");

        let participants = vec![me(), other(Some(""), Some("jamie"))];
        assert_eq!(display_name_for_chat("single", "", &participants), "jamie");
    }

    #[test]
    fn single_chat_falls_back_to_id() {
        let participants = vec![me(), other(None, None)];
        assert_eq!(display_name_for_chat("single", "", &participants), "@other");
    }

    #[test]
    fn single_chat_with_only_self_is_empty() {
        assert_eq!(display_name_for_chat("single", "", &[me()]), "");
        assert_eq!(display_name_for_chat("single", "", &[]), "");
    }
}
