use {
    parley_common::types::{ChatId, ChatType},
    serde::{Deserialize, Serialize},
};

/// Who sent an inbound event and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub chat_id: ChatId,
    pub chat_type: ChatType,
    /// Group title; `None` for private chats.
    pub chat_title: Option<String>,
    pub user_id: u64,
    /// "first last", trimmed.
    pub user_name: String,
}

impl EventContext {
    /// Build the display name the way the audit log records it.
    #[must_use]
    pub fn display_name(first_name: &str, last_name: Option<&str>) -> String {
        format!("{first_name} {}", last_name.unwrap_or_default())
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_and_trims() {
        assert_eq!(EventContext::display_name("Ada", Some("Lovelace")), "Ada Lovelace");
        assert_eq!(EventContext::display_name("Ada", None), "Ada");
        assert_eq!(EventContext::display_name("Ada", Some("")), "Ada");
    }
}
