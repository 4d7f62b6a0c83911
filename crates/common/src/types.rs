use serde::{Deserialize, Serialize};

/// Numeric chat identifier as assigned by the transport.
pub type ChatId = i64;

/// Kind of chat an inbound event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    /// Multi-user chats where the bot must be addressed explicitly.
    #[must_use]
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Supergroup => "supergroup",
            Self::Channel => "channel",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_groups_and_supergroups_are_groups() {
        assert!(!ChatType::Private.is_group());
        assert!(ChatType::Group.is_group());
        assert!(ChatType::Supergroup.is_group());
        assert!(!ChatType::Channel.is_group());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ChatType::Supergroup).unwrap();
        assert_eq!(json, "\"supergroup\"");
        assert_eq!(ChatType::Private.to_string(), "private");
    }
}
