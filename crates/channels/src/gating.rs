use {parley_common::types::ChatType, parley_config::MentionMode};

/// Admission control for group chats.
///
/// Private chats are always admitted. In groups and supergroups the
/// [`MentionMode`] decides; in `Mention` mode the text or caption must
/// contain the `@<bot_username>` token.
///
/// The token is matched ASCII case-insensitively: Telegram usernames are
/// case-insensitive, so `@Parley_Bot` and `@parley_bot` address the same
/// account, and the configured name may differ in case from what clients type.
#[derive(Debug, Clone)]
pub struct MentionGate {
    mode: MentionMode,
    username: String,
}

impl MentionGate {
    pub fn new(mode: MentionMode, bot_username: &str) -> Self {
        Self {
            mode,
            username: bot_username.trim_start_matches('@').to_string(),
        }
    }

    #[must_use]
    pub fn bot_username(&self) -> &str {
        &self.username
    }

    /// `@username`
    #[must_use]
    pub fn mention_token(&self) -> String {
        format!("@{}", self.username)
    }

    #[must_use]
    pub fn admits(&self, chat_type: ChatType, text: &str) -> bool {
        if !chat_type.is_group() {
            return true;
        }
        match self.mode {
            MentionMode::Always => true,
            MentionMode::None => false,
            MentionMode::Mention => {
                !self.username.is_empty()
                    && contains_ignore_ascii_case(text, &self.mention_token())
            },
        }
    }

    /// Remove the bot's username and every `@`, then trim.
    #[must_use]
    pub fn strip_mention(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        if !self.username.is_empty() {
            while let Some(at) = find_ignore_ascii_case(rest, &self.username) {
                out.push_str(&rest[..at]);
                rest = &rest[at + self.username.len()..];
            }
        }
        out.push_str(rest);
        out.replace('@', "").trim().to_string()
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| {
        haystack.is_char_boundary(i)
            && haystack
                .get(i..i + needle.len())
                .is_some_and(|window| window.eq_ignore_ascii_case(needle))
    })
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    find_ignore_ascii_case(haystack, needle).is_some()
}
