use serde::Serialize;

use crate::message::Message;

/// Ordered conversation history for one chat.
///
/// The first message is always the system preamble; a transcript is never
/// empty. Serializes as the bare message array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Fresh transcript holding only the system preamble.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`: the system preamble is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Keep the system preamble plus the newest `window` messages.
    /// `None` keeps everything.
    pub fn apply_window(&mut self, window: Option<usize>) {
        let Some(window) = window else {
            return;
        };
        let excess = (self.messages.len() - 1).saturating_sub(window);
        if excess > 0 {
            self.messages.drain(1..=excess);
        }
    }
}
