use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message as sent to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Chat history with at most one reply in flight.
///
/// A reply starts as an empty assistant message so partial text can be shown
/// while it streams. If the request fails, [`Conversation::abort_reply`]
/// removes it again so the history never keeps a half-finished turn.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    system: Option<String>,
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            system: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Messages to send for the next reply: system prompt first, then
    /// history, excluding the in-flight placeholder.
    pub fn to_request(&self) -> Vec<ChatMessage> {
        let history = if self.pending {
            &self.messages[..self.messages.len() - 1]
        } else {
            &self.messages[..]
        };
        self.system
            .iter()
            .map(|s| ChatMessage::system(s.clone()))
            .chain(history.iter().cloned())
            .collect()
    }

    pub fn begin_reply(&mut self) {
        if !self.pending {
            self.messages.push(ChatMessage::assistant(String::new()));
            self.pending = true;
        }
    }

    pub fn push_delta(&mut self, delta: &str) {
        if !self.pending {
            self.begin_reply();
        }
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(delta);
        }
    }

    /// Commit the streamed reply. An empty reply is dropped rather than kept.
    pub fn finish_reply(&mut self) -> Option<&ChatMessage> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        if self.messages.last().is_some_and(|m| m.content.is_empty()) {
            self.messages.pop();
            return None;
        }
        self.messages.last()
    }

    /// Roll back the in-flight reply, returning whatever text had arrived.
    pub fn abort_reply(&mut self) -> Option<String> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.messages.pop().map(|m| m.content)
    }
}
