//! Conversation message history management.
//!
//! Append-only: a message is never mutated once stored. The provider shim
//! that some endpoints require (empty-string `content`/`reasoning_content`
//! on assistant tool-call messages) is applied to the outbound copy in
//! [`Conversation::snapshot`], never to the stored record.

use crate::types::ChatMessage;

/// Ordered, append-only log of conversation messages.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Insertion order is send order.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Get all stored messages.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Clear all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ordered copy of the history, normalized for the wire.
    ///
    /// Assistant messages carrying tool calls must present a `content` field
    /// (and, for reasoning models, a `reasoning_content` field) or the
    /// provider rejects the *next* request. The stored message keeps whatever
    /// the model actually produced; only the copy gains empty strings.
    pub fn snapshot(&self, reasoning_model: bool) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|msg| {
                let mut msg = msg.clone();
                if !msg.tool_calls.is_empty() {
                    msg.content.get_or_insert_with(String::new);
                    if reasoning_model {
                        msg.reasoning_content.get_or_insert_with(String::new);
                    }
                }
                msg
            })
            .collect()
    }
}
