//! Simulated assistant chat about one paper.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canned reply until a real model is wired in.
pub const SIMULATED_REPLY: &str = "This is a simulated AI response. In production, this would be \
                                   replaced with actual AI-generated responses based on the paper \
                                   content.";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person using the app.
    User,
    /// The assistant.
    Ai,
}

/// One chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,

    /// Message body.
    pub text: String,

    /// Author.
    pub sender: Sender,

    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// Chat screen state for a paper handed over from the feed.
#[derive(Debug, Clone)]
pub struct ChatSession {
    paper_id: String,
    title: String,
    messages: Vec<ChatMessage>,
    reply_delay: Duration,
}

impl ChatSession {
    /// Open a chat seeded with the assistant greeting.
    #[must_use]
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>, reply_delay: Duration) -> Self {
        let title = title.into();
        let greeting = format!("Hello! I'm your AI assistant. Ask me anything about \"{title}\"");
        Self {
            paper_id: paper_id.into(),
            title,
            messages: vec![ChatMessage::new(greeting, Sender::Ai)],
            reply_delay,
        }
    }

    /// Paper under discussion.
    #[must_use]
    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    /// Title of the paper under discussion.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Conversation so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a user message and wait for the reply. Blank input is ignored.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::new(text, Sender::User));

        tokio::time::sleep(self.reply_delay).await;

        tracing::debug!(paper_id = %self.paper_id, "Simulated chat reply");
        self.messages.push(ChatMessage::new(SIMULATED_REPLY, Sender::Ai));
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_names_paper() {
        let chat = ChatSession::new("2401.1", "Attention Is All You Need", Duration::ZERO);
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].sender, Sender::Ai);
        assert_eq!(
            chat.messages()[0].text,
            "Hello! I'm your AI assistant. Ask me anything about \"Attention Is All You Need\""
        );
    }

    #[tokio::test]
    async fn test_send_appends_user_then_reply() {
        let mut chat = ChatSession::new("2401.1", "T", Duration::ZERO);
        let reply = chat.send("  what is the main result?  ").await.unwrap();
        assert_eq!(reply.sender, Sender::Ai);
        assert_eq!(reply.text, SIMULATED_REPLY);

        let messages = chat.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "what is the main result?");
        assert_ne!(messages[1].id, messages[2].id);
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let mut chat = ChatSession::new("2401.1", "T", Duration::ZERO);
        assert!(chat.send("   ").await.is_none());
        assert_eq!(chat.messages().len(), 1);
    }
}
