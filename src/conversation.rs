//! Chat history for one session.
//!
//! Messages are owned by value. While an answer streams in, its assistant
//! slot is replaced by a new value carrying the appended text.
//! Each reply is tagged with a [`StreamId`]; updates from any other stream
//! are dropped so a stale request can never write into a newer slot.

pub const GREETING: &str =
    "Hi! Upload a document to get started. I support PDF, Word, TXT, and more!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

/// The reply a stream writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    stream: StreamId,
    slot: usize,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: Option<Pending>,
    next_stream: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting() -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(ChatMessage::assistant(GREETING));
        conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_streaming(&self) -> bool {
        self.pending.is_some()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Opens an empty assistant message for a new reply.
    pub fn begin_reply(&mut self) -> StreamId {
        let stream = StreamId(self.next_stream);
        self.next_stream += 1;
        self.pending = Some(Pending {
            stream,
            slot: self.messages.len(),
        });
        self.messages.push(ChatMessage::assistant(""));
        stream
    }

    /// The reply slot owned by `stream`, if it is still the open reply.
    fn slot(&self, stream: StreamId) -> Option<usize> {
        self.pending
            .filter(|pending| pending.stream == stream)
            .map(|pending| pending.slot)
    }

    /// Appends streamed text to the open reply. Returns false when `stream`
    /// is not the open reply.
    pub fn apply_token(&mut self, stream: StreamId, content: &str) -> bool {
        let Some(slot) = self.slot(stream) else {
            tracing::debug!(?stream, "dropping token from stale stream");
            return false;
        };
        let reply = &self.messages[slot];
        self.messages[slot] = ChatMessage {
            role: reply.role,
            text: format!("{}{}", reply.text, content),
        };
        true
    }

    pub fn finish(&mut self, stream: StreamId) {
        if self.slot(stream).is_some() {
            self.pending = None;
        }
    }

    /// Ends the open reply with an error. An empty reply is replaced by the
    /// error text; a partial answer is kept and the error follows it as a
    /// separate message.
    pub fn fail(&mut self, stream: StreamId, error: &str) {
        let Some(slot) = self.slot(stream) else {
            return;
        };
        self.pending = None;

        let message = ChatMessage::assistant(format!("Network error: {}", error));
        if self.messages[slot].text.is_empty() {
            self.messages[slot] = message;
        } else {
            self.messages.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting() {
        let conversation = Conversation::with_greeting();
        assert_eq!(conversation.messages(), &[ChatMessage::assistant(GREETING)]);
        assert!(!conversation.is_streaming());
    }

    #[test]
    fn tokens_accumulate_in_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("question");
        let stream = conversation.begin_reply();
        assert!(conversation.is_streaming());

        for token in ["The ", "answer ", "is **42**."] {
            assert!(conversation.apply_token(stream, token));
        }
        conversation.finish(stream);

        assert!(!conversation.is_streaming());
        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::user("question"),
                ChatMessage::assistant("The answer is **42**."),
            ]
        );
    }

    #[test]
    fn stale_stream_cannot_write() {
        let mut conversation = Conversation::new();
        let old = conversation.begin_reply();
        conversation.fail(old, "connection reset");
        let current = conversation.begin_reply();

        assert!(!conversation.apply_token(old, "late"));
        conversation.fail(old, "late failure");
        conversation.finish(old);
        assert!(conversation.is_streaming());

        assert!(conversation.apply_token(current, "fresh"));
        assert_eq!(conversation.last().map(|m| m.text.as_str()), Some("fresh"));
    }

    #[test]
    fn failure_without_tokens_replaces_reply() {
        let mut conversation = Conversation::new();
        conversation.push_user("q");
        let stream = conversation.begin_reply();
        conversation.fail(stream, "HTTP error! status: 500 Internal Server Error");

        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::user("q"),
                ChatMessage::assistant("Network error: HTTP error! status: 500 Internal Server Error"),
            ]
        );
        assert!(!conversation.is_streaming());
    }

    #[test]
    fn failure_after_tokens_keeps_partial_answer() {
        let mut conversation = Conversation::new();
        let stream = conversation.begin_reply();
        conversation.apply_token(stream, "partial");
        conversation.fail(stream, "aborted");

        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::assistant("partial"),
                ChatMessage::assistant("Network error: aborted"),
            ]
        );
    }

    #[test]
    fn tokens_stay_in_reply_slot_after_user_message() {
        let mut conversation = Conversation::new();
        conversation.push_user("first");
        let stream = conversation.begin_reply();
        conversation.apply_token(stream, "Hel");
        conversation.push_user("second");
        conversation.apply_token(stream, "lo");
        conversation.finish(stream);

        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::user("first"),
                ChatMessage::assistant("Hello"),
                ChatMessage::user("second"),
            ]
        );
    }

    #[test]
    fn failure_replaces_empty_slot_not_last_message() {
        let mut conversation = Conversation::new();
        let stream = conversation.begin_reply();
        conversation.push_user("impatient");
        conversation.fail(stream, "timeout");

        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::assistant("Network error: timeout"),
                ChatMessage::user("impatient"),
            ]
        );
    }
}
