//! Mail types for milou.

use chrono::{DateTime, Utc};

/// Length of a message addressing code.
pub const CODE_LENGTH: usize = 6;

/// Alphabet codes are drawn from (36 symbols, ~3.1e9 codespace).
pub const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A persisted message.
///
/// Messages are immutable once created; only the read state of their
/// recipient links changes afterwards.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message ID.
    pub id: i64,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Short addressing code, globally unique.
    pub code: String,
    /// Sender account ID.
    pub sender_id: i64,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Check whether the given account authored this message.
    pub fn is_sender(&self, account_id: i64) -> bool {
        self.sender_id == account_id
    }
}

/// New message for creation.
///
/// The addressing code is allocated separately at persist time.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Sender account ID.
    pub sender_id: i64,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
}

impl NewMessage {
    /// Create a new message.
    pub fn new(sender_id: i64, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_id,
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Per-(message, recipient) delivery record with read state.
#[derive(Debug, Clone)]
pub struct RecipientLink {
    /// Message ID.
    pub message_id: i64,
    /// Recipient account ID.
    pub recipient_id: i64,
    /// Whether the recipient has read the message. Monotonic: once true,
    /// never reset.
    pub is_read: bool,
    /// When the recipient first read the message. Set exactly once.
    pub read_at: Option<DateTime<Utc>>,
}

/// A resolved recipient reference: account id plus its display email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRef {
    /// Recipient account ID.
    pub account_id: i64,
    /// Recipient email.
    pub email: String,
}

/// Full message content returned by a read operation.
#[derive(Debug, Clone)]
pub struct MessageView {
    /// Short addressing code.
    pub code: String,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Sender email.
    pub sender: String,
    /// Recipient emails in delivery order.
    pub recipients: Vec<String>,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
}

/// One entry of the sent-messages listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Subject line.
    pub subject: String,
    /// Short addressing code.
    pub code: String,
    /// Recipient emails joined with `", "`, in delivery order.
    pub recipients: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message() {
        let message = NewMessage::new(1, "Hello", "Body text");
        assert_eq!(message.sender_id, 1);
        assert_eq!(message.subject, "Hello");
        assert_eq!(message.body, "Body text");
    }

    #[test]
    fn test_message_is_sender() {
        let message = Message {
            id: 1,
            subject: "Test".to_string(),
            body: "Body".to_string(),
            code: "abc123".to_string(),
            sender_id: 7,
            sent_at: Utc::now(),
        };
        assert!(message.is_sender(7));
        assert!(!message.is_sender(8));
    }

    #[test]
    fn test_code_alphabet_shape() {
        assert_eq!(CODE_ALPHABET.len(), 36);
        assert_eq!(CODE_LENGTH, 6);
        assert!(CODE_ALPHABET
            .iter()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
