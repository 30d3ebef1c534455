//! Mailbox views for milou.
//!
//! Read-only listings over a user's mailbox. Single-statement reads,
//! so no explicit transaction is taken.

use crate::db::{Account, Database};
use crate::Result;

use super::repository::MessageRepository;
use super::types::{Message, SentMessage};

/// Read-only mailbox listings for an account.
pub struct MailboxQuery<'a> {
    db: &'a Database,
}

impl<'a> MailboxQuery<'a> {
    /// Create a new MailboxQuery.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All messages received by the user, most recent first.
    pub fn list_received(&self, user: &Account) -> Result<Vec<Message>> {
        MessageRepository::list_received(self.db.conn(), user.id)
    }

    /// Unread messages for the user, most recent first.
    ///
    /// An empty result is an ordinary empty listing, not an error.
    pub fn list_unread(&self, user: &Account) -> Result<Vec<Message>> {
        MessageRepository::list_unread(self.db.conn(), user.id)
    }

    /// Number of unread messages for the user.
    pub fn unread_count(&self, user: &Account) -> Result<i64> {
        MessageRepository::unread_count(self.db.conn(), user.id)
    }

    /// Messages sent by the user, most recent first, as named records
    /// with the recipient list flattened for display.
    pub fn list_sent(&self, user: &Account) -> Result<Vec<SentMessage>> {
        MessageRepository::list_sent(self.db.conn(), user.id)
    }
}
