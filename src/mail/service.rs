//! Mail service for milou.
//!
//! High-level mailbox operations: compose, reply, forward and read.
//! Each operation executes as exactly one transaction against the store;
//! there is no intermediate observable state.

use rusqlite::Connection;
use tracing::info;

use crate::db::{Account, AccountRepository, Database};
use crate::directory::{Directory, Resolution};
use crate::{MilouError, Result};

use super::code::{CodeAllocator, MAX_CODE_ATTEMPTS};
use super::repository::{InsertOutcome, MessageRepository};
use super::types::{Message, MessageView, NewMessage, RecipientRef};

/// Result of a compose/reply/forward operation.
#[derive(Debug)]
pub struct Delivery {
    /// The persisted message.
    pub message: Message,
    /// Recipient emails, delivery order.
    pub recipients: Vec<String>,
    /// Address tokens that did not resolve and were dropped.
    pub skipped: Vec<String>,
}

/// Service for mailbox operations.
pub struct MailService<'a> {
    db: &'a Database,
    directory: &'a Directory<'a>,
}

impl<'a> MailService<'a> {
    /// Create a new MailService.
    pub fn new(db: &'a Database, directory: &'a Directory<'a>) -> Self {
        Self { db, directory }
    }

    /// Compose a new message to the given address tokens.
    ///
    /// Unresolvable tokens are dropped (reported in the returned
    /// `Delivery`); the operation fails only when no token resolves.
    /// Nothing is persisted on failure.
    pub fn compose<S: AsRef<str>>(
        &self,
        sender: &Account,
        recipient_tokens: &[S],
        subject: &str,
        body: &str,
    ) -> Result<Delivery> {
        let tx = self.db.unit_of_work()?;

        let Resolution { accounts, skipped } = self.directory.resolve_many(recipient_tokens)?;
        if accounts.is_empty() {
            return Err(MilouError::Validation("no valid recipients".to_string()));
        }

        let recipients: Vec<RecipientRef> = accounts
            .into_iter()
            .map(|a| RecipientRef {
                account_id: a.id,
                email: a.email,
            })
            .collect();

        let message = self.persist(&tx, NewMessage::new(sender.id, subject, body), &recipients)?;
        tx.commit()?;

        info!(
            code = %message.code,
            sender = %sender.email,
            recipients = recipients.len(),
            dropped = skipped.len(),
            "Message sent"
        );

        Ok(Delivery {
            message,
            recipients: recipients.into_iter().map(|r| r.email).collect(),
            skipped,
        })
    }

    /// Reply to the message with the given code.
    ///
    /// The replier must be the original sender or a current recipient.
    /// Derived recipients: the original sender (if not the replier),
    /// then each original recipient except the replier, in original
    /// order, deduplicated first-seen.
    pub fn reply(&self, replier: &Account, original_code: &str, body: &str) -> Result<Delivery> {
        let tx = self.db.unit_of_work()?;

        let original = MessageRepository::get_by_code(&tx, original_code)?
            .ok_or_else(|| MilouError::NotFound("message".to_string()))?;
        self.authorize(&tx, &original, replier, "reply to")?;

        let mut recipients: Vec<RecipientRef> = Vec::new();
        if original.sender_id != replier.id {
            let sender = AccountRepository::get_by_id(&tx, original.sender_id)?
                .ok_or_else(|| MilouError::NotFound("sender account".to_string()))?;
            recipients.push(RecipientRef {
                account_id: sender.id,
                email: sender.email,
            });
        }
        for recipient in MessageRepository::recipients_of(&tx, original.id)? {
            if recipient.account_id != replier.id
                && !recipients
                    .iter()
                    .any(|r| r.account_id == recipient.account_id)
            {
                recipients.push(recipient);
            }
        }

        if recipients.is_empty() {
            return Err(MilouError::Validation("nothing to reply to".to_string()));
        }

        // Prefixes accumulate over repeated hops; that is the documented
        // behavior, not collapsed here
        let subject = format!("[Re] {}", original.subject);

        let message = self.persist(&tx, NewMessage::new(replier.id, subject, body), &recipients)?;
        tx.commit()?;

        info!(
            code = %message.code,
            original = %original_code,
            replier = %replier.email,
            "Reply sent"
        );

        Ok(Delivery {
            message,
            recipients: recipients.into_iter().map(|r| r.email).collect(),
            skipped: Vec::new(),
        })
    }

    /// Forward the message with the given code to new recipients.
    ///
    /// The forwarder must be the original sender or a current recipient.
    /// Recipients are exactly the caller-supplied tokens; the body is
    /// copied verbatim. The result is an independent message with no
    /// parent pointer.
    pub fn forward<S: AsRef<str>>(
        &self,
        forwarder: &Account,
        original_code: &str,
        recipient_tokens: &[S],
    ) -> Result<Delivery> {
        let tx = self.db.unit_of_work()?;

        let original = MessageRepository::get_by_code(&tx, original_code)?
            .ok_or_else(|| MilouError::NotFound("message".to_string()))?;
        self.authorize(&tx, &original, forwarder, "forward")?;

        let Resolution { accounts, skipped } = self.directory.resolve_many(recipient_tokens)?;
        if accounts.is_empty() {
            return Err(MilouError::Validation("no valid recipients".to_string()));
        }

        let recipients: Vec<RecipientRef> = accounts
            .into_iter()
            .map(|a| RecipientRef {
                account_id: a.id,
                email: a.email,
            })
            .collect();

        let subject = format!("[Fw] {}", original.subject);
        let body = original.body.clone();

        let message = self.persist(&tx, NewMessage::new(forwarder.id, subject, body), &recipients)?;
        tx.commit()?;

        info!(
            code = %message.code,
            original = %original_code,
            forwarder = %forwarder.email,
            "Message forwarded"
        );

        Ok(Delivery {
            message,
            recipients: recipients.into_iter().map(|r| r.email).collect(),
            skipped,
        })
    }

    /// Read a message by code.
    ///
    /// The requester must be the sender or a recipient. When a recipient
    /// reads, their link's read flag flips false -> true exactly once;
    /// re-reading neither errors nor moves the first read timestamp.
    pub fn read_by_code(&self, requester: &Account, code: &str) -> Result<MessageView> {
        let tx = self.db.unit_of_work()?;

        let message = MessageRepository::get_by_code(&tx, code)?
            .ok_or_else(|| MilouError::NotFound("message".to_string()))?;

        let is_recipient = MessageRepository::is_recipient(&tx, message.id, requester.id)?;
        if !message.is_sender(requester.id) && !is_recipient {
            return Err(MilouError::Authorization(
                "you cannot read this message".to_string(),
            ));
        }

        if is_recipient {
            MessageRepository::mark_read_once(&tx, message.id, requester.id)?;
        }

        let sender = AccountRepository::get_by_id(&tx, message.sender_id)?
            .ok_or_else(|| MilouError::NotFound("sender account".to_string()))?;
        let recipients = MessageRepository::recipients_of(&tx, message.id)?
            .into_iter()
            .map(|r| r.email)
            .collect();

        tx.commit()?;

        Ok(MessageView {
            code: message.code,
            subject: message.subject,
            body: message.body,
            sender: sender.email,
            recipients,
            sent_at: message.sent_at,
        })
    }

    /// Check that the requester is the message's sender or one of its
    /// recipients.
    fn authorize(
        &self,
        conn: &Connection,
        message: &Message,
        requester: &Account,
        action: &str,
    ) -> Result<()> {
        if message.is_sender(requester.id)
            || MessageRepository::is_recipient(conn, message.id, requester.id)?
        {
            Ok(())
        } else {
            Err(MilouError::Authorization(format!(
                "you cannot {action} this message"
            )))
        }
    }

    /// Persist a message, drawing codes until one wins the store's
    /// uniqueness constraint.
    fn persist(
        &self,
        conn: &Connection,
        message: NewMessage,
        recipients: &[RecipientRef],
    ) -> Result<Message> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = CodeAllocator::draw();
            // Advisory pre-check; the insert below is the real arbiter
            if MessageRepository::code_exists(conn, &code)? {
                continue;
            }
            match MessageRepository::insert_with_recipients(conn, &message, &code, recipients)? {
                InsertOutcome::Created(created) => return Ok(created),
                InsertOutcome::CodeTaken => continue,
            }
        }

        Err(MilouError::Store(format!(
            "could not allocate a unique message code in {MAX_CODE_ATTEMPTS} attempts"
        )))
    }
}
