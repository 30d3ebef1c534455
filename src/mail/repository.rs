//! Message repository for milou.
//!
//! Persists messages together with their recipient links and exposes the
//! parameterized lookups the mailbox operations need. All functions take
//! a plain connection reference so they compose into the caller's
//! transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::is_unique_violation;
use crate::Result;

use super::types::{Message, NewMessage, RecipientLink, RecipientRef, SentMessage};

/// Outcome of attempting to persist a message under a candidate code.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Message and recipient links persisted.
    Created(Message),
    /// The candidate code lost the insert race; caller should redraw.
    CodeTaken,
}

/// Repository for message and recipient-link operations.
pub struct MessageRepository;

impl MessageRepository {
    /// Persist a message under the given code, with one recipient link
    /// per recipient, as part of the caller's transaction.
    ///
    /// The UNIQUE constraint on `messages.code` is the authoritative
    /// uniqueness check: losing it yields `InsertOutcome::CodeTaken` so
    /// the caller can redraw instead of surfacing a user error.
    pub fn insert_with_recipients(
        conn: &Connection,
        message: &NewMessage,
        code: &str,
        recipients: &[RecipientRef],
    ) -> Result<InsertOutcome> {
        let sent_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = conn.execute(
            r#"
            INSERT INTO messages (subject, body, code, sent_at, sender_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                message.subject,
                message.body,
                code,
                sent_at,
                message.sender_id
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e, "messages.code") => {
                return Ok(InsertOutcome::CodeTaken);
            }
            Err(e) => return Err(e.into()),
        }

        let message_id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO message_recipients (message_id, recipient_id)
            VALUES (?1, ?2)
            "#,
        )?;
        for recipient in recipients {
            stmt.execute(params![message_id, recipient.account_id])?;
        }

        let created = Self::get_by_id(conn, message_id)?
            .ok_or_else(|| crate::MilouError::Store("inserted message vanished".to_string()))?;
        Ok(InsertOutcome::Created(created))
    }

    /// Get a message by ID.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Message>> {
        let message = conn
            .query_row(
                r#"
                SELECT id, subject, body, code, sender_id, sent_at
                FROM messages
                WHERE id = ?1
                "#,
                [id],
                Self::map_row,
            )
            .optional()?;
        Ok(message)
    }

    /// Get a message by its addressing code.
    pub fn get_by_code(conn: &Connection, code: &str) -> Result<Option<Message>> {
        let message = conn
            .query_row(
                r#"
                SELECT id, subject, body, code, sender_id, sent_at
                FROM messages
                WHERE code = ?1
                "#,
                [code],
                Self::map_row,
            )
            .optional()?;
        Ok(message)
    }

    /// Check whether a code is already in use.
    ///
    /// Advisory pre-check only; `insert_with_recipients` remains the
    /// authoritative arbiter.
    pub fn code_exists(conn: &Connection, code: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE code = ?1)",
            [code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Recipients of a message in delivery order.
    pub fn recipients_of(conn: &Connection, message_id: i64) -> Result<Vec<RecipientRef>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.email
            FROM message_recipients mr
            JOIN accounts a ON a.id = mr.recipient_id
            WHERE mr.message_id = ?1
            ORDER BY mr.id
            "#,
        )?;

        let recipients = stmt
            .query_map([message_id], |row| {
                Ok(RecipientRef {
                    account_id: row.get(0)?,
                    email: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(recipients)
    }

    /// Check whether an account holds a recipient link for a message.
    pub fn is_recipient(conn: &Connection, message_id: i64, account_id: i64) -> Result<bool> {
        let exists: bool = conn.query_row(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM message_recipients
                WHERE message_id = ?1 AND recipient_id = ?2
            )
            "#,
            [message_id, account_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Get the recipient link for a (message, recipient) pair.
    pub fn link(
        conn: &Connection,
        message_id: i64,
        recipient_id: i64,
    ) -> Result<Option<RecipientLink>> {
        let link = conn
            .query_row(
                r#"
                SELECT message_id, recipient_id, is_read, read_at
                FROM message_recipients
                WHERE message_id = ?1 AND recipient_id = ?2
                "#,
                [message_id, recipient_id],
                |row| {
                    let read_at: Option<String> = row.get(3)?;
                    Ok(RecipientLink {
                        message_id: row.get(0)?,
                        recipient_id: row.get(1)?,
                        is_read: row.get::<_, i32>(2)? != 0,
                        read_at: read_at.and_then(|s| {
                            DateTime::parse_from_rfc3339(&s)
                                .map(|dt| dt.with_timezone(&Utc))
                                .ok()
                        }),
                    })
                },
            )
            .optional()?;
        Ok(link)
    }

    /// Flip a recipient link's read flag, setting the read timestamp on
    /// the first transition only.
    ///
    /// The `is_read = 0` guard makes the update conditional: re-reading
    /// is a no-op and the first read time is preserved, also under
    /// concurrent reads by the same recipient.
    pub fn mark_read_once(conn: &Connection, message_id: i64, recipient_id: i64) -> Result<bool> {
        let read_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let rows = conn.execute(
            r#"
            UPDATE message_recipients
            SET is_read = 1, read_at = ?3
            WHERE message_id = ?1 AND recipient_id = ?2 AND is_read = 0
            "#,
            params![message_id, recipient_id, read_at],
        )?;
        Ok(rows > 0)
    }

    /// List messages received by a user, most recent first.
    pub fn list_received(conn: &Connection, user_id: i64) -> Result<Vec<Message>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.subject, m.body, m.code, m.sender_id, m.sent_at
            FROM messages m
            JOIN message_recipients mr ON mr.message_id = m.id
            WHERE mr.recipient_id = ?1
            ORDER BY m.sent_at DESC, m.id DESC
            "#,
        )?;

        let messages = stmt
            .query_map([user_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// List unread messages for a user, most recent first.
    pub fn list_unread(conn: &Connection, user_id: i64) -> Result<Vec<Message>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.subject, m.body, m.code, m.sender_id, m.sent_at
            FROM messages m
            JOIN message_recipients mr ON mr.message_id = m.id
            WHERE mr.recipient_id = ?1 AND mr.is_read = 0
            ORDER BY m.sent_at DESC, m.id DESC
            "#,
        )?;

        let messages = stmt
            .query_map([user_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Count unread messages for a user.
    pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64> {
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM message_recipients
            WHERE recipient_id = ?1 AND is_read = 0
            "#,
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// List messages sent by a user as named records, most recent first.
    pub fn list_sent(conn: &Connection, user_id: i64) -> Result<Vec<SentMessage>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject, code
            FROM messages
            WHERE sender_id = ?1
            ORDER BY sent_at DESC, id DESC
            "#,
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sent = Vec::with_capacity(rows.len());
        for (id, subject, code) in rows {
            let recipients = Self::recipients_of(conn, id)?
                .into_iter()
                .map(|r| r.email)
                .collect::<Vec<_>>()
                .join(", ");
            sent.push(SentMessage {
                subject,
                code,
                recipients,
            });
        }
        Ok(sent)
    }

    /// Count total messages.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Map a database row to a Message.
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Message> {
        let sent_at_str: String = row.get(5)?;
        let sent_at = DateTime::parse_from_rfc3339(&sent_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Message {
            id: row.get(0)?,
            subject: row.get(1)?,
            body: row.get(2)?,
            code: row.get(3)?,
            sender_id: row.get(4)?,
            sent_at,
        })
    }
}
