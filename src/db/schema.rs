//! Database schema and migrations for milou.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - accounts table
    r#"
-- Accounts table for registered mailbox owners
CREATE TABLE accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,    -- stored lowercase, uniqueness is authoritative
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_accounts_email ON accounts(email);
"#,
    // v2: Messages table with unique short addressing codes
    r#"
-- Messages table; code is the short addressing token used by reply/forward/read
CREATE TABLE messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject     TEXT NOT NULL,
    body        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,    -- [a-z0-9]{6}, allocation retries on conflict
    sent_at     TEXT NOT NULL DEFAULT (datetime('now')),
    sender_id   INTEGER NOT NULL REFERENCES accounts(id)
);

CREATE INDEX idx_messages_sender_id ON messages(sender_id);
CREATE INDEX idx_messages_sent_at ON messages(sent_at);
"#,
    // v3: Recipient links with per-recipient read state
    r#"
-- One row per (message, recipient); read flag is monotonic false -> true
CREATE TABLE message_recipients (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id    INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    recipient_id  INTEGER NOT NULL REFERENCES accounts(id),
    is_read       INTEGER NOT NULL DEFAULT 0,
    read_at       TEXT,
    UNIQUE(message_id, recipient_id)
);

CREATE INDEX idx_message_recipients_message_id ON message_recipients(message_id);
CREATE INDEX idx_message_recipients_recipient_id ON message_recipients(recipient_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_accounts_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE accounts"));
        assert!(first.contains("email"));
        assert!(first.contains("UNIQUE"));
    }

    #[test]
    fn test_messages_migration_contains_code_constraint() {
        let messages_migration = MIGRATIONS[1];
        assert!(messages_migration.contains("CREATE TABLE messages"));
        assert!(messages_migration.contains("code        TEXT NOT NULL UNIQUE"));
        assert!(messages_migration.contains("sender_id"));
    }

    #[test]
    fn test_recipients_migration_contains_link_constraint() {
        let recipients_migration = MIGRATIONS[2];
        assert!(recipients_migration.contains("CREATE TABLE message_recipients"));
        assert!(recipients_migration.contains("UNIQUE(message_id, recipient_id)"));
        assert!(recipients_migration.contains("is_read"));
        assert!(recipients_migration.contains("read_at"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(
                migration.contains("CREATE TABLE")
                    || migration.contains("ALTER TABLE")
                    || migration.contains("CREATE INDEX")
            );
        }
    }
}
