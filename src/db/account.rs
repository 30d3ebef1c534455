//! Account model and repository for milou.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{MilouError, Result};

use super::is_unique_violation;

/// A registered account.
///
/// The email is stored normalized (lowercase) and is immutable after
/// creation; accounts are never deleted.
#[derive(Debug, Clone)]
pub struct Account {
    /// Account ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Normalized email address (lowercase, unique).
    pub email: String,
    /// Password digest (Argon2 PHC string).
    pub password: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new account.
///
/// The email must already be normalized and the password pre-hashed;
/// the Directory component is responsible for both.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Normalized email address.
    pub email: String,
    /// Password digest.
    pub password: String,
}

impl NewAccount {
    /// Create a new account record.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Repository for account operations.
pub struct AccountRepository;

impl AccountRepository {
    /// Create a new account.
    ///
    /// The UNIQUE constraint on `accounts.email` is the authoritative
    /// duplicate guard; a violation maps to `MilouError::Conflict` so a
    /// lost check-then-insert race surfaces exactly like the pre-check.
    pub fn create(conn: &Connection, account: &NewAccount) -> Result<Account> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = conn.execute(
            r#"
            INSERT INTO accounts (name, email, password, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![account.name, account.email, account.password, created_at],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e, "accounts.email") => {
                return Err(MilouError::Conflict(
                    "an account with this email already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| MilouError::NotFound("account".to_string()))
    }

    /// Get an account by ID.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Account>> {
        let account = conn
            .query_row(
                r#"
                SELECT id, name, email, password, created_at
                FROM accounts
                WHERE id = ?1
                "#,
                [id],
                Self::map_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Get an account by normalized email (exact match).
    pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<Account>> {
        let account = conn
            .query_row(
                r#"
                SELECT id, name, email, password, created_at
                FROM accounts
                WHERE email = ?1
                "#,
                [email],
                Self::map_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Check if an account with the given normalized email exists.
    ///
    /// Advisory only; the UNIQUE constraint remains the real guard.
    pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1)",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Count all accounts.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Map a database row to an Account.
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Account> {
        let created_at_str: String = row.get(4)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at,
        })
    }
}
