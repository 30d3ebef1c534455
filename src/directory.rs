//! Directory component for milou.
//!
//! Resolves address tokens to accounts and owns email normalization,
//! registration, and login validation.

use tracing::{info, warn};

use crate::auth::{validate_password, Argon2Scheme, PasswordScheme};
use crate::db::{Account, AccountRepository, Database, NewAccount};
use crate::{MilouError, Result};

/// Outcome of a bulk token resolution.
///
/// Unresolvable tokens are collected in `skipped` rather than failing
/// the whole resolution; callers decide whether an empty account set is
/// an error.
#[derive(Debug)]
pub struct Resolution {
    /// Resolved accounts, first-seen order, deduplicated by account id.
    pub accounts: Vec<Account>,
    /// Normalized emails that did not resolve to any account.
    pub skipped: Vec<String>,
}

/// Resolves address tokens to accounts; owns registration and login.
pub struct Directory<'a> {
    db: &'a Database,
    default_domain: String,
    scheme: Box<dyn PasswordScheme + 'a>,
}

impl<'a> Directory<'a> {
    /// Create a Directory with the default Argon2 password scheme.
    pub fn new(db: &'a Database, default_domain: impl Into<String>) -> Self {
        Self::with_scheme(db, default_domain, Box::new(Argon2Scheme))
    }

    /// Create a Directory with an injected password scheme.
    pub fn with_scheme(
        db: &'a Database,
        default_domain: impl Into<String>,
        scheme: Box<dyn PasswordScheme + 'a>,
    ) -> Self {
        Self {
            db,
            default_domain: default_domain.into(),
            scheme,
        }
    }

    /// Normalize an address token.
    ///
    /// Appends the configured default domain when the token has no
    /// domain separator, then lowercases.
    pub fn normalize(&self, token: &str) -> String {
        let token = token.trim();
        if token.contains('@') {
            token.to_lowercase()
        } else {
            format!("{}@{}", token, self.default_domain).to_lowercase()
        }
    }

    /// Resolve a single address token to an account.
    pub fn resolve(&self, token: &str) -> Result<Option<Account>> {
        let email = self.normalize(token);
        AccountRepository::get_by_email(self.db.conn(), &email)
    }

    /// Resolve a set of address tokens.
    ///
    /// Unresolvable tokens are reported individually (and warn-logged),
    /// not treated as a fatal error. Repeated tokens for the same account
    /// collapse to a single entry, preserving first-seen order.
    pub fn resolve_many<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Resolution> {
        let mut accounts: Vec<Account> = Vec::new();
        let mut skipped = Vec::new();

        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let email = self.normalize(token);
            match AccountRepository::get_by_email(self.db.conn(), &email)? {
                Some(account) => {
                    if !accounts.iter().any(|a| a.id == account.id) {
                        accounts.push(account);
                    }
                }
                None => {
                    warn!(email = %email, "address did not resolve to an account");
                    skipped.push(email);
                }
            }
        }

        Ok(Resolution { accounts, skipped })
    }

    /// Register a new account.
    ///
    /// Validates the password, normalizes the email, hashes the password
    /// and creates the account. The duplicate pre-check is advisory; the
    /// store's UNIQUE constraint is the real guard, and a lost race
    /// surfaces as the same `Conflict` error.
    pub fn register(&self, name: &str, raw_email: &str, raw_password: &str) -> Result<Account> {
        validate_password(raw_password).map_err(|e| MilouError::Validation(e.to_string()))?;

        let email = self.normalize(raw_email);

        let tx = self.db.unit_of_work()?;

        if AccountRepository::email_exists(&tx, &email)? {
            return Err(MilouError::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let digest = self
            .scheme
            .hash(raw_password)
            .map_err(|e| MilouError::Store(e.to_string()))?;

        let account = AccountRepository::create(&tx, &NewAccount::new(name, &email, digest))?;
        tx.commit()?;

        info!(
            email = %account.email,
            account_id = account.id,
            "New account registered"
        );

        Ok(account)
    }

    /// Authenticate an account by email and password.
    ///
    /// Fails uniformly whether the account is absent or the digest check
    /// fails, to avoid account enumeration.
    pub fn login(&self, raw_email: &str, raw_password: &str) -> Result<Account> {
        let invalid = || MilouError::Auth("invalid email or password".to_string());

        let email = self.normalize(raw_email);
        let account =
            AccountRepository::get_by_email(self.db.conn(), &email)?.ok_or_else(invalid)?;

        self.scheme
            .verify(raw_password, &account.password)
            .map_err(|_| invalid())?;

        info!(email = %account.email, account_id = account.id, "Login");

        Ok(account)
    }
}
