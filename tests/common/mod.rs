//! Test helpers for E2E tests.

use milou::auth::{PasswordError, PasswordScheme};
use milou::{Database, Directory};

/// Plaintext scheme so scenario tests don't pay the Argon2 cost per
/// account. Real-digest coverage lives in the auth module tests and in
/// `test_register_and_login_with_real_digests`.
pub struct PlainScheme;

impl PasswordScheme for PlainScheme {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, digest: &str) -> Result<(), PasswordError> {
        if digest == format!("plain:{password}") {
            Ok(())
        } else {
            Err(PasswordError::VerificationFailed)
        }
    }
}

/// Open a fresh in-memory database with migrations applied.
pub fn setup_db() -> Database {
    Database::open_in_memory().unwrap()
}

/// Directory over the test database with the plaintext scheme.
pub fn directory(db: &Database) -> Directory<'_> {
    Directory::with_scheme(db, "milou.com", Box::new(PlainScheme))
}
