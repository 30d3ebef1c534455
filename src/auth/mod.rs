//! Authentication primitives for milou.

mod password;

pub use password::{
    validate_password, Argon2Scheme, PasswordError, PasswordScheme, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
