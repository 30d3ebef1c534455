//! milou - personal mailbox engine
//!
//! A small closed-world mail system: accounts in a directory, messages
//! addressed by short codes, threading via reply/forward, per-recipient
//! read state and mailbox views. Backed by SQLite.

pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod logging;
pub mod mail;

pub use auth::{
    validate_password, Argon2Scheme, PasswordError, PasswordScheme, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use config::Config;
pub use db::{Account, AccountRepository, Database, NewAccount};
pub use directory::{Directory, Resolution};
pub use error::{MilouError, Result};
pub use mail::{
    CodeAllocator, Delivery, MailService, MailboxQuery, Message, MessageRepository, MessageView,
    NewMessage, SentMessage,
};
