//! Mailbox engine for milou: messages, addressing codes, threading,
//! read state and inbox views.

mod code;
mod query;
mod repository;
mod service;
mod types;

pub use code::{CodeAllocator, MAX_CODE_ATTEMPTS};
pub use query::MailboxQuery;
pub use repository::{InsertOutcome, MessageRepository};
pub use service::{Delivery, MailService};
pub use types::{
    Message, MessageView, NewMessage, RecipientLink, RecipientRef, SentMessage, CODE_ALPHABET,
    CODE_LENGTH,
};
