//! E2E mailbox tests for milou.
//!
//! Drives the full stack (directory, mail service, mailbox views) over
//! an in-memory database, end to end.

mod common;

use common::{directory, setup_db};
use milou::{Directory, MailService, MailboxQuery, MilouError};

/// Registration, duplicate conflict and uniform login failures.
#[test]
fn test_registration_and_login_flow() {
    let db = setup_db();
    let dir = directory(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    assert_eq!(alice.email, "alice@x.com");

    // Weak password is rejected before anything touches the store
    let weak = dir.register("Eve", "eve@x.com", "short");
    assert!(matches!(weak, Err(MilouError::Validation(_))));

    // Same address again, even in a different case, conflicts
    let dup = dir.register("Alice Two", "ALICE@X.COM", "pass5678");
    assert!(matches!(dup, Err(MilouError::Conflict(_))));

    // Unknown address and wrong password fail with the same message
    let unknown = dir.login("nobody@x.com", "pass1234").unwrap_err();
    let wrong = dir.login("alice@x.com", "wrong-pass").unwrap_err();
    assert_eq!(unknown.to_string(), wrong.to_string());

    let back = dir.login("alice@x.com", "pass1234").unwrap();
    assert_eq!(back.id, alice.id);
}

/// Register and log in through the default Argon2 scheme.
#[test]
fn test_register_and_login_with_real_digests() {
    let db = setup_db();
    let dir = Directory::new(&db, "milou.com");

    let account = dir.register("Alice", "alice", "pass1234").unwrap();
    assert_eq!(account.email, "alice@milou.com");
    assert!(account.password.starts_with("$argon2"));

    assert!(dir.login("Alice", "pass1234").is_ok());
    assert!(matches!(
        dir.login("alice", "wrong-pass"),
        Err(MilouError::Auth(_))
    ));
}

/// Scenario: Alice sends to the bare token "bob"; Bob finds it unread.
#[test]
fn test_send_with_default_domain_lands_unread() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);
    let query = MailboxQuery::new(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();

    let delivery = service
        .compose(&alice, &["bob"], "Hello", "How are you?")
        .unwrap();
    assert_eq!(delivery.recipients, vec!["bob@milou.com".to_string()]);
    assert_eq!(delivery.message.code.len(), 6);

    let unread = query.list_unread(&bob).unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].subject, "Hello");
    assert_eq!(unread[0].code, delivery.message.code);

    // And in the sender's outbox
    let sent = query.list_sent(&alice).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, "bob@milou.com");
}

/// Scenario: Bob reads by code and replies; the reply goes back to
/// Alice with the "[Re] " prefix.
#[test]
fn test_read_and_reply() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);
    let query = MailboxQuery::new(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();

    let original = service
        .compose(&alice, &["bob"], "Lunch?", "Friday at noon?")
        .unwrap();

    let view = service.read_by_code(&bob, &original.message.code).unwrap();
    assert_eq!(view.subject, "Lunch?");
    assert_eq!(view.sender, "alice@x.com");
    assert_eq!(query.unread_count(&bob).unwrap(), 0);

    let reply = service
        .reply(&bob, &original.message.code, "Works for me")
        .unwrap();
    assert_eq!(reply.message.subject, "[Re] Lunch?");
    assert_eq!(reply.recipients, vec!["alice@x.com".to_string()]);

    let alice_unread = query.list_unread(&alice).unwrap();
    assert_eq!(alice_unread.len(), 1);
    assert_eq!(alice_unread[0].subject, "[Re] Lunch?");
}

/// Scenario: an uninvolved third party can neither read nor reply.
#[test]
fn test_outsider_cannot_read_or_reply() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let _bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();
    let carol = dir.register("Carol", "carol@milou.com", "pass1234").unwrap();

    let delivery = service
        .compose(&alice, &["bob"], "Private", "Between us")
        .unwrap();

    assert!(matches!(
        service.read_by_code(&carol, &delivery.message.code),
        Err(MilouError::Authorization(_))
    ));
    assert!(matches!(
        service.reply(&carol, &delivery.message.code, "Me too"),
        Err(MilouError::Authorization(_))
    ));
}

/// Scenario: Bob forwards Alice's message to Dave; the copy carries
/// the "[Fw] " prefix and the body verbatim.
#[test]
fn test_forward_to_third_party() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);
    let query = MailboxQuery::new(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();
    let dave = dir.register("Dave", "dave@milou.com", "pass1234").unwrap();

    let original = service
        .compose(&alice, &["bob"], "Specs", "Attached below.")
        .unwrap();

    let forwarded = service
        .forward(&bob, &original.message.code, &["dave"])
        .unwrap();
    assert_eq!(forwarded.message.subject, "[Fw] Specs");
    assert_eq!(forwarded.message.body, "Attached below.");
    assert_ne!(forwarded.message.code, original.message.code);

    let view = service.read_by_code(&dave, &forwarded.message.code).unwrap();
    assert_eq!(view.body, "Attached below.");
    assert_eq!(view.sender, "bob@milou.com");

    // The forward is an independent message in Bob's outbox
    let sent = query.list_sent(&bob).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[Fw] Specs");
}

/// Reply to a group message fans out to sender plus remaining
/// recipients, and prefixes accumulate over hops.
#[test]
fn test_group_reply_and_prefix_accumulation() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let _bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();
    let carol = dir.register("Carol", "carol@milou.com", "pass1234").unwrap();

    let original = service
        .compose(&alice, &["bob", "carol"], "Plan", "Saturday?")
        .unwrap();

    let reply = service
        .reply(&carol, &original.message.code, "Works")
        .unwrap();
    assert_eq!(
        reply.recipients,
        vec!["alice@x.com".to_string(), "bob@milou.com".to_string()]
    );

    let second = service
        .reply(&alice, &reply.message.code, "Booked")
        .unwrap();
    assert_eq!(second.message.subject, "[Re] [Re] Plan");
}

/// Re-reading keeps the first read timestamp; unread views are stable.
#[test]
fn test_read_state_is_set_once() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);
    let query = MailboxQuery::new(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();

    let delivery = service
        .compose(&alice, &["bob"], "Hello", "Body")
        .unwrap();
    let code = delivery.message.code.clone();

    service.read_by_code(&bob, &code).unwrap();
    assert_eq!(query.unread_count(&bob).unwrap(), 0);

    // Second read changes nothing
    service.read_by_code(&bob, &code).unwrap();
    assert_eq!(query.unread_count(&bob).unwrap(), 0);
    assert_eq!(query.list_received(&bob).unwrap().len(), 1);
}

/// Unresolvable recipients are dropped; all-invalid fails cleanly with
/// nothing persisted.
#[test]
fn test_unresolvable_recipients() {
    let db = setup_db();
    let dir = directory(&db);
    let service = MailService::new(&db, &dir);
    let query = MailboxQuery::new(&db);

    let alice = dir.register("Alice", "alice@x.com", "pass1234").unwrap();
    let bob = dir.register("Bob", "bob@milou.com", "pass1234").unwrap();

    let delivery = service
        .compose(&alice, &["bob", "ghost"], "Hi", "Body")
        .unwrap();
    assert_eq!(delivery.recipients, vec!["bob@milou.com".to_string()]);
    assert_eq!(delivery.skipped, vec!["ghost@milou.com".to_string()]);

    let none = service.compose(&alice, &["ghost", "phantom"], "Hi", "Body");
    assert!(matches!(none, Err(MilouError::Validation(_))));

    // Only the first message exists
    assert_eq!(query.list_sent(&alice).unwrap().len(), 1);
    assert_eq!(query.list_received(&bob).unwrap().len(), 1);
}
