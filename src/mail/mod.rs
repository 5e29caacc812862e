//! Collective mail
//!
//! Store-and-forward messaging between the members of a fixed AI
//! collective.
//!
//! # Overview
//!
//! - **Directory** — the injected roster; canonicalizes host-style
//!   identifiers and answers membership queries
//! - **Message** — the immutable-once-created record, with a single
//!   false→true read transition
//! - **MessageStore** — one persistence contract, two interchangeable
//!   backends: flat-file-per-message and SQLite
//! - **Mailbox** — send/list/read/status/stats policy on top of the two
//!
//! # Addressing
//!
//! Members are addressed by canonical short name; host-qualified forms
//! (`edgar-dev.justsparx.local`) are accepted anywhere a name is and
//! resolve to the same member.

mod directory;
mod filesystem;
mod mailbox;
mod message;
mod sqlite;
mod store;

pub use directory::{canonicalize, Directory, DirectoryError};
pub use filesystem::FilesystemStore;
pub use mailbox::{
    Mailbox, MailboxError, MemberStatus, SendReceipt, StatusReport,
};
pub use message::{Message, MessageId, MessageSummary, Priority};
pub use sqlite::SqliteStore;
pub use store::{CollectiveStats, ListFilter, MailboxCounts, MessageStore, StoreError};
