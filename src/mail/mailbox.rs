//! Mailbox service
//!
//! Orchestrates the directory and the store to implement the five
//! user-facing operations: send, list, read, status, stats. All
//! validation and resolution policy lives here; the store stays purely
//! mechanical.
//!
//! # Example
//!
//! ```no_run
//! use labmail::mail::{Directory, FilesystemStore, Mailbox, Priority};
//!
//! let roster = vec!["edgar-dev".to_string(), "hal-db".to_string()];
//! let store = FilesystemStore::open("/var/lib/labmail", &roster).unwrap();
//! let directory = Directory::new(roster, "edgar-dev");
//! let mailbox = Mailbox::new(directory, Box::new(store));
//!
//! let receipt = mailbox
//!     .send("hal-db", "Schema migration", "Please apply v42", Priority::High)
//!     .unwrap();
//! println!("sent {}", receipt.id.short());
//! ```

use super::directory::canonicalize;
use super::store::{CollectiveStats, ListFilter, MailboxCounts, StoreError};
use super::{Directory, Message, MessageId, MessageStore, MessageSummary, Priority};
use thiserror::Error;

/// Mailbox operation errors
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("unknown recipient '{name}' (valid recipients: {})", members.join(", "))]
    UnknownRecipient { name: String, members: Vec<String> },

    #[error("message subject must not be empty")]
    EmptySubject,

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for mailbox operations
pub type Result<T> = std::result::Result<T, MailboxError>;

/// Outcome of a successful send
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub id: MessageId,
    pub to: String,
    pub subject: String,
    pub priority: Priority,
}

/// One roster member in the status report
#[derive(Debug, Clone)]
pub struct MemberStatus {
    pub name: String,
    /// Whether this member's inbox is provisioned; `None` for backends
    /// without per-member provisioning
    pub provisioned: Option<bool>,
}

/// Local mailbox status
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub identity: String,
    pub counts: MailboxCounts,
    pub members: Vec<MemberStatus>,
}

/// The mailbox service
pub struct Mailbox {
    directory: Directory,
    store: Box<dyn MessageStore>,
}

impl Mailbox {
    /// Create a mailbox over a directory and a store backend
    pub fn new(directory: Directory, store: Box<dyn MessageStore>) -> Self {
        Self { directory, store }
    }

    /// The local agent's canonical identity
    pub fn identity(&self) -> &str {
        self.directory.self_identity()
    }

    /// Send a message to a collective member
    ///
    /// The recipient is canonicalized and validated before anything is
    /// persisted; a rejected send creates no record. Append failures are
    /// surfaced, never retried: a silent retry could deliver one user
    /// action twice.
    pub fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        priority: Priority,
    ) -> Result<SendReceipt> {
        let recipient = canonicalize(recipient);
        if !self.directory.is_known(&recipient) {
            return Err(MailboxError::UnknownRecipient {
                name: recipient,
                members: self.directory.members().to_vec(),
            });
        }
        if subject.trim().is_empty() {
            return Err(MailboxError::EmptySubject);
        }

        let message = Message::new(self.identity(), recipient, subject, body, priority);
        self.store.append(&message)?;

        tracing::info!(
            id = %message.id,
            to = %message.to,
            priority = %message.priority,
            "Message sent"
        );

        Ok(SendReceipt {
            id: message.id,
            to: message.to,
            subject: message.subject,
            priority: message.priority,
        })
    }

    /// List the local inbox, newest first
    ///
    /// The sender filter is canonicalized, so `--from hal-db.local` and
    /// `--from hal-db` agree.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<MessageSummary>> {
        let filter = ListFilter {
            unread_only: filter.unread_only,
            from_sender: filter.from_sender.as_deref().map(canonicalize),
        };
        Ok(self.store.list(self.identity(), &filter)?)
    }

    /// Read one message by id prefix, marking it read
    ///
    /// The returned record is re-fetched after the transition so it
    /// carries the authoritative `read_at` — on a re-read of an already
    /// read message that is the original first-read stamp.
    pub fn read(&self, id_prefix: &str) -> Result<Message> {
        let found = self
            .store
            .find_by_prefix(self.identity(), id_prefix)?
            .ok_or_else(|| MailboxError::MessageNotFound(id_prefix.to_string()))?;

        self.store.mark_read(&found.id)?;

        let refreshed = self.store.find_by_prefix(self.identity(), &found.id.to_text())?;
        Ok(refreshed.unwrap_or(found))
    }

    /// Unread summaries, without marking anything read
    ///
    /// Browsing the unread list is read-only; only fetching one specific
    /// message transitions read-state.
    pub fn unread(&self) -> Result<Vec<MessageSummary>> {
        Ok(self.store.list(self.identity(), &ListFilter::unread())?)
    }

    /// Local counts plus the roster, with provisioning annotations where
    /// the backend exposes them
    pub fn status(&self) -> Result<StatusReport> {
        let counts = self.store.counts(self.identity())?;
        let mut members = Vec::new();
        for name in self.directory.members() {
            members.push(MemberStatus {
                name: name.clone(),
                provisioned: self.store.inbox_provisioned(name)?,
            });
        }
        Ok(StatusReport {
            identity: self.identity().to_string(),
            counts,
            members,
        })
    }

    /// Collective-wide aggregate counts
    pub fn stats(&self) -> Result<CollectiveStats> {
        Ok(self.store.collective_stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::SqliteStore;
    use tempfile::TempDir;

    fn create_test_mailbox(identity: &str) -> (Mailbox, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(temp_dir.path().join("mail.db")).unwrap();
        let directory = Directory::new(
            ["edgar-dev", "skynet-prod", "hal-db", "coder"],
            identity,
        );
        (Mailbox::new(directory, Box::new(store)), temp_dir)
    }

    #[test]
    fn test_send_rejects_unknown_recipient() {
        let (mailbox, _dir) = create_test_mailbox("coder");
        let err = mailbox
            .send("not-a-member", "subj", "body", Priority::Normal)
            .unwrap_err();
        assert!(matches!(err, MailboxError::UnknownRecipient { .. }));

        // Nothing persisted
        assert_eq!(mailbox.stats().unwrap().total, 0);
    }

    #[test]
    fn test_send_rejects_empty_subject() {
        let (mailbox, _dir) = create_test_mailbox("coder");
        let err = mailbox.send("hal-db", "   ", "body", Priority::Normal).unwrap_err();
        assert!(matches!(err, MailboxError::EmptySubject));
        assert_eq!(mailbox.stats().unwrap().total, 0);
    }

    #[test]
    fn test_send_canonicalizes_recipient() {
        let (mailbox, _dir) = create_test_mailbox("coder");
        let receipt = mailbox
            .send("hal-db.justsparx.local", "subj", "", Priority::Normal)
            .unwrap();
        assert_eq!(receipt.to, "hal-db");
    }

    #[test]
    fn test_read_marks_and_is_idempotent() {
        let (sender, dir) = create_test_mailbox("coder");
        sender.send("hal-db", "subj", "body", Priority::Urgent).unwrap();

        // Same database, hal-db's point of view
        let store = SqliteStore::open(dir.path().join("mail.db")).unwrap();
        let directory = Directory::new(["edgar-dev", "hal-db", "coder"], "hal-db");
        let reader = Mailbox::new(directory, Box::new(store));

        let summaries = reader.unread().unwrap();
        assert_eq!(summaries.len(), 1);
        let prefix = summaries[0].id.short();

        let first = reader.read(&prefix).unwrap();
        assert_eq!(first.subject, "subj");
        assert_eq!(first.body, "body");
        assert_eq!(first.priority, Priority::Urgent);
        assert_eq!(first.from, "coder");
        assert!(first.read);
        let stamped = first.read_at.unwrap();

        let second = reader.read(&prefix).unwrap();
        assert_eq!(second.read_at, Some(stamped));

        // Browsing unread never marks anything
        assert!(reader.unread().unwrap().is_empty());
    }

    #[test]
    fn test_read_unknown_prefix() {
        let (mailbox, _dir) = create_test_mailbox("coder");
        let err = mailbox.read("ffffffff").unwrap_err();
        assert!(matches!(err, MailboxError::MessageNotFound(_)));
    }

    #[test]
    fn test_list_canonicalizes_sender_filter() {
        let (sender, dir) = create_test_mailbox("coder");
        sender.send("hal-db", "subj", "", Priority::Normal).unwrap();

        let store = SqliteStore::open(dir.path().join("mail.db")).unwrap();
        let directory = Directory::new(["hal-db", "coder"], "hal-db");
        let reader = Mailbox::new(directory, Box::new(store));

        let filter = ListFilter {
            unread_only: false,
            from_sender: Some("coder.justsparx.local".to_string()),
        };
        assert_eq!(reader.list(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_status_reports_roster() {
        let (mailbox, _dir) = create_test_mailbox("coder");
        let status = mailbox.status().unwrap();
        assert_eq!(status.identity, "coder");
        assert_eq!(status.members.len(), 4);
        // SQLite backend has no per-member provisioning
        assert!(status.members.iter().all(|m| m.provisioned.is_none()));
    }
}
