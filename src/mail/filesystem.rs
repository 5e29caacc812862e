//! Flat-file message store
//!
//! Stores one JSON file per message under the mail root:
//!
//! ```text
//! <mail_root>/
//!   inbox/
//!     edgar-dev/
//!       <message-id>.json
//!     hal-db/
//!       <message-id>.json
//!   sent/
//!     edgar-dev/
//!       <message-id>.json
//! ```
//!
//! The inbox copy is canonical: read-state transitions happen there and
//! only there. The sent copy is an informational mirror for the sender and
//! is never mutated after the send.
//!
//! Writes go through a temp file in the destination directory followed by
//! a rename, so a concurrent reader never observes a partial record. The
//! filename is derived from the message id, so concurrent sends can never
//! target the same file.

use super::store::{sort_breakdown, CollectiveStats, ListFilter, MailboxCounts, Result, StoreError};
use super::{Message, MessageId, MessageSummary, MessageStore};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem-backed message store
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Open a store rooted at `base_path`, provisioning inbox directories
    /// for every roster member
    ///
    /// Provisioning is idempotent; an already-initialized mail root is
    /// left untouched.
    pub fn open(base_path: impl Into<PathBuf>, members: &[String]) -> Result<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join("inbox"))?;
        fs::create_dir_all(base_path.join("sent"))?;
        for member in members {
            fs::create_dir_all(base_path.join("inbox").join(member))?;
        }

        Ok(Self { base_path })
    }

    /// The mail root directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn inbox_dir(&self, name: &str) -> PathBuf {
        self.base_path.join("inbox").join(name)
    }

    fn sent_dir(&self, name: &str) -> PathBuf {
        self.base_path.join("sent").join(name)
    }

    /// Serialize and atomically write a message record
    fn write_message(&self, dir: &Path, message: &Message) -> Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(message)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(dir.join(format!("{}.json", message.id)))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Message> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load every decodable message in a directory
    ///
    /// Individual undecodable files are skipped with a warning rather than
    /// failing the whole scan, so one corrupt record cannot hide a mailbox.
    fn scan_dir(&self, dir: &Path) -> Result<Vec<Message>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut messages = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.read_record(&path) {
                    Ok(msg) => messages.push(msg),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable message {:?}: {}", path, e);
                    }
                }
            }
        }
        Ok(messages)
    }

    /// Locate the canonical inbox copy of a message
    fn find_inbox_copy(&self, id: &MessageId) -> Result<Option<(PathBuf, Message)>> {
        let filename = format!("{}.json", id);
        for entry in fs::read_dir(self.base_path.join("inbox"))? {
            let path = entry?.path().join(&filename);
            if path.exists() {
                let message = self.read_record(&path)?;
                return Ok(Some((path, message)));
            }
        }
        Ok(None)
    }
}

/// Newest first; full created_at ties break on id so repeated listings of
/// an unmodified inbox always agree
fn newest_first(a: &Message, b: &Message) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.to_text().cmp(&a.id.to_text()))
}

impl MessageStore for FilesystemStore {
    fn append(&self, message: &Message) -> Result<()> {
        // Inbox copy first: it is the canonical record. A failure after
        // this point leaves a deliverable message without a sent mirror,
        // never the reverse.
        self.write_message(&self.inbox_dir(&message.to), message)?;
        self.write_message(&self.sent_dir(&message.from), message)?;
        Ok(())
    }

    fn list(&self, recipient: &str, filter: &ListFilter) -> Result<Vec<MessageSummary>> {
        let mut messages = self.scan_dir(&self.inbox_dir(recipient))?;
        messages.retain(|m| filter.matches(m.read, &m.from));
        messages.sort_by(newest_first);
        Ok(messages.iter().map(Message::summary).collect())
    }

    fn find_by_prefix(&self, recipient: &str, prefix: &str) -> Result<Option<Message>> {
        let mut matches: Vec<Message> = self
            .scan_dir(&self.inbox_dir(recipient))?
            .into_iter()
            .filter(|m| m.id.matches_prefix(prefix))
            .collect();
        matches.sort_by(newest_first);
        Ok(matches.into_iter().next())
    }

    fn mark_read(&self, id: &MessageId) -> Result<()> {
        let Some((path, mut message)) = self.find_inbox_copy(id)? else {
            return Ok(());
        };
        if message.read {
            // First transition won; read_at stays as stamped.
            return Ok(());
        }

        message.read = true;
        message.read_at = Some(Utc::now());
        if let Some(dir) = path.parent() {
            self.write_message(dir, &message)?;
        }
        Ok(())
    }

    fn counts(&self, recipient: &str) -> Result<MailboxCounts> {
        let messages = self.scan_dir(&self.inbox_dir(recipient))?;
        Ok(MailboxCounts {
            total: messages.len() as u64,
            unread: messages.iter().filter(|m| !m.read).count() as u64,
        })
    }

    fn collective_stats(&self) -> Result<CollectiveStats> {
        // Inbox copies only; the sent mirror would double-count.
        let mut total = 0u64;
        let mut sent: HashMap<String, u64> = HashMap::new();
        let mut received: HashMap<String, u64> = HashMap::new();
        let mut unread: HashMap<String, u64> = HashMap::new();

        for entry in fs::read_dir(self.base_path.join("inbox"))? {
            let dir = entry?.path();
            if !dir.is_dir() {
                continue;
            }
            for message in self.scan_dir(&dir)? {
                total += 1;
                *sent.entry(message.from.clone()).or_default() += 1;
                *received.entry(message.to.clone()).or_default() += 1;
                if !message.read {
                    *unread.entry(message.to.clone()).or_default() += 1;
                }
            }
        }

        let mut stats = CollectiveStats {
            total,
            sent_by: sent.into_iter().collect(),
            received_by: received.into_iter().collect(),
            unread_by_recipient: unread.into_iter().collect(),
        };
        sort_breakdown(&mut stats.sent_by);
        sort_breakdown(&mut stats.received_by);
        sort_breakdown(&mut stats.unread_by_recipient);
        Ok(stats)
    }

    fn inbox_provisioned(&self, name: &str) -> Result<Option<bool>> {
        Ok(Some(self.inbox_dir(name).is_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Priority;
    use tempfile::TempDir;

    fn members() -> Vec<String> {
        ["edgar-dev", "skynet-prod", "hal-db", "coder"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn create_test_store() -> (FilesystemStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemStore::open(temp_dir.path().join("mail"), &members()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_open_provisions_inboxes() {
        let (store, _dir) = create_test_store();
        for member in members() {
            assert_eq!(store.inbox_provisioned(&member).unwrap(), Some(true));
        }
        assert_eq!(store.inbox_provisioned("stranger").unwrap(), Some(false));
    }

    #[test]
    fn test_append_writes_both_copies() {
        let (store, _dir) = create_test_store();
        let msg = Message::new("coder", "hal-db", "schema", "see attached", Priority::Normal);
        store.append(&msg).unwrap();

        let inbox_path = store.inbox_dir("hal-db").join(format!("{}.json", msg.id));
        let sent_path = store.sent_dir("coder").join(format!("{}.json", msg.id));
        assert!(inbox_path.exists());
        assert!(sent_path.exists());
    }

    #[test]
    fn test_mark_read_leaves_sent_copy_untouched() {
        let (store, _dir) = create_test_store();
        let msg = Message::new("coder", "hal-db", "schema", "", Priority::Normal);
        store.append(&msg).unwrap();

        store.mark_read(&msg.id).unwrap();

        let inbox_copy = store
            .read_record(&store.inbox_dir("hal-db").join(format!("{}.json", msg.id)))
            .unwrap();
        let sent_copy = store
            .read_record(&store.sent_dir("coder").join(format!("{}.json", msg.id)))
            .unwrap();
        assert!(inbox_copy.read);
        assert!(inbox_copy.read_at.is_some());
        assert!(!sent_copy.read);
        assert!(sent_copy.read_at.is_none());
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let (store, _dir) = create_test_store();
        let msg = Message::new("coder", "hal-db", "schema", "", Priority::Normal);
        store.append(&msg).unwrap();

        store.mark_read(&msg.id).unwrap();
        let first = store
            .find_by_prefix("hal-db", &msg.id.to_text())
            .unwrap()
            .unwrap();

        store.mark_read(&msg.id).unwrap();
        let second = store
            .find_by_prefix("hal-db", &msg.id.to_text())
            .unwrap()
            .unwrap();

        assert_eq!(first.read_at, second.read_at);
    }

    #[test]
    fn test_mark_read_unknown_id_is_noop() {
        let (store, _dir) = create_test_store();
        store.mark_read(&MessageId::new()).unwrap();
    }

    #[test]
    fn test_corrupt_record_does_not_hide_mailbox() {
        let (store, _dir) = create_test_store();
        let msg = Message::new("coder", "hal-db", "ok", "", Priority::Normal);
        store.append(&msg).unwrap();

        fs::write(store.inbox_dir("hal-db").join("garbage.json"), "{not json").unwrap();

        let listed = store.list("hal-db", &ListFilter::all()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, msg.id);
    }

    #[test]
    fn test_counts() {
        let (store, _dir) = create_test_store();
        for i in 0..3 {
            let msg = Message::new("coder", "hal-db", format!("msg {}", i), "", Priority::Normal);
            store.append(&msg).unwrap();
            if i == 0 {
                store.mark_read(&msg.id).unwrap();
            }
        }

        let counts = store.counts("hal-db").unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.unread, 2);
    }

    #[test]
    fn test_stats_counts_inbox_copies_only() {
        let (store, _dir) = create_test_store();
        store
            .append(&Message::new("coder", "hal-db", "a", "", Priority::Normal))
            .unwrap();
        store
            .append(&Message::new("coder", "edgar-dev", "b", "", Priority::Normal))
            .unwrap();

        let stats = store.collective_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.sent_by, vec![("coder".to_string(), 2)]);
        assert_eq!(stats.unread_by_recipient.len(), 2);
    }
}
