//! Message store abstraction
//!
//! Defines the trait for pluggable persistence backends. The mailbox
//! service talks only to this contract, so the flat-file and relational
//! strategies stay interchangeable.

use super::{Message, MessageId, MessageSummary};
use thiserror::Error;

/// Store errors
///
/// Backend-specific failures (filesystem permissions, database
/// connectivity) all surface as `Unavailable` so callers can treat every
/// backend identically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Inbox listing filters; both are ANDed when present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only unread messages
    pub unread_only: bool,

    /// Only messages from this canonical sender
    pub from_sender: Option<String>,
}

impl ListFilter {
    /// Filter that keeps every message
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter that keeps only unread messages
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            from_sender: None,
        }
    }

    /// True when no filter is active
    pub fn is_empty(&self) -> bool {
        !self.unread_only && self.from_sender.is_none()
    }

    /// Human description of the active filters, e.g. `"unread from coder"`,
    /// or `None` when unfiltered. Lets a renderer distinguish an empty
    /// mailbox from an empty filtered view.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.unread_only {
            parts.push("unread".to_string());
        }
        if let Some(sender) = &self.from_sender {
            parts.push(format!("from {}", sender));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Whether a message passes this filter
    pub fn matches(&self, read: bool, from: &str) -> bool {
        if self.unread_only && read {
            return false;
        }
        if let Some(sender) = &self.from_sender {
            if from != sender {
                return false;
            }
        }
        true
    }
}

/// Per-mailbox message counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxCounts {
    pub total: u64,
    pub unread: u64,
}

/// Collective-wide aggregate counts
///
/// Breakdowns are sorted by count descending, then by name for a stable
/// order. Recipients with zero unread messages are omitted from
/// `unread_by_recipient`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectiveStats {
    /// Total messages in the system
    pub total: u64,

    /// Messages sent, per canonical sender
    pub sent_by: Vec<(String, u64)>,

    /// Messages received, per canonical recipient
    pub received_by: Vec<(String, u64)>,

    /// Unread messages, per canonical recipient
    pub unread_by_recipient: Vec<(String, u64)>,
}

/// Trait for message persistence backends
pub trait MessageStore: Send + Sync {
    /// Durably persist a fully-populated message
    ///
    /// Atomic from the caller's point of view: the message becomes visible
    /// to subsequent queries in full, or not at all.
    fn append(&self, message: &Message) -> Result<()>;

    /// List a recipient's inbox, newest first
    fn list(&self, recipient: &str, filter: &ListFilter) -> Result<Vec<MessageSummary>>;

    /// Resolve an id prefix within a recipient's inbox
    ///
    /// When several messages share the prefix, the most recently created
    /// one wins. Returns `None` on no match.
    fn find_by_prefix(&self, recipient: &str, prefix: &str) -> Result<Option<Message>>;

    /// Mark a message read and stamp `read_at`, only if currently unread
    ///
    /// Repeated calls (and calls for unknown ids) are no-op successes; an
    /// already-set `read_at` is never overwritten.
    fn mark_read(&self, id: &MessageId) -> Result<()>;

    /// Total and unread counts for a recipient's inbox
    fn counts(&self, recipient: &str) -> Result<MailboxCounts>;

    /// Aggregate counts across the whole collective
    fn collective_stats(&self) -> Result<CollectiveStats>;

    /// Whether a member's inbox is provisioned, for backends where that
    /// is observable (`None` where the concept does not apply)
    fn inbox_provisioned(&self, _name: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

/// Sort an aggregate breakdown by count descending, then name
pub(crate) fn sort_breakdown(breakdown: &mut Vec<(String, u64)>) {
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}
