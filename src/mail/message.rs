//! Mailbox message types
//!
//! Defines the message record exchanged between collective members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique message identifier
///
/// A UUID v4 generated at creation time. The textual form (lowercase,
/// hyphenated) doubles as the handle for human-facing prefix lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a fresh message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Full textual form (lowercase hyphenated hex)
    pub fn to_text(&self) -> String {
        self.0.to_string()
    }

    /// Short display prefix (first 8 characters)
    pub fn short(&self) -> String {
        self.to_text().chars().take(8).collect()
    }

    /// Check whether the textual form starts with the given prefix
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.to_text().starts_with(prefix)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Message priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Stable lowercase name, as persisted by both backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse the persisted form; anything unrecognized reads as `Normal`,
    /// matching the lenient treatment of legacy records.
    pub fn from_str_lenient(s: &str) -> Self {
        match s {
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Normal,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mailbox message
///
/// Immutable once created, except for the `read`/`read_at` pair which
/// transitions false→true exactly once on the first successful read.
///
/// Legacy records may lack `priority`, `read`, or `read_at`; those
/// deserialize to their defaults (`normal`, `false`, none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,

    /// Sender's canonical short name
    pub from: String,

    /// Recipient's canonical short name
    pub to: String,

    /// Subject line, never empty
    pub subject: String,

    /// Message body, may be empty
    #[serde(default)]
    pub body: String,

    /// Priority level
    #[serde(default)]
    pub priority: Priority,

    /// When the message was persisted
    pub created_at: DateTime<Utc>,

    /// Whether the recipient has read the message
    #[serde(default)]
    pub read: bool,

    /// When the message was first read, set exactly once
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new unread message stamped with the current time
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: MessageId::new(),
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            priority,
            created_at: Utc::now(),
            read: false,
            read_at: None,
        }
    }

    /// One-line summary of this message for listings
    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            id: self.id,
            from: self.from.clone(),
            subject: self.subject.clone(),
            priority: self.priority,
            created_at: self.created_at,
            read: self.read,
        }
    }
}

/// Listing row: the fields shown when browsing an inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub from: String,
    pub subject: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_uniqueness() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_message_id_prefix() {
        let id = MessageId::new();
        let text = id.to_text();
        assert!(id.matches_prefix(&text[..8]));
        assert!(!id.matches_prefix("zzzzzzzz"));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = Message::new(
            "edgar-dev",
            "skynet-prod",
            "SSL Issue",
            "Please check the certificate configuration",
            Priority::High,
        );

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_legacy_record_defaults() {
        // Records written before read tracking carry only the core fields.
        let json = format!(
            r#"{{"id":"{}","from":"coder","to":"hal-db","subject":"hi","created_at":"2024-05-01T12:00:00Z"}}"#,
            Uuid::new_v4()
        );
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.priority, Priority::Normal);
        assert!(!parsed.read);
        assert!(parsed.read_at.is_none());
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn test_priority_persisted_form() {
        assert_eq!(Priority::Urgent.as_str(), "urgent");
        assert_eq!(Priority::from_str_lenient("high"), Priority::High);
        // Unknown values read as normal
        assert_eq!(Priority::from_str_lenient("critical"), Priority::Normal);
    }

    #[test]
    fn test_summary_carries_listing_fields() {
        let msg = Message::new("coder", "edgar-dev", "ping", "", Priority::Normal);
        let summary = msg.summary();
        assert_eq!(summary.id, msg.id);
        assert_eq!(summary.from, "coder");
        assert!(!summary.read);
    }
}
