//! SQLite message store
//!
//! One unified `messages` table serves every view: the inbox is a query on
//! `to_system`, the sent view a query on `from_system`, so no sent mirror
//! is kept. Read-state transitions use a conditional UPDATE, which gives
//! first-write-wins on `read_at` under concurrent readers.

use super::store::{sort_breakdown, CollectiveStats, ListFilter, MailboxCounts, Result, StoreError};
use super::{Message, MessageId, MessageSummary, MessageStore, Priority};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// SQLite-backed message store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the message database
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Opening message database");

        let conn = Connection::open(&path)
            .map_err(|e| StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e)))?;

        // WAL mode for concurrent senders and readers; bounded wait on a
        // locked database rather than an immediate failure or a hang
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let store = Self {
            conn: Mutex::new(conn),
            path,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// The database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                from_system TEXT NOT NULL,
                to_system TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT 'normal',
                created_at TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                read_at TEXT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_to_system
                ON messages(to_system, is_read, created_at DESC);

            CREATE INDEX IF NOT EXISTS idx_messages_from_system
                ON messages(from_system, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("store connection poisoned".to_string()))
    }
}

/// Fixed-width timestamp form; sorts correctly as text
fn timestamp_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_from_sql(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn id_from_sql(s: &str) -> rusqlite::Result<MessageId> {
    Uuid::parse_str(s)
        .map(MessageId::from_uuid)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let read_at: Option<String> = row.get(8)?;
    Ok(Message {
        id: id_from_sql(&row.get::<_, String>(0)?)?,
        from: row.get(1)?,
        to: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        priority: Priority::from_str_lenient(&row.get::<_, String>(5)?),
        created_at: timestamp_from_sql(&row.get::<_, String>(6)?)?,
        read: row.get::<_, i64>(7)? != 0,
        read_at: read_at.as_deref().map(timestamp_from_sql).transpose()?,
    })
}

const MESSAGE_COLUMNS: &str =
    "id, from_system, to_system, subject, body, priority, created_at, is_read, read_at";

impl MessageStore for SqliteStore {
    fn append(&self, message: &Message) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO messages
                (id, from_system, to_system, subject, body, priority, created_at, is_read, read_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                message.id.to_text(),
                &message.from,
                &message.to,
                &message.subject,
                &message.body,
                message.priority.as_str(),
                timestamp_to_sql(message.created_at),
                message.read as i64,
                message.read_at.map(timestamp_to_sql),
            ],
        )?;
        Ok(())
    }

    fn list(&self, recipient: &str, filter: &ListFilter) -> Result<Vec<MessageSummary>> {
        let conn = self.lock()?;

        let mut query = format!(
            "SELECT {} FROM messages WHERE to_system = ?1",
            MESSAGE_COLUMNS
        );
        let mut sql_params: Vec<&dyn rusqlite::ToSql> = vec![&recipient];
        if filter.unread_only {
            query.push_str(" AND is_read = 0");
        }
        if let Some(sender) = &filter.from_sender {
            query.push_str(" AND from_system = ?2");
            sql_params.push(sender);
        }
        query.push_str(" ORDER BY created_at DESC, rowid DESC");

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(sql_params.as_slice(), row_to_message)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?.summary());
        }
        Ok(summaries)
    }

    fn find_by_prefix(&self, recipient: &str, prefix: &str) -> Result<Option<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM messages
            WHERE to_system = ?1 AND id LIKE ?2
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
            MESSAGE_COLUMNS
        ))?;

        let mut rows = stmt.query_map(params![recipient, format!("{}%", prefix)], row_to_message)?;
        rows.next().transpose().map_err(StoreError::from)
    }

    fn mark_read(&self, id: &MessageId) -> Result<()> {
        let conn = self.lock()?;
        // Conditional on is_read so a racing second reader is a no-op and
        // the first reader's read_at survives.
        conn.execute(
            "UPDATE messages SET is_read = 1, read_at = ?1 WHERE id = ?2 AND is_read = 0",
            params![timestamp_to_sql(Utc::now()), id.to_text()],
        )?;
        Ok(())
    }

    fn counts(&self, recipient: &str) -> Result<MailboxCounts> {
        let conn = self.lock()?;
        let (total, unread) = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_read = 0)
            FROM messages
            WHERE to_system = ?1
            "#,
            params![recipient],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(MailboxCounts {
            total: total as u64,
            unread: unread as u64,
        })
    }

    fn collective_stats(&self) -> Result<CollectiveStats> {
        let conn = self.lock()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;

        let breakdown = |query: &str| -> Result<Vec<(String, u64)>> {
            let mut stmt = conn.prepare(query)?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            sort_breakdown(&mut out);
            Ok(out)
        };

        Ok(CollectiveStats {
            total: total as u64,
            sent_by: breakdown(
                "SELECT from_system, COUNT(*) FROM messages GROUP BY from_system",
            )?,
            received_by: breakdown(
                "SELECT to_system, COUNT(*) FROM messages GROUP BY to_system",
            )?,
            unread_by_recipient: breakdown(
                "SELECT to_system, COUNT(*) FROM messages WHERE is_read = 0 GROUP BY to_system",
            )?,
        })
    }
}
