//! LabMail - Interoffice Messaging for the AI Collective
//!
//! LabMail is a store-and-forward mailbox for a small, fixed set of named
//! agents to exchange asynchronous, addressed, read-tracked text messages.
//! One store contract backs two interchangeable persistence strategies: a
//! flat-file-per-message layout and a shared SQLite database.
//!
//! # Architecture
//!
//! - **mail**: Core domain (Directory, Message, MessageStore backends, Mailbox)
//! - **config**: Roster, backend selection, and storage paths
//! - **commands**: CLI argument definitions
//! - **error**: Top-level error enum
//! - **logging**: tracing subscriber setup

// Core modules
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod mail;

// Re-exports
pub use error::{LabMailError, Result};
