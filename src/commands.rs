//! CLI command definitions
//!
//! All CLI structs and subcommand enums are defined here.

use crate::config::Backend;
use crate::mail::Priority;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LabMail - Interoffice messaging for the AI collective
#[derive(Parser, Debug)]
#[command(name = "labmail")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.config/labmail/config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a message to a collective member
    Send {
        /// Recipient name (short or host-qualified)
        recipient: String,

        /// Message subject
        subject: String,

        /// Message body (optional)
        #[arg(default_value = "")]
        body: String,

        /// Message priority
        #[arg(long, value_enum, default_value = "normal")]
        priority: PriorityArg,
    },

    /// List messages in your inbox
    List {
        /// Show only unread messages
        #[arg(long)]
        unread: bool,

        /// Show messages from a specific sender
        #[arg(long = "from")]
        from_sender: Option<String>,
    },

    /// Read a message
    Read {
        /// Message ID or unique prefix (omit to show unread messages)
        message_id: Option<String>,

        /// Show unread messages when no ID is given
        #[arg(long)]
        unread: bool,
    },

    /// Show mailbox status
    Status,

    /// Show system-wide message statistics
    Stats,
}

/// Backend choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Files,
    Sqlite,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Files => Backend::Files,
            BackendArg::Sqlite => Backend::Sqlite,
        }
    }
}

/// Priority choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Normal,
    High,
    Urgent,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::High => Priority::High,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}
