//! LabMail - Interoffice messaging for the AI collective
//!
//! Main entry point for the LabMail CLI.

use clap::Parser;
use labmail::commands::{Cli, Commands};
use labmail::config::{Backend, LabMailConfig};
use labmail::mail::{
    CollectiveStats, Directory, FilesystemStore, ListFilter, Mailbox, Message, MessageStore,
    MessageSummary, Priority, SqliteStore, StatusReport,
};
use std::process;

fn main() {
    if let Err(e) = labmail::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> labmail::Result<()> {
    let mut config = if let Some(path) = &cli.config {
        LabMailConfig::load(path)?
    } else {
        LabMailConfig::load_or_default()?
    };
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }

    let directory = match &config.identity {
        Some(identity) => Directory::new(config.collective.clone(), identity),
        None => Directory::from_hostname(config.collective.clone())?,
    };

    tracing::info!(
        identity = %directory.self_identity(),
        backend = ?config.backend,
        "LabMail starting"
    );

    let store: Box<dyn MessageStore> = match config.backend {
        Backend::Files => Box::new(FilesystemStore::open(
            &config.mail_dir,
            directory.members(),
        )?),
        Backend::Sqlite => Box::new(SqliteStore::open(&config.database)?),
    };
    let mailbox = Mailbox::new(directory, store);

    match cli.command {
        Commands::Send {
            recipient,
            subject,
            body,
            priority,
        } => {
            let receipt = mailbox.send(&recipient, &subject, &body, priority.into())?;
            println!(
                "{} Message sent to {}",
                priority_emoji(receipt.priority),
                receipt.to
            );
            println!("   Subject: {}", receipt.subject);
            println!("   ID: {}...", receipt.id.short());
        }

        Commands::List {
            unread,
            from_sender,
        } => {
            let filter = ListFilter {
                unread_only: unread,
                from_sender,
            };
            let messages = mailbox.list(&filter)?;
            render_listing(&messages, &filter);
        }

        Commands::Read { message_id, .. } => match message_id {
            Some(prefix) => {
                let message = mailbox.read(&prefix)?;
                render_message(&message);
            }
            None => {
                let filter = ListFilter::unread();
                let messages = mailbox.unread()?;
                render_listing(&messages, &filter);
            }
        },

        Commands::Status => {
            let status = mailbox.status()?;
            render_status(&status, &config);
        }

        Commands::Stats => {
            let stats = mailbox.stats()?;
            render_stats(&stats);
        }
    }

    Ok(())
}

fn priority_emoji(priority: Priority) -> &'static str {
    match priority {
        Priority::Normal => "📧",
        Priority::High => "⚡",
        Priority::Urgent => "🚨",
    }
}

/// Priority marker for listings; normal carries no marker
fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Normal => "",
        Priority::High => "⚡ ",
        Priority::Urgent => "🚨 ",
    }
}

fn render_listing(messages: &[MessageSummary], filter: &ListFilter) {
    if messages.is_empty() {
        // "No messages" vs "No unread messages from coder"
        match filter.describe() {
            Some(desc) => println!("📬 No {} messages", desc),
            None => println!("📬 No messages"),
        }
        return;
    }

    println!("📬 {} message(s) in inbox:", messages.len());
    println!();
    for msg in messages {
        let status = if msg.read { "📭" } else { "📬" };
        println!(
            "{} {}[{}] From: {}",
            status,
            priority_marker(msg.priority),
            msg.id.short(),
            msg.from
        );
        println!("    📅 {}", msg.created_at.format("%Y-%m-%d %H:%M"));
        println!("    📋 {}", msg.subject);
        println!();
    }
}

fn render_message(message: &Message) {
    println!("{} Message Details", priority_emoji(message.priority));
    println!("{}", "=".repeat(50));
    println!("📨 From: {}", message.from);
    println!("📅 Date: {}", message.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("🆔 ID: {}", message.id);
    println!("📋 Subject: {}", message.subject);
    println!();
    println!("📝 Message:");
    println!("{}", "-".repeat(30));
    if message.body.is_empty() {
        println!("No content");
    } else {
        println!("{}", message.body);
    }
    println!("{}", "-".repeat(30));
    println!();
}

fn render_status(status: &StatusReport, config: &LabMailConfig) {
    println!("🤖 LabMail Status - {}", status.identity);
    println!("{}", "=".repeat(40));
    println!("📬 Total messages: {}", status.counts.total);
    println!("📭 Unread messages: {}", status.counts.unread);
    match config.backend {
        Backend::Files => println!("📁 Mail directory: {}", config.mail_dir.display()),
        Backend::Sqlite => println!("🗄️ Database: {}", config.database.display()),
    }
    println!();
    println!("🤖 AI Collective Members:");
    for member in &status.members {
        let marker = match member.provisioned {
            Some(true) => "✅",
            Some(false) => "📋",
            None => "🤖",
        };
        println!("   {} {}", marker, member.name);
    }
}

fn render_stats(stats: &CollectiveStats) {
    println!("📊 LabMail System Statistics");
    println!("{}", "=".repeat(40));
    println!("📧 Total messages in system: {}", stats.total);

    println!();
    println!("📤 Messages sent by system:");
    for (name, count) in &stats.sent_by {
        println!("   🤖 {}: {} messages", name, count);
    }

    println!();
    println!("📥 Messages received by system:");
    for (name, count) in &stats.received_by {
        println!("   🤖 {}: {} messages", name, count);
    }

    println!();
    if stats.unread_by_recipient.is_empty() {
        println!("✅ All messages read across the AI collective!");
    } else {
        println!("📭 Unread messages by system:");
        for (name, count) in &stats.unread_by_recipient {
            println!("   📬 {}: {} unread", name, count);
        }
    }
}
