//! Structured logging module for the companion
//!
//! Writes daily log files into the configured log directory with categories:
//! - COMMAND: OS action outcomes
//! - ROUTING: command-vs-chat and handler decisions
//! - CHAT: response generation, backend failures, fallbacks
//! - CONVERSATION: conversation and profile lifecycle
//! - ERROR: errors that were recovered or surfaced to the host

use chrono::{Local, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Command,
    Routing,
    Chat,
    Conversation,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Command => "COMMAND",
            LogCategory::Routing => "ROUTING",
            LogCategory::Chat => "CHAT",
            LogCategory::Conversation => "CONVERSATION",
            LogCategory::Error => "ERROR",
        }
    }
}

struct LogTarget {
    dir: PathBuf,
    echo: bool,
}

/// Process-wide log target. `None` until `init_logging` runs; events logged
/// before that (or in tests) are dropped.
static LOG_TARGET: Lazy<Mutex<Option<LogTarget>>> = Lazy::new(|| Mutex::new(None));

const LOG_FILE_PREFIX: &str = "companion-";
const LOG_FILE_SUFFIX: &str = ".log";

fn log_file_path(dir: &Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("{}{}{}", LOG_FILE_PREFIX, today, LOG_FILE_SUFFIX))
}

/// Initialize the logging system - creates the log directory if needed
pub fn init_logging(log_dir: &Path, echo: bool) -> std::io::Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    if let Ok(mut target) = LOG_TARGET.lock() {
        *target = Some(LogTarget {
            dir: log_dir.to_path_buf(),
            echo,
        });
    }

    log(LogCategory::Conversation, None, "Companion logging initialized");
    Ok(())
}

fn format_line(category: LogCategory, conversation_id: Option<&str>, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let conv_context = conversation_id
        .map(|id| {
            let short: String = id.chars().take(8).collect();
            format!("conversation={} | ", short)
        })
        .unwrap_or_default();

    format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        conv_context,
        message
    )
}

/// Log a message with category and optional conversation context
pub fn log(category: LogCategory, conversation_id: Option<&str>, message: &str) {
    let Ok(guard) = LOG_TARGET.lock() else {
        return;
    };
    let Some(target) = guard.as_ref() else {
        return;
    };

    let log_line = format_line(category, conversation_id, message);

    if target.echo {
        eprint!("{}", log_line);
    }

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(&target.dir))
    {
        let _ = file.write_all(log_line.as_bytes());
    }
}

pub fn log_command(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Command, conversation_id, message);
}

pub fn log_routing(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Routing, conversation_id, message);
}

pub fn log_chat(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Chat, conversation_id, message);
}

pub fn log_conversation(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Conversation, conversation_id, message);
}

pub fn log_error(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Error, conversation_id, message);
}

// The log dir is user-configurable and may hold other files.
fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
        .unwrap_or(false)
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs(log_dir: &Path) -> std::io::Result<usize> {
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_log_file(&path) {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}
