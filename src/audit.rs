//! JSONL audit logging
//!
//! Appends one line per evaluated command so decisions can be reviewed later.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::summarize;
use crate::output::{Verdict, VerdictAction};
use crate::rules::Severity;

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Allowed,
    Warned,
    Blocked,
    Disabled,
}

impl From<VerdictAction> for LogLevel {
    fn from(action: VerdictAction) -> Self {
        match action {
            VerdictAction::Allow => LogLevel::Allowed,
            VerdictAction::Warn => LogLevel::Warned,
            VerdictAction::Block => LogLevel::Blocked,
        }
    }
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Command, truncated
    pub input_summary: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Caller-supplied context label
    pub context: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuditEntry {
    /// Entry for a verdict on `command`
    pub fn new(command: &str, verdict: &Verdict, context: &str, session_id: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: verdict.action.into(),
            pattern_id: verdict.pattern_id.clone(),
            severity: verdict.severity,
            input_summary: summarize(command),
            message: verdict.message.clone(),
            context: context.to_string(),
            session_id: session_id.map(String::from),
        }
    }

    /// Entry for a command let through because the guard is disabled
    pub fn disabled(command: &str, context: &str, session_id: Option<&str>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Disabled,
            pattern_id: None,
            severity: None,
            input_summary: summarize(command),
            message: Some("DCG_DISABLED".to_string()),
            context: context.to_string(),
            session_id: session_id.map(String::from),
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Open `path` for appending; a logger that cannot open its file is
    /// disabled.
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(err) => {
                    tracing::warn!(path = %p.display(), error = %err, "cannot open audit log");
                    None
                }
            }
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
