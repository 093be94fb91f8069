//! Verdicts and hook responses
//!
//! [`Verdict`] is the guard's result and serializes as
//! `{action, pattern_id, severity, message}`. [`HookOutput`] turns a verdict
//! into the JSON a PreToolUse hook prints on stdout.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::decision::Match;
use crate::rules::{Action, Severity};

/// Final decision for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictAction {
    Allow,
    Warn,
    Block,
}

impl VerdictAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictAction::Allow => "ALLOW",
            VerdictAction::Warn => "WARN",
            VerdictAction::Block => "BLOCK",
        }
    }
}

impl From<Action> for VerdictAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Block => VerdictAction::Block,
            Action::Warn => VerdictAction::Warn,
        }
    }
}

impl fmt::Display for VerdictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub action: VerdictAction,

    /// Id of the winning pattern; `None` for ALLOW
    pub pattern_id: Option<String>,

    pub severity: Option<Severity>,

    pub message: Option<String>,

    /// Offset of the unit the winning pattern matched in, for diagnostics
    #[serde(skip)]
    pub segment_offset: Option<usize>,
}

impl Verdict {
    /// No pattern matched
    pub fn allow() -> Self {
        Self {
            action: VerdictAction::Allow,
            pattern_id: None,
            severity: None,
            message: None,
            segment_offset: None,
        }
    }

    /// Verdict carried by the winning match
    pub fn from_match(winner: &Match) -> Self {
        Self {
            action: winner.action.into(),
            pattern_id: Some(winner.pattern_id.clone()),
            severity: Some(winner.severity),
            message: Some(winner.message.clone()),
            segment_offset: Some(winner.segment_offset),
        }
    }

    pub fn is_allow(&self) -> bool {
        self.action == VerdictAction::Allow
    }

    pub fn is_warn(&self) -> bool {
        self.action == VerdictAction::Warn
    }

    pub fn is_block(&self) -> bool {
        self.action == VerdictAction::Block
    }

    /// BLOCK turned into WARN, for warn-only mode
    pub fn downgraded(mut self) -> Self {
        if self.action == VerdictAction::Block {
            self.action = VerdictAction::Warn;
        }
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"action":"BLOCK"}"#.to_string())
    }
}

/// Main output structure for PreToolUse hooks
#[derive(Debug, Serialize)]
pub struct HookOutput {
    /// Hook-specific output containing the permission decision
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,

    /// Optional system message to show the user
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Hook-specific output with permission decision
#[derive(Debug, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,

    /// "allow" or "deny"
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,

    #[serde(rename = "permissionDecisionReason", skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

impl HookOutput {
    /// Create an allow response (empty output = allow)
    pub fn allow() -> Self {
        HookOutput {
            hook_specific_output: None,
            system_message: None,
        }
    }

    /// Deny with a tag such as a pattern id
    pub fn deny(tag: &str, reason: &str) -> Self {
        let message = format!("[dcg:{}] Blocked: {}", tag, reason);
        HookOutput {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: "deny".to_string(),
                permission_decision_reason: Some(message.clone()),
            }),
            system_message: Some(message),
        }
    }

    /// Allow, but show a warning
    pub fn warn(tag: &str, message: &str) -> Self {
        HookOutput {
            hook_specific_output: None,
            system_message: Some(format!("[dcg:{}] Warning: {}", tag, message)),
        }
    }

    /// Create output from a Verdict
    pub fn from_verdict(verdict: &Verdict) -> Self {
        let tag = verdict.pattern_id.as_deref().unwrap_or("unknown");
        let message = match (&verdict.message, verdict.severity) {
            (Some(msg), Some(sev)) => format!("{} ({})", msg, sev),
            (Some(msg), None) => msg.clone(),
            (None, _) => "matched a destructive pattern".to_string(),
        };

        match verdict.action {
            VerdictAction::Allow => HookOutput::allow(),
            VerdictAction::Block => HookOutput::deny(tag, &message),
            VerdictAction::Warn => HookOutput::warn(tag, &message),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
