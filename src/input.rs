//! Hook input parsing
//!
//! Parses the PreToolUse JSON an agent runtime writes to the hook's stdin.
//! Only shell commands are evaluated; every other tool passes through.

use serde::Deserialize;

/// Maximum characters kept by [`summarize`].
pub const SUMMARY_CHARS: usize = 100;

/// Main input structure from PreToolUse hooks
#[derive(Debug, Deserialize)]
pub struct HookInput {
    /// Name of the tool being invoked (e.g., "Bash", "Read")
    pub tool_name: String,

    pub tool_input: ToolInput,

    #[serde(default)]
    pub session_id: Option<String>,

    /// Hook event name (e.g., "PreToolUse")
    #[serde(default)]
    pub hook_event_name: Option<String>,

    /// Working directory of the agent; used as the project root when none
    /// is configured
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Tool-specific input
#[derive(Debug, Clone)]
pub enum ToolInput {
    /// Shell command execution
    Bash {
        command: String,
        description: Option<String>,
    },

    /// Any other tool, kept as raw JSON
    Other { raw: serde_json::Value },
}

impl<'de> Deserialize<'de> for ToolInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        if let Some(command) = value.get("command").and_then(|v| v.as_str()) {
            return Ok(ToolInput::Bash {
                command: command.to_string(),
                description: value
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            });
        }

        Ok(ToolInput::Other { raw: value })
    }
}

impl HookInput {
    /// Parse input from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The shell command, when this is a Bash call.
    pub fn command(&self) -> Option<&str> {
        match &self.tool_input {
            ToolInput::Bash { command, .. } if self.tool_name == "Bash" => Some(command),
            _ => None,
        }
    }

    /// Short description of the input for logging
    pub fn summary(&self) -> String {
        match self.command() {
            Some(command) => summarize(command),
            None => format!("{}: (not evaluated)", self.tool_name),
        }
    }
}

/// First [`SUMMARY_CHARS`] characters of `text`, with `...` when cut.
pub fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
