//! Handoff boundary to the external conversation framework.
//!
//! `ConversableAgent` is the record a finalized persona delegates to: the
//! resolved name, the rendered system message, the speaker-selection
//! description, the LLM configuration, and an opaque options mapping. This
//! crate never interprets the options beyond forwarding them; message
//! sending, conversation loops, and human-input prompting belong to the
//! framework on the other side of this boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::LlmConfig;

/// Human input mode forwarded to the external agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HumanInputMode {
    /// Never prompt for human input.
    Never,
    /// Always prompt for human input.
    Always,
    /// Prompt for human input only on termination.
    Terminate,
}

impl HumanInputMode {
    /// Wire string understood by the external framework.
    pub fn as_str(&self) -> &'static str {
        match self {
            HumanInputMode::Never => "NEVER",
            HumanInputMode::Always => "ALWAYS",
            HumanInputMode::Terminate => "TERMINATE",
        }
    }
}

impl Default for HumanInputMode {
    fn default() -> Self {
        HumanInputMode::Terminate
    }
}

impl fmt::Display for HumanInputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Construction arguments handed to the external base-agent constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversableAgent {
    /// Unique identifier for the agent instance.
    pub id: Uuid,
    /// Agent name, unique within a conversation.
    pub name: String,
    /// Fully rendered system message.
    pub system_message: String,
    /// Short description used for speaker selection.
    pub description: String,
    /// LLM configuration, if any.
    pub llm_config: Option<LlmConfig>,
    /// Pass-through keyword options (human-input mode, auto-reply limits,
    /// termination predicate, ...), forwarded verbatim.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ConversableAgent {
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        description: impl Into<String>,
        llm_config: Option<LlmConfig>,
        options: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            system_message: system_message.into(),
            description: description.into(),
            llm_config,
            options,
        }
    }
}
