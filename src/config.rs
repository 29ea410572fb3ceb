//! Working persona configuration record and the LLM configuration sentinel.
//!
//! `PersonaConfig` is the mutable record a builder accumulates into; it is
//! resolved, validated, and then consumed by agent construction. Open-ended
//! payloads (`llm_config` settings, `metadata`, pass-through options) are
//! kept as `serde_json::Map<String, Value>` so callers can store arbitrary
//! structured data without this crate interpreting it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PersonaError;

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// LLM configuration for an agent: either a settings mapping or the
/// explicit `false` sentinel that disables model usage entirely.
///
/// Serializes to `false` when disabled and to the settings mapping
/// otherwise, so persona documents and `to_dict` output keep the wire shape
/// `mapping | false`.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmConfig {
    /// Model usage is explicitly disabled.
    Disabled,
    /// Provider settings forwarded verbatim to the external agent.
    Settings(Map<String, Value>),
}

impl LlmConfig {
    /// Build from an untyped value: `false` means disabled, a mapping means
    /// settings, anything else is a shape error.
    pub fn from_value(value: &Value) -> Result<Self, PersonaError> {
        match value {
            Value::Bool(false) => Ok(LlmConfig::Disabled),
            Value::Object(settings) => Ok(LlmConfig::Settings(settings.clone())),
            other => Err(PersonaError::InvalidShape {
                message: format!(
                    "LLM config must be a mapping or false, got {}",
                    json_type_name(other)
                ),
            }),
        }
    }

    /// Untyped wire representation: `false` or the settings mapping.
    pub fn to_value(&self) -> Value {
        match self {
            LlmConfig::Disabled => Value::Bool(false),
            LlmConfig::Settings(settings) => Value::Object(settings.clone()),
        }
    }

    /// Whether model usage is explicitly disabled.
    pub fn is_disabled(&self) -> bool {
        matches!(self, LlmConfig::Disabled)
    }

    /// The settings mapping, when not disabled.
    pub fn settings(&self) -> Option<&Map<String, Value>> {
        match self {
            LlmConfig::Disabled => None,
            LlmConfig::Settings(settings) => Some(settings),
        }
    }
}

impl Serialize for LlmConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LlmConfig::Disabled => serializer.serialize_bool(false),
            LlmConfig::Settings(settings) => settings.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LlmConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        LlmConfig::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// PersonaConfig
// ---------------------------------------------------------------------------

/// The working persona configuration a builder accumulates before
/// finalization.
///
/// `name`, `role`, and `goal` stay optional until validation; everything
/// else carries a usable default so sources can be merged in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Unique agent identifier; resolved through the name priority chain.
    pub name: Option<String>,
    /// Role or title description.
    pub role: Option<String>,
    /// Objective statement.
    pub goal: Option<String>,
    /// Free-form prose context.
    pub backstory: String,
    /// Ordered behavioral rules.
    pub constraints: Vec<String>,
    /// Short text for external speaker selection.
    pub description: Option<String>,
    /// LLM configuration, absent until supplied.
    pub llm_config: Option<LlmConfig>,
    /// Free-form version tag.
    pub version: Option<String>,
    /// Extensible user-defined data, shallow-merged on every update.
    pub metadata: Map<String, Value>,
    /// Opaque keyword options forwarded to the external agent constructor.
    pub options: Map<String, Value>,
    /// Supplementary text appended to the rendered system message.
    pub additional_instructions: Option<String>,
}

// ---------------------------------------------------------------------------
// Untyped-value helpers
// ---------------------------------------------------------------------------

/// Coerce a scalar JSON value to a string; `None` for null and structured
/// values.
pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Human-readable JSON type name for shape-error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
