//! Whole-configuration validation before agent construction.
//!
//! Every rule is evaluated independently and all violations are collected
//! into one aggregated error, so a single failed build reveals every
//! problem at once.

use crate::config::{LlmConfig, PersonaConfig};
use crate::error::PersonaError;

/// Placeholder used in reports when the name itself is missing.
const UNNAMED: &str = "unknown";

/// Validate a working configuration for completeness.
///
/// Rules, in report order: name non-empty, role non-empty, goal non-empty,
/// and `llm_config` settings must contain `model` or `config_list`. The
/// explicit-disable sentinel passes unconditionally.
pub fn validate(config: &PersonaConfig) -> Result<(), PersonaError> {
    let name = config
        .name
        .as_deref()
        .filter(|name| !name.is_empty());
    let display_name = name.unwrap_or(UNNAMED);

    let mut errors = Vec::new();

    if name.is_none() {
        errors.push("Persona name is required".to_string());
    }
    if config.role.as_deref().is_none_or(str::is_empty) {
        errors.push(format!("Role is required for persona '{display_name}'"));
    }
    if config.goal.as_deref().is_none_or(str::is_empty) {
        errors.push(format!("Goal is required for persona '{display_name}'"));
    }
    if let Some(LlmConfig::Settings(settings)) = &config.llm_config {
        if !settings.contains_key("model") && !settings.contains_key("config_list") {
            errors.push(format!(
                "LLM config must contain 'config_list' or 'model' for persona '{display_name}'"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PersonaError::Validation {
            name: display_name.to_string(),
            errors,
        })
    }
}
