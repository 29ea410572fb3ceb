//! Error types for persona parsing, validation, and construction.
//!
//! Aggregated reports (missing document fields, validation failures) carry
//! their individual rule messages and render as a single multi-line report
//! through `Display`, one `  - message` line per violated rule.

use thiserror::Error;

/// Errors raised while parsing persona sources, validating configurations,
/// or mutating constructed agents.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// The YAML front-matter block is malformed or not a mapping.
    #[error("Error parsing frontmatter: {message}")]
    Frontmatter { message: String },

    /// A YAML persona document could not be parsed.
    #[error("Error loading YAML from {path}: {message}")]
    Yaml { path: String, message: String },

    /// A YAML persona document parsed to nothing.
    #[error("YAML file {path} is empty or contains no valid data")]
    EmptyDocument { path: String },

    /// A persona document path does not exist.
    #[error("Persona file not found: {path}")]
    FileNotFound { path: String },

    /// Required fields missing from a persona document, collected into a
    /// single report.
    #[error("Required fields missing for persona '{name}':\n{}", bulleted(.errors))]
    MissingFields { name: String, errors: Vec<String> },

    /// One or more configuration rules violated at build time, collected
    /// into a single report.
    #[error("Persona validation failed for '{name}':\n{}", bulleted(.errors))]
    Validation { name: String, errors: Vec<String> },

    /// Attempt to rename a constructed persona agent.
    #[error("Persona name is immutable once the agent is constructed: '{name}'")]
    ImmutableName { name: String },

    /// Wrong shape supplied for `constraints`, `metadata`, or `llm_config`.
    #[error("{message}")]
    InvalidShape { message: String },

    /// A document source could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn bulleted(errors: &[String]) -> String {
    errors
        .iter()
        .map(|error| format!("  - {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}
