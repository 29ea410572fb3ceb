//! Markdown persona document parsing.
//!
//! A persona document is YAML front matter (between `---` delimiter lines)
//! followed by a Markdown body. Structured "spec" fields (`name`, `role`,
//! `goal`, `constraints`, `llm_config`, `version`) come only from front
//! matter; prose "character" fields (`backstory`, `description`) come from
//! body sections keyed by their `#`/`##` headings. Keeping the two apart
//! prevents structured data from being buried in prose.
//!
//! Unknown top-level front-matter keys are ignored; custom data reaches the
//! agent only through the `metadata` mapping.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::{json_type_name, value_as_string, LlmConfig};
use crate::error::PersonaError;

/// Level-1 and level-2 Markdown headings start a new body section.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,2}\s+(.+)$").expect("valid regex"));

/// Raw configuration parsed out of one persona document.
#[derive(Debug, Clone, Default)]
pub struct ParsedPersona {
    pub name: Option<String>,
    pub role: Option<String>,
    pub goal: Option<String>,
    pub backstory: String,
    pub constraints: Vec<String>,
    pub llm_config: Option<LlmConfig>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Parse Markdown content into a raw persona configuration.
///
/// Fails with a front-matter error when the YAML block is malformed, with a
/// shape error when `constraints`, `llm_config`, or `metadata` have the
/// wrong type, and with one aggregated missing-fields report when `role`,
/// `goal`, or the `# Backstory` section is absent. A missing `version`
/// defaults to today's date and logs a warning naming the persona.
pub fn parse_persona_markdown(content: &str) -> Result<ParsedPersona, PersonaError> {
    let (front_block, body) = split_front_matter(content);
    let front = match front_block {
        Some(block) => parse_front_matter(&block)?,
        None => Map::new(),
    };
    let sections = parse_sections(&body);

    let mut parsed = ParsedPersona {
        name: scalar_field(&front, "name"),
        role: scalar_field(&front, "role"),
        goal: scalar_field(&front, "goal"),
        backstory: sections.get("backstory").cloned().unwrap_or_default(),
        constraints: constraints_field(&front)?,
        llm_config: llm_config_field(&front)?,
        description: sections
            .get("description")
            .filter(|text| !text.is_empty())
            .cloned()
            .or_else(|| scalar_field(&front, "description")),
        version: scalar_field(&front, "version"),
        metadata: metadata_field(&front)?,
    };

    default_version(&mut parsed);
    check_required_fields(&parsed)?;

    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// Split a document into its front-matter block and body.
///
/// Front matter is present only when the first line is `---` and a later
/// line closes the block; otherwise the whole document is body.
fn split_front_matter(content: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = content.lines().collect();
    if lines.first().map(|line| line.trim()) != Some("---") {
        return (None, content.to_string());
    }

    match lines[1..].iter().position(|line| line.trim() == "---") {
        Some(close) => {
            let block = lines[1..1 + close].join("\n");
            let body = lines[2 + close..].join("\n");
            (Some(block), body)
        }
        None => (None, content.to_string()),
    }
}

fn parse_front_matter(block: &str) -> Result<Map<String, Value>, PersonaError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| PersonaError::Frontmatter {
            message: e.to_string(),
        })?;
    let value = serde_json::to_value(yaml).map_err(|e| PersonaError::Frontmatter {
        message: e.to_string(),
    })?;

    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(PersonaError::Frontmatter {
            message: format!("front matter must be a mapping, got {}", json_type_name(&other)),
        }),
    }
}

// ---------------------------------------------------------------------------
// Body sections
// ---------------------------------------------------------------------------

/// Split the body into sections keyed by the lowercased, underscore-joined
/// heading text. Content before the first heading is dropped.
fn parse_sections(body: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in body.lines() {
        if let Some(caps) = HEADING_RE.captures(line.trim()) {
            if let Some(section) = current.take() {
                if !buffer.is_empty() {
                    sections.insert(section, buffer.join("\n").trim().to_string());
                }
            }
            current = Some(caps[1].to_lowercase().replace(' ', "_"));
            buffer.clear();
        } else if current.is_some() {
            buffer.push(line);
        }
    }
    if let Some(section) = current {
        if !buffer.is_empty() {
            sections.insert(section, buffer.join("\n").trim().to_string());
        }
    }

    sections
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

fn scalar_field(front: &Map<String, Value>, key: &str) -> Option<String> {
    front
        .get(key)
        .and_then(value_as_string)
        .filter(|text| !text.is_empty())
}

fn constraints_field(front: &Map<String, Value>) -> Result<Vec<String>, PersonaError> {
    match front.get("constraints") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                value_as_string(item).ok_or_else(|| PersonaError::InvalidShape {
                    message: "Constraints must be a list of strings".to_string(),
                })
            })
            .collect(),
        Some(other) => Err(PersonaError::InvalidShape {
            message: format!(
                "Constraints in metadata must be a list, got {}",
                json_type_name(other)
            ),
        }),
    }
}

fn llm_config_field(front: &Map<String, Value>) -> Result<Option<LlmConfig>, PersonaError> {
    match front.get("llm_config") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => LlmConfig::from_value(value).map(Some),
    }
}

fn metadata_field(front: &Map<String, Value>) -> Result<Map<String, Value>, PersonaError> {
    match front.get("metadata") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(PersonaError::InvalidShape {
            message: format!("Metadata must be a dictionary, got {}", json_type_name(other)),
        }),
    }
}

/// Default a missing version to today's date and warn.
fn default_version(parsed: &mut ParsedPersona) {
    if parsed.version.is_none() {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let persona = parsed.name.as_deref().unwrap_or("unknown");
        log::warn!(
            "Version key missing for persona '{persona}'. Defaulting to today's date: {today}"
        );
        parsed.version = Some(today);
    }
}

fn check_required_fields(parsed: &ParsedPersona) -> Result<(), PersonaError> {
    let mut errors = Vec::new();

    if parsed.role.is_none() {
        errors.push("'role' is required in frontmatter".to_string());
    }
    if parsed.goal.is_none() {
        errors.push("'goal' is required in frontmatter".to_string());
    }
    if parsed.backstory.is_empty() {
        errors.push("'# Backstory' section is required in markdown content".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PersonaError::MissingFields {
            name: parsed.name.clone().unwrap_or_else(|| "unknown".to_string()),
            errors,
        })
    }
}
