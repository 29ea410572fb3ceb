//! Configuration resolution: name priority, dictionary sources, metadata
//! overlay, and goal extension.
//!
//! These are the merge rules every persona source flows through before
//! validation. Dictionary sources deliberately never apply `llm_config`:
//! model configuration is a runtime concern supplied separately, so
//! serialized personas stay portable across backends.

use serde_json::{Map, Value};

use crate::config::{json_type_name, value_as_string, PersonaConfig};
use crate::error::PersonaError;

/// Name used when no source supplies one.
pub const DEFAULT_PERSONA_NAME: &str = "unnamed_persona";

/// Resolve the final persona name.
///
/// Priority, first non-empty wins:
/// 1. a name already set on the builder before this resolution pass,
/// 2. a name from the parsed/merged configuration,
/// 3. a caller-supplied fallback (e.g. a filename stem),
/// 4. [`DEFAULT_PERSONA_NAME`].
pub fn resolve_name(
    existing: Option<&str>,
    from_config: Option<&str>,
    fallback: Option<&str>,
) -> String {
    [existing, from_config, fallback]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(DEFAULT_PERSONA_NAME)
        .to_string()
}

/// Shallow-merge `overlay` into `target`: top-level keys are overwritten,
/// nested structures are replaced wholesale.
pub fn merge_metadata(target: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        target.insert(key, value);
    }
}

/// Extend a goal with additional requirements.
///
/// An existing goal becomes `"{existing}. Additionally, {addition}"`; with
/// no goal the addition is taken verbatim.
pub fn extend_goal(existing: Option<&str>, addition: &str) -> String {
    match existing {
        Some(goal) if !goal.is_empty() => format!("{goal}. Additionally, {addition}"),
        _ => addition.to_string(),
    }
}

/// Apply a dictionary source to the working configuration.
///
/// Copies `role`, `goal`, `backstory`, `constraints`, and `version`;
/// merges `metadata`; loads `name` only when the configuration has none.
/// `llm_config` is intentionally not read here.
pub fn apply_dict(
    config: &mut PersonaConfig,
    dict: &Map<String, Value>,
) -> Result<(), PersonaError> {
    config.role = dict.get("role").and_then(value_as_string);
    config.goal = dict.get("goal").and_then(value_as_string);
    config.backstory = dict
        .get("backstory")
        .and_then(value_as_string)
        .unwrap_or_default();
    config.constraints = constraints_from_value(dict.get("constraints"), config.name.as_deref())?;
    config.version = dict.get("version").and_then(value_as_string);

    if let Some(value) = dict.get("metadata") {
        match value {
            Value::Object(overlay) => merge_metadata(&mut config.metadata, overlay.clone()),
            other => {
                return Err(PersonaError::InvalidShape {
                    message: format!(
                        "Metadata must be a dictionary, got {}",
                        json_type_name(other)
                    ),
                })
            }
        }
    }

    if config.name.is_none() {
        config.name = dict.get("name").and_then(value_as_string);
    }

    Ok(())
}

fn constraints_from_value(
    value: Option<&Value>,
    name: Option<&str>,
) -> Result<Vec<String>, PersonaError> {
    let persona = name.unwrap_or("unknown");
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                value_as_string(item).ok_or_else(|| PersonaError::InvalidShape {
                    message: format!("Constraints must be a list of strings for persona '{persona}'"),
                })
            })
            .collect(),
        Some(other) => Err(PersonaError::InvalidShape {
            message: format!(
                "Constraints must be a list for persona '{persona}', got {}",
                json_type_name(other)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_name_priority_chain() {
        assert_eq!(resolve_name(Some("B"), Some("F"), Some("S")), "B");
        assert_eq!(resolve_name(None, Some("F"), Some("S")), "F");
        assert_eq!(resolve_name(None, None, Some("S")), "S");
        assert_eq!(resolve_name(None, None, None), "unnamed_persona");
    }

    #[test]
    fn test_empty_names_count_as_absent() {
        assert_eq!(resolve_name(Some(""), Some("F"), None), "F");
        assert_eq!(resolve_name(Some(""), Some(""), Some("")), "unnamed_persona");
    }

    #[test]
    fn test_extend_goal_literal() {
        assert_eq!(extend_goal(Some("G"), "X"), "G. Additionally, X");
        assert_eq!(extend_goal(None, "X"), "X");
        assert_eq!(extend_goal(Some(""), "X"), "X");
    }

    #[test]
    fn test_extend_goal_twice_matches_single_extended_form() {
        let once = extend_goal(Some("G"), "A");
        let twice = extend_goal(Some(&once), "B");
        assert_eq!(twice, extend_goal(Some("G"), "A. Additionally, B"));
    }

    #[test]
    fn test_metadata_shallow_merge_replaces_nested_wholesale() {
        let mut target = dict(json!({
            "kept": 1,
            "nested": {"a": 1, "b": 2}
        }));
        merge_metadata(
            &mut target,
            dict(json!({"nested": {"c": 3}, "added": true})),
        );

        assert_eq!(target["kept"], json!(1));
        assert_eq!(target["added"], json!(true));
        // nested maps are not deep-merged
        assert_eq!(target["nested"], json!({"c": 3}));
    }

    #[test]
    fn test_apply_dict_copies_core_fields() {
        let mut config = PersonaConfig::default();
        apply_dict(
            &mut config,
            &dict(json!({
                "name": "analyst",
                "role": "Data Analyst",
                "goal": "Analyze data",
                "backstory": "PhD in Statistics",
                "constraints": ["Use pandas"],
                "version": "1.0",
                "metadata": {"team": "research"}
            })),
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("analyst"));
        assert_eq!(config.role.as_deref(), Some("Data Analyst"));
        assert_eq!(config.goal.as_deref(), Some("Analyze data"));
        assert_eq!(config.backstory, "PhD in Statistics");
        assert_eq!(config.constraints, vec!["Use pandas"]);
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert_eq!(config.metadata["team"], json!("research"));
    }

    #[test]
    fn test_apply_dict_preserves_existing_name() {
        let mut config = PersonaConfig {
            name: Some("kept".to_string()),
            ..Default::default()
        };
        apply_dict(&mut config, &dict(json!({"name": "ignored", "role": "R", "goal": "G"})))
            .unwrap();
        assert_eq!(config.name.as_deref(), Some("kept"));
    }

    #[test]
    fn test_apply_dict_never_applies_llm_config() {
        let mut config = PersonaConfig::default();
        apply_dict(
            &mut config,
            &dict(json!({"role": "R", "goal": "G", "llm_config": {"model": "gpt-4"}})),
        )
        .unwrap();
        assert!(config.llm_config.is_none());
    }

    #[test]
    fn test_apply_dict_rejects_scalar_constraints() {
        let mut config = PersonaConfig {
            name: Some("tester".to_string()),
            ..Default::default()
        };
        let err = apply_dict(
            &mut config,
            &dict(json!({"role": "R", "goal": "G", "constraints": "not a list"})),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("Constraints must be a list for persona 'tester'"));
    }

    #[test]
    fn test_apply_dict_rejects_scalar_metadata() {
        let mut config = PersonaConfig::default();
        let err = apply_dict(
            &mut config,
            &dict(json!({"role": "R", "goal": "G", "metadata": "oops"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Metadata must be a dictionary"));
    }
}
