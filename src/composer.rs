//! System message composition from structured persona components.
//!
//! Pure text assembly: role heading, goal section, then background and
//! constraints sections when non-empty, joined with blank-line separation.
//! Owners re-render whenever role, goal, backstory, or constraints change.

/// Compose the system message for a persona.
///
/// ```
/// use persona_agent::composer::compose_system_message;
///
/// let message = compose_system_message("Helper", "Help users", "", &[]);
/// assert_eq!(message, "# Role: Helper\n\n## Goal\nHelp users");
/// ```
pub fn compose_system_message(
    role: &str,
    goal: &str,
    backstory: &str,
    constraints: &[String],
) -> String {
    let mut parts = vec![format!("# Role: {role}")];

    parts.push(format!("\n## Goal\n{goal}"));

    if !backstory.is_empty() {
        parts.push(format!("\n## Background\n{backstory}"));
    }

    if !constraints.is_empty() {
        parts.push("\n## Constraints".to_string());
        for constraint in constraints {
            parts.push(format!("- {constraint}"));
        }
    }

    parts.join("\n")
}

/// Append caller-supplied supplementary text under a fixed heading.
pub fn append_additional_instructions(message: &str, additional: &str) -> String {
    format!("{message}\n\nAdditional Instructions:\n{additional}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_message_has_no_optional_sections() {
        let message = compose_system_message("Helper", "Help users", "", &[]);
        assert_eq!(message, "# Role: Helper\n\n## Goal\nHelp users");
        assert!(!message.contains("## Background"));
        assert!(!message.contains("## Constraints"));
    }

    #[test]
    fn test_full_message_section_order() {
        let constraints = vec!["Use Python".to_string(), "Be concise".to_string()];
        let message =
            compose_system_message("Analyst", "Analyze data", "Expert in statistics", &constraints);

        let role_at = message.find("# Role: Analyst").unwrap();
        let goal_at = message.find("## Goal").unwrap();
        let background_at = message.find("## Background").unwrap();
        let constraints_at = message.find("## Constraints").unwrap();
        assert!(role_at < goal_at && goal_at < background_at && background_at < constraints_at);

        assert!(message.contains("Analyze data"));
        assert!(message.contains("Expert in statistics"));
    }

    #[test]
    fn test_constraint_bullets_match_input_order() {
        let constraints = vec![
            "First rule".to_string(),
            "Second rule".to_string(),
            "Third rule".to_string(),
        ];
        let message = compose_system_message("Tester", "Test", "", &constraints);

        let bullets: Vec<&str> = message
            .lines()
            .filter(|line| line.starts_with("- "))
            .collect();
        assert_eq!(bullets, vec!["- First rule", "- Second rule", "- Third rule"]);
    }

    #[test]
    fn test_backstory_without_constraints() {
        let message = compose_system_message("Guide", "Guide users", "Veteran guide", &[]);
        assert_eq!(
            message,
            "# Role: Guide\n\n## Goal\nGuide users\n\n## Background\nVeteran guide"
        );
    }

    #[test]
    fn test_additional_instructions_appended() {
        let base = compose_system_message("Tester", "Test system", "", &[]);
        let message = append_additional_instructions(&base, "Custom instructions here");
        assert!(message.starts_with(&base));
        assert!(message.ends_with("\n\nAdditional Instructions:\nCustom instructions here"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let constraints = vec!["A".to_string(), "B".to_string()];
        let first = compose_system_message("R", "G", "B", &constraints);
        let second = compose_system_message("R", "G", "B", &constraints);
        assert_eq!(first, second);
    }
}
