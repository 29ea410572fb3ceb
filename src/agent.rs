//! Finalized persona agent.
//!
//! A `PersonaAgent` embodies a distinct persona through explicit role,
//! goal, backstory, and constraints. It is constructed by a builder after
//! validation succeeds and delegates to the external conversation
//! framework through its [`ConversableAgent`] base. The name is fixed at
//! construction; goal and constraints can still be adjusted through
//! dedicated operations that re-render the system message.

use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::builder::PersonaBuilder;
use crate::composer;
use crate::config::{LlmConfig, PersonaConfig};
use crate::conversable::ConversableAgent;
use crate::error::PersonaError;
use crate::resolver;
use crate::validator;

/// A conversational agent with a structured persona.
pub struct PersonaAgent {
    base: ConversableAgent,
    role: String,
    goal: String,
    backstory: String,
    constraints: Vec<String>,
    version: Option<String>,
    metadata: Map<String, Value>,
    additional_instructions: Option<String>,
}

impl PersonaAgent {
    /// Construct from a validated working configuration.
    ///
    /// Called by the builders after all queued operations have run; fails
    /// with the aggregated validation report when the configuration is
    /// incomplete.
    pub(crate) fn from_config(config: PersonaConfig) -> Result<Self, PersonaError> {
        validator::validate(&config)?;

        let PersonaConfig {
            name,
            role,
            goal,
            backstory,
            constraints,
            description,
            llm_config,
            version,
            metadata,
            options,
            additional_instructions,
        } = config;

        // validate() guarantees these are present and non-empty
        let name = name.unwrap_or_default();
        let role = role.unwrap_or_default();
        let goal = goal.unwrap_or_default();

        let description = description.unwrap_or_else(|| format!("{role}: {goal}"));

        let mut system_message =
            composer::compose_system_message(&role, &goal, &backstory, &constraints);
        if let Some(extra) = additional_instructions.as_deref() {
            system_message = composer::append_additional_instructions(&system_message, extra);
        }

        log::debug!("Constructed persona agent '{name}'");

        Ok(Self {
            base: ConversableAgent::new(name, system_message, description, llm_config, options),
            role,
            goal,
            backstory,
            constraints,
            version,
            metadata,
            additional_instructions,
        })
    }

    // ---- Accessors --------------------------------------------------------

    /// Unique identifier of the underlying agent instance.
    pub fn id(&self) -> Uuid {
        self.base.id
    }

    /// Agent name, fixed at construction.
    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }

    /// Description used for external speaker selection.
    pub fn description(&self) -> &str {
        &self.base.description
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The rendered system message.
    pub fn system_message(&self) -> &str {
        &self.base.system_message
    }

    pub fn llm_config(&self) -> Option<&LlmConfig> {
        self.base.llm_config.as_ref()
    }

    /// Pass-through options forwarded to the external framework.
    pub fn options(&self) -> &Map<String, Value> {
        &self.base.options
    }

    /// Defensive copy of the user-defined metadata.
    pub fn metadata(&self) -> Map<String, Value> {
        self.metadata.clone()
    }

    /// The handoff record for the external conversation framework.
    pub fn as_conversable(&self) -> &ConversableAgent {
        &self.base
    }

    // ---- Mutations --------------------------------------------------------

    /// Renaming a constructed agent always fails.
    pub fn set_name(&mut self, _name: impl Into<String>) -> Result<(), PersonaError> {
        Err(PersonaError::ImmutableName {
            name: self.base.name.clone(),
        })
    }

    /// Replace the goal and re-render the system message.
    pub fn update_goal(&mut self, new_goal: impl Into<String>) {
        self.goal = new_goal.into();
        self.refresh_system_message();
    }

    /// Extend the goal with additional requirements and re-render.
    pub fn extend_goal(&mut self, addition: &str) {
        self.goal = resolver::extend_goal(Some(&self.goal), addition);
        self.refresh_system_message();
    }

    /// Add a constraint; duplicates and empty strings are ignored.
    pub fn add_constraint(&mut self, constraint: impl Into<String>) {
        let constraint = constraint.into();
        if !constraint.is_empty() && !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
            self.refresh_system_message();
        }
    }

    /// Remove a constraint if present.
    pub fn remove_constraint(&mut self, constraint: &str) {
        if let Some(index) = self.constraints.iter().position(|c| c == constraint) {
            self.constraints.remove(index);
            self.refresh_system_message();
        }
    }

    /// Replace all constraints, regardless of duplicates, and re-render.
    pub fn set_constraints(&mut self, constraints: Vec<String>) {
        self.constraints = constraints;
        self.refresh_system_message();
    }

    /// Shallow-merge user-defined metadata into the agent.
    pub fn merge_metadata(&mut self, metadata: Map<String, Value>) {
        resolver::merge_metadata(&mut self.metadata, metadata);
    }

    fn refresh_system_message(&mut self) {
        let mut message = composer::compose_system_message(
            &self.role,
            &self.goal,
            &self.backstory,
            &self.constraints,
        );
        if let Some(extra) = self.additional_instructions.as_deref() {
            message = composer::append_additional_instructions(&message, extra);
        }
        self.base.system_message = message;
    }

    // ---- Serialization ----------------------------------------------------

    /// Export the persona configuration as a dictionary.
    ///
    /// The emitted `system_message` is informational only; the dictionary
    /// loading path regenerates it and never reads it back.
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("name".to_string(), Value::String(self.base.name.clone()));
        dict.insert("role".to_string(), Value::String(self.role.clone()));
        dict.insert("goal".to_string(), Value::String(self.goal.clone()));
        dict.insert("backstory".to_string(), Value::String(self.backstory.clone()));
        dict.insert(
            "constraints".to_string(),
            Value::Array(self.constraints.iter().cloned().map(Value::String).collect()),
        );
        dict.insert(
            "llm_config".to_string(),
            self.base
                .llm_config
                .as_ref()
                .map(LlmConfig::to_value)
                .unwrap_or(Value::Null),
        );
        dict.insert(
            "version".to_string(),
            self.version.clone().map(Value::String).unwrap_or(Value::Null),
        );
        dict.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        dict.insert(
            "system_message".to_string(),
            Value::String(self.base.system_message.clone()),
        );
        dict
    }

    /// Reconstruct a persona agent from a configuration dictionary.
    ///
    /// Runs through the dictionary-loading path, which treats `llm_config`
    /// as a runtime concern; it is re-applied here explicitly so a
    /// `to_dict()` round-trip reconstructs an equivalent agent.
    pub fn from_dict(dict: &Map<String, Value>) -> Result<Self, PersonaError> {
        let mut builder = PersonaBuilder::from_persona_dict(dict, None)?;
        if let Some(value) = dict.get("llm_config") {
            if !value.is_null() {
                builder = builder.llm_setting(LlmConfig::from_value(value)?);
            }
        }
        builder.build()
    }
}

impl fmt::Debug for PersonaAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonaAgent")
            .field("id", &self.base.id)
            .field("name", &self.base.name)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PersonaAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let goal: String = self.goal.chars().take(50).collect();
        write!(
            f,
            "PersonaAgent(name='{}', role='{}', goal='{goal}...')",
            self.base.name, self.role
        )
    }
}
