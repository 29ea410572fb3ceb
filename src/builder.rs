//! Fluent builder for persona agents, immediate mode.
//!
//! Every call mutates the working configuration synchronously and returns
//! the builder, so sources and overrides can be chained in any order.
//! Nothing is validated until [`PersonaBuilder::build`]; parse and I/O
//! failures from document sources surface immediately from the loading
//! call itself.
//!
//! ```no_run
//! use persona_agent::PersonaBuilder;
//!
//! let agent = PersonaBuilder::from_markdown("analyst.md")?
//!     .set_name("custom_analyst")
//!     .extend_goal("Focus on real-time data")
//!     .build()?;
//! # Ok::<(), persona_agent::PersonaError>(())
//! ```

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::agent::PersonaAgent;
use crate::config::{LlmConfig, PersonaConfig};
use crate::conversable::HumanInputMode;
use crate::error::PersonaError;
use crate::parser;
use crate::resolver;
use crate::validator;

/// Accumulates persona configuration through a fluent interface and builds
/// a validated [`PersonaAgent`].
#[derive(Debug, Clone, Default)]
pub struct PersonaBuilder {
    config: PersonaConfig,
}

impl PersonaBuilder {
    /// Start an unnamed builder; the name must come from a source document,
    /// [`set_name`](Self::set_name), or a fallback during resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder with the agent name fixed up front.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            config: PersonaConfig {
                name: Some(name.into()),
                ..Default::default()
            },
        }
    }

    // ---- Factory constructors ---------------------------------------------

    /// Create a builder from a Markdown persona file.
    pub fn from_markdown(path: impl AsRef<Path>) -> Result<Self, PersonaError> {
        Self::new().with_markdown_file(path)
    }

    /// Create a builder from a persona configuration dictionary, e.g. the
    /// output of [`PersonaAgent::to_dict`]. An explicit `name` overrides
    /// the dictionary's own.
    pub fn from_persona_dict(
        dict: &Map<String, Value>,
        name: Option<&str>,
    ) -> Result<Self, PersonaError> {
        let builder = match name {
            Some(name) => Self::named(name),
            None => Self::new(),
        };
        builder.from_dict(dict)
    }

    // ---- Core field setters -----------------------------------------------

    /// Set the agent name.
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Set the persona's role or title.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.config.role = Some(role.into());
        self
    }

    /// Set the persona's objective.
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.config.goal = Some(goal.into());
        self
    }

    /// Extend the existing goal with additional requirements.
    pub fn extend_goal(mut self, addition: &str) -> Self {
        self.config.goal = Some(resolver::extend_goal(self.config.goal.as_deref(), addition));
        self
    }

    /// Set the persona's background and expertise.
    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.config.backstory = backstory.into();
        self
    }

    /// Add a single constraint; duplicates and empty strings are ignored.
    pub fn add_constraint(mut self, constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        if !constraint.is_empty() && !self.config.constraints.contains(&constraint) {
            self.config.constraints.push(constraint);
        }
        self
    }

    /// Set all constraints at once, replacing any existing ones.
    pub fn constraints(mut self, constraints: Vec<String>) -> Self {
        self.config.constraints = constraints;
        self
    }

    /// Set the description used for external speaker selection.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Set the persona version tag.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = Some(version.into());
        self
    }

    // ---- LLM configuration ------------------------------------------------

    /// Set the LLM settings mapping for the agent.
    pub fn llm_config(mut self, settings: Map<String, Value>) -> Self {
        self.config.llm_config = Some(LlmConfig::Settings(settings));
        self
    }

    /// Explicitly disable model usage for this agent.
    pub fn disable_llm(mut self) -> Self {
        self.config.llm_config = Some(LlmConfig::Disabled);
        self
    }

    /// Set an already-typed LLM configuration, e.g. when re-applying one
    /// alongside a dictionary source.
    pub fn llm_setting(mut self, llm_config: LlmConfig) -> Self {
        self.config.llm_config = Some(llm_config);
        self
    }

    /// Set just the sampling temperature, starting a settings mapping if
    /// none exists yet.
    pub fn temperature(mut self, temperature: f64) -> Self {
        let mut settings = match self.config.llm_config.take() {
            Some(LlmConfig::Settings(settings)) => settings,
            _ => Map::new(),
        };
        if let Some(number) = Number::from_f64(temperature) {
            settings.insert("temperature".to_string(), Value::Number(number));
        }
        self.config.llm_config = Some(LlmConfig::Settings(settings));
        self
    }

    // ---- Pass-through options ---------------------------------------------

    /// Set the agent's human input mode.
    pub fn human_input_mode(self, mode: HumanInputMode) -> Self {
        self.option("human_input_mode", Value::String(mode.as_str().to_string()))
    }

    /// Never prompt for human input.
    pub fn human_input_never(self) -> Self {
        self.human_input_mode(HumanInputMode::Never)
    }

    /// Always prompt for human input.
    pub fn human_input_always(self) -> Self {
        self.human_input_mode(HumanInputMode::Always)
    }

    /// Prompt for human input only on termination.
    pub fn human_input_terminate(self) -> Self {
        self.human_input_mode(HumanInputMode::Terminate)
    }

    /// Add one pass-through option for the external agent constructor.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.options.insert(key.into(), value);
        self
    }

    /// Add several pass-through options at once.
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.config.options.extend(options);
        self
    }

    /// Supplementary text appended to the rendered system message under a
    /// fixed `Additional Instructions:` heading.
    pub fn additional_instructions(mut self, text: impl Into<String>) -> Self {
        self.config.additional_instructions = Some(text.into());
        self
    }

    // ---- Metadata ---------------------------------------------------------

    /// Shallow-merge user-defined metadata. Core persona fields are never
    /// touched by this; metadata is exclusively extensible user data.
    pub fn update_metadata(mut self, metadata: Map<String, Value>) -> Self {
        resolver::merge_metadata(&mut self.config.metadata, metadata);
        self
    }

    // ---- Sources ----------------------------------------------------------

    /// Load persona attributes from a configuration dictionary.
    ///
    /// `llm_config` is deliberately not read from the dictionary; supply it
    /// at runtime via [`llm_config`](Self::llm_config) so serialized
    /// personas stay portable across model backends.
    pub fn from_dict(mut self, dict: &Map<String, Value>) -> Result<Self, PersonaError> {
        resolver::apply_dict(&mut self.config, dict)?;
        Ok(self)
    }

    /// Load persona configuration from Markdown content with YAML front
    /// matter.
    pub fn with_markdown(self, content: &str) -> Result<Self, PersonaError> {
        self.load_markdown(content, None)
    }

    /// Load persona configuration from a Markdown file; the filename stem
    /// serves as the name fallback.
    pub fn with_markdown_file(self, path: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PersonaError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        self.load_markdown(&content, stem.as_deref())
    }

    pub(crate) fn load_markdown(
        mut self,
        content: &str,
        fallback_name: Option<&str>,
    ) -> Result<Self, PersonaError> {
        let parsed = parser::parse_persona_markdown(content)?;

        self.config.name = Some(resolver::resolve_name(
            self.config.name.as_deref(),
            parsed.name.as_deref(),
            fallback_name,
        ));

        if let Some(role) = parsed.role {
            self.config.role = Some(role);
        }
        if let Some(goal) = parsed.goal {
            self.config.goal = Some(goal);
        }
        if !parsed.backstory.is_empty() {
            self.config.backstory = parsed.backstory;
        }
        self.config.constraints = parsed.constraints;
        if let Some(llm_config) = parsed.llm_config {
            self.config.llm_config = Some(llm_config);
        }
        if let Some(description) = parsed.description {
            self.config.description = Some(description);
        }
        if let Some(version) = parsed.version {
            self.config.version = Some(version);
        }
        if !parsed.metadata.is_empty() {
            resolver::merge_metadata(&mut self.config.metadata, parsed.metadata);
        }

        Ok(self)
    }

    // ---- Finalization -----------------------------------------------------

    /// The resolved name, if any source has supplied one yet.
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    /// A view of the working configuration.
    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    /// Check the current configuration without building.
    pub fn validate(&self) -> Result<(), PersonaError> {
        validator::validate(&self.config)
    }

    /// Validate the configuration, compose the system message, and
    /// construct the agent.
    ///
    /// On failure the builder is left unchanged, so the offending field can
    /// be corrected and `build` retried.
    pub fn build(&self) -> Result<PersonaAgent, PersonaError> {
        PersonaAgent::from_config(self.config.clone())
    }
}
