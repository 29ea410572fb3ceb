//! Fluent builder for persona agents, deferred mode.
//!
//! Every call enqueues an operation instead of executing it; a single
//! [`AsyncPersonaBuilder::build`] drains the queue strictly in enqueue
//! order, suspending only at file-load entries. A caller composing many
//! configuration steps therefore pays one suspension point at finalize,
//! not one per step, and later steps see the effects of earlier ones: a
//! constraint enqueued after a document load is applied after that load's
//! bulk replacement.
//!
//! ```no_run
//! # async fn demo() -> Result<(), persona_agent::PersonaError> {
//! use persona_agent::AsyncPersonaBuilder;
//! use serde_json::{json, Map, Value};
//!
//! let settings: Map<String, Value> =
//!     json!({"model": "gpt-4"}).as_object().cloned().unwrap();
//! let agent = AsyncPersonaBuilder::new("analyst")
//!     .from_yaml_file("analyst.yaml")
//!     .llm_config(settings)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::agent::PersonaAgent;
use crate::builder::PersonaBuilder;
use crate::conversable::HumanInputMode;
use crate::error::PersonaError;

/// One deferred configuration operation.
#[derive(Debug, Clone)]
enum BuildOp {
    SetName(String),
    Role(String),
    Goal(String),
    ExtendGoal(String),
    Backstory(String),
    AddConstraint(String),
    Constraints(Vec<String>),
    LlmConfig(Map<String, Value>),
    DisableLlm,
    Temperature(f64),
    Description(String),
    Version(String),
    UpdateMetadata(Map<String, Value>),
    SetOption(String, Value),
    HumanInput(HumanInputMode),
    AdditionalInstructions(String),
    FromDict(Map<String, Value>),
    WithMarkdown(String),
    LoadMarkdownFile(PathBuf),
    LoadYamlFile(PathBuf),
}

/// Deferred-mode persona builder with non-blocking file loads.
#[derive(Debug, Clone, Default)]
pub struct AsyncPersonaBuilder {
    name: Option<String>,
    ops: Vec<BuildOp>,
}

impl AsyncPersonaBuilder {
    /// Start a builder with the agent name fixed up front.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ops: Vec::new(),
        }
    }

    /// Start an unnamed builder; the name must come from a queued source or
    /// a later `set_name`.
    pub fn unnamed() -> Self {
        Self::default()
    }

    // ---- Queued operations ------------------------------------------------

    pub fn set_name(self, name: impl Into<String>) -> Self {
        self.push(BuildOp::SetName(name.into()))
    }

    pub fn role(self, role: impl Into<String>) -> Self {
        self.push(BuildOp::Role(role.into()))
    }

    pub fn goal(self, goal: impl Into<String>) -> Self {
        self.push(BuildOp::Goal(goal.into()))
    }

    pub fn extend_goal(self, addition: impl Into<String>) -> Self {
        self.push(BuildOp::ExtendGoal(addition.into()))
    }

    pub fn backstory(self, backstory: impl Into<String>) -> Self {
        self.push(BuildOp::Backstory(backstory.into()))
    }

    pub fn add_constraint(self, constraint: impl Into<String>) -> Self {
        self.push(BuildOp::AddConstraint(constraint.into()))
    }

    pub fn constraints(self, constraints: Vec<String>) -> Self {
        self.push(BuildOp::Constraints(constraints))
    }

    pub fn llm_config(self, settings: Map<String, Value>) -> Self {
        self.push(BuildOp::LlmConfig(settings))
    }

    pub fn disable_llm(self) -> Self {
        self.push(BuildOp::DisableLlm)
    }

    pub fn temperature(self, temperature: f64) -> Self {
        self.push(BuildOp::Temperature(temperature))
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.push(BuildOp::Description(description.into()))
    }

    pub fn version(self, version: impl Into<String>) -> Self {
        self.push(BuildOp::Version(version.into()))
    }

    pub fn update_metadata(self, metadata: Map<String, Value>) -> Self {
        self.push(BuildOp::UpdateMetadata(metadata))
    }

    pub fn option(self, key: impl Into<String>, value: Value) -> Self {
        self.push(BuildOp::SetOption(key.into(), value))
    }

    pub fn human_input_mode(self, mode: HumanInputMode) -> Self {
        self.push(BuildOp::HumanInput(mode))
    }

    pub fn human_input_never(self) -> Self {
        self.human_input_mode(HumanInputMode::Never)
    }

    pub fn human_input_always(self) -> Self {
        self.human_input_mode(HumanInputMode::Always)
    }

    pub fn human_input_terminate(self) -> Self {
        self.human_input_mode(HumanInputMode::Terminate)
    }

    pub fn additional_instructions(self, text: impl Into<String>) -> Self {
        self.push(BuildOp::AdditionalInstructions(text.into()))
    }

    /// Queue a dictionary source. `llm_config` is deliberately not read
    /// from the dictionary; supply it at runtime via
    /// [`llm_config`](Self::llm_config).
    pub fn from_dict(self, dict: Map<String, Value>) -> Self {
        self.push(BuildOp::FromDict(dict))
    }

    /// Queue an in-memory Markdown source.
    pub fn with_markdown(self, content: impl Into<String>) -> Self {
        self.push(BuildOp::WithMarkdown(content.into()))
    }

    /// Queue a Markdown persona file load; read with non-blocking I/O at
    /// build time.
    pub fn from_markdown_file(self, path: impl AsRef<Path>) -> Self {
        self.push(BuildOp::LoadMarkdownFile(path.as_ref().to_path_buf()))
    }

    /// Queue a YAML persona document load; read with non-blocking I/O at
    /// build time. The document must parse to a non-empty mapping.
    pub fn from_yaml_file(self, path: impl AsRef<Path>) -> Self {
        self.push(BuildOp::LoadYamlFile(path.as_ref().to_path_buf()))
    }

    fn push(mut self, op: BuildOp) -> Self {
        self.ops.push(op);
        self
    }

    // ---- Finalization -----------------------------------------------------

    /// Execute all queued operations strictly in enqueue order, then
    /// validate, compose the system message, and construct the agent.
    ///
    /// Parse and I/O failures from queued loads surface with their
    /// original error intact. On failure no agent is produced and the
    /// queue is untouched, so `build` can be retried.
    pub async fn build(&self) -> Result<PersonaAgent, PersonaError> {
        let mut inner = match &self.name {
            Some(name) => PersonaBuilder::named(name.clone()),
            None => PersonaBuilder::new(),
        };

        for op in &self.ops {
            inner = match op.clone() {
                BuildOp::SetName(name) => inner.set_name(name),
                BuildOp::Role(role) => inner.role(role),
                BuildOp::Goal(goal) => inner.goal(goal),
                BuildOp::ExtendGoal(addition) => inner.extend_goal(&addition),
                BuildOp::Backstory(backstory) => inner.backstory(backstory),
                BuildOp::AddConstraint(constraint) => inner.add_constraint(constraint),
                BuildOp::Constraints(constraints) => inner.constraints(constraints),
                BuildOp::LlmConfig(settings) => inner.llm_config(settings),
                BuildOp::DisableLlm => inner.disable_llm(),
                BuildOp::Temperature(temperature) => inner.temperature(temperature),
                BuildOp::Description(description) => inner.description(description),
                BuildOp::Version(version) => inner.version(version),
                BuildOp::UpdateMetadata(metadata) => inner.update_metadata(metadata),
                BuildOp::SetOption(key, value) => inner.option(key, value),
                BuildOp::HumanInput(mode) => inner.human_input_mode(mode),
                BuildOp::AdditionalInstructions(text) => inner.additional_instructions(text),
                BuildOp::FromDict(dict) => inner.from_dict(&dict)?,
                BuildOp::WithMarkdown(content) => inner.with_markdown(&content)?,
                BuildOp::LoadMarkdownFile(path) => {
                    let content = read_document(&path).await?;
                    let stem = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned());
                    inner.load_markdown(&content, stem.as_deref())?
                }
                BuildOp::LoadYamlFile(path) => {
                    let dict = load_yaml_document(&path).await?;
                    inner.from_dict(&dict)?
                }
            };
        }

        inner.build()
    }
}

async fn read_document(path: &Path) -> Result<String, PersonaError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PersonaError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            PersonaError::Io(e)
        }
    })
}

/// Read and parse a whole-file YAML persona document into a dictionary.
async fn load_yaml_document(path: &Path) -> Result<Map<String, Value>, PersonaError> {
    let content = read_document(path).await?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| PersonaError::Yaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let value = serde_json::to_value(yaml).map_err(|e| PersonaError::Yaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(dict) if !dict.is_empty() => Ok(dict),
        Value::Null => Err(PersonaError::EmptyDocument {
            path: path.display().to_string(),
        }),
        Value::Object(_) => Err(PersonaError::EmptyDocument {
            path: path.display().to_string(),
        }),
        other => Err(PersonaError::Yaml {
            path: path.display().to_string(),
            message: format!(
                "document must be a mapping, got {}",
                crate::config::json_type_name(&other)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const ANALYST_DOC: &str = "---\n\
name: doc_analyst\n\
role: Data Analyst\n\
goal: Analyze data\n\
constraints:\n\
  - From the document\n\
---\n\
\n\
# Backstory\n\
Veteran analyst.\n";

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn settings(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_deferred_chain_matches_immediate_mode() {
        let deferred = AsyncPersonaBuilder::new("analyst")
            .role("Data Analyst")
            .goal("Analyze data")
            .backstory("Expert in statistics")
            .add_constraint("Use Rust")
            .build()
            .await
            .unwrap();

        let immediate = PersonaBuilder::named("analyst")
            .role("Data Analyst")
            .goal("Analyze data")
            .backstory("Expert in statistics")
            .add_constraint("Use Rust")
            .build()
            .unwrap();

        assert_eq!(deferred.system_message(), immediate.system_message());
        assert_eq!(deferred.name(), immediate.name());
    }

    #[tokio::test]
    async fn test_ops_execute_in_enqueue_order() {
        let file = write_temp(".md", ANALYST_DOC);

        // enqueued after the load, so it must survive the load's bulk
        // constraint replacement
        let agent = AsyncPersonaBuilder::unnamed()
            .from_markdown_file(file.path())
            .add_constraint("Added after load")
            .build()
            .await
            .unwrap();

        assert_eq!(agent.constraints(), ["From the document", "Added after load"]);
    }

    #[tokio::test]
    async fn test_load_clobbers_earlier_constraints() {
        let file = write_temp(".md", ANALYST_DOC);

        let agent = AsyncPersonaBuilder::unnamed()
            .add_constraint("Added before load")
            .from_markdown_file(file.path())
            .build()
            .await
            .unwrap();

        assert_eq!(agent.constraints(), ["From the document"]);
    }

    #[tokio::test]
    async fn test_builder_name_beats_document_name() {
        let file = write_temp(".md", ANALYST_DOC);
        let agent = AsyncPersonaBuilder::new("explicit")
            .from_markdown_file(file.path())
            .build()
            .await
            .unwrap();
        assert_eq!(agent.name(), "explicit");
    }

    #[tokio::test]
    async fn test_from_yaml_file() {
        let file = write_temp(
            ".yaml",
            "name: yaml_agent\nrole: Architect\ngoal: Design systems\nbackstory: Veteran\nconstraints:\n  - Think first\n",
        );

        let agent = AsyncPersonaBuilder::unnamed()
            .from_yaml_file(file.path())
            .llm_config(settings(json!({"model": "gpt-4"})))
            .build()
            .await
            .unwrap();

        assert_eq!(agent.name(), "yaml_agent");
        assert_eq!(agent.role(), "Architect");
        assert_eq!(agent.backstory(), "Veteran");
        assert_eq!(agent.constraints(), ["Think first"]);
        assert_eq!(
            agent.llm_config().unwrap().settings().unwrap()["model"],
            json!("gpt-4")
        );
    }

    #[tokio::test]
    async fn test_yaml_file_llm_config_not_auto_applied() {
        let file = write_temp(
            ".yaml",
            "name: portable\nrole: R\ngoal: G\nllm_config:\n  model: gpt-4\n",
        );

        let agent = AsyncPersonaBuilder::unnamed()
            .from_yaml_file(file.path())
            .build()
            .await
            .unwrap();
        assert!(agent.llm_config().is_none());
    }

    #[tokio::test]
    async fn test_empty_yaml_document_errors() {
        let file = write_temp(".yaml", "");
        let err = AsyncPersonaBuilder::unnamed()
            .from_yaml_file(file.path())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, PersonaError::EmptyDocument { .. }));
        assert!(err.to_string().contains("is empty or contains no valid data"));
    }

    #[tokio::test]
    async fn test_missing_file_surfaces_at_build() {
        let err = AsyncPersonaBuilder::new("t")
            .from_markdown_file("no_such_persona.md")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, PersonaError::FileNotFound { .. }));
    }

    #[test]
    fn test_enqueue_performs_no_io() {
        // queueing a load of a missing file is fine; the error belongs to
        // build()
        let builder = AsyncPersonaBuilder::new("t").from_markdown_file("no_such_persona.md");
        let err = tokio_test::block_on(builder.build()).unwrap_err();
        assert!(matches!(err, PersonaError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_build_can_be_retried() {
        let builder = AsyncPersonaBuilder::new("retry").role("R");
        assert!(builder.build().await.is_err());

        let builder = builder.goal("Now complete");
        let agent = builder.build().await.unwrap();
        assert_eq!(agent.goal(), "Now complete");
    }

    #[tokio::test]
    async fn test_validation_reports_aggregate_from_build() {
        let err = AsyncPersonaBuilder::new("incomplete").build().await.unwrap_err();
        let report = err.to_string();
        assert!(report.starts_with("Persona validation failed for 'incomplete':"));
        assert!(report.contains("Role is required"));
        assert!(report.contains("Goal is required"));
    }
}
