//! # persona-agent
//!
//! Persona-based conversational agents for multi-agent frameworks.
//!
//! A persona is a structured configuration (role, goal, backstory,
//! constraints, metadata) assembled from constructor arguments,
//! dictionaries, or Markdown documents with YAML front matter, merged by a
//! fixed priority order, validated, and rendered into a deterministic
//! system message before the agent object is handed to the external
//! conversation framework.
//!
//! Two builder disciplines are provided: [`PersonaBuilder`] mutates its
//! working configuration on every call, while [`AsyncPersonaBuilder`]
//! queues operations and executes them in order at a single `build().await`
//! suspension point, loading documents with non-blocking I/O.
//!
//! ```
//! use persona_agent::PersonaBuilder;
//!
//! let agent = PersonaBuilder::named("reviewer")
//!     .role("Code Reviewer")
//!     .goal("Review code for quality and security issues")
//!     .backstory("Senior engineer with 10 years of experience")
//!     .add_constraint("Check for SQL injection")
//!     .disable_llm()
//!     .build()
//!     .unwrap();
//!
//! assert!(agent.system_message().starts_with("# Role: Code Reviewer"));
//! ```

pub mod agent;
pub mod async_builder;
pub mod builder;
pub mod composer;
pub mod config;
pub mod conversable;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod validator;

// Public surface re-exports
pub use agent::PersonaAgent;
pub use async_builder::AsyncPersonaBuilder;
pub use builder::PersonaBuilder;
pub use config::{LlmConfig, PersonaConfig};
pub use conversable::{ConversableAgent, HumanInputMode};
pub use error::PersonaError;
pub use parser::ParsedPersona;

/// Library version.
pub const VERSION: &str = "0.1.1";
