//! Error types for the orchestration runtime

use thiserror::Error;

/// Result type alias for the orchestration runtime
pub type Result<T> = std::result::Result<T, AgentError>;

/// Main error type for the orchestration runtime.
///
/// Setup-time errors (`DuplicateTool`, `DuplicateAgent`, `InvalidHandoffTarget`,
/// `UnknownAgent` during wiring) are fatal and abort startup. Everything else is
/// recovered at the turn boundary by the session, which logs a structured event
/// and surfaces an apologetic message while staying in the current agent state.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A tool with the same name was already registered
    #[error("duplicate tool registered: {name}")]
    DuplicateTool { name: String },

    /// An agent with the same name was already defined
    #[error("duplicate agent defined: {name}")]
    DuplicateAgent { name: String },

    /// Tool missing from the calling agent's allowed set or the registry
    #[error("unknown tool '{name}' for agent '{agent}'")]
    UnknownTool { name: String, agent: String },

    /// Tool arguments failed schema validation
    #[error("invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// Agent name not present in the registry
    #[error("unknown agent: {name}")]
    UnknownAgent { name: String },

    /// A declared handoff references an agent that was never defined
    #[error("agent '{agent}' declares a handoff to undefined agent '{target}'")]
    InvalidHandoffTarget { agent: String, target: String },

    /// Handoff target not in the current agent's declared handoff set
    #[error("agent '{from}' is not authorized to hand off to '{to}'")]
    UnauthorizedHandoff { from: String, to: String },

    /// The oracle kept issuing tool calls without replying or handing off
    #[error("turn budget of {budget} oracle consultations exceeded")]
    TurnBudgetExceeded { budget: usize },

    /// The in-flight oracle consultation or tool call outlived the turn deadline
    #[error("turn timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A tool handler or context transform failed
    #[error("tool execution error: {message}")]
    ToolExecution { message: String },

    /// Error from the LLM provider backing the oracle
    #[error("oracle provider error: {0}")]
    Provider(#[from] async_openai::error::OpenAIError),

    /// The oracle returned something the runtime cannot interpret as an action
    #[error("oracle behavior error: {message}")]
    Oracle { message: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
