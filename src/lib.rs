//! # Taskflow
//!
//! An orchestration runtime for multi-agent assistants: named agents carrying
//! instructions, callable tools, and handoff targets, coordinated turn by
//! turn with guardrails checked on every exchange.
//!
//! ## Core Concepts
//!
//! - **Agent**: an immutable participant with instructions, an allowed tool
//!   set, and an allowed handoff set
//! - **Session**: the state machine tracking the current agent, the shared
//!   context, and the conversation history
//! - **Oracle**: the pluggable external reasoning service consulted each turn
//!   to decide the next action (reply, tool call, or handoff)
//! - **Guardrails**: stateless pass/fail checks applied to turn input and
//!   output, aggregated with AND
//!
//! ## Getting Started
//!
//! ```rust
//! use std::sync::Arc;
//! use taskflow::{
//!     tasks, ScriptedOracle, Session, SessionConfig, TurnOutcome,
//! };
//!
//! # async fn example() -> taskflow::Result<()> {
//! let agents = Arc::new(tasks::task_management_agents()?);
//! let tools = Arc::new(tasks::task_management_tools()?);
//!
//! // A scripted oracle stands in for the real model call.
//! let oracle = Arc::new(ScriptedOracle::new().with_handoff("task_creation"));
//!
//! let mut session = Session::new(
//!     agents,
//!     tools,
//!     oracle,
//!     tasks::ENTRY_AGENT,
//!     SessionConfig::default(),
//! )?;
//!
//! let outcome = session.run_turn("I need to create a task").await;
//! assert!(matches!(outcome, TurnOutcome::HandOff { .. }));
//! assert_eq!(session.current_agent(), "task_creation");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod context;
pub mod error;
pub mod events;
pub mod guardrail;
pub mod items;
pub mod model;
pub mod oracle;
pub mod registry;
pub mod session;
pub mod tasks;
pub mod tool;

pub use agent::Agent;
pub use context::{ContextDiff, ContextStore, TaskContext};
pub use error::{AgentError, Result};
pub use events::{Event, EventKind, EventSink, MemorySink, NullSink, TracingSink};
pub use guardrail::{
    Direction, Guardrail, GuardrailEvaluator, GuardrailVerdict, PatternBlockGuardrail,
};
pub use items::{Message, Role, ToolCall};
pub use model::OpenAIOracle;
pub use oracle::{Action, Oracle, OracleRequest, ScriptedOracle};
pub use registry::AgentRegistry;
pub use session::{Session, SessionConfig, TurnOutcome};
pub use tool::{FunctionTool, Tool, ToolRegistry, ToolSpec};
