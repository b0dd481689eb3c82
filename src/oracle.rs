//! The oracle: pluggable "decide next action" strategy
//!
//! The runtime never reasons about natural language itself. Each turn it asks
//! an [`Oracle`] what to do next, handing over the current agent's
//! instructions, the conversation history, a context snapshot, and the tools
//! and handoff targets available to that agent. Implementations range from a
//! real LLM call ([`OpenAIOracle`](crate::model::OpenAIOracle)) to the
//! [`ScriptedOracle`] test double.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::context::TaskContext;
use crate::error::Result;
use crate::items::{Message, ToolCall};
use crate::tool::ToolSpec;

/// The action an oracle proposes for the current turn.
#[derive(Debug, Clone)]
pub enum Action {
    /// Surface a direct reply to the user.
    Reply(String),
    /// Invoke one of the current agent's tools.
    CallTool(ToolCall),
    /// Transfer control to another agent.
    HandOff {
        target: String,
        reason: Option<String>,
    },
}

/// Everything the oracle sees when deciding the next action.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub instructions: String,
    pub history: Vec<Message>,
    pub context: TaskContext,
    pub tools: Vec<ToolSpec>,
    pub handoffs: Vec<String>,
}

/// The external reasoning service consulted each turn.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn decide(&self, request: OracleRequest) -> Result<Action>;
}

/// An oracle that replays a fixed script of actions.
///
/// Actions are consumed front to back; once the script is exhausted the
/// oracle falls back to a repeating action if one was configured, or to a
/// default reply otherwise.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Action>>,
    fallback: Option<Action>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle that returns the same action on every consultation.
    pub fn repeating(action: Action) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(action),
        }
    }

    pub fn with_action(self, action: Action) -> Self {
        self.script
            .lock()
            .expect("oracle script poisoned")
            .push_back(action);
        self
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_action(Action::Reply(text.into()))
    }

    pub fn with_tool_call(self, name: impl Into<String>, arguments: Value) -> Self {
        self.with_action(Action::CallTool(ToolCall::new(name, arguments)))
    }

    pub fn with_handoff(self, target: impl Into<String>) -> Self {
        self.with_action(Action::HandOff {
            target: target.into(),
            reason: None,
        })
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn decide(&self, _request: OracleRequest) -> Result<Action> {
        let next = self
            .script
            .lock()
            .expect("oracle script poisoned")
            .pop_front();
        match next {
            Some(action) => Ok(action),
            None => match &self.fallback {
                Some(action) => Ok(action.clone()),
                None => Ok(Action::Reply("Default response".to_string())),
            },
        }
    }
}
