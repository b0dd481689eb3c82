//! Session orchestration: the handoff state machine
//!
//! One [`Session`] serves one conversation. It tracks the current agent,
//! owns the context store and the history, consults the oracle each turn,
//! executes the proposed action, and enforces the invariants that keep the
//! cyclic handoff graph bounded: a per-turn oracle-consultation budget and a
//! per-turn timeout around the suspending work.
//!
//! Turns are strictly sequential (`run_turn` takes `&mut self`); independent
//! sessions run in parallel without sharing anything.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::context::{ContextStore, TaskContext};
use crate::error::{AgentError, Result};
use crate::events::{Event, EventKind, EventSink, TracingSink};
use crate::guardrail::{Direction, GuardrailEvaluator, GuardrailVerdict};
use crate::items::Message;
use crate::oracle::{Action, Oracle, OracleRequest};
use crate::registry::AgentRegistry;
use crate::tool::ToolRegistry;

/// Message surfaced when a turn fails and is recovered at the boundary.
const APOLOGY: &str = "Sorry, something went wrong while handling that request. Please try again.";

/// Configuration for a session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Maximum oracle consultations within one turn. Guards against an oracle
    /// that keeps issuing tool calls without ever replying or handing off.
    pub turn_budget: usize,

    /// Deadline for one turn. Cancels the in-flight oracle consultation or
    /// tool call; context stays consistent because tool mutations are applied
    /// only after the handler returns.
    pub turn_timeout: Duration,

    /// Destination for structured observability events.
    pub sink: Arc<dyn EventSink>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_budget: 10,
            turn_timeout: Duration::from_secs(60),
            sink: Arc::new(TracingSink),
        }
    }
}

impl SessionConfig {
    pub fn with_turn_budget(mut self, budget: usize) -> Self {
        self.turn_budget = budget;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("turn_budget", &self.turn_budget)
            .field("turn_timeout", &self.turn_timeout)
            .finish()
    }
}

/// What one turn produced for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The agent replied directly; guardrails passed.
    Reply { text: String },
    /// A guardrail rejected the turn's input or output.
    Refusal { reason: String },
    /// Control transferred to another agent; the turn ended there.
    HandOff { from: String, to: String },
    /// A recoverable error was caught at the turn boundary.
    Failed { message: String },
}

/// One conversation: a current-agent pointer, a context store, and a history.
pub struct Session {
    id: String,
    agents: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
    oracle: Arc<dyn Oracle>,
    store: ContextStore,
    history: Vec<Message>,
    current: Arc<Agent>,
    config: SessionConfig,
}

impl Session {
    /// Creates a session positioned at the designated entry agent.
    ///
    /// Validates the handoff graph first; a dangling handoff reference or an
    /// unknown entry agent aborts startup here rather than surfacing
    /// mid-conversation.
    pub fn new(
        agents: Arc<AgentRegistry>,
        tools: Arc<ToolRegistry>,
        oracle: Arc<dyn Oracle>,
        entry: &str,
        config: SessionConfig,
    ) -> Result<Self> {
        agents.validate()?;
        let current = agents.resolve(entry)?;
        let id = uuid::Uuid::new_v4().to_string();
        let store = ContextStore::new(id.clone(), config.sink.clone());

        info!(session = %id, entry = %current.name(), "starting session");

        Ok(Self {
            id,
            agents,
            tools,
            oracle,
            store,
            history: Vec::new(),
            current,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the agent currently holding the conversation.
    pub fn current_agent(&self) -> &str {
        self.current.name()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Snapshot of the shared context.
    pub async fn context(&self) -> TaskContext {
        self.store.get().await
    }

    /// Runs one turn: one oracle consultation plus its resulting action
    /// (tool calls loop within the turn budget).
    ///
    /// Recoverable errors never escape: they are logged, emitted as
    /// `turn_failed` events, and surfaced as [`TurnOutcome::Failed`] with the
    /// session left in its current agent state.
    pub async fn run_turn(&mut self, input: impl Into<String>) -> TurnOutcome {
        let input = input.into();
        self.emit(
            EventKind::TurnStarted,
            json!({"agent": self.current.name(), "input": input}),
        );

        let timeout = self.config.turn_timeout;
        match tokio::time::timeout(timeout, self.execute_turn(&input)).await {
            Ok(Ok(outcome)) => {
                self.emit(
                    EventKind::TurnCompleted,
                    json!({"agent": self.current.name(), "outcome": outcome}),
                );
                outcome
            }
            Ok(Err(err)) => self.recover(err),
            Err(_) => self.recover(AgentError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    /// Ends the session by external signal, yielding the final context.
    pub fn end(self) -> TaskContext {
        info!(session = %self.id, "ending session");
        self.store.into_context()
    }

    fn recover(&self, err: AgentError) -> TurnOutcome {
        warn!(session = %self.id, agent = %self.current.name(), error = %err, "turn failed");
        self.emit(
            EventKind::TurnFailed,
            json!({"agent": self.current.name(), "error": err.to_string()}),
        );
        TurnOutcome::Failed {
            message: APOLOGY.to_string(),
        }
    }

    async fn execute_turn(&mut self, input: &str) -> Result<TurnOutcome> {
        let verdict = self.check_guardrails(input, Direction::Input).await?;
        if !verdict.passed {
            return Ok(TurnOutcome::Refusal {
                reason: verdict.reason.unwrap_or_else(|| "input rejected".to_string()),
            });
        }

        self.history.push(Message::user(input));

        let budget = self.config.turn_budget;
        let mut consultations = 0;
        loop {
            if consultations == budget {
                return Err(AgentError::TurnBudgetExceeded { budget });
            }
            consultations += 1;

            let action = self.consult_oracle().await?;
            debug!(session = %self.id, agent = %self.current.name(), ?action, "oracle proposed action");

            match action {
                Action::Reply(text) => {
                    let verdict = self.check_guardrails(&text, Direction::Output).await?;
                    if !verdict.passed {
                        return Ok(TurnOutcome::Refusal {
                            reason: verdict
                                .reason
                                .unwrap_or_else(|| "output rejected".to_string()),
                        });
                    }
                    self.history.push(Message::assistant(&text));
                    return Ok(TurnOutcome::Reply { text });
                }

                Action::CallTool(call) => {
                    self.history
                        .push(Message::assistant_with_tool_calls("", vec![call.clone()]));
                    let result = self
                        .tools
                        .invoke(&self.current, &call, &self.store, self.config.sink.as_ref())
                        .await?;
                    self.history.push(Message::tool(&result, &call.id));
                    // loop: consult the oracle again with the tool result in history
                }

                Action::HandOff { target, reason } => {
                    if !self.current.allows_handoff(&target) {
                        return Err(AgentError::UnauthorizedHandoff {
                            from: self.current.name().to_string(),
                            to: target,
                        });
                    }
                    let next = self.agents.resolve(&target)?;

                    let payload = match &reason {
                        Some(reason) => format!("Transferring to {}: {}", target, reason),
                        None => format!("Transferring to {}", target),
                    };
                    let verdict = self.check_guardrails(&payload, Direction::Output).await?;
                    if !verdict.passed {
                        return Ok(TurnOutcome::Refusal {
                            reason: verdict
                                .reason
                                .unwrap_or_else(|| "handoff rejected".to_string()),
                        });
                    }

                    let from = self.current.name().to_string();
                    info!(session = %self.id, from = %from, to = %target, "handoff");
                    self.emit(
                        EventKind::Handoff,
                        json!({"from": from, "to": target, "reason": reason}),
                    );
                    self.history.push(Message::system(format!(
                        "Conversation transferred from {} to {}",
                        from, target
                    )));
                    self.current = next;
                    return Ok(TurnOutcome::HandOff { from, to: target });
                }
            }
        }
    }

    async fn consult_oracle(&self) -> Result<Action> {
        let request = OracleRequest {
            instructions: self.current.instructions().to_string(),
            history: self.history.clone(),
            context: self.store.get().await,
            tools: self.tools.specs_for(&self.current),
            handoffs: self.current.handoffs().to_vec(),
        };
        self.oracle.decide(request).await
    }

    async fn check_guardrails(
        &self,
        payload: &str,
        direction: Direction,
    ) -> Result<GuardrailVerdict> {
        let verdict =
            GuardrailEvaluator::evaluate(self.current.guardrails(), payload, direction).await?;
        if !self.current.guardrails().is_empty() {
            self.emit(
                EventKind::GuardrailEvaluated,
                json!({
                    "agent": self.current.name(),
                    "direction": direction,
                    "passed": verdict.passed,
                    "reason": verdict.reason,
                }),
            );
        }
        Ok(verdict)
    }

    fn emit(&self, kind: EventKind, payload: serde_json::Value) {
        self.config.sink.emit(Event::new(&self.id, kind, payload));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("current_agent", &self.current.name())
            .field("history_len", &self.history.len())
            .finish()
    }
}
