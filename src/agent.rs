//! Agent definitions
//!
//! An [`Agent`] is an immutable description of one participant in the
//! workflow: a name, instructions, the tools it may call, the agents it may
//! hand off to, and the guardrails checked on its turns. Tools and handoffs
//! are held as names and resolved through the registries at use time, so
//! agents can reference each other before both exist.

use std::sync::Arc;

use crate::guardrail::Guardrail;

/// A named participant with instructions, permitted tools, and permitted
/// handoff targets.
///
/// Built once at configuration time and never mutated afterwards; the
/// orchestrator shares agents behind `Arc`.
///
/// ## Example
///
/// ```rust
/// use taskflow::Agent;
///
/// let triage = Agent::new("triage", "Route each request to the right specialist.")
///     .with_handoff("task_creation")
///     .with_handoff("knowledge_base");
///
/// assert!(triage.allows_handoff("task_creation"));
/// assert!(!triage.allows_handoff("billing"));
/// ```
#[derive(Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    tools: Vec<String>,
    handoffs: Vec<String>,
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            handoffs: Vec::new(),
            guardrails: Vec::new(),
        }
    }

    /// Grants the agent access to a registered tool by name.
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    /// Declares another agent as a permitted handoff target.
    pub fn with_handoff(mut self, target: impl Into<String>) -> Self {
        self.handoffs.push(target.into());
        self
    }

    /// Declares several handoff targets at once.
    pub fn with_handoffs(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.handoffs.extend(targets.into_iter().map(Into::into));
        self
    }

    /// Attaches a guardrail. Declared order decides which failure reason is
    /// reported when several guardrails reject the same payload.
    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn handoffs(&self) -> &[String] {
        &self.handoffs
    }

    pub fn guardrails(&self) -> &[Arc<dyn Guardrail>] {
        &self.guardrails
    }

    pub fn allows_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    pub fn allows_handoff(&self, target: &str) -> bool {
        self.handoffs.iter().any(|h| h == target)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .field("handoffs", &self.handoffs)
            .field("guardrails_count", &self.guardrails.len())
            .finish()
    }
}
