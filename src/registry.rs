//! Agent registry: a name-indexed directed graph of agents
//!
//! The handoff graph may contain cycles (triage↔specialists), so the
//! registry is a plain name-indexed map, not a tree. Handoff references are
//! resolved lazily at routing time, which lets agents declare each other
//! before both exist; [`AgentRegistry::validate`] is run once at session
//! construction to catch dangling references early.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};

/// Registry of all defined agents, keyed by name.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an agent, failing on a name collision.
    ///
    /// Handoff targets are not checked here: forward references are legal
    /// until [`validate`](Self::validate) runs.
    pub fn define(&mut self, agent: Agent) -> Result<Arc<Agent>> {
        let name = agent.name().to_string();
        if self.agents.contains_key(&name) {
            return Err(AgentError::DuplicateAgent { name });
        }
        let handle = Arc::new(agent);
        self.agents.insert(name, handle.clone());
        Ok(handle)
    }

    /// Resolves an agent by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Agent>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::UnknownAgent {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Checks that every declared handoff resolves to a defined agent.
    ///
    /// Called once after wiring is complete; a failure here is fatal to
    /// startup.
    pub fn validate(&self) -> Result<()> {
        for agent in self.agents.values() {
            for target in agent.handoffs() {
                if !self.agents.contains_key(target) {
                    return Err(AgentError::InvalidHandoffTarget {
                        agent: agent.name().to_string(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_resolve() {
        let mut registry = AgentRegistry::new();
        registry.define(Agent::new("triage", "Route requests")).unwrap();

        let agent = registry.resolve("triage").unwrap();
        assert_eq!(agent.name(), "triage");

        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, AgentError::UnknownAgent { name } if name == "missing"));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut registry = AgentRegistry::new();
        registry.define(Agent::new("triage", "a")).unwrap();
        let err = registry.define(Agent::new("triage", "b")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateAgent { name } if name == "triage"));
    }

    #[test]
    fn test_forward_references_resolve_after_late_definition() {
        let mut registry = AgentRegistry::new();
        // triage references a specialist that does not exist yet
        registry
            .define(Agent::new("triage", "Route requests").with_handoff("task_creation"))
            .unwrap();
        assert!(registry.validate().is_err());

        registry
            .define(Agent::new("task_creation", "Create tasks").with_handoff("triage"))
            .unwrap();
        registry.validate().unwrap();
    }

    #[test]
    fn test_validate_names_the_dangling_edge() {
        let mut registry = AgentRegistry::new();
        registry
            .define(Agent::new("triage", "Route requests").with_handoff("ghost"))
            .unwrap();

        let err = registry.validate().unwrap_err();
        match err {
            AgentError::InvalidHandoffTarget { agent, target } => {
                assert_eq!(agent, "triage");
                assert_eq!(target, "ghost");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycles_are_permitted() {
        let mut registry = AgentRegistry::new();
        registry
            .define(Agent::new("a", "").with_handoff("b"))
            .unwrap();
        registry
            .define(Agent::new("b", "").with_handoff("a"))
            .unwrap();
        registry.validate().unwrap();
    }
}
