//! Guardrails: stateless pass/fail checks on turn input and output
//!
//! Guardrails attached to the active agent are evaluated against a text
//! payload before it is surfaced (agent output, synthesized handoff payloads)
//! or processed (user input). The policy is AND: all must pass. A failed
//! guardrail is a verdict, never an error; the orchestrator turns it into a
//! refusal rather than a crash.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Whether a payload is flowing into or out of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

/// The outcome of evaluating one guardrail, or the aggregate of several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub passed: bool,
    pub reason: Option<String>,
}

impl GuardrailVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// A named, stateless check applied to a text payload.
#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn check(&self, payload: &str, direction: Direction) -> Result<GuardrailVerdict>;
}

/// Evaluates a set of guardrails against one payload.
pub struct GuardrailEvaluator;

impl GuardrailEvaluator {
    /// Runs every guardrail concurrently and aggregates with AND.
    ///
    /// When guardrails disagree, the reported failure is the first failing
    /// guardrail in declared order, regardless of completion order.
    pub async fn evaluate(
        guardrails: &[Arc<dyn Guardrail>],
        payload: &str,
        direction: Direction,
    ) -> Result<GuardrailVerdict> {
        if guardrails.is_empty() {
            return Ok(GuardrailVerdict::pass());
        }

        let checks = guardrails
            .iter()
            .map(|guardrail| guardrail.check(payload, direction));
        let results = join_all(checks).await;

        for (guardrail, result) in guardrails.iter().zip(results) {
            let verdict = result?;
            if !verdict.passed {
                let reason = verdict
                    .reason
                    .unwrap_or_else(|| guardrail.name().to_string());
                return Ok(GuardrailVerdict::fail(reason));
            }
        }

        Ok(GuardrailVerdict::pass())
    }
}

/// A guardrail that blocks payloads containing any of a set of patterns.
///
/// Matching is case-insensitive. Used by the task-management wiring to keep
/// sensitive information out of agent responses.
#[derive(Debug, Clone)]
pub struct PatternBlockGuardrail {
    name: String,
    description: String,
    patterns: Vec<String>,
}

impl PatternBlockGuardrail {
    pub fn new(
        name: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Guardrail for PatternBlockGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn check(&self, payload: &str, direction: Direction) -> Result<GuardrailVerdict> {
        let lowered = payload.to_lowercase();
        for pattern in &self.patterns {
            if lowered.contains(pattern) {
                let side = match direction {
                    Direction::Input => "input",
                    Direction::Output => "output",
                };
                return Ok(GuardrailVerdict::fail(format!(
                    "{} contains blocked pattern: {}",
                    side, pattern
                )));
            }
        }
        Ok(GuardrailVerdict::pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedGuardrail {
        name: String,
        verdict: GuardrailVerdict,
        delay_ms: u64,
    }

    #[async_trait]
    impl Guardrail for FixedGuardrail {
        fn name(&self) -> &str {
            &self.name
        }

        async fn check(&self, _payload: &str, _direction: Direction) -> Result<GuardrailVerdict> {
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            Ok(self.verdict.clone())
        }
    }

    fn fixed(name: &str, passed: bool, delay_ms: u64) -> Arc<dyn Guardrail> {
        Arc::new(FixedGuardrail {
            name: name.to_string(),
            verdict: if passed {
                GuardrailVerdict::pass()
            } else {
                GuardrailVerdict::fail(format!("{} rejected", name))
            },
            delay_ms,
        })
    }

    #[tokio::test]
    async fn test_empty_set_passes() {
        let verdict = GuardrailEvaluator::evaluate(&[], "anything", Direction::Output)
            .await
            .unwrap();
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn test_and_policy_reports_failing_reason() {
        let guards = vec![fixed("g1", true, 0), fixed("g2", false, 0)];
        let verdict = GuardrailEvaluator::evaluate(&guards, "payload", Direction::Output)
            .await
            .unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, Some("g2 rejected".to_string()));
    }

    #[tokio::test]
    async fn test_declared_order_wins_ties() {
        // g2 fails instantly, g1 fails slowly; the reported reason must still
        // be g1's because it is declared first.
        let guards = vec![fixed("g1", false, 30), fixed("g2", false, 0)];
        let verdict = GuardrailEvaluator::evaluate(&guards, "payload", Direction::Output)
            .await
            .unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, Some("g1 rejected".to_string()));
    }

    #[tokio::test]
    async fn test_pattern_block_guardrail() {
        let guard = PatternBlockGuardrail::new("sensitive_info", ["password", "ssn"])
            .with_description("Prevents exposure of sensitive information");

        let clean = guard.check("All good here", Direction::Output).await.unwrap();
        assert!(clean.passed);

        let blocked = guard
            .check("Your PASSWORD is hunter2", Direction::Output)
            .await
            .unwrap();
        assert!(!blocked.passed);
        assert_eq!(
            blocked.reason,
            Some("output contains blocked pattern: password".to_string())
        );

        let blocked_input = guard
            .check("my ssn is 123-45-6789", Direction::Input)
            .await
            .unwrap();
        assert_eq!(
            blocked_input.reason,
            Some("input contains blocked pattern: ssn".to_string())
        );
    }
}
