//! Task-management example wiring
//!
//! The stock configuration this runtime ships with: four stub tools, a
//! sensitive-information guardrail on every agent, and five agents (a triage
//! agent routing to four specialists, with the specialists able to hand the
//! conversation back and sideways along the create→assign→complete chain).
//! Loaded once at process start; the tools are stubs standing in for a real
//! task datastore.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::Result;
use crate::guardrail::{Guardrail, PatternBlockGuardrail};
use crate::registry::AgentRegistry;
use crate::tool::{FunctionTool, ToolRegistry};

/// The agent a new session starts on.
pub const ENTRY_AGENT: &str = "triage";

/// Task id issued by the stub datastore.
const STUB_TASK_ID: &str = "TASK-123";

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateTaskArgs {
    /// The title of the task
    title: String,
    /// A detailed description of the task
    description: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AssignTaskArgs {
    /// The ID of the user to assign the task to
    user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchArgs {
    /// The search query
    query: String,
}

fn create_task() -> FunctionTool {
    FunctionTool::typed::<CreateTaskArgs, _>(
        "create_task",
        "Create a new task in the system",
        |ctx, args| {
            // a real implementation would allocate the id in a datastore
            ctx.task_id = Some(STUB_TASK_ID.to_string());
            ctx.status = Some("created".to_string());
            ctx.metadata.insert("title".to_string(), json!(args.title));
            ctx.metadata
                .insert("description".to_string(), json!(args.description));
            Ok(format!("Task created with ID: {}", STUB_TASK_ID))
        },
    )
}

fn assign_task() -> FunctionTool {
    FunctionTool::typed::<AssignTaskArgs, _>(
        "assign_task",
        "Assign a task to a user",
        |ctx, args| {
            let Some(task_id) = ctx.task_id.clone() else {
                return Ok("No active task found in context".to_string());
            };
            ctx.assigned_to = Some(args.user_id.clone());
            ctx.status = Some("assigned".to_string());
            Ok(format!("Task {} assigned to user {}", task_id, args.user_id))
        },
    )
}

fn complete_task() -> FunctionTool {
    FunctionTool::new(
        "complete_task",
        "Mark a task as complete",
        json!({"type": "object", "properties": {}}),
        |ctx, _args| {
            let Some(task_id) = ctx.task_id.clone() else {
                return Ok("No active task found in context".to_string());
            };
            // idempotent: completing a completed task overwrites in place
            ctx.status = Some("completed".to_string());
            Ok(format!("Task {} marked as completed", task_id))
        },
    )
}

fn search_knowledge_base() -> FunctionTool {
    FunctionTool::typed::<SearchArgs, _>(
        "search_knowledge_base",
        "Search the knowledge base for information",
        |_ctx, args| {
            Ok(format!(
                "Results for query '{}': Found 3 relevant articles",
                args.query
            ))
        },
    )
    .read_only()
}

/// The guardrail attached to every task-management agent.
pub fn sensitive_info_guardrail() -> Arc<dyn Guardrail> {
    Arc::new(
        PatternBlockGuardrail::new(
            "sensitive_info",
            ["password", "ssn", "social security", "credit card"],
        )
        .with_description("Prevents exposure of sensitive information in responses"),
    )
}

/// Registers the four task-management tools.
pub fn task_management_tools() -> Result<ToolRegistry> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(create_task()))?;
    tools.register(Arc::new(assign_task()))?;
    tools.register(Arc::new(complete_task()))?;
    tools.register(Arc::new(search_knowledge_base()))?;
    Ok(tools)
}

/// Defines the five task-management agents and their handoff graph.
///
/// The triage agent is defined first and references specialists that do not
/// exist yet; the registry resolves those lazily, so declaration order does
/// not matter.
pub fn task_management_agents() -> Result<AgentRegistry> {
    let guardrail = sensitive_info_guardrail();
    let mut agents = AgentRegistry::new();

    agents.define(
        Agent::new(
            ENTRY_AGENT,
            "You are a task management triage agent. You direct users to the \
             appropriate specialized agent.\n\
             - For creating tasks, hand off to the task_creation agent\n\
             - For assigning tasks, hand off to the task_assignment agent\n\
             - For completing tasks, hand off to the task_completion agent\n\
             - For knowledge base queries, hand off to the knowledge_base agent\n\
             Ask clarifying questions if the user's request is ambiguous.",
        )
        .with_handoffs([
            "task_creation",
            "task_assignment",
            "task_completion",
            "knowledge_base",
        ])
        .with_guardrail(guardrail.clone()),
    )?;

    agents.define(
        Agent::new(
            "task_creation",
            "You are a task creation agent. You help users create new tasks.\n\
             1. Ask for a title and description if not provided\n\
             2. Use the create_task tool to create the task\n\
             3. Confirm to the user that the task was created",
        )
        .with_tool("create_task")
        .with_handoffs([ENTRY_AGENT, "task_assignment"])
        .with_guardrail(guardrail.clone()),
    )?;

    agents.define(
        Agent::new(
            "task_assignment",
            "You are a task assignment agent. You help users assign tasks to \
             team members.\n\
             1. If there is no active task in context, ask which task to assign\n\
             2. Ask for the user ID to assign the task to if not provided\n\
             3. Use the assign_task tool to assign the task\n\
             4. Confirm to the user that the task was assigned",
        )
        .with_tool("assign_task")
        .with_handoffs([ENTRY_AGENT, "task_completion"])
        .with_guardrail(guardrail.clone()),
    )?;

    agents.define(
        Agent::new(
            "task_completion",
            "You are a task completion agent. You help users mark tasks as \
             complete.\n\
             1. If there is no active task in context, ask which task to complete\n\
             2. Use the complete_task tool to mark the task as completed\n\
             3. Confirm to the user that the task was marked as completed",
        )
        .with_tool("complete_task")
        .with_handoff(ENTRY_AGENT)
        .with_guardrail(guardrail.clone()),
    )?;

    agents.define(
        Agent::new(
            "knowledge_base",
            "You are a knowledge base agent. You help users find information.\n\
             1. Extract the search query from the user's request\n\
             2. Use the search_knowledge_base tool to find relevant information\n\
             3. Present the results to the user in a clear format",
        )
        .with_tool("search_knowledge_base")
        .with_handoff(ENTRY_AGENT)
        .with_guardrail(guardrail),
    )?;

    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TaskContext;
    use crate::tool::Tool;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_task_sets_context() {
        let tool = create_task();
        let mut ctx = TaskContext::default();
        let result = tool
            .call(
                &mut ctx,
                json!({"title": "Write notes", "description": "Launch notes"}),
            )
            .await
            .unwrap();

        assert_eq!(result, "Task created with ID: TASK-123");
        assert_eq!(ctx.task_id, Some("TASK-123".to_string()));
        assert_eq!(ctx.status, Some("created".to_string()));
        assert_eq!(ctx.metadata["title"], "Write notes");
    }

    #[tokio::test]
    async fn test_assign_task_requires_active_task() {
        let tool = assign_task();
        let mut ctx = TaskContext::default();

        let result = tool
            .call(&mut ctx, json!({"user_id": "user-42"}))
            .await
            .unwrap();
        assert_eq!(result, "No active task found in context");
        assert_eq!(ctx, TaskContext::default());

        ctx.task_id = Some("TASK-123".to_string());
        let result = tool
            .call(&mut ctx, json!({"user_id": "user-42"}))
            .await
            .unwrap();
        assert_eq!(result, "Task TASK-123 assigned to user user-42");
        assert_eq!(ctx.assigned_to, Some("user-42".to_string()));
        assert_eq!(ctx.status, Some("assigned".to_string()));
    }

    #[tokio::test]
    async fn test_complete_task_is_idempotent() {
        let tool = complete_task();
        let mut ctx = TaskContext {
            task_id: Some("TASK-123".to_string()),
            status: Some("completed".to_string()),
            ..TaskContext::default()
        };

        let result = tool.call(&mut ctx, json!({})).await.unwrap();
        assert_eq!(result, "Task TASK-123 marked as completed");
        assert_eq!(ctx.status, Some("completed".to_string()));
    }

    #[tokio::test]
    async fn test_search_is_pure() {
        let tool = search_knowledge_base();
        assert!(!tool.mutates_context());

        let mut ctx = TaskContext::default();
        let result = tool
            .call(&mut ctx, json!({"query": "onboarding"}))
            .await
            .unwrap();
        assert_eq!(
            result,
            "Results for query 'onboarding': Found 3 relevant articles"
        );
        assert_eq!(ctx, TaskContext::default());
    }

    #[test]
    fn test_wiring_is_consistent() {
        let agents = task_management_agents().unwrap();
        let tools = task_management_tools().unwrap();

        agents.validate().unwrap();
        assert_eq!(agents.len(), 5);
        assert_eq!(tools.len(), 4);

        let triage = agents.resolve(ENTRY_AGENT).unwrap();
        assert_eq!(triage.handoffs().len(), 4);
        assert!(triage.tools().is_empty());

        // every tool an agent declares is registered
        for name in ["task_creation", "task_assignment", "task_completion", "knowledge_base"] {
            let agent = agents.resolve(name).unwrap();
            for tool in agent.tools() {
                assert!(tools.get(tool).is_some(), "unregistered tool {tool}");
            }
            assert!(agent.allows_handoff(ENTRY_AGENT));
        }
    }
}
