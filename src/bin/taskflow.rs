//! Demo driver for the task-management wiring.
//!
//! Runs a scripted conversation through the triage graph: route to the
//! creation specialist, create a task, hand back to triage, route onward to
//! assignment and completion. Set `RUST_LOG=debug` to watch the runtime's
//! structured events.

use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use taskflow::{tasks, ScriptedOracle, Session, SessionConfig, TurnOutcome};

#[tokio::main]
async fn main() -> taskflow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let agents = Arc::new(tasks::task_management_agents()?);
    let tools = Arc::new(tasks::task_management_tools()?);

    let oracle = Arc::new(
        ScriptedOracle::new()
            .with_handoff("task_creation")
            .with_tool_call(
                "create_task",
                json!({
                    "title": "Write launch notes",
                    "description": "Draft the notes for the next release"
                }),
            )
            .with_reply("Done! I created the task for you (TASK-123).")
            .with_handoff("task_assignment")
            .with_tool_call("assign_task", json!({"user_id": "user-42"}))
            .with_reply("Assigned TASK-123 to user-42.")
            .with_handoff("task_completion")
            .with_tool_call("complete_task", json!({}))
            .with_reply("All wrapped up: TASK-123 is completed."),
    );

    let mut session = Session::new(
        agents,
        tools,
        oracle,
        tasks::ENTRY_AGENT,
        SessionConfig::default(),
    )?;

    let turns = [
        "I need to create a task called 'Write launch notes'",
        "Go ahead",
        "Now assign it to user-42",
        "Please do",
        "And mark it done",
        "Thanks!",
    ];

    for input in turns {
        println!("> {}", input);
        match session.run_turn(input).await {
            TurnOutcome::Reply { text } => println!("[{}] {}", session.current_agent(), text),
            TurnOutcome::Refusal { reason } => {
                println!("[{}] (refused: {})", session.current_agent(), reason)
            }
            TurnOutcome::HandOff { from, to } => println!("({} -> {})", from, to),
            TurnOutcome::Failed { message } => {
                println!("[{}] {}", session.current_agent(), message)
            }
        }
    }

    let context = session.end();
    println!(
        "\nFinal context:\n{}",
        serde_json::to_string_pretty(&context)?
    );

    Ok(())
}
