//! Shared task context and the store that owns it
//!
//! A session owns exactly one [`TaskContext`], held by a [`ContextStore`] for
//! the session's lifetime. Tools are the only writers. Mutations are
//! serialized through the store's mutex and applied as whole-record swaps, so
//! observers always see a consistent before/after pair and a cancelled tool
//! call can never leave a partial write behind.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::events::{Event, EventKind, EventSink};

/// The mutable record shared across one conversation.
///
/// Created all-empty at session start, mutated by tool invocations, and
/// returned to the caller when the session ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TaskContext {
    /// Computes the field-level difference between two context snapshots.
    pub fn diff(before: &TaskContext, after: &TaskContext) -> ContextDiff {
        let mut changes = Vec::new();

        if before.task_id != after.task_id {
            changes.push(FieldChange {
                field: "task_id",
                before: json!(before.task_id),
                after: json!(after.task_id),
            });
        }
        if before.status != after.status {
            changes.push(FieldChange {
                field: "status",
                before: json!(before.status),
                after: json!(after.status),
            });
        }
        if before.assigned_to != after.assigned_to {
            changes.push(FieldChange {
                field: "assigned_to",
                before: json!(before.assigned_to),
                after: json!(after.assigned_to),
            });
        }
        if before.priority != after.priority {
            changes.push(FieldChange {
                field: "priority",
                before: json!(before.priority),
                after: json!(after.priority),
            });
        }
        if before.metadata != after.metadata {
            changes.push(FieldChange {
                field: "metadata",
                before: Value::Object(before.metadata.clone()),
                after: Value::Object(after.metadata.clone()),
            });
        }

        ContextDiff { changes }
    }
}

/// One changed field in a context mutation.
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: Value,
    pub after: Value,
}

/// The before/after difference produced by one mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ContextDiff {
    pub changes: Vec<FieldChange>,
}

impl ContextDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Owns the session's [`TaskContext`] and serializes access to it.
pub struct ContextStore {
    session_id: String,
    inner: Mutex<TaskContext>,
    sink: Arc<dyn EventSink>,
}

impl ContextStore {
    pub fn new(session_id: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            session_id: session_id.into(),
            inner: Mutex::new(TaskContext::default()),
            sink,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns a snapshot of the current context.
    pub async fn get(&self) -> TaskContext {
        self.inner.lock().await.clone()
    }

    /// Atomically replaces the stored context with the result of a pure
    /// transform, holding exclusive access for the duration.
    ///
    /// A failing transform is surfaced as [`AgentError::ToolExecution`] and
    /// leaves the stored context untouched. Observers are notified of the
    /// before/after diff of every effective mutation.
    pub async fn apply<F>(&self, mutation: F) -> Result<TaskContext>
    where
        F: FnOnce(TaskContext) -> Result<TaskContext>,
    {
        let mut guard = self.inner.lock().await;
        let before = guard.clone();
        let after = mutation(before.clone()).map_err(|err| match err {
            AgentError::ToolExecution { .. } => err,
            other => AgentError::ToolExecution {
                message: other.to_string(),
            },
        })?;

        let diff = TaskContext::diff(&before, &after);
        *guard = after.clone();
        drop(guard);

        if !diff.is_empty() {
            self.sink.emit(Event::new(
                &self.session_id,
                EventKind::ContextMutated,
                json!({
                    "before": before,
                    "after": after,
                    "changes": diff.changes,
                }),
            ));
        }

        Ok(after)
    }

    /// Tears down the store at session end, yielding the final context.
    pub fn into_context(self) -> TaskContext {
        self.inner.into_inner()
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use pretty_assertions::assert_eq;

    fn store_with_sink() -> (ContextStore, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let store = ContextStore::new("session-1", sink.clone());
        (store, sink)
    }

    #[tokio::test]
    async fn test_apply_replaces_and_notifies() {
        let (store, sink) = store_with_sink();

        let updated = store
            .apply(|mut ctx| {
                ctx.task_id = Some("TASK-123".to_string());
                ctx.status = Some("created".to_string());
                Ok(ctx)
            })
            .await
            .unwrap();

        assert_eq!(updated.task_id, Some("TASK-123".to_string()));
        assert_eq!(store.get().await, updated);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ContextMutated);
        let changed: Vec<&str> = events[0].payload["changes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["field"].as_str().unwrap())
            .collect();
        assert_eq!(changed, vec!["task_id", "status"]);
    }

    #[tokio::test]
    async fn test_failing_transform_leaves_context_untouched() {
        let (store, sink) = store_with_sink();
        store
            .apply(|mut ctx| {
                ctx.status = Some("created".to_string());
                Ok(ctx)
            })
            .await
            .unwrap();

        let err = store
            .apply(|_| {
                Err(AgentError::ToolExecution {
                    message: "boom".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution { .. }));
        assert_eq!(store.get().await.status, Some("created".to_string()));
        // only the successful mutation was observed
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn test_identity_transform_emits_nothing() {
        let (store, sink) = store_with_sink();
        store.apply(Ok).await.unwrap();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_diff_detects_metadata_changes() {
        let before = TaskContext::default();
        let mut after = before.clone();
        after.metadata.insert("title".to_string(), json!("Launch"));

        let diff = TaskContext::diff(&before, &after);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].field, "metadata");
        assert!(TaskContext::diff(&before, &before).is_empty());
    }

    #[tokio::test]
    async fn test_into_context_returns_final_state() {
        let (store, _sink) = store_with_sink();
        store
            .apply(|mut ctx| {
                ctx.priority = Some(2);
                Ok(ctx)
            })
            .await
            .unwrap();

        let final_ctx = store.into_context();
        assert_eq!(final_ctx.priority, Some(2));
    }
}
