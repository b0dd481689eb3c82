//! Tool system: registry, invocation protocol, and argument validation
//!
//! Tools are named, typed functions that may read and mutate the shared task
//! context. The registry owns the global tool set; invocation authorizes
//! against the calling agent's declared allow-list, validates raw arguments
//! against the tool's schema, and applies context changes through the store
//! only after the handler returns successfully.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::agent::Agent;
use crate::context::{ContextStore, TaskContext};
use crate::error::{AgentError, Result};
use crate::events::{Event, EventKind, EventSink};
use crate::items::ToolCall;

/// Trait for all tools invocable by agents.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Name of the tool, used for lookup and authorization.
    fn name(&self) -> &str;

    /// Human-readable description advertised to the oracle.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Whether this tool writes to the shared context. Pure tools skip the
    /// context-store apply entirely.
    fn mutates_context(&self) -> bool {
        true
    }

    /// Executes the tool against a working copy of the context.
    async fn call(&self, context: &mut TaskContext, arguments: Value) -> Result<String>;
}

/// Description of a tool as presented to the oracle.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A function-backed tool.
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters_schema: Value,
    mutates_context: bool,
    handler: Arc<dyn Fn(&mut TaskContext, Value) -> Result<String> + Send + Sync>,
}

impl Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("mutates_context", &self.mutates_context)
            .finish()
    }
}

impl FunctionTool {
    /// Creates a tool from an explicit JSON parameter schema and a handler.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut TaskContext, Value) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            mutates_context: true,
            handler: Arc::new(handler),
        }
    }

    /// Creates a tool whose parameter schema is derived from the argument type.
    pub fn typed<A, F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + JsonSchema,
        F: Fn(&mut TaskContext, A) -> Result<String> + Send + Sync + 'static,
    {
        let name = name.into();
        let schema = serde_json::to_value(schemars::schema_for!(A)).unwrap_or_else(|_| {
            json!({
                "type": "object",
                "properties": {}
            })
        });

        let tool_name = name.clone();
        let wrapped = move |ctx: &mut TaskContext, args: Value| -> Result<String> {
            let typed: A =
                serde_json::from_value(args).map_err(|err| AgentError::InvalidArguments {
                    tool: tool_name.clone(),
                    message: err.to_string(),
                })?;
            handler(ctx, typed)
        };

        Self {
            name,
            description: description.into(),
            parameters_schema: schema,
            mutates_context: true,
            handler: Arc::new(wrapped),
        }
    }

    /// Marks the tool as pure: it may read the context but never writes it.
    pub fn read_only(mut self) -> Self {
        self.mutates_context = false;
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    fn mutates_context(&self) -> bool {
        self.mutates_context
    }

    async fn call(&self, context: &mut TaskContext, arguments: Value) -> Result<String> {
        (self.handler)(context, arguments)
    }
}

/// Validates raw arguments against a JSON-schema-shaped parameter declaration.
///
/// Checks required fields and primitive types; unknown fields pass through.
pub fn validate_arguments(tool: &str, schema: &Value, arguments: &Value) -> Result<()> {
    let empty = serde_json::Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(AgentError::InvalidArguments {
                tool: tool.to_string(),
                message: "arguments must be a JSON object".to_string(),
            })
        }
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(field) {
                return Err(AgentError::InvalidArguments {
                    tool: tool.to_string(),
                    message: format!("missing required field '{}'", field),
                });
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, value) in args {
            let Some(expected) = properties
                .get(field)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "object" => value.is_object(),
                "array" => value.is_array(),
                _ => true,
            };
            if !matches {
                return Err(AgentError::InvalidArguments {
                    tool: tool.to_string(),
                    message: format!("field '{}' must be of type {}", field, expected),
                });
            }
        }
    }

    Ok(())
}

/// Global registry of tools, populated once at setup time.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, failing on a name collision.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(AgentError::DuplicateTool { name });
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Builds the tool specs visible to one agent, in the agent's declared order.
    pub fn specs_for(&self, agent: &Agent) -> Vec<ToolSpec> {
        agent
            .tools()
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Executes a tool call on behalf of an agent.
    ///
    /// Authorization runs against the calling agent's declared tool set before
    /// the global lookup, so an agent can never reach a tool it does not
    /// carry. The handler runs against a working copy of the context; the
    /// store swap happens only after the handler returns, keeping mutations
    /// all-or-nothing.
    pub async fn invoke(
        &self,
        agent: &Agent,
        call: &ToolCall,
        store: &ContextStore,
        sink: &dyn EventSink,
    ) -> Result<String> {
        if !agent.allows_tool(&call.name) {
            return Err(AgentError::UnknownTool {
                name: call.name.clone(),
                agent: agent.name().to_string(),
            });
        }
        let tool = self.get(&call.name).ok_or_else(|| AgentError::UnknownTool {
            name: call.name.clone(),
            agent: agent.name().to_string(),
        })?;

        validate_arguments(&call.name, &tool.parameters_schema(), &call.arguments)?;

        let before = store.get().await;
        let mut working = before.clone();
        let result = tool.call(&mut working, call.arguments.clone()).await?;

        let after = if tool.mutates_context() && working != before {
            store.apply(move |_| Ok(working)).await?
        } else {
            before.clone()
        };

        sink.emit(Event::new(
            store.session_id(),
            EventKind::ToolInvoked,
            json!({
                "tool": call.name,
                "args": call.arguments,
                "context_before": before,
                "context_after": after,
                "result": result,
            }),
        ));

        Ok(result)
    }
}
