//! OpenAI-backed oracle
//!
//! Wraps the async-openai crate to turn chat completions into orchestration
//! [`Action`]s. The agent's tools are advertised as function tools; its
//! handoff targets are advertised as synthetic `transfer_to_<agent>` function
//! tools, and a call to one of those is mapped back to a handoff.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::items::{Message, Role, ToolCall};
use crate::oracle::{Action, Oracle, OracleRequest};

/// Function-name prefix under which handoff targets are advertised.
const HANDOFF_PREFIX: &str = "transfer_to_";

/// Oracle implementation backed by the OpenAI chat-completions API.
pub struct OpenAIOracle {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAIOracle {
    /// Creates a new oracle using credentials from the environment.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Creates an oracle with a custom client.
    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Builds the system message priming the model with the agent's
    /// instructions and the current context snapshot.
    fn system_message(&self, request: &OracleRequest) -> Result<Message> {
        let mut content = request.instructions.clone();
        let snapshot = serde_json::to_string_pretty(&request.context)?;
        content.push_str("\n\nCurrent task context:\n");
        content.push_str(&snapshot);

        if !request.handoffs.is_empty() {
            content.push_str("\n\nYou can transfer the conversation to the following agents:\n");
            for target in &request.handoffs {
                content.push_str(&format!("- {}\n", target));
            }
        }

        Ok(Message::system(content))
    }

    /// Converts a runtime message to OpenAI's request format.
    fn convert_message(&self, msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .unwrap()
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .unwrap()
                .into(),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                builder.content(msg.content.clone());

                if let Some(tool_calls) = &msg.tool_calls {
                    let converted: Vec<_> = tool_calls
                        .iter()
                        .map(|tc| async_openai::types::ChatCompletionMessageToolCall {
                            id: tc.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: async_openai::types::FunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments.to_string(),
                            },
                        })
                        .collect();
                    builder.tool_calls(converted);
                }

                builder.build().unwrap().into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(msg.content.clone())
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .build()
                .unwrap()
                .into(),
        }
    }

    /// Advertises the agent's tools plus its handoff targets as function tools.
    fn convert_tools(&self, request: &OracleRequest) -> Vec<ChatCompletionTool> {
        let mut tools: Vec<ChatCompletionTool> = request
            .tools
            .iter()
            .map(|spec| {
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(
                        FunctionObjectArgs::default()
                            .name(&spec.name)
                            .description(&spec.description)
                            .parameters(spec.parameters.clone())
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap()
            })
            .collect();

        for target in &request.handoffs {
            tools.push(
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(
                        FunctionObjectArgs::default()
                            .name(format!("{}{}", HANDOFF_PREFIX, target))
                            .description(format!(
                                "Transfer the conversation to the {} agent",
                                target
                            ))
                            .parameters(serde_json::json!({
                                "type": "object",
                                "properties": {
                                    "reason": {
                                        "type": "string",
                                        "description": "Reason for the transfer"
                                    }
                                }
                            }))
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            );
        }

        tools
    }
}

#[async_trait]
impl Oracle for OpenAIOracle {
    async fn decide(&self, request: OracleRequest) -> Result<Action> {
        let mut messages = vec![self.system_message(&request)?];
        messages.extend(request.history.iter().cloned());

        let converted: Vec<ChatCompletionRequestMessage> = messages
            .iter()
            .map(|msg| self.convert_message(msg))
            .collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(converted);

        let tools = self.convert_tools(&request);
        if !tools.is_empty() {
            builder.tools(tools);
        }
        if let Some(temperature) = self.temperature {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder.max_tokens(max_tokens);
        }

        let response = self.client.chat().create(builder.build()?).await?;
        let choice = response
            .choices
            .first()
            .ok_or_else(|| AgentError::Oracle {
                message: "no choices in completion response".to_string(),
            })?;

        if let Some(tool_calls) = &choice.message.tool_calls {
            if let Some(tc) = tool_calls.first() {
                let arguments: Value =
                    serde_json::from_str(&tc.function.arguments).unwrap_or(Value::Null);

                if let Some(target) = tc.function.name.strip_prefix(HANDOFF_PREFIX) {
                    if request.handoffs.iter().any(|h| h == target) {
                        let reason = arguments
                            .get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        return Ok(Action::HandOff {
                            target: target.to_string(),
                            reason,
                        });
                    }
                }

                return Ok(Action::CallTool(ToolCall {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    arguments,
                }));
            }
        }

        match &choice.message.content {
            Some(content) if !content.is_empty() => Ok(Action::Reply(content.clone())),
            _ => Err(AgentError::Oracle {
                message: "completion carried neither content nor tool calls".to_string(),
            }),
        }
    }
}
