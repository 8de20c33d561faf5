use crate::config::LlmSettings;
use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolChoiceOption,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
        FunctionObjectArgs,
    },
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// The two languages the assistant speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Persian,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Persian => "fa",
        }
    }
}

/// A function invocation requested by the model through the structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Provider-assigned call id, echoed back with the function result.
    pub id: String,
    pub name: String,
    /// Raw JSON argument object as emitted by the model.
    pub arguments: String,
}

/// One entry of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
    /// The assistant turn that requested a function.
    FunctionRequest(FunctionCall),
    /// The string result of executing a requested function.
    FunctionResult { call_id: String, content: String },
}

/// A callable operation advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Functions the model may call; empty disables function calling.
    pub functions: Vec<FunctionDefinition>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The model's answer: free text, a structured function call, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub function_call: Option<FunctionCall>,
}

/// A generic client for interacting with an LLM.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a single, non-streaming chat completion call.
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion>;

    /// Translates `text` into `target`, returning only the translation.
    async fn translate(&self, text: &str, target: Language) -> Result<String>;
}

const TO_PERSIAN_PROMPT: &str = r#"You are a translator. Translate the English text to natural, conversational Persian.

Examples:
"Kitchen lamp turned on" → "چراغ آشپزخانه روشن شد"
"AC temperature set to 22 degrees" → "دمای کولر روی ۲۲ درجه تنظیم شد"
"Current weather in Tehran is sunny, 25°C" → "هوای فعلی تهران آفتابی است، ۲۵ درجه سانتی گراد"

IMPORTANT: Output ONLY the Persian translation."#;

const TO_ENGLISH_PROMPT: &str = r#"You are a translator. Translate the Persian text to natural English.

Examples:
"چراغ آشپزخانه را روشن کن" → "turn on the kitchen lamp"
"کولر را روی ۲۲ درجه تنظیم کن" → "set AC to 22 degrees"
"هوای تهران چطوره؟" → "what's the weather in Tehran"

IMPORTANT: Output ONLY the English translation."#;

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    settings: LlmSettings,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the provider.
    /// * `settings` - Model, sampling and timeout settings.
    pub fn new(config: OpenAIConfig, settings: LlmSettings) -> Self {
        Self {
            client: Client::with_config(config),
            settings,
        }
    }

    /// Convenience constructor using `settings.api_base`.
    pub fn with_api_key(api_key: &str, settings: LlmSettings) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&settings.api_base);
        Self::new(config, settings)
    }

    async fn send(&self, request: ChatRequest) -> Result<CreateChatCompletionResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;
        let tools = request
            .functions
            .iter()
            .map(to_tool)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.settings.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);
        if !tools.is_empty() {
            builder
                .tools(tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let api_request = builder.build()?;

        let budget = self.settings.timeout();
        tokio::time::timeout(budget, self.client.chat().create(api_request))
            .await
            .map_err(|_| anyhow!("LLM request timed out after {}s", budget.as_secs()))?
            .map_err(anyhow::Error::from)
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        let response = self.send(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("No response choice from LLM")?;

        let function_call = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| FunctionCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            });
        debug!(
            has_content = choice.message.content.is_some(),
            function = function_call.as_ref().map(|c| c.name.as_str()),
            "LLM completion received"
        );

        Ok(ChatCompletion {
            content: choice.message.content,
            function_call,
        })
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        let prompt = match target {
            Language::Persian => TO_PERSIAN_PROMPT,
            Language::English => TO_ENGLISH_PROMPT,
        };
        let completion = self
            .complete(ChatRequest {
                messages: vec![
                    ChatMessage::System(prompt.to_string()),
                    ChatMessage::User(text.to_string()),
                ],
                functions: vec![],
                temperature: self.settings.temperature,
                max_tokens: self.settings.translation_max_tokens,
            })
            .await?;

        let translated = completion
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .context("Translation returned no content")?;
        Ok(translated)
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let converted = match message {
        ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.as_str())
            .build()?
            .into(),
        ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
            .content(content.as_str())
            .build()?
            .into(),
        ChatMessage::Assistant(content) => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content.as_str())
            .build()?
            .into(),
        ChatMessage::FunctionRequest(call) => ChatCompletionRequestAssistantMessageArgs::default()
            .tool_calls(vec![ChatCompletionMessageToolCall {
                id: call.id.clone(),
                r#type: ChatCompletionToolType::Function,
                function: async_openai::types::FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            }])
            .build()?
            .into(),
        ChatMessage::FunctionResult { call_id, content } => {
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id.as_str())
                .content(content.as_str())
                .build()?
                .into()
        }
    };
    Ok(converted)
}

fn to_tool(definition: &FunctionDefinition) -> Result<ChatCompletionTool> {
    Ok(ChatCompletionToolArgs::default()
        .function(
            FunctionObjectArgs::default()
                .name(definition.name.as_str())
                .description(definition.description.as_str())
                .parameters(definition.parameters.clone())
                .build()?,
        )
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::Persian.code(), "fa");
    }

    #[test]
    fn test_function_request_maps_to_assistant_tool_call() {
        let message = ChatMessage::FunctionRequest(FunctionCall {
            id: "call_1".to_string(),
            name: "get_time".to_string(),
            arguments: "{}".to_string(),
        });
        let converted = to_request_message(&message).unwrap();
        match converted {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                let calls = assistant.tool_calls.expect("tool calls should be set");
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "get_time");
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
    }

    #[test]
    fn test_function_result_maps_to_tool_message() {
        let message = ChatMessage::FunctionResult {
            call_id: "call_1".to_string(),
            content: "🕒 Current time".to_string(),
        };
        let converted = to_request_message(&message).unwrap();
        match converted {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "call_1"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_to_tool_carries_schema() {
        let tool = to_tool(&FunctionDefinition {
            name: "get_time".to_string(),
            description: "Get current date and time".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        })
        .unwrap();
        assert_eq!(tool.function.name, "get_time");
        assert_eq!(
            tool.function.parameters,
            Some(json!({"type": "object", "properties": {}}))
        );
    }
}
