//! Command Interpreter
//!
//! Turns an English command into a reply by letting the model pick one of
//! the advertised functions. The model's answer arrives in one of three
//! shapes, resolved by [`parse_intent`]:
//!
//! 1. an inline `<function=name{...}</function>` marker written into the
//!    text content (some providers do this instead of using the tool field),
//! 2. a structured function call,
//! 3. a plain reply.
//!
//! Inline calls are executed and answered locally. Structured calls are
//! executed and then summarised by a second model call.

use crate::config::{HomeConfig, LlmSettings};
use crate::devices::air_conditioner::{VALID_FAN_SPEEDS, VALID_MODES};
use crate::devices::lamp::VALID_COLORS;
use crate::devices::television::VALID_INPUTS;
use crate::functions::{Toolbox, function_definitions};
use crate::llm_client::{
    ChatCompletion, ChatMessage, ChatRequest, FunctionCall, FunctionDefinition, LLMClient,
};
use crate::memory::ConversationMemory;
use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::{error, info, instrument, warn};

/// Returned when the model produced nothing usable.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again.";

static INLINE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<function=(\w+)\s*>?\s*(.*?)\s*</function>")
        .expect("inline call pattern must compile")
});

/// A function call scraped out of the model's text content.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    InlineCall(InlineCall),
    /// An inline marker was present but its argument blob was not a JSON object.
    MalformedInline { name: String },
    Structured(FunctionCall),
    Direct(String),
}

/// Classifies a completion. The inline marker wins over the structured
/// field because a provider that writes the marker may also fill the field
/// with garbage.
pub fn parse_intent(completion: &ChatCompletion) -> Intent {
    if let Some(captures) = completion
        .content
        .as_deref()
        .and_then(|content| INLINE_CALL.captures(content))
    {
        let name = captures[1].to_string();
        let blob = captures.get(2).map_or("", |m| m.as_str()).trim();
        let blob = if blob.is_empty() { "{}" } else { blob };
        return match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(arguments)) => Intent::InlineCall(InlineCall { name, arguments }),
            Ok(_) | Err(_) => {
                warn!(function = %name, blob, "Could not parse inline function arguments");
                Intent::MalformedInline { name }
            }
        };
    }

    if let Some(call) = &completion.function_call {
        return Intent::Structured(call.clone());
    }

    Intent::Direct(completion.content.clone().unwrap_or_default())
}

/// Reply for an inline call, built from the raw function result.
pub fn synthesize_inline_reply(result: &str) -> String {
    if result.contains("turned on") {
        format!("✅ Done! {}", result)
    } else if result.contains("turned off") {
        format!("🔌 Done! {}", result)
    } else if result.contains("set to") {
        format!("⚙️ Done! {}", result)
    } else {
        result.to_string()
    }
}

fn parse_failure_reply(name: &str) -> String {
    format!(
        "I understood you want to use {}, but I couldn't parse the parameters. Please try rephrasing your command.",
        name
    )
}

/// The fixed instructions sent ahead of every conversation.
pub fn system_prompt(config: &HomeConfig) -> String {
    format!(
        r#"You are a helpful smart home assistant that controls devices and provides information.

AVAILABLE DEVICES:
💡 Lamps in: {lamps}
❄️ ACs in: {acs}
📺 TVs in: {tvs}

DEVICE CAPABILITIES:
- Lamps: turn on/off, set brightness (0-100%), change colors ({colors})
- ACs: turn on/off, set temperature (16-30°C), change modes ({modes}), set fan speed ({fans})
- TVs: turn on/off, change channels (1-999), set volume (0-100%), change inputs ({inputs})

AVAILABLE FUNCTIONS:
- control_device: Control any smart home device
- get_weather: Get current weather information
- get_news: Get latest news headlines
- get_time: Get current date and time
- get_device_status: Check device status

RESPONSE STYLE:
- Be conversational and helpful
- Use appropriate emojis
- Provide clear confirmations
- If user asks to adjust after weather, make smart suggestions

Always use the appropriate function for the user's request."#,
        lamps = config.lamps.join(", "),
        acs = config.acs.join(", "),
        tvs = config.tvs.join(", "),
        colors = VALID_COLORS.join(", "),
        modes = VALID_MODES.join(", "),
        fans = VALID_FAN_SPEEDS.join(", "),
        inputs = VALID_INPUTS.join(", "),
    )
}

pub struct CommandInterpreter {
    llm: Arc<dyn LLMClient>,
    settings: LlmSettings,
    system_prompt: String,
    functions: Vec<FunctionDefinition>,
    context_turns: usize,
}

impl CommandInterpreter {
    pub fn new(llm: Arc<dyn LLMClient>, config: &HomeConfig) -> Self {
        Self {
            llm,
            settings: config.llm.clone(),
            system_prompt: system_prompt(config),
            functions: function_definitions(config),
            context_turns: config.context_turns,
        }
    }

    /// Answers `command` (already English) and records the exchange in
    /// `memory`. Never fails and never returns an empty string.
    #[instrument(skip_all, fields(command = %command))]
    pub async fn process(
        &self,
        command: &str,
        memory: &mut ConversationMemory,
        toolbox: &Toolbox,
    ) -> String {
        let reply = match self.respond(command, memory, toolbox).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!("Model returned an empty reply");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Error processing command");
                format!("❌ Error processing command: {e:#}")
            }
        };

        memory.push(command, reply.clone());
        reply
    }

    async fn respond(
        &self,
        command: &str,
        memory: &ConversationMemory,
        toolbox: &Toolbox,
    ) -> Result<String> {
        let mut messages = vec![ChatMessage::System(self.system_prompt.clone())];
        messages.extend(memory.context_messages(self.context_turns));
        messages.push(ChatMessage::User(command.to_string()));

        let completion = self
            .llm
            .complete(ChatRequest {
                messages: messages.clone(),
                functions: self.functions.clone(),
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await?;

        match parse_intent(&completion) {
            Intent::InlineCall(call) => {
                info!(function = %call.name, "Executing inline function call");
                let result = toolbox.execute(&call.name, &call.arguments).await;
                Ok(synthesize_inline_reply(&result))
            }
            Intent::MalformedInline { name } => Ok(parse_failure_reply(&name)),
            Intent::Structured(call) => {
                let raw = if call.arguments.trim().is_empty() {
                    "{}"
                } else {
                    call.arguments.as_str()
                };
                let arguments: Map<String, Value> = serde_json::from_str(raw)
                    .with_context(|| format!("Invalid arguments for {}", call.name))?;
                let result = toolbox.execute(&call.name, &arguments).await;

                messages.push(ChatMessage::FunctionRequest(call.clone()));
                messages.push(ChatMessage::FunctionResult {
                    call_id: call.id,
                    content: result,
                });
                let follow_up = self
                    .llm
                    .complete(ChatRequest {
                        messages,
                        functions: vec![],
                        temperature: self.settings.follow_up_temperature,
                        max_tokens: self.settings.follow_up_max_tokens,
                    })
                    .await?;
                Ok(follow_up.content.unwrap_or_default())
            }
            Intent::Direct(reply) => Ok(reply),
        }
    }
}
