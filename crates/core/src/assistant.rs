//! Smart Home Assistant
//!
//! The façade consumers talk to. It owns the device registry, the
//! per-session conversation memories and the language pipeline:
//! detect → normalize (Persian only) → interpret → localize (Persian only).

use crate::config::{Config, HomeConfig};
use crate::devices::{DeviceError, DeviceRegistry, DeviceSnapshot, DeviceType};
use crate::functions::Toolbox;
use crate::interpreter::CommandInterpreter;
use crate::language;
use crate::llm_client::{ChatMessage, ChatRequest, LLMClient, Language, OpenAICompatibleClient};
use crate::localizer::ResponseLocalizer;
use crate::memory::{ConversationTurn, DEFAULT_SESSION, SessionStore};
use crate::normalizer::CommandNormalizer;
use crate::services::{
    LocalTimeService, NewsApiService, NewsService, OpenWeatherMapService, TimeService,
    WeatherService,
};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

const INTERPRETER_ERROR_PREFIX: &str = "❌ Error processing command: ";
const CONNECTED: &str = "✅ Connected";
const NOT_CONFIGURED: &str = "❌ Not configured";
const AVAILABLE: &str = "✅ Available";
const WORKING: &str = "✅ Working";

#[derive(Debug, Clone, Serialize)]
pub struct DeviceCounts {
    pub lamps: usize,
    pub acs: usize,
    pub tvs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceFlags {
    pub llm: String,
    pub weather: String,
    pub news: String,
    pub persian: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationSummary {
    pub default_city: String,
    pub model: String,
    pub memory_capacity: usize,
}

/// Snapshot of the whole system for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub total_devices: usize,
    pub powered_on: usize,
    pub device_types: DeviceCounts,
    pub services: ServiceFlags,
    pub languages: Vec<String>,
    pub configuration: ConfigurationSummary,
}

/// Sample commands in both languages.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleCommands {
    pub english: Vec<&'static str>,
    pub persian: Vec<&'static str>,
}

pub struct SmartHomeAssistant {
    config: HomeConfig,
    llm: Arc<dyn LLMClient>,
    toolbox: Toolbox,
    interpreter: CommandInterpreter,
    normalizer: CommandNormalizer,
    localizer: ResponseLocalizer,
    sessions: SessionStore,
}

impl SmartHomeAssistant {
    pub fn new(
        config: HomeConfig,
        llm: Arc<dyn LLMClient>,
        weather: Option<Arc<dyn WeatherService>>,
        news: Option<Arc<dyn NewsService>>,
        clock: Arc<dyn TimeService>,
    ) -> Self {
        let devices = Arc::new(Mutex::new(DeviceRegistry::new(&config)));
        let toolbox = Toolbox {
            devices,
            weather,
            news,
            clock,
            default_city: config.default_city.clone(),
            default_news_category: config.default_news_category.clone(),
        };
        let assistant = Self {
            interpreter: CommandInterpreter::new(llm.clone(), &config),
            normalizer: CommandNormalizer::new(llm.clone()),
            localizer: ResponseLocalizer::new(llm.clone()),
            sessions: SessionStore::new(config.memory_capacity, config.max_sessions),
            toolbox,
            llm,
            config,
        };
        info!(
            weather = assistant.weather_configured(),
            news = assistant.news_configured(),
            "Smart Home Assistant initialized"
        );
        assistant
    }

    /// Wires the production collaborators: the OpenAI-compatible client,
    /// and the weather and news services when their keys are present.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::with_api_key(
            &config.groq_api_key,
            config.home.llm.clone(),
        ));
        let weather: Option<Arc<dyn WeatherService>> = match &config.weather_api_key {
            Some(key) => Some(Arc::new(OpenWeatherMapService::new(key.as_str())?)),
            None => None,
        };
        let news: Option<Arc<dyn NewsService>> = match &config.news_api_key {
            Some(key) => Some(Arc::new(NewsApiService::new(key.as_str())?)),
            None => None,
        };
        Ok(Self::new(
            config.home.clone(),
            llm,
            weather,
            news,
            Arc::new(LocalTimeService),
        ))
    }

    pub fn config(&self) -> &HomeConfig {
        &self.config
    }

    pub fn weather_configured(&self) -> bool {
        self.toolbox.weather.is_some()
    }

    pub fn news_configured(&self) -> bool {
        self.toolbox.news.is_some()
    }

    /// Processes a command in the default session.
    pub async fn process_command(&self, user_input: &str) -> String {
        self.process_command_in_session(DEFAULT_SESSION, user_input)
            .await
    }

    /// Processes a raw English or Persian command and replies in the same
    /// language. Commands within one session are handled one at a time.
    #[instrument(skip(self, user_input))]
    pub async fn process_command_in_session(&self, session: &str, user_input: &str) -> String {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return "❌ Please provide a command".to_string();
        }
        info!(command = user_input, "Processing command");

        let language = language::detect(user_input);
        let english_command = match language {
            Language::Persian => {
                let english = self.normalizer.normalize(user_input).await;
                info!(translated = %english, "Persian detected");
                english
            }
            Language::English => user_input.to_string(),
        };

        let memory = self.sessions.session(session);
        let english_reply = {
            let mut memory = memory.lock().await;
            self.interpreter
                .process(&english_command, &mut memory, &self.toolbox)
                .await
        };

        match language {
            Language::English => english_reply,
            Language::Persian => match english_reply.strip_prefix(INTERPRETER_ERROR_PREFIX) {
                Some(cause) => {
                    error!(cause, "Command failed for Persian input");
                    let cause = self.localizer.to_persian(cause).await;
                    format!("متأسفم، خطایی رخ داده: {}", cause)
                }
                None => {
                    let reply = self.localizer.to_persian(&english_reply).await;
                    info!(reply = %reply, "Response translated to Persian");
                    reply
                }
            },
        }
    }

    /// Serialisable view of every device.
    pub async fn all_devices(&self) -> Vec<DeviceSnapshot> {
        self.toolbox.devices.lock().await.snapshots()
    }

    /// Status text for `"all"` or a single device.
    pub async fn device_status(&self, query: &str) -> String {
        self.toolbox.devices.lock().await.status(query)
    }

    pub async fn toggle_device(&self, id: &str) -> Result<String, DeviceError> {
        self.toolbox.devices.lock().await.toggle(id)
    }

    /// Exercises each collaborator and reports a pass/fail sentence per service.
    pub async fn test_services(&self) -> BTreeMap<String, String> {
        let mut results = BTreeMap::new();

        let probe = ChatRequest {
            messages: vec![
                ChatMessage::System("Reply with a short greeting.".to_string()),
                ChatMessage::User("test".to_string()),
            ],
            functions: vec![],
            temperature: self.config.llm.temperature,
            max_tokens: self.config.llm.translation_max_tokens,
        };
        let llm = match self.llm.complete(probe).await {
            Ok(c) if c.content.is_some() || c.function_call.is_some() => WORKING.to_string(),
            Ok(_) => "❌ No response".to_string(),
            Err(e) => format!("❌ Error: {}", e),
        };
        results.insert("llm".to_string(), llm);

        let weather = match &self.toolbox.weather {
            Some(service) => passed_or(service.get_weather(&self.config.default_city).await),
            None => NOT_CONFIGURED.to_string(),
        };
        results.insert("weather".to_string(), weather);

        let news = match &self.toolbox.news {
            Some(service) => passed_or(service.get_news(&self.config.default_news_category).await),
            None => NOT_CONFIGURED.to_string(),
        };
        results.insert("news".to_string(), news);

        let persian = if language::is_persian("سلام") && !language::is_persian("hello") {
            WORKING
        } else {
            "❌ Detection issue"
        };
        results.insert("persian".to_string(), persian.to_string());

        let devices = if self.toolbox.devices.lock().await.is_empty() {
            "❌ No devices"
        } else {
            WORKING
        };
        results.insert("devices".to_string(), devices.to_string());

        results
    }

    pub async fn system_status(&self) -> SystemStatus {
        let registry = self.toolbox.devices.lock().await;
        let count = |t| registry.devices_by_type(t).count();
        let flag = |configured: bool| {
            (if configured { CONNECTED } else { NOT_CONFIGURED }).to_string()
        };
        SystemStatus {
            total_devices: registry.len(),
            powered_on: registry.powered_on_count(),
            device_types: DeviceCounts {
                lamps: count(DeviceType::Lamp),
                acs: count(DeviceType::Ac),
                tvs: count(DeviceType::Tv),
            },
            services: ServiceFlags {
                llm: CONNECTED.to_string(),
                weather: flag(self.weather_configured()),
                news: flag(self.news_configured()),
                persian: AVAILABLE.to_string(),
                time: AVAILABLE.to_string(),
            },
            languages: vec!["English".to_string(), "Persian".to_string()],
            configuration: ConfigurationSummary {
                default_city: self.config.default_city.clone(),
                model: self.config.llm.model.clone(),
                memory_capacity: self.config.memory_capacity,
            },
        }
    }

    pub fn example_commands(&self) -> ExampleCommands {
        ExampleCommands {
            english: vec![
                "Turn on the kitchen lamp",
                "Set the AC to 22 degrees",
                "What's the weather in Tehran?",
                "Get technology news",
                "Show device status",
                "Turn off all devices",
            ],
            persian: vec![
                "چراغ آشپزخانه را روشن کن",
                "کولر را روی ۲۲ درجه تنظیم کن",
                "هوای تهران چطوره؟",
                "خبرهای فناوری بده",
                "وضعیت دستگاه‌ها را نشان بده",
                "همه دستگاه‌ها را خاموش کن",
            ],
        }
    }

    /// The last `n` exchanges of `session`, oldest first.
    pub async fn conversation_history(&self, session: &str, n: usize) -> Vec<ConversationTurn> {
        self.sessions.session(session).lock().await.recent(n)
    }

    pub async fn clear_history(&self, session: &str) {
        self.sessions.session(session).lock().await.clear();
        info!(session, "Conversation history cleared");
    }

    /// Powers off every device.
    pub async fn shutdown(&self) -> String {
        info!("Shutting down Smart Home Assistant...");
        self.toolbox.devices.lock().await.shutdown()
    }
}

fn passed_or(response: String) -> String {
    if response.starts_with(crate::ERROR_MARKER) {
        response
    } else {
        WORKING.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{ChatCompletion, FunctionCall, MockLLMClient};
    use crate::services::news::MockNewsService;
    use crate::services::time::MockTimeService;
    use crate::services::weather::MockWeatherService;
    use anyhow::anyhow;

    fn clock() -> Arc<dyn TimeService> {
        let mut clock = MockTimeService::new();
        clock
            .expect_current_time()
            .returning(|| "🕒 Current time: noon".to_string());
        Arc::new(clock)
    }

    fn assistant(llm: MockLLMClient) -> SmartHomeAssistant {
        SmartHomeAssistant::new(HomeConfig::default(), Arc::new(llm), None, None, clock())
    }

    fn reply(content: &str) -> ChatCompletion {
        ChatCompletion {
            content: Some(content.to_string()),
            function_call: None,
        }
    }

    #[tokio::test]
    async fn test_empty_command() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete().times(0);
        let assistant = assistant(llm);
        assert_eq!(assistant.process_command("   ").await, "❌ Please provide a command");
    }

    #[tokio::test]
    async fn test_english_command_round_trip() {
        let mut llm = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ChatCompletion {
                    content: None,
                    function_call: Some(FunctionCall {
                        id: "call_9".to_string(),
                        name: "control_device".to_string(),
                        arguments: r#"{"device_type":"ac","action":"on","location":"kitchen"}"#
                            .to_string(),
                    }),
                })
            });
        llm.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("The kitchen AC is now on ❄️")));
        llm.expect_translate().times(0);
        let assistant = assistant(llm);

        let response = assistant.process_command("turn on the kitchen AC").await;
        assert_eq!(response, "The kitchen AC is now on ❄️");
        assert!(
            assistant
                .device_status("kitchen_ac")
                .await
                .contains("ON 🟢")
        );
        assert_eq!(assistant.conversation_history(DEFAULT_SESSION, 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_persian_command_is_normalized_and_localized() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete()
            .withf(|request| {
                matches!(request.messages.last(), Some(ChatMessage::User(c)) if c == "turn on the kitchen lamp")
            })
            .times(1)
            .returning(|_| {
                Ok(reply(
                    r#"<function=control_device{"device_type":"lamp","action":"on","location":"kitchen"}</function>"#,
                ))
            });
        llm.expect_translate()
            .withf(|_, target| *target == Language::Persian)
            .times(1)
            .returning(|_, _| Ok("چراغ آشپزخانه روشن شد".to_string()));
        let assistant = assistant(llm);

        let response = assistant.process_command("چراغ آشپزخانه را روشن کن").await;
        assert_eq!(response, "چراغ آشپزخانه روشن شد");
        let history = assistant.conversation_history(DEFAULT_SESSION, 1).await;
        assert_eq!(history[0].user, "turn on the kitchen lamp");
    }

    #[tokio::test]
    async fn test_persian_failure_gets_persian_error() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete()
            .returning(|_| Err(anyhow!("connection refused")));
        llm.expect_translate()
            .withf(|text, target| text == "connection refused" && *target == Language::Persian)
            .times(1)
            .returning(|_, _| Ok("اتصال برقرار نشد".to_string()));
        let assistant = assistant(llm);

        let response = assistant.process_command("وضعیت دستگاه‌ها چیه").await;
        assert_eq!(response, "متأسفم، خطایی رخ داده: اتصال برقرار نشد");
    }

    #[tokio::test]
    async fn test_persian_failure_keeps_cause_when_translation_fails() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete()
            .returning(|_| Err(anyhow!("connection refused")));
        llm.expect_translate()
            .withf(|_, target| *target == Language::Persian)
            .times(1)
            .returning(|_, _| Err(anyhow!("rate limited")));
        let assistant = assistant(llm);

        let response = assistant.process_command("وضعیت دستگاه‌ها چیه").await;
        assert_eq!(response, "متأسفم، خطایی رخ داده: connection refused");
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete().returning(|_| Ok(reply("Hello!")));
        let assistant = assistant(llm);

        assistant.process_command_in_session("alice", "hi").await;
        assistant.process_command_in_session("alice", "hi again").await;
        assistant.process_command_in_session("bob", "hello").await;

        assert_eq!(assistant.conversation_history("alice", 10).await.len(), 2);
        assert_eq!(assistant.conversation_history("bob", 10).await.len(), 1);
        assistant.clear_history("alice").await;
        assert!(assistant.conversation_history("alice", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_client_sessions_are_bounded() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete().returning(|_| Ok(reply("Hello!")));
        let config = HomeConfig {
            max_sessions: 4,
            ..Default::default()
        };
        let assistant = SmartHomeAssistant::new(config, Arc::new(llm), None, None, clock());

        for i in 0..200 {
            assistant
                .process_command_in_session(&format!("client-{i}"), "hi")
                .await;
        }

        assert_eq!(assistant.sessions.session_count(), 4);
        assert_eq!(assistant.conversation_history("client-199", 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_service_report() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete().returning(|_| Ok(reply("Hi")));
        let mut weather = MockWeatherService::new();
        weather
            .expect_get_weather()
            .returning(|_| "❌ Invalid weather API key. Please check your WEATHER_API_KEY".to_string());
        let mut news = MockNewsService::new();
        news.expect_get_news()
            .returning(|_| "💻 Latest Technology Headlines:".to_string());
        let assistant = SmartHomeAssistant::new(
            HomeConfig::default(),
            Arc::new(llm),
            Some(Arc::new(weather)),
            Some(Arc::new(news)),
            clock(),
        );

        let results = assistant.test_services().await;
        assert_eq!(results["llm"], "✅ Working");
        assert!(results["weather"].starts_with("❌ Invalid weather API key"));
        assert_eq!(results["news"], "✅ Working");
        assert_eq!(results["persian"], "✅ Working");
        assert_eq!(results["devices"], "✅ Working");
    }

    #[tokio::test]
    async fn test_system_status_and_shutdown() {
        let llm = MockLLMClient::new();
        let assistant = assistant(llm);
        assistant.toggle_device("kitchen_lamp").await.unwrap();
        assistant.toggle_device("living_room_tv").await.unwrap();

        let status = assistant.system_status().await;
        assert_eq!(status.total_devices, 7);
        assert_eq!(status.powered_on, 2);
        assert_eq!(status.device_types.lamps, 4);
        assert_eq!(status.services.weather, "❌ Not configured");

        let summary = assistant.shutdown().await;
        assert!(summary.starts_with("🔌 All devices turned off:"));
        assert_eq!(assistant.system_status().await.powered_on, 0);
    }

    #[tokio::test]
    async fn test_toggle_unknown_device() {
        let assistant = assistant(MockLLMClient::new());
        assert_eq!(
            assistant.toggle_device("garage_door").await.unwrap_err().to_string(),
            "❌ Device 'garage_door' not found"
        );
    }
}
