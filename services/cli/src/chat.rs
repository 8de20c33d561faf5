//! Interactive text chat over stdin.

use anyhow::Result;
use smarthome_core::SmartHomeAssistant;
use std::io::Write;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const WRAP_WIDTH: usize = 70;
const RULE: &str = "==================================================";

/// Inputs handled by the chat itself instead of the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    Help,
    Status,
    History,
    Examples,
    Test,
    Clear,
    Quit,
}

impl SpecialCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "history" => Some(Self::History),
            "examples" => Some(Self::Examples),
            "test" => Some(Self::Test),
            "clear" => Some(Self::Clear),
            "quit" | "exit" | "bye" | "خروج" | "بای" | "خداحافظ" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wraps each line of a multi-line reply, keeping blank lines.
fn wrap_reply(reply: &str) -> String {
    reply
        .lines()
        .flat_map(|line| wrap_text(line, WRAP_WIDTH))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Chat<'a> {
    assistant: &'a SmartHomeAssistant,
    session: String,
}

impl<'a> Chat<'a> {
    pub fn new(assistant: &'a SmartHomeAssistant, session: impl Into<String>) -> Self {
        Self {
            assistant,
            session: session.into(),
        }
    }

    /// Reads commands until EOF or a quit command.
    pub async fn run(&self) -> Result<()> {
        self.show_welcome();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("\n🎤 You / شما: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match SpecialCommand::parse(input) {
                Some(SpecialCommand::Quit) => break,
                Some(command) => self.handle_special(command).await,
                None => self.process(input).await,
            }
        }

        println!("\n👋 Thanks for using Smart Home Assistant!");
        Ok(())
    }

    async fn process(&self, input: &str) {
        let started = Instant::now();
        let reply = self
            .assistant
            .process_command_in_session(&self.session, input)
            .await;
        let elapsed = started.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "Command processed");

        println!("🤖 Assistant / دستیار:");
        println!("{}", wrap_reply(&reply));
        println!("⏱️  Processed in {:.2}s", elapsed.as_secs_f64());
    }

    async fn handle_special(&self, command: SpecialCommand) {
        match command {
            SpecialCommand::Help => show_help(),
            SpecialCommand::Status => {
                println!("\n📊 Current Device Status:\n{}", RULE);
                println!("{}", self.assistant.device_status("all").await);
            }
            SpecialCommand::History => self.show_history().await,
            SpecialCommand::Examples => self.show_examples(usize::MAX),
            SpecialCommand::Test => {
                println!("\n🧪 Testing All Services...\n{}", RULE);
                for (service, result) in self.assistant.test_services().await {
                    println!("{}: {}", service, result);
                }
            }
            SpecialCommand::Clear => {
                self.assistant.clear_history(&self.session).await;
                println!("🧹 Conversation history cleared.");
            }
            SpecialCommand::Quit => {}
        }
    }

    async fn show_history(&self) {
        println!("\n💭 Recent Conversation History:\n{}", RULE);
        let turns = self.assistant.conversation_history(&self.session, 5).await;
        if turns.is_empty() {
            println!("No conversation history yet.");
            return;
        }
        for (i, turn) in turns.iter().enumerate() {
            println!("\n{}. [{}]", i + 1, turn.timestamp.format("%H:%M:%S"));
            println!("   You: {}", turn.user);
            println!("   Assistant: {}", turn.assistant);
        }
    }

    fn show_examples(&self, limit: usize) {
        let examples = self.assistant.example_commands();
        println!("\n🇺🇸 English Examples:");
        for (i, command) in examples.english.iter().take(limit).enumerate() {
            println!("   {}. {}", i + 1, command);
        }
        println!("\n🇮🇷 Persian Examples:");
        for (i, command) in examples.persian.iter().take(limit).enumerate() {
            println!("   {}. {}", i + 1, command);
        }
    }

    fn show_welcome(&self) {
        let rule = "=".repeat(58);
        println!("\n🎭{}🎭", rule);
        println!("           SMART HOME ASSISTANT - TEXT CHAT");
        println!("🎭{}🎭", rule);
        println!("🌍 Automatic Language Detection: English + Persian");
        println!("🤖 Model: {}", self.assistant.config().llm.model);
        println!(
            "🌤️  Weather: {}   📰 News: {}",
            if self.assistant.weather_configured() { "✅" } else { "❌" },
            if self.assistant.news_configured() { "✅" } else { "❌" },
        );
        println!("\n🚀 QUICK START - Try these commands:");
        self.show_examples(3);
        println!("\n💡 Type 'help' for all commands, 'quit' to exit.");
    }
}

fn show_help() {
    println!("\n📚 SMART HOME ASSISTANT - HELP\n{}", RULE);
    println!("\n🏠 Device Control:");
    println!("   • Turn on/off: 'Turn on kitchen lamp' / 'چراغ آشپزخانه را روشن کن'");
    println!("   • Brightness: 'Set lamp to 70%' / 'چراغ را روی ۷۰ درصد روشنی تنظیم کن'");
    println!("   • Temperature: 'Set AC to 22 degrees' / 'کولر را روی ۲۲ درجه تنظیم کن'");
    println!("   • All devices: 'Turn off all devices' / 'همه دستگاه‌ها را خاموش کن'");
    println!("\n🌐 Information Services:");
    println!("   • Weather: 'What's the weather?' / 'هوا چطوره؟'");
    println!("   • News: 'Get technology news' / 'خبرهای فناوری بده'");
    println!("   • Time: 'What time is it?' / 'ساعت چنده؟'");
    println!("\n💬 Chat Commands:");
    println!("   • help     - Show this help");
    println!("   • status   - Show device status");
    println!("   • history  - Show conversation history");
    println!("   • examples - Show example commands");
    println!("   • test     - Test all services");
    println!("   • clear    - Clear conversation history");
    println!("   • quit     - Exit (all devices are turned off)");
}
