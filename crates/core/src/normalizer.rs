//! Command Normalizer
//!
//! Rewrites Persian commands into English before interpretation. Common
//! phrasings are resolved locally from a phrase table and a handful of
//! parameterised patterns; anything else is translated by the model.

use crate::language;
use crate::llm_client::{LLMClient, Language};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

/// Known full commands, checked in order by substring containment.
const PHRASEBOOK: &[(&str, &str)] = &[
    ("چراغ آشپزخانه را روشن کن", "turn on the kitchen lamp"),
    ("چراغ حمام را روشن کن", "turn on the bathroom lamp"),
    ("چراغ اتاق یک را روشن کن", "turn on the room 1 lamp"),
    ("چراغ اتاق دو را روشن کن", "turn on the room 2 lamp"),
    ("چراغ آشپزخانه را خاموش کن", "turn off the kitchen lamp"),
    ("چراغ حمام را خاموش کن", "turn off the bathroom lamp"),
    ("همه چراغ‌ها را روشن کن", "turn on all lamps"),
    ("همه چراغ‌ها را خاموش کن", "turn off all lamps"),
    ("کولر را روشن کن", "turn on the AC"),
    ("کولر اتاق یک را روشن کن", "turn on the room 1 AC"),
    ("کولر آشپزخانه را روشن کن", "turn on the kitchen AC"),
    ("کولر را خاموش کن", "turn off the AC"),
    ("تلویزیون را روشن کن", "turn on the TV"),
    ("تلویزیون را خاموش کن", "turn off the TV"),
    ("تی وی را روشن کن", "turn on the TV"),
    ("تی وی را خاموش کن", "turn off the TV"),
    ("همه دستگاه‌ها را خاموش کن", "turn off all devices"),
    ("تمام دستگاه‌ها را خاموش کن", "turn off all devices"),
    ("وضعیت دستگاه‌ها چیه", "what is the status of all devices"),
    ("وضعیت دستگاه‌ها را نشان بده", "show device status"),
    ("دستگاه‌ها چطورن", "how are the devices"),
    ("هوا چطوره", "what's the weather"),
    ("هوای تهران چطوره", "what's the weather in Tehran"),
    ("آب و هوا چطوره", "what's the weather"),
    ("آب و هوای تهران", "weather in Tehran"),
    ("ساعت چنده", "what time is it"),
    ("وقت چیه", "what time is it"),
    ("زمان چقدره", "what time is it"),
    ("الان ساعت چنده", "what time is it now"),
];

/// A parameterised phrase with its English template and the location words
/// substituted afterwards.
struct PhrasePattern {
    regex: Regex,
    template: &'static str,
    locations: &'static [(&'static str, &'static str)],
}

const TEMPERATURE_LOCATIONS: &[(&str, &str)] = &[("اتاق یک", "room 1"), ("آشپزخانه", "kitchen")];
const BRIGHTNESS_LOCATIONS: &[(&str, &str)] = &[("آشپزخانه", "kitchen"), ("حمام", "bathroom")];

fn pattern(
    source: &str,
    template: &'static str,
    locations: &'static [(&'static str, &'static str)],
) -> PhrasePattern {
    PhrasePattern {
        regex: Regex::new(source).expect("phrase pattern must compile"),
        template,
        locations,
    }
}

static PHRASE_PATTERNS: LazyLock<Vec<PhrasePattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"کولر را روی (\d+) درجه تنظیم کن",
            "set AC to ${1} degrees",
            TEMPERATURE_LOCATIONS,
        ),
        pattern(
            r"کولر (.+) را روی (\d+) درجه تنظیم کن",
            "set ${1} AC to ${2} degrees",
            TEMPERATURE_LOCATIONS,
        ),
        pattern(
            r"دما را روی (\d+) تنظیم کن",
            "set temperature to ${1}",
            TEMPERATURE_LOCATIONS,
        ),
        pattern(
            r"چراغ را روی (\d+) درصد روشنی تنظیم کن",
            "set lamp to ${1}% brightness",
            BRIGHTNESS_LOCATIONS,
        ),
        pattern(
            r"چراغ (.+) را روی (\d+) درصد تنظیم کن",
            "set ${1} lamp to ${2}% brightness",
            BRIGHTNESS_LOCATIONS,
        ),
        pattern(
            r"روشنی چراغ را (\d+) درصد کن",
            "set lamp brightness to ${1}%",
            BRIGHTNESS_LOCATIONS,
        ),
    ]
});

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Replaces Persian (and Arabic-Indic) digits with ASCII digits.
pub fn to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| {
            PERSIAN_DIGITS
                .iter()
                .position(|&d| d == c)
                .or_else(|| ARABIC_INDIC_DIGITS.iter().position(|&d| d == c))
                .and_then(|i| char::from_digit(i as u32, 10))
                .unwrap_or(c)
        })
        .collect()
}

/// Tries the phrase table and the parameterised patterns, without the model.
pub fn fast_path(text: &str) -> Option<String> {
    let normalized = to_ascii_digits(text).to_lowercase();
    let normalized = normalized.trim();

    if let Some((phrase, english)) = PHRASEBOOK
        .iter()
        .find(|(phrase, _)| normalized.contains(phrase))
    {
        info!(phrase, english, "Quick pattern match");
        return Some((*english).to_string());
    }

    PHRASE_PATTERNS.iter().find_map(|p| {
        if !p.regex.is_match(normalized) {
            return None;
        }
        let mut result = p.regex.replace(normalized, p.template).into_owned();
        for (persian, english) in p.locations {
            result = result.replace(persian, english);
        }
        info!(input = text, output = %result, "Parameterised pattern match");
        Some(result)
    })
}

/// Turns Persian commands into English ones.
pub struct CommandNormalizer {
    llm: Arc<dyn LLMClient>,
}

impl CommandNormalizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Returns the English form of `persian_text`. Never fails: if the model
    /// cannot translate, the original text is passed through.
    pub async fn normalize(&self, persian_text: &str) -> String {
        if let Some(english) = fast_path(persian_text) {
            return english;
        }

        info!(input = persian_text, "Using LLM translation");
        match self
            .llm
            .translate(&to_ascii_digits(persian_text), Language::English)
            .await
        {
            Ok(english) if !english.trim().is_empty() => {
                if language::is_persian(&english) {
                    warn!(output = %english, "Translation still looks Persian; passing it through");
                }
                english.trim().to_string()
            }
            Ok(_) => {
                warn!("Translation came back empty; using original text");
                persian_text.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Translation failed; using original text");
                persian_text.to_string()
            }
        }
    }
}
