use crate::llm_client::{LLMClient, Language};
use std::sync::Arc;
use tracing::warn;

/// Translates final English replies back to Persian.
pub struct ResponseLocalizer {
    llm: Arc<dyn LLMClient>,
}

impl ResponseLocalizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Persian rendering of `english_text`, or the text unchanged if the
    /// translation fails.
    pub async fn to_persian(&self, english_text: &str) -> String {
        match self.llm.translate(english_text, Language::Persian).await {
            Ok(persian) if !persian.trim().is_empty() => persian.trim().to_string(),
            Ok(_) => english_text.to_string(),
            Err(e) => {
                warn!(error = %e, "Translation to Persian failed; returning English reply");
                english_text.to_string()
            }
        }
    }
}
