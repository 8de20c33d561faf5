use super::{HTTP_TIMEOUT, capitalize, describe_transport_error};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/top-headlines";
const HEADLINE_COUNT: usize = 5;

/// Categories the news function accepts.
pub const NEWS_CATEGORIES: &[&str] = &[
    "technology",
    "business",
    "sports",
    "health",
    "science",
    "general",
    "entertainment",
];

/// Top-headline lookup for a category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsService: Send + Sync {
    /// Numbered headline list, or a `❌` sentence on failure.
    async fn get_news(&self, category: &str) -> String;
}

/// `NewsService` backed by NewsAPI top headlines.
pub struct NewsApiService {
    http: reqwest::Client,
    api_key: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    source: Source,
}

#[derive(Debug, Deserialize)]
struct Source {
    name: String,
}

impl NewsApiService {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        info!("News service initialized");
        Ok(Self {
            http,
            api_key: api_key.into(),
            country: "us".to_string(),
        })
    }

    async fn fetch(&self, category: &str) -> Result<String, reqwest::Error> {
        let page_size = HEADLINE_COUNT.to_string();
        let response = self
            .http
            .get(NEWSAPI_URL)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("category", category),
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let message = match response.status() {
            StatusCode::OK => {
                let body: HeadlinesResponse = response.json().await?;
                format_headlines(&body, category)
            }
            StatusCode::UNAUTHORIZED => {
                "❌ Invalid news API key. Please check your NEWS_API_KEY".to_string()
            }
            StatusCode::TOO_MANY_REQUESTS => {
                "❌ News API rate limit exceeded. Please try again later".to_string()
            }
            other => format!("❌ News service error (Code: {})", other.as_u16()),
        };
        Ok(message)
    }
}

#[async_trait]
impl NewsService for NewsApiService {
    async fn get_news(&self, category: &str) -> String {
        self.fetch(category).await.unwrap_or_else(|e| {
            error!(error = %e, "News API error");
            describe_transport_error("news", &e)
        })
    }
}

fn category_emoji(category: &str) -> &'static str {
    match category {
        "technology" => "💻",
        "business" => "💼",
        "sports" => "⚽",
        "health" => "🏥",
        "science" => "🔬",
        "entertainment" => "🎬",
        _ => "📰",
    }
}

fn format_headlines(body: &HeadlinesResponse, category: &str) -> String {
    if body.articles.is_empty() {
        return format!("❌ No news articles found for {} category", category);
    }

    let mut lines = vec![format!(
        "{} Latest {} Headlines:",
        category_emoji(category),
        capitalize(category)
    )];
    lines.extend(
        body.articles
            .iter()
            .take(HEADLINE_COUNT)
            .enumerate()
            .map(|(i, article)| format!("   {}. {} ({})", i + 1, article.title, article.source.name)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, source: &str) -> Article {
        Article {
            title: title.to_string(),
            source: Source {
                name: source.to_string(),
            },
        }
    }

    #[test]
    fn test_format_headlines_limits_to_five() {
        let body = HeadlinesResponse {
            articles: (1..=7).map(|i| article(&format!("Story {i}"), "Wire")).collect(),
        };
        let text = format_headlines(&body, "technology");
        assert!(text.starts_with("💻 Latest Technology Headlines:"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("   5. Story 5 (Wire)"));
        assert!(!text.contains("Story 6"));
    }

    #[test]
    fn test_format_headlines_empty() {
        let body = HeadlinesResponse { articles: vec![] };
        assert_eq!(
            format_headlines(&body, "sports"),
            "❌ No news articles found for sports category"
        );
    }

    #[test]
    fn test_headlines_payload_parses() {
        let body: HeadlinesResponse = serde_json::from_str(
            r#"{"status":"ok","articles":[{"title":"Rust 2.0","source":{"id":null,"name":"Blog"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            format_headlines(&body, "general"),
            "📰 Latest General Headlines:\n   1. Rust 2.0 (Blog)"
        );
    }
}
