//! AI recommendation client (Gemini-compatible generateContent endpoint)

use serde_json::json;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::http;

/// Recommendation provider client
pub struct RecommendClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl RecommendClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        if config.ai_api_key.is_empty() {
            return Err(AppError::Config(
                "No AI API key configured. Set SCREENSCOUT_AI_API_KEY.".to_string(),
            ));
        }
        Ok(Self {
            client: http::default_client(),
            base_url: config.ai_base_url.clone(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        })
    }

    /// Ask the model for titles matching a free-form taste description
    pub async fn recommend(&self, taste: &str, count: usize) -> Result<String, AppError> {
        if taste.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Describe what you are in the mood for".to_string(),
            ));
        }

        let prompt = build_prompt(taste, count);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "recommendation API error {}: {}",
                status, text
            )));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Parse(e.to_string()))?;

        extract_text(&resp).ok_or_else(|| {
            AppError::Parse("recommendation response contained no text".to_string())
        })
    }
}

fn build_prompt(taste: &str, count: usize) -> String {
    format!(
        "Recommend {} movies or TV shows for someone who says: \"{}\". \
         For each, give the title, year, and one sentence on why it fits. \
         Format as a markdown list.",
        count, taste
    )
}

/// Pull the generated text out of the candidates structure
fn extract_text(resp: &serde_json::Value) -> Option<String> {
    let parts = resp["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    #[test]
    fn test_missing_key_is_config_error() {
        let config = AppConfig::default();
        assert!(matches!(
            RecommendClient::new(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_extract_text() {
        let resp = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{"text": "1. The Thing"}, {"text": " (1982)"}] }
            }]
        });
        assert_eq!(extract_text(&resp).unwrap(), "1. The Thing (1982)");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let resp = serde_json::json!({"candidates": []});
        assert!(extract_text(&resp).is_none());
    }

    #[test]
    fn test_prompt_mentions_count_and_taste() {
        let prompt = build_prompt("slow-burn sci-fi", 5);
        assert!(prompt.contains("5 movies"));
        assert!(prompt.contains("slow-burn sci-fi"));
    }

    #[tokio::test]
    async fn test_recommend_roundtrip() {
        // The generateContent path contains a ':', which the router would
        // read as a parameter marker, so match it in a fallback instead.
        let app = Router::new().fallback(post(|uri: axum::http::Uri| async move {
            assert!(uri.path().ends_with("gemini-1.5-flash:generateContent"));
            Json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{"text": "- Primer (2004): tight loops."}] }
                }]
            }))
        }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = AppConfig {
            ai_base_url: format!("http://{}", addr),
            ai_api_key: "key".to_string(),
            ..AppConfig::default()
        };
        let client = RecommendClient::new(&config).unwrap();

        let text = client.recommend("mind-bending time travel", 3).await.unwrap();
        assert!(text.contains("Primer"));
    }
}
