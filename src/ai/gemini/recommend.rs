use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::RecommendationService;
use crate::media::MediaAttachment;
use crate::models::RecommendationResponse;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct RecommendRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: RecommendGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendGenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
}

/// Movie recommendations from a single multimodal `generateContent` call.
pub struct GeminiRecommendationClient {
    http: GeminiHttpClient,
}

impl GeminiRecommendationClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    async fn build_request(
        &self,
        text: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<RecommendRequest> {
        let mut parts = Vec::with_capacity(2);

        if let Some(media) = media {
            let encoded = media.encode().await?;
            tracing::debug!(
                "Encoded {} ({}) as {} base64 chars",
                media.name(),
                encoded.mime_type,
                encoded.data.len()
            );
            parts.push(Part::from(encoded));
        }

        parts.push(Part::Text {
            text: prompts::build_recommendation_prompt(text, media.is_some()),
        });

        Ok(RecommendRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: RecommendGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: prompts::response_schema(),
                temperature: TEMPERATURE,
            },
        })
    }
}

#[async_trait]
impl RecommendationService for GeminiRecommendationClient {
    async fn fetch_recommendations(
        &self,
        text: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<RecommendationResponse> {
        let request = self.build_request(text, media).await?;

        tracing::info!(
            "Requesting recommendations from {} (text: {} chars, media: {})",
            self.http.model(),
            text.len(),
            media.map(|m| m.mime_type()).unwrap_or("none")
        );

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let reply = response
            .text()
            .ok_or_else(|| Error::MalformedResponse("No response text".to_string()))?;

        let parsed: RecommendationResponse = serde_json::from_str(&reply).map_err(|e| {
            tracing::error!("Recommendation reply is not valid JSON: {}", e);
            Error::MalformedResponse(format!("Failed to parse recommendations: {}", e))
        })?;

        tracing::info!(
            "Received {} recommendations",
            parsed.movies.len()
        );

        Ok(parsed)
    }
}
