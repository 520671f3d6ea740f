use super::RecommendationService;
use crate::media::MediaAttachment;
use crate::models::{Recommendation, RecommendationResponse, RECOMMENDATION_COUNT};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockReply {
    Response(RecommendationResponse),
    Malformed(String),
    ServiceError(String),
}

/// Text and media name seen by a mock call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub text: String,
    pub media_name: Option<String>,
}

#[derive(Clone)]
pub struct MockRecommendationClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockRecommendationClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: RecommendationResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Response(response));
        self
    }

    /// Queue a reply whose text fails to parse as recommendations.
    pub fn with_malformed_reply(self, body: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Malformed(body.into()));
        self
    }

    pub fn with_service_error(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::ServiceError(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Canned response with `count` movies that mention `text`.
    pub fn sample_response(text: &str, count: usize) -> RecommendationResponse {
        RecommendationResponse {
            mood_analysis: format!("A mood shaped by: {}", text),
            movies: (1..=count)
                .map(|i| Recommendation {
                    title: format!("Mock Movie {}", i),
                    year: (2000 + i).to_string(),
                    genre: "Drama".to_string(),
                    description: format!("Mock description {}", i),
                    match_reason: format!("Matches \"{}\"", text),
                })
                .collect(),
        }
    }
}

impl Default for MockRecommendationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecommendationService for MockRecommendationClient {
    async fn fetch_recommendations(
        &self,
        text: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<RecommendationResponse> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                text: text.to_string(),
                media_name: media.map(|m| m.name().to_string()),
            });
            calls.len()
        };

        // Encoding failures surface the same way they do for the real client.
        if let Some(media) = media {
            media.encode().await?;
        }

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies[(count - 1) % replies.len()].clone())
            }
        };

        match reply {
            None => Ok(Self::sample_response(text, RECOMMENDATION_COUNT)),
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Malformed(body)) => serde_json::from_str(&body).map_err(|e| {
                Error::MalformedResponse(format!("Failed to parse recommendations: {}", e))
            }),
            Some(MockReply::ServiceError(message)) => Err(Error::AiProvider(message)),
        }
    }
}
