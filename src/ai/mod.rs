//! Generative-AI integration for movie recommendations
//!
//! Provides the recommendation service seam, the Gemini implementation,
//! and a mock for tests and offline harnesses.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiRecommendationClient;
pub use mock::MockRecommendationClient;

use crate::media::MediaAttachment;
use crate::models::{RecommendationResponse, RequestOutcome};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// One request/response cycle: optional media plus text in, parsed
    /// recommendations out. No retries, no caching.
    async fn fetch_recommendations(
        &self,
        text: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<RecommendationResponse>;
}

/// Run one submission and fold any error into a [`RequestOutcome`].
pub async fn fetch_outcome(
    service: &dyn RecommendationService,
    text: &str,
    media: Option<&MediaAttachment>,
) -> RequestOutcome {
    match service.fetch_recommendations(text, media).await {
        Ok(response) => RequestOutcome::Success(response),
        Err(e) => {
            tracing::error!("Error fetching recommendations: {}", e);
            e.into()
        }
    }
}
