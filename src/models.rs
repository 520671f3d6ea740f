//! Data models and structures
//!
//! Defines the recommendation records parsed from the model reply, the
//! per-submission outcome, and runtime configuration.

use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Number of movies requested per submission.
pub const RECOMMENDATION_COUNT: usize = 8;

/// A single recommended title as returned by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    pub genre: String,
    pub description: String,
    pub match_reason: String,
}

/// Full structured reply: a mood summary plus the ordered recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub mood_analysis: String,
    pub movies: Vec<Recommendation>,
}

// Models occasionally answer `"year": 1994` despite the STRING schema.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Year::deserialize(deserializer)? {
        Year::Text(text) => text,
        Year::Number(number) => number.to_string(),
    })
}

/// Category of a failed submission, used to pick how the failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    OversizedMedia,
    MediaRead,
    ServiceCall,
    MalformedResponse,
    TranscriptionUnavailable,
    Other,
}

impl From<&Error> for FailureReason {
    fn from(error: &Error) -> Self {
        match error {
            Error::OversizedMedia { .. } => FailureReason::OversizedMedia,
            Error::MediaRead(_) | Error::Io(_) | Error::UnsupportedMedia(_) => {
                FailureReason::MediaRead
            }
            Error::Http(_) | Error::AiProvider(_) => FailureReason::ServiceCall,
            Error::MalformedResponse(_) | Error::Serialization(_) => {
                FailureReason::MalformedResponse
            }
            Error::TranscriptionUnavailable(_) => FailureReason::TranscriptionUnavailable,
            Error::PosterLookup(_) | Error::Config(_) | Error::EnvVar(_) => {
                FailureReason::Other
            }
        }
    }
}

/// Terminal result of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success(RecommendationResponse),
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }
}

impl From<Error> for RequestOutcome {
    fn from(error: Error) -> Self {
        RequestOutcome::Failure {
            reason: FailureReason::from(&error),
            message: error.to_string(),
        }
    }
}

// Configuration
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub request_timeout: Duration,
    pub poster_lookup: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        check_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the process
    /// environment in production).
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let gemini_model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "Invalid GEMINI_TIMEOUT_SECS '{}': expected whole seconds",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let poster_lookup = !matches!(
            lookup("POSTER_LOOKUP").as_deref().map(str::trim),
            Some("off") | Some("false") | Some("0")
        );

        Ok(Self {
            gemini_api_key,
            gemini_model,
            request_timeout: Duration::from_secs(timeout_secs),
            poster_lookup,
        })
    }
}

/// A missing `.env` file is fine; one that fails to parse is not.
fn check_dotenv<T>(result: std::result::Result<T, dotenvy::Error>) -> crate::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
