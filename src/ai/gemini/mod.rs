pub mod client;
pub mod recommend;
pub mod types;

pub use client::GeminiHttpClient;
pub use recommend::GeminiRecommendationClient;
