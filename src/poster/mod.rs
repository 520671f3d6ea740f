//! Poster lookups for recommendation cards
//!
//! Posters are best-effort decoration: each card asks independently and a
//! failure only ever downgrades that card to a placeholder.

pub mod client;
pub mod mock;

pub use client::HttpPosterLookup;
pub use mock::MockPosterLookup;

use crate::{Error, Result};
use async_trait::async_trait;

/// An illustrative image found for a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poster {
    pub url: String,
    pub mime_type: String,
}

#[async_trait]
pub trait PosterLookup: Send + Sync {
    async fn lookup(&self, title: &str, year: &str) -> Result<Poster>;
}

/// Lookup used when network poster fetching is switched off.
#[derive(Debug, Default)]
pub struct DisabledPosterLookup;

#[async_trait]
impl PosterLookup for DisabledPosterLookup {
    async fn lookup(&self, _title: &str, _year: &str) -> Result<Poster> {
        Err(Error::PosterLookup("poster lookup disabled".to_string()))
    }
}
