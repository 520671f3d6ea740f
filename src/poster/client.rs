use super::{Poster, PosterLookup};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://tse4.mm.bing.net";

/// Unauthenticated thumbnail search keyed by `"{title} {year} movie poster"`.
pub struct HttpPosterLookup {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPosterLookup {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn poster_url(&self, title: &str, year: &str) -> Result<Url> {
        let query = format!("{} {} movie poster", title, year);
        Url::parse_with_params(
            &format!("{}/th", self.base_url),
            &[
                ("q", query.as_str()),
                ("w", "400"),
                ("h", "600"),
                ("c", "7"),
                ("rs", "1"),
                ("p", "0"),
            ],
        )
        .map_err(|e| Error::PosterLookup(format!("Invalid poster URL: {}", e)))
    }
}

impl Default for HttpPosterLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PosterLookup for HttpPosterLookup {
    async fn lookup(&self, title: &str, year: &str) -> Result<Poster> {
        let url = self.poster_url(title, year)?;

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::PosterLookup(format!(
                "status {} for '{}'",
                response.status(),
                title
            )));
        }

        let bytes = response.bytes().await?;
        let format = image::guess_format(&bytes).map_err(|e| {
            Error::PosterLookup(format!("'{}' did not return an image: {}", title, e))
        })?;

        Ok(Poster {
            url: url.to_string(),
            mime_type: format.to_mime_type().to_string(),
        })
    }
}
