use super::{Poster, PosterLookup};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockPosterLookup {
    base_url: String,
    failing_titles: Arc<Mutex<HashSet<String>>>,
    lookup_count: Arc<Mutex<usize>>,
}

impl MockPosterLookup {
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-posters.example.com".to_string(),
            failing_titles: Arc::new(Mutex::new(HashSet::new())),
            lookup_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make lookups for `title` fail.
    pub fn failing_for(self, title: impl Into<String>) -> Self {
        self.failing_titles.lock().unwrap().insert(title.into());
        self
    }

    pub fn get_lookup_count(&self) -> usize {
        *self.lookup_count.lock().unwrap()
    }
}

impl Default for MockPosterLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PosterLookup for MockPosterLookup {
    async fn lookup(&self, title: &str, year: &str) -> Result<Poster> {
        *self.lookup_count.lock().unwrap() += 1;

        if self.failing_titles.lock().unwrap().contains(title) {
            return Err(Error::PosterLookup(format!("no poster for '{}'", title)));
        }

        let slug: String = format!("{} {}", title, year)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();

        Ok(Poster {
            url: format!("{}/{}.jpg", self.base_url, slug),
            mime_type: "image/jpeg".to_string(),
        })
    }
}
