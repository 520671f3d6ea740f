//! Results rendering
//!
//! Turns a [`RecommendationResponse`] into a view of one card per movie.
//! Every card resolves its poster on its own; a failed lookup becomes a
//! placeholder on that card and goes no further.

use crate::models::{Recommendation, RecommendationResponse};
use crate::poster::PosterLookup;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const POSTER_PLACEHOLDER_GLYPH: &str = "[ no image ]";
pub const POSTER_PLACEHOLDER_LABEL: &str = "Poster Unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterState {
    Image { url: String },
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub movie: Recommendation,
    pub poster: PosterState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub mood_analysis: String,
    pub cards: Vec<MovieCard>,
}

/// Build the results view, resolving posters concurrently.
pub async fn render_results(
    response: &RecommendationResponse,
    posters: Arc<dyn PosterLookup>,
) -> ResultsView {
    let mut lookups = JoinSet::new();

    for (index, movie) in response.movies.iter().enumerate() {
        let posters = Arc::clone(&posters);
        let title = movie.title.clone();
        let year = movie.year.clone();
        lookups.spawn(async move {
            let state = match posters.lookup(&title, &year).await {
                Ok(poster) => PosterState::Image { url: poster.url },
                Err(e) => {
                    tracing::debug!("No poster for '{}': {}", title, e);
                    PosterState::Placeholder
                }
            };
            (index, state)
        });
    }

    let mut states = vec![PosterState::Placeholder; response.movies.len()];
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((index, state)) => states[index] = state,
            // A panicked lookup leaves its card on the placeholder.
            Err(e) => tracing::warn!("Poster lookup task failed: {}", e),
        }
    }

    ResultsView {
        mood_analysis: response.mood_analysis.clone(),
        cards: response
            .movies
            .iter()
            .cloned()
            .zip(states)
            .map(|(movie, poster)| MovieCard { movie, poster })
            .collect(),
    }
}

/// One-line banner shown in place of results after a failure.
pub fn render_error_banner(message: &str) -> String {
    format!("[!] {}", message)
}

impl fmt::Display for MovieCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})  [{}]", self.movie.title, self.movie.year, self.movie.genre)?;
        match &self.poster {
            PosterState::Image { url } => writeln!(f, "  Poster: {}", url)?,
            PosterState::Placeholder => writeln!(
                f,
                "  {} {}",
                POSTER_PLACEHOLDER_GLYPH, POSTER_PLACEHOLDER_LABEL
            )?,
        }
        writeln!(f, "  {}", self.movie.description)?;
        write!(f, "  Why: {}", self.movie.match_reason)
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recommendations ===")?;
        writeln!(f)?;
        writeln!(f, "Mood Analysis")?;
        writeln!(f, "  \"{}\"", self.mood_analysis)?;

        for (index, card) in self.cards.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{}. ", index + 1)?;
            writeln!(f, "{}", card)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockRecommendationClient;
    use crate::poster::{DisabledPosterLookup, MockPosterLookup};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_one_card_per_movie_in_order() {
        let response = MockRecommendationClient::sample_response("cozy rainy afternoon", 8);
        let lookup = MockPosterLookup::new();

        let view = render_results(&response, Arc::new(lookup.clone())).await;

        assert_eq!(view.cards.len(), 8);
        assert_eq!(lookup.get_lookup_count(), 8);
        for (card, movie) in view.cards.iter().zip(&response.movies) {
            assert_eq!(&card.movie, movie);
            assert!(matches!(card.poster, PosterState::Image { .. }));
            assert!(!card.movie.title.is_empty());
            assert!(!card.movie.year.is_empty());
            assert!(!card.movie.genre.is_empty());
            assert!(!card.movie.description.is_empty());
            assert!(!card.movie.match_reason.is_empty());
        }
    }

    #[tokio::test]
    async fn test_failed_poster_only_affects_its_card() {
        let response = MockRecommendationClient::sample_response("x", 3);
        let lookup = MockPosterLookup::new().failing_for("Mock Movie 2");

        let view = render_results(&response, Arc::new(lookup)).await;

        assert!(matches!(view.cards[0].poster, PosterState::Image { .. }));
        assert_eq!(view.cards[1].poster, PosterState::Placeholder);
        assert!(matches!(view.cards[2].poster, PosterState::Image { .. }));
        assert_eq!(view.mood_analysis, response.mood_analysis);
    }

    #[tokio::test]
    async fn test_disabled_lookup_uses_placeholders() {
        let response = MockRecommendationClient::sample_response("x", 2);
        let view = render_results(&response, Arc::new(DisabledPosterLookup)).await;

        let text = view.to_string();
        assert_eq!(text.matches(POSTER_PLACEHOLDER_LABEL).count(), 2);
    }

    #[tokio::test]
    async fn test_empty_movie_list_renders_analysis_only() {
        let response = RecommendationResponse {
            mood_analysis: "Quiet.".to_string(),
            movies: Vec::new(),
        };
        let view = render_results(&response, Arc::new(MockPosterLookup::new())).await;
        assert!(view.cards.is_empty());
        assert!(view.to_string().contains("\"Quiet.\""));
    }

    #[test]
    fn test_display_contains_card_fields() {
        let view = ResultsView {
            mood_analysis: "Melancholic but hopeful.".to_string(),
            cards: vec![MovieCard {
                movie: Recommendation {
                    title: "Lost in Translation".to_string(),
                    year: "2003".to_string(),
                    genre: "Drama".to_string(),
                    description: "Two strangers in Tokyo.".to_string(),
                    match_reason: "City lights in your photo.".to_string(),
                },
                poster: PosterState::Image {
                    url: "https://posters.test/lit.jpg".to_string(),
                },
            }],
        };

        let text = view.to_string();
        assert!(text.contains("Mood Analysis"));
        assert!(text.contains("\"Melancholic but hopeful.\""));
        assert!(text.contains("1. Lost in Translation (2003)  [Drama]"));
        assert!(text.contains("Poster: https://posters.test/lit.jpg"));
        assert!(text.contains("Why: City lights in your photo."));
    }

    #[test]
    fn test_error_banner() {
        assert_eq!(render_error_banner("No response text"), "[!] No response text");
    }
}
