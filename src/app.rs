//! Application shell: wires services into a capture surface and drives
//! one-shot and interactive sessions.

use crate::ai::{GeminiRecommendationClient, RecommendationService};
use crate::capture::{
    CaptureStatus, MoodCapture, ObjectUrlStore, PreviewStore, SpeechRecognizer,
    UnavailableRecognizer,
};
use crate::media::MediaAttachment;
use crate::models::{Config, RequestOutcome};
use crate::poster::{DisabledPosterLookup, HttpPosterLookup, PosterLookup};
use crate::render::{render_error_banner, render_results, ResultsView};
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

const EMPTY_INPUT_HINT: &str = "Describe your mood or attach an image or video first.";

const HELP: &str = "\
Type how you feel, then :submit.
  :attach PATH    attach an image or short video
  :clear-media    remove the attachment
  :clear-text     clear the mood text
  :listen         start/stop voice input
  :submit         find movies
  :status         show the current input
  :help           show this help
  :quit           exit";

/// Coordinates mood capture, recommendation requests and rendering.
pub struct App {
    capture: MoodCapture,
    posters: Arc<dyn PosterLookup>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub recommender: Arc<dyn RecommendationService>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub previews: Box<dyn PreviewStore>,
    pub posters: Arc<dyn PosterLookup>,
}

/// What a submit attempt produced, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReport {
    Results(ResultsView),
    Error(String),
    Disabled,
}

impl SubmitReport {
    pub fn is_error(&self) -> bool {
        matches!(self, SubmitReport::Error(_))
    }
}

impl fmt::Display for SubmitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitReport::Results(view) => write!(f, "{}", view),
            SubmitReport::Error(message) => f.write_str(&render_error_banner(message)),
            SubmitReport::Disabled => f.write_str(EMPTY_INPUT_HINT),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Attach(PathBuf),
    ClearMedia,
    ClearText,
    Listen,
    Submit,
    Status,
    Help,
    Quit,
    Text(String),
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    if !line.starts_with(':') {
        return Ok(Command::Text(line.to_string()));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    match name {
        ":attach" if arg.is_empty() => Err("Usage: :attach PATH".to_string()),
        ":attach" => Ok(Command::Attach(PathBuf::from(arg))),
        ":clear-media" => Ok(Command::ClearMedia),
        ":clear-text" => Ok(Command::ClearText),
        ":listen" => Ok(Command::Listen),
        ":submit" => Ok(Command::Submit),
        ":status" => Ok(Command::Status),
        ":help" => Ok(Command::Help),
        ":quit" | ":q" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{}'. Type :help.", other)),
    }
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            capture: MoodCapture::new(
                services.recommender,
                services.recognizer,
                services.previews,
            ),
            posters: services.posters,
        }
    }

    /// Construct an app from configuration (`Config::from_env`).
    pub fn new(config: &Config) -> Self {
        // Reuse one HTTP connection pool across clients.
        let http_client = reqwest::Client::new();

        let recommender = GeminiRecommendationClient::new_with_client(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.request_timeout,
            http_client.clone(),
        );
        info!("Recommendation model: {}", recommender.model());

        let posters: Arc<dyn PosterLookup> = if config.poster_lookup {
            Arc::new(HttpPosterLookup::new_with_client(http_client))
        } else {
            info!("POSTER_LOOKUP disabled; cards will show placeholders");
            Arc::new(DisabledPosterLookup)
        };

        Self::with_services(AppServices {
            recommender: Arc::new(recommender),
            recognizer: Box::new(UnavailableRecognizer),
            previews: Box::new(ObjectUrlStore::new()),
            posters,
        })
    }

    pub fn capture(&self) -> &MoodCapture {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut MoodCapture {
        &mut self.capture
    }

    /// Submit the current input and render whatever comes back.
    pub async fn submit(&mut self) -> SubmitReport {
        // A leftover error from an earlier attempt is not this attempt's result.
        if !self.capture.state().can_submit() {
            return SubmitReport::Disabled;
        }

        match self.capture.submit().await {
            Some(RequestOutcome::Success(response)) => {
                SubmitReport::Results(render_results(&response, Arc::clone(&self.posters)).await)
            }
            Some(RequestOutcome::Failure { message, .. }) => SubmitReport::Error(message),
            // Rejected locally (oversized media); the error was set just now.
            None => match &self.capture.state().error {
                Some(message) => SubmitReport::Error(message.clone()),
                None => SubmitReport::Disabled,
            },
        }
    }

    /// Single submission from command-line input.
    pub async fn run_once(
        &mut self,
        text: Option<String>,
        media: Option<PathBuf>,
    ) -> Result<SubmitReport> {
        if let Some(text) = text {
            self.capture.edit_text(text);
        }
        if let Some(path) = media {
            let attachment = MediaAttachment::from_path(&path).await?;
            self.capture.attach(attachment);
        }
        Ok(self.submit().await)
    }

    /// Line-oriented session: plain lines set the mood text, `:`-prefixed
    /// lines are commands.
    pub async fn run_interactive<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(&mut output, HELP).await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            self.capture.poll_transcript();

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    write_line(&mut output, &message).await?;
                    continue;
                }
            };

            match command {
                Command::Quit => break,
                Command::Help => write_line(&mut output, HELP).await?,
                Command::Text(text) => {
                    if !text.is_empty() {
                        self.capture.edit_text(text);
                    }
                }
                Command::ClearText => self.capture.clear_text(),
                Command::ClearMedia => self.capture.clear_media(),
                Command::Attach(path) => match MediaAttachment::from_path(&path).await {
                    Ok(attachment) => {
                        let message = format!(
                            "Attached {} ({})",
                            attachment.name(),
                            attachment.category().as_str()
                        );
                        self.capture.attach(attachment);
                        write_line(&mut output, &message).await?;
                    }
                    Err(e) => write_line(&mut output, &render_error_banner(&e.to_string())).await?,
                },
                Command::Listen => {
                    let was_listening = self.capture.is_listening();
                    self.capture.toggle_listening();
                    let message = match (was_listening, self.capture.is_listening()) {
                        (_, true) => "Listening... (:listen again to stop)".to_string(),
                        (true, false) => format!(
                            "Stopped listening. Text: {}",
                            self.capture.state().input.text
                        ),
                        // Start failed.
                        (false, false) => render_error_banner(
                            self.capture
                                .state()
                                .error
                                .as_deref()
                                .unwrap_or("Voice input unavailable"),
                        ),
                    };
                    write_line(&mut output, &message).await?;
                }
                Command::Status => {
                    let status = self.status_line();
                    write_line(&mut output, &status).await?;
                }
                Command::Submit => {
                    if self.capture.is_listening() {
                        self.capture.toggle_listening();
                    }
                    write_line(&mut output, "Analyzing mood...").await?;
                    let report = self.submit().await;
                    write_line(&mut output, &report.to_string()).await?;
                }
            }
        }

        self.capture.shutdown();
        output.flush().await?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let state = self.capture.state();
        let media = match &state.input.media {
            Some(media) => format!("{} ({})", media.name(), media.category().as_str()),
            None => "none".to_string(),
        };
        let status = match state.status() {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Listening => "listening",
            CaptureStatus::Submitting => "submitting",
            CaptureStatus::IdleWithResult => "showing results",
            CaptureStatus::IdleWithError => "showing error",
        };

        let mut line = format!(
            "Status: {}\nText: {}\nMedia: {}",
            status,
            if state.input.text.is_empty() {
                "(empty)"
            } else {
                state.input.text.as_str()
            },
            media
        );
        if let Some(interim) = &state.interim {
            line.push_str(&format!("\nHearing: {}", interim));
        }
        line
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockRecommendationClient;
    use crate::capture::{ScriptedRecognizer, TranscriptFragment};
    use crate::poster::MockPosterLookup;

    fn build_test_app(
        recommender: MockRecommendationClient,
        recognizer: Box<dyn SpeechRecognizer>,
    ) -> App {
        App::with_services(AppServices {
            recommender: Arc::new(recommender),
            recognizer,
            previews: Box::new(ObjectUrlStore::new()),
            posters: Arc::new(MockPosterLookup::new()),
        })
    }

    async fn run_script(app: &mut App, script: &str) -> String {
        let mut output = Vec::new();
        app.run_interactive(script.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("  feeling blue "),
            Ok(Command::Text("feeling blue".to_string()))
        );
        assert_eq!(
            parse_command(":attach  /tmp/my photo.jpg"),
            Ok(Command::Attach(PathBuf::from("/tmp/my photo.jpg")))
        );
        assert!(parse_command(":attach").is_err());
        assert_eq!(parse_command(":q"), Ok(Command::Quit));
        assert!(parse_command(":dance").is_err());
    }

    #[tokio::test]
    async fn test_run_once_renders_results() {
        let recommender = MockRecommendationClient::new();
        let probe = recommender.clone();
        let mut app = build_test_app(recommender, Box::new(UnavailableRecognizer));

        let report = app
            .run_once(Some("cozy rainy afternoon".to_string()), None)
            .await
            .unwrap();

        match report {
            SubmitReport::Results(view) => assert_eq!(view.cards.len(), 8),
            other => panic!("unexpected report: {:?}", other),
        }
        assert_eq!(probe.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_run_once_without_input_is_disabled() {
        let recommender = MockRecommendationClient::new();
        let probe = recommender.clone();
        let mut app = build_test_app(recommender, Box::new(UnavailableRecognizer));

        let report = app.run_once(None, None).await.unwrap();
        assert_eq!(report, SubmitReport::Disabled);
        assert_eq!(report.to_string(), EMPTY_INPUT_HINT);
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_interactive_session_with_voice() {
        let recommender = MockRecommendationClient::new();
        let probe = recommender.clone();
        let recognizer = ScriptedRecognizer::new(vec![
            TranscriptFragment::interim("sleep"),
            TranscriptFragment::finalized("sleepy sunday"),
        ])
        .hold_open();
        let mut app = build_test_app(recommender, Box::new(recognizer));

        let output = run_script(
            &mut app,
            "Feeling\n:listen\n:status\n:listen\n:submit\n:quit\n",
        )
        .await;

        assert!(output.contains("Listening..."));
        assert!(output.contains("Text: Feeling sleepy sunday"));
        assert!(output.contains("=== Recommendations ==="));
        assert_eq!(
            probe.last_call().unwrap().text,
            "Feeling sleepy sunday"
        );
    }

    #[tokio::test]
    async fn test_interactive_reports_errors_and_keeps_text() {
        let recommender = MockRecommendationClient::new().with_malformed_reply("not json");
        let mut app = build_test_app(recommender, Box::new(UnavailableRecognizer));

        let output = run_script(
            &mut app,
            ":submit\nrainy night\n:listen\n:attach /no/such/file.png\n:submit\n:status\n:bogus\n",
        )
        .await;

        assert!(output.contains(EMPTY_INPUT_HINT));
        assert!(output.contains("[!] Voice input unavailable"));
        assert!(output.contains("[!] Could not read media"));
        assert!(output.contains("[!] Malformed response"));
        assert!(output.contains("Text: rainy night"));
        assert!(output.contains("Unknown command ':bogus'"));
        assert!(!output.contains("=== Recommendations ==="));
    }

    #[tokio::test]
    async fn test_empty_submit_after_failure_shows_hint() {
        let recommender = MockRecommendationClient::new().with_malformed_reply("not json");
        let probe = recommender.clone();
        let mut app = build_test_app(recommender, Box::new(UnavailableRecognizer));

        let first = app.run_once(Some("rainy".to_string()), None).await.unwrap();
        assert!(first.is_error());

        app.capture_mut().clear_text();
        let second = app.submit().await;

        assert_eq!(second, SubmitReport::Disabled);
        assert_eq!(probe.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_stopping_voice_after_failure_reports_stop() {
        let recommender = MockRecommendationClient::new().with_malformed_reply("not json");
        let recognizer =
            ScriptedRecognizer::new(vec![TranscriptFragment::finalized("gloomy")]).hold_open();
        let mut app = build_test_app(recommender, Box::new(recognizer));

        let output = run_script(&mut app, "rainy\n:submit\n:listen\n:listen\n:quit\n").await;

        assert_eq!(output.matches("[!] Malformed response").count(), 1);
        assert!(output.contains("Listening..."));
        assert!(output.contains("Stopped listening. Text: rainy gloomy"));
    }

    #[tokio::test]
    async fn test_oversized_submit_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.mp4");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(crate::media::MAX_MEDIA_BYTES + 1).unwrap();

        let recommender = MockRecommendationClient::new();
        let probe = recommender.clone();
        let mut app = build_test_app(recommender, Box::new(UnavailableRecognizer));

        let report = app.run_once(None, Some(path)).await.unwrap();

        match report {
            SubmitReport::Error(message) => assert!(message.starts_with("File too large")),
            other => panic!("unexpected report: {:?}", other),
        }
        assert_eq!(probe.get_call_count(), 0);
    }
}
