use crate::{Error, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Authenticated `generateContent` transport for one Gemini model.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    /// `model` may be given bare (`gemini-2.5-flash`) or as `models/gemini-2.5-flash`.
    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = match model.strip_prefix("models/") {
            Some(bare) => bare.to_string(),
            None => model,
        };

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    /// Point the client at another host (a local mock server in tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, self.model
        )
    }

    /// POST `request` to the model's `generateContent` endpoint and decode
    /// the envelope. Transport failures and timeouts surface as
    /// [`Error::Http`].
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request to {} failed: {}", self.model, e);
                Error::Http(e)
            })?;

        decode_reply(response).await
    }
}

async fn decode_reply<Resp: DeserializeOwned>(response: Response) -> Result<Resp> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!("Gemini API error (status {}): {}", status, body);
        return Err(Error::AiProvider(format!(
            "Gemini API error (status {}): {}",
            status, body
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Undecodable Gemini envelope: {}\nBody: {}", e, body);
        Error::MalformedResponse(format!("Failed to parse Gemini response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::GenerateContentResponse;
    use crate::models::FailureReason;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: String, timeout: Duration) -> GeminiHttpClient {
        GeminiHttpClient::new(
            "test-key".to_string(),
            "models/gemini-2.5-flash".to_string(),
            timeout,
        )
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_posts_to_bare_model_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(format!("{}/", server.uri()), Duration::from_secs(5));
        assert_eq!(client.model(), "gemini-2.5-flash");

        let response: GenerateContentResponse = client
            .generate_content(&serde_json::json!({ "contents": [] }))
            .await
            .unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_a_service_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = client_for(server.uri(), Duration::from_millis(100));
        let err = client
            .generate_content::<_, GenerateContentResponse>(&serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(FailureReason::from(&err), FailureReason::ServiceCall);
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_service_failure() {
        // Reserve a port, then free it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr), Duration::from_secs(5));
        let err = client
            .generate_content::<_, GenerateContentResponse>(&serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(FailureReason::from(&err), FailureReason::ServiceCall);
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(server.uri(), Duration::from_secs(5));
        let err = client
            .generate_content::<_, GenerateContentResponse>(&serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
