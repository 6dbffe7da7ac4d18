// GeminiBackend - Google Generative Language API completion backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::advisor::config::AdvisorConfig;
use crate::advisor::errors::AdvisorError;
use crate::advisor::traits::{CompletionBackend, PromptRequest};
use crate::advisor::utils;

/// Google Generative Language API (`generateContent`)
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<OutgoingPart<'a>>,
}

#[derive(Debug, Serialize)]
struct OutgoingPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<IncomingPart>,
}

#[derive(Debug, Deserialize)]
struct IncomingPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AdvisorError::MissingApiKey("gemini".to_string()))?;

        let client = utils::build_http_client(config.timeout_seconds, config.proxy.as_deref())?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_body<'a>(&self, prompt: &'a PromptRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutgoingPart { text: &prompt.text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &prompt.response_schema,
                temperature: self.temperature,
            },
        }
    }

    /// Extract the reply text from a `generateContent` response body
    fn extract_text(body: &str) -> Result<String, AdvisorError> {
        let response: GenerateResponse = serde_json::from_str(body)?;

        if let Some(reason) = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
        {
            return Err(AdvisorError::Blocked(reason));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AdvisorError::MalformedResponse("no candidates".to_string()))?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if matches!(reason, "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT") {
                return Err(AdvisorError::Blocked(reason.to_string()));
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AdvisorError::MalformedResponse(
                "candidate has no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &PromptRequest) -> Result<String, AdvisorError> {
        tracing::debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "completion request failed");
            return Err(AdvisorError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Self::extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Read one HTTP request (headers plus Content-Length body)
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve a single canned response on a loopback port; yields the request text
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        (endpoint, handle)
    }

    fn loopback_backend(endpoint: &str, timeout_secs: u64) -> GeminiBackend {
        let config = AdvisorConfig::default()
            .with_api_key(Some("test-key".to_string()))
            .with_model("gemini-test")
            .with_endpoint(endpoint)
            .with_timeout(timeout_secs);
        GeminiBackend::new(&config).unwrap()
    }

    fn sample_prompt() -> PromptRequest {
        PromptRequest {
            text: "pick one".to_string(),
            response_schema: json!({"type": "OBJECT"}),
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"selectedFormat\": \"webm\", \"reason\": \"video\"}"}]},
                "finishReason": "STOP"
            }]
        })
        .to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;

        let text = loopback_backend(&endpoint, 5)
            .complete(&sample_prompt())
            .await
            .unwrap();
        assert_eq!(text, "{\"selectedFormat\": \"webm\", \"reason\": \"video\"}");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-test:generateContent "));
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("\"responseMimeType\":\"application/json\""));
    }

    #[tokio::test]
    async fn test_complete_http_error() {
        let (endpoint, server) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#.to_string()).await;

        let err = loopback_backend(&endpoint, 5)
            .complete(&sample_prompt())
            .await
            .unwrap_err();
        match err {
            AdvisorError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected Http error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_blocked_reply() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;

        let err = loopback_backend(&endpoint, 5)
            .complete(&sample_prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::Blocked(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

        // Accept and never answer
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let err = loopback_backend(&endpoint, 1)
            .complete(&sample_prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::NetworkTimeout));
        server.abort();
    }

    fn test_config() -> AdvisorConfig {
        AdvisorConfig::default()
            .with_api_key(Some("test-key".to_string()))
            .with_model("gemini-test")
            .with_endpoint("https://example.invalid/v1beta/")
    }

    #[test]
    fn test_requires_api_key() {
        let config = AdvisorConfig::default().with_api_key(None);
        assert!(matches!(
            GeminiBackend::new(&config),
            Err(AdvisorError::MissingApiKey(_))
        ));

        let config = AdvisorConfig::default().with_api_key(Some("  ".to_string()));
        assert!(GeminiBackend::new(&config).is_err());
    }

    #[test]
    fn test_url_and_body() {
        let backend = GeminiBackend::new(&test_config()).unwrap();
        assert_eq!(
            backend.url(),
            "https://example.invalid/v1beta/models/gemini-test:generateContent"
        );

        let prompt = PromptRequest {
            text: "pick one".to_string(),
            response_schema: json!({"type": "OBJECT"}),
        };
        let body = serde_json::to_value(backend.build_body(&prompt)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "pick one");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "{\"selectedFormat\": \"webm\","},
                        {"text": " \"reason\": \"video\"}"}
                    ]
                },
                "finishReason": "STOP"
            }]
        })
        .to_string();

        assert_eq!(
            GeminiBackend::extract_text(&body).unwrap(),
            "{\"selectedFormat\": \"webm\", \"reason\": \"video\"}"
        );
    }

    #[test]
    fn test_extract_text_blocked() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
        assert!(matches!(
            GeminiBackend::extract_text(&body),
            Err(AdvisorError::Blocked(_))
        ));

        let body = json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })
        .to_string();
        assert!(matches!(
            GeminiBackend::extract_text(&body),
            Err(AdvisorError::Blocked(_))
        ));
    }

    #[test]
    fn test_extract_text_empty() {
        let body = json!({"candidates": []}).to_string();
        assert!(matches!(
            GeminiBackend::extract_text(&body),
            Err(AdvisorError::MalformedResponse(_))
        ));

        let body = json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "STOP"}]
        })
        .to_string();
        assert!(matches!(
            GeminiBackend::extract_text(&body),
            Err(AdvisorError::MalformedResponse(_))
        ));

        assert!(matches!(
            GeminiBackend::extract_text("<html>"),
            Err(AdvisorError::MalformedResponse(_))
        ));
    }
}
