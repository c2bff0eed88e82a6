//! Inference client seam and the hosted Gemini implementation.
//!
//! ## Why a trait seam?
//!
//! Both extraction paths end at the same operation: send a prompt (plus,
//! for screenshots, an inline image) to a generative model and get text
//! back. Putting that operation behind [`InferenceClient`] keeps the
//! pipeline testable without a network (tests inject scripted fakes via
//! [`crate::config::ExtractorConfig::client`]) and keeps the REST plumbing
//! out of the stages.
//!
//! [`generate_with_fallback`] adds the alias walk on top: hosted model
//! names get retired without notice, so callers configure an ordered list
//! of acceptable aliases and the walk stops at the first one that answers
//! with non-empty text.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ExtractorConfig;
use crate::error::InferenceError;

/// Hosted Gemini API base. Override per client for proxies.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Cap on error-body text carried into [`InferenceError::Http`].
const ERROR_DETAIL_CHARS: usize = 300;

// ── Request model ─────────────────────────────────────────────────────────

/// An inline image attached to a request, raw bytes plus declared MIME
/// type. Base64 encoding happens at request-build time, not before.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One generation request: a prompt and an optional image.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl InferenceRequest {
    /// Text-only request (the PDF field stage).
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    /// Prompt plus one inline image (the screenshot path).
    pub fn with_image(
        prompt: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(InlineImage {
                mime_type: mime_type.into(),
                data,
            }),
        }
    }
}

/// Anything that can turn an [`InferenceRequest`] into model text.
///
/// `model` is the alias to call; implementations that serve a single fixed
/// model may ignore it.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &InferenceRequest,
    ) -> Result<String, InferenceError>;
}

// ── Alias walk ────────────────────────────────────────────────────────────

/// Try `aliases` in order; return the first non-empty response text.
///
/// Per-alias failures (transport, HTTP errors, empty replies) are logged
/// and the walk continues. Only when the whole list is exhausted does the
/// caller see an error, carrying the last failure for diagnosis.
pub async fn generate_with_fallback(
    client: &dyn InferenceClient,
    aliases: &[String],
    request: &InferenceRequest,
) -> Result<String, InferenceError> {
    let mut last_error: Option<InferenceError> = None;
    for alias in aliases {
        debug!(model = %alias, "attempting inference");
        match client.generate(alias, request).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(model = %alias, chars = text.len(), "inference succeeded");
                return Ok(text);
            }
            Ok(_) => {
                warn!(model = %alias, "empty response, trying next alias");
                last_error = Some(InferenceError::EmptyResponse {
                    model: alias.clone(),
                });
            }
            Err(e) => {
                warn!(model = %alias, error = %e, "inference failed, trying next alias");
                last_error = Some(e);
            }
        }
    }
    Err(InferenceError::Exhausted {
        attempts: aliases.len(),
        last: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no model aliases configured".into()),
    })
}

// ── Client resolution ─────────────────────────────────────────────────────

/// Resolve the inference client for a run.
///
/// Resolution order:
/// 1. `config.client` — a pre-built client (tests, custom backends);
/// 2. `config.api_key` — explicit credential, hosted Gemini;
/// 3. `GEMINI_API_KEY`, then `GOOGLE_API_KEY` from the environment;
/// 4. `None` — the PDF path skips its inference stage, the screenshot
///    path fails with a missing-credential error.
pub(crate) fn resolve_client(config: &ExtractorConfig) -> Option<Arc<dyn InferenceClient>> {
    if let Some(client) = &config.client {
        return Some(Arc::clone(client));
    }
    if let Some(key) = &config.api_key {
        return Some(Arc::new(GeminiClient::new(
            key.clone(),
            config.api_timeout_secs,
        )));
    }
    for var in ["GEMINI_API_KEY", "GOOGLE_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                debug!(source = var, "using API key from environment");
                return Some(Arc::new(GeminiClient::new(key, config.api_timeout_secs)));
            }
        }
    }
    None
}

// ── Hosted Gemini client ──────────────────────────────────────────────────

/// [`InferenceClient`] for the hosted Gemini `generateContent` endpoint.
///
/// One POST per call, credential in the `x-goog-api-key` header (never the
/// URL, so it cannot leak into logs), timeout applied per request.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_owned(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Point the client at a different host (proxy, regional endpoint).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: &InferenceRequest,
    ) -> Result<String, InferenceError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateRequest::from_request(request);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport {
                model: model.to_owned(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_else(|_| String::new());
            return Err(InferenceError::Http {
                model: model.to_owned(),
                status: status.as_u16(),
                detail: body_text.chars().take(ERROR_DETAIL_CHARS).collect(),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| InferenceError::Transport {
                    model: model.to_owned(),
                    source: e,
                })?;

        let text = parsed.first_candidate_text();
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyResponse {
                model: model.to_owned(),
            });
        }
        Ok(text)
    }
}

// ── Wire format ───────────────────────────────────────────────────────────
// generateContent request/response, limited to the parts this crate uses.

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    /// Base64, standard alphabet.
    data: String,
}

impl GenerateRequest {
    fn from_request(request: &InferenceRequest) -> Self {
        let mut parts = vec![RequestPart {
            text: Some(request.prompt.clone()),
            inline_data: None,
        }];
        if let Some(image) = &request.image {
            parts.push(RequestPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.data),
                }),
            });
        }
        Self {
            contents: vec![RequestContent { parts }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    fn first_candidate_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn text_only_body_has_one_part() {
        let body = GenerateRequest::from_request(&InferenceRequest::text("hello"));
        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts.as_array().unwrap().len(), 1);
        assert_eq!(parts[0]["text"], "hello");
        assert!(parts[0].get("inline_data").is_none());
    }

    #[test]
    fn image_body_carries_base64_inline_data() {
        let body = GenerateRequest::from_request(&InferenceRequest::with_image(
            "describe",
            "image/png",
            vec![1, 2, 3],
        ));
        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts.as_array().unwrap().len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], BASE64.encode([1, 2, 3]));
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"foo"},{"text":"bar"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.first_candidate_text(), "foobar");
    }

    #[test]
    fn response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.first_candidate_text(), "");
    }

    /// Scripted client: pops one canned result per call, records the model
    /// aliases it was asked for.
    struct ScriptedClient {
        script: Mutex<Vec<Result<String, InferenceError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<String, InferenceError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn generate(
            &self,
            model: &str,
            _request: &InferenceRequest,
        ) -> Result<String, InferenceError> {
            self.calls.lock().unwrap().push(model.to_owned());
            self.script.lock().unwrap().remove(0)
        }
    }

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn fallback_stops_at_first_success() {
        let client = ScriptedClient::new(vec![Ok("answer".into())]);
        let got = generate_with_fallback(
            &client,
            &aliases(&["gemini-2.0-flash", "gemini-1.5-flash"]),
            &InferenceRequest::text("q"),
        )
        .await
        .unwrap();
        assert_eq!(got, "answer");
        assert_eq!(*client.calls.lock().unwrap(), vec!["gemini-2.0-flash"]);
    }

    #[tokio::test]
    async fn fallback_walks_aliases_in_order() {
        let client = ScriptedClient::new(vec![
            Err(InferenceError::Http {
                model: "gemini-2.0-flash".into(),
                status: 503,
                detail: "overloaded".into(),
            }),
            Ok("   ".into()),
            Ok("late answer".into()),
        ]);
        let got = generate_with_fallback(
            &client,
            &aliases(&["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"]),
            &InferenceRequest::text("q"),
        )
        .await
        .unwrap();
        assert_eq!(got, "late answer");
        assert_eq!(
            *client.calls.lock().unwrap(),
            vec!["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"]
        );
    }

    #[tokio::test]
    async fn fallback_reports_exhaustion_with_last_error() {
        let client = ScriptedClient::new(vec![
            Err(InferenceError::Http {
                model: "a".into(),
                status: 500,
                detail: "boom".into(),
            }),
            Err(InferenceError::Http {
                model: "b".into(),
                status: 429,
                detail: "slow down".into(),
            }),
        ]);
        let err = generate_with_fallback(&client, &aliases(&["a", "b"]), &InferenceRequest::text("q"))
            .await
            .unwrap_err();
        match err {
            InferenceError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.contains("429"), "got: {last}");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn resolve_prefers_injected_client() {
        let injected: Arc<dyn InferenceClient> = Arc::new(ScriptedClient::new(vec![]));
        let config = ExtractorConfig::builder()
            .client(Arc::clone(&injected))
            .api_key("ignored")
            .build()
            .unwrap();
        let resolved = resolve_client(&config).expect("client should resolve");
        assert!(Arc::ptr_eq(&resolved, &injected));
    }

    #[test]
    fn resolve_builds_gemini_client_from_key() {
        let config = ExtractorConfig::builder().api_key("AIzaTest").build().unwrap();
        assert!(resolve_client(&config).is_some());
    }
}
