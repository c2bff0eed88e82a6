//! Screenshot analysis: portal dashboard image in, bid statuses out.
//!
//! Unlike the PDF chain there is no deterministic fallback here; reading a
//! progress bar out of a PNG is model territory. What remains from the
//! chain's discipline is the alias walk (first model alias that answers
//! wins) and the fence-tolerant JSON parsing.
//!
//! The three failure modes stay distinct so callers can react properly:
//! [`ScreenshotError::MissingCredential`] is a deployment problem,
//! [`ScreenshotError::ServiceUnavailable`] a model outage worth retrying
//! later, [`ScreenshotError::MalformedResponse`] a reply that did not
//! follow the contract.

use tracing::info;

use crate::config::ExtractorConfig;
use crate::error::{InferenceError, ScreenshotError};
use crate::inference::{self, generate_with_fallback, InferenceRequest};
use crate::output::ScreenshotBid;
use crate::pipeline::fence::{self, truncate_chars};
use crate::prompts;

/// Read every visible bid row off a portal screenshot.
///
/// `mime_type` is the image's declared type (`image/png`, `image/jpeg`,
/// ...); the bytes are passed to the model untouched. An empty result is
/// valid: a screenshot with no bid rows yields `Ok(vec![])`.
pub async fn extract_from_screenshot(
    image: &[u8],
    mime_type: &str,
    config: &ExtractorConfig,
) -> Result<Vec<ScreenshotBid>, ScreenshotError> {
    let Some(client) = inference::resolve_client(config) else {
        return Err(ScreenshotError::MissingCredential);
    };

    info!(mime = %mime_type, bytes = image.len(), "analyzing portal screenshot");
    let request =
        InferenceRequest::with_image(prompts::SCREENSHOT_PROMPT, mime_type, image.to_vec());

    let reply = generate_with_fallback(client.as_ref(), &config.model_aliases, &request)
        .await
        .map_err(|e| match e {
            InferenceError::Exhausted { attempts, last } => ScreenshotError::ServiceUnavailable {
                models_tried: attempts,
                detail: last,
            },
            other => ScreenshotError::ServiceUnavailable {
                models_tried: config.model_aliases.len(),
                detail: other.to_string(),
            },
        })?;

    let bids: Vec<ScreenshotBid> =
        fence::parse_fenced_json(&reply).map_err(|e| ScreenshotError::MalformedResponse {
            detail: format!("{e} in reply {:?}", truncate_chars(&reply, 120)),
        })?;

    info!(bids = bids.len(), "screenshot analysis complete");
    Ok(bids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::EvaluationStage;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn no_env_credentials() {
        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("GOOGLE_API_KEY");
    }

    struct CannedClient(String);

    #[async_trait]
    impl crate::inference::InferenceClient for CannedClient {
        async fn generate(
            &self,
            _model: &str,
            _request: &InferenceRequest,
        ) -> Result<String, InferenceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl crate::inference::InferenceClient for FailingClient {
        async fn generate(
            &self,
            model: &str,
            _request: &InferenceRequest,
        ) -> Result<String, InferenceError> {
            Err(InferenceError::Http {
                model: model.to_owned(),
                status: 500,
                detail: "backend error".into(),
            })
        }
    }

    /// Records the request it was given, then answers with `[]`.
    struct RecordingClient {
        seen_image: Mutex<Option<(String, usize)>>,
    }

    #[async_trait]
    impl crate::inference::InferenceClient for RecordingClient {
        async fn generate(
            &self,
            _model: &str,
            request: &InferenceRequest,
        ) -> Result<String, InferenceError> {
            *self.seen_image.lock().unwrap() = request
                .image
                .as_ref()
                .map(|img| (img.mime_type.clone(), img.data.len()));
            Ok("[]".into())
        }
    }

    fn config_with(client: Arc<dyn crate::inference::InferenceClient>) -> ExtractorConfig {
        ExtractorConfig::builder().client(client).build().unwrap()
    }

    #[tokio::test]
    async fn missing_credential_is_its_own_error() {
        no_env_credentials();
        let err = extract_from_screenshot(&[1, 2, 3], "image/png", &ExtractorConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenshotError::MissingCredential));
    }

    #[tokio::test]
    async fn fenced_array_parses_into_verbatim_records() {
        let reply = "```json\n[\
            {\"bid_number\": \"GEM/2025/B/6477908\", \"evaluation_status\": \"Financial Evaluation\", \"ra_status\": null, \"result_details\": null},\
            {\"bid_number\": \"GEM/2025/B/111\", \"evaluation_status\": \"Disqualified\", \"ra_status\": \"RA Pending\", \"result_details\": \"L2\"}\
        ]\n```";
        let config = config_with(Arc::new(CannedClient(reply.to_owned())));
        let bids = extract_from_screenshot(&[0u8; 16], "image/png", &config)
            .await
            .unwrap();
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].bid_number, "GEM/2025/B/6477908");
        assert_eq!(bids[0].evaluation_status, EvaluationStage::Financial);
        assert_eq!(bids[0].ra_status, None);
        assert_eq!(
            bids[1].evaluation_status,
            EvaluationStage::Other("Disqualified".into())
        );
        assert_eq!(bids[1].ra_status.as_deref(), Some("RA Pending"));
        assert_eq!(bids[1].result_details.as_deref(), Some("L2"));
    }

    #[tokio::test]
    async fn empty_array_is_a_valid_result() {
        let config = config_with(Arc::new(CannedClient("[]".into())));
        let bids = extract_from_screenshot(&[0u8; 16], "image/png", &config)
            .await
            .unwrap();
        assert!(bids.is_empty());
    }

    #[tokio::test]
    async fn exhausted_aliases_surface_as_service_unavailable() {
        let config = config_with(Arc::new(FailingClient));
        let err = extract_from_screenshot(&[0u8; 16], "image/png", &config)
            .await
            .unwrap_err();
        match err {
            ScreenshotError::ServiceUnavailable { models_tried, detail } => {
                assert_eq!(models_tried, 3);
                assert!(detail.contains("500"), "got: {detail}");
            }
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn prose_reply_is_malformed_response() {
        let config = config_with(Arc::new(CannedClient(
            "The screenshot shows three bids in various stages.".into(),
        )));
        let err = extract_from_screenshot(&[0u8; 16], "image/png", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenshotError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn image_bytes_and_mime_reach_the_client() {
        let client = Arc::new(RecordingClient {
            seen_image: Mutex::new(None),
        });
        let config = config_with(Arc::clone(&client) as Arc<dyn crate::inference::InferenceClient>);
        extract_from_screenshot(&[7u8; 42], "image/jpeg", &config)
            .await
            .unwrap();
        let seen = client.seen_image.lock().unwrap().clone();
        assert_eq!(seen, Some(("image/jpeg".to_owned(), 42)));
    }
}
