//! Configuration for the extraction pipeline.
//!
//! Every knob lives in [`ExtractorConfig`], built via its
//! [`ExtractorConfigBuilder`]. One struct makes it trivial to share a config
//! across a batch run, log it, and diff two runs to understand why their
//! results differ.
//!
//! # Design choice: explicit over ambient
//! The credential is a config field, not module state read at import time.
//! Callers that want environment lookup get it at client-resolution time
//! (`GEMINI_API_KEY`, then `GOOGLE_API_KEY`), and tests inject a fake
//! client through [`ExtractorConfigBuilder::client`] without touching the
//! environment at all.

use crate::error::ExtractError;
use crate::inference::InferenceClient;
use std::fmt;
use std::sync::Arc;

/// Model aliases tried in order until one answers with usable text.
///
/// The portal-era deployments pinned `gemini-2.0-flash`; the older aliases
/// stay as fallbacks for accounts where the newest model is gated.
pub const DEFAULT_MODEL_ALIASES: [&str; 3] =
    ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

/// Configuration for PDF and screenshot extraction.
///
/// Built via [`ExtractorConfig::builder()`] or [`ExtractorConfig::default()`].
///
/// # Example
/// ```rust
/// use gemtracker_extract::ExtractorConfig;
///
/// let config = ExtractorConfig::builder()
///     .page_limit(3)
///     .api_key("AIza...")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Leading pages whose text feeds the pattern and inference stages.
    /// Default: 2.
    ///
    /// GeM bid sheets put the bid number, end date and item category on the
    /// first page (occasionally spilling to the second). Reading further
    /// adds latency and prompt noise for no extra fields; raise this only
    /// for non-standard documents.
    pub page_limit: usize,

    /// Character cap on the page text appended to the inference prompt.
    /// Default: 5000.
    ///
    /// The labelled fields sit at the top of the document, so a 5 000-char
    /// window covers them with room to spare while keeping per-document
    /// token cost flat regardless of how verbose the bid sheet is.
    pub max_prompt_chars: usize,

    /// Explicit API key for the hosted Gemini endpoint.
    ///
    /// If `None`, client resolution falls back to the `GEMINI_API_KEY` and
    /// `GOOGLE_API_KEY` environment variables; if those are unset too, the
    /// inference stage is skipped (PDF path) or fails with a missing-
    /// credential error (screenshot path).
    pub api_key: Option<String>,

    /// Model aliases tried in order. Default: [`DEFAULT_MODEL_ALIASES`].
    ///
    /// The first alias that returns non-empty text wins. Hosted model names
    /// get retired without notice; an ordered list keeps extraction alive
    /// across those retirements without a redeploy.
    pub model_aliases: Vec<String>,

    /// Pre-constructed inference client. Takes precedence over `api_key`
    /// and the environment. Useful in tests.
    pub client: Option<Arc<dyn InferenceClient>>,

    /// Per-inference-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Documents processed in parallel by batch extraction. Default: 4.
    ///
    /// Each document costs at most one inference call, so this is bounded
    /// by API rate limits rather than CPU. Lower it if the endpoint starts
    /// answering 429.
    pub concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            page_limit: 2,
            max_prompt_chars: 5000,
            api_key: None,
            model_aliases: DEFAULT_MODEL_ALIASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            client: None,
            api_timeout_secs: 60,
            concurrency: 4,
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("page_limit", &self.page_limit)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_aliases", &self.model_aliases)
            .field("client", &self.client.as_ref().map(|_| "<dyn InferenceClient>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ExtractorConfig {
    /// Create a new builder for `ExtractorConfig`.
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn page_limit(mut self, n: usize) -> Self {
        self.config.page_limit = n.max(1);
        self
    }

    pub fn max_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_prompt_chars = n.max(100);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Replace the whole alias list. Order is the retry order.
    pub fn model_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.model_aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn client(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractorConfig, ExtractError> {
        let c = &self.config;
        if c.model_aliases.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "model_aliases must contain at least one alias".into(),
            ));
        }
        if c.model_aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(ExtractError::InvalidConfig(
                "model_aliases must not contain blank entries".into(),
            ));
        }
        if c.page_limit == 0 {
            return Err(ExtractError::InvalidConfig("page_limit must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
