//! Configuration types for card review and conversion.
//!
//! All behaviour that is not a pure function of the card HTML is controlled
//! through [`ReviewConfig`], built via its [`ReviewConfigBuilder`]: where
//! AnkiConnect lives, how long to wait for it, how the next due card is
//! chosen, and whether images are inlined.

use crate::error::Anki2MdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default AnkiConnect endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8765";

/// AnkiConnect API version this crate speaks.
pub const DEFAULT_API_VERSION: u32 = 6;

/// Configuration for talking to Anki and converting its cards.
///
/// Built via [`ReviewConfig::builder()`] or using [`ReviewConfig::default()`].
///
/// # Example
/// ```rust
/// use anki2md::{ReviewConfig, Strategy};
///
/// let config = ReviewConfig::builder()
///     .endpoint("http://localhost:8765")
///     .strategy(Strategy::GuiSession)
///     .request_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert!(config.inline_media);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// AnkiConnect URL. Default: `http://127.0.0.1:8765`.
    pub endpoint: String,

    /// AnkiConnect API key, when the add-on is configured to require one.
    pub api_key: Option<String>,

    /// AnkiConnect API version sent with every request. Default: 6.
    pub api_version: u32,

    /// Per-request timeout in seconds. Default: 30.
    ///
    /// Anki answers from its main thread, so a modal dialog in the desktop
    /// app can stall every request until it is dismissed.
    pub request_timeout_secs: u64,

    /// How the next due card is selected. Default: [`Strategy::DirectLookup`].
    pub strategy: Strategy,

    /// Replace relative image sources with `data:` URLs. Default: true.
    pub inline_media: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_version: DEFAULT_API_VERSION,
            request_timeout_secs: 30,
            strategy: Strategy::default(),
            inline_media: true,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("strategy", &self.strategy)
            .field("inline_media", &self.inline_media)
            .finish()
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_version(mut self, version: u32) -> Self {
        self.config.api_version = version;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn inline_media(mut self, v: bool) -> Self {
        self.config.inline_media = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, Anki2MdError> {
        let c = &self.config;
        let endpoint = c.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Anki2MdError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(Anki2MdError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.api_version == 0 {
            return Err(Anki2MdError::InvalidConfig(
                "API version must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the next due card is chosen.
///
/// | Strategy | AnkiConnect actions | Effect on the Anki GUI |
/// |----------|---------------------|------------------------|
/// | `DirectLookup` | `findCards` + `cardsInfo`, `answerCards` | none |
/// | `GuiSession` | `guiDeckReview` + `guiCurrentCard`, `guiAnswerCard` | opens the reviewer |
///
/// `DirectLookup` leaves the desktop app alone but picks the first due card
/// itself. `GuiSession` mirrors Anki's own reviewer queue, including
/// learning-step ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Query due cards and pick the first one (default).
    #[default]
    DirectLookup,
    /// Drive Anki's own reviewer and read its current card.
    GuiSession,
}

impl FromStr for Strategy {
    type Err = Anki2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "direct_lookup" => Ok(Strategy::DirectLookup),
            "gui" | "gui_session" => Ok(Strategy::GuiSession),
            other => Err(Anki2MdError::InvalidConfig(format!(
                "unknown strategy '{}': expected direct or gui",
                other
            ))),
        }
    }
}
