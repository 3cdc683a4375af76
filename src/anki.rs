//! AnkiConnect client: JSON-over-HTTP access to a running Anki instance.
//!
//! Every AnkiConnect call is a POST of `{ "action", "version", "params" }`
//! answered by `{ "result", "error" }`. [`AnkiConnect::invoke`] handles that
//! envelope once; the typed helpers below only describe their parameters and
//! result shape.
//!
//! The client is an explicitly constructed handle. Callers share it through
//! an `Arc` rather than a process-wide global, so tests can substitute stub
//! schedulers and media stores at the trait seams instead.

use crate::card::{CardId, Ease};
use crate::config::ReviewConfig;
use crate::error::Anki2MdError;
use crate::media_store::MediaStore;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

/// Response envelope shared by all AnkiConnect actions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Decode the result as `T`, or surface the action's error.
    pub fn into_result<T: DeserializeOwned>(self, action: &str) -> Result<T, Anki2MdError> {
        if let Some(message) = self.error {
            return Err(Anki2MdError::AnkiConnect {
                action: action.to_string(),
                message,
            });
        }
        serde_json::from_value(self.result).map_err(|e| Anki2MdError::InvalidResponse {
            action: action.to_string(),
            detail: e.to_string(),
        })
    }
}

/// Card details as returned by `cardsInfo`. Unused fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: u64,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub deck_name: String,
    #[serde(default)]
    pub model_name: String,
}

/// The reviewer's current card as returned by `guiCurrentCard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiCard {
    pub card_id: u64,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub deck_name: String,
    /// Ease buttons the reviewer currently offers.
    #[serde(default)]
    pub buttons: Vec<u8>,
}

/// One entry of an `answerCards` request.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardAnswer {
    card_id: u64,
    ease: u8,
}

/// Handle to an AnkiConnect endpoint.
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    client: Client,
    endpoint: String,
    api_version: u32,
    api_key: Option<String>,
}

impl AnkiConnect {
    /// Build a client from the endpoint, key and timeout in `config`.
    pub fn new(config: &ReviewConfig) -> Result<Self, Anki2MdError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Anki2MdError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_version: config.api_version,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call `action` and decode its result as `T`.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<Value>,
    ) -> Result<T, Anki2MdError> {
        let body = request_body(action, self.api_version, params, self.api_key.as_deref());
        trace!("AnkiConnect → {}", action);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Anki2MdError::Unreachable {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Anki2MdError::InvalidResponse {
                action: action.to_string(),
                detail: format!("HTTP {status}"),
            });
        }

        let envelope: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| Anki2MdError::InvalidResponse {
                    action: action.to_string(),
                    detail: e.to_string(),
                })?;
        debug!("AnkiConnect {} ok", action);
        envelope.into_result(action)
    }

    /// AnkiConnect API version; doubles as a connectivity check.
    pub async fn version(&self) -> Result<u32, Anki2MdError> {
        self.invoke("version", None).await
    }

    pub async fn find_cards(&self, query: &str) -> Result<Vec<u64>, Anki2MdError> {
        self.invoke("findCards", Some(json!({ "query": query })))
            .await
    }

    pub async fn cards_info(&self, card_ids: &[u64]) -> Result<Vec<CardInfo>, Anki2MdError> {
        self.invoke("cardsInfo", Some(json!({ "cards": card_ids })))
            .await
    }

    /// Record answers; one success flag per entry, in request order.
    pub async fn answer_cards(&self, answers: &[(CardId, Ease)]) -> Result<Vec<bool>, Anki2MdError> {
        let answers: Vec<CardAnswer> = answers
            .iter()
            .map(|(id, ease)| CardAnswer {
                card_id: id.0,
                ease: ease.value(),
            })
            .collect();
        self.invoke("answerCards", Some(json!({ "answers": answers })))
            .await
    }

    /// Base64 contents of a media file, `None` when Anki has no such file.
    pub async fn retrieve_media_file(&self, filename: &str) -> Result<Option<String>, Anki2MdError> {
        let result: Value = self
            .invoke("retrieveMediaFile", Some(json!({ "filename": filename })))
            .await?;
        Ok(media_payload(result))
    }

    /// Open the reviewer on `deck`. Returns whether Anki switched to it.
    pub async fn gui_deck_review(&self, deck: &str) -> Result<bool, Anki2MdError> {
        self.invoke("guiDeckReview", Some(json!({ "name": deck })))
            .await
    }

    /// The card shown in the reviewer, `None` when it is not reviewing.
    pub async fn gui_current_card(&self) -> Result<Option<GuiCard>, Anki2MdError> {
        self.invoke("guiCurrentCard", None).await
    }

    pub async fn gui_show_answer(&self) -> Result<bool, Anki2MdError> {
        self.invoke("guiShowAnswer", None).await
    }

    pub async fn gui_answer_card(&self, ease: Ease) -> Result<bool, Anki2MdError> {
        self.invoke("guiAnswerCard", Some(json!({ "ease": ease.value() })))
            .await
    }
}

#[async_trait]
impl MediaStore for AnkiConnect {
    async fn retrieve(&self, filename: &str) -> Result<Option<String>, Anki2MdError> {
        self.retrieve_media_file(filename).await
    }
}

/// Build the JSON request envelope for `action`.
fn request_body(action: &str, version: u32, params: Option<Value>, key: Option<&str>) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("action".to_string(), Value::String(action.to_string()));
    body.insert("version".to_string(), Value::Number(version.into()));
    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }
    if let Some(key) = key {
        body.insert("key".to_string(), Value::String(key.to_string()));
    }
    Value::Object(body)
}

/// `retrieveMediaFile` answers `false` for missing files.
fn media_payload(result: Value) -> Option<String> {
    match result {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
