//! Registry client — validates a card and POSTs it to a model registry.

use crate::card::ModelCard;
use crate::error::CardError;
use crate::schema::SchemaValidator;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a model card registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
}

impl RegistryClient {
    /// Client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, CardError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CardError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Validate `card` and POST its canonical JSON to `endpoint`.
    ///
    /// Returns the registry's JSON reply. An invalid card returns `Ok(None)`
    /// without touching the network. A transport error, a non-2xx status
    /// or an unparsable reply is reported and also returns `Ok(None)`. Only
    /// a broken bundled schema is an `Err`.
    pub async fn submit(&self, card: &ModelCard, endpoint: &str) -> Result<Option<Value>, CardError> {
        let validator = SchemaValidator::bundled()?;
        if !card.validate_with(validator) {
            debug!(card = %card.name, "not submitting invalid model card");
            return Ok(None);
        }
        let body = match card.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("An error occurred: {e}");
                return Ok(None);
            }
        };

        match self.post(endpoint, body).await {
            Ok(reply) => {
                info!(card = %card.name, endpoint, "Submitted model card");
                Ok(Some(reply))
            }
            Err(e) => {
                error!(endpoint, "An error occurred: {e}");
                Ok(None)
            }
        }
    }

    async fn post(&self, endpoint: &str, body: String) -> Result<Value, reqwest::Error> {
        self.http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}
