use async_trait::async_trait;
use persona_spec::SubmissionDocument;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::backend::PersonaBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, DEFAULT_STORE_FAILURE};
use crate::wire::{PersonaRecord, StoreResponse};

/// [`PersonaBackend`] talking JSON over HTTP.
pub struct HttpPersonaBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpPersonaBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl PersonaBackend for HttpPersonaBackend {
    async fn store_persona(&self, document: &SubmissionDocument) -> Result<(), ClientError> {
        let url = self.config.endpoint("store_persona");
        debug!(%url, subject = %document.subject_id, "storing persona");

        let response = self
            .client
            .post(&url)
            .json(&PersonaRecord::from(document))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // The store reports failures in the body even on 2xx, and may omit it on errors.
        let parsed = serde_json::from_str::<StoreResponse>(&body).ok();
        match parsed {
            Some(reply) if status.is_success() && reply.is_success() => Ok(()),
            Some(reply) => {
                let message = reply
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_STORE_FAILURE.to_string());
                warn!(%status, %message, "persona store rejected document");
                Err(ClientError::Backend(message))
            }
            None => {
                warn!(%status, "persona store returned an unreadable reply");
                Err(ClientError::Backend(DEFAULT_STORE_FAILURE.to_string()))
            }
        }
    }

    async fn get_persona(
        &self,
        subject_id: &str,
    ) -> Result<Option<SubmissionDocument>, ClientError> {
        let url = self.config.endpoint("get_persona");
        debug!(%url, subject = %subject_id, "fetching persona");

        let response = self
            .client
            .get(&url)
            .query(&[("user_id", subject_id)])
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: StoreResponse = response.json().await?;
        if !reply.is_success() {
            debug!(status = ?reply.status, "no persona stored for subject");
            return Ok(None);
        }
        match reply.data {
            Some(data) if !data.is_null() => serde_json::from_value::<PersonaRecord>(data)
                .map(|record| Some(record.into()))
                .map_err(ClientError::Decode),
            _ => Ok(None),
        }
    }
}
