//! Scoped ownership of the HTTP connection pool backing one adapter
//! instance.

use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ExchangeError;
use crate::retry::{execute_with_retry, RetryConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lazily-created HTTP client exclusively owned by one adapter instance.
///
/// The underlying `reqwest::Client` is built on first use, released
/// deterministically when the resource goes out of scope, and can be
/// released early through [`HttpResource::close`]. It is never shared
/// between adapter instances.
#[derive(Debug)]
pub struct HttpResource {
    client: Mutex<Option<reqwest::Client>>,
    retry: RetryConfig,
}

impl HttpResource {
    pub fn new() -> Self {
        Self::with_retry(RetryConfig::default())
    }

    pub fn with_retry(retry: RetryConfig) -> Self {
        Self {
            client: Mutex::new(None),
            retry,
        }
    }

    /// Explicitly release the client. Subsequent requests re-open it.
    pub fn close(&self) {
        let mut slot = self.lock_slot();
        if slot.take().is_some() {
            tracing::debug!("http client closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock_slot().is_some()
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<reqwest::Client>> {
        match self.client.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn client(&self) -> Result<reqwest::Client, ExchangeError> {
        let mut slot = self.lock_slot();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::Internal(format!("failed to build http client: {}", e)))?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// GET `url` and decode the 2xx body as JSON.
    ///
    /// Transport failures and non-2xx statuses are retried per the retry
    /// configuration; a body that fails to decode is not.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ExchangeError> {
        let client = self.client()?;
        let body = execute_with_retry(&self.retry, || {
            let client = client.clone();
            let url = url.to_string();
            async move {
                tracing::info!("Fetching data from: {}", url);
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ExchangeError::Network(e.to_string()))?;
                read_success_body(response).await
            }
        })
        .await?;

        decode_body(&body)
    }

    /// POST a JSON `payload` to `url` and decode the 2xx body as JSON.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T, ExchangeError> {
        let client = self.client()?;
        let body = execute_with_retry(&self.retry, || {
            let client = client.clone();
            let url = url.to_string();
            let payload = payload.clone();
            async move {
                tracing::info!("Fetching data from: {} with payload: {}", url, payload);
                let response = client
                    .post(&url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| ExchangeError::Network(e.to_string()))?;
                read_success_body(response).await
            }
        })
        .await?;

        decode_body(&body)
    }
}

impl Default for HttpResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HttpResource {
    fn drop(&mut self) {
        let mut slot = self.lock_slot();
        if slot.take().is_some() {
            tracing::debug!("http client released on scope exit");
        }
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, ExchangeError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ExchangeError::Network(format!("HTTP {}: {}", status, text)));
    }
    response
        .text()
        .await
        .map_err(|e| ExchangeError::Network(e.to_string()))
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body)
        .map_err(|e| ExchangeError::UnexpectedResponse(format!("malformed JSON body: {}", e)))
}
