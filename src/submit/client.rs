use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{interpret_response, prepare_save_request, CsrfSources, SaveError, SaveOutcome};
use crate::form::ResourceForm;

pub struct StorageClient {
    client: Client,
    url: String,
}

impl StorageClient {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, url })
    }

    /// Sends one save attempt. Failures are returned as-is; retrying is up to the caller.
    pub async fn save(
        &self,
        form: &ResourceForm,
        sources: &CsrfSources,
    ) -> Result<SaveOutcome, SaveError> {
        let request = prepare_save_request(form, &self.url, sources)?;

        let mut builder = self.client.post(&request.url).body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Save request failed: {}", e);
            SaveError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SaveError::Transport(e.to_string()))?;
        debug!("Save response HTTP {}", status);

        interpret_response(status, &body)
    }
}
