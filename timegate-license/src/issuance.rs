//! Remote key issuance.
//!
//! In binding mode the credential key is not embedded. The client posts the
//! machine fingerprint to an issuing service and receives a passphrase that
//! the key material is derived from.

use crate::config::IssuanceConfig;
use crate::device::MachineId;
use crate::error::IssuanceError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use timegate_crypto::KeyMaterial;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct IssuanceRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct IssuanceResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    valid: bool,
    key: Option<String>,
    error: Option<String>,
}

/// HTTP client for the issuing service.
#[derive(Debug, Clone)]
pub struct IssuanceClient {
    config: IssuanceConfig,
    client: Client,
}

impl IssuanceClient {
    /// Creates a client. Every request is bounded by `config.timeout_ms`.
    pub fn new(config: IssuanceConfig) -> Result<Self, IssuanceError> {
        if config.endpoint.is_empty() {
            return Err(IssuanceError::Client("no endpoint configured".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| IssuanceError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Requests key material for `machine`.
    pub async fn request_key(&self, machine: &MachineId) -> Result<KeyMaterial, IssuanceError> {
        debug!("Requesting key for {} from {}", machine, self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&IssuanceRequest {
                id: machine.as_str(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!("Issuing service unreachable: {e}");
                IssuanceError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IssuanceError::Unreachable(format!("failed to read response: {e}")))?;
        let parsed = serde_json::from_str::<IssuanceResponse>(&body);

        if !status.is_success() {
            let reason = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!("Key issuance denied for {machine}: {reason}");
            return Err(IssuanceError::Denied { reason });
        }

        let parsed = parsed.map_err(|e| IssuanceError::Denied {
            reason: format!("invalid response: {e}"),
        })?;

        match parsed.key {
            Some(key) if parsed.success && parsed.valid && !key.is_empty() => {
                debug!("Key issued for {machine}");
                Ok(KeyMaterial::from_passphrase(&key))
            }
            _ => {
                let reason = parsed
                    .error
                    .unwrap_or_else(|| "service did not issue a key".to_string());
                warn!("Key issuance denied for {machine}: {reason}");
                Err(IssuanceError::Denied { reason })
            }
        }
    }
}
