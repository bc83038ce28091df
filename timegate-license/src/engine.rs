//! License engine.
//!
//! Ties the credential store, key material, trusted time and the expiration
//! policy together. Validation always fails closed: any error on the way to
//! a verdict yields something other than [`Verdict::Valid`].

use crate::config::EngineConfig;
use crate::device::{fingerprint, HardwareIdentitySource, MachineId, SystemHardwareIdentity};
use crate::error::{IssuanceError, LicenseResult, ReadError};
use crate::policy::{evaluate, UnverifiableReason, Verdict};
use crate::record::CredentialRecord;
use crate::store::CredentialStore;
use crate::time::{TimeAuthority, TimeSample};
use chrono::{DateTime, Utc};
use std::path::Path;
use timegate_crypto::{EmbeddedKeyProvider, KeyMaterial, KeyProvider};
use tracing::{debug, info, warn};

#[cfg(feature = "online")]
use crate::issuance::IssuanceClient;

/// Creates and validates the installed license.
pub struct LicenseEngine {
    store: CredentialStore,
    keys: Box<dyn KeyProvider>,
    time: TimeAuthority,
    hardware: Box<dyn HardwareIdentitySource>,
    #[cfg(feature = "online")]
    issuance: Option<IssuanceClient>,
}

impl LicenseEngine {
    /// Builds an engine from configuration.
    ///
    /// Fails only when binding mode is requested and the issuance client
    /// cannot be set up.
    pub fn new(config: EngineConfig) -> LicenseResult<Self> {
        #[cfg(feature = "online")]
        let issuance = config.issuance.map(IssuanceClient::new).transpose()?;

        #[cfg(not(feature = "online"))]
        {
            if config.issuance.is_some() {
                return Err(IssuanceError::Client(
                    "binding mode requires the `online` feature".to_string(),
                )
                .into());
            }
        }

        Ok(Self {
            store: CredentialStore::new(config.license_path),
            keys: Box::new(EmbeddedKeyProvider),
            time: TimeAuthority::from_config(&config.time),
            hardware: Box::new(SystemHardwareIdentity),
            #[cfg(feature = "online")]
            issuance,
        })
    }

    /// Replaces the local key provider.
    #[must_use]
    pub fn with_key_provider(mut self, provider: impl KeyProvider + 'static) -> Self {
        self.keys = Box::new(provider);
        self
    }

    /// Replaces the trusted time sources.
    #[must_use]
    pub fn with_time_authority(mut self, time: TimeAuthority) -> Self {
        self.time = time;
        self
    }

    /// Replaces the hardware identity source used for fingerprints.
    #[must_use]
    pub fn with_hardware_identity(mut self, source: impl HardwareIdentitySource + 'static) -> Self {
        self.hardware = Box::new(source);
        self
    }

    /// Location of the credential artifact.
    #[must_use]
    pub fn license_file_path(&self) -> &Path {
        self.store.path()
    }

    /// Whether key material is issued remotely.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        #[cfg(feature = "online")]
        {
            self.issuance.is_some()
        }
        #[cfg(not(feature = "online"))]
        {
            false
        }
    }

    /// Fingerprint of this machine.
    #[must_use]
    pub fn machine_id(&self) -> MachineId {
        fingerprint(self.hardware.as_ref())
    }

    /// Writes a license expiring at `expiration`, replacing any existing one.
    pub async fn create_license(&self, expiration: DateTime<Utc>) -> LicenseResult<CredentialRecord> {
        let record = CredentialRecord::new(expiration)?;
        let key = self.key_material().await?;
        self.store.create(&record, &key)?;
        info!("License created, expires {record}");
        Ok(record)
    }

    /// Validates the installed license against trusted time.
    pub async fn validate(&self) -> Verdict {
        let blob = match self.store.read_blob() {
            Ok(blob) => blob,
            Err(ReadError::NotFound { path }) => {
                debug!("No license at {}", path.display());
                return Verdict::Missing;
            }
            Err(e) => return read_failure(e),
        };

        let key = match self.key_material().await {
            Ok(key) => key,
            Err(e) => return issuance_failure(e),
        };

        let record = match CredentialStore::decode(&blob, &key) {
            Ok(record) => record,
            Err(e) => return read_failure(e),
        };

        let TimeSample { instant, source } = match self.time.resolve().await {
            Ok(sample) => sample,
            Err(e) => return Verdict::unverifiable(UnverifiableReason::TimeUnavailable, e),
        };

        let verdict = evaluate(instant, record.expires_at());
        debug!("License verdict against {source}: {verdict}");
        verdict
    }

    /// True only if [`validate`](Self::validate) returns `Valid`.
    pub async fn check_license(&self) -> bool {
        self.validate().await.is_valid()
    }

    /// Reads the installed record without consulting trusted time.
    pub async fn read_license(&self) -> LicenseResult<CredentialRecord> {
        let blob = self.store.read_blob()?;
        let key = self.key_material().await?;
        Ok(CredentialStore::decode(&blob, &key)?)
    }

    /// Expiration of the installed license, if one can be read.
    pub async fn license_info(&self) -> Option<DateTime<Utc>> {
        self.read_license()
            .await
            .map(|record| record.expires_at())
            .ok()
    }

    /// Deletes the installed license.
    pub fn remove_license(&self) -> LicenseResult<()> {
        Ok(self.store.remove()?)
    }

    async fn key_material(&self) -> Result<KeyMaterial, IssuanceError> {
        #[cfg(feature = "online")]
        {
            if let Some(client) = &self.issuance {
                return client.request_key(&self.machine_id()).await;
            }
        }

        Ok(self.keys.derive_key())
    }
}

impl std::fmt::Debug for LicenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseEngine")
            .field("store", &self.store)
            .field("time", &self.time)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

fn read_failure(error: ReadError) -> Verdict {
    warn!("License could not be read: {error}");
    let reason = match error {
        ReadError::Corrupt(_) => UnverifiableReason::CorruptCredential,
        _ => UnverifiableReason::ReadFailed,
    };
    Verdict::unverifiable(reason, error)
}

fn issuance_failure(error: IssuanceError) -> Verdict {
    let reason = match error {
        IssuanceError::Unreachable(_) => UnverifiableReason::IssuanceUnreachable,
        _ => UnverifiableReason::IssuanceDenied,
    };
    Verdict::unverifiable(reason, error)
}
