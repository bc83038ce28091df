//! Synchronous facade over [`LicenseEngine`].
//!
//! Owns a current-thread tokio runtime and blocks on each call. Must not be
//! used from inside another tokio runtime.

use crate::config::EngineConfig;
use crate::engine::LicenseEngine;
use crate::error::{LicenseError, LicenseResult};
use crate::policy::Verdict;
use crate::record::CredentialRecord;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::runtime::{Builder, Runtime};

/// Blocking wrapper around a [`LicenseEngine`].
#[derive(Debug)]
pub struct BlockingEngine {
    engine: LicenseEngine,
    runtime: Runtime,
}

impl BlockingEngine {
    /// Wraps an existing engine.
    pub fn new(engine: LicenseEngine) -> LicenseResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LicenseError::Runtime(format!("failed to start runtime: {e}")))?;
        Ok(Self { engine, runtime })
    }

    /// Builds the engine from configuration and wraps it.
    pub fn from_config(config: EngineConfig) -> LicenseResult<Self> {
        Self::new(LicenseEngine::new(config)?)
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &LicenseEngine {
        &self.engine
    }

    /// See [`LicenseEngine::create_license`].
    pub fn create_license(&self, expiration: DateTime<Utc>) -> LicenseResult<CredentialRecord> {
        self.runtime.block_on(self.engine.create_license(expiration))
    }

    /// See [`LicenseEngine::check_license`].
    pub fn check_license(&self) -> bool {
        self.runtime.block_on(self.engine.check_license())
    }

    /// See [`LicenseEngine::validate`].
    pub fn validate(&self) -> Verdict {
        self.runtime.block_on(self.engine.validate())
    }

    /// See [`LicenseEngine::license_info`].
    pub fn license_info(&self) -> Option<DateTime<Utc>> {
        self.runtime.block_on(self.engine.license_info())
    }

    /// See [`LicenseEngine::read_license`].
    pub fn read_license(&self) -> LicenseResult<CredentialRecord> {
        self.runtime.block_on(self.engine.read_license())
    }

    /// See [`LicenseEngine::license_file_path`].
    #[must_use]
    pub fn license_file_path(&self) -> &Path {
        self.engine.license_file_path()
    }

    /// See [`LicenseEngine::remove_license`].
    pub fn remove_license(&self) -> LicenseResult<()> {
        self.engine.remove_license()
    }
}
