//! Engine configuration.
//!
//! Everything the engine needs is passed in explicitly. Defaults are
//! compiled-in constants; there is no configuration file or environment
//! lookup.

use crate::ntp::NTP_PORT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the credential artifact.
pub const DEFAULT_LICENSE_FILE: &str = "license.dat";

/// Default NTP servers, tried in order.
pub const DEFAULT_TIME_SERVERS: &[&str] = &[
    "time.google.com",
    "time.windows.com",
    "pool.ntp.org",
    "time.nist.gov",
];

/// Returns `<current dir>/license.dat`.
///
/// Falls back to a relative path if the current directory is unavailable.
#[must_use]
pub fn default_license_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join(DEFAULT_LICENSE_FILE)
}

/// Trusted time configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// NTP server host names, tried in order.
    pub servers: Vec<String>,
    /// NTP port.
    pub port: u16,
    /// Timeout for each server, in milliseconds.
    pub source_timeout_ms: u64,
    /// Budget for the whole resolution, in milliseconds.
    pub overall_timeout_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            servers: DEFAULT_TIME_SERVERS.iter().map(ToString::to_string).collect(),
            port: NTP_PORT,
            source_timeout_ms: 3000,
            overall_timeout_ms: 15_000,
        }
    }
}

/// Remote key issuance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// URL the machine fingerprint is posted to.
    pub endpoint: String,
    /// Request timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl IssuanceConfig {
    /// Creates a configuration for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_ms: 10_000,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Location of the credential artifact.
    pub license_path: PathBuf,
    /// Trusted time sources.
    pub time: TimeConfig,
    /// Binding mode: when set, key material is issued remotely per machine.
    pub issuance: Option<IssuanceConfig>,
}

impl EngineConfig {
    /// Default configuration with the artifact at `path`.
    pub fn with_license_path(path: impl Into<PathBuf>) -> Self {
        Self {
            license_path: path.into(),
            ..Default::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            license_path: default_license_path(),
            time: TimeConfig::default(),
            issuance: None,
        }
    }
}
