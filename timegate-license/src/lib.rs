//! Time-bounded licensing for TimeGate.
//!
//! This module handles:
//! - Encrypted storage of a single expiration record
//! - Trusted time from NTP servers, with ordered failover
//! - Expiration verdicts that fail closed
//! - Optional machine binding, with key material issued by a remote service
//!
//! # Design Principles
//!
//! - **Never trust the local clock**: validation needs an answer from a
//!   network time source, or it is unverifiable
//! - **No network for absent licenses**: a missing artifact is reported
//!   before any key, time or issuance work
//! - **Deterrence, not DRM**: the key is obfuscated in the binary and the
//!   artifact is encrypted; neither resists a determined reverse engineer
//!
//! # Artifact Format
//!
//! One text file, by default `license.dat` in the current directory:
//! `base64(AES-256-CBC(yyyy-MM-dd HH:mm:ss))`, with the timestamp in UTC.

pub mod blocking;
mod config;
mod device;
mod engine;
mod error;
#[cfg(feature = "online")]
mod issuance;
pub mod ntp;
mod policy;
mod record;
mod store;
mod time;

pub use blocking::BlockingEngine;
pub use config::{
    default_license_path, EngineConfig, IssuanceConfig, TimeConfig, DEFAULT_LICENSE_FILE,
    DEFAULT_TIME_SERVERS,
};
pub use device::{
    fingerprint, BindingStrength, HardwareIdentitySource, MachineId, SystemHardwareIdentity,
    MACHINE_ID_PREFIX, UNKNOWN_COMPONENT,
};
pub use engine::LicenseEngine;
pub use error::{
    IssuanceError, LicenseError, LicenseResult, ReadError, SourceFailure, TimeSourceError,
    TimeUnavailable, WriteError,
};
pub use ntp::NtpSource;
pub use policy::{evaluate, UnverifiableReason, Verdict};
pub use record::{CredentialRecord, RECORD_FORMAT, RECORD_TEXT_LEN};
pub use store::CredentialStore;
pub use time::{TimeAuthority, TimeSample, TimeSource, DEFAULT_OVERALL_TIMEOUT, OVERALL_BUDGET_SOURCE};

#[cfg(feature = "online")]
pub use issuance::IssuanceClient;

pub use timegate_crypto::{EmbeddedKeyProvider, KeyMaterial, KeyProvider, PassphraseKeyProvider};
