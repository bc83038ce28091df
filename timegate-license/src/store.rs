//! Encrypted on-disk storage of the credential record.
//!
//! The artifact is a single text file holding
//! `base64(AES-256-CBC(record text))`.

use crate::error::{ReadError, WriteError};
use crate::record::CredentialRecord;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use timegate_crypto::{decrypt_string, encrypt_string, KeyMaterial};
use tracing::{debug, info};

/// Reads and writes the credential artifact at a fixed path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store for the artifact at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an artifact is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Encrypts `record` and writes it, replacing any existing artifact.
    pub fn create(&self, record: &CredentialRecord, key: &KeyMaterial) -> Result<(), WriteError> {
        let blob = encrypt_string(key, &record.to_text());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WriteError::from_io(parent, e))?;
        }
        fs::write(&self.path, blob).map_err(|e| WriteError::from_io(&self.path, e))?;

        info!("Wrote license file {}", self.path.display());
        Ok(())
    }

    /// Reads the raw artifact text without decrypting it.
    pub fn read_blob(&self) -> Result<String, ReadError> {
        match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map_err(|_| ReadError::Corrupt("license file is not text".to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ReadError::NotFound {
                path: self.path.clone(),
            }),
            Err(source) => Err(ReadError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Decrypts and parses artifact text.
    pub fn decode(blob: &str, key: &KeyMaterial) -> Result<CredentialRecord, ReadError> {
        let text = decrypt_string(key, blob).map_err(|e| ReadError::Corrupt(e.to_string()))?;
        CredentialRecord::parse(&text)
    }

    /// Reads, decrypts and parses the artifact.
    pub fn read(&self, key: &KeyMaterial) -> Result<CredentialRecord, ReadError> {
        let blob = self.read_blob()?;
        Self::decode(&blob, key)
    }

    /// Deletes the artifact. A missing artifact is not an error.
    pub fn remove(&self) -> Result<(), WriteError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed license file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No license file to remove at {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(WriteError::from_io(&self.path, e)),
        }
    }
}
