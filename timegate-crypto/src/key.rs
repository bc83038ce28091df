//! Key material derivation.
//!
//! The credential key is derived from a passphrase by hashing it with
//! SHA-256. The passphrase itself never appears in the binary in clear: it is
//! compiled in XOR-masked and unmasked at load time.
//!
//! This is a deterrent against casual inspection of the artifact (`strings`,
//! hex editors), not protection against a reverse engineer.
//!
//! # Limitations
//!
//! The IV is the first [`IV_SIZE`] bytes of the same digest that forms the
//! key. It is therefore constant for a given passphrase and related to the
//! key. Identical plaintexts encrypt to identical ciphertexts.

use crate::error::{CryptoError, CryptoResult};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// XOR mask applied to the embedded passphrase.
pub const OBFUSCATION_MASK: u8 = 0xAA;

/// Embedded passphrase, masked with [`OBFUSCATION_MASK`].
const EMBEDDED_PASSPHRASE: [u8; 32] = [
    0xFE, 0xC3, 0xC7, 0xCF, 0xED, 0xCB, 0xDE, 0xCF, 0x87, 0xE6, 0xC5, 0xC9, 0xCB, 0xC6, 0x87, 0xE9,
    0xD8, 0xCF, 0xCE, 0xCF, 0xC4, 0xDE, 0xC3, 0xCB, 0xC6, 0x87, 0xE1, 0xCF, 0xD3, 0x87, 0x9A, 0x9B,
];

/// A symmetric key and IV, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl KeyMaterial {
    /// Creates key material from raw parts.
    pub fn from_parts(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Creates key material from slices, checking their lengths.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> CryptoResult<Self> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: IV_SIZE,
            actual: iv.len(),
        })?;
        Ok(Self { key, iv })
    }

    /// Derives key material from a passphrase.
    ///
    /// key = SHA-256(passphrase), iv = key[..16]. See the module-level
    /// limitations.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::from_passphrase_bytes(passphrase.as_bytes())
    }

    /// Byte-level form of [`KeyMaterial::from_passphrase`].
    pub fn from_passphrase_bytes(passphrase: &[u8]) -> Self {
        let mut digest: [u8; KEY_SIZE] = Sha256::digest(passphrase).into();
        let iv = iv_from_key_prefix(&digest);
        let material = Self { key: digest, iv };
        digest.zeroize();
        material
    }

    /// Returns the key bytes.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Returns the IV bytes.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.iv == other.iv
    }
}

impl Eq for KeyMaterial {}

fn iv_from_key_prefix(key: &[u8; KEY_SIZE]) -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&key[..IV_SIZE]);
    iv
}

/// Something that can produce the credential key material.
pub trait KeyProvider: Send + Sync {
    /// Returns the key material. Deterministic and infallible.
    fn derive_key(&self) -> KeyMaterial;
}

/// Derives key material from the passphrase compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedKeyProvider;

impl KeyProvider for EmbeddedKeyProvider {
    fn derive_key(&self) -> KeyMaterial {
        let mut passphrase = unmask(&EMBEDDED_PASSPHRASE);
        let material = KeyMaterial::from_passphrase_bytes(&passphrase);
        passphrase.zeroize();
        material
    }
}

/// Derives key material from an explicit passphrase.
///
/// Used by tests and by the remote issuance path, where the passphrase
/// comes from the issuing service.
#[derive(Clone)]
pub struct PassphraseKeyProvider {
    passphrase: String,
}

impl PassphraseKeyProvider {
    /// Creates a provider for the given passphrase.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }
}

impl Drop for PassphraseKeyProvider {
    fn drop(&mut self) {
        self.passphrase.zeroize();
    }
}

impl std::fmt::Debug for PassphraseKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseKeyProvider")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn derive_key(&self) -> KeyMaterial {
        KeyMaterial::from_passphrase(&self.passphrase)
    }
}

/// Masks bytes with [`OBFUSCATION_MASK`]. Used to produce embedded constants.
pub fn mask(plain: &[u8]) -> Vec<u8> {
    plain.iter().map(|b| b ^ OBFUSCATION_MASK).collect()
}

/// Reverses [`mask`].
pub fn unmask(masked: &[u8]) -> Vec<u8> {
    mask(masked)
}
