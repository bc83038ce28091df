//! Credential encryption using AES-256 in CBC mode with PKCS#7 padding.
//!
//! CBC is unauthenticated. Tampering surfaces as a padding failure or as
//! garbage plaintext that the caller's strict parser rejects.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KeyMaterial;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypts plaintext, applying PKCS#7 padding.
///
/// The output length is always a non-zero multiple of [`BLOCK_SIZE`].
pub fn encrypt(key: &KeyMaterial, plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.key().into(), key.iv().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypts ciphertext and strips PKCS#7 padding.
pub fn decrypt(key: &KeyMaterial, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    Aes256CbcDec::new(key.key().into(), key.iv().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("invalid padding (wrong key or tampered data)".to_string())
        })
}

/// Encrypts a string and returns base64-encoded result.
pub fn encrypt_string(key: &KeyMaterial, plaintext: &str) -> String {
    STANDARD.encode(encrypt(key, plaintext.as_bytes()))
}

/// Decrypts a base64-encoded string.
pub fn decrypt_string(key: &KeyMaterial, encoded: &str) -> CryptoResult<String> {
    let ciphertext = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
    let plaintext = decrypt(key, &ciphertext)?;
    String::from_utf8(plaintext).map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}
