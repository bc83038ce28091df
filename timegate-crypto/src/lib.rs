//! Key material and credential cipher for TimeGate.
//!
//! - [`KeyProvider`] implementations turn a passphrase (embedded and
//!   XOR-masked, or supplied by an issuing service) into [`KeyMaterial`].
//! - [`encrypt_string`] / [`decrypt_string`] wrap AES-256-CBC with PKCS#7
//!   padding in a base64 envelope.
//!
//! The scheme deters casual tampering. It does not resist a determined
//! reverse engineer; see the limitations section in [`key`].

mod cipher;
mod error;
pub mod key;

pub use cipher::{decrypt, decrypt_string, encrypt, encrypt_string, BLOCK_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    mask, unmask, EmbeddedKeyProvider, KeyMaterial, KeyProvider, PassphraseKeyProvider, IV_SIZE,
    KEY_SIZE,
};
