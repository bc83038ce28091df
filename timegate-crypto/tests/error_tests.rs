use timegate_crypto::CryptoError;

#[test]
fn error_display_decryption() {
    let err = CryptoError::Decryption("tampered".into());
    assert!(format!("{err}").contains("decryption failed"));
    assert!(format!("{err}").contains("tampered"));
}

#[test]
fn error_display_invalid_key_length() {
    let err = CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    };
    let msg = format!("{err}");
    assert!(msg.contains("32"));
    assert!(msg.contains("16"));
}

#[test]
fn error_is_debug() {
    let err = CryptoError::Decryption("test".into());
    let _ = format!("{err:?}");
}

#[test]
fn error_is_std_error() {
    let err: Box<dyn std::error::Error + Send + Sync> =
        Box::new(CryptoError::Decryption("boxed".into()));
    assert!(err.to_string().contains("boxed"));
}
