//! The credential record: a single expiration instant.
//!
//! Records are UTC with second precision and serialize to a fixed
//! `yyyy-MM-dd HH:mm:ss` text form. Parsing is strict so that a decrypted
//! but tampered payload is rejected rather than guessed at.

use crate::error::{LicenseError, LicenseResult, ReadError};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use std::fmt;

/// `strftime` pattern of the stored text form.
pub const RECORD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of the stored text form.
pub const RECORD_TEXT_LEN: usize = 19;

/// Earliest representable year.
pub const MIN_YEAR: i32 = 1;

/// Latest representable year.
pub const MAX_YEAR: i32 = 9999;

/// An expiration instant, normalised to UTC seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CredentialRecord {
    expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Creates a record, truncating sub-second precision.
    ///
    /// Fails with [`LicenseError::InvalidExpiration`] when the year falls
    /// outside what the four-digit text form can hold.
    pub fn new(expires_at: DateTime<Utc>) -> LicenseResult<Self> {
        let year = expires_at.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(LicenseError::InvalidExpiration(format!(
                "year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
            )));
        }

        let expires_at = DateTime::from_timestamp(expires_at.timestamp(), 0).ok_or_else(|| {
            LicenseError::InvalidExpiration(format!("{expires_at} is not representable"))
        })?;

        Ok(Self { expires_at })
    }

    /// The expiration instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Renders the stored text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.expires_at.format(RECORD_FORMAT).to_string()
    }

    /// Parses the stored text form.
    ///
    /// Accepts exactly `yyyy-MM-dd HH:mm:ss`; anything else, including
    /// leading or trailing data, is [`ReadError::Corrupt`].
    pub fn parse(text: &str) -> Result<Self, ReadError> {
        if !has_record_shape(text) {
            return Err(ReadError::Corrupt(format!(
                "record text is not in {RECORD_FORMAT} form"
            )));
        }

        let naive = NaiveDateTime::parse_from_str(text, RECORD_FORMAT)
            .map_err(|e| ReadError::Corrupt(format!("invalid record timestamp: {e}")))?;

        if naive.year() < MIN_YEAR {
            return Err(ReadError::Corrupt(format!(
                "record year {} is out of range",
                naive.year()
            )));
        }

        Ok(Self {
            expires_at: naive.and_utc(),
        })
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Checks the fixed layout: digits everywhere except the separators.
fn has_record_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == RECORD_TEXT_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}
