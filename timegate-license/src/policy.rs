//! Expiration policy and validation verdicts.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Why a credential could not be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnverifiableReason {
    /// No trusted time source answered.
    TimeUnavailable,
    /// The artifact exists but does not decode.
    CorruptCredential,
    /// The artifact exists but could not be read.
    ReadFailed,
    /// The issuing service refused to provide the key.
    IssuanceDenied,
    /// The issuing service could not be reached.
    IssuanceUnreachable,
}

impl fmt::Display for UnverifiableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TimeUnavailable => "trusted time unavailable",
            Self::CorruptCredential => "license file is corrupt",
            Self::ReadFailed => "license file could not be read",
            Self::IssuanceDenied => "key issuance denied",
            Self::IssuanceUnreachable => "issuing service unreachable",
        };
        f.write_str(text)
    }
}

/// Outcome of a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The credential is valid for `remaining` more time.
    Valid { remaining: TimeDelta },
    /// The credential expired at `since`.
    Expired { since: DateTime<Utc> },
    /// No credential is installed.
    Missing,
    /// The credential could not be checked.
    Unverifiable {
        reason: UnverifiableReason,
        detail: String,
    },
}

impl Verdict {
    pub(crate) fn unverifiable(reason: UnverifiableReason, detail: impl fmt::Display) -> Self {
        Self::Unverifiable {
            reason,
            detail: detail.to_string(),
        }
    }

    /// Only `Valid` grants access.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Whole days left on a valid credential.
    #[must_use]
    pub fn remaining_days(&self) -> Option<i64> {
        match self {
            Self::Valid { remaining } => Some(remaining.num_days()),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid { remaining } => {
                write!(f, "license valid - {} days remaining", remaining.num_days())
            }
            Self::Expired { since } => write!(f, "license expired on {}", since.format("%Y-%m-%d")),
            Self::Missing => f.write_str("license file not found"),
            Self::Unverifiable { reason, detail } if detail.is_empty() => {
                write!(f, "cannot verify license: {reason}")
            }
            Self::Unverifiable { reason, detail } => {
                write!(f, "cannot verify license: {reason} ({detail})")
            }
        }
    }
}

/// Compares trusted time against an expiration.
///
/// The expiration instant itself is still valid, with zero time remaining.
#[must_use]
pub fn evaluate(trusted_now: DateTime<Utc>, expiration: DateTime<Utc>) -> Verdict {
    if trusted_now > expiration {
        Verdict::Expired { since: expiration }
    } else {
        Verdict::Valid {
            remaining: expiration - trusted_now,
        }
    }
}
