use std::io;
use std::path::PathBuf;
use std::time::Duration;
use timegate_license::{
    IssuanceError, LicenseError, ReadError, SourceFailure, TimeSourceError, TimeUnavailable,
    WriteError,
};

// ── WriteError ──────────────────────────────────────────────────

#[test]
fn error_display_permission_denied() {
    let err = WriteError::PermissionDenied {
        path: PathBuf::from("/opt/app/license.dat"),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    };
    let msg = format!("{err}");
    assert!(msg.contains("permission denied"));
    assert!(msg.contains("/opt/app/license.dat"));
    assert!(err.is_permission_denied());
}

#[test]
fn error_display_write_io() {
    let err = WriteError::Io {
        path: PathBuf::from("license.dat"),
        source: io::Error::other("disk full"),
    };
    assert!(format!("{err}").contains("disk full"));
    assert!(!err.is_permission_denied());
}

#[test]
fn write_error_keeps_source() {
    use std::error::Error;
    let err = WriteError::Io {
        path: PathBuf::from("license.dat"),
        source: io::Error::other("disk full"),
    };
    assert!(err.source().is_some());
}

// ── ReadError ───────────────────────────────────────────────────

#[test]
fn error_display_not_found() {
    let err = ReadError::NotFound {
        path: PathBuf::from("license.dat"),
    };
    assert!(format!("{err}").contains("not found"));
}

#[test]
fn error_display_corrupt() {
    let err = ReadError::Corrupt("bad padding".into());
    let msg = format!("{err}");
    assert!(msg.contains("corrupt"));
    assert!(msg.contains("bad padding"));
}

// ── Time errors ─────────────────────────────────────────────────

#[test]
fn error_display_time_source_variants() {
    assert!(format!("{}", TimeSourceError::NoAddress("ntp.example".into())).contains("ntp.example"));
    assert!(format!("{}", TimeSourceError::Timeout(Duration::from_secs(3))).contains("timed out"));
    assert!(format!("{}", TimeSourceError::Malformed("short".into())).contains("malformed"));
    let io_err: TimeSourceError = io::Error::from(io::ErrorKind::ConnectionRefused).into();
    assert!(format!("{io_err}").contains("socket error"));
}

#[test]
fn time_unavailable_lists_failures() {
    let err = TimeUnavailable {
        failures: vec![
            SourceFailure {
                source: "time.google.com:123".into(),
                error: TimeSourceError::Timeout(Duration::from_secs(3)),
            },
            SourceFailure {
                source: "pool.ntp.org:123".into(),
                error: TimeSourceError::Malformed("reply is 12 bytes".into()),
            },
        ],
    };
    let msg = format!("{err}");
    assert!(msg.contains("time.google.com:123: timed out"));
    assert!(msg.contains("pool.ntp.org:123: malformed reply"));
}

// ── LicenseError ────────────────────────────────────────────────

#[test]
fn license_error_wraps_transparently() {
    let err: LicenseError = ReadError::Corrupt("x".into()).into();
    assert_eq!(format!("{err}"), "license file is corrupt: x");

    let err: LicenseError = IssuanceError::Denied {
        reason: "revoked".into(),
    }
    .into();
    assert_eq!(format!("{err}"), "key issuance denied: revoked");

    let err: LicenseError = TimeUnavailable { failures: vec![] }.into();
    assert!(format!("{err}").contains("no time sources configured"));
}

#[test]
fn needs_elevation_only_for_permission_denied() {
    let denied: LicenseError = WriteError::PermissionDenied {
        path: PathBuf::from("/opt/app/license.dat"),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    }
    .into();
    assert!(denied.needs_elevation());

    let other: LicenseError = WriteError::Io {
        path: PathBuf::from("license.dat"),
        source: io::Error::other("disk full"),
    }
    .into();
    assert!(!other.needs_elevation());
    assert!(!LicenseError::InvalidExpiration("year 10000".into()).needs_elevation());
}

#[test]
fn error_display_runtime_and_expiration() {
    assert!(format!("{}", LicenseError::Runtime("no threads".into())).contains("runtime error"));
    assert!(
        format!("{}", LicenseError::InvalidExpiration("year 0".into()))
            .contains("invalid expiration")
    );
}

#[test]
fn error_is_debug() {
    let err = LicenseError::Issuance(IssuanceError::Unreachable("refused".into()));
    let _ = format!("{err:?}");
}
