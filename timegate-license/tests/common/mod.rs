//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use timegate_license::{
    EngineConfig, HardwareIdentitySource, LicenseEngine, PassphraseKeyProvider, TimeAuthority,
    TimeSource, TimeSourceError,
};
use tokio::net::UdpSocket;

pub const TEST_PASSPHRASE: &str = "timegate-test-passphrase";

/// Builds a UTC instant.
pub fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
}

/// Installs a log subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Time sources ────────────────────────────────────────────────

/// Always answers with a fixed instant and counts queries.
#[derive(Clone)]
pub struct FixedTimeSource {
    name: String,
    instant: DateTime<Utc>,
    calls: Arc<AtomicUsize>,
}

impl FixedTimeSource {
    pub fn new(name: &str, instant: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            instant,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TimeSource for FixedTimeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<DateTime<Utc>, TimeSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.instant)
    }
}

/// Always fails and counts queries.
#[derive(Clone)]
pub struct FailingTimeSource {
    name: String,
    calls: Arc<AtomicUsize>,
}

impl FailingTimeSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TimeSource for FailingTimeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<DateTime<Utc>, TimeSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TimeSourceError::Timeout(Duration::from_millis(3000)))
    }
}

/// Answers after a delay.
pub struct SlowTimeSource {
    pub name: String,
    pub delay: Duration,
    pub instant: DateTime<Utc>,
}

#[async_trait]
impl TimeSource for SlowTimeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<DateTime<Utc>, TimeSourceError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.instant)
    }
}

/// A time authority with a single fixed source.
pub fn fixed_authority(instant: DateTime<Utc>) -> (TimeAuthority, Arc<AtomicUsize>) {
    let source = FixedTimeSource::new("fixed", instant);
    let calls = source.calls();
    (TimeAuthority::new(vec![Box::new(source)]), calls)
}

/// A time authority whose every source fails.
pub fn failing_authority(count: usize) -> TimeAuthority {
    let sources = (0..count)
        .map(|i| Box::new(FailingTimeSource::new(&format!("down-{i}"))) as Box<dyn TimeSource>)
        .collect();
    TimeAuthority::new(sources)
}

// ── Engines ─────────────────────────────────────────────────────

/// An engine with a test key, storing its artifact in `dir`.
pub fn test_engine(dir: &Path, time: TimeAuthority) -> LicenseEngine {
    LicenseEngine::new(EngineConfig::with_license_path(dir.join("license.dat")))
        .unwrap()
        .with_key_provider(PassphraseKeyProvider::new(TEST_PASSPHRASE))
        .with_time_authority(time)
}

// ── Hardware ────────────────────────────────────────────────────

/// Reports fixed identifiers.
#[derive(Debug, Clone, Default)]
pub struct FakeHardware {
    pub cpu: Option<String>,
    pub board: Option<String>,
    pub host: Option<String>,
}

impl FakeHardware {
    pub fn full(cpu: &str, board: &str) -> Self {
        Self {
            cpu: Some(cpu.to_string()),
            board: Some(board.to_string()),
            host: Some("test-host".to_string()),
        }
    }

    pub fn host_only(host: &str) -> Self {
        Self {
            cpu: None,
            board: None,
            host: Some(host.to_string()),
        }
    }
}

impl HardwareIdentitySource for FakeHardware {
    fn processor_id(&self) -> Option<String> {
        self.cpu.clone()
    }

    fn board_serial(&self) -> Option<String> {
        self.board.clone()
    }

    fn host_name(&self) -> Option<String> {
        self.host.clone()
    }
}

// ── Fake NTP server ─────────────────────────────────────────────

/// Encodes an instant as an NTP transmit timestamp (seconds, fraction).
pub fn ntp_timestamp(instant: DateTime<Utc>) -> (u32, u32) {
    let secs = (instant.timestamp() + 2_208_988_800) as u32;
    let frac = ((u64::from(instant.timestamp_subsec_nanos()) << 32) / 1_000_000_000) as u32;
    (secs, frac)
}

/// A 48-byte server reply carrying `instant`.
pub fn ntp_reply(instant: DateTime<Utc>) -> Vec<u8> {
    let (secs, frac) = ntp_timestamp(instant);
    let mut reply = vec![0u8; 48];
    reply[0] = 0x1C; // LI 0, VN 3, mode 4 (server)
    reply[1] = 2;
    reply[40..44].copy_from_slice(&secs.to_be_bytes());
    reply[44..48].copy_from_slice(&frac.to_be_bytes());
    reply
}

/// Spawns a UDP server on localhost that answers every datagram with
/// `reply`. Returns its address.
pub async fn spawn_udp_responder(reply: Vec<u8>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        while let Ok((_, peer)) = socket.recv_from(&mut buf).await {
            let _ = socket.send_to(&reply, peer).await;
        }
    });
    addr
}

/// Spawns a fake NTP server answering with `instant`.
pub async fn spawn_ntp_server(instant: DateTime<Utc>) -> SocketAddr {
    spawn_udp_responder(ntp_reply(instant)).await
}

/// Binds a UDP socket that never answers. Keep the socket alive for the
/// duration of the test.
pub async fn silent_udp_socket() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}
