//! SNTP client (RFC 4330).
//!
//! Only the transmit timestamp of the server reply is used. Round-trip delay
//! is not compensated.

use crate::error::TimeSourceError;
use crate::time::TimeSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;

/// Size of an SNTP packet without extensions.
pub const NTP_PACKET_SIZE: usize = 48;

/// Well-known NTP port.
pub const NTP_PORT: u16 = 123;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
pub const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

/// Default per-source timeout.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_millis(3000);

/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_MODE_HEADER: u8 = 0x1B;

const TRANSMIT_SECS_OFFSET: usize = 40;
const TRANSMIT_FRAC_OFFSET: usize = 44;
const ERA_SECS: i64 = 1 << 32;

/// Builds a client request packet.
#[must_use]
pub fn build_request() -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = CLIENT_MODE_HEADER;
    packet
}

/// Extracts the server transmit time from a reply.
///
/// Timestamps with the most significant bit clear are taken to be in NTP
/// era 1 (from 2036-02-07 onwards), per RFC 4330 section 3.
pub fn parse_reply(reply: &[u8]) -> Result<DateTime<Utc>, TimeSourceError> {
    if reply.len() < NTP_PACKET_SIZE {
        return Err(TimeSourceError::Malformed(format!(
            "reply is {} bytes, expected at least {NTP_PACKET_SIZE}",
            reply.len()
        )));
    }

    let secs = read_u32_be(reply, TRANSMIT_SECS_OFFSET);
    let frac = read_u32_be(reply, TRANSMIT_FRAC_OFFSET);
    if secs == 0 {
        return Err(TimeSourceError::Malformed(
            "transmit timestamp is zero".to_string(),
        ));
    }

    let mut ntp_secs = i64::from(secs);
    if secs & 0x8000_0000 == 0 {
        ntp_secs += ERA_SECS;
    }

    let frac_millis = ((u64::from(frac) * 1000) >> 32) as i64;
    let unix_millis = (ntp_secs - NTP_UNIX_OFFSET_SECS) * 1000 + frac_millis;

    DateTime::from_timestamp_millis(unix_millis).ok_or_else(|| {
        TimeSourceError::Malformed(format!("timestamp {unix_millis} ms is out of range"))
    })
}

fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// A single NTP server.
#[derive(Debug, Clone)]
pub struct NtpSource {
    host: String,
    port: u16,
    timeout: Duration,
    name: String,
}

impl NtpSource {
    /// Creates a source for `host` on the standard port.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            name: format!("{host}:{NTP_PORT}"),
            host,
            port: NTP_PORT,
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Overrides the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self.name = format!("{}:{port}", self.host);
        self
    }

    /// Overrides the timeout covering lookup, send and receive.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self) -> Result<DateTime<Utc>, TimeSourceError> {
        let addr = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|source| TimeSourceError::Resolve {
                host: self.host.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TimeSourceError::NoAddress(self.host.clone()))?;

        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        socket.send(&build_request()).await?;

        let mut buf = [0u8; 512];
        let len = socket.recv(&mut buf).await?;
        parse_reply(&buf[..len])
    }
}

#[async_trait]
impl TimeSource for NtpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<DateTime<Utc>, TimeSourceError> {
        tokio::time::timeout(self.timeout, self.exchange())
            .await
            .map_err(|_| TimeSourceError::Timeout(self.timeout))?
    }
}
