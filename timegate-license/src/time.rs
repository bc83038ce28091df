//! Trusted time resolution.
//!
//! The local clock is never consulted. [`TimeAuthority`] walks an ordered
//! list of [`TimeSource`]s and returns the first answer; if none answers it
//! reports every failure it saw.

use crate::config::TimeConfig;
use crate::error::{SourceFailure, TimeSourceError, TimeUnavailable};
use crate::ntp::NtpSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Default budget for a whole resolution.
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Name recorded when the overall budget runs out.
pub const OVERALL_BUDGET_SOURCE: &str = "overall budget";

/// A network service that reports the current time.
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Human-readable identity, used in logs and failure reports.
    fn name(&self) -> &str;

    /// Queries the current UTC time.
    async fn query(&self) -> Result<DateTime<Utc>, TimeSourceError>;
}

/// A resolved instant and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSample {
    pub instant: DateTime<Utc>,
    pub source: String,
}

/// Ordered failover over several time sources.
pub struct TimeAuthority {
    sources: Vec<Box<dyn TimeSource>>,
    overall_timeout: Duration,
}

impl TimeAuthority {
    /// Creates an authority over `sources`, tried in order.
    pub fn new(sources: Vec<Box<dyn TimeSource>>) -> Self {
        Self {
            sources,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }

    /// Builds NTP sources from configuration.
    pub fn from_config(config: &TimeConfig) -> Self {
        let per_source = Duration::from_millis(config.source_timeout_ms);
        let sources = config
            .servers
            .iter()
            .map(|host| {
                Box::new(
                    NtpSource::new(host.as_str())
                        .with_port(config.port)
                        .with_timeout(per_source),
                ) as Box<dyn TimeSource>
            })
            .collect();

        Self::new(sources).with_overall_timeout(Duration::from_millis(config.overall_timeout_ms))
    }

    /// Bounds a whole resolution, across all sources.
    #[must_use]
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// The overall budget.
    #[must_use]
    pub fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }

    /// Names of the configured sources, in order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns the first successful answer.
    pub async fn resolve(&self) -> Result<TimeSample, TimeUnavailable> {
        let mut failures = Vec::new();
        let outcome =
            tokio::time::timeout(self.overall_timeout, self.try_in_order(&mut failures)).await;

        match outcome {
            Ok(Some(sample)) => Ok(sample),
            Ok(None) => {
                warn!("All {} time sources failed", self.sources.len());
                Err(TimeUnavailable { failures })
            }
            Err(_) => {
                warn!(
                    "Time resolution exceeded {:?} after {} failures",
                    self.overall_timeout,
                    failures.len()
                );
                failures.push(SourceFailure {
                    source: OVERALL_BUDGET_SOURCE.to_string(),
                    error: TimeSourceError::Timeout(self.overall_timeout),
                });
                Err(TimeUnavailable { failures })
            }
        }
    }

    async fn try_in_order(&self, failures: &mut Vec<SourceFailure>) -> Option<TimeSample> {
        for source in &self.sources {
            match source.query().await {
                Ok(instant) => {
                    debug!("Trusted time {} from {}", instant, source.name());
                    return Some(TimeSample {
                        instant,
                        source: source.name().to_string(),
                    });
                }
                Err(error) => {
                    warn!("Time source {} failed: {}", source.name(), error);
                    failures.push(SourceFailure {
                        source: source.name().to_string(),
                        error,
                    });
                }
            }
        }
        None
    }
}

impl Default for TimeAuthority {
    fn default() -> Self {
        Self::from_config(&TimeConfig::default())
    }
}

impl std::fmt::Debug for TimeAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeAuthority")
            .field("sources", &self.source_names())
            .field("overall_timeout", &self.overall_timeout)
            .finish()
    }
}
