//! Telemetry Aggregator
//!
//! Lost-update-free blocked counters plus the detached sink post.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{RateLimitEvent, RateLimitKind, TelemetryConfig};

/// Aggregates blocked-request telemetry for one process.
///
/// Explicitly constructed and injected; there is no ambient global
/// instance. Counters live for the process lifetime and only
/// [`Self::reset`] clears them.
pub struct TelemetryAggregator {
    counters: DashMap<RateLimitKind, AtomicU64>,
    client: reqwest::Client,
    config: TelemetryConfig,
}

impl TelemetryAggregator {
    /// Build an aggregator; counter-only when no sink URL is configured
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            counters: DashMap::new(),
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Record one blocked request. Fire-and-forget.
    ///
    /// The counter increment is synchronous and observable as soon as this
    /// returns. When a sink is configured the event is additionally posted
    /// as JSON from a detached task; sink errors, timeouts and non-2xx
    /// answers are swallowed there and never reach the caller. With a sink
    /// configured this must run inside a Tokio runtime; counter-only mode
    /// has no such requirement.
    pub fn record_rate_limit_blocked(&self, event: RateLimitEvent) {
        self.counters
            .entry(event.kind)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);

        let Some(url) = self.config.sink_url.clone() else {
            return;
        };

        let client = self.client.clone();
        let timeout = self.config.sink_timeout;
        tokio::spawn(async move {
            let result = client
                .post(&url)
                .timeout(timeout)
                .json(&event)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(
                        status = %response.status(),
                        kind = ?event.kind,
                        "telemetry sink answered non-success, event dropped"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        error = %e,
                        kind = ?event.kind,
                        "telemetry sink post failed, event dropped"
                    );
                }
                Ok(_) => {}
            }
        });
    }

    /// Blocked count for one limiter kind
    pub fn blocked_count(&self, kind: RateLimitKind) -> u64 {
        self.counters
            .get(&kind)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// All non-zero counters at once
    pub fn snapshot(&self) -> HashMap<RateLimitKind, u64> {
        self.counters
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }

    /// Clear every counter. For test isolation and administrative reset,
    /// not production runtime use.
    pub fn reset(&self) {
        self.counters.clear();
    }
}
