//! OpenGate Rate-Limit Telemetry
//!
//! Process-wide counters of blocked requests by limiter kind, with
//! best-effort asynchronous forwarding to an external HTTP sink. Counting
//! is synchronous and authoritative; the network leg is detached and may
//! be dropped without anyone on the request path noticing.

#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use gate_common::ClientKey;

pub mod aggregator;

pub use aggregator::TelemetryAggregator;

/// Limiter kind a block was attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitKind {
    /// Login attempt limiter
    Login,
    /// Export job limiter
    Export,
    /// General API limiter
    Api,
    /// Public form submission limiter
    Form,
}

/// One blocked request, as reported by a limiter.
///
/// Ephemeral: aggregated into the per-kind counter and, at most,
/// forwarded once to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitEvent {
    /// Which limiter blocked the request
    pub kind: RateLimitKind,
    /// Fingerprint of the blocked client
    pub client_key: ClientKey,
    /// Opaque limiter-specific detail
    pub meta: HashMap<String, String>,
    /// When the block happened
    pub timestamp: DateTime<Utc>,
}

impl RateLimitEvent {
    /// Event for a block happening now
    pub fn new(kind: RateLimitKind, client_key: ClientKey) -> Self {
        Self {
            kind,
            client_key,
            meta: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a meta field
    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// External sink receiving blocked events as JSON POSTs. `None`
    /// disables the network leg entirely (counter-only mode).
    pub sink_url: Option<String>,
    /// Per-post timeout for the sink
    pub sink_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sink_url: None,
            sink_timeout: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RateLimitKind::Login).unwrap(), "\"login\"");
        assert_eq!(serde_json::to_string(&RateLimitKind::Export).unwrap(), "\"export\"");
    }

    #[test]
    fn test_event_wire_shape() {
        let event = RateLimitEvent::new(RateLimitKind::Login, ClientKey::from_user_agent("abc"))
            .with_meta("window", "60s");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "login");
        assert_eq!(json["client_key"], "ua:abc");
        assert_eq!(json["meta"]["window"], "60s");
        assert!(json["timestamp"].is_string());
    }
}
