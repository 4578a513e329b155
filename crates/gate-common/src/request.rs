//! Request-scoped identifiers
//!
//! Correlation ids thread one request through logs and audit entries.
//! Client keys fingerprint the far side of a connection for abuse counters.

use serde::{Deserialize, Serialize};

/// Opaque per-request correlation identifier.
///
/// Generated fresh for every inbound request and threaded through logs and
/// audit entries. Never persisted as an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestCorrelationId(String);

impl RequestCorrelationId {
    /// Generate a fresh correlation id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The opaque string form, for log fields and audit entries
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestCorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client fingerprint used to key abuse counters, e.g. `ip:203.0.113.9`
/// or `ua:curl/8.4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientKey(String);

impl ClientKey {
    /// Fingerprint by remote address
    pub fn from_ip(addr: &str) -> Self {
        Self(format!("ip:{}", addr))
    }

    /// Fingerprint by user agent
    pub fn from_user_agent(ua: &str) -> Self {
        Self(format!("ua:{}", ua))
    }

    /// Use a pre-built fingerprint verbatim
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The fingerprint string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
