//! Origin Guard
//!
//! Trusted-origin validation for state-changing requests.

use gate_common::{GateError, GateResult, RequestCorrelationId};
use url::Url;

/// Validates that a state-changing request originates from a trusted
/// origin, and issues per-request correlation identifiers.
///
/// The allow-list derives from the deployment's public base URL plus any
/// explicitly configured extra origins. A request whose origin header is
/// missing, names a foreign host, downgrades the scheme, or moves the port
/// is rejected. Fail closed: absence is never treated as same-origin.
#[derive(Debug)]
pub struct OriginGuard {
    allowed: Vec<TrustedOrigin>,
}

/// Normalized scheme/host/port triple of a trusted origin
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrustedOrigin {
    scheme: String,
    host: String,
    port: u16,
}

impl TrustedOrigin {
    fn parse(raw: &str) -> GateResult<Self> {
        let url = Url::parse(raw)
            .map_err(|e| GateError::Config(format!("invalid trusted origin {raw:?}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| GateError::Config(format!("trusted origin {raw:?} has no host")))?
            .to_ascii_lowercase();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| GateError::Config(format!("trusted origin {raw:?} has no port")))?;

        Ok(Self { scheme: url.scheme().to_string(), host, port })
    }
}

impl OriginGuard {
    /// Build the allow-list from the public base URL and extra origins.
    pub fn new(public_base_url: &str, extra_trusted_origins: &[String]) -> GateResult<Self> {
        let mut allowed = vec![TrustedOrigin::parse(public_base_url)?];
        for origin in extra_trusted_origins {
            allowed.push(TrustedOrigin::parse(origin)?);
        }
        Ok(Self { allowed })
    }

    /// Check the declared origin of a request against the allow-list.
    ///
    /// `origin_header` is the already-extracted `Origin` (or `Referer`)
    /// header value; full URLs with a path are accepted, only the
    /// scheme/host/port triple is compared. No side effect beyond the
    /// pass/fail result; the caller maps failure to a 403-equivalent and
    /// must not perform the guarded mutation.
    pub fn assert_origin(&self, origin_header: Option<&str>) -> GateResult<()> {
        let raw = match origin_header {
            Some(value) if !value.is_empty() => value,
            _ => {
                tracing::warn!("mutation request without origin header rejected");
                return Err(GateError::OriginRejected);
            }
        };

        let candidate = match TrustedOrigin::parse(raw) {
            Ok(origin) => origin,
            Err(_) => {
                tracing::warn!(origin = %raw, "unparseable origin header rejected");
                return Err(GateError::OriginRejected);
            }
        };

        if self.allowed.contains(&candidate) {
            Ok(())
        } else {
            tracing::warn!(origin = %raw, "foreign origin rejected");
            Err(GateError::OriginRejected)
        }
    }

    /// Fresh correlation id for the request being admitted
    pub fn issue_correlation_id(&self) -> RequestCorrelationId {
        RequestCorrelationId::generate()
    }
}
