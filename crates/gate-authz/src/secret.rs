//! Bearer Secret Guard
//!
//! Shared-secret checks for machine-to-machine (scheduled job) routes.

use gate_common::{GateError, GateResult};
use subtle::ConstantTimeEq;

/// Validates a shared-secret credential for machine-to-machine callers.
///
/// Stateless: no lockout, no memory of prior attempts. This is a
/// capability check, not a rate limiter.
pub struct SecretGuard {
    secret: String,
}

/// Logger handle bound to a machine-to-machine route label.
///
/// Returned on a successful secret check so the guarded operation logs
/// under its route. Holds the label and a tracing span only; the secret
/// value never enters this binding.
pub struct RouteLog {
    route: String,
    span: tracing::Span,
}

impl RouteLog {
    fn for_route(route: &str) -> Self {
        Self {
            route: route.to_string(),
            span: tracing::info_span!("m2m_route", route = %route),
        }
    }

    /// The route label this log is bound to
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The span to enter while the guarded operation runs
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl std::fmt::Debug for RouteLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteLog").field("route", &self.route).finish()
    }
}

impl SecretGuard {
    /// Guard routes with the given server-held secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Compare the presented credential against the server-held secret.
    ///
    /// The comparison is constant-time. Absence or mismatch yields a
    /// rejection the caller returns immediately without executing the
    /// guarded operation; a match yields a [`RouteLog`] bound to
    /// `route_label`.
    pub fn require_secret(
        &self,
        presented: Option<&str>,
        route_label: &str,
    ) -> GateResult<RouteLog> {
        // An unset secret closes the route entirely
        if self.secret.is_empty() {
            tracing::warn!(route = %route_label, "machine route has no secret configured");
            return Err(GateError::SecretMismatch { route: route_label.to_string() });
        }

        let matched = presented
            .map(|candidate| {
                self.secret
                    .as_bytes()
                    .ct_eq(candidate.as_bytes())
                    .unwrap_u8()
                    == 1
            })
            .unwrap_or(false);

        if matched {
            Ok(RouteLog::for_route(route_label))
        } else {
            tracing::warn!(route = %route_label, "machine route credential rejected");
            Err(GateError::SecretMismatch { route: route_label.to_string() })
        }
    }
}
