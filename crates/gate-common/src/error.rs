//! Error types for OpenGate

use thiserror::Error;

/// OpenGate guard error type
///
/// Every variant is terminal for the request that produced it: the core
/// never retries a guard, the caller maps the variant to a response at the
/// boundary. Display strings carry no secret material and no cross-tenant
/// detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Request origin missing or not in the trusted allow-list
    #[error("request origin rejected")]
    OriginRejected,

    /// Machine-to-machine credential absent or wrong
    #[error("shared secret mismatch on route {route}")]
    SecretMismatch {
        /// Route label the guard was protecting
        route: String,
    },

    /// No valid session credential for the request
    #[error("unauthenticated")]
    Unauthenticated,

    /// Public site link does not exist, is inactive, or is past expiry
    #[error("site link invalid or expired")]
    LinkInvalidOrExpired,

    /// Resolved context is not allowed to touch the target resource
    #[error("resource access denied")]
    AccessDenied,

    /// Deployment configuration is unusable (e.g. malformed public base URL).
    /// Not a guard failure; surfaces at construction time only.
    #[error("config error: {0}")]
    Config(String),
}

impl GateError {
    /// HTTP-equivalent status the boundary should answer with.
    ///
    /// Denied resource access and dead links answer 404 so existence is
    /// never leaked to a probing caller.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::OriginRejected => 403,
            Self::SecretMismatch { .. } => 401,
            Self::Unauthenticated => 401,
            Self::LinkInvalidOrExpired => 404,
            Self::AccessDenied => 404,
            Self::Config(_) => 500,
        }
    }
}

/// Result type for OpenGate
pub type GateResult<T> = Result<T, GateError>;
